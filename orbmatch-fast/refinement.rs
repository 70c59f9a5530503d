use std::collections::HashMap;

use orbmatch_core::Keypoint;

/// Keypoint post-processing: suppression, orientation and retention
pub struct KeypointRefinement;

impl KeypointRefinement {
    /// Compute orientation for keypoint using the intensity centroid of a circular patch
    pub fn compute_orientation(img: &[u8], width: usize, height: usize, x: usize, y: usize, half: usize) -> f32 {
        let (cx, cy, r) = (x as i64, y as i64, half as i64);
        if cx - r < 0 || cy - r < 0 || cx + r >= width as i64 || cy + r >= height as i64 {
            return 0.0;
        }

        let mut m10 = 0i64;
        let mut m01 = 0i64;
        let r_sq = r * r;
        for dy in -r..=r {
            let row = ((cy + dy) as usize) * width;
            for dx in -r..=r {
                if dx * dx + dy * dy > r_sq {
                    continue;
                }
                let val = img[row + (cx + dx) as usize] as i64;
                m10 += dx * val;
                m01 += dy * val;
            }
        }

        if m10 == 0 && m01 == 0 {
            0.0
        } else {
            (m01 as f32).atan2(m10 as f32)
        }
    }

    /// Non-maximum suppression: strongest first, drop anything closer than `min_distance`
    /// to an already accepted keypoint. Equal responses keep their input order.
    ///
    /// Accepted keypoints are bucketed on a grid of `min_distance` cells, so each
    /// candidate is only compared against the 3x3 cells around it.
    pub fn non_maximum_suppression(keypoints: &[Keypoint], min_distance: f32) -> Vec<Keypoint> {
        let mut sorted_keypoints = keypoints.to_vec();
        sorted_keypoints.sort_by(|a, b| b.response.total_cmp(&a.response));

        if sorted_keypoints.is_empty() || !(min_distance > 0.0) {
            return sorted_keypoints;
        }

        let cell_of = |kp: &Keypoint| {
            (
                (kp.x / min_distance).floor() as i64,
                (kp.y / min_distance).floor() as i64,
            )
        };
        let min_distance_sq = min_distance * min_distance;
        let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        let mut suppressed: Vec<Keypoint> = Vec::new();

        for candidate in sorted_keypoints {
            let (cx, cy) = cell_of(&candidate);
            let is_local_max = (cx - 1..=cx + 1)
                .flat_map(|gx| (cy - 1..=cy + 1).map(move |gy| (gx, gy)))
                .filter_map(|cell| grid.get(&cell))
                .flatten()
                .all(|&idx| {
                    let existing = &suppressed[idx];
                    let dx = candidate.x - existing.x;
                    let dy = candidate.y - existing.y;
                    dx * dx + dy * dy >= min_distance_sq
                });

            if is_local_max {
                grid.entry((cx, cy)).or_default().push(suppressed.len());
                suppressed.push(candidate);
            }
        }

        suppressed
    }

    /// Keep the `max_features` strongest keypoints (stable on equal response)
    pub fn retain_strongest(mut keypoints: Vec<Keypoint>, max_features: usize) -> Vec<Keypoint> {
        keypoints.sort_by(|a, b| b.response.total_cmp(&a.response));
        keypoints.truncate(max_features);
        keypoints
    }
}
