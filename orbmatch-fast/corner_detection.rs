use orbmatch_core::Keypoint;
use crate::types::{CornerType, ScaleLevel};
use crate::utils::has_consecutive_bits;
use rayon::prelude::*;

/// Contiguous arc length required by the segment test (FAST-9)
pub const ARC_LENGTH: usize = 9;

/// FAST segment-test corner detection
pub struct CornerDetector;

impl CornerDetector {
    /// FAST circle offsets for corner detection (radius 3 Bresenham circle, clockwise from top)
    pub const FAST_OFFSETS: [(i32, i32); 16] = [
        (0, -3), (1, -3), (2, -2), (3, -1),
        (3, 0), (3, 1), (2, 2), (1, 3),
        (0, 3), (-1, 3), (-2, 2), (-3, 1),
        (-3, 0), (-3, -1), (-2, -2), (-1, -3),
    ];

    /// Detect corners on one pyramid level.
    ///
    /// Only pixels at least `border` away from every edge are tested. Returned
    /// keypoints are in level coordinates with `response` set and `angle` zero;
    /// rows are scanned in parallel but collected in raster order.
    pub fn detect(
        img: &[u8],
        scale_level: &ScaleLevel,
        threshold: u8,
        border: usize,
    ) -> Vec<Keypoint> {
        let width = scale_level.width;
        let height = scale_level.height;
        let border = border.max(3);
        if width <= 2 * border || height <= 2 * border {
            return Vec::new();
        }

        (border..height - border)
            .into_par_iter()
            .flat_map_iter(|y| {
                let mut row = Vec::new();
                for x in border..width - border {
                    if let Some(response) = Self::segment_test(img, width, x, y, threshold) {
                        let mut kp = Keypoint::new(x as f32, y as f32);
                        kp.octave = scale_level.level as u8;
                        kp.response = response;
                        row.push(kp);
                    }
                }
                row
            })
            .collect()
    }

    /// Run the segment test at `(x, y)`; returns the corner response when it passes.
    ///
    /// The response is the mean absolute contrast of the circle pixels on the
    /// winning side.
    pub fn segment_test(img: &[u8], width: usize, x: usize, y: usize, threshold: u8) -> Option<f32> {
        let p = img[y * width + x];
        let hi = p.saturating_add(threshold);
        let lo = p.saturating_sub(threshold);

        // Any 9-arc covers at least two of the four compass pixels
        let compass = [0usize, 4, 8, 12];
        let (mut bri, mut drk) = (0, 0);
        for &i in &compass {
            let q = Self::circle_pixel(img, width, x, y, i);
            if q > hi {
                bri += 1;
            } else if q < lo {
                drk += 1;
            }
        }
        if bri < 2 && drk < 2 {
            return None;
        }

        let mut bright_mask = 0u16;
        let mut dark_mask = 0u16;
        let mut bright_sum = 0u32;
        let mut dark_sum = 0u32;
        for i in 0..16 {
            let q = Self::circle_pixel(img, width, x, y, i);
            if q > hi {
                bright_mask |= 1 << i;
                bright_sum += (q - p) as u32;
            } else if q < lo {
                dark_mask |= 1 << i;
                dark_sum += (p - q) as u32;
            }
        }

        match Self::classify(bright_mask, dark_mask) {
            CornerType::Bright => Some(bright_sum as f32 / bright_mask.count_ones() as f32),
            CornerType::Dark => Some(dark_sum as f32 / dark_mask.count_ones() as f32),
            CornerType::None => None,
        }
    }

    fn classify(bright_mask: u16, dark_mask: u16) -> CornerType {
        if has_consecutive_bits(bright_mask, ARC_LENGTH) {
            CornerType::Bright
        } else if has_consecutive_bits(dark_mask, ARC_LENGTH) {
            CornerType::Dark
        } else {
            CornerType::None
        }
    }

    #[inline]
    fn circle_pixel(img: &[u8], width: usize, x: usize, y: usize, i: usize) -> u8 {
        let (dx, dy) = Self::FAST_OFFSETS[i];
        let xx = (x as i32 + dx) as usize;
        let yy = (y as i32 + dy) as usize;
        img[yy * width + xx]
    }
}
