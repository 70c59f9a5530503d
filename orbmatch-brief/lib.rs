use orbmatch_core::{Descriptor, Image, Keypoint, PyramidLevel};
use image::GrayImage;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rayon::prelude::*;

pub const DESCRIPTOR_SIZE: usize = 32;
const DESCRIPTOR_BITS: usize = DESCRIPTOR_SIZE * 8;

/// Seed of the sampling pattern; changing it invalidates every stored descriptor
const PATTERN_SEED: u64 = 0x0_5EED_B41E;

/// Sigma of the smoothing applied before sampling
const SMOOTHING_SIGMA: f32 = 2.0;

/// Rotated BRIEF: 256 intensity comparisons inside a circular patch,
/// steered by the keypoint orientation.
pub struct BriefGenerator {
    pairs: Vec<(f32, f32, f32, f32)>,
    patch_size: usize,
}

impl BriefGenerator {
    pub fn new(patch_size: usize) -> Self {
        assert!(patch_size >= 5 && patch_size % 2 == 1);
        Self {
            pairs: Self::sampling_pattern(patch_size),
            patch_size,
        }
    }

    pub fn patch_size(&self) -> usize {
        self.patch_size
    }

    pub fn pairs(&self) -> &[(f32, f32, f32, f32)] {
        &self.pairs
    }

    /// Point pairs drawn uniformly inside the patch disk from a fixed seed
    fn sampling_pattern(patch_size: usize) -> Vec<(f32, f32, f32, f32)> {
        let r = (patch_size / 2) as i32 - 1;
        let mut rng = StdRng::seed_from_u64(PATTERN_SEED);
        let point = |rng: &mut StdRng| loop {
            let dx = rng.random_range(-r..=r);
            let dy = rng.random_range(-r..=r);
            if dx * dx + dy * dy <= r * r {
                return (dx as f32, dy as f32);
            }
        };

        (0..DESCRIPTOR_BITS)
            .map(|_| {
                let (x1, y1) = point(&mut rng);
                let (x2, y2) = loop {
                    let p = point(&mut rng);
                    if p != (x1, y1) {
                        break p;
                    }
                };
                (x1, y1, x2, y2)
            })
            .collect()
    }

    /// Gaussian-smoothed copy of a pyramid level
    pub fn smooth(level: &PyramidLevel) -> Image {
        match GrayImage::from_raw(level.width as u32, level.height as u32, level.pixels.clone()) {
            Some(img) => imageproc::filter::gaussian_blur_f32(&img, SMOOTHING_SIGMA).into_raw(),
            None => level.pixels.clone(),
        }
    }

    /// Generate one descriptor per keypoint, in keypoint order.
    ///
    /// Each keypoint is described on the pyramid level it was detected on.
    pub fn generate_descriptors(&self, pyramid: &[PyramidLevel], kps: &[Keypoint]) -> Vec<Descriptor> {
        if kps.is_empty() {
            return Vec::new();
        }
        assert!(!pyramid.is_empty(), "keypoints without a pyramid");

        let smoothed: Vec<Image> = pyramid.par_iter().map(Self::smooth).collect();

        kps.par_iter()
            .map(|kp| {
                let lvl = (kp.octave as usize).min(pyramid.len() - 1);
                let level = &pyramid[lvl];
                self.describe(
                    &smoothed[lvl],
                    level.width,
                    level.height,
                    kp.x / level.scale,
                    kp.y / level.scale,
                    kp.angle,
                )
            })
            .collect()
    }

    /// Describe the patch centred on `(cx, cy)` of a single-level image
    pub fn describe(&self, img: &[u8], w: usize, h: usize, cx: f32, cy: f32, angle: f32) -> Descriptor {
        let (s, c) = angle.sin_cos();
        let mut d = [0u8; DESCRIPTOR_SIZE];

        for (i, &(dx1, dy1, dx2, dy2)) in self.pairs.iter().enumerate() {
            let (rx1, ry1) = (cx + c * dx1 - s * dy1, cy + s * dx1 + c * dy1);
            let (rx2, ry2) = (cx + c * dx2 - s * dy2, cy + s * dx2 + c * dy2);

            let val1 = bilinear_sample(img, w, h, rx1, ry1);
            let val2 = bilinear_sample(img, w, h, rx2, ry2);

            let bit = (val1 < val2) as u8;
            d[i / 8] |= bit << (i % 8);
        }
        d
    }
}

/// Bilinear interpolation for subpixel sampling, clamped at the image border
fn bilinear_sample(img: &[u8], w: usize, h: usize, x: f32, y: f32) -> f32 {
    let x0 = x.floor();
    let y0 = y.floor();
    let x1 = x0 + 1.0;
    let y1 = y0 + 1.0;

    if x0 < 0.0 || y0 < 0.0 || x1 >= w as f32 || y1 >= h as f32 {
        let cx = x.round().clamp(0.0, (w - 1) as f32) as usize;
        let cy = y.round().clamp(0.0, (h - 1) as f32) as usize;
        return img[cy * w + cx] as f32;
    }

    let dx = x - x0;
    let dy = y - y0;

    let (x0_idx, y0_idx) = (x0 as usize, y0 as usize);
    let (x1_idx, y1_idx) = (x1 as usize, y1 as usize);

    let p00 = img[y0_idx * w + x0_idx] as f32;
    let p10 = img[y0_idx * w + x1_idx] as f32;
    let p01 = img[y1_idx * w + x0_idx] as f32;
    let p11 = img[y1_idx * w + x1_idx] as f32;

    let top = p00 * (1.0 - dx) + p10 * dx;
    let bottom = p01 * (1.0 - dx) + p11 * dx;

    top * (1.0 - dy) + bottom * dy
}
