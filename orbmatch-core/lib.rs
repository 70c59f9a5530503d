#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Row-major 8-bit grayscale image
pub type Image = Vec<u8>;

/// Key-point ≙ FAST corner + orientation (radians), in full-resolution coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    /// Pyramid level the corner was found on (0 = full resolution)
    pub octave: u8,
    /// Patch diameter in full-resolution pixels
    pub size: f32,
    pub response: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            angle: 0.0,
            octave: 0,
            size: 0.0,
            response: 0.0,
        }
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

/// 256-bit binary descriptor = 32 bytes
pub type Descriptor = [u8; 32];

/// Distance between two descriptors of the same family.
///
/// Binary descriptors use the Hamming distance, float descriptors the
/// Euclidean distance. Matchers only ever compare values through this trait.
pub trait DescriptorDistance {
    fn distance(&self, other: &Self) -> f32;
}

impl DescriptorDistance for Descriptor {
    fn distance(&self, other: &Self) -> f32 {
        hamming_distance(self, other) as f32
    }
}

impl DescriptorDistance for Vec<f32> {
    fn distance(&self, other: &Self) -> f32 {
        debug_assert_eq!(self.len(), other.len(), "descriptor length mismatch");
        self.iter()
            .zip(other)
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f32>()
            .sqrt()
    }
}

/// Number of differing bits between two binary descriptors
#[inline]
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// One level of an image pyramid
#[derive(Debug, Clone)]
pub struct PyramidLevel {
    pub pixels: Image,
    pub width: usize,
    pub height: usize,
    /// Downscale factor relative to level 0 (level 0 = 1.0)
    pub scale: f32,
}

/// Correspondence between a keypoint of image one (query) and image two (train)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Match {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: f32,
}

/// Matching policy
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "kebab-case"))]
pub enum MatchMode {
    /// Exact nearest neighbour, kept only when the pair is mutual
    CrossCheck,
    /// Two nearest neighbours, accepted when `d1 < ratio * d2`
    RatioTest { ratio: f32 },
}

impl MatchMode {
    /// Lowe's ratio used when none is given
    pub const DEFAULT_RATIO: f32 = 0.7;

    pub fn ratio_test() -> Self {
        MatchMode::RatioTest {
            ratio: Self::DEFAULT_RATIO,
        }
    }
}

impl Default for MatchMode {
    fn default() -> Self {
        MatchMode::CrossCheck
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OrbConfig {
    pub threshold: u8,
    pub patch_size: usize,
    pub n_threads: usize,
    pub n_levels: usize,
    pub scale_factor: f32,
    /// Border (in level pixels) where no keypoint is kept
    pub edge_threshold: usize,
    /// Strongest keypoints retained per image
    pub max_features: usize,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            threshold: 20,
            patch_size: 31,
            n_threads: num_cpus::get().max(1),
            n_levels: 8,
            scale_factor: 1.2,
            edge_threshold: 31,
            max_features: 500,
        }
    }
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hamming_distance_counts_bits() {
        let a = [0u8; 32];
        let mut b = [0u8; 32];
        b[0] = 0b1011_0000;
        b[31] = 0xFF;
        assert_eq!(hamming_distance(&a, &b), 11);
        assert_eq!(a.distance(&b), 11.0);
    }

    #[test]
    fn test_float_distance_is_euclidean() {
        let a = vec![0.0, 0.0];
        let b = vec![3.0, 4.0];
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_default_mode_is_cross_check() {
        assert_eq!(MatchMode::default(), MatchMode::CrossCheck);
        assert_eq!(MatchMode::ratio_test(), MatchMode::RatioTest { ratio: 0.7 });
    }

    proptest! {
        #[test]
        fn prop_hamming_symmetric_and_bounded(a in any::<[u8; 32]>(), b in any::<[u8; 32]>()) {
            let d = hamming_distance(&a, &b);
            prop_assert_eq!(d, hamming_distance(&b, &a));
            prop_assert!(d <= 256);
            prop_assert_eq!(hamming_distance(&a, &a), 0);
        }
    }
}
