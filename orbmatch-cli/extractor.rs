use std::path::Path;

use image::{DynamicImage, GrayImage, ImageReader};
use orbmatch_brief::BriefGenerator;
use orbmatch_core::{Descriptor, Keypoint, init_thread_pool};
use orbmatch_fast::{DetectorConfig, FastDetector};

use crate::error::{OrbMatchError, OrbMatchResult};

/// Keypoints and their descriptors, index-aligned
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Features {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl Features {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Open and decode an image, telling unreadable files apart from bad data
pub fn load_image<P: AsRef<Path>>(path: P) -> OrbMatchResult<DynamicImage> {
    let path = path.as_ref();
    let unreadable = |source| OrbMatchError::UnreadableFile {
        path: path.to_path_buf(),
        source,
    };
    ImageReader::open(path)
        .map_err(unreadable)?
        .with_guessed_format()
        .map_err(unreadable)?
        .decode()
        .map_err(|source| OrbMatchError::Decode {
            path: path.to_path_buf(),
            source,
        })
}

/// FAST keypoints plus rotated BRIEF descriptors for a grayscale image
pub struct FeatureExtractor {
    config: DetectorConfig,
    brief: BriefGenerator,
}

impl FeatureExtractor {
    pub fn new(config: DetectorConfig) -> OrbMatchResult<Self> {
        config.validate()?;

        if let Err(e) = init_thread_pool(config.core.n_threads) {
            log::debug!("Keeping existing thread pool: {}", e);
        }

        let brief = BriefGenerator::new(config.core.patch_size);
        Ok(Self { config, brief })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect and describe. An image without corners gives empty `Features`.
    pub fn extract(&self, img: &GrayImage) -> OrbMatchResult<Features> {
        let (w, h) = img.dimensions();
        let detector = FastDetector::new(self.config.core.clone(), w as usize, h as usize)?
            .with_nms_distance(self.config.nms_distance)?;

        let pyramid = detector.build_pyramid(img.as_raw())?;
        let keypoints = detector.detect_in_pyramid(&pyramid);
        let descriptors = self.brief.generate_descriptors(&pyramid, &keypoints);

        log::debug!(
            "{} keypoints over {} pyramid levels ({}x{})",
            keypoints.len(),
            pyramid.len(),
            w,
            h
        );
        Ok(Features { keypoints, descriptors })
    }

    pub fn extract_path<P: AsRef<Path>>(&self, path: P) -> OrbMatchResult<Features> {
        let img = load_image(path)?.to_luma8();
        self.extract(&img)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::rectangles_image;
    use image::Luma;

    #[test]
    fn test_solid_image_has_no_features() {
        let extractor = FeatureExtractor::new(DetectorConfig::default()).unwrap();
        let img = GrayImage::from_pixel(200, 200, Luma([128]));
        let features = extractor.extract(&img).unwrap();
        assert!(features.is_empty());
        assert!(features.descriptors.is_empty());
    }

    #[test]
    fn test_rectangles_have_aligned_features() {
        let extractor = FeatureExtractor::new(DetectorConfig::default()).unwrap();
        let img = DynamicImage::ImageRgb8(rectangles_image(320, 240, 4, None, 11)).to_luma8();
        let features = extractor.extract(&img).unwrap();
        assert!(!features.is_empty());
        assert_eq!(features.keypoints.len(), features.descriptors.len());
        assert!(features.len() <= extractor.config().core.max_features);
        for kp in &features.keypoints {
            assert!(kp.x >= 0.0 && kp.x < 320.0);
            assert!(kp.y >= 0.0 && kp.y < 240.0);
        }
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = FeatureExtractor::new(DetectorConfig::default()).unwrap();
        let img = DynamicImage::ImageRgb8(rectangles_image(300, 300, 5, None, 3)).to_luma8();
        assert_eq!(extractor.extract(&img).unwrap(), extractor.extract(&img).unwrap());
    }

    #[test]
    fn test_noise_image_extracts_in_bounded_time() {
        use rand::{Rng, SeedableRng, rngs::StdRng};

        let mut rng = StdRng::seed_from_u64(5);
        let img = GrayImage::from_fn(1000, 1000, |_, _| Luma([rng.random::<u8>()]));
        let extractor = FeatureExtractor::new(DetectorConfig::default()).unwrap();

        let start = std::time::Instant::now();
        let features = extractor.extract(&img).unwrap();
        let elapsed = start.elapsed();

        assert_eq!(features.len(), extractor.config().core.max_features);
        assert!(elapsed < std::time::Duration::from_secs(90), "extraction took {:?}", elapsed);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = DetectorConfig::default();
        config.core.threshold = 0;
        assert!(matches!(FeatureExtractor::new(config), Err(OrbMatchError::Fast(_))));
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        assert!(matches!(load_image(&missing), Err(OrbMatchError::UnreadableFile { .. })));

        let garbage = dir.path().join("garbage.png");
        std::fs::write(&garbage, [0u8, 1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap();
        assert!(matches!(load_image(&garbage), Err(OrbMatchError::Decode { .. })));
    }
}
