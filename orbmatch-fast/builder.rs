use crate::error::FastResult;
use crate::detector::FastDetector;
use crate::config::DetectorConfig;

/// Builder for creating a `FastDetector`
#[derive(Debug, Clone)]
pub struct DetectorBuilder {
    config: DetectorConfig,
}

impl Default for DetectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            config: DetectorConfig::default(),
        }
    }

    /// Set the FAST threshold (1-127)
    pub fn threshold(mut self, threshold: u8) -> Self {
        self.config.core.threshold = threshold;
        self
    }

    /// Set the patch size for orientation and descriptors
    pub fn patch_size(mut self, patch_size: usize) -> Self {
        self.config.core.patch_size = patch_size;
        self
    }

    /// Set the number of threads for parallel processing
    pub fn threads(mut self, n_threads: usize) -> Self {
        self.config.core.n_threads = n_threads;
        self
    }

    /// Set the number of pyramid levels
    pub fn levels(mut self, n_levels: usize) -> Self {
        self.config.core.n_levels = n_levels;
        self
    }

    /// Set the downscale factor between consecutive pyramid levels
    pub fn scale_factor(mut self, scale_factor: f32) -> Self {
        self.config.core.scale_factor = scale_factor;
        self
    }

    /// Set the border where keypoints are dropped
    pub fn edge_threshold(mut self, edge_threshold: usize) -> Self {
        self.config.core.edge_threshold = edge_threshold;
        self
    }

    /// Set how many of the strongest keypoints are kept
    pub fn max_features(mut self, max_features: usize) -> Self {
        self.config.core.max_features = max_features;
        self
    }

    /// Set the non-maximum suppression (NMS) distance
    pub fn nms_distance(mut self, distance: f32) -> Self {
        self.config.nms_distance = distance;
        self
    }

    /// Apply the fast preset
    pub fn preset_fast(mut self) -> Self {
        self.config = DetectorConfig::fast_preset();
        self
    }

    /// Apply the balanced preset
    pub fn preset_balanced(mut self) -> Self {
        self.config = DetectorConfig::balanced_preset();
        self
    }

    /// Apply the quality preset
    pub fn preset_quality(mut self) -> Self {
        self.config = DetectorConfig::quality_preset();
        self
    }

    /// Build a detector for images of the given size
    pub fn build(&self, width: usize, height: usize) -> FastResult<FastDetector> {
        self.config.validate()?;
        FastDetector::new(self.config.core.clone(), width, height)?
            .with_nms_distance(self.config.nms_distance)
    }

    /// Generate a summary of the builder's configuration
    pub fn summary(&self) -> String {
        self.config.summary()
    }

    /// Create a builder from an existing `DetectorConfig`
    pub fn from_config(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Convert the builder into a `DetectorConfig`
    pub fn to_config(self) -> DetectorConfig {
        self.config
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FastError;

    #[test]
    fn test_builder_applies_settings() {
        let detector = DetectorBuilder::new()
            .threshold(25)
            .patch_size(15)
            .levels(2)
            .scale_factor(1.5)
            .edge_threshold(10)
            .max_features(42)
            .nms_distance(4.0)
            .threads(1)
            .build(100, 80)
            .unwrap();

        let cfg = detector.config();
        assert_eq!(cfg.threshold, 25);
        assert_eq!(cfg.patch_size, 15);
        assert_eq!(cfg.n_levels, 2);
        assert_eq!(cfg.max_features, 42);
        assert_eq!(detector.nms_distance(), 4.0);
        assert_eq!(detector.dimensions(), (100, 80));
    }

    #[test]
    fn test_builder_rejects_invalid() {
        let result = DetectorBuilder::new().threshold(0).build(100, 100);
        assert!(matches!(result, Err(FastError::InvalidThreshold(0))));
    }

    #[test]
    fn test_preset_round_trip_through_config() {
        let builder = DetectorBuilder::new().preset_quality();
        let cfg = builder.clone().to_config();
        assert_eq!(cfg, DetectorConfig::quality_preset());
        assert_eq!(cfg.to_builder().summary(), builder.summary());
    }
}
