use orbmatch_core::OrbConfig;
use crate::error::{FastError, FastResult};
use crate::builder::DetectorBuilder;
use crate::detector::{DEFAULT_NMS_DISTANCE, MAX_LEVELS};

#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};

/// Complete detector configuration with all settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DetectorConfig {
    /// Minimum spacing between corners kept by non-maximum suppression
    pub nms_distance: f32,
    /// Metadata
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub description: Option<String>,
    /// Core ORB configuration. Must stay the last field: TOML tables follow plain values
    pub core: OrbConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::balanced_preset()
    }
}

impl DetectorConfig {
    /// ORB defaults: 500 features, 8 levels at 1.2, 31 px patch
    pub fn balanced_preset() -> Self {
        Self {
            core: OrbConfig::default(),
            nms_distance: DEFAULT_NMS_DISTANCE,
            name: None,
            description: None,
        }
    }

    /// Fewer levels and features, higher threshold
    pub fn fast_preset() -> Self {
        Self {
            core: OrbConfig {
                threshold: 30,
                n_levels: 4,
                max_features: 250,
                ..OrbConfig::default()
            },
            nms_distance: 5.0,
            name: Some("Fast".to_string()),
            description: Some("Optimized for speed with fewer features".to_string()),
        }
    }

    /// Lower threshold, more features, tighter suppression
    pub fn quality_preset() -> Self {
        Self {
            core: OrbConfig {
                threshold: 12,
                max_features: 1500,
                ..OrbConfig::default()
            },
            nms_distance: 2.0,
            name: Some("Quality".to_string()),
            description: Some("More features for textured scenes".to_string()),
        }
    }

    /// Add metadata to configuration
    pub fn with_metadata(mut self, name: &str, description: &str) -> Self {
        self.name = Some(name.to_string());
        self.description = Some(description.to_string());
        self
    }

    /// Convert to DetectorBuilder for further customization
    pub fn to_builder(self) -> DetectorBuilder {
        DetectorBuilder::from_config(self)
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "DetectorConfig: threshold={}, patch={}, levels={}x{:.2}, edge={}, max_features={}, nms={:.1}",
            self.core.threshold, self.core.patch_size, self.core.n_levels, self.core.scale_factor,
            self.core.edge_threshold, self.core.max_features, self.nms_distance
        )
    }

    /// Validate configuration parameters that do not depend on image size
    pub fn validate(&self) -> FastResult<()> {
        if self.core.threshold == 0 || self.core.threshold > 127 {
            return Err(FastError::InvalidThreshold(self.core.threshold));
        }
        if self.core.patch_size % 2 == 0 || self.core.patch_size < 5 {
            return Err(FastError::InvalidPatchSize { patch_size: self.core.patch_size, min_image_dim: 0 });
        }
        let n_levels = self.core.n_levels;
        if n_levels == 0 || n_levels > MAX_LEVELS || (n_levels > 1 && !(self.core.scale_factor > 1.0)) {
            return Err(FastError::InvalidPyramid {
                n_levels: self.core.n_levels,
                scale_factor: self.core.scale_factor,
            });
        }
        if !self.nms_distance.is_finite() || self.nms_distance < 0.0 {
            return Err(FastError::InvalidNmsDistance(self.nms_distance));
        }
        Ok(())
    }

    /// Save configuration to JSON file
    #[cfg(feature = "serde")]
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON file
    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save configuration to TOML file
    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Load configuration from TOML file
    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Serialize to JSON string
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserialize from TOML string
    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(DetectorConfig::balanced_preset().validate().is_ok());
        assert!(DetectorConfig::fast_preset().validate().is_ok());
        assert!(DetectorConfig::quality_preset().validate().is_ok());
    }

    #[test]
    fn test_default_matches_orb_defaults() {
        let cfg = DetectorConfig::default();
        assert_eq!(cfg.core.max_features, 500);
        assert_eq!(cfg.core.n_levels, 8);
        assert_eq!(cfg.core.patch_size, 31);
        assert_eq!(cfg.core.edge_threshold, 31);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = DetectorConfig::default();
        cfg.core.threshold = 0;
        assert!(matches!(cfg.validate(), Err(FastError::InvalidThreshold(0))));

        let mut cfg = DetectorConfig::default();
        cfg.core.patch_size = 30;
        assert!(matches!(cfg.validate(), Err(FastError::InvalidPatchSize { .. })));

        let mut cfg = DetectorConfig::default();
        cfg.nms_distance = -1.0;
        assert!(matches!(cfg.validate(), Err(FastError::InvalidNmsDistance(_))));

        let mut cfg = DetectorConfig::default();
        cfg.core.n_levels = 300;
        cfg.core.scale_factor = 1.001;
        assert!(matches!(cfg.validate(), Err(FastError::InvalidPyramid { n_levels: 300, .. })));
    }

    #[test]
    fn test_summary_mentions_threshold() {
        let summary = DetectorConfig::fast_preset().summary();
        assert!(summary.contains("threshold=30"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_and_toml_round_trip() {
        let cfg = DetectorConfig::quality_preset().with_metadata("Lab", "bench rig");
        let json = cfg.to_json().unwrap();
        assert_eq!(DetectorConfig::from_json(&json).unwrap(), cfg);
        let toml = cfg.to_toml().unwrap();
        assert_eq!(DetectorConfig::from_toml(&toml).unwrap(), cfg);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_toml_uses_defaults() {
        let cfg = DetectorConfig::from_toml("nms_distance = 4.0\n[core]\nthreshold = 25\n").unwrap();
        assert_eq!(cfg.core.threshold, 25);
        assert_eq!(cfg.core.patch_size, 31);
        assert_eq!(cfg.nms_distance, 4.0);
    }
}
