use std::path::{Path, PathBuf};
use std::time::Duration;

use orbmatch_core::MatchMode;
use orbmatch_fast::DetectorConfig;
use orbmatch_matcher::DescriptorMatcher;
use serde::{Deserialize, Serialize};

use crate::annotate::AnnotationStyle;
use crate::error::ConfigError;
use crate::validation::ValidationConfig;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherSettings {
    /// Reject matches farther apart than this
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f32>,
    /// Must stay after plain values for TOML
    pub mode: MatchMode,
}

impl MatcherSettings {
    pub fn build(&self) -> Result<DescriptorMatcher, orbmatch_matcher::MatchError> {
        let matcher = DescriptorMatcher::new(self.mode)?;
        match self.max_distance {
            Some(limit) => matcher.with_max_distance(limit),
            None => Ok(matcher),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Root of generated artifact folders
    pub media_dir: PathBuf,
    /// Files older than this are swept from the artifact folder
    pub retention_hours: f64,
    pub sweep: bool,
    pub display: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            media_dir: PathBuf::from("media"),
            retention_hours: 5.0,
            sweep: true,
            display: true,
        }
    }
}

impl OutputSettings {
    pub fn retention(&self) -> ConfigResult<Duration> {
        retention_from_hours(self.retention_hours)
    }
}

/// Positive, finite and representable as a `Duration`
pub fn retention_from_hours(hours: f64) -> ConfigResult<Duration> {
    if !(hours > 0.0) {
        return Err(ConfigError::Invalid(format!("retention of {} hours", hours)));
    }
    Duration::try_from_secs_f64(hours * 3600.0)
        .map_err(|e| ConfigError::Invalid(format!("retention of {} hours: {}", hours, e)))
}

/// Everything one matching run needs
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub detector: DetectorConfig,
    pub matcher: MatcherSettings,
    pub validation: ValidationConfig,
    pub annotation: AnnotationStyle,
    pub output: OutputSettings,
}

impl MatchConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        self.detector.validate()?;
        self.matcher.build()?;

        let v = &self.validation;
        if v.extensions.is_empty() {
            return Err(ConfigError::Invalid("no image extensions allowed".into()));
        }
        if v.min_size.0 > v.max_size.0 || v.min_size.1 > v.max_size.1 {
            return Err(ConfigError::Invalid(format!(
                "minimum size {:?} exceeds maximum size {:?}",
                v.min_size, v.max_size
            )));
        }
        if matches!(&self.annotation.labels, Some(labels) if labels.is_empty()) {
            return Err(ConfigError::Invalid("label list is empty".into()));
        }
        self.output.retention()?;
        Ok(())
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn from_toml(toml_str: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn load_toml<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    /// Pick JSON or TOML by extension
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref() {
            Some("toml") => Self::load_toml(path),
            Some("json") => Self::load_json(path),
            _ => Err(ConfigError::UnknownFormat(path.to_path_buf())),
        }
    }
}
