use std::path::PathBuf;

use orbmatch_fast::FastError;
use orbmatch_matcher::MatchError;

/// Input rejected before any feature work starts
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingFile(PathBuf),
    UnsupportedExtension { path: PathBuf, extension: String, allowed: Vec<String> },
    TooSmall { width: u32, height: u32, min: (u32, u32) },
    TooLarge { width: u32, height: u32, max: (u32, u32) },
    EmptyLabels,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingFile(path) => {
                write!(f, "Image file {} does not exist", path.display())
            }
            ValidationError::UnsupportedExtension { path, extension, allowed } => {
                write!(
                    f,
                    "Unsupported extension '{}' for {} (supported: {})",
                    extension,
                    path.display(),
                    allowed.join(", ")
                )
            }
            ValidationError::TooSmall { width, height, min } => {
                write!(f, "Image size {}x{} is smaller than the minimum {}x{}", width, height, min.0, min.1)
            }
            ValidationError::TooLarge { width, height, max } => {
                write!(f, "Image size {}x{} exceeds the maximum {}x{}", width, height, max.0, max.1)
            }
            ValidationError::EmptyLabels => write!(f, "Label list is empty"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Configuration file problems
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    TomlParse(toml::de::Error),
    TomlWrite(toml::ser::Error),
    UnknownFormat(PathBuf),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Config I/O error: {}", e),
            ConfigError::Json(e) => write!(f, "Config JSON error: {}", e),
            ConfigError::TomlParse(e) => write!(f, "Config TOML parse error: {}", e),
            ConfigError::TomlWrite(e) => write!(f, "Config TOML write error: {}", e),
            ConfigError::UnknownFormat(path) => {
                write!(f, "Cannot tell config format of {} (use .toml or .json)", path.display())
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
            ConfigError::TomlParse(e) => Some(e),
            ConfigError::TomlWrite(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Json(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::TomlParse(err)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::TomlWrite(err)
    }
}

impl From<FastError> for ConfigError {
    fn from(err: FastError) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}

impl From<MatchError> for ConfigError {
    fn from(err: MatchError) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}

/// Failures of the `mm-dd-yyyy` date helper
#[derive(Debug, Clone, PartialEq)]
pub enum DateError {
    Format(String),
    NonNumeric(String),
    Impossible(String),
    UnknownComponent(String),
}

impl std::fmt::Display for DateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateError::Format(s) => write!(f, "Invalid date format: '{}' (expected mm-dd-yyyy)", s),
            DateError::NonNumeric(s) => write!(f, "Invalid numeric values in date string: '{}'", s),
            DateError::Impossible(s) => write!(f, "Invalid date: '{}' is not a calendar day", s),
            DateError::UnknownComponent(c) => {
                write!(f, "Invalid component: '{}' (expected 'dd', 'mm' or 'yyyy')", c)
            }
        }
    }
}

impl std::error::Error for DateError {}

#[derive(Debug)]
pub enum OrbMatchError {
    Validation(ValidationError),
    UnreadableFile { path: PathBuf, source: std::io::Error },
    Decode { path: PathBuf, source: image::ImageError },
    Encode { path: PathBuf, source: image::ImageError },
    Fast(FastError),
    Match(MatchError),
    Font(String),
    Config(ConfigError),
    Date(DateError),
    Io(std::io::Error),
}

impl std::fmt::Display for OrbMatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrbMatchError::Validation(e) => write!(f, "Validation error: {}", e),
            OrbMatchError::UnreadableFile { path, source } => {
                write!(f, "Cannot read {}: {}", path.display(), source)
            }
            OrbMatchError::Decode { path, source } => {
                write!(f, "Cannot decode {}: {}", path.display(), source)
            }
            OrbMatchError::Encode { path, source } => {
                write!(f, "Cannot write {}: {}", path.display(), source)
            }
            OrbMatchError::Fast(e) => write!(f, "FAST error: {}", e),
            OrbMatchError::Match(e) => write!(f, "Matcher error: {}", e),
            OrbMatchError::Font(msg) => write!(f, "Font error: {}", msg),
            OrbMatchError::Config(e) => write!(f, "{}", e),
            OrbMatchError::Date(e) => write!(f, "{}", e),
            OrbMatchError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for OrbMatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OrbMatchError::Validation(e) => Some(e),
            OrbMatchError::UnreadableFile { source, .. } => Some(source),
            OrbMatchError::Decode { source, .. } => Some(source),
            OrbMatchError::Encode { source, .. } => Some(source),
            OrbMatchError::Fast(e) => Some(e),
            OrbMatchError::Match(e) => Some(e),
            OrbMatchError::Config(e) => Some(e),
            OrbMatchError::Date(e) => Some(e),
            OrbMatchError::Io(e) => Some(e),
            OrbMatchError::Font(_) => None,
        }
    }
}

impl From<ValidationError> for OrbMatchError {
    fn from(err: ValidationError) -> Self {
        OrbMatchError::Validation(err)
    }
}

impl From<FastError> for OrbMatchError {
    fn from(err: FastError) -> Self {
        OrbMatchError::Fast(err)
    }
}

impl From<MatchError> for OrbMatchError {
    fn from(err: MatchError) -> Self {
        OrbMatchError::Match(err)
    }
}

impl From<ConfigError> for OrbMatchError {
    fn from(err: ConfigError) -> Self {
        OrbMatchError::Config(err)
    }
}

impl From<DateError> for OrbMatchError {
    fn from(err: DateError) -> Self {
        OrbMatchError::Date(err)
    }
}

impl From<std::io::Error> for OrbMatchError {
    fn from(err: std::io::Error) -> Self {
        OrbMatchError::Io(err)
    }
}

pub type OrbMatchResult<T> = Result<T, OrbMatchError>;
