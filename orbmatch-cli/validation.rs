use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{OrbMatchError, OrbMatchResult, ValidationError};

pub const DEFAULT_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Accepted file types and pixel bounds for input images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Case-insensitive, with or without the leading dot
    pub extensions: Vec<String>,
    /// Minimum (width, height)
    pub min_size: (u32, u32),
    /// Maximum (width, height)
    pub max_size: (u32, u32),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            min_size: (100, 100),
            max_size: (5000, 5000),
        }
    }
}

impl ValidationConfig {
    fn allows(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(extension))
    }

    pub fn check_bounds(&self, width: u32, height: u32) -> Result<(), ValidationError> {
        if width < self.min_size.0 || height < self.min_size.1 {
            return Err(ValidationError::TooSmall { width, height, min: self.min_size });
        }
        if width > self.max_size.0 || height > self.max_size.1 {
            return Err(ValidationError::TooLarge { width, height, max: self.max_size });
        }
        Ok(())
    }
}

/// Check that `path` exists, has an accepted extension and fits the size
/// bounds. Only the image header is read. Returns `(width, height)`.
pub fn validate_image<P: AsRef<Path>>(path: P, config: &ValidationConfig) -> OrbMatchResult<(u32, u32)> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ValidationError::MissingFile(path.to_path_buf()).into());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();
    if !config.allows(&extension) {
        return Err(ValidationError::UnsupportedExtension {
            path: path.to_path_buf(),
            extension,
            allowed: config.extensions.clone(),
        }
        .into());
    }

    let (width, height) = image::image_dimensions(path).map_err(|source| match source {
        image::ImageError::IoError(source) => OrbMatchError::UnreadableFile {
            path: PathBuf::from(path),
            source,
        },
        source => OrbMatchError::Decode {
            path: PathBuf::from(path),
            source,
        },
    })?;

    config.check_bounds(width, height)?;
    log::debug!("{} validated ({}x{})", path.display(), width, height);
    Ok((width, height))
}
