#[derive(Debug, Clone, PartialEq)]
pub enum FastError {
    InvalidImageSize { width: usize, height: usize },
    InvalidImageData { expected_len: usize, actual_len: usize },
    InvalidThreshold(u8),
    InvalidPatchSize { patch_size: usize, min_image_dim: usize },
    ImageTooSmall { width: usize, height: usize, min_size: usize },
    InvalidPyramid { n_levels: usize, scale_factor: f32 },
    InvalidNmsDistance(f32),
}

impl std::fmt::Display for FastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FastError::InvalidImageSize { width, height } => {
                write!(f, "Invalid image dimensions: {}x{} (must be > 0)", width, height)
            }
            FastError::InvalidImageData { expected_len, actual_len } => {
                write!(f, "Image data length mismatch: expected {}, got {}", expected_len, actual_len)
            }
            FastError::InvalidThreshold(t) => {
                write!(f, "Invalid threshold: {} (must be 1-127)", t)
            }
            FastError::InvalidPatchSize { patch_size, min_image_dim } => {
                write!(f, "Patch size {} must be odd and smaller than the minimum image dimension {}", patch_size, min_image_dim)
            }
            FastError::ImageTooSmall { width, height, min_size } => {
                write!(f, "Image {}x{} too small (minimum {}x{})", width, height, min_size, min_size)
            }
            FastError::InvalidPyramid { n_levels, scale_factor } => {
                write!(f, "Invalid pyramid: {} levels with scale factor {} (need 1 to 256 levels and factor > 1)", n_levels, scale_factor)
            }
            FastError::InvalidNmsDistance(d) => {
                write!(f, "Invalid NMS distance: {} (must be finite and >= 0)", d)
            }
        }
    }
}

impl std::error::Error for FastError {}

pub type FastResult<T> = Result<T, FastError>;
