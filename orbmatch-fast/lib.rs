//! Multi-scale FAST-9 corner detection with intensity-centroid orientation.
//!
//! Keypoints are returned in full-resolution coordinates, strongest first,
//! capped at `OrbConfig::max_features`.

mod builder;
mod config;
mod corner_detection;
mod detector;
mod error;
mod pyramid;
mod refinement;
mod types;
mod utils;

pub use builder::DetectorBuilder;
pub use config::DetectorConfig;
pub use corner_detection::{CornerDetector, ARC_LENGTH};
pub use detector::{FastDetector, DEFAULT_NMS_DISTANCE, MAX_LEVELS};
pub use error::{FastError, FastResult};
pub use pyramid::ImagePyramid;
pub use refinement::KeypointRefinement;
pub use types::ScaleLevel;
pub use utils::has_consecutive_bits;
