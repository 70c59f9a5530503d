//! Match ORB features between two images and label image two with the
//! objects found in image one.
//!
//! ```no_run
//! use orbmatch_cli::{Headless, ImageMatcher, MatchConfig};
//!
//! let matcher = ImageMatcher::new("scene.png", "photo.png", MatchConfig::default())?;
//! let outcome = matcher.match_objects()?;
//! matcher.save_and_display(&outcome, "annotated.png", &Headless)?;
//! # Ok::<(), orbmatch_cli::OrbMatchError>(())
//! ```

mod annotate;
mod config;
mod error;
mod extractor;
mod glyphs;
mod output;
mod pipeline;
mod util;
mod validation;

#[cfg(test)]
mod testing;

pub use annotate::{AnnotationStyle, Annotation, Annotator, DetectedObjects, default_labels};
pub use config::{ConfigResult, MatchConfig, MatcherSettings, OutputSettings, retention_from_hours};
pub use error::{ConfigError, DateError, OrbMatchError, OrbMatchResult, ValidationError};
pub use extractor::{FeatureExtractor, Features, load_image};
pub use output::{
    ArtifactNamer, Clock, DEFAULT_RETENTION, FixedClock, Headless, SweepReport, SystemClock, SystemViewer, Viewer,
    create_image_folder, folder_name, save_annotated, sweep_expired,
};
pub use pipeline::{ImageMatcher, MatchOutcome, OutcomeStatus};
pub use util::{DateComponent, capitalize, capitalize_labels, extract_date_component, get_details_from_json};
pub use validation::{DEFAULT_EXTENSIONS, ValidationConfig, validate_image};

pub use orbmatch_core::{self, Descriptor, Keypoint, Match, MatchMode};
pub use orbmatch_fast::DetectorConfig;
pub use orbmatch_matcher::{DescriptorMatcher, passes_ratio_test};
