use std::path::{Path, PathBuf};

use image::RgbImage;
use orbmatch_core::{Keypoint, Match};
use orbmatch_matcher::DescriptorMatcher;

use crate::annotate::{Annotation, Annotator, DetectedObjects, default_labels};
use crate::config::MatchConfig;
use crate::error::{OrbMatchResult, ValidationError};
use crate::extractor::{FeatureExtractor, Features, load_image};
use crate::output::{Viewer, save_annotated};
use crate::util::capitalize_labels;
use crate::validation::validate_image;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// At least one match was drawn
    Matched,
    /// Both images had features but none matched
    NoMatches,
    /// One of the images produced no features
    EmptyFeatures,
}

/// Result of matching image one against image two
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub status: OutcomeStatus,
    /// Sorted ascending by distance
    pub matches: Vec<Match>,
    /// Copy of image two, annotated when there were matches
    pub annotated: RgbImage,
    pub detected: DetectedObjects,
    pub query_keypoints: Vec<Keypoint>,
    pub train_keypoints: Vec<Keypoint>,
}

/// Labels image two with the objects found in image one
pub struct ImageMatcher {
    image1: PathBuf,
    image2: PathBuf,
    config: MatchConfig,
    extractor: FeatureExtractor,
    matcher: DescriptorMatcher,
    annotator: Annotator,
}

impl ImageMatcher {
    /// Validates both images and the configuration before any feature work
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(image1: P, image2: Q, config: MatchConfig) -> OrbMatchResult<Self> {
        validate_image(&image1, &config.validation)?;
        validate_image(&image2, &config.validation)?;
        if matches!(&config.annotation.labels, Some(labels) if labels.is_empty()) {
            return Err(ValidationError::EmptyLabels.into());
        }

        let extractor = FeatureExtractor::new(config.detector.clone())?;
        let matcher = config.matcher.build()?;
        let annotator = Annotator::new(&config.annotation)?;

        Ok(Self {
            image1: image1.as_ref().to_path_buf(),
            image2: image2.as_ref().to_path_buf(),
            config,
            extractor,
            matcher,
            annotator,
        })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn image_paths(&self) -> (&Path, &Path) {
        (&self.image1, &self.image2)
    }

    pub fn detect_features<P: AsRef<Path>>(&self, path: P) -> OrbMatchResult<Features> {
        self.extractor.extract_path(path)
    }

    pub fn match_features(&self, query: &Features, train: &Features) -> Vec<Match> {
        self.matcher.match_descriptors(&query.descriptors, &train.descriptors)
    }

    /// Configured labels, or `Object1..=ObjectN` for `query_len` keypoints
    pub fn labels(&self, query_len: usize) -> Vec<String> {
        let labels = match &self.config.annotation.labels {
            Some(labels) => labels.clone(),
            None => default_labels(query_len),
        };
        if self.config.annotation.capitalize {
            capitalize_labels(&labels)
        } else {
            labels
        }
    }

    pub fn annotate_image(
        &self,
        image: &RgbImage,
        matches: &[Match],
        query: &[Keypoint],
        train: &[Keypoint],
        labels: &[String],
    ) -> OrbMatchResult<Annotation> {
        Ok(self.annotator.annotate(image, matches, query, train, labels)?)
    }

    /// Extract, match and annotate.
    ///
    /// Missing features or matches are reported through
    /// [`MatchOutcome::status`]; the annotated image is then a plain copy of
    /// image two.
    pub fn match_objects(&self) -> OrbMatchResult<MatchOutcome> {
        let query = self.detect_features(&self.image1)?;
        let image2 = load_image(&self.image2)?;
        let train = self.extractor.extract(&image2.to_luma8())?;
        let image2 = image2.to_rgb8();

        log::info!(
            "{} features in {}, {} in {}",
            query.len(),
            self.image1.display(),
            train.len(),
            self.image2.display()
        );

        if query.is_empty() || train.is_empty() {
            if query.is_empty() {
                log::warn!("No keypoints detected in {}", self.image1.display());
            }
            if train.is_empty() {
                log::warn!("No keypoints detected in {}", self.image2.display());
            }
            return Ok(MatchOutcome {
                status: OutcomeStatus::EmptyFeatures,
                matches: Vec::new(),
                annotated: image2,
                detected: DetectedObjects::new(),
                query_keypoints: query.keypoints,
                train_keypoints: train.keypoints,
            });
        }

        let matches = self.match_features(&query, &train);
        if matches.is_empty() {
            log::info!("No good matches found");
            return Ok(MatchOutcome {
                status: OutcomeStatus::NoMatches,
                matches,
                annotated: image2,
                detected: DetectedObjects::new(),
                query_keypoints: query.keypoints,
                train_keypoints: train.keypoints,
            });
        }

        let labels = self.labels(query.len());
        let annotation = self.annotate_image(&image2, &matches, &query.keypoints, &train.keypoints, &labels)?;

        log::info!("{} matches, {} labelled objects", matches.len(), annotation.detected.len());
        for (label, (x, y)) in &annotation.detected {
            log::info!("{} -> ({:.1}, {:.1})", label, x, y);
        }

        Ok(MatchOutcome {
            status: OutcomeStatus::Matched,
            matches,
            annotated: annotation.image,
            detected: annotation.detected,
            query_keypoints: query.keypoints,
            train_keypoints: train.keypoints,
        })
    }

    /// Write the annotated image to `path`, then hand it to `viewer`
    pub fn save_and_display<P: AsRef<Path>>(
        &self,
        outcome: &MatchOutcome,
        path: P,
        viewer: &dyn Viewer,
    ) -> OrbMatchResult<()> {
        let path = path.as_ref();
        save_annotated(&outcome.annotated, path)?;
        log::info!("Annotated image saved to {}", path.display());
        viewer.show(path)?;
        Ok(())
    }
}
