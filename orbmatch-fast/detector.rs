use orbmatch_core::{Image, Keypoint, OrbConfig, PyramidLevel};
use crate::error::{FastError, FastResult};
use crate::types::ScaleLevel;
use crate::pyramid::ImagePyramid;
use crate::corner_detection::CornerDetector;
use crate::refinement::KeypointRefinement;
use rayon::prelude::*;

/// Default minimum spacing between surviving corners on one level
pub const DEFAULT_NMS_DISTANCE: f32 = 3.0;

/// Keypoint octaves are stored as `u8`
pub const MAX_LEVELS: usize = u8::MAX as usize + 1;

/// Main FAST corner detector with multi-scale capability
#[derive(Debug, Clone)]
pub struct FastDetector {
    cfg: OrbConfig,
    w: usize,
    h: usize,
    nms_distance: f32,
    scale_levels: Vec<ScaleLevel>,
}

impl FastDetector {
    /// Creates a new FAST detector with validation
    pub fn new(cfg: OrbConfig, width: usize, height: usize) -> FastResult<Self> {
        // Validate dimensions
        if width == 0 || height == 0 {
            return Err(FastError::InvalidImageSize { width, height });
        }

        // FAST requires at least 7x7 image (3-pixel border on each side)
        const MIN_SIZE: usize = 7;
        if width < MIN_SIZE || height < MIN_SIZE {
            return Err(FastError::ImageTooSmall {
                width, height, min_size: MIN_SIZE
            });
        }

        // 0 would detect everything, >127 could cause issues with u8 arithmetic
        if cfg.threshold == 0 || cfg.threshold > 127 {
            return Err(FastError::InvalidThreshold(cfg.threshold));
        }

        let min_dim = std::cmp::min(width, height);
        if cfg.patch_size % 2 == 0 || cfg.patch_size >= min_dim {
            return Err(FastError::InvalidPatchSize {
                patch_size: cfg.patch_size,
                min_image_dim: min_dim,
            });
        }

        if cfg.n_levels == 0 || cfg.n_levels > MAX_LEVELS || (cfg.n_levels > 1 && !(cfg.scale_factor > 1.0)) {
            return Err(FastError::InvalidPyramid {
                n_levels: cfg.n_levels,
                scale_factor: cfg.scale_factor,
            });
        }

        let scale_levels = ImagePyramid::generate_scale_levels(
            width,
            height,
            cfg.n_levels,
            cfg.scale_factor,
            2 * Self::border(&cfg) + 1,
        );

        Ok(Self {
            cfg,
            w: width,
            h: height,
            nms_distance: DEFAULT_NMS_DISTANCE,
            scale_levels,
        })
    }

    /// Override the NMS distance
    pub fn with_nms_distance(mut self, distance: f32) -> FastResult<Self> {
        if !distance.is_finite() || distance < 0.0 {
            return Err(FastError::InvalidNmsDistance(distance));
        }
        self.nms_distance = distance;
        Ok(self)
    }

    /// Pixels excluded at each level edge: the orientation patch must fit, and so must the FAST circle
    fn border(cfg: &OrbConfig) -> usize {
        cfg.edge_threshold.max(cfg.patch_size / 2).max(3)
    }

    /// Validates image data before processing
    fn validate_image(&self, img: &Image) -> FastResult<()> {
        let expected_len = self.w * self.h;
        if img.len() != expected_len {
            return Err(FastError::InvalidImageData {
                expected_len,
                actual_len: img.len(),
            });
        }
        Ok(())
    }

    /// Build the image pyramid the detector runs on
    pub fn build_pyramid(&self, img: &Image) -> FastResult<Vec<PyramidLevel>> {
        self.validate_image(img)?;
        Ok(ImagePyramid::build_image_pyramid(img, self.w, self.h, &self.scale_levels))
    }

    /// Detect keypoints across all scales
    pub fn detect_keypoints(&self, img: &Image) -> FastResult<Vec<Keypoint>> {
        let pyramid = self.build_pyramid(img)?;
        Ok(self.detect_in_pyramid(&pyramid))
    }

    /// Detect keypoints on a pyramid previously built by [`FastDetector::build_pyramid`].
    ///
    /// Coordinates are returned in full-resolution pixels. The result holds at
    /// most `max_features` keypoints, strongest first.
    pub fn detect_in_pyramid(&self, pyramid: &[PyramidLevel]) -> Vec<Keypoint> {
        let per_level: Vec<Vec<Keypoint>> = self
            .scale_levels
            .par_iter()
            .zip(pyramid.par_iter())
            .map(|(scale_level, level)| self.detect_keypoints_at_scale(&level.pixels, scale_level))
            .collect();

        let all_keypoints: Vec<Keypoint> = per_level.into_iter().flatten().collect();
        log::trace!("{} keypoints before retention", all_keypoints.len());

        KeypointRefinement::retain_strongest(all_keypoints, self.cfg.max_features)
    }

    /// Detect keypoints at a specific scale level, mapped back to level 0.
    ///
    /// At most `max_features` keypoints survive per level; none of the dropped
    /// ones could make the global cap.
    pub fn detect_keypoints_at_scale(&self, img: &[u8], scale_level: &ScaleLevel) -> Vec<Keypoint> {
        let corners = CornerDetector::detect(img, scale_level, self.cfg.threshold, Self::border(&self.cfg));
        let mut suppressed = KeypointRefinement::non_maximum_suppression(&corners, self.nms_distance);
        suppressed.truncate(self.cfg.max_features);
        let half = self.cfg.patch_size / 2;

        suppressed
            .into_iter()
            .map(|mut kp| {
                kp.angle = KeypointRefinement::compute_orientation(
                    img,
                    scale_level.width,
                    scale_level.height,
                    kp.x as usize,
                    kp.y as usize,
                    half,
                );
                kp.x *= scale_level.scale;
                kp.y *= scale_level.scale;
                kp.size = self.cfg.patch_size as f32 * scale_level.scale;
                kp
            })
            .collect()
    }

    /// Get scale levels for this detector
    pub fn scale_levels(&self) -> &[ScaleLevel] {
        &self.scale_levels
    }

    /// Get detector configuration
    pub fn config(&self) -> &OrbConfig {
        &self.cfg
    }

    pub fn nms_distance(&self) -> f32 {
        self.nms_distance
    }

    /// Get image dimensions
    pub fn dimensions(&self) -> (usize, usize) {
        (self.w, self.h)
    }
}
