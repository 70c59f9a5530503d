use std::collections::BTreeMap;
use std::path::PathBuf;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_circle_mut, draw_text_mut};
use imageproc::rect::Rect;
use orbmatch_core::{Keypoint, Match};
use serde::{Deserialize, Serialize};

use crate::error::{OrbMatchError, OrbMatchResult, ValidationError};
use crate::glyphs::{self, GLYPH_ADVANCE, GLYPH_HEIGHT};

/// Label -> position in image two; a later match overwrites an earlier one
pub type DetectedObjects = BTreeMap<String, (f32, f32)>;

/// `Object1`, `Object2`, ... one per image-one keypoint
pub fn default_labels(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("Object{}", i + 1)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationStyle {
    /// RGB text and marker colour
    pub color: [u8; 3],
    /// Text height in pixels
    pub text_height: f32,
    /// Radius of the circle drawn at each matched point; 0 disables it
    pub marker_radius: i32,
    /// TrueType/OpenType font; the built-in bitmap font is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<PathBuf>,
    /// Labels for image-one keypoints, used cyclically
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    /// Upper-case the first letter and lower-case the rest of each label
    pub capitalize: bool,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            color: [255, 0, 0],
            text_height: 14.0,
            marker_radius: 3,
            font: None,
            labels: None,
            capitalize: false,
        }
    }
}

/// Annotated copy of image two plus where each label landed
#[derive(Debug, Clone)]
pub struct Annotation {
    pub image: RgbImage,
    pub detected: DetectedObjects,
}

pub struct Annotator {
    color: Rgb<u8>,
    text_height: f32,
    marker_radius: i32,
    font: Option<FontVec>,
}

impl Annotator {
    pub fn new(style: &AnnotationStyle) -> OrbMatchResult<Self> {
        let font = match &style.font {
            Some(path) => {
                let data = std::fs::read(path).map_err(|source| OrbMatchError::UnreadableFile {
                    path: path.clone(),
                    source,
                })?;
                let font = FontVec::try_from_vec(data)
                    .map_err(|e| OrbMatchError::Font(format!("{}: {}", path.display(), e)))?;
                Some(font)
            }
            None => None,
        };

        Ok(Self {
            color: Rgb(style.color),
            text_height: style.text_height.max(GLYPH_HEIGHT as f32),
            marker_radius: style.marker_radius.max(0),
            font,
        })
    }

    /// Draw the image-one label of every match at its image-two keypoint.
    ///
    /// `labels` is indexed cyclically by `query_idx`. The input image is left untouched.
    pub fn annotate(
        &self,
        image: &RgbImage,
        matches: &[Match],
        query_keypoints: &[Keypoint],
        train_keypoints: &[Keypoint],
        labels: &[String],
    ) -> Result<Annotation, ValidationError> {
        if labels.is_empty() {
            return Err(ValidationError::EmptyLabels);
        }

        let mut canvas = image.clone();
        let mut detected = DetectedObjects::new();

        for m in matches {
            debug_assert!(m.query_idx < query_keypoints.len());
            let (x, y) = train_keypoints[m.train_idx].position();
            let label = &labels[m.query_idx % labels.len()];

            if self.marker_radius > 0 {
                draw_hollow_circle_mut(&mut canvas, (x as i32, y as i32), self.marker_radius, self.color);
            }
            self.draw_label(&mut canvas, x, y, label);
            detected.insert(label.clone(), (x, y));
        }

        Ok(Annotation { image: canvas, detected })
    }

    fn draw_label(&self, canvas: &mut RgbImage, x: f32, y: f32, label: &str) {
        let (tx, ty) = (x as i32 + self.marker_radius + 1, y as i32);
        match &self.font {
            Some(font) => draw_text_mut(canvas, self.color, tx, ty, PxScale::from(self.text_height), font, label),
            None => self.draw_bitmap_label(canvas, tx, ty, label),
        }
    }

    fn draw_bitmap_label(&self, canvas: &mut RgbImage, x: i32, y: i32, label: &str) {
        let cell = (self.text_height / GLYPH_HEIGHT as f32).floor().max(1.0) as u32;

        // keep the label on the canvas when the point is near the right edge
        let width = glyphs::text_width(label) * cell;
        let x = x.min(canvas.width() as i32 - width as i32).max(0);

        for (i, c) in label.chars().enumerate() {
            let origin_x = x + (i as u32 * GLYPH_ADVANCE * cell) as i32;
            for (col, row) in glyphs::lit_cells(c) {
                let rect = Rect::at(origin_x + (col * cell) as i32, y + (row * cell) as i32).of_size(cell, cell);
                draw_filled_rect_mut(canvas, rect, self.color);
            }
        }
    }
}
