//! Synthetic images for the unit and integration tests.
//!
//! Shapes are laid out on a grid inside a margin wide enough for the
//! default detector border, so their corners are detectable.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use rand::{Rng, SeedableRng, rngs::StdRng};

const MARGIN: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Rectangle,
    Circle,
    Line,
}

pub fn solid_image(width: u32, height: u32, color: Rgb<u8>) -> RgbImage {
    RgbImage::from_pixel(width, height, color)
}

/// `count` shapes on a `background` canvas, one per grid cell.
///
/// With `fill = None` every shape gets a random bright colour.
pub fn shapes_image(
    width: u32,
    height: u32,
    shape: Shape,
    count: usize,
    background: Rgb<u8>,
    fill: Option<Rgb<u8>>,
    seed: u64,
) -> RgbImage {
    let mut img = solid_image(width, height, background);
    if count == 0 {
        return img;
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let cols = (count as f64).sqrt().ceil() as u32;
    let rows = (count as u32).div_ceil(cols);
    let cell_w = (width.saturating_sub(2 * MARGIN) / cols).max(8);
    let cell_h = (height.saturating_sub(2 * MARGIN) / rows).max(8);

    for i in 0..count as u32 {
        let (cx, cy) = (MARGIN + (i % cols) * cell_w, MARGIN + (i / cols) * cell_h);
        let color = fill.unwrap_or_else(|| {
            Rgb([
                rng.random_range(96..=255),
                rng.random_range(96..=255),
                rng.random_range(96..=255),
            ])
        });

        let w = rng.random_range(cell_w / 3..=(cell_w * 2 / 3).max(cell_w / 3 + 1)).max(4);
        let h = rng.random_range(cell_h / 3..=(cell_h * 2 / 3).max(cell_h / 3 + 1)).max(4);
        let x = cx + rng.random_range(0..=cell_w.saturating_sub(w));
        let y = cy + rng.random_range(0..=cell_h.saturating_sub(h));

        match shape {
            Shape::Rectangle => {
                draw_filled_rect_mut(&mut img, Rect::at(x as i32, y as i32).of_size(w, h), color);
            }
            Shape::Circle => {
                let r = (w.min(h) / 2) as i32;
                draw_filled_circle_mut(&mut img, ((x + w / 2) as i32, (y + h / 2) as i32), r, color);
            }
            Shape::Line => {
                draw_line_segment_mut(&mut img, (x as f32, y as f32), ((x + w) as f32, (y + h) as f32), color);
            }
        }
    }

    img
}

/// Rectangles on black
pub fn rectangles_image(width: u32, height: u32, count: usize, fill: Option<Rgb<u8>>, seed: u64) -> RgbImage {
    shapes_image(width, height, Shape::Rectangle, count, Rgb([0, 0, 0]), fill, seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn non_background(img: &RgbImage, background: Rgb<u8>) -> usize {
        img.pixels().filter(|p| **p != background).count()
    }

    #[test]
    fn test_seeded_images_repeat() {
        assert_eq!(rectangles_image(200, 200, 5, None, 9), rectangles_image(200, 200, 5, None, 9));
        assert_ne!(rectangles_image(200, 200, 5, None, 9), rectangles_image(200, 200, 5, None, 10));
    }

    #[test]
    fn test_shapes_are_drawn_inside_margin() {
        let black = Rgb([0, 0, 0]);
        for shape in [Shape::Rectangle, Shape::Circle, Shape::Line] {
            let img = shapes_image(240, 200, shape, 3, black, None, 1);
            assert!(non_background(&img, black) > 0, "{shape:?} drew nothing");
            for (x, y, p) in img.enumerate_pixels() {
                if *p != black {
                    assert!(x >= MARGIN && y >= MARGIN, "{shape:?} pixel at ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn test_fixed_fill() {
        let white = Rgb([255, 255, 255]);
        let fill = Rgb([245, 245, 245]);
        let img = shapes_image(200, 200, Shape::Rectangle, 3, white, Some(fill), 4);
        assert!(img.pixels().all(|p| *p == white || *p == fill));
        assert!(non_background(&img, white) > 0);
    }

    #[test]
    fn test_zero_shapes() {
        let img = rectangles_image(120, 100, 0, None, 0);
        assert_eq!(non_background(&img, Rgb([0, 0, 0])), 0);
    }
}
