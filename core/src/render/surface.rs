use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};

use super::glyphs::{glyph, GLYPH_HEIGHT, GLYPH_WIDTH};
use crate::math::Rect;
use crate::prelude::ConsoleResult;
use crate::stream_interface::data_uri;

/// Drawing target shaped after a 2D canvas context.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn clear(&mut self);
    fn draw_image(&mut self, image: &RgbaImage, dest: Rect);
    fn stroke_rect(&mut self, rect: Rect, color: Rgba<u8>, line_width: u32);
    /// `y` is the text baseline.
    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: Rgba<u8>);
    /// Encodes the current contents as a JPEG `data:` URI.
    fn snapshot(&self, quality: u8) -> ConsoleResult<String>;
}

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);
const TEXT_SCALE: u32 = 2;
/// Coordinates are clamped this far past the surface edges before integer
/// math, so off-surface geometry from the wire stays off-surface.
const MARGIN: f32 = 4096.0;

/// Rounds a surface coordinate to a pixel index within
/// `[-MARGIN, limit + MARGIN]`. NaN lands off-surface.
fn to_pixel(value: f32, limit: u32) -> i64 {
    if value.is_nan() {
        return -(MARGIN as i64);
    }
    value.round().clamp(-MARGIN, limit as f32 + MARGIN) as i64
}

/// Fixed-size pixel surface backing the operator display.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    canvas: RgbaImage,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: RgbaImage::from_pixel(width, height, BACKGROUND),
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Fills the half-open pixel range `[x0, x1) × [y0, y1)`, clipped.
    fn fill_block(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgba<u8>) {
        let x0 = x0.max(0);
        let y0 = y0.max(0);
        let x1 = x1.min(self.canvas.width() as i64);
        let y1 = y1.min(self.canvas.height() as i64);
        for y in y0..y1 {
            for x in x0..x1 {
                self.canvas.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

impl Surface for RasterSurface {
    fn width(&self) -> u32 {
        self.canvas.width()
    }

    fn height(&self) -> u32 {
        self.canvas.height()
    }

    fn clear(&mut self) {
        for pixel in self.canvas.pixels_mut() {
            *pixel = BACKGROUND;
        }
    }

    fn draw_image(&mut self, image: &RgbaImage, dest: Rect) {
        let width = dest.width.round() as u32;
        let height = dest.height.round() as u32;
        if width == 0 || height == 0 {
            return;
        }
        if width > self.canvas.width().saturating_mul(4) || height > self.canvas.height().saturating_mul(4) {
            return;
        }
        let x = to_pixel(dest.x, self.canvas.width());
        let y = to_pixel(dest.y, self.canvas.height());
        if image.dimensions() == (width, height) {
            imageops::overlay(&mut self.canvas, image, x, y);
        } else {
            let scaled = imageops::resize(image, width, height, FilterType::Triangle);
            imageops::overlay(&mut self.canvas, &scaled, x, y);
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgba<u8>, line_width: u32) {
        let half = line_width as f32 / 2.0;
        let (w, h) = self.canvas.dimensions();
        let left = to_pixel(rect.x - half, w);
        let right = to_pixel(rect.right() + half, w);
        let top = to_pixel(rect.y - half, h);
        let bottom = to_pixel(rect.bottom() + half, h);
        let inner_left = to_pixel(rect.x + half, w);
        let inner_right = to_pixel(rect.right() - half, w);
        let inner_top = to_pixel(rect.y + half, h);
        let inner_bottom = to_pixel(rect.bottom() - half, h);

        self.fill_block(left, top, right, inner_top, color);
        self.fill_block(left, inner_bottom, right, bottom, color);
        self.fill_block(left, inner_top, inner_left, inner_bottom, color);
        self.fill_block(inner_right, inner_top, right, inner_bottom, color);
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: Rgba<u8>) {
        let (w, h) = self.canvas.dimensions();
        let top = to_pixel(y, h) - (GLYPH_HEIGHT * TEXT_SCALE) as i64;
        let advance = ((GLYPH_WIDTH + 1) * TEXT_SCALE) as i64;
        let scale = TEXT_SCALE as i64;
        let mut pen_x = to_pixel(x, w);
        for c in text.chars() {
            if pen_x >= w as i64 {
                break;
            }
            for (row, bits) in glyph(c).iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                        let px = pen_x + col as i64 * scale;
                        let py = top + row as i64 * scale;
                        self.fill_block(px, py, px + scale, py + scale, color);
                    }
                }
            }
            pen_x += advance;
        }
    }

    fn snapshot(&self, quality: u8) -> ConsoleResult<String> {
        let rgb = DynamicImage::ImageRgba8(self.canvas.clone()).to_rgb8();
        data_uri::jpeg_from_rgb(&rgb, quality)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum DrawOp {
        Clear,
        Image { source: (u32, u32), dest: Rect },
        Stroke(Rect),
        Text { text: String, x: f32, y: f32 },
    }

    /// Records draw calls instead of rasterising them.
    #[derive(Debug)]
    pub struct RecordingSurface {
        pub width: u32,
        pub height: u32,
        pub ops: Vec<DrawOp>,
    }

    impl RecordingSurface {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                ops: Vec::new(),
            }
        }

        pub fn strokes(&self) -> Vec<Rect> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    DrawOp::Stroke(rect) => Some(*rect),
                    _ => None,
                })
                .collect()
        }
    }

    impl Surface for RecordingSurface {
        fn width(&self) -> u32 {
            self.width
        }

        fn height(&self) -> u32 {
            self.height
        }

        fn clear(&mut self) {
            self.ops.push(DrawOp::Clear);
        }

        fn draw_image(&mut self, image: &RgbaImage, dest: Rect) {
            self.ops.push(DrawOp::Image {
                source: image.dimensions(),
                dest,
            });
        }

        fn stroke_rect(&mut self, rect: Rect, _color: Rgba<u8>, _line_width: u32) {
            self.ops.push(DrawOp::Stroke(rect));
        }

        fn fill_text(&mut self, text: &str, x: f32, y: f32, _color: Rgba<u8>) {
            self.ops.push(DrawOp::Text {
                text: text.to_string(),
                x,
                y,
            });
        }

        fn snapshot(&self, _quality: u8) -> ConsoleResult<String> {
            Ok(format!("snapshot:{}", self.ops.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YELLOW: Rgba<u8> = Rgba([255, 255, 0, 255]);

    #[test]
    fn clear_resets_every_pixel() {
        let mut surface = RasterSurface::new(8, 8);
        surface.stroke_rect(Rect::new(1.0, 1.0, 4.0, 4.0), YELLOW, 2);
        surface.clear();
        assert!(surface.pixels().pixels().all(|p| *p == BACKGROUND));
    }

    #[test]
    fn stroke_leaves_interior_untouched() {
        let mut surface = RasterSurface::new(32, 32);
        surface.stroke_rect(Rect::new(4.0, 4.0, 20.0, 20.0), YELLOW, 2);
        assert_eq!(*surface.pixels().get_pixel(4, 4), YELLOW);
        assert_eq!(*surface.pixels().get_pixel(23, 14), YELLOW);
        assert_eq!(*surface.pixels().get_pixel(14, 14), BACKGROUND);
    }

    #[test]
    fn stroke_outside_surface_is_clipped() {
        let mut surface = RasterSurface::new(16, 16);
        surface.stroke_rect(Rect::new(-40.0, -40.0, 200.0, 200.0), YELLOW, 2);
        assert!(surface.pixels().pixels().all(|p| *p == BACKGROUND));
    }

    #[test]
    fn draw_image_scales_into_destination() {
        let mut surface = RasterSurface::new(40, 20);
        let red = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        surface.draw_image(&red, Rect::new(10.0, 0.0, 20.0, 20.0));
        assert_eq!(surface.pixels().get_pixel(20, 10)[0], 255);
        assert_eq!(*surface.pixels().get_pixel(5, 10), BACKGROUND);
        assert_eq!(*surface.pixels().get_pixel(35, 10), BACKGROUND);
    }

    #[test]
    fn text_is_drawn_above_baseline() {
        let mut surface = RasterSurface::new(64, 32);
        surface.fill_text("I", 0.0, 20.0, YELLOW);
        let lit_rows: Vec<u32> = (0..32)
            .filter(|&y| (0..64).any(|x| *surface.pixels().get_pixel(x, y) == YELLOW))
            .collect();
        assert_eq!(lit_rows.first(), Some(&6));
        assert_eq!(lit_rows.last(), Some(&19));
    }

    #[test]
    fn extreme_coordinates_are_clipped_without_overflow() {
        let mut surface = RasterSurface::new(16, 16);
        for value in [f32::MAX, -1e20, f32::INFINITY, f32::NEG_INFINITY, f32::NAN] {
            surface.stroke_rect(Rect::new(0.0, value, 10.0, 10.0), YELLOW, 2);
            surface.stroke_rect(Rect::new(value, 0.0, value, value), YELLOW, 2);
            surface.fill_text("MINE (90%)", value, value, YELLOW);
            surface.fill_text("MINE (90%)", 0.0, value, YELLOW);
        }
        assert!(surface.pixels().pixels().all(|p| *p == BACKGROUND));
    }

    #[test]
    fn oversized_image_destination_is_skipped() {
        let mut surface = RasterSurface::new(8, 8);
        let red = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        surface.draw_image(&red, Rect::new(0.0, 0.0, 1e9, 1e9));
        assert!(surface.pixels().pixels().all(|p| *p == BACKGROUND));
    }

    #[test]
    fn snapshot_is_jpeg_data_uri() {
        let surface = RasterSurface::new(64, 48);
        let uri = surface.snapshot(80).unwrap();
        let decoded = data_uri::decode_image(&uri).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }
}
