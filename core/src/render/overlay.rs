use image::{Rgba, RgbaImage};

use super::surface::Surface;
use crate::math::Letterbox;
use crate::stream_interface::Detection;

const OVERLAY_COLOR: Rgba<u8> = Rgba([255, 255, 0, 255]);
const LINE_WIDTH: u32 = 2;
const LABEL_LIFT: f32 = 5.0;

/// Draws the latest frame letterboxed onto a surface, with detection boxes
/// and captions on top.
#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    box_space: f32,
}

impl OverlayRenderer {
    pub fn new(box_space: f32) -> Self {
        Self {
            box_space: if box_space > 0.0 { box_space } else { 256.0 },
        }
    }

    /// Always clears the surface. Returns the fit used, or `None` when there
    /// was no drawable image.
    pub fn render<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        image: Option<&RgbaImage>,
        detections: &[Detection],
    ) -> Option<Letterbox> {
        surface.clear();
        let image = image?;
        let fit = Letterbox::fit(surface.width(), surface.height(), image.width(), image.height())?;

        surface.draw_image(image, fit.image_rect());
        for detection in detections {
            let rect = fit.map_box(detection.bbox, self.box_space);
            surface.stroke_rect(rect, OVERLAY_COLOR, LINE_WIDTH);
            surface.fill_text(&detection.caption(), rect.x, rect.y - LABEL_LIFT, OVERLAY_COLOR);
        }
        Some(fit)
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new(256.0)
    }
}
