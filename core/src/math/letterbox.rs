/// Axis-aligned rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Aspect-preserving fit of an image inside a surface, centred with
/// symmetric padding on the slack axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub ratio: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub scaled_width: f32,
    pub scaled_height: f32,
}

impl Letterbox {
    /// Returns `None` when either side has a zero dimension.
    pub fn fit(surface_width: u32, surface_height: u32, image_width: u32, image_height: u32) -> Option<Self> {
        if surface_width == 0 || surface_height == 0 || image_width == 0 || image_height == 0 {
            return None;
        }
        let h_ratio = surface_width as f32 / image_width as f32;
        let v_ratio = surface_height as f32 / image_height as f32;
        let ratio = h_ratio.min(v_ratio);
        let scaled_width = image_width as f32 * ratio;
        let scaled_height = image_height as f32 * ratio;
        Some(Self {
            ratio,
            offset_x: (surface_width as f32 - scaled_width) / 2.0,
            offset_y: (surface_height as f32 - scaled_height) / 2.0,
            scaled_width,
            scaled_height,
        })
    }

    /// Destination rectangle of the scaled image.
    pub fn image_rect(&self) -> Rect {
        Rect::new(self.offset_x, self.offset_y, self.scaled_width, self.scaled_height)
    }

    /// Maps an `[x1, y1, x2, y2]` box from a `space`×`space` normalization
    /// grid onto the surface.
    pub fn map_box(&self, bbox: [f32; 4], space: f32) -> Rect {
        let [x1, y1, x2, y2] = bbox;
        let scale_x = self.scaled_width / space;
        let scale_y = self.scaled_height / space;
        Rect::new(
            self.offset_x + x1 * scale_x,
            self.offset_y + y1 * scale_y,
            (x2 - x1) * scale_x,
            (y2 - y1) * scale_y,
        )
    }
}
