pub mod glyphs;
pub mod overlay;
pub mod surface;

pub use overlay::OverlayRenderer;
pub use surface::{RasterSurface, Surface};
