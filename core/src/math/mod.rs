pub mod letterbox;

pub use letterbox::{Letterbox, Rect};
