pub mod client;
pub mod recorder;

pub use client::HttpSightingStore;
pub use recorder::{SightingRecorder, SightingStore};
