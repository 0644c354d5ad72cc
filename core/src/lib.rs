//! Live mission streaming core for the NETRA operator console.
//!
//! Frames are captured at a fixed cadence and pushed over a duplex channel;
//! annotated replies are rendered letterboxed onto a display surface, timed,
//! and classified into threat levels that gate operator alerts.

pub mod capture;
pub mod channel;
pub mod math;
pub mod prelude;
pub mod render;
pub mod session;
pub mod sighting;
pub mod stream_interface;
pub mod telemetry;
pub mod threat;

pub use prelude::{ConsoleError, ConsoleResult, StreamConfig};
