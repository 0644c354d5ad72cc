pub mod data_uri;
pub mod detection;
pub mod message;
pub mod sighting;

pub use detection::Detection;
pub use message::{Frame, InboundMessage, ServerMessage};
pub use sighting::Sighting;
