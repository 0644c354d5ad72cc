pub mod camera;
pub mod scheduler;
pub mod source;

pub use camera::CameraSource;
pub use scheduler::{FrameCaptureScheduler, TickOutcome};
pub use source::{DirectorySource, SourceConfig, StillImageSource, SyntheticSource, VideoSource};
