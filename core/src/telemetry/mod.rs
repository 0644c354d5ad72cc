pub mod aggregator;
pub mod log;
pub mod metrics;

pub use aggregator::{TelemetryAggregator, TelemetrySample};
pub use log::LogManager;
pub use metrics::{MetricsRecorder, MetricsSnapshot};
