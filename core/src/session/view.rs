use image::RgbaImage;
use std::sync::Arc;

use crate::channel::ChannelState;
use crate::stream_interface::Detection;
use crate::telemetry::{MetricsSnapshot, TelemetrySample};
use crate::threat::ThreatLevel;

/// Read-only state published to the UI after every dispatch.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub streaming: bool,
    pub channel: ChannelState,
    /// Connection the channel state belongs to; bumped by each reconnect.
    pub generation: u64,
    pub threat: ThreatLevel,
    pub telemetry: TelemetrySample,
    pub metrics: MetricsSnapshot,
    pub detections: Vec<Detection>,
    pub source: Option<String>,
    /// The rendered overlay surface.
    pub frame: Arc<RgbaImage>,
}

impl SessionView {
    pub fn idle(width: u32, height: u32) -> Self {
        Self {
            streaming: false,
            channel: ChannelState::Connecting,
            generation: 0,
            threat: ThreatLevel::None,
            telemetry: TelemetrySample::default(),
            metrics: MetricsSnapshot::default(),
            detections: Vec::new(),
            source: None,
            frame: Arc::new(RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 255]))),
        }
    }
}
