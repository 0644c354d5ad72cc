use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::capture::source::SourceConfig;

/// Shared configuration for a live streaming session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamConfig {
    pub channel_url: String,
    pub api_base: String,
    pub capture_period_ms: u64,
    pub capture_width: u32,
    pub capture_height: u32,
    pub jpeg_quality: u8,
    pub snapshot_quality: u8,
    pub display_width: u32,
    pub display_height: u32,
    /// Side length of the normalization space detection boxes arrive in.
    pub box_space: f32,
    pub fps_window_ms: u64,
    pub critical_labels: Vec<String>,
    pub timestamp_offset_minutes: i32,
    pub source: SourceConfig,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channel_url: "ws://127.0.0.1:8000/ws/live-enhance/".into(),
            api_base: "http://127.0.0.1:8000".into(),
            capture_period_ms: 100,
            capture_width: 320,
            capture_height: 240,
            jpeg_quality: 60,
            snapshot_quality: 80,
            display_width: 640,
            display_height: 480,
            box_space: 256.0,
            fps_window_ms: 1000,
            critical_labels: vec!["Submarine".into(), "Mine".into()],
            timestamp_offset_minutes: 330,
            source: SourceConfig::default(),
        }
    }
}

impl StreamConfig {
    pub fn capture_period(&self) -> Duration {
        Duration::from_millis(self.capture_period_ms.max(1))
    }

    pub fn fps_window(&self) -> Duration {
        Duration::from_millis(self.fps_window_ms.max(1))
    }

    pub fn sighting_endpoint(&self) -> String {
        format!("{}/log-sighting", self.api_base.trim_end_matches('/'))
    }
}

/// Common error type for the streaming core.
#[derive(thiserror::Error, Debug)]
pub enum ConsoleError {
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("channel not open")]
    ChannelNotOpen,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("sighting annotation withheld")]
    UserCancelled,
    #[error("sighting submission failed: {0}")]
    PersistenceFailure(String),
    #[error("invalid inbound message: {0}")]
    InvalidMessage(String),
    #[error("encoding failure: {0}")]
    Encode(String),
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;
