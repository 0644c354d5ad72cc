use serde::{Deserialize, Serialize};
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

/// Session counters published next to the telemetry sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub frames_sent: usize,
    pub frames_dropped: usize,
    pub capture_failures: usize,
    pub messages_received: usize,
    pub invalid_messages: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut MetricsSnapshot)) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut metrics);
        }
    }

    pub fn record_sent(&self) {
        self.update(|m| m.frames_sent += 1);
    }

    pub fn record_dropped(&self) {
        self.update(|m| m.frames_dropped += 1);
    }

    pub fn record_capture_failure(&self) {
        self.update(|m| m.capture_failures += 1);
    }

    pub fn record_received(&self) {
        self.update(|m| m.messages_received += 1);
    }

    pub fn record_invalid(&self) {
        self.update(|m| m.invalid_messages += 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
