use serde::{Deserialize, Serialize};

use super::classifier::ThreatClassifier;
use super::level::ThreatLevel;
use crate::stream_interface::Detection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

/// One user-facing toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Edge-triggered alerting over consecutive threat levels.
#[derive(Debug, Default)]
pub struct ThreatNotifier {
    previous: ThreatLevel,
}

impl ThreatNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> ThreatLevel {
        self.previous
    }

    /// Records `level` and returns a notification only when it differs from
    /// the previously observed level. Transitions to `None` stay silent.
    pub fn observe(
        &mut self,
        level: ThreatLevel,
        detections: &[Detection],
        classifier: &ThreatClassifier,
    ) -> Option<Notification> {
        if level == self.previous {
            return None;
        }
        self.previous = level;
        match level {
            ThreatLevel::None => None,
            ThreatLevel::Critical => classifier.first_critical(detections).map(|det| {
                Notification::error(format!("CRITICAL THREAT DETECTED: {}", det.label))
            }),
            ThreatLevel::Low => detections
                .first()
                .map(|det| Notification::warning(format!("Anomaly Detected: {}", det.label))),
        }
    }

    pub fn reset(&mut self) {
        self.previous = ThreatLevel::None;
    }
}
