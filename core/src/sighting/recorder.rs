use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::future::Future;

use crate::prelude::{ConsoleError, ConsoleResult};
use crate::render::Surface;
use crate::stream_interface::{Detection, Sighting};
use crate::telemetry::LogManager;
use crate::threat::Notification;

/// External persistence collaborator for sightings.
pub trait SightingStore: Send + Sync + 'static {
    fn submit(&self, sighting: Sighting) -> impl Future<Output = ConsoleResult<()>> + Send;
}

/// Builds sightings from the rendered overlay surface.
#[derive(Debug, Clone)]
pub struct SightingRecorder {
    snapshot_quality: u8,
    offset: FixedOffset,
}

impl SightingRecorder {
    pub fn new(snapshot_quality: u8, offset_minutes: i32) -> Self {
        Self {
            snapshot_quality,
            offset: FixedOffset::east_opt(offset_minutes * 60).unwrap_or_else(|| Utc.fix()),
        }
    }

    pub fn capture<S: Surface + ?Sized>(
        &self,
        surface: &S,
        detections: &[Detection],
        notes: Option<&str>,
    ) -> ConsoleResult<Sighting> {
        self.capture_at(Utc::now(), surface, detections, notes)
    }

    /// Fails with [`ConsoleError::UserCancelled`] when `notes` is absent or
    /// blank; the surface is not touched in that case.
    pub fn capture_at<S: Surface + ?Sized>(
        &self,
        now: DateTime<Utc>,
        surface: &S,
        detections: &[Detection],
        notes: Option<&str>,
    ) -> ConsoleResult<Sighting> {
        let notes = notes
            .filter(|notes| !notes.trim().is_empty())
            .ok_or(ConsoleError::UserCancelled)?;
        let snapshot = surface.snapshot(self.snapshot_quality)?;
        let timestamp = now
            .with_timezone(&self.offset)
            .format("%-I:%M:%S %P")
            .to_string();
        Ok(Sighting {
            timestamp,
            notes: notes.to_string(),
            snapshot,
            detections: detections.to_vec(),
        })
    }
}

pub(crate) fn outcome_notification(logger: &LogManager, outcome: ConsoleResult<()>) -> Notification {
    match outcome {
        Ok(()) => {
            logger.record("sighting stored");
            Notification::success("Sighting logged successfully!")
        }
        Err(err) => {
            logger.warn(&format!("sighting rejected: {err}"));
            Notification::error("Failed to log sighting.")
        }
    }
}
