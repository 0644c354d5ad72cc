use image::imageops::{self, FilterType};
use std::time::{Duration, Instant};
use tokio::time::{interval, Interval, MissedTickBehavior};

use super::source::VideoSource;
use crate::channel::{ChannelState, FrameSink, RealtimeChannel};
use crate::prelude::{ConsoleError, ConsoleResult};
use crate::stream_interface::{data_uri, Frame};
use crate::telemetry::LogManager;

/// What a single capture tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No source is running.
    Idle,
    /// Channel not open; nothing captured, nothing queued.
    Skipped,
    Sent,
    Failed,
}

/// Samples a video source at a fixed period and pushes each encoded frame
/// straight to the channel.
pub struct FrameCaptureScheduler {
    period: Duration,
    width: u32,
    height: u32,
    quality: u8,
    source: Option<Box<dyn VideoSource>>,
    ticker: Option<Interval>,
    logger: LogManager,
}

impl FrameCaptureScheduler {
    pub fn new(period: Duration, width: u32, height: u32, quality: u8) -> Self {
        Self {
            period,
            width: width.max(1),
            height: height.max(1),
            quality,
            source: None,
            ticker: None,
            logger: LogManager::new("capture"),
        }
    }

    pub fn is_running(&self) -> bool {
        self.source.is_some()
    }

    pub fn source_name(&self) -> Option<String> {
        self.source.as_ref().map(|source| source.name())
    }

    /// Acquires `source` and arms the ticker. A previous source is released
    /// first.
    pub fn start(&mut self, mut source: Box<dyn VideoSource>) -> ConsoleResult<()> {
        self.stop();
        source.acquire()?;
        self.logger.record(&format!(
            "capturing {} every {:?} at {}x{}",
            source.name(),
            self.period,
            self.width,
            self.height
        ));
        self.source = Some(source);
        Ok(())
    }

    /// Cancels the ticker and releases the source. Idempotent.
    pub fn stop(&mut self) {
        self.ticker = None;
        if let Some(mut source) = self.source.take() {
            source.release();
            self.logger.record(&format!("released {}", source.name()));
        }
    }

    /// Resolves on the next capture deadline; never resolves while stopped.
    /// Missed deadlines are skipped rather than replayed.
    pub async fn wait_tick(&mut self) {
        if self.source.is_none() {
            std::future::pending::<()>().await;
        }
        let period = self.period;
        let ticker = self.ticker.get_or_insert_with(|| {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });
        ticker.tick().await;
    }

    /// Captures, encodes and sends one frame. `clock` is read after encoding
    /// so the send stamp excludes local capture time.
    pub fn tick<K, C>(&mut self, channel: &mut RealtimeChannel<K>, clock: C) -> TickOutcome
    where
        K: FrameSink,
        C: FnOnce() -> Instant,
    {
        let Some(source) = self.source.as_mut() else {
            return TickOutcome::Idle;
        };
        if channel.state() != ChannelState::Open {
            return TickOutcome::Skipped;
        }

        let payload = match Self::capture(&mut **source, self.width, self.height, self.quality) {
            Ok(payload) => payload,
            Err(err) => {
                self.logger.warn(&format!("capture failed: {err}"));
                return TickOutcome::Failed;
            }
        };

        match channel.send(Frame::new(payload, clock())) {
            Ok(()) => TickOutcome::Sent,
            Err(ConsoleError::ChannelNotOpen) => TickOutcome::Skipped,
            Err(err) => {
                self.logger.warn(&format!("send failed: {err}"));
                TickOutcome::Failed
            }
        }
    }

    fn capture(source: &mut dyn VideoSource, width: u32, height: u32, quality: u8) -> ConsoleResult<String> {
        let frame = source.current_frame()?;
        let downsampled = if frame.dimensions() == (width, height) {
            frame
        } else {
            imageops::resize(&frame, width, height, FilterType::Triangle)
        };
        data_uri::jpeg_from_rgb(&downsampled, quality)
    }
}

impl Drop for FrameCaptureScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
