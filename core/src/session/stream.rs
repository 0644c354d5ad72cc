use image::RgbaImage;
use std::sync::Arc;
use std::time::Instant;

use super::event::{SessionCommand, SessionEffect, SessionEvent};
use super::view::SessionView;
use crate::capture::{FrameCaptureScheduler, TickOutcome};
use crate::channel::{ChannelNotice, ChannelState, FrameSink, RealtimeChannel};
use crate::prelude::{ConsoleError, ConsoleResult, StreamConfig};
use crate::render::{OverlayRenderer, RasterSurface, Surface};
use crate::sighting::recorder::{outcome_notification, SightingRecorder};
use crate::stream_interface::{data_uri, Detection, ServerMessage};
use crate::telemetry::{LogManager, MetricsRecorder, TelemetryAggregator};
use crate::threat::{Notification, ThreatClassifier, ThreatLevel, ThreatNotifier};

/// One live mission stream. Every field has a single writer: [`dispatch`].
///
/// The image slot always holds the most recently decoded frame and the
/// detection slot the most recently received set. Decoding happens inline on
/// receipt, so both normally come from the same message; when a frame fails
/// to decode the previous image is kept and paired with the new detections.
///
/// [`dispatch`]: StreamSession::dispatch
pub struct StreamSession<K: FrameSink> {
    config: StreamConfig,
    channel: RealtimeChannel<K>,
    scheduler: FrameCaptureScheduler,
    telemetry: TelemetryAggregator,
    classifier: ThreatClassifier,
    notifier: ThreatNotifier,
    renderer: OverlayRenderer,
    recorder: SightingRecorder,
    surface: RasterSurface,
    frame: Arc<RgbaImage>,
    last_image: Option<RgbaImage>,
    detections: Vec<Detection>,
    threat: ThreatLevel,
    streaming: bool,
    outbox: Vec<Notification>,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl<K: FrameSink> StreamSession<K> {
    pub fn new(config: StreamConfig, channel: RealtimeChannel<K>) -> Self {
        let surface = RasterSurface::new(config.display_width, config.display_height);
        Self {
            channel,
            scheduler: FrameCaptureScheduler::new(
                config.capture_period(),
                config.capture_width,
                config.capture_height,
                config.jpeg_quality,
            ),
            telemetry: TelemetryAggregator::new(config.fps_window()),
            classifier: ThreatClassifier::new(config.critical_labels.iter().cloned()),
            notifier: ThreatNotifier::new(),
            renderer: OverlayRenderer::new(config.box_space),
            recorder: SightingRecorder::new(config.snapshot_quality, config.timestamp_offset_minutes),
            frame: Arc::new(surface.pixels().clone()),
            surface,
            last_image: None,
            detections: Vec::new(),
            threat: ThreatLevel::None,
            streaming: false,
            outbox: Vec::new(),
            metrics: MetricsRecorder::new(),
            logger: LogManager::new("session"),
            config,
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn channel_state(&self) -> ChannelState {
        self.channel.state()
    }

    pub fn threat(&self) -> ThreatLevel {
        self.threat
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn next_generation(&self) -> u64 {
        self.channel.generation() + 1
    }

    /// Replaces the current channel, closing the old one.
    pub fn attach_channel(&mut self, channel: RealtimeChannel<K>) {
        self.channel.close();
        self.channel = channel;
    }

    /// Resolves when the capture ticker is due.
    pub async fn wait_tick(&mut self) {
        self.scheduler.wait_tick().await;
    }

    /// Handles one event against the wall clock.
    pub fn dispatch(&mut self, event: SessionEvent) -> Vec<SessionEffect> {
        self.process(event, None)
    }

    /// Handles one event with every timestamp pinned to `now`.
    pub fn dispatch_at(&mut self, event: SessionEvent, now: Instant) -> Vec<SessionEffect> {
        self.process(event, Some(now))
    }

    fn process(&mut self, event: SessionEvent, pinned: Option<Instant>) -> Vec<SessionEffect> {
        let clock = move || pinned.unwrap_or_else(Instant::now);
        match event {
            SessionEvent::Tick => {
                self.tick(clock);
                Vec::new()
            }
            SessionEvent::Channel(notice) => {
                self.on_channel(notice, clock());
                Vec::new()
            }
            SessionEvent::Command(command) => self.on_command(command, clock()),
            SessionEvent::SightingSubmitted(outcome) => {
                let note = outcome_notification(&self.logger, outcome);
                self.outbox.push(note);
                Vec::new()
            }
        }
    }

    /// Notifications raised since the last drain, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            streaming: self.streaming,
            channel: self.channel.state(),
            generation: self.channel.generation(),
            threat: self.threat,
            telemetry: self.telemetry.sample(),
            metrics: self.metrics.snapshot(),
            detections: self.detections.clone(),
            source: self.scheduler.source_name(),
            frame: Arc::clone(&self.frame),
        }
    }

    fn tick(&mut self, clock: impl FnOnce() -> Instant) {
        match self.scheduler.tick(&mut self.channel, clock) {
            TickOutcome::Sent => self.metrics.record_sent(),
            TickOutcome::Skipped => self.metrics.record_dropped(),
            TickOutcome::Failed => self.metrics.record_capture_failure(),
            TickOutcome::Idle => {}
        }
    }

    fn on_channel(&mut self, notice: ChannelNotice, now: Instant) {
        if notice.generation != self.channel.generation() {
            self.logger.trace(&format!(
                "ignoring event from stale connection {}",
                notice.generation
            ));
            return;
        }
        if let Some(text) = self.channel.handle(notice.event) {
            self.receive(&text, now);
        }
    }

    fn on_command(&mut self, command: SessionCommand, now: Instant) -> Vec<SessionEffect> {
        match command {
            SessionCommand::Start => {
                self.start(now);
                Vec::new()
            }
            SessionCommand::Stop => {
                self.stop();
                Vec::new()
            }
            SessionCommand::LogSighting { notes } => {
                match self
                    .recorder
                    .capture(&self.surface, &self.detections, notes.as_deref())
                {
                    Ok(sighting) => vec![SessionEffect::SubmitSighting(sighting)],
                    Err(ConsoleError::UserCancelled) => {
                        self.logger.trace("sighting cancelled: no notes supplied");
                        Vec::new()
                    }
                    Err(err) => {
                        self.logger.warn(&format!("sighting snapshot failed: {err}"));
                        self.outbox.push(Notification::error("Failed to log sighting."));
                        Vec::new()
                    }
                }
            }
            SessionCommand::Reconnect => {
                if self.channel.state() == ChannelState::Closed {
                    vec![SessionEffect::Reconnect]
                } else {
                    self.logger.trace("reconnect ignored: channel still live");
                    Vec::new()
                }
            }
            SessionCommand::Shutdown => {
                self.shutdown();
                vec![SessionEffect::Shutdown]
            }
        }
    }

    fn start(&mut self, now: Instant) {
        if self.streaming {
            return;
        }
        let source = self.config.source.build();
        match self.scheduler.start(source) {
            Ok(()) => {
                self.streaming = true;
                self.telemetry.reset(now);
                self.logger.record("streaming started");
            }
            Err(err) => {
                self.logger.warn(&format!("cannot start streaming: {err}"));
                self.outbox
                    .push(Notification::error(format!("Unable to start capture: {err}")));
            }
        }
    }

    /// Cancels capture, releases the device and clears the threat banner.
    pub fn stop(&mut self) {
        self.scheduler.stop();
        if self.streaming {
            self.logger.record("streaming stopped");
        }
        self.streaming = false;
        self.threat = ThreatLevel::None;
        self.notifier.reset();
    }

    pub fn shutdown(&mut self) {
        self.stop();
        self.channel.close();
    }

    fn receive(&mut self, text: &str, now: Instant) {
        self.metrics.record_received();
        let inbound = match ServerMessage::parse(text) {
            Ok(ServerMessage::Annotated(inbound)) => inbound,
            Ok(ServerMessage::Error { error }) => {
                self.logger.warn(&format!("backend reported: {error}"));
                self.outbox
                    .push(Notification::error(format!("Backend error: {error}")));
                return;
            }
            Err(err) => {
                self.metrics.record_invalid();
                self.logger.warn(&format!("dropping message: {err}"));
                return;
            }
        };

        self.telemetry
            .on_receive_at(now, self.channel.last_send_at(), inbound.server_time_ms);

        // Replies still in flight after a stop must not re-raise the banner.
        if self.streaming {
            let level = self.classifier.classify(&inbound.detections);
            if let Some(note) = self
                .notifier
                .observe(level, &inbound.detections, &self.classifier)
            {
                self.outbox.push(note);
            }
            self.threat = level;
        }

        match data_uri::decode_image(&inbound.image) {
            Ok(image) => self.last_image = Some(image),
            Err(err) => {
                self.metrics.record_invalid();
                self.logger
                    .warn(&format!("keeping previous frame, decode failed: {err}"));
            }
        }
        self.detections = inbound.detections;
        self.render();
    }

    fn render(&mut self) {
        self.renderer
            .render(&mut self.surface, self.last_image.as_ref(), &self.detections);
        self.frame = Arc::new(self.surface.pixels().clone());
    }

    /// Snapshot of the rendered surface at the configured quality.
    pub fn snapshot(&self) -> ConsoleResult<String> {
        self.surface.snapshot(self.config.snapshot_quality)
    }
}

impl<K: FrameSink> Drop for StreamSession<K> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::SourceConfig;
    use crate::channel::realtime::testing::{open_channel, RecordingSink};
    use crate::channel::ChannelEvent;
    use crate::threat::Severity;
    use image::{Rgb, RgbImage};
    use std::path::PathBuf;
    use std::time::Duration;

    fn session_with(sink: RecordingSink) -> StreamSession<RecordingSink> {
        StreamSession::new(StreamConfig::default(), open_channel(sink))
    }

    fn inbound(labels: &[&str]) -> SessionEvent {
        let image = data_uri::jpeg_from_rgb(&RgbImage::from_pixel(320, 240, Rgb([0, 40, 80])), 60)
            .unwrap();
        let detections: Vec<Detection> = labels
            .iter()
            .map(|label| Detection::new(*label, 0.9, [0.0, 0.0, 128.0, 128.0]))
            .collect();
        let text = serde_json::json!({
            "image": image,
            "detections": detections,
            "server_time_ms": 18,
        })
        .to_string();
        SessionEvent::Channel(ChannelNotice {
            generation: 1,
            event: ChannelEvent::Message(text),
        })
    }

    fn command(command: SessionCommand) -> SessionEvent {
        SessionEvent::Command(command)
    }

    #[test]
    fn stop_resets_critical_threat_to_none() {
        let mut session = session_with(RecordingSink::default());
        session.dispatch(command(SessionCommand::Start));
        session.dispatch(inbound(&["Submarine"]));
        assert_eq!(session.threat(), ThreatLevel::Critical);

        session.dispatch(command(SessionCommand::Stop));
        assert_eq!(session.threat(), ThreatLevel::None);
        assert!(!session.is_streaming());
        assert!(session.view().source.is_none());
    }

    #[test]
    fn repeated_critical_messages_raise_one_alert() {
        let mut session = session_with(RecordingSink::default());
        session.dispatch(command(SessionCommand::Start));
        for _ in 0..10 {
            session.dispatch(inbound(&["Unidentified Debris", "Mine"]));
        }
        let notes = session.drain_notifications();
        assert_eq!(notes, vec![Notification::error("CRITICAL THREAT DETECTED: Mine")]);
    }

    #[test]
    fn restart_after_stop_rearms_alerts() {
        let mut session = session_with(RecordingSink::default());
        session.dispatch(command(SessionCommand::Start));
        session.dispatch(inbound(&["Mine"]));
        session.dispatch(command(SessionCommand::Stop));
        session.dispatch(command(SessionCommand::Start));
        session.dispatch(inbound(&["Mine"]));
        assert_eq!(session.drain_notifications().len(), 2);
    }

    #[test]
    fn late_reply_after_stop_does_not_raise_banner() {
        let mut session = session_with(RecordingSink::default());
        session.dispatch(inbound(&["Submarine"]));
        assert_eq!(session.threat(), ThreatLevel::None);
        assert!(session.drain_notifications().is_empty());
        assert_eq!(session.detections().len(), 1);
    }

    #[test]
    fn boxes_far_outside_the_grid_render_safely() {
        let mut session = session_with(RecordingSink::default());
        session.dispatch(command(SessionCommand::Start));
        let image = data_uri::jpeg_from_rgb(&RgbImage::from_pixel(320, 240, Rgb([0, 40, 80])), 60)
            .unwrap();
        let text = serde_json::json!({
            "image": image,
            "detections": [
                {"label": "Mine", "box": [0.0, -1e20, 10.0, 10.0], "confidence": 0.9},
                {"label": "Buoy", "box": [1e30, 1e30, -1e30, 3e38], "confidence": 0.5},
            ],
            "server_time_ms": 4,
        })
        .to_string();
        session.dispatch(SessionEvent::Channel(ChannelNotice {
            generation: 1,
            event: ChannelEvent::Message(text),
        }));
        assert_eq!(session.threat(), ThreatLevel::Critical);
        assert_eq!(session.detections().len(), 2);
        assert_eq!(session.view().frame.dimensions(), (640, 480));
    }

    #[test]
    fn ticks_on_closed_channel_send_nothing() {
        let sink = RecordingSink::default();
        let mut session = session_with(sink.clone());
        session.dispatch(command(SessionCommand::Start));
        session.dispatch(SessionEvent::Channel(ChannelNotice {
            generation: 1,
            event: ChannelEvent::Closed(None),
        }));
        for _ in 0..10 {
            session.dispatch(SessionEvent::Tick);
        }
        assert_eq!(sink.sent_count(), 0);
        assert_eq!(session.view().metrics.frames_dropped, 10);
        assert!(session.drain_notifications().is_empty());
    }

    #[test]
    fn ticks_on_open_channel_send_frames() {
        let sink = RecordingSink::default();
        let mut session = session_with(sink.clone());
        session.dispatch(command(SessionCommand::Start));
        session.dispatch(SessionEvent::Tick);
        session.dispatch(SessionEvent::Tick);
        assert_eq!(sink.sent_count(), 2);
    }

    #[test]
    fn latency_is_measured_against_latest_send() {
        let sink = RecordingSink::default();
        let mut session = session_with(sink);
        let t0 = Instant::now();
        session.dispatch_at(command(SessionCommand::Start), t0);
        session.dispatch_at(SessionEvent::Tick, t0);
        session.dispatch_at(inbound(&[]), t0 + Duration::from_millis(65));
        let telemetry = session.view().telemetry;
        assert_eq!(telemetry.latency_ms, 65);
        assert_eq!(telemetry.server_time_ms, 18.0);
    }

    #[test]
    fn stale_generation_events_are_ignored() {
        let mut session = session_with(RecordingSink::default());
        session.dispatch(SessionEvent::Channel(ChannelNotice {
            generation: 7,
            event: ChannelEvent::Closed(Some("old socket".into())),
        }));
        assert_eq!(session.channel_state(), ChannelState::Open);
    }

    #[test]
    fn blank_sighting_notes_produce_no_effect() {
        let mut session = session_with(RecordingSink::default());
        session.dispatch(inbound(&["Mine"]));
        for notes in [None, Some("   ".to_string())] {
            let effects = session.dispatch(command(SessionCommand::LogSighting { notes }));
            assert!(effects.is_empty());
        }
        assert!(session.drain_notifications().is_empty());
    }

    #[test]
    fn sighting_snapshot_reflects_last_render() {
        let mut session = session_with(RecordingSink::default());
        session.dispatch(inbound(&["Mine"]));
        let expected = session.snapshot().unwrap();

        let effects = session.dispatch(command(SessionCommand::LogSighting {
            notes: Some("mine near buoy 4".into()),
        }));
        assert_eq!(effects.len(), 1);
        let SessionEffect::SubmitSighting(sighting) = &effects[0] else {
            panic!("expected a submission");
        };
        assert_eq!(sighting.snapshot, expected);
        assert_eq!(sighting.detections.len(), 1);
        assert_eq!(sighting.notes, "mine near buoy 4");
    }

    #[test]
    fn submission_outcomes_become_notifications() {
        let mut session = session_with(RecordingSink::default());
        session.dispatch(SessionEvent::SightingSubmitted(Ok(())));
        session.dispatch(SessionEvent::SightingSubmitted(Err(
            ConsoleError::PersistenceFailure("503".into()),
        )));
        let severities: Vec<Severity> = session
            .drain_notifications()
            .iter()
            .map(|n| n.severity)
            .collect();
        assert_eq!(severities, vec![Severity::Success, Severity::Error]);
    }

    #[test]
    fn backend_error_envelope_is_surfaced() {
        let mut session = session_with(RecordingSink::default());
        session.dispatch(SessionEvent::Channel(ChannelNotice {
            generation: 1,
            event: ChannelEvent::Message(r#"{"error":"Enhancement model not loaded."}"#.into()),
        }));
        assert_eq!(
            session.drain_notifications(),
            vec![Notification::error(
                "Backend error: Enhancement model not loaded."
            )]
        );
    }

    #[test]
    fn undecodable_image_keeps_previous_frame() {
        let mut session = session_with(RecordingSink::default());
        session.dispatch(inbound(&[]));
        let before = session.view().frame;

        let text = serde_json::json!({
            "image": data_uri::encode_jpeg(b"garbage"),
            "detections": [{"label": "Buoy", "box": [0, 0, 10, 10], "confidence": 0.4}],
            "server_time_ms": 3,
        })
        .to_string();
        session.dispatch(SessionEvent::Channel(ChannelNotice {
            generation: 1,
            event: ChannelEvent::Message(text),
        }));

        assert_eq!(session.detections()[0].label, "Buoy");
        assert_eq!(session.view().metrics.invalid_messages, 1);
        assert_eq!(session.view().frame.dimensions(), before.dimensions());
    }

    #[test]
    fn malformed_json_is_counted_and_dropped() {
        let mut session = session_with(RecordingSink::default());
        session.dispatch(SessionEvent::Channel(ChannelNotice {
            generation: 1,
            event: ChannelEvent::Message("not json".into()),
        }));
        let view = session.view();
        assert_eq!(view.metrics.messages_received, 1);
        assert_eq!(view.metrics.invalid_messages, 1);
    }

    #[test]
    fn unavailable_device_keeps_session_idle() {
        let config = StreamConfig {
            source: SourceConfig::Still {
                path: PathBuf::from("/nonexistent/camera.jpg"),
            },
            ..Default::default()
        };
        let mut session = StreamSession::new(config, open_channel(RecordingSink::default()));
        session.dispatch(command(SessionCommand::Start));
        assert!(!session.is_streaming());
        let notes = session.drain_notifications();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].message.starts_with("Unable to start capture"));
    }

    #[test]
    fn reconnect_only_requested_once_closed() {
        let mut session = session_with(RecordingSink::default());
        assert!(session.dispatch(command(SessionCommand::Reconnect)).is_empty());

        session.dispatch(SessionEvent::Channel(ChannelNotice {
            generation: 1,
            event: ChannelEvent::Closed(None),
        }));
        assert_eq!(
            session.dispatch(command(SessionCommand::Reconnect)),
            vec![SessionEffect::Reconnect]
        );
        assert_eq!(session.next_generation(), 2);
    }

    #[test]
    fn shutdown_closes_channel() {
        let sink = RecordingSink::default();
        let mut session = session_with(sink.clone());
        session.dispatch(command(SessionCommand::Start));
        let effects = session.dispatch(command(SessionCommand::Shutdown));
        assert_eq!(effects, vec![SessionEffect::Shutdown]);
        assert!(sink.is_closed());
        assert_eq!(session.channel_state(), ChannelState::Closed);
    }
}
