use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Round-trip figures shown in the console stats overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub latency_ms: u64,
    pub server_time_ms: f64,
    pub fps: u32,
}

/// Turns send/receive timestamps into a [`TelemetrySample`].
///
/// Latency and server time refresh on every receive; `fps` is the number of
/// receives counted in the last completed window and holds its value until
/// the next window closes.
#[derive(Debug, Clone)]
pub struct TelemetryAggregator {
    window: Duration,
    window_start: Option<Instant>,
    frames_in_window: u32,
    sample: TelemetrySample,
}

impl TelemetryAggregator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            window_start: None,
            frames_in_window: 0,
            sample: TelemetrySample::default(),
        }
    }

    /// Zeroes the figures and opens a fresh window at `now`.
    pub fn reset(&mut self, now: Instant) {
        self.window_start = Some(now);
        self.frames_in_window = 0;
        self.sample = TelemetrySample::default();
    }

    pub fn sample(&self) -> TelemetrySample {
        self.sample
    }

    /// `sent_at` is the most recent send at receive time; correlation with
    /// the frame that produced the reply is purely temporal.
    pub fn on_receive_at(
        &mut self,
        now: Instant,
        sent_at: Option<Instant>,
        server_time_ms: f64,
    ) -> TelemetrySample {
        self.frames_in_window += 1;
        let window_start = *self.window_start.get_or_insert(now);
        if now.saturating_duration_since(window_start) >= self.window {
            self.sample.fps = self.frames_in_window;
            self.frames_in_window = 0;
            self.window_start = Some(now);
        }

        self.sample.latency_ms = sent_at
            .map(|sent| now.saturating_duration_since(sent).as_millis() as u64)
            .unwrap_or(0);
        self.sample.server_time_ms = server_time_ms;
        self.sample
    }
}

impl Default for TelemetryAggregator {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirty_receives_across_one_second_report_thirty_fps() {
        let t0 = Instant::now();
        let mut agg = TelemetryAggregator::new(Duration::from_secs(1));
        agg.reset(t0);
        for k in 1..=30u32 {
            let now = t0 + Duration::from_secs(1) * k / 30;
            let sample = agg.on_receive_at(now, Some(now - Duration::from_millis(40)), 12.0);
            assert_eq!(sample.latency_ms, 40);
            assert_eq!(sample.server_time_ms, 12.0);
            if k < 30 {
                assert_eq!(sample.fps, 0, "window closed early at call {k}");
            } else {
                assert_eq!(sample.fps, 30);
            }
        }
    }

    #[test]
    fn fps_holds_between_windows_while_latency_updates() {
        let t0 = Instant::now();
        let mut agg = TelemetryAggregator::new(Duration::from_secs(1));
        agg.reset(t0);
        let boundary = t0 + Duration::from_secs(1);
        agg.on_receive_at(boundary, Some(boundary), 5.0);
        assert_eq!(agg.sample().fps, 1);

        for step in 1..=4u64 {
            let now = boundary + Duration::from_millis(100 * step);
            let sample = agg.on_receive_at(now, Some(now - Duration::from_millis(step)), 7.0);
            assert_eq!(sample.fps, 1);
            assert_eq!(sample.latency_ms, step);
        }

        let next = agg.on_receive_at(boundary + Duration::from_secs(1), None, 7.0);
        assert_eq!(next.fps, 5);
        assert_eq!(next.latency_ms, 0);
    }

    #[test]
    fn first_receive_opens_window_when_unanchored() {
        let t0 = Instant::now();
        let mut agg = TelemetryAggregator::default();
        assert_eq!(agg.on_receive_at(t0, None, 1.0).fps, 0);
        assert_eq!(
            agg.on_receive_at(t0 + Duration::from_millis(1000), None, 1.0).fps,
            2
        );
    }

    #[test]
    fn reset_zeroes_sample() {
        let t0 = Instant::now();
        let mut agg = TelemetryAggregator::new(Duration::from_secs(1));
        agg.reset(t0);
        agg.on_receive_at(t0 + Duration::from_secs(2), Some(t0), 9.0);
        agg.reset(t0 + Duration::from_secs(3));
        assert_eq!(agg.sample(), TelemetrySample::default());
    }
}
