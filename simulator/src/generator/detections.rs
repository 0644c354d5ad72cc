use netracore::stream_interface::Detection;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Knobs for the placeholder detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Probability that a frame carries a detection.
    pub detection_rate: f64,
    pub labels: Vec<String>,
    pub box_space: f32,
    pub min_extent: f32,
    pub max_extent: f32,
    pub min_confidence: f32,
    pub max_confidence: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            detection_rate: 0.04,
            labels: vec!["Mine".into(), "Submarine".into(), "Unidentified Debris".into()],
            box_space: 256.0,
            min_extent: 40.0,
            max_extent: 80.0,
            min_confidence: 0.75,
            max_confidence: 0.98,
        }
    }
}

/// Emits random detections in the normalization space, one frame at a time.
pub struct DetectionGenerator {
    config: GeneratorConfig,
    rng: StdRng,
}

impl DetectionGenerator {
    pub fn new(config: GeneratorConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn next_detections(&mut self) -> Vec<Detection> {
        let rate = if self.config.detection_rate.is_nan() {
            0.0
        } else {
            self.config.detection_rate.clamp(0.0, 1.0)
        };
        if self.config.labels.is_empty() || !self.rng.gen_bool(rate) {
            return Vec::new();
        }

        let label = self.config.labels[self.rng.gen_range(0..self.config.labels.len())].clone();
        // max/min instead of clamp: configs may carry tiny spaces or NaN.
        let space = self.config.box_space.max(2.0);
        let min_extent = self.config.min_extent.max(1.0).min(space * 0.5);
        let max_extent = self.config.max_extent.max(min_extent).min(space * 0.5);
        let width = self.sample(min_extent, max_extent);
        let height = self.sample(min_extent, max_extent);
        let x = self.sample(space * 0.1, (space * 0.9 - width).max(space * 0.1));
        let y = self.sample(space * 0.1, (space * 0.9 - height).max(space * 0.1));
        let confidence = self.sample(self.config.min_confidence, self.config.max_confidence);

        vec![Detection::new(
            label,
            (confidence * 100.0).round() / 100.0,
            [x.round(), y.round(), (x + width).round(), (y + height).round()],
        )]
    }

    fn sample(&mut self, low: f32, high: f32) -> f32 {
        if high > low {
            self.rng.gen_range(low..high)
        } else {
            low
        }
    }
}
