use anyhow::Context;
use image::DynamicImage;
use netracore::stream_interface::{data_uri, InboundMessage};
use std::time::Instant;

use crate::generator::detections::{DetectionGenerator, GeneratorConfig};

/// Answers one inbound frame with the echoed image, placeholder detections
/// and the time spent.
pub struct FrameResponder {
    generator: DetectionGenerator,
    quality: u8,
}

impl FrameResponder {
    pub fn new(generator: GeneratorConfig, seed: u64, quality: u8) -> Self {
        Self {
            generator: DetectionGenerator::new(generator, seed),
            quality,
        }
    }

    pub fn respond(&mut self, frame: &str) -> anyhow::Result<InboundMessage> {
        let started = Instant::now();
        let decoded = data_uri::decode_image(frame).context("decoding inbound frame")?;
        let rgb = DynamicImage::ImageRgba8(decoded).to_rgb8();
        let detections = self.generator.next_detections();
        let image = data_uri::jpeg_from_rgb(&rgb, self.quality).context("encoding reply frame")?;
        let server_time_ms = (started.elapsed().as_secs_f64() * 1000.0).round();
        Ok(InboundMessage {
            image,
            detections,
            server_time_ms,
        })
    }

    pub fn respond_json(&mut self, frame: &str) -> anyhow::Result<String> {
        let reply = self.respond(frame)?;
        serde_json::to_string(&reply).context("serializing reply")
    }
}
