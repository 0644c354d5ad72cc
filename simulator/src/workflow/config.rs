use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::generator::detections::GeneratorConfig;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub bind: String,
    pub seed: u64,
    pub jpeg_quality: u8,
    /// When false every websocket client gets the "model not loaded" error
    /// envelope and a close frame.
    pub model_loaded: bool,
    /// When true `/log-sighting` answers 500.
    pub reject_sightings: bool,
    pub generator: GeneratorConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".into(),
            seed: 0,
            jpeg_quality: 75,
            model_loaded: true,
            reject_sightings: false,
            generator: GeneratorConfig::default(),
        }
    }
}

impl SimulatorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading simulator config {}", path_ref.display()))?;
        let config: SimulatorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing simulator config {}", path_ref.display()))?;
        Ok(config)
    }
}
