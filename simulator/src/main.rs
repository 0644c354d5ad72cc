use anyhow::Context;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::SimulatorConfig;

mod bridge;
mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Loopback analysis backend for the live mission console")]
struct Args {
    /// Load a simulator config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Address to listen on, overriding the config
    #[arg(long)]
    bind: Option<String>,
    #[arg(long)]
    seed: Option<u64>,
    /// Probability that a frame carries a detection
    #[arg(long)]
    detection_rate: Option<f64>,
    /// Answer every sighting submission with a server error
    #[arg(long, default_value_t = false)]
    reject_sightings: bool,
    /// Refuse live streams with the "model not loaded" envelope
    #[arg(long, default_value_t = false)]
    model_missing: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<SimulatorConfig> {
        let mut config = match self.config {
            Some(path) => SimulatorConfig::load(path)?,
            None => SimulatorConfig::default(),
        };
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(rate) = self.detection_rate {
            config.generator.detection_rate = rate;
        }
        config.reject_sightings |= self.reject_sightings;
        config.model_loaded &= !self.model_missing;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = Args::parse().into_config()?;
    info!(
        "[simulator] seed {} detection rate {} model loaded {}",
        config.seed, config.generator.detection_rate, config.model_loaded
    );

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating runtime for the bridge")?;
    runtime.block_on(bridge::server::serve(config, async {
        if let Err(err) = signal::ctrl_c().await {
            log::warn!("[simulator] awaiting Ctrl+C failed: {err}");
        }
        info!("[simulator] shutting down");
    }))
}
