use anyhow::Context;
use clap::Parser;
use netracore::capture::SourceConfig;
use netracore::StreamConfig;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about = "Live mission streaming console")]
pub struct Args {
    /// Load a stream config from YAML
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Realtime channel URL, overriding the config
    #[arg(long)]
    pub url: Option<String>,
    /// Base URL of the sighting API, overriding the config
    #[arg(long)]
    pub api: Option<String>,
    /// Replay frames from a directory of images instead of the synthetic feed
    #[arg(long, conflicts_with = "camera")]
    pub source_dir: Option<PathBuf>,
    /// Stream from a live capture device by index
    #[arg(long)]
    pub camera: Option<usize>,
}

pub fn load_stream_config<P: AsRef<Path>>(path: P) -> anyhow::Result<StreamConfig> {
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref)
        .with_context(|| format!("reading stream config {}", path_ref.display()))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("parsing stream config {}", path_ref.display()))
}

impl Args {
    pub fn into_config(self) -> anyhow::Result<StreamConfig> {
        let mut config = match self.config {
            Some(path) => load_stream_config(path)?,
            None => StreamConfig::default(),
        };
        if let Some(url) = self.url {
            config.channel_url = url;
        }
        if let Some(api) = self.api {
            config.api_base = api;
        }
        if let Some(path) = self.source_dir {
            config.source = SourceConfig::Directory { path };
        }
        if let Some(index) = self.camera {
            config.source = SourceConfig::Camera { index };
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn yaml_config_merges_with_flags() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"capture_period_ms: 200\ncritical_labels: [Torpedo]\nsource:\n  kind: still\n  path: /tmp/frame.png\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let args = Args::parse_from([
            "console",
            "--config",
            path.to_str().unwrap(),
            "--api",
            "http://backend:9000",
        ]);
        let config = args.into_config().unwrap();
        assert_eq!(config.capture_period_ms, 200);
        assert_eq!(config.critical_labels, vec!["Torpedo".to_string()]);
        assert_eq!(config.sighting_endpoint(), "http://backend:9000/log-sighting");
        assert_eq!(
            config.source,
            SourceConfig::Still {
                path: PathBuf::from("/tmp/frame.png")
            }
        );
    }

    #[test]
    fn source_dir_flag_selects_directory_replay() {
        let args = Args::parse_from(["console", "--source-dir", "/data/sonar"]);
        let config = args.into_config().unwrap();
        assert_eq!(
            config.source,
            SourceConfig::Directory {
                path: PathBuf::from("/data/sonar")
            }
        );
        assert_eq!(config.channel_url, StreamConfig::default().channel_url);
    }

    #[test]
    fn camera_flag_selects_capture_device() {
        let args = Args::parse_from(["console", "--camera", "1"]);
        let config = args.into_config().unwrap();
        assert_eq!(config.source, SourceConfig::Camera { index: 1 });
        assert!(Args::try_parse_from(["console", "--camera", "0", "--source-dir", "/data"]).is_err());
    }

    #[test]
    fn missing_config_is_reported() {
        let err = load_stream_config("/nonexistent/console.yaml").unwrap_err();
        assert!(err.to_string().contains("reading stream config"));
    }
}
