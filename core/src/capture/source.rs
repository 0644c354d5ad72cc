use image::{Rgb, RgbImage};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fs;
use std::path::PathBuf;

use super::camera::CameraSource;
use crate::prelude::{ConsoleError, ConsoleResult};

/// A live capture device exposing a pollable current frame.
pub trait VideoSource: Send {
    fn name(&self) -> String;
    /// Fails with [`ConsoleError::DeviceUnavailable`] when the device
    /// cannot be opened.
    fn acquire(&mut self) -> ConsoleResult<()>;
    fn current_frame(&mut self) -> ConsoleResult<RgbImage>;
    /// Stops every underlying handle. Safe to call repeatedly.
    fn release(&mut self);
    fn is_acquired(&self) -> bool;
}

/// Which capture device a session opens on start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Synthetic {
        #[serde(default)]
        seed: u64,
    },
    Still {
        path: PathBuf,
    },
    Directory {
        path: PathBuf,
    },
    /// A live capture device such as a webcam.
    Camera {
        #[serde(default)]
        index: usize,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Synthetic { seed: 0 }
    }
}

impl SourceConfig {
    pub fn build(&self) -> Box<dyn VideoSource> {
        match self {
            SourceConfig::Synthetic { seed } => Box::new(SyntheticSource::new(640, 480, *seed)),
            SourceConfig::Still { path } => Box::new(StillImageSource::new(path.clone())),
            SourceConfig::Directory { path } => Box::new(DirectorySource::new(path.clone())),
            SourceConfig::Camera { index } => Box::new(CameraSource::new(*index, 640, 480)),
        }
    }
}

/// Procedural sea surface with a drifting contact, for demos without a camera.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    seed: u64,
    rng: Option<StdRng>,
    frame_index: u64,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32, seed: u64) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            seed,
            rng: None,
            frame_index: 0,
        }
    }
}

impl VideoSource for SyntheticSource {
    fn name(&self) -> String {
        format!("synthetic:{}", self.seed)
    }

    fn acquire(&mut self) -> ConsoleResult<()> {
        self.rng = Some(StdRng::seed_from_u64(self.seed));
        self.frame_index = 0;
        Ok(())
    }

    fn current_frame(&mut self) -> ConsoleResult<RgbImage> {
        let rng = self
            .rng
            .as_mut()
            .ok_or_else(|| ConsoleError::DeviceUnavailable("synthetic source not acquired".into()))?;

        let phase = self.frame_index as f32 * 0.05;
        let contact_x = (0.5 + 0.35 * phase.sin()) * self.width as f32;
        let contact_y = (0.55 + 0.1 * (phase * 0.7).cos()) * self.height as f32;
        let contact_radius = self.width.min(self.height) as f32 * 0.06;

        let mut frame = RgbImage::new(self.width, self.height);
        for (x, y, pixel) in frame.enumerate_pixels_mut() {
            let depth = y as f32 / self.height as f32;
            let swell = ((x as f32 / self.width as f32) * 2.0 * PI * 3.0 + phase).sin() * 6.0;
            let jitter: f32 = rng.gen_range(-4.0..4.0);
            let mut shade = [
                (10.0 + 20.0 * depth + swell + jitter).clamp(0.0, 255.0),
                (60.0 + 50.0 * depth + swell + jitter).clamp(0.0, 255.0),
                (90.0 + 70.0 * depth + swell + jitter).clamp(0.0, 255.0),
            ];
            let dx = x as f32 - contact_x;
            let dy = y as f32 - contact_y;
            if dx * dx + dy * dy < contact_radius * contact_radius {
                shade = [200.0, 200.0, 190.0];
            }
            *pixel = Rgb([shade[0] as u8, shade[1] as u8, shade[2] as u8]);
        }

        self.frame_index += 1;
        Ok(frame)
    }

    fn release(&mut self) {
        self.rng = None;
    }

    fn is_acquired(&self) -> bool {
        self.rng.is_some()
    }
}

/// Loops a single image file.
pub struct StillImageSource {
    path: PathBuf,
    frame: Option<RgbImage>,
}

impl StillImageSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path, frame: None }
    }
}

impl VideoSource for StillImageSource {
    fn name(&self) -> String {
        format!("still:{}", self.path.display())
    }

    fn acquire(&mut self) -> ConsoleResult<()> {
        let image = image::open(&self.path).map_err(|e| {
            ConsoleError::DeviceUnavailable(format!("{}: {e}", self.path.display()))
        })?;
        self.frame = Some(image.to_rgb8());
        Ok(())
    }

    fn current_frame(&mut self) -> ConsoleResult<RgbImage> {
        self.frame
            .clone()
            .ok_or_else(|| ConsoleError::DeviceUnavailable("still source not acquired".into()))
    }

    fn release(&mut self) {
        self.frame = None;
    }

    fn is_acquired(&self) -> bool {
        self.frame.is_some()
    }
}

/// Plays the image files of a directory in name order, looping.
pub struct DirectorySource {
    path: PathBuf,
    frames: Vec<PathBuf>,
    cursor: usize,
}

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

impl DirectorySource {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            frames: Vec::new(),
            cursor: 0,
        }
    }
}

impl VideoSource for DirectorySource {
    fn name(&self) -> String {
        format!("directory:{}", self.path.display())
    }

    fn acquire(&mut self) -> ConsoleResult<()> {
        let entries = fs::read_dir(&self.path).map_err(|e| {
            ConsoleError::DeviceUnavailable(format!("{}: {e}", self.path.display()))
        })?;
        let mut frames: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        if frames.is_empty() {
            return Err(ConsoleError::DeviceUnavailable(format!(
                "{} holds no image frames",
                self.path.display()
            )));
        }
        frames.sort();
        self.frames = frames;
        self.cursor = 0;
        Ok(())
    }

    fn current_frame(&mut self) -> ConsoleResult<RgbImage> {
        if self.frames.is_empty() {
            return Err(ConsoleError::DeviceUnavailable(
                "directory source not acquired".into(),
            ));
        }
        let path = &self.frames[self.cursor % self.frames.len()];
        self.cursor = (self.cursor + 1) % self.frames.len();
        let image = image::open(path)
            .map_err(|e| ConsoleError::DeviceUnavailable(format!("{}: {e}", path.display())))?;
        Ok(image.to_rgb8())
    }

    fn release(&mut self) {
        self.frames.clear();
        self.cursor = 0;
    }

    fn is_acquired(&self) -> bool {
        !self.frames.is_empty()
    }
}
