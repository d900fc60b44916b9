//! Canvas, controls and recording configuration.

use std::path::PathBuf;

use super::ConfigError;

/// Drawing surface configuration
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    /// Canvas width (pixels)
    pub width: u32,

    /// Canvas height (pixels)
    pub height: u32,

    /// Background gray level (0-255)
    pub background: u8,

    /// Horizontal gap between adjacent bars (pixels)
    pub bar_gap: f32,

    /// Redraw cadence (frames per second)
    pub fps: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            background: 30,
            bar_gap: 2.0,
            fps: 60,
        }
    }
}

impl CanvasConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::new(
                "canvas size",
                format!("{}x{} has no area", self.width, self.height),
            ));
        }
        if self.fps == 0 {
            return Err(ConfigError::new("fps", "must be > 0"));
        }
        if self.bar_gap < 0.0 {
            return Err(ConfigError::new("bar gap", "must not be negative"));
        }
        Ok(())
    }
}

/// Control strip below the canvas
#[derive(Debug, Clone)]
pub struct ControlsConfig {
    /// Strip height (pixels)
    pub strip_height: u32,

    /// Offset of the buttons from the strip edges (pixels)
    pub margin: u32,

    /// Button width (pixels)
    pub button_width: u32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            strip_height: 40,
            margin: 10,
            button_width: 120,
        }
    }
}

/// Canvas recording configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Capture rate (frames per second)
    pub fps: u32,

    /// Directory receiving finished recordings and snapshots
    pub output_dir: PathBuf,

    /// File name of each finished recording
    pub file_name: String,

    /// Target video bitrate, ffmpeg syntax (e.g. "2M")
    pub bitrate: String,

    /// Explicit ffmpeg binary; searched on PATH when unset
    pub ffmpeg_path: Option<PathBuf>,

    /// Frames buffered for the encoder before new frames are dropped
    pub queue_frames: usize,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            output_dir: PathBuf::from("."),
            file_name: "waveform_bars.webm".to_string(),
            bitrate: "2M".to_string(),
            ffmpeg_path: None,
            queue_frames: 8,
        }
    }
}

impl RecordingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 {
            return Err(ConfigError::new("record fps", "must be > 0"));
        }
        if self.file_name.trim().is_empty() {
            return Err(ConfigError::new("file name", "must not be empty"));
        }
        if self.queue_frames == 0 {
            return Err(ConfigError::new("queue frames", "must be > 0"));
        }
        Ok(())
    }
}
