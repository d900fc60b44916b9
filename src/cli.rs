//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::params::Config;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "waveform-bars")]
#[command(about = "Audio spectrum bars with canvas recording", long_about = None)]
pub struct Args {
    /// Audio file to play on startup
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Number of frequency bars (power of two)
    #[arg(long, value_name = "N", default_value = "64")]
    pub bins: usize,

    /// Spectrum smoothing between frames (0 = none, below 1)
    #[arg(long, value_name = "TAU", default_value = "0.8")]
    pub smoothing: f32,

    /// Redraw rate (frames per second)
    #[arg(long, value_name = "FPS", default_value = "60")]
    pub fps: u32,

    /// Recording capture rate (frames per second)
    #[arg(long, value_name = "FPS", default_value = "30")]
    pub record_fps: u32,

    /// Directory for recordings and snapshots
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// ffmpeg binary (searched on PATH when omitted)
    #[arg(long, value_name = "PATH")]
    pub ffmpeg: Option<PathBuf>,

    /// Recording video bitrate, ffmpeg syntax
    #[arg(long, value_name = "RATE", default_value = "2M")]
    pub bitrate: String,
}

impl Args {
    /// Build the program configuration from defaults plus flags
    pub fn to_config(&self) -> Config {
        let mut config = Config::default();

        config.analyzer.bins = self.bins;
        config.analyzer.smoothing = self.smoothing;

        config.canvas.fps = self.fps;

        config.recording.fps = self.record_fps;
        config.recording.output_dir = self.output_dir.clone();
        config.recording.ffmpeg_path = self.ffmpeg.clone();
        config.recording.bitrate = self.bitrate.clone();

        config
    }
}
