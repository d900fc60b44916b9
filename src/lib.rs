//! waveform-bars - audio spectrum bars with canvas recording
//!
//! Load an audio file, watch its spectrum as bars, record the canvas to WebM.

pub mod analyzer;
pub mod audio;
pub mod canvas;
pub mod cli;
pub mod clock;
pub mod controls;
pub mod notify;
pub mod params;
pub mod record;
pub mod rendering;
pub mod sketch;
pub mod text;
pub mod visualizer;
