//! Audio device output for the active track.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::track::Track;

/// Errors that can occur while routing a track to the audio device.
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("no audio output device found")]
    NoDevice,
    #[error("failed to get audio config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[error("failed to build audio stream: {0}")]
    Build(#[from] cpal::BuildStreamError),
    #[error("failed to start audio stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
}

/// Live route from a track to an output device. Dropping it closes the route.
pub struct Connection {
    stream: Option<cpal::Stream>,
}

impl Connection {
    /// A connection with no device behind it.
    pub fn detached() -> Self {
        Self { stream: None }
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }
}

/// Sink that active tracks are connected to.
pub trait AudioOutput {
    /// Route `track` to the output and mark it connected.
    fn connect(&mut self, track: &Track) -> Result<Connection, PlaybackError>;
}

/// Default output device via cpal.
#[derive(Debug, Default)]
pub struct CpalOutput;

impl AudioOutput for CpalOutput {
    fn connect(&mut self, track: &Track) -> Result<Connection, PlaybackError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(PlaybackError::NoDevice)?;

        let supported = device.default_output_config()?;
        let channels = supported.channels() as usize;
        let sample_rate = supported.sample_rate().0;

        log::info!(
            "Audio: {} @ {}Hz ({} ch) <- {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate,
            channels,
            track.name()
        );

        let source = track.clone();
        let stream = device.build_output_stream(
            &supported.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                source.fill_output(data, channels, sample_rate);
            },
            |err| log::error!("Audio stream error: {}", err),
            None,
        )?;
        stream.play()?;

        track.connect();
        Ok(Connection {
            stream: Some(stream),
        })
    }
}
