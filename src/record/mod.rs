//! Canvas recording: Idle -> Recording -> Idle.
//!
//! While recording, canvas frames are pushed to an encoder at a fixed rate and
//! every chunk the encoder emits is buffered in order. Stopping concatenates
//! the chunks into one file in the output directory.

mod chunks;
mod encoder;
mod ffmpeg;

pub use chunks::ChunkBuffer;
pub use encoder::{EncoderFactory, FrameFormat, VideoEncoder};
pub use ffmpeg::{encoder_args, FfmpegFactory};

use std::path::{Path, PathBuf};
use std::time::Instant;

use thiserror::Error;

use crate::canvas::Canvas;
use crate::clock::FrameClock;
use crate::controls::{START_LABEL, STOP_LABEL};
use crate::params::RecordingConfig;

/// Errors that can occur while recording.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("ffmpeg binary not found; install ffmpeg or pass --ffmpeg")]
    FfmpegNotFound,
    #[error("failed to spawn ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("encoder pipe failed: {0}")]
    Pipe(String),
    #[error("encoder failed: {0}")]
    EncoderFailed(String),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("a recording is already in progress")]
    AlreadyRecording,
    #[error("frame is {actual} bytes, encoder expects {expected}")]
    FrameSize { expected: usize, actual: usize },
}

/// What a toggle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggle {
    Started,
    Saved(PathBuf),
}

struct Session {
    encoder: Box<dyn VideoEncoder>,
    chunks: ChunkBuffer,
    clock: FrameClock,
    frames: u64,
    started_at: Instant,
}

enum State {
    Idle,
    Recording(Session),
}

/// Records canvas frames into a video file.
pub struct Recorder<F> {
    factory: F,
    config: RecordingConfig,
    format: FrameFormat,
    state: State,
}

impl<F: EncoderFactory> Recorder<F> {
    pub fn new(factory: F, config: RecordingConfig, width: u32, height: u32) -> Self {
        let format = FrameFormat {
            width,
            height,
            fps: config.fps,
        };
        Self {
            factory,
            config,
            format,
            state: State::Idle,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, State::Recording(_))
    }

    /// Text for the record control
    pub fn label(&self) -> &'static str {
        if self.is_recording() {
            STOP_LABEL
        } else {
            START_LABEL
        }
    }

    /// Open an encoder and begin capturing.
    pub fn start(&mut self) -> Result<(), RecordError> {
        if self.is_recording() {
            return Err(RecordError::AlreadyRecording);
        }

        let encoder = self.factory.open(self.format)?;
        self.state = State::Recording(Session {
            encoder,
            chunks: ChunkBuffer::new(),
            clock: FrameClock::new(self.format.fps),
            frames: 0,
            started_at: Instant::now(),
        });
        log::info!("Recording started");
        Ok(())
    }

    /// Finish the session and write the file. No-op when idle.
    pub fn stop(&mut self) -> Result<Option<PathBuf>, RecordError> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Recording(session) => self.save(session).map(Some),
            State::Idle => {
                log::debug!("Stop requested while idle");
                Ok(None)
            }
        }
    }

    /// Start when idle, stop and save when recording.
    pub fn toggle(&mut self) -> Result<Toggle, RecordError> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Recording(session) => self.save(session).map(Toggle::Saved),
            State::Idle => {
                self.start()?;
                Ok(Toggle::Started)
            }
        }
    }

    fn save(&self, mut session: Session) -> Result<PathBuf, RecordError> {
        session.chunks.extend(session.encoder.take_chunks());
        session.chunks.extend(session.encoder.finish()?);

        let chunk_count = session.chunks.chunk_count();
        let bytes = session.chunks.assemble();

        std::fs::create_dir_all(&self.config.output_dir).map_err(|source| RecordError::Write {
            path: self.config.output_dir.clone(),
            source,
        })?;
        let path = unique_path(&self.config.output_dir, &self.config.file_name);
        std::fs::write(&path, &bytes).map_err(|source| RecordError::Write {
            path: path.clone(),
            source,
        })?;

        log::info!(
            "Recording saved: {} ({} frames, {} chunks, {} bytes, {:.1}s)",
            path.display(),
            session.frames,
            chunk_count,
            bytes.len(),
            session.started_at.elapsed().as_secs_f32()
        );
        Ok(path)
    }

    /// Feed the canvas to the encoder when a frame is due and collect output.
    ///
    /// An encoder failure ends the session without writing a file.
    pub fn capture(&mut self, canvas: &Canvas, now: Instant) -> Result<(), RecordError> {
        let State::Recording(session) = &mut self.state else {
            return Ok(());
        };

        let mut result = Ok(());
        if session.clock.tick(now) {
            result = session.encoder.push_frame(canvas.as_bytes());
            if result.is_ok() {
                session.frames += 1;
            }
        }
        let chunks = session.encoder.take_chunks();
        session.chunks.extend(chunks);

        if result.is_err() {
            self.state = State::Idle;
            log::warn!("Recording aborted");
        }
        result
    }
}

/// `dir/name`, or `dir/stem (n).ext` for the first free `n` if taken.
pub fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };
    (1u32..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{stem} ({n}).{ext}")),
            None => dir.join(format!("{stem} ({n})")),
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}
