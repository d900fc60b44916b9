//! Top-level controller: one active track, one analyzer, one visualizer.
//!
//! The event loop forwards file selections and calls [`Sketch::update`] and
//! [`Sketch::redraw`] once per tick; decoding happens on worker threads and
//! arrives through the loader's channel.

use std::path::Path;

use crate::analyzer::Analyzer;
use crate::audio::{AudioOutput, Connection, LoadOutcome, Loader, MediaKind, Track, TrackId};
use crate::canvas::Canvas;
use crate::notify::Notifier;
use crate::params::Config;
use crate::visualizer::Visualizer;

pub const LOAD_ERROR_TITLE: &str = "Error loading audio file!";

/// What happened to a selected file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileDisposition {
    /// Not audio; nothing changed
    Ignored(MediaKind),
    /// Decode started with this generation
    Loading(u64),
}

struct ActiveTrack {
    track: Track,
    _connection: Connection,
}

pub struct Sketch<O, N> {
    output: O,
    notifier: N,
    loader: Loader,
    active: Option<ActiveTrack>,
    analyzer: Analyzer,
    visualizer: Visualizer,
}

impl<O: AudioOutput, N: Notifier> Sketch<O, N> {
    pub fn new(config: &Config, output: O, notifier: N) -> Self {
        Self {
            output,
            notifier,
            loader: Loader::new(),
            active: None,
            analyzer: Analyzer::new(config.analyzer.clone()),
            visualizer: Visualizer::new(&config.canvas),
        }
    }

    /// Accept a user-selected file.
    ///
    /// Non-audio files are ignored. For audio files the current track is torn
    /// down right away, whatever the outcome of the new decode.
    pub fn handle_file(&mut self, path: &Path) -> FileDisposition {
        let kind = MediaKind::from_path(path);
        if !kind.is_audio() {
            log::debug!("Ignoring {} ({:?})", path.display(), kind);
            return FileDisposition::Ignored(kind);
        }

        self.teardown();
        let generation = self.loader.request(path);
        log::info!("Loading {} (#{})", path.display(), generation);
        FileDisposition::Loading(generation)
    }

    /// Apply a finished decode, if one arrived. Returns the new track's id.
    pub fn update(&mut self) -> Option<TrackId> {
        let outcome = self.loader.poll()?;
        self.on_load(outcome)
    }

    /// Draw the current spectrum; `None` until the first track loaded.
    pub fn redraw(&mut self, canvas: &mut Canvas) -> Option<usize> {
        if !self.visualizer.is_enabled() {
            return None;
        }
        let frame = self.analyzer.analyze();
        self.visualizer.redraw(frame, canvas)
    }

    /// Invite the user to pick a file; no-op once a track has loaded.
    pub fn draw_prompt(&self, canvas: &mut Canvas) -> bool {
        self.visualizer.draw_prompt(canvas)
    }

    pub fn active_track(&self) -> Option<&Track> {
        self.active.as_ref().map(|active| &active.track)
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn is_visualizing(&self) -> bool {
        self.visualizer.is_enabled()
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_pending()
    }

    fn teardown(&mut self) {
        if let Some(active) = self.active.take() {
            active.track.stop();
            active.track.disconnect();
            log::debug!("Stopped {}", active.track.name());
        }
        self.analyzer.set_input(None);
    }

    fn on_load(&mut self, outcome: LoadOutcome) -> Option<TrackId> {
        let LoadOutcome { path, result, .. } = outcome;

        let audio = match result {
            Ok(audio) => audio,
            Err(e) => {
                self.notifier.error(LOAD_ERROR_TITLE, &e.to_string());
                return None;
            }
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let track = Track::new(name, audio);

        let connection = match self.output.connect(&track) {
            Ok(connection) => connection,
            Err(e) => {
                self.notifier.error(LOAD_ERROR_TITLE, &e.to_string());
                return None;
            }
        };

        track.play();
        self.analyzer.set_input(Some(track.clone()));
        self.visualizer.enable();

        log::info!(
            "Playing {} ({:.1}s, {} ch @ {} Hz)",
            track.name(),
            track.duration().as_secs_f32(),
            track.audio().channels,
            track.audio().sample_rate
        );

        let id = track.id();
        self.active = Some(ActiveTrack {
            track,
            _connection: connection,
        });
        Some(id)
    }

    /// Block until the pending decode lands, then apply it.
    #[cfg(test)]
    fn settle(&mut self) -> Option<TrackId> {
        let outcome = self.loader.wait(std::time::Duration::from_secs(10))?;
        self.on_load(outcome)
    }
}
