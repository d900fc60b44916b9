//! Background decoding with latest-request-wins delivery.

use std::panic::{self, UnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use super::decode::{decode_file, DecodedAudio, LoadError};

/// Result of one decode request
#[derive(Debug)]
pub struct LoadOutcome {
    pub generation: u64,
    pub path: PathBuf,
    pub result: Result<DecodedAudio, LoadError>,
}

/// Runs decodes on worker threads and hands results back over a channel.
///
/// Every request supersedes the previous one; outcomes of superseded requests
/// are dropped when polled.
pub struct Loader {
    tx: Sender<LoadOutcome>,
    rx: Receiver<LoadOutcome>,
    next_generation: u64,
    latest: Option<u64>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            next_generation: 1,
            latest: None,
        }
    }

    /// Start decoding `path`, returning the request's generation.
    pub fn request(&mut self, path: &Path) -> u64 {
        self.request_with(path, decode_file)
    }

    /// Run `decode` for `path` on a worker thread.
    ///
    /// A panicking decoder still produces an outcome, so the request never
    /// stays pending.
    pub(crate) fn request_with<D>(&mut self, path: &Path, decode: D) -> u64
    where
        D: FnOnce(&Path) -> Result<DecodedAudio, LoadError> + Send + UnwindSafe + 'static,
    {
        let generation = self.begin();
        let tx = self.tx.clone();
        let path = path.to_path_buf();

        thread::spawn(move || {
            let result = panic::catch_unwind(|| decode(&path)).unwrap_or_else(|_| {
                log::error!("Decoder panicked on {}", path.display());
                Err(LoadError::Panicked { path: path.clone() })
            });
            // Receiver gone means the app is shutting down
            let _ = tx.send(LoadOutcome {
                generation,
                path,
                result,
            });
        });

        generation
    }

    /// Reserve a generation without spawning a decode.
    pub(crate) fn begin(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.latest = Some(generation);
        generation
    }

    /// Sender for delivering outcomes produced elsewhere.
    #[cfg(test)]
    pub(crate) fn sender(&self) -> Sender<LoadOutcome> {
        self.tx.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.latest.is_some()
    }

    /// Next outcome of the most recent request, if it has arrived.
    pub fn poll(&mut self) -> Option<LoadOutcome> {
        while let Ok(outcome) = self.rx.try_recv() {
            if let Some(outcome) = self.accept(outcome) {
                return Some(outcome);
            }
        }
        None
    }

    /// Block until the most recent request completes or `timeout` elapses.
    #[cfg(test)]
    pub(crate) fn wait(&mut self, timeout: std::time::Duration) -> Option<LoadOutcome> {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.checked_duration_since(std::time::Instant::now())?;
            let outcome = self.rx.recv_timeout(remaining).ok()?;
            if let Some(outcome) = self.accept(outcome) {
                return Some(outcome);
            }
        }
    }

    fn accept(&mut self, outcome: LoadOutcome) -> Option<LoadOutcome> {
        if self.latest == Some(outcome.generation) {
            self.latest = None;
            Some(outcome)
        } else {
            log::debug!(
                "Dropping superseded load #{} ({})",
                outcome.generation,
                outcome.path.display()
            );
            None
        }
    }
}
