//! Audio loading, playback and transport.
//!
//! Files are decoded fully into memory on a worker thread, then played through
//! a cpal output stream that reads the track's shared playhead.

pub mod decode;
pub mod loader;
pub mod output;
pub mod track;

pub use decode::{decode_file, DecodedAudio, LoadError, MediaKind};
pub use loader::{LoadOutcome, Loader};
pub use output::{AudioOutput, Connection, CpalOutput, PlaybackError};
pub use track::{PlayState, Track, TrackId};
