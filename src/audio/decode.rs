//! File classification and decoding into in-memory PCM.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rodio::decoder::DecoderError;
use rodio::{Decoder, Source};
use thiserror::Error;

/// Extensions treated as audio by the input handler.
const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "wave", "ogg", "oga", "opus", "flac", "m4a", "mp4a", "aac", "aif", "aiff",
    "caf", "weba",
];

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "m4v", "mkv", "webm", "mov", "avi"];

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "svg"];

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "csv", "json", "srt", "toml"];

/// Errors that can occur while loading an audio file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecoderError,
    },
    #[error("{path} contains no audio samples")]
    Empty { path: PathBuf },
    #[error("decoder crashed on {path}")]
    Panicked { path: PathBuf },
}

/// Coarse media type of a selected file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
    Image,
    Text,
    Other,
}

impl MediaKind {
    /// Classify a file by its extension (case-insensitive).
    pub fn from_path(path: &Path) -> Self {
        let Some(ext) = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
        else {
            return Self::Other;
        };

        let ext = ext.as_str();
        if AUDIO_EXTENSIONS.contains(&ext) {
            Self::Audio
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Self::Video
        } else if IMAGE_EXTENSIONS.contains(&ext) {
            Self::Image
        } else if TEXT_EXTENSIONS.contains(&ext) {
            Self::Text
        } else {
            Self::Other
        }
    }

    pub fn is_audio(self) -> bool {
        self == Self::Audio
    }

    /// Extensions offered by the file picker's audio filter.
    pub fn audio_extensions() -> &'static [&'static str] {
        AUDIO_EXTENSIONS
    }
}

/// Fully decoded audio, interleaved `f32` samples
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Number of sample frames (one sample per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    /// Average of all channels at `frame`
    pub fn mono_at(&self, frame: usize) -> f32 {
        let channels = self.channels.max(1) as usize;
        let start = frame * channels;
        match self.samples.get(start..start + channels) {
            Some(slice) => slice.iter().sum::<f32>() / channels as f32,
            None => 0.0,
        }
    }
}

/// Decode an entire file into memory.
pub fn decode_file(path: &Path) -> Result<DecodedAudio, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let decoder = Decoder::new(BufReader::new(file)).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let channels = u16::from(decoder.channels());
    let sample_rate = u32::from(decoder.sample_rate());
    let samples: Vec<f32> = decoder.collect();

    if samples.is_empty() || channels == 0 || sample_rate == 0 {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }

    log::debug!(
        "Decoded {}: {} ch @ {} Hz, {} samples",
        path.display(),
        channels,
        sample_rate,
        samples.len()
    );

    Ok(DecodedAudio {
        samples,
        channels,
        sample_rate,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Write a mono 16-bit sine WAV fixture.
    pub(crate) fn write_sine_wav(path: &Path, freq_hz: f32, sample_rate: u32, frames: usize) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            let t = i as f32 / sample_rate as f32;
            let value = (2.0 * std::f32::consts::PI * freq_hz * t).sin() * 0.5;
            writer.write_sample((value * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_media_kind_from_extension() {
        assert_eq!(MediaKind::from_path(Path::new("song.mp3")), MediaKind::Audio);
        assert_eq!(MediaKind::from_path(Path::new("SONG.FLAC")), MediaKind::Audio);
        assert_eq!(MediaKind::from_path(Path::new("clip.webm")), MediaKind::Video);
        assert_eq!(MediaKind::from_path(Path::new("cover.png")), MediaKind::Image);
        assert_eq!(MediaKind::from_path(Path::new("notes.txt")), MediaKind::Text);
        assert_eq!(MediaKind::from_path(Path::new("archive.zip")), MediaKind::Other);
        assert_eq!(MediaKind::from_path(Path::new("README")), MediaKind::Other);
    }

    #[test]
    fn test_decode_wav_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_sine_wav(&path, 440.0, 8000, 8000);

        let audio = decode_file(&path).unwrap();
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.sample_rate, 8000);
        assert_eq!(audio.frames(), 8000);
        assert!((audio.duration().as_secs_f64() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_decode_missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = decode_file(&dir.path().join("missing.wav")).unwrap_err();
        assert!(matches!(err, LoadError::Open { .. }));
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.mp3");
        std::fs::write(&path, b"definitely not an mp3 stream").unwrap();

        let err = decode_file(&path).unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }));
    }

    #[test]
    fn test_mono_at_averages_channels() {
        let audio = DecodedAudio {
            samples: vec![1.0, 0.0, 0.5, 0.5],
            channels: 2,
            sample_rate: 48000,
        };
        assert_eq!(audio.frames(), 2);
        assert_eq!(audio.mono_at(0), 0.5);
        assert_eq!(audio.mono_at(1), 0.5);
        assert_eq!(audio.mono_at(2), 0.0);
    }
}
