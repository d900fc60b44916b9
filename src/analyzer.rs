//! Spectrum analysis producing byte-scaled magnitudes per frequency bin.
//!
//! Follows the usual analyser-node recipe: Blackman window, forward FFT,
//! exponential smoothing across frames, decibel conversion, then a linear map
//! of the configured decibel range onto `0..=255`.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use crate::audio::Track;
use crate::params::AnalyzerConfig;

/// Magnitudes for one redraw, one byte per bin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpectralFrame {
    values: Vec<u8>,
}

impl SpectralFrame {
    pub fn values(&self) -> &[u8] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Index of the loudest bin (lowest index on ties)
    pub fn peak_bin(&self) -> Option<usize> {
        let max = *self.values.iter().max()?;
        self.values.iter().position(|&v| v == max)
    }
}

/// FFT analyzer bound to at most one track.
pub struct Analyzer {
    config: AnalyzerConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    smoothed: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    frame: SpectralFrame,
    input: Option<Track>,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let fft_size = config.fft_size();
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        Self {
            window: (0..fft_size).map(|i| blackman_window(i, fft_size)).collect(),
            smoothed: vec![0.0; config.bins],
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            frame: SpectralFrame {
                values: vec![0; config.bins],
            },
            fft,
            config,
            input: None,
        }
    }

    /// Bind the analyzer to a track (or to nothing, which reads as silence).
    pub fn set_input(&mut self, track: Option<Track>) {
        self.input = track;
    }

    pub fn input(&self) -> Option<&Track> {
        self.input.as_ref()
    }

    pub fn bins(&self) -> usize {
        self.config.bins
    }

    /// Most recently computed frame
    pub fn frame(&self) -> &SpectralFrame {
        &self.frame
    }

    /// Compute a fresh frame from the bound input.
    pub fn analyze(&mut self) -> &SpectralFrame {
        let fft_size = self.config.fft_size();
        let samples = match &self.input {
            Some(track) => track.recent_mono(fft_size),
            None => vec![0.0; fft_size],
        };
        self.analyze_samples(&samples)
    }

    /// Compute a fresh frame from the trailing `fft_size` samples of `samples`.
    pub fn analyze_samples(&mut self, samples: &[f32]) -> &SpectralFrame {
        let fft_size = self.config.fft_size();

        // Right-align the input, zero-padding the front
        let skip = samples.len().saturating_sub(fft_size);
        let pad = fft_size - (samples.len() - skip);
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { samples[skip + i - pad] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.buffer);

        let tau = self.config.smoothing;
        let range = self.config.max_db - self.config.min_db;
        for (k, value) in self.frame.values.iter_mut().enumerate() {
            let magnitude = self.buffer[k].norm() / fft_size as f32;
            self.smoothed[k] = tau * self.smoothed[k] + (1.0 - tau) * magnitude;
            *value = to_byte(self.smoothed[k], self.config.min_db, range);
        }

        &self.frame
    }
}

/// Map a linear magnitude to 0..=255 over `[min_db, min_db + range_db]`.
fn to_byte(magnitude: f32, min_db: f32, range_db: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let scaled = (255.0 / range_db) * (db - min_db);
    scaled.floor().clamp(0.0, 255.0) as u8
}

/// Blackman window function (alpha = 0.16)
pub fn blackman_window(index: usize, size: usize) -> f32 {
    let alpha = 0.16;
    let a0 = 0.5 * (1.0 - alpha);
    let a1 = 0.5;
    let a2 = 0.5 * alpha;
    let x = index as f32 / size as f32;
    a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::DecodedAudio;

    /// Sine landing exactly on `bin` for the given FFT size
    fn bin_sine(bin: usize, fft_size: usize, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * PI * bin as f32 * i as f32 / fft_size as f32).sin())
            .collect()
    }

    fn unsmoothed() -> AnalyzerConfig {
        AnalyzerConfig {
            smoothing: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_silence_is_all_zero() {
        let mut analyzer = Analyzer::new(AnalyzerConfig::default());
        let frame = analyzer.analyze_samples(&[0.0; 128]);
        assert_eq!(frame.len(), 64);
        assert!(frame.values().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_unbound_analyzer_reads_silence() {
        let mut analyzer = Analyzer::new(AnalyzerConfig::default());
        assert!(analyzer.input().is_none());
        let frame = analyzer.analyze();
        assert_eq!(frame.len(), 64);
        assert_eq!(frame.peak_bin(), Some(0));
        assert!(frame.values().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let mut analyzer = Analyzer::new(unsmoothed());
        let frame = analyzer.analyze_samples(&bin_sine(8, 128, 0.01, 128));

        assert_eq!(frame.peak_bin(), Some(8));
        assert!(frame.values()[8] > 100);
        assert_eq!(frame.values()[40], 0);
    }

    #[test]
    fn test_short_input_is_zero_padded() {
        let mut analyzer = Analyzer::new(unsmoothed());
        let frame = analyzer.analyze_samples(&[0.0; 16]);
        assert_eq!(frame.len(), 64);
    }

    #[test]
    fn test_smoothing_decays_towards_silence() {
        let mut analyzer = Analyzer::new(AnalyzerConfig::default());
        let loud = bin_sine(8, 128, 0.01, 128);
        for _ in 0..10 {
            analyzer.analyze_samples(&loud);
        }
        let mut previous = analyzer.frame().values()[8];
        assert!(previous > 0);

        for _ in 0..200 {
            let value = analyzer.analyze_samples(&[0.0; 128]).values()[8];
            assert!(value <= previous);
            previous = value;
        }
        assert_eq!(previous, 0);
    }

    #[test]
    fn test_bin_count_follows_config() {
        let mut analyzer = Analyzer::new(AnalyzerConfig {
            bins: 256,
            ..Default::default()
        });
        assert_eq!(analyzer.bins(), 256);
        assert_eq!(analyzer.analyze_samples(&[0.5; 1000]).len(), 256);
    }

    #[test]
    fn test_reads_bound_playing_track() {
        let samples = bin_sine(8, 128, 0.01, 4096);
        let track = Track::new(
            "sine",
            DecodedAudio {
                samples,
                channels: 1,
                sample_rate: 44100,
            },
        );
        track.connect();
        track.play();
        let mut out = vec![0.0f32; 1024];
        track.fill_output(&mut out, 1, 44100);

        let mut analyzer = Analyzer::new(unsmoothed());
        analyzer.set_input(Some(track.clone()));
        assert_eq!(analyzer.analyze().peak_bin(), Some(8));

        track.stop();
        assert!(analyzer.analyze().values().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_blackman_window_shape() {
        let size = 128;
        assert!(blackman_window(0, size).abs() < 1e-6);
        assert!((blackman_window(size / 2, size) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_to_byte_range() {
        assert_eq!(to_byte(0.0, -100.0, 70.0), 0);
        assert_eq!(to_byte(1e-3, -100.0, 70.0), 145);
        assert_eq!(to_byte(1.0, -100.0, 70.0), 255);
    }
}
