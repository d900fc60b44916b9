//! Spectrum analysis configuration.

use super::ConfigError;

/// Analyzer configuration (byte-frequency output, AnalyserNode semantics)
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Number of frequency bins in each spectral frame (power of 2)
    /// FFT size is twice this value.
    pub bins: usize,

    /// Temporal smoothing constant in [0, 1)
    /// 0.0 = no smoothing, values near 1.0 = slow decay
    pub smoothing: f32,

    /// Magnitude mapped to byte value 0 (dB)
    pub min_db: f32,

    /// Magnitude mapped to byte value 255 (dB)
    pub max_db: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            bins: 64,
            smoothing: 0.8,
            min_db: -100.0,
            max_db: -30.0,
        }
    }
}

impl AnalyzerConfig {
    /// FFT window size (samples)
    pub fn fft_size(&self) -> usize {
        self.bins * 2
    }

    /// Validate configuration (bins must be a power of 2, etc.)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(16..=16384).contains(&self.bins) || !self.bins.is_power_of_two() {
            return Err(ConfigError::new(
                "bins",
                format!("must be a power of 2 between 16 and 16384, got {}", self.bins),
            ));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(ConfigError::new(
                "smoothing",
                format!("must be in [0, 1), got {}", self.smoothing),
            ));
        }
        if self.min_db >= self.max_db {
            return Err(ConfigError::new(
                "decibel range",
                format!("min {} must be below max {}", self.min_db, self.max_db),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fft_size_is_twice_bins() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.bins, 64);
        assert_eq!(config.fft_size(), 128);
    }

    #[test]
    fn test_rejects_non_power_of_two_bins() {
        let config = AnalyzerConfig {
            bins: 100,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().field, "bins");
    }

    #[test]
    fn test_rejects_smoothing_of_one() {
        let config = AnalyzerConfig {
            smoothing: 1.0,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().field, "smoothing");
    }
}
