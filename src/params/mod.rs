//! Parameter definitions with units and documented semantics.
//!
//! Every tunable number lives here with:
//! - Units (pixels, Hz, frames per second, dB)
//! - Documented ranges and meanings
//! - A `validate()` pass run once at startup

mod audio;
mod render;

use thiserror::Error;

// Re-export all types
pub use audio::AnalyzerConfig;
pub use render::{CanvasConfig, ControlsConfig, RecordingConfig};

/// Rejected parameter value
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid {field}: {reason}")]
pub struct ConfigError {
    pub field: &'static str,
    pub reason: String,
}

impl ConfigError {
    pub(crate) fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Complete program configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub analyzer: AnalyzerConfig,
    pub canvas: CanvasConfig,
    pub controls: ControlsConfig,
    pub recording: RecordingConfig,
}

impl Config {
    /// Validate every section, reporting the first bad value
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analyzer.validate()?;
        self.canvas.validate()?;
        self.recording.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn test_first_invalid_section_is_reported() {
        let mut config = Config::default();
        config.analyzer.bins = 48;
        config.recording.fps = 0;

        let err = config.validate().unwrap_err();
        assert_eq!(err.field, "bins");
    }
}
