use std::{fs, io, ops::RangeInclusive, path::Path, path::PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::tap_tempo::{DEFAULT_TAP_HISTORY, MAX_TAP_HISTORY};

/// Metronome settings, read from a YAML file such as `metronome.yml`.
///
/// Every key is optional; missing keys fall back to [`Config::default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub initial_bpm: u32,
    pub min_bpm: u32,
    pub max_bpm: u32,
    /// Number of recent taps averaged by the tempo estimator.
    pub tap_history: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_bpm: 60,
            min_bpm: 10,
            max_bpm: 500,
            tap_history: DEFAULT_TAP_HISTORY,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_bpm == 0 {
            return Err(ConfigError::Invalid("min_bpm must be at least 1".into()));
        }
        if self.min_bpm > self.max_bpm {
            return Err(ConfigError::Invalid(format!(
                "min_bpm ({}) is above max_bpm ({})",
                self.min_bpm, self.max_bpm
            )));
        }
        if !self.bpm_range().contains(&self.initial_bpm) {
            return Err(ConfigError::Invalid(format!(
                "initial_bpm ({}) is outside {}..={}",
                self.initial_bpm, self.min_bpm, self.max_bpm
            )));
        }
        if self.tap_history < 2 {
            return Err(ConfigError::Invalid(
                "tap_history must keep at least 2 taps".into(),
            ));
        }
        if self.tap_history > MAX_TAP_HISTORY {
            return Err(ConfigError::Invalid(format!(
                "tap_history ({}) is above {MAX_TAP_HISTORY}",
                self.tap_history
            )));
        }
        Ok(())
    }

    /// Range the up/down buttons keep the BPM within.
    pub fn bpm_range(&self) -> RangeInclusive<u32> {
        self.min_bpm..=self.max_bpm
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
