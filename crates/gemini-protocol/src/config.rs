//! Connection configuration.
//!
//! ```yaml
//! port_name: Gemini
//! response_timeout_ms: 1000
//! adc_samples: 10
//! ```

use crate::constants::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The YAML didn't describe a valid configuration.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Settings for talking to one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// MIDI port name to look for.
    pub port_name: String,
    /// How long to wait for a response frame, in milliseconds.
    pub response_timeout_ms: u64,
    /// Readings averaged by `read_adc_average_default`.
    pub adc_samples: usize,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            port_name: MIDI_PORT_NAME.to_string(),
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT.as_millis() as u64,
            adc_samples: DEFAULT_ADC_SAMPLES,
        }
    }
}

impl GeminiConfig {
    /// Parse a configuration from YAML. Missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// The response timeout as a `Duration`.
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}
