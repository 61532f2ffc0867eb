//! TOML-backed configuration with `STREAMROUTER_*` environment overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};
use streamrouter_domain::constants::{
    DEFAULT_ENGINE_REBUILD_PERIOD_MS, DEFAULT_STREAM_PROCESSING_MAX_FAULTS,
    DEFAULT_STREAM_PROCESSING_TIMEOUT_MS,
};
use streamrouter_domain::error::{Error, Result};

/// The engine's four tunables, loaded from TOML and overridable per-key
/// through an environment variable of the same name, uppercased and
/// prefixed with `STREAMROUTER_`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Per-rule evaluation deadline, in milliseconds.
    pub stream_processing_timeout_ms: u64,
    /// Consecutive faults tolerated before a stream is quarantined.
    pub stream_processing_max_faults: u32,
    /// Period between Engine Updater rebuilds, in milliseconds.
    pub engine_rebuild_period_ms: u64,
    /// Whether the Router attaches per-message diagnostic recordings.
    pub detailed_message_recording: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            stream_processing_timeout_ms: DEFAULT_STREAM_PROCESSING_TIMEOUT_MS,
            stream_processing_max_faults: DEFAULT_STREAM_PROCESSING_MAX_FAULTS,
            engine_rebuild_period_ms: DEFAULT_ENGINE_REBUILD_PERIOD_MS,
            detailed_message_recording: false,
        }
    }
}

impl RouterConfig {
    /// Loads configuration from a TOML file, falling back to defaults for
    /// any key the file omits, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, or
    /// [`Error::ConfigInvalid`] if its contents are not valid TOML for
    /// this shape.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&contents)
            .map_err(|e| Error::config_invalid(path.display().to_string(), e.to_string()))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Starts from [`RouterConfig::default`] and applies environment
    /// overrides only — no file is read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] if an override's value cannot be
    /// parsed for its field.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_u64("STREAMROUTER_STREAM_PROCESSING_TIMEOUT_MS") {
            self.stream_processing_timeout_ms = v;
        }
        if let Some(v) = env_u32("STREAMROUTER_STREAM_PROCESSING_MAX_FAULTS") {
            self.stream_processing_max_faults = v;
        }
        if let Some(v) = env_u64("STREAMROUTER_ENGINE_REBUILD_PERIOD_MS") {
            self.engine_rebuild_period_ms = v;
        }
        if let Some(v) = env_bool("STREAMROUTER_DETAILED_MESSAGE_RECORDING") {
            self.detailed_message_recording = v;
        }
    }

    /// Validates the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] if any of the timeout/period
    /// fields is zero, or if `stream_processing_max_faults` is zero (a
    /// stream would be quarantined before its first fault is even
    /// recorded).
    pub fn validate(&self) -> Result<()> {
        if self.stream_processing_timeout_ms == 0 {
            return Err(Error::config_invalid(
                "stream_processing_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.engine_rebuild_period_ms == 0 {
            return Err(Error::config_invalid(
                "engine_rebuild_period_ms",
                "must be greater than zero",
            ));
        }
        if self.stream_processing_max_faults == 0 {
            return Err(Error::config_invalid(
                "stream_processing_max_faults",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(RouterConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = RouterConfig {
            stream_processing_timeout_ms: 0,
            ..RouterConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_partial_toml_and_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("router.toml");
        std::fs::write(&path, "stream_processing_max_faults = 5\n").unwrap();

        let config = RouterConfig::load(&path).unwrap();
        assert_eq!(config.stream_processing_max_faults, 5);
        assert_eq!(
            config.stream_processing_timeout_ms,
            DEFAULT_STREAM_PROCESSING_TIMEOUT_MS
        );
    }

    #[test]
    #[allow(unsafe_code)]
    fn env_override_wins_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("router.toml");
        std::fs::write(&path, "stream_processing_max_faults = 5\n").unwrap();

        // SAFETY: test-only, single-threaded within this test's process view
        // of the variable; no other test reads this key.
        unsafe {
            std::env::set_var("STREAMROUTER_STREAM_PROCESSING_MAX_FAULTS", "9");
        }
        let config = RouterConfig::load(&path).unwrap();
        unsafe {
            std::env::remove_var("STREAMROUTER_STREAM_PROCESSING_MAX_FAULTS");
        }
        assert_eq!(config.stream_processing_max_faults, 9);
    }
}
