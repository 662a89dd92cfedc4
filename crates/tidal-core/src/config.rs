//! Controller configuration.
//!
//! Defaults carry the tuned constants; deployments can override them from a
//! TOML file and `TIDAL_`-prefixed environment variables. Loading is the only
//! fallible surface of the crate; the controller itself never errors.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default smoothing factor (~10-15s half-life at 1 Hz ingestion).
pub const EMA_ALPHA_DEFAULT: f32 = 0.2;
/// Default hysteresis margin applied around band edges.
pub const HYST_MARGIN: f32 = 0.07;
/// Default cap on cycle-length change per plan, as a fraction of the previous.
pub const RAMP_LIMIT_FRAC: f32 = 0.10;
/// Default freeze window opened by an unstable capture, seconds.
pub const FREEZE_ON_UNSTABLE_SEC: f32 = 30.0;
/// Default age beyond which a reading is reported stale, seconds.
pub const STALE_TOLERANCE_SEC: f32 = 10.0;
/// Default planning window, seconds.
pub const DEFAULT_WINDOW_SEC: u32 = 60;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tunables for the breathing-coach controller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    /// EMA smoothing factor in (0, 1].
    pub ema_alpha: f32,
    /// Hysteresis margin around band edges.
    pub hyst_margin: f32,
    /// Max cycle-length change per plan, fraction of the previous length.
    pub ramp_limit_frac: f32,
    /// Freeze window opened by an unstable capture, seconds.
    pub freeze_on_unstable_sec: f32,
    /// Reading age beyond which the signal is stale, seconds.
    pub stale_tolerance_sec: f32,
    /// Planning window when the caller does not supply one, seconds.
    pub default_window_sec: u32,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            ema_alpha: EMA_ALPHA_DEFAULT,
            hyst_margin: HYST_MARGIN,
            ramp_limit_frac: RAMP_LIMIT_FRAC,
            freeze_on_unstable_sec: FREEZE_ON_UNSTABLE_SEC,
            stale_tolerance_sec: STALE_TOLERANCE_SEC,
            default_window_sec: DEFAULT_WINDOW_SEC,
        }
    }
}

impl CoachConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: CoachConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file, then apply environment variable overrides.
    /// Variables are prefixed with TIDAL_, e.g. `TIDAL_EMA_ALPHA=0.3`.
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `TIDAL_`-prefixed environment variable overrides.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        use std::env;

        fn parse<T: std::str::FromStr>(name: &str, val: String) -> Result<T, ConfigError> {
            val.parse()
                .map_err(|_| ConfigError::Validation(format!("Invalid {name}")))
        }

        if let Ok(val) = env::var("TIDAL_EMA_ALPHA") {
            self.ema_alpha = parse("TIDAL_EMA_ALPHA", val)?;
        }
        if let Ok(val) = env::var("TIDAL_HYST_MARGIN") {
            self.hyst_margin = parse("TIDAL_HYST_MARGIN", val)?;
        }
        if let Ok(val) = env::var("TIDAL_RAMP_LIMIT_FRAC") {
            self.ramp_limit_frac = parse("TIDAL_RAMP_LIMIT_FRAC", val)?;
        }
        if let Ok(val) = env::var("TIDAL_FREEZE_ON_UNSTABLE_SEC") {
            self.freeze_on_unstable_sec = parse("TIDAL_FREEZE_ON_UNSTABLE_SEC", val)?;
        }
        if let Ok(val) = env::var("TIDAL_STALE_TOLERANCE_SEC") {
            self.stale_tolerance_sec = parse("TIDAL_STALE_TOLERANCE_SEC", val)?;
        }
        if let Ok(val) = env::var("TIDAL_DEFAULT_WINDOW_SEC") {
            self.default_window_sec = parse("TIDAL_DEFAULT_WINDOW_SEC", val)?;
        }
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ema_alpha <= 0.0 || self.ema_alpha > 1.0 {
            return Err(ConfigError::Validation(
                "ema_alpha must be in (0, 1]".to_string(),
            ));
        }
        // Margins of half the narrowest band or more would empty the shrunk
        // intervals entirely.
        if self.hyst_margin < 0.0 || self.hyst_margin >= 0.125 {
            return Err(ConfigError::Validation(
                "hyst_margin must be in [0, 0.125)".to_string(),
            ));
        }
        if self.ramp_limit_frac <= 0.0 || self.ramp_limit_frac > 1.0 {
            return Err(ConfigError::Validation(
                "ramp_limit_frac must be in (0, 1]".to_string(),
            ));
        }
        if self.freeze_on_unstable_sec <= 0.0 {
            return Err(ConfigError::Validation(
                "freeze_on_unstable_sec must be positive".to_string(),
            ));
        }
        if self.stale_tolerance_sec <= 0.0 {
            return Err(ConfigError::Validation(
                "stale_tolerance_sec must be positive".to_string(),
            ));
        }
        if self.default_window_sec == 0 {
            return Err(ConfigError::Validation(
                "default_window_sec must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Export configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
