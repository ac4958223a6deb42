//! Configuration module - environment variable parsing

use std::env;

/// Simulation configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Arena width in simulation units
    pub arena_width: f32,
    /// Arena height in simulation units
    pub arena_height: f32,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            arena_width: parse_dimension("ARENA_WIDTH", 400.0)?,
            arena_height: parse_dimension("ARENA_HEIGHT", 800.0)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            arena_width: 400.0,
            arena_height: 800.0,
            log_level: "info".to_string(),
        }
    }
}

fn parse_dimension(key: &'static str, default: f32) -> Result<f32, ConfigError> {
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => {
            let value: f32 = raw.parse().map_err(|_| ConfigError::Invalid(key))?;
            if value.is_finite() && value > 0.0 {
                Ok(value)
            } else {
                Err(ConfigError::Invalid(key))
            }
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
