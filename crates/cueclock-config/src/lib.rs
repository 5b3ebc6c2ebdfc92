//! Configuration parsing and validation for cueclockd
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Table categories with fixed table ids and default rates
//! - The enumerated set of rates operators may choose from
//! - Validation with clear error messages

mod schema;
mod tracker;
mod validation;

pub use schema::*;
pub use tracker::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Stock hall layout: three snooker and three pool tables.
pub const DEFAULT_CONFIG: &str = r#"
config_version = 1
available_rates = [2.0, 3.0, 3.5, 4.0, 4.5, 5.0, 5.5, 6.0, 6.5]

[[categories]]
id = "snooker"
label = "Snooker"
tables = [
    { id = 1, rate = 3.0 },
    { id = 2, rate = 4.0 },
    { id = 3, rate = 4.5 },
]

[[categories]]
id = "pool"
label = "Pool"
tables = [
    { id = 1, rate = 2.0 },
    { id = 2, rate = 2.0 },
    { id = 3, rate = 2.5 },
]
"#;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<TrackerConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<TrackerConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    let config = TrackerConfig::from_raw(raw);
    debug!(
        categories = config.categories.len(),
        tables = config.table_count(),
        "Configuration parsed"
    );
    Ok(config)
}

/// The built-in configuration
pub fn default_config() -> TrackerConfig {
    parse_config(DEFAULT_CONFIG).expect("built-in configuration is valid")
}
