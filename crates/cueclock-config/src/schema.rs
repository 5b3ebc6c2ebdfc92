//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Rates (currency units per minute) an operator may switch a table to
    #[serde(default)]
    pub available_rates: Vec<f64>,

    /// Global service settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Table categories, in display order
    #[serde(default)]
    pub categories: Vec<RawCategory>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// IPC socket path
    pub socket_path: Option<PathBuf>,

    /// Data directory for the session store
    pub data_dir: Option<PathBuf>,

    /// Period of the background refresh, in milliseconds
    pub tick_interval_ms: Option<u64>,

    /// Symbol used when rendering amounts in messages
    pub currency_symbol: Option<String>,
}

/// Raw category definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawCategory {
    /// Stable id used by callers ("snooker", "pool")
    pub id: String,

    /// Display label, defaults to the id with a leading capital
    pub label: Option<String>,

    /// Tables in this category
    #[serde(default)]
    pub tables: Vec<RawTable>,
}

/// Raw table definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawTable {
    /// Table number within the category
    pub id: u32,

    /// Default rate per minute
    pub rate: f64,
}
