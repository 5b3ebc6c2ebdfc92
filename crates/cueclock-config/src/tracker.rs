//! Validated configuration structures

use crate::schema::{RawCategory, RawConfig, RawServiceConfig};
use cueclock_util::{CategoryId, TableId};
use std::path::PathBuf;
use std::time::Duration;

/// Default refresh period for running tables
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Default symbol used when rendering amounts
pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";

/// Validated configuration ready for use by the table registry
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Service configuration
    pub service: ServiceConfig,

    /// Rates an operator may switch an idle table to
    pub available_rates: Vec<f64>,

    /// Categories in display order
    pub categories: Vec<CategoryConfig>,
}

impl TrackerConfig {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            service: ServiceConfig::from_raw(raw.service),
            available_rates: raw.available_rates,
            categories: raw.categories.into_iter().map(CategoryConfig::from_raw).collect(),
        }
    }

    /// Get category by ID
    pub fn get_category(&self, id: &CategoryId) -> Option<&CategoryConfig> {
        self.categories.iter().find(|c| &c.id == id)
    }

    /// Total number of tables across all categories
    pub fn table_count(&self) -> usize {
        self.categories.iter().map(|c| c.tables.len()).sum()
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub socket_path: PathBuf,
    pub data_dir: PathBuf,
    pub tick_interval: Duration,
    pub currency_symbol: String,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            socket_path: raw
                .socket_path
                .unwrap_or_else(cueclock_util::default_socket_path),
            data_dir: raw.data_dir.unwrap_or_else(cueclock_util::default_data_dir),
            tick_interval: raw
                .tick_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_TICK_INTERVAL),
            currency_symbol: raw
                .currency_symbol
                .unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOL.to_string()),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_raw(RawServiceConfig::default())
    }
}

/// Validated category
#[derive(Debug, Clone)]
pub struct CategoryConfig {
    pub id: CategoryId,
    pub label: String,
    pub tables: Vec<TableConfig>,
}

impl CategoryConfig {
    fn from_raw(raw: RawCategory) -> Self {
        let label = raw.label.unwrap_or_else(|| capitalize(&raw.id));
        Self {
            id: CategoryId::new(raw.id),
            label,
            tables: raw
                .tables
                .into_iter()
                .map(|t| TableConfig {
                    id: TableId::new(t.id),
                    default_rate: t.rate,
                })
                .collect(),
        }
    }
}

/// Validated table definition
#[derive(Debug, Clone, Copy)]
pub struct TableConfig {
    pub id: TableId,
    pub default_rate: f64,
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_defaults_to_capitalized_id() {
        assert_eq!(capitalize("snooker"), "Snooker");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn service_defaults() {
        let service = ServiceConfig::default();
        assert_eq!(service.tick_interval, Duration::from_secs(1));
        assert_eq!(service.currency_symbol, "₹");
    }
}
