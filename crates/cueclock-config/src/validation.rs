//! Configuration validation

use crate::schema::{RawCategory, RawConfig};
use std::collections::HashSet;
use thiserror::Error;

/// Smallest accepted tick period
pub const MIN_TICK_INTERVAL_MS: u64 = 100;

/// Largest accepted tick period
pub const MAX_TICK_INTERVAL_MS: u64 = 60_000;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Category '{category}': {message}")]
    CategoryError { category: String, message: String },

    #[error("Duplicate category ID: {0}")]
    DuplicateCategoryId(String),

    #[error("Duplicate table {table_id} in category '{category}'")]
    DuplicateTableId { category: String, table_id: u32 },

    #[error("Invalid rate {rate} for table {table_id} in category '{category}': must be a positive number")]
    InvalidTableRate {
        category: String,
        table_id: u32,
        rate: f64,
    },

    #[error("Invalid entry in available_rates: {0} (must be a positive number)")]
    InvalidAvailableRate(f64),

    #[error("Global config error: {0}")]
    GlobalError(String),
}

/// Validate a raw configuration, collecting every problem found
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.available_rates.is_empty() {
        errors.push(ValidationError::GlobalError(
            "available_rates must list at least one rate".into(),
        ));
    }
    for rate in &config.available_rates {
        if !is_valid_rate(*rate) {
            errors.push(ValidationError::InvalidAvailableRate(*rate));
        }
    }

    if let Some(interval) = config.service.tick_interval_ms
        && !(MIN_TICK_INTERVAL_MS..=MAX_TICK_INTERVAL_MS).contains(&interval)
    {
        errors.push(ValidationError::GlobalError(format!(
            "tick_interval_ms must be between {} and {}, got {}",
            MIN_TICK_INTERVAL_MS, MAX_TICK_INTERVAL_MS, interval
        )));
    }

    if config.categories.is_empty() {
        errors.push(ValidationError::GlobalError(
            "at least one category must be configured".into(),
        ));
    }

    let mut seen_ids = HashSet::new();
    for category in &config.categories {
        if !seen_ids.insert(&category.id) {
            errors.push(ValidationError::DuplicateCategoryId(category.id.clone()));
        }
    }

    for category in &config.categories {
        errors.extend(validate_category(category));
    }

    errors
}

fn validate_category(category: &RawCategory) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if category.id.trim().is_empty() {
        errors.push(ValidationError::CategoryError {
            category: category.id.clone(),
            message: "id cannot be empty".into(),
        });
    }

    if let Some(label) = &category.label
        && label.trim().is_empty()
    {
        errors.push(ValidationError::CategoryError {
            category: category.id.clone(),
            message: "label cannot be empty".into(),
        });
    }

    if category.tables.is_empty() {
        errors.push(ValidationError::CategoryError {
            category: category.id.clone(),
            message: "must define at least one table".into(),
        });
    }

    let mut seen_tables = HashSet::new();
    for table in &category.tables {
        if !seen_tables.insert(table.id) {
            errors.push(ValidationError::DuplicateTableId {
                category: category.id.clone(),
                table_id: table.id,
            });
        }

        // A default rate outside available_rates is allowed; only operator changes are restricted
        if !is_valid_rate(table.rate) {
            errors.push(ValidationError::InvalidTableRate {
                category: category.id.clone(),
                table_id: table.id,
                rate: table.rate,
            });
        }
    }

    errors
}

fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}
