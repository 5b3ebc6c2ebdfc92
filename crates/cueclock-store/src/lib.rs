//! Persistence layer for cueclockd
//!
//! Provides:
//! - Audit log (append-only)
//! - Completed session log per table
//! - Operator-chosen table rates

mod audit;
mod sqlite;
mod traits;

pub use audit::*;
pub use sqlite::*;
pub use traits::*;

use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<chrono::ParseError> for StoreError {
    fn from(e: chrono::ParseError) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<StoreError> for cueclock_util::CueError {
    fn from(e: StoreError) -> Self {
        cueclock_util::CueError::store(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
