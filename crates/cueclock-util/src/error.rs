//! Error types for cueclockd

use thiserror::Error;

use crate::{CategoryId, TableId};

/// Broad failure family, used to pick a protocol error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    InvalidState,
    NoSessions,
    Store,
    Internal,
}

/// Core error type for table operations
#[derive(Debug, Error)]
pub enum CueError {
    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    #[error("Table {table_id} not found in category {category}")]
    TableNotFound {
        category: CategoryId,
        table_id: TableId,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("No completed sessions for {category} table {table_id}")]
    NoSessions {
        category: CategoryId,
        table_id: TableId,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("IPC error: {0}")]
    IpcError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CueError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreError(msg.into())
    }

    pub fn ipc(msg: impl Into<String>) -> Self {
        Self::IpcError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CueError::CategoryNotFound(_) | CueError::TableNotFound { .. } => ErrorKind::NotFound,
            CueError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            CueError::InvalidState(_) => ErrorKind::InvalidState,
            CueError::NoSessions { .. } => ErrorKind::NoSessions,
            CueError::StoreError(_) => ErrorKind::Store,
            CueError::ConfigError(_) | CueError::IpcError(_) | CueError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CueError>;
