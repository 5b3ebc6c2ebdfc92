//! IPC layer for cueclockd
//!
//! Provides:
//! - Unix domain socket server
//! - NDJSON (newline-delimited JSON) protocol
//! - Per-client event subscription
//! - A client for tools and tests

mod client;
mod server;

pub use client::*;
pub use server::*;

use thiserror::Error;

/// IPC errors
#[derive(Debug, Error)]
pub enum IpcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Server error: {0}")]
    ServerError(String),
}

impl From<IpcError> for cueclock_util::CueError {
    fn from(e: IpcError) -> Self {
        cueclock_util::CueError::ipc(e.to_string())
    }
}

pub type IpcResult<T> = Result<T, IpcError>;
