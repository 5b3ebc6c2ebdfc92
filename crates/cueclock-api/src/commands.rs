//! Command types for the cueclockd protocol

use cueclock_util::{CategoryId, ClientId, CueError, ErrorKind, TableId};
use serde::{Deserialize, Serialize};

use crate::{API_VERSION, CategoryInfo, CategorySnapshot, HealthStatus, SplitBill, TableView};

/// Request wrapper with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for correlation
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// The command
    pub command: Command,
}

impl Request {
    pub fn new(request_id: u64, command: Command) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            command,
        }
    }
}

/// Response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Corresponding request ID
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// Response payload or error
    pub result: ResponseResult,
}

impl Response {
    pub fn success(request_id: u64, payload: ResponsePayload) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Ok(payload),
        }
    }

    pub fn error(request_id: u64, error: ErrorInfo) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Err(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseResult {
    Ok(ResponsePayload),
    Err(ErrorInfo),
}

/// Error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<&CueError> for ErrorInfo {
    fn from(err: &CueError) -> Self {
        let code = match err.kind() {
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::InvalidArgument => ErrorCode::InvalidArgument,
            ErrorKind::InvalidState => ErrorCode::InvalidState,
            ErrorKind::NoSessions => ErrorCode::NoSessions,
            ErrorKind::Store => ErrorCode::StoreError,
            ErrorKind::Internal => ErrorCode::InternalError,
        };
        ErrorInfo::new(code, err.to_string())
    }
}

/// Error codes for the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Unknown category or table
    NotFound,
    /// Unknown action, disallowed rate or player count out of range
    InvalidArgument,
    /// Rate change while the table is not idle
    InvalidState,
    /// Split requested on a table with no completed sessions
    NoSessions,
    InvalidRequest,
    StoreError,
    InternalError,
}

/// All possible commands from clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// List configured categories
    ListCategories,

    /// Current state of every table in a category
    GetSnapshot { category: CategoryId },

    /// Apply `start`, `pause` or `end` to a table
    Dispatch {
        category: CategoryId,
        table_id: TableId,
        /// Kept as text so unknown actions surface as `InvalidArgument`
        action: String,
        operator: String,
    },

    /// Change the per-minute rate of an idle table
    UpdateRate {
        category: CategoryId,
        table_id: TableId,
        rate: f64,
        operator: String,
    },

    /// Empty a table's session log
    ClearSessions {
        category: CategoryId,
        table_id: TableId,
        operator: String,
    },

    /// Split the most recent session among players
    SplitBill {
        category: CategoryId,
        table_id: TableId,
        /// Signed so an out-of-range count is rejected as a bad argument
        players: i64,
    },

    /// Get health status
    GetHealth,

    /// Subscribe to events (returns immediately, events stream separately)
    SubscribeEvents,

    /// Unsubscribe from events
    UnsubscribeEvents,

    /// Ping for keepalive
    Ping,
}

/// Response payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    Categories {
        categories: Vec<CategoryInfo>,
    },
    Snapshot(CategorySnapshot),
    ActionApplied {
        /// Human readable outcome, e.g. "Pool Table 2 paused"
        message: String,
        table: TableView,
    },
    Table(TableView),
    Split(SplitBill),
    Health(HealthStatus),
    Subscribed {
        client_id: ClientId,
    },
    Unsubscribed,
    Pong,
}

/// Client connection info (set by IPC layer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub client_id: ClientId,
    /// Unix UID of the peer if available
    pub uid: Option<u32>,
}

impl ClientInfo {
    pub fn new() -> Self {
        Self {
            client_id: ClientId::new(),
            uid: None,
        }
    }

    pub fn with_uid(mut self, uid: u32) -> Self {
        self.uid = Some(uid);
        self
    }
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self::new()
    }
}
