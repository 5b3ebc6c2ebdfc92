//! Audit event types

use chrono::{DateTime, Local};
use cueclock_util::{CategoryId, TableId};
use serde::{Deserialize, Serialize};

/// Types of audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Service started
    ServiceStarted,

    /// Service stopped
    ServiceStopped,

    /// Configuration loaded
    ConfigLoaded {
        category_count: usize,
        table_count: usize,
    },

    /// Idle table started
    TableStarted {
        category: CategoryId,
        table_id: TableId,
        rate: f64,
        operator: String,
    },

    /// Running table paused
    TablePaused {
        category: CategoryId,
        table_id: TableId,
        elapsed_seconds: u64,
        operator: String,
    },

    /// Paused table resumed
    TableResumed {
        category: CategoryId,
        table_id: TableId,
        operator: String,
    },

    /// Session ended and recorded
    SessionEnded {
        category: CategoryId,
        table_id: TableId,
        elapsed_seconds: u64,
        amount: f64,
        operator: String,
    },

    /// Rate changed on an idle table
    RateChanged {
        category: CategoryId,
        table_id: TableId,
        old_rate: f64,
        new_rate: f64,
        operator: String,
    },

    /// Session log cleared
    SessionsCleared {
        category: CategoryId,
        table_id: TableId,
        removed: usize,
        operator: String,
    },

    /// Client connected
    ClientConnected {
        client_id: String,
        uid: Option<u32>,
    },

    /// Client disconnected
    ClientDisconnected { client_id: String },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Local>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp: cueclock_util::now(),
            event,
        }
    }
}
