//! Event types for cueclockd -> client streaming

use chrono::{DateTime, Local};
use cueclock_util::{CategoryId, TableId};
use serde::{Deserialize, Serialize};

use crate::{API_VERSION, SessionRecord, TableView};

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: DateTime<Local>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp: cueclock_util::now(),
            payload,
        }
    }
}

/// All possible events from the service to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// A table changed state, rate or session log
    TableUpdated(TableView),

    /// Periodic refresh of a running table
    TableTick {
        category: CategoryId,
        table_id: TableId,
        elapsed_seconds: u64,
        time_display: String,
        amount: f64,
    },

    /// A session was ended and recorded
    SessionCompleted {
        category: CategoryId,
        table_id: TableId,
        session: SessionRecord,
    },

    /// Service is shutting down
    Shutdown,
}
