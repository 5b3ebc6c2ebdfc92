//! Core events emitted by the registry

use cueclock_api::{SessionRecord, TableView};
use cueclock_util::{CategoryId, TableId};

/// Events emitted by the table registry
#[derive(Debug, Clone)]
pub enum CoreEvent {
    /// A table changed state, rate or session log
    TableChanged(TableView),

    /// A running table's elapsed time and amount were refreshed by a tick
    TableRefreshed {
        category: CategoryId,
        table_id: TableId,
        elapsed_seconds: u64,
        amount: f64,
    },

    /// A session ended and was recorded
    SessionCompleted {
        category: CategoryId,
        table_id: TableId,
        session: SessionRecord,
    },
}
