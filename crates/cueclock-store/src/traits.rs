//! Store trait definitions

use cueclock_api::SessionRecord;
use cueclock_util::{CategoryId, TableId};

use crate::{AuditEvent, StoreResult};

/// Main store trait
pub trait Store: Send + Sync {
    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Session log

    /// Append a completed session to a table's log
    fn append_session(
        &self,
        category: &CategoryId,
        table_id: TableId,
        session: &SessionRecord,
    ) -> StoreResult<()>;

    /// Load a table's session log in completion order
    fn load_sessions(
        &self,
        category: &CategoryId,
        table_id: TableId,
    ) -> StoreResult<Vec<SessionRecord>>;

    /// Remove every session of a table, returning how many were removed
    fn clear_sessions(&self, category: &CategoryId, table_id: TableId) -> StoreResult<usize>;

    // Rates

    /// Persist an operator-chosen rate
    fn save_rate(&self, category: &CategoryId, table_id: TableId, rate: f64) -> StoreResult<()>;

    /// Load the persisted rate of a table, if one was ever saved
    fn load_rate(&self, category: &CategoryId, table_id: TableId) -> StoreResult<Option<f64>>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
