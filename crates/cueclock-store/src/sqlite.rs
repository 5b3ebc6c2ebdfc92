//! SQLite-based store implementation

use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use cueclock_api::SessionRecord;
use cueclock_util::{CategoryId, TableId};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{AuditEvent, AuditEventType, Store, StoreError, StoreResult};

const TIME_FORMAT: &str = "%H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Audit log (append-only)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            -- Completed sessions, rowid order = completion order
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category TEXT NOT NULL,
                table_id INTEGER NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                duration_minutes REAL NOT NULL,
                amount REAL NOT NULL,
                day TEXT NOT NULL,
                operator TEXT NOT NULL
            );

            -- Operator-chosen rates
            CREATE TABLE IF NOT EXISTS table_rates (
                category TEXT NOT NULL,
                table_id INTEGER NOT NULL,
                rate REAL NOT NULL,
                PRIMARY KEY (category, table_id)
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
            CREATE INDEX IF NOT EXISTS idx_sessions_table ON sessions(category, table_id);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

impl Store for SqliteStore {
    fn append_audit(&self, mut event: AuditEvent) -> StoreResult<()> {
        let conn = self.conn()?;
        let event_json = serde_json::to_string(&event.event)?;

        conn.execute(
            "INSERT INTO audit_log (timestamp, event_json) VALUES (?, ?)",
            params![event.timestamp.to_rfc3339(), event_json],
        )?;

        event.id = conn.last_insert_rowid();
        debug!(event_id = event.id, "Audit event appended");

        Ok(())
    }

    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, event_json FROM audit_log ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit], |row| {
            let id: i64 = row.get(0)?;
            let timestamp_str: String = row.get(1)?;
            let event_json: String = row.get(2)?;
            Ok((id, timestamp_str, event_json))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, timestamp_str, event_json) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map(|dt| dt.with_timezone(&Local))
                .unwrap_or_else(|_| cueclock_util::now());
            let event: AuditEventType = serde_json::from_str(&event_json)?;

            events.push(AuditEvent {
                id,
                timestamp,
                event,
            });
        }

        Ok(events)
    }

    fn append_session(
        &self,
        category: &CategoryId,
        table_id: TableId,
        session: &SessionRecord,
    ) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO sessions
                (category, table_id, start_time, end_time, duration_minutes, amount, day, operator)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                category.as_str(),
                table_id.get(),
                session.start_time.format(TIME_FORMAT).to_string(),
                session.end_time.format(TIME_FORMAT).to_string(),
                session.duration_minutes,
                session.amount,
                session.date.format(DATE_FORMAT).to_string(),
                session.operator,
            ],
        )?;

        debug!(category = %category, table_id = %table_id, amount = session.amount, "Session stored");
        Ok(())
    }

    fn load_sessions(
        &self,
        category: &CategoryId,
        table_id: TableId,
    ) -> StoreResult<Vec<SessionRecord>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT start_time, end_time, duration_minutes, amount, day, operator
            FROM sessions
            WHERE category = ? AND table_id = ?
            ORDER BY id ASC
            "#,
        )?;

        let rows = stmt.query_map(params![category.as_str(), table_id.get()], |row| {
            let start: String = row.get(0)?;
            let end: String = row.get(1)?;
            let duration_minutes: f64 = row.get(2)?;
            let amount: f64 = row.get(3)?;
            let day: String = row.get(4)?;
            let operator: String = row.get(5)?;
            Ok((start, end, duration_minutes, amount, day, operator))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (start, end, duration_minutes, amount, day, operator) = row?;
            sessions.push(SessionRecord {
                start_time: NaiveTime::parse_from_str(&start, TIME_FORMAT)?,
                end_time: NaiveTime::parse_from_str(&end, TIME_FORMAT)?,
                duration_minutes,
                amount,
                date: NaiveDate::parse_from_str(&day, DATE_FORMAT)?,
                operator,
            });
        }

        Ok(sessions)
    }

    fn clear_sessions(&self, category: &CategoryId, table_id: TableId) -> StoreResult<usize> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM sessions WHERE category = ? AND table_id = ?",
            params![category.as_str(), table_id.get()],
        )?;

        debug!(category = %category, table_id = %table_id, removed, "Sessions cleared");
        Ok(removed)
    }

    fn save_rate(&self, category: &CategoryId, table_id: TableId, rate: f64) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO table_rates (category, table_id, rate)
            VALUES (?, ?, ?)
            ON CONFLICT(category, table_id)
            DO UPDATE SET rate = excluded.rate
            "#,
            params![category.as_str(), table_id.get(), rate],
        )?;

        debug!(category = %category, table_id = %table_id, rate, "Rate saved");
        Ok(())
    }

    fn load_rate(&self, category: &CategoryId, table_id: TableId) -> StoreResult<Option<f64>> {
        let conn = self.conn()?;

        let rate = conn
            .query_row(
                "SELECT rate FROM table_rates WHERE category = ? AND table_id = ?",
                params![category.as_str(), table_id.get()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(rate)
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}
