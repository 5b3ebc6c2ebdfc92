//! Shared types for the cueclockd API

use chrono::{NaiveDate, NaiveTime};
use cueclock_util::{CategoryId, CueError, TableId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Table state. Exactly one of these at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Idle,
    Running,
    Paused,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Idle => "idle",
            TableStatus::Running => "running",
            TableStatus::Paused => "paused",
        }
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator action on a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableAction {
    Start,
    /// Pause a running table, or resume a paused one
    Pause,
    End,
}

impl TableAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableAction::Start => "start",
            TableAction::Pause => "pause",
            TableAction::End => "end",
        }
    }
}

impl fmt::Display for TableAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableAction {
    type Err = CueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(TableAction::Start),
            "pause" => Ok(TableAction::Pause),
            "end" => Ok(TableAction::End),
            other => Err(CueError::invalid_argument(format!(
                "unknown action '{}', expected start, pause or end",
                other
            ))),
        }
    }
}

/// One completed billing interval. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Billed minutes, rounded to one decimal
    #[serde(rename = "duration")]
    pub duration_minutes: f64,
    /// Billed amount, rounded to two decimals
    pub amount: f64,
    pub date: NaiveDate,
    /// Operator who ended the session, recorded verbatim
    pub operator: String,
}

/// Point-in-time view of a table for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableView {
    pub category: CategoryId,
    pub table_id: TableId,
    pub status: TableStatus,
    pub elapsed_seconds: u64,
    /// `MM:SS`
    pub time_display: String,
    pub rate: f64,
    pub amount: f64,
    pub sessions: Vec<SessionRecord>,
}

/// Category listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub id: CategoryId,
    pub label: String,
    pub table_count: usize,
}

/// All tables of one category, ordered by table id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySnapshot {
    pub category: CategoryId,
    pub label: String,
    pub tables: Vec<TableView>,
    pub available_rates: Vec<f64>,
    pub currency_symbol: String,
}

impl CategorySnapshot {
    pub fn table(&self, table_id: TableId) -> Option<&TableView> {
        self.tables.iter().find(|t| t.table_id == table_id)
    }
}

/// Even split of the most recent session among players
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitBill {
    pub total_amount: f64,
    pub players: u32,
    /// Rounded to currency precision
    pub per_player: f64,
}

/// Health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub live: bool,
    pub ready: bool,
    pub store_ok: bool,
    pub running_tables: usize,
}
