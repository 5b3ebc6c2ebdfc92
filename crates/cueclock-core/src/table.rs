//! Table state machine

use chrono::{DateTime, Local, NaiveTime};
use cueclock_api::{SessionRecord, TableAction, TableStatus, TableView};
use cueclock_util::{
    CategoryId, CueError, MonotonicInstant, Result, TableId, clock_time, format_amount,
    format_elapsed,
};

use crate::{BillingClock, accrued_amount, billed_amount, billed_minutes};

/// Result of applying an action to a table
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Started,
    Paused,
    Resumed,
    Ended(SessionRecord),
    /// The action does not apply in the current state
    NoChange,
}

impl ActionOutcome {
    /// Operator-facing message, e.g. `Snooker Table 1 started`
    pub fn message(&self, label: &str, table_id: TableId, currency_symbol: &str) -> String {
        match self {
            ActionOutcome::Started => format!("{} Table {} started", label, table_id),
            ActionOutcome::Paused => format!("{} Table {} paused", label, table_id),
            ActionOutcome::Resumed => format!("{} Table {} resumed", label, table_id),
            ActionOutcome::Ended(session) => format!(
                "{} Table {} ended - {} for {:.1} minutes",
                label,
                table_id,
                format_amount(currency_symbol, session.amount),
                session.duration_minutes
            ),
            ActionOutcome::NoChange => "No action taken".to_string(),
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, ActionOutcome::NoChange)
    }
}

/// One billable table
#[derive(Debug, Clone)]
pub struct Table {
    id: TableId,
    status: TableStatus,
    rate: f64,
    clock: BillingClock,

    /// Wall-clock time of day the current session started
    session_started_at: Option<NaiveTime>,

    /// Completed sessions, oldest first
    sessions: Vec<SessionRecord>,
}

impl Table {
    /// Create an idle table with an empty session log
    pub fn new(id: TableId, rate: f64) -> Self {
        Self {
            id,
            status: TableStatus::Idle,
            rate,
            clock: BillingClock::new(),
            session_started_at: None,
            sessions: Vec::new(),
        }
    }

    /// Restore a previously persisted session log
    pub fn with_sessions(mut self, sessions: Vec<SessionRecord>) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn status(&self) -> TableStatus {
        self.status
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn sessions(&self) -> &[SessionRecord] {
        &self.sessions
    }

    pub fn last_session(&self) -> Option<&SessionRecord> {
        self.sessions.last()
    }

    pub fn elapsed_seconds(&self, now_mono: MonotonicInstant) -> u64 {
        self.clock.elapsed_seconds(now_mono)
    }

    /// Live charge of the current session
    pub fn amount(&self, now_mono: MonotonicInstant) -> f64 {
        accrued_amount(self.elapsed_seconds(now_mono), self.rate)
    }

    /// Apply an operator action.
    ///
    /// Pause toggles a paused table back to running, as does start. Pause and
    /// end on an idle table, and start on a running one, change nothing.
    pub fn apply(
        &mut self,
        action: TableAction,
        operator: &str,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> ActionOutcome {
        match (self.status, action) {
            (TableStatus::Idle, TableAction::Start) => {
                self.clock.start(now_mono);
                self.session_started_at = Some(clock_time(&now));
                self.status = TableStatus::Running;
                ActionOutcome::Started
            }
            (TableStatus::Running, TableAction::Pause) => {
                self.clock.pause(now_mono);
                self.status = TableStatus::Paused;
                ActionOutcome::Paused
            }
            (TableStatus::Paused, TableAction::Start | TableAction::Pause) => {
                self.clock.resume(now_mono);
                self.status = TableStatus::Running;
                ActionOutcome::Resumed
            }
            (TableStatus::Running | TableStatus::Paused, TableAction::End) => {
                let session = self.end_session(operator, now, now_mono);
                ActionOutcome::Ended(session)
            }
            (TableStatus::Running, TableAction::Start)
            | (TableStatus::Idle, TableAction::Pause | TableAction::End) => ActionOutcome::NoChange,
        }
    }

    fn end_session(
        &mut self,
        operator: &str,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> SessionRecord {
        let elapsed_seconds = self.clock.stop(now_mono).as_secs();

        let session = SessionRecord {
            start_time: self.session_started_at.take().unwrap_or(NaiveTime::MIN),
            end_time: clock_time(&now),
            duration_minutes: billed_minutes(elapsed_seconds),
            amount: billed_amount(elapsed_seconds, self.rate),
            date: now.date_naive(),
            operator: operator.to_string(),
        };

        self.sessions.push(session.clone());
        self.status = TableStatus::Idle;
        session
    }

    /// Change the rate. Only an idle table can be re-rated.
    pub fn set_rate(&mut self, rate: f64) -> Result<f64> {
        if self.status != TableStatus::Idle {
            return Err(CueError::invalid_state(format!(
                "table {} is {}, rate can only change while idle",
                self.id, self.status
            )));
        }

        let old = self.rate;
        self.rate = rate;
        Ok(old)
    }

    /// Drop the session log, returning how many records were removed.
    /// The current session, if any, is untouched.
    pub fn clear_sessions(&mut self) -> usize {
        let removed = self.sessions.len();
        self.sessions.clear();
        removed
    }

    /// Fold running time into the clock. Returns whether the table is running.
    pub fn refresh(&mut self, now_mono: MonotonicInstant) -> bool {
        if self.status == TableStatus::Running {
            self.clock.fold(now_mono);
            true
        } else {
            false
        }
    }

    /// Display view of this table
    pub fn view(&self, category: &CategoryId, now_mono: MonotonicInstant) -> TableView {
        let elapsed_seconds = self.elapsed_seconds(now_mono);
        TableView {
            category: category.clone(),
            table_id: self.id,
            status: self.status,
            elapsed_seconds,
            time_display: format_elapsed(elapsed_seconds),
            rate: self.rate,
            amount: accrued_amount(elapsed_seconds, self.rate),
            sessions: self.sessions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use cueclock_util::ErrorKind;
    use std::time::Duration;

    fn wall(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 12, 25, h, m, s).single().unwrap()
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_new_table_is_idle() {
        let table = Table::new(TableId::new(1), 3.0);
        let now_mono = MonotonicInstant::now();

        assert_eq!(table.status(), TableStatus::Idle);
        assert_eq!(table.elapsed_seconds(now_mono), 0);
        assert_eq!(table.amount(now_mono), 0.0);
        assert!(table.sessions().is_empty());
    }

    #[test]
    fn test_session_stamps_are_whole_seconds() {
        let mut table = Table::new(TableId::new(1), 3.0);
        let t0 = MonotonicInstant::now();
        let started = cueclock_util::now() + chrono::Duration::milliseconds(250);

        table.apply(TableAction::Start, "staff1", started, t0);
        let ended = started + chrono::Duration::milliseconds(90_500);
        let outcome = table.apply(TableAction::End, "staff1", ended, t0 + secs(90));
        let ActionOutcome::Ended(session) = outcome else {
            panic!("expected Ended");
        };

        let json = serde_json::to_value(&session).unwrap();
        for (field, stamp) in [("start_time", started), ("end_time", ended)] {
            let text = json[field].as_str().unwrap();
            assert_eq!(text, stamp.format("%H:%M:%S").to_string(), "{field}");
            assert_eq!(text.len(), 8, "{field}");
        }
    }

    #[test]
    fn test_ninety_seconds_at_three_per_minute() {
        let mut table = Table::new(TableId::new(1), 3.0);
        let t0 = MonotonicInstant::now();

        let outcome = table.apply(TableAction::Start, "staff1", wall(14, 0, 0), t0);
        assert_eq!(outcome, ActionOutcome::Started);

        let later = t0 + secs(90);
        assert_eq!(table.elapsed_seconds(later), 90);
        assert_eq!(table.amount(later), 4.5);

        let outcome = table.apply(TableAction::End, "staff1", wall(14, 1, 30), later);
        let ActionOutcome::Ended(session) = outcome else {
            panic!("expected Ended, got {:?}", outcome);
        };

        assert_eq!(session.duration_minutes, 1.5);
        assert_eq!(session.amount, 4.5);
        assert_eq!(session.start_time, NaiveTime::from_hms_opt(14, 0, 0).unwrap());
        assert_eq!(session.end_time, NaiveTime::from_hms_opt(14, 1, 30).unwrap());
        assert_eq!(session.operator, "staff1");

        assert_eq!(table.status(), TableStatus::Idle);
        assert_eq!(table.elapsed_seconds(later), 0);
        assert_eq!(table.sessions().len(), 1);
    }

    #[test]
    fn test_pause_freezes_then_resumes() {
        let mut table = Table::new(TableId::new(2), 3.0);
        let t0 = MonotonicInstant::now();

        table.apply(TableAction::Start, "a", wall(18, 0, 0), t0);
        let outcome = table.apply(TableAction::Pause, "a", wall(18, 0, 30), t0 + secs(30));
        assert_eq!(outcome, ActionOutcome::Paused);
        assert_eq!(table.status(), TableStatus::Paused);

        // Frozen while paused
        assert_eq!(table.amount(t0 + secs(30)), 1.5);
        assert_eq!(table.amount(t0 + secs(300)), 1.5);

        // Pausing again resumes
        let outcome = table.apply(TableAction::Pause, "a", wall(18, 5, 0), t0 + secs(300));
        assert_eq!(outcome, ActionOutcome::Resumed);
        assert_eq!(table.status(), TableStatus::Running);

        let outcome = table.apply(TableAction::End, "a", wall(18, 5, 30), t0 + secs(330));
        let ActionOutcome::Ended(session) = outcome else {
            panic!("expected Ended, got {:?}", outcome);
        };
        assert_eq!(session.duration_minutes, 1.0);
        assert_eq!(session.amount, 3.0);
    }

    #[test]
    fn test_start_resumes_paused_table() {
        let mut table = Table::new(TableId::new(1), 2.0);
        let t0 = MonotonicInstant::now();

        table.apply(TableAction::Start, "a", wall(9, 0, 0), t0);
        table.apply(TableAction::Pause, "a", wall(9, 0, 10), t0 + secs(10));
        let outcome = table.apply(TableAction::Start, "a", wall(9, 1, 0), t0 + secs(60));

        assert_eq!(outcome, ActionOutcome::Resumed);
        assert_eq!(table.elapsed_seconds(t0 + secs(60)), 10);
    }

    #[test]
    fn test_end_from_paused() {
        let mut table = Table::new(TableId::new(1), 6.0);
        let t0 = MonotonicInstant::now();

        table.apply(TableAction::Start, "a", wall(9, 0, 0), t0);
        table.apply(TableAction::Pause, "a", wall(9, 2, 0), t0 + secs(120));
        let outcome = table.apply(TableAction::End, "b", wall(9, 10, 0), t0 + secs(600));

        let ActionOutcome::Ended(session) = outcome else {
            panic!("expected Ended, got {:?}", outcome);
        };
        assert_eq!(session.duration_minutes, 2.0);
        assert_eq!(session.amount, 12.0);
        assert_eq!(session.operator, "b");
    }

    #[test]
    fn test_no_op_actions() {
        let mut table = Table::new(TableId::new(1), 3.0);
        let t0 = MonotonicInstant::now();

        assert_eq!(
            table.apply(TableAction::Pause, "a", wall(9, 0, 0), t0),
            ActionOutcome::NoChange
        );
        assert_eq!(
            table.apply(TableAction::End, "a", wall(9, 0, 0), t0),
            ActionOutcome::NoChange
        );
        assert_eq!(table.status(), TableStatus::Idle);
        assert!(table.sessions().is_empty());

        // Duplicate start keeps the original start
        table.apply(TableAction::Start, "a", wall(9, 0, 0), t0);
        let outcome = table.apply(TableAction::Start, "a", wall(9, 0, 20), t0 + secs(20));
        assert_eq!(outcome, ActionOutcome::NoChange);
        assert_eq!(table.elapsed_seconds(t0 + secs(20)), 20);
    }

    #[test]
    fn test_restart_resets_elapsed() {
        let mut table = Table::new(TableId::new(1), 3.0);
        let t0 = MonotonicInstant::now();

        table.apply(TableAction::Start, "a", wall(9, 0, 0), t0);
        table.apply(TableAction::End, "a", wall(9, 1, 0), t0 + secs(60));
        table.apply(TableAction::Start, "a", wall(9, 2, 0), t0 + secs(120));

        assert_eq!(table.elapsed_seconds(t0 + secs(120)), 0);
        assert_eq!(table.sessions().len(), 1);
    }

    #[test]
    fn test_amount_monotonic_while_running() {
        let mut table = Table::new(TableId::new(1), 4.5);
        let t0 = MonotonicInstant::now();
        table.apply(TableAction::Start, "a", wall(9, 0, 0), t0);

        let mut last = 0.0;
        for n in 0..200 {
            let now_mono = t0 + Duration::from_millis(n * 700);
            if n % 7 == 0 {
                table.refresh(now_mono);
            }
            let amount = table.amount(now_mono);
            assert!(amount >= last);
            last = amount;
        }
    }

    #[test]
    fn test_rate_change_only_when_idle() {
        let mut table = Table::new(TableId::new(1), 3.0);
        let t0 = MonotonicInstant::now();

        table.apply(TableAction::Start, "a", wall(9, 0, 0), t0);
        let err = table.set_rate(5.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(table.rate(), 3.0);

        table.apply(TableAction::Pause, "a", wall(9, 0, 5), t0 + secs(5));
        assert!(table.set_rate(5.0).is_err());

        table.apply(TableAction::End, "a", wall(9, 0, 10), t0 + secs(10));
        assert_eq!(table.set_rate(5.0).unwrap(), 3.0);
        assert_eq!(table.rate(), 5.0);
    }

    #[test]
    fn test_clear_keeps_running_session() {
        let mut table = Table::new(TableId::new(1), 3.0);
        let t0 = MonotonicInstant::now();

        table.apply(TableAction::Start, "a", wall(9, 0, 0), t0);
        table.apply(TableAction::End, "a", wall(9, 1, 0), t0 + secs(60));
        table.apply(TableAction::Start, "a", wall(9, 2, 0), t0 + secs(120));

        assert_eq!(table.clear_sessions(), 1);
        assert_eq!(table.clear_sessions(), 0);
        assert_eq!(table.status(), TableStatus::Running);
        assert_eq!(table.elapsed_seconds(t0 + secs(150)), 30);
    }

    #[test]
    fn test_view() {
        let mut table = Table::new(TableId::new(3), 3.0);
        let t0 = MonotonicInstant::now();
        table.apply(TableAction::Start, "a", wall(9, 0, 0), t0);

        let view = table.view(&CategoryId::new("snooker"), t0 + secs(65 * 60 + 5));
        assert_eq!(view.status, TableStatus::Running);
        assert_eq!(view.time_display, "65:05");
        assert_eq!(view.elapsed_seconds, 3905);
    }

    #[test]
    fn test_messages() {
        let id = TableId::new(1);
        assert_eq!(ActionOutcome::Started.message("Snooker", id, "₹"), "Snooker Table 1 started");
        assert_eq!(ActionOutcome::Resumed.message("Pool", id, "₹"), "Pool Table 1 resumed");
        assert_eq!(ActionOutcome::NoChange.message("Pool", id, "₹"), "No action taken");

        let session = SessionRecord {
            start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(14, 1, 30).unwrap(),
            duration_minutes: 1.5,
            amount: 4.5,
            date: wall(14, 1, 30).date_naive(),
            operator: "staff1".into(),
        };
        assert_eq!(
            ActionOutcome::Ended(session).message("Snooker", id, "₹"),
            "Snooker Table 1 ended - ₹4.50 for 1.5 minutes"
        );
    }
}
