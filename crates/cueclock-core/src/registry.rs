//! Table registry

use chrono::{DateTime, Local};
use cueclock_api::{
    CategoryInfo, CategorySnapshot, SplitBill, TableAction, TableStatus, TableView,
};
use cueclock_config::TrackerConfig;
use cueclock_store::{AuditEvent, AuditEventType, Store};
use cueclock_util::{
    CategoryId, CueError, MonotonicInstant, Result, TableId, rates_equal, round_currency,
};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{ActionOutcome, CoreEvent, Table};

/// Player counts accepted by a split bill
pub const SPLIT_PLAYERS: RangeInclusive<u32> = 1..=50;

/// Result of dispatching an action to a table
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub outcome: ActionOutcome,
    pub message: String,
    /// The table after the action
    pub table: TableView,
}

impl DispatchResult {
    /// Events to publish for this dispatch
    pub fn events(&self) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        if let ActionOutcome::Ended(session) = &self.outcome {
            events.push(CoreEvent::SessionCompleted {
                category: self.table.category.clone(),
                table_id: self.table.table_id,
                session: session.clone(),
            });
        }
        if self.outcome.is_change() {
            events.push(CoreEvent::TableChanged(self.table.clone()));
        }
        events
    }
}

#[derive(Debug)]
struct CategoryState {
    id: CategoryId,
    label: String,
    tables: BTreeMap<TableId, Table>,
}

/// Every table of every category, and the operations on them
pub struct TableRegistry {
    categories: Vec<CategoryState>,
    available_rates: Vec<f64>,
    currency_symbol: String,
    store: Arc<dyn Store>,
}

impl TableRegistry {
    /// Build the registry from configuration, restoring persisted rates and
    /// session logs from the store.
    pub fn new(config: &TrackerConfig, store: Arc<dyn Store>) -> Self {
        let categories = config
            .categories
            .iter()
            .map(|category| {
                let tables = category
                    .tables
                    .iter()
                    .map(|table| {
                        let rate = match store.load_rate(&category.id, table.id) {
                            Ok(Some(rate)) => rate,
                            Ok(None) => table.default_rate,
                            Err(e) => {
                                warn!(category = %category.id, table_id = %table.id, error = %e, "Failed to load rate, using default");
                                table.default_rate
                            }
                        };
                        let sessions = store
                            .load_sessions(&category.id, table.id)
                            .unwrap_or_else(|e| {
                                warn!(category = %category.id, table_id = %table.id, error = %e, "Failed to load sessions");
                                Vec::new()
                            });

                        (table.id, Table::new(table.id, rate).with_sessions(sessions))
                    })
                    .collect();

                CategoryState {
                    id: category.id.clone(),
                    label: category.label.clone(),
                    tables,
                }
            })
            .collect();

        let table_count = config.table_count();
        info!(
            category_count = config.categories.len(),
            table_count, "Table registry initialized"
        );

        let _ = store.append_audit(AuditEvent::new(AuditEventType::ConfigLoaded {
            category_count: config.categories.len(),
            table_count,
        }));

        Self {
            categories,
            available_rates: config.available_rates.clone(),
            currency_symbol: config.service.currency_symbol.clone(),
            store,
        }
    }

    /// Configured categories, in configuration order
    pub fn list_categories(&self) -> Vec<CategoryInfo> {
        self.categories
            .iter()
            .map(|c| CategoryInfo {
                id: c.id.clone(),
                label: c.label.clone(),
                table_count: c.tables.len(),
            })
            .collect()
    }

    /// All tables of a category, ordered by table id
    pub fn snapshot(
        &self,
        category: &CategoryId,
        now_mono: MonotonicInstant,
    ) -> Result<CategorySnapshot> {
        let state = find_category(&self.categories, category)?;

        Ok(CategorySnapshot {
            category: state.id.clone(),
            label: state.label.clone(),
            tables: state
                .tables
                .values()
                .map(|t| t.view(&state.id, now_mono))
                .collect(),
            available_rates: self.available_rates.clone(),
            currency_symbol: self.currency_symbol.clone(),
        })
    }

    /// View of a single table
    pub fn table_view(
        &self,
        category: &CategoryId,
        table_id: TableId,
        now_mono: MonotonicInstant,
    ) -> Result<TableView> {
        let state = find_category(&self.categories, category)?;
        let table = state.tables.get(&table_id).ok_or_else(|| CueError::TableNotFound {
            category: category.clone(),
            table_id,
        })?;
        Ok(table.view(&state.id, now_mono))
    }

    /// Apply an operator action (`start`, `pause` or `end`) to a table
    pub fn dispatch(
        &mut self,
        category: &CategoryId,
        table_id: TableId,
        action: &str,
        operator: &str,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> Result<DispatchResult> {
        let state = find_category_mut(&mut self.categories, category)?;
        let table = find_table_mut(&mut state.tables, category, table_id)?;
        let action: TableAction = action.parse()?;

        let elapsed_seconds = table.elapsed_seconds(now_mono);
        let outcome = table.apply(action, operator, now, now_mono);
        let message = outcome.message(&state.label, table_id, &self.currency_symbol);

        let audit = match &outcome {
            ActionOutcome::Started => {
                info!(category = %category, table_id = %table_id, rate = table.rate(), operator, "Table started");
                Some(AuditEventType::TableStarted {
                    category: category.clone(),
                    table_id,
                    rate: table.rate(),
                    operator: operator.to_string(),
                })
            }
            ActionOutcome::Paused => {
                info!(category = %category, table_id = %table_id, elapsed_seconds, operator, "Table paused");
                Some(AuditEventType::TablePaused {
                    category: category.clone(),
                    table_id,
                    elapsed_seconds,
                    operator: operator.to_string(),
                })
            }
            ActionOutcome::Resumed => {
                info!(category = %category, table_id = %table_id, operator, "Table resumed");
                Some(AuditEventType::TableResumed {
                    category: category.clone(),
                    table_id,
                    operator: operator.to_string(),
                })
            }
            ActionOutcome::Ended(session) => {
                info!(
                    category = %category,
                    table_id = %table_id,
                    minutes = session.duration_minutes,
                    amount = session.amount,
                    operator,
                    "Session ended"
                );
                if let Err(e) = self.store.append_session(category, table_id, session) {
                    warn!(category = %category, table_id = %table_id, error = %e, "Failed to persist session");
                }
                Some(AuditEventType::SessionEnded {
                    category: category.clone(),
                    table_id,
                    elapsed_seconds,
                    amount: session.amount,
                    operator: operator.to_string(),
                })
            }
            ActionOutcome::NoChange => {
                debug!(category = %category, table_id = %table_id, %action, status = %table.status(), "Action ignored");
                None
            }
        };

        if let Some(event) = audit {
            let _ = self.store.append_audit(AuditEvent::new(event));
        }

        Ok(DispatchResult {
            outcome,
            message,
            table: table.view(category, now_mono),
        })
    }

    /// Change the rate of an idle table to one of the allowed rates
    pub fn update_rate(
        &mut self,
        category: &CategoryId,
        table_id: TableId,
        rate: f64,
        operator: &str,
        now_mono: MonotonicInstant,
    ) -> Result<TableView> {
        if !self.available_rates.iter().any(|r| rates_equal(*r, rate)) {
            return Err(CueError::invalid_argument(format!(
                "rate {} is not one of the available rates",
                rate
            )));
        }

        let state = find_category_mut(&mut self.categories, category)?;
        let table = find_table_mut(&mut state.tables, category, table_id)?;
        let old_rate = table.set_rate(rate)?;

        info!(category = %category, table_id = %table_id, old_rate, new_rate = rate, operator, "Rate changed");

        if let Err(e) = self.store.save_rate(category, table_id, rate) {
            warn!(category = %category, table_id = %table_id, error = %e, "Failed to persist rate");
        }
        let _ = self.store.append_audit(AuditEvent::new(AuditEventType::RateChanged {
            category: category.clone(),
            table_id,
            old_rate,
            new_rate: rate,
            operator: operator.to_string(),
        }));

        Ok(table.view(category, now_mono))
    }

    /// Empty a table's session log. The current session keeps running.
    pub fn clear_sessions(
        &mut self,
        category: &CategoryId,
        table_id: TableId,
        operator: &str,
        now_mono: MonotonicInstant,
    ) -> Result<TableView> {
        let state = find_category_mut(&mut self.categories, category)?;
        let table = find_table_mut(&mut state.tables, category, table_id)?;
        let removed = table.clear_sessions();

        info!(category = %category, table_id = %table_id, removed, operator, "Sessions cleared");

        if let Err(e) = self.store.clear_sessions(category, table_id) {
            warn!(category = %category, table_id = %table_id, error = %e, "Failed to clear persisted sessions");
        }
        let _ = self.store.append_audit(AuditEvent::new(AuditEventType::SessionsCleared {
            category: category.clone(),
            table_id,
            removed,
            operator: operator.to_string(),
        }));

        Ok(table.view(category, now_mono))
    }

    /// Split the most recent session of a table evenly among players.
    ///
    /// An empty log is reported before a bad player count.
    pub fn split_bill(
        &self,
        category: &CategoryId,
        table_id: TableId,
        players: i64,
    ) -> Result<SplitBill> {
        let state = find_category(&self.categories, category)?;
        let table = state.tables.get(&table_id).ok_or_else(|| CueError::TableNotFound {
            category: category.clone(),
            table_id,
        })?;

        let session = table.last_session().ok_or_else(|| CueError::NoSessions {
            category: category.clone(),
            table_id,
        })?;

        let players = u32::try_from(players)
            .ok()
            .filter(|p| SPLIT_PLAYERS.contains(p))
            .ok_or_else(|| {
                CueError::invalid_argument(format!(
                    "players must be between {} and {}, got {}",
                    SPLIT_PLAYERS.start(),
                    SPLIT_PLAYERS.end(),
                    players
                ))
            })?;

        Ok(SplitBill {
            total_amount: session.amount,
            players,
            per_player: round_currency(session.amount / players as f64),
        })
    }

    /// Advance every running table to `now_mono`
    pub fn tick(&mut self, now_mono: MonotonicInstant) -> Vec<CoreEvent> {
        let mut events = Vec::new();

        for state in &mut self.categories {
            for table in state.tables.values_mut() {
                if table.refresh(now_mono) {
                    events.push(CoreEvent::TableRefreshed {
                        category: state.id.clone(),
                        table_id: table.id(),
                        elapsed_seconds: table.elapsed_seconds(now_mono),
                        amount: table.amount(now_mono),
                    });
                }
            }
        }

        events
    }

    /// Number of tables currently running
    pub fn running_tables(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|c| c.tables.values())
            .filter(|t| t.status() == TableStatus::Running)
            .count()
    }
}

fn find_category<'a>(
    categories: &'a [CategoryState],
    id: &CategoryId,
) -> Result<&'a CategoryState> {
    categories
        .iter()
        .find(|c| &c.id == id)
        .ok_or_else(|| CueError::CategoryNotFound(id.clone()))
}

fn find_category_mut<'a>(
    categories: &'a mut [CategoryState],
    id: &CategoryId,
) -> Result<&'a mut CategoryState> {
    categories
        .iter_mut()
        .find(|c| &c.id == id)
        .ok_or_else(|| CueError::CategoryNotFound(id.clone()))
}

fn find_table_mut<'a>(
    tables: &'a mut BTreeMap<TableId, Table>,
    category: &CategoryId,
    table_id: TableId,
) -> Result<&'a mut Table> {
    tables.get_mut(&table_id).ok_or_else(|| CueError::TableNotFound {
        category: category.clone(),
        table_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cueclock_store::SqliteStore;
    use cueclock_util::ErrorKind;
    use std::time::Duration;

    fn snooker() -> CategoryId {
        CategoryId::new("snooker")
    }

    fn pool() -> CategoryId {
        CategoryId::new("pool")
    }

    fn make_registry() -> (TableRegistry, Arc<dyn Store>) {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().unwrap());
        let registry = TableRegistry::new(&cueclock_config::default_config(), store.clone());
        (registry, store)
    }

    /// Run a table for `seconds` at its current rate and end it
    fn play(registry: &mut TableRegistry, category: &CategoryId, table_id: TableId, seconds: u64) {
        let now = cueclock_util::now();
        let t0 = MonotonicInstant::now();
        registry.dispatch(category, table_id, "start", "staff1", now, t0).unwrap();
        registry
            .dispatch(category, table_id, "end", "staff1", now, t0 + Duration::from_secs(seconds))
            .unwrap();
    }

    #[test]
    fn test_list_categories_in_config_order() {
        let (registry, _) = make_registry();
        let categories = registry.list_categories();

        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].id, snooker());
        assert_eq!(categories[0].label, "Snooker");
        assert_eq!(categories[0].table_count, 3);
        assert_eq!(categories[1].id, pool());
    }

    #[test]
    fn test_snapshot() {
        let (registry, _) = make_registry();
        let snapshot = registry.snapshot(&pool(), MonotonicInstant::now()).unwrap();

        let ids: Vec<u32> = snapshot.tables.iter().map(|t| t.table_id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(snapshot.tables.iter().all(|t| t.status == TableStatus::Idle));
        assert_eq!(snapshot.table(TableId::new(3)).unwrap().rate, 2.5);
        assert_eq!(snapshot.available_rates.len(), 9);
        assert_eq!(snapshot.currency_symbol, "₹");

        let err = registry
            .snapshot(&CategoryId::new("darts"), MonotonicInstant::now())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_dispatch_full_session() {
        let (mut registry, store) = make_registry();
        let now = cueclock_util::now();
        let t0 = MonotonicInstant::now();
        let table_id = TableId::new(1);

        let result = registry.dispatch(&snooker(), table_id, "start", "staff1", now, t0).unwrap();
        assert_eq!(result.message, "Snooker Table 1 started");
        assert_eq!(result.table.status, TableStatus::Running);

        let view = registry
            .table_view(&snooker(), table_id, t0 + Duration::from_secs(90))
            .unwrap();
        assert_eq!(view.elapsed_seconds, 90);
        assert_eq!(view.amount, 4.5);

        let result = registry
            .dispatch(&snooker(), table_id, "end", "staff1", now, t0 + Duration::from_secs(90))
            .unwrap();
        assert_eq!(result.message, "Snooker Table 1 ended - ₹4.50 for 1.5 minutes");
        assert_eq!(result.table.status, TableStatus::Idle);
        assert_eq!(result.table.elapsed_seconds, 0);
        assert_eq!(result.table.sessions.len(), 1);

        let events = result.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], CoreEvent::SessionCompleted { .. }));
        assert!(matches!(events[1], CoreEvent::TableChanged(_)));

        // Written through to the store
        let stored = store.load_sessions(&snooker(), table_id).unwrap();
        assert_eq!(stored, result.table.sessions);

        let audits = store.get_recent_audits(10).unwrap();
        assert!(matches!(audits[0].event, AuditEventType::SessionEnded { amount, .. } if amount == 4.5));
        assert!(matches!(audits[1].event, AuditEventType::TableStarted { .. }));
    }

    #[test]
    fn test_pause_resume_scenario() {
        let (mut registry, _) = make_registry();
        let now = cueclock_util::now();
        let t0 = MonotonicInstant::now();
        let table_id = TableId::new(1);
        let secs = Duration::from_secs;

        registry.dispatch(&snooker(), table_id, "start", "a", now, t0).unwrap();
        let result = registry.dispatch(&snooker(), table_id, "pause", "a", now, t0 + secs(30)).unwrap();
        assert_eq!(result.message, "Snooker Table 1 paused");
        assert_eq!(result.table.amount, 1.5);

        let view = registry.table_view(&snooker(), table_id, t0 + secs(45)).unwrap();
        assert_eq!(view.amount, 1.5);

        let result = registry.dispatch(&snooker(), table_id, "pause", "a", now, t0 + secs(45)).unwrap();
        assert_eq!(result.message, "Snooker Table 1 resumed");

        let result = registry.dispatch(&snooker(), table_id, "end", "a", now, t0 + secs(75)).unwrap();
        let ActionOutcome::Ended(session) = result.outcome else {
            panic!("expected Ended");
        };
        assert_eq!(session.duration_minutes, 1.0);
        assert_eq!(session.amount, 3.0);
    }

    #[test]
    fn test_dispatch_errors_and_no_ops() {
        let (mut registry, store) = make_registry();
        let now = cueclock_util::now();
        let t0 = MonotonicInstant::now();

        let err = registry
            .dispatch(&snooker(), TableId::new(9), "start", "a", now, t0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = registry
            .dispatch(&CategoryId::new("darts"), TableId::new(1), "start", "a", now, t0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = registry
            .dispatch(&snooker(), TableId::new(1), "stop", "a", now, t0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        for action in ["pause", "end"] {
            let result = registry.dispatch(&pool(), TableId::new(2), action, "a", now, t0).unwrap();
            assert_eq!(result.outcome, ActionOutcome::NoChange);
            assert_eq!(result.message, "No action taken");
            assert_eq!(result.table.status, TableStatus::Idle);
            assert!(result.events().is_empty());
        }

        assert!(store.load_sessions(&pool(), TableId::new(2)).unwrap().is_empty());
    }

    #[test]
    fn test_update_rate() {
        let (mut registry, store) = make_registry();
        let now = cueclock_util::now();
        let t0 = MonotonicInstant::now();
        let table_id = TableId::new(2);

        let view = registry.update_rate(&pool(), table_id, 3.5, "admin", t0).unwrap();
        assert_eq!(view.rate, 3.5);
        assert_eq!(store.load_rate(&pool(), table_id).unwrap(), Some(3.5));

        // Not one of the available rates
        let err = registry.update_rate(&pool(), table_id, 7.0, "admin", t0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        registry.dispatch(&pool(), table_id, "start", "a", now, t0).unwrap();
        let err = registry.update_rate(&pool(), table_id, 4.0, "admin", t0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        registry.dispatch(&pool(), table_id, "pause", "a", now, t0).unwrap();
        let err = registry.update_rate(&pool(), table_id, 4.0, "admin", t0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let view = registry.table_view(&pool(), table_id, t0).unwrap();
        assert_eq!(view.rate, 3.5);
    }

    #[test]
    fn test_clear_sessions_keeps_running_table() {
        let (mut registry, store) = make_registry();
        let table_id = TableId::new(3);
        play(&mut registry, &snooker(), table_id, 60);
        play(&mut registry, &snooker(), table_id, 120);

        let now = cueclock_util::now();
        let t0 = MonotonicInstant::now();
        registry.dispatch(&snooker(), table_id, "start", "a", now, t0).unwrap();

        let view = registry
            .clear_sessions(&snooker(), table_id, "admin", t0 + Duration::from_secs(10))
            .unwrap();
        assert!(view.sessions.is_empty());
        assert_eq!(view.status, TableStatus::Running);
        assert_eq!(view.elapsed_seconds, 10);
        assert!(store.load_sessions(&snooker(), table_id).unwrap().is_empty());

        // Idempotent
        let view = registry.clear_sessions(&snooker(), table_id, "admin", t0).unwrap();
        assert!(view.sessions.is_empty());
    }

    #[test]
    fn test_split_bill() {
        let (mut registry, _) = make_registry();
        let table_id = TableId::new(1);

        // An empty log wins over a bad player count
        for players in [2, 0, -1] {
            let err = registry.split_bill(&pool(), table_id, players).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NoSessions);
        }

        // 20 minutes at 6.0 per minute
        registry
            .update_rate(&pool(), table_id, 6.0, "admin", MonotonicInstant::now())
            .unwrap();
        play(&mut registry, &pool(), table_id, 20 * 60);

        let split = registry.split_bill(&pool(), table_id, 3).unwrap();
        assert_eq!(split.total_amount, 120.0);
        assert_eq!(split.players, 3);
        assert_eq!(split.per_player, 40.0);

        assert!(registry.split_bill(&pool(), table_id, 50).is_ok());
        for players in [0, 51, -3, i64::from(u32::MAX) + 1] {
            let err = registry.split_bill(&pool(), table_id, players).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }

        let split = registry.split_bill(&pool(), table_id, 7).unwrap();
        assert_eq!(split.per_player, 17.14);
    }

    #[test]
    fn test_split_uses_last_session() {
        let (mut registry, _) = make_registry();
        let table_id = TableId::new(1);

        // 3.0 per minute
        play(&mut registry, &snooker(), table_id, 60);
        play(&mut registry, &snooker(), table_id, 240);

        let split = registry.split_bill(&snooker(), table_id, 2).unwrap();
        assert_eq!(split.total_amount, 12.0);
        assert_eq!(split.per_player, 6.0);
    }

    #[test]
    fn test_tick_refreshes_running_tables() {
        let (mut registry, _) = make_registry();
        let now = cueclock_util::now();
        let t0 = MonotonicInstant::now();

        registry.dispatch(&snooker(), TableId::new(1), "start", "a", now, t0).unwrap();
        registry.dispatch(&pool(), TableId::new(1), "start", "a", now, t0).unwrap();
        registry.dispatch(&pool(), TableId::new(1), "pause", "a", now, t0).unwrap();
        assert_eq!(registry.running_tables(), 1);

        let events = registry.tick(t0 + Duration::from_secs(60));
        assert_eq!(events.len(), 1);
        match &events[0] {
            CoreEvent::TableRefreshed {
                category,
                table_id,
                elapsed_seconds,
                amount,
            } => {
                assert_eq!(category, &snooker());
                assert_eq!(*table_id, TableId::new(1));
                assert_eq!(*elapsed_seconds, 60);
                assert_eq!(*amount, 3.0);
            }
            other => panic!("unexpected event {:?}", other),
        }

        // Tick does not change what is reported
        let view = registry
            .table_view(&snooker(), TableId::new(1), t0 + Duration::from_secs(90))
            .unwrap();
        assert_eq!(view.amount, 4.5);
    }

    #[test]
    fn test_state_restored_from_store() {
        let (mut registry, store) = make_registry();
        let table_id = TableId::new(2);

        registry
            .update_rate(&snooker(), table_id, 6.5, "admin", MonotonicInstant::now())
            .unwrap();
        play(&mut registry, &snooker(), table_id, 120);
        drop(registry);

        let registry = TableRegistry::new(&cueclock_config::default_config(), store);
        let view = registry
            .table_view(&snooker(), table_id, MonotonicInstant::now())
            .unwrap();

        assert_eq!(view.status, TableStatus::Idle);
        assert_eq!(view.rate, 6.5);
        assert_eq!(view.sessions.len(), 1);
        assert_eq!(view.sessions[0].amount, 13.0);
    }
}
