//! Periodic billing tick
//!
//! One task for the life of the service. Each period it locks the registry,
//! folds running time into every running table and hands the resulting
//! events to a sink. It stops when the shutdown flag flips to `true`.

use cueclock_core::{CoreEvent, TableRegistry};
use cueclock_util::MonotonicInstant;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Spawn the tick task
pub fn spawn_ticker<F>(
    registry: Arc<Mutex<TableRegistry>>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    sink: F,
) -> JoinHandle<()>
where
    F: Fn(CoreEvent) + Send + 'static,
{
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(period_ms = period.as_millis() as u64, "Ticker started");

        loop {
            tokio::select! {
                _ = timer.tick() => {}
                changed = shutdown.changed() => {
                    // Sender gone means the service is gone
                    if changed.is_err() {
                        break;
                    }
                }
            }

            if *shutdown.borrow() {
                break;
            }

            let events = registry.lock().await.tick(MonotonicInstant::now());
            if !events.is_empty() {
                debug!(count = events.len(), "Tick refreshed running tables");
            }
            for event in events {
                sink(event);
            }
        }

        info!("Ticker stopped");
    })
}
