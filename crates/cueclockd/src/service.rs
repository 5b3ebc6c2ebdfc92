//! Service wiring and command handling

use anyhow::{Context, Result};
use cueclock_api::{
    Command, ErrorInfo, Event, EventPayload, HealthStatus, Response, ResponsePayload,
};
use cueclock_config::TrackerConfig;
use cueclock_core::{CoreEvent, TableRegistry};
use cueclock_ipc::{IpcServer, ServerMessage};
use cueclock_store::{AuditEvent, AuditEventType, SqliteStore, Store};
use cueclock_util::{ClientId, CueError, MonotonicInstant, format_elapsed};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, warn};

use crate::spawn_ticker;

/// Database file inside the data directory
pub const DB_FILENAME: &str = "cueclockd.db";

/// Main service state
pub struct Service {
    registry: TableRegistry,
    ipc: Arc<IpcServer>,
    store: Arc<dyn Store>,
    tick_interval: Duration,
}

impl Service {
    /// Open the store, build the registry and bind the socket
    pub async fn new(config: TrackerConfig, socket_path: &Path, data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        let db_path = data_dir.join(DB_FILENAME);
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        store.append_audit(AuditEvent::new(AuditEventType::ServiceStarted))?;

        let registry = TableRegistry::new(&config, store.clone());

        let mut ipc = IpcServer::new(socket_path);
        ipc.start()
            .await
            .with_context(|| format!("Failed to bind socket {:?}", socket_path))?;

        Ok(Self {
            registry,
            ipc: Arc::new(ipc),
            store,
            tick_interval: config.service.tick_interval,
        })
    }

    pub fn socket_path(&self) -> PathBuf {
        self.ipc.socket_path().to_path_buf()
    }

    /// Serve requests until `shutdown` resolves
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let ipc = self.ipc.clone();
        let mut ipc_messages = ipc
            .take_message_receiver()
            .await
            .context("IPC message receiver already taken")?;

        let registry = Arc::new(Mutex::new(self.registry));
        let store = self.store.clone();

        // Accept connections
        let ipc_accept = ipc.clone();
        tokio::spawn(async move {
            if let Err(e) = ipc_accept.run().await {
                error!(error = %e, "IPC server error");
            }
        });

        // Billing tick
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let ipc_tick = ipc.clone();
        let ticker = spawn_ticker(registry.clone(), self.tick_interval, shutdown_rx, move |event| {
            ipc_tick.broadcast_event(Event::new(event_payload(event)));
        });

        info!("Service running");

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }

                Some(msg) = ipc_messages.recv() => {
                    Self::handle_ipc_message(&registry, &ipc, &store, msg).await;
                }
            }
        }

        info!("Shutting down cueclockd");

        let _ = shutdown_tx.send(true);
        if let Err(e) = ticker.await {
            warn!(error = %e, "Ticker task failed");
        }

        ipc.broadcast_event(Event::new(EventPayload::Shutdown));

        if let Err(e) = store.append_audit(AuditEvent::new(AuditEventType::ServiceStopped)) {
            warn!(error = %e, "Failed to log service shutdown");
        }

        ipc.shutdown();
        info!("Shutdown complete");
        Ok(())
    }

    async fn handle_ipc_message(
        registry: &Arc<Mutex<TableRegistry>>,
        ipc: &Arc<IpcServer>,
        store: &Arc<dyn Store>,
        msg: ServerMessage,
    ) {
        match msg {
            ServerMessage::Request { client_id, request } => {
                let response = handle_command(
                    registry,
                    ipc,
                    store,
                    &client_id,
                    request.request_id,
                    request.command,
                )
                .await;

                if let Err(e) = ipc.send_response(&client_id, response).await {
                    debug!(client_id = %client_id, error = %e, "Failed to send response");
                }
            }

            ServerMessage::ClientConnected { client_id, info } => {
                info!(client_id = %client_id, uid = ?info.uid, "Client connected");

                let _ = store.append_audit(AuditEvent::new(AuditEventType::ClientConnected {
                    client_id: client_id.to_string(),
                    uid: info.uid,
                }));
            }

            ServerMessage::ClientDisconnected { client_id } => {
                debug!(client_id = %client_id, "Client disconnected");

                let _ = store.append_audit(AuditEvent::new(AuditEventType::ClientDisconnected {
                    client_id: client_id.to_string(),
                }));
            }
        }
    }
}

/// Execute one command against the registry
pub async fn handle_command(
    registry: &Arc<Mutex<TableRegistry>>,
    ipc: &Arc<IpcServer>,
    store: &Arc<dyn Store>,
    client_id: &ClientId,
    request_id: u64,
    command: Command,
) -> Response {
    let now = cueclock_util::now();
    let now_mono = MonotonicInstant::now();

    let result: Result<ResponsePayload, CueError> = match command {
        Command::ListCategories => {
            let categories = registry.lock().await.list_categories();
            Ok(ResponsePayload::Categories { categories })
        }

        Command::GetSnapshot { category } => registry
            .lock()
            .await
            .snapshot(&category, now_mono)
            .map(ResponsePayload::Snapshot),

        Command::Dispatch {
            category,
            table_id,
            action,
            operator,
        } => {
            let result = registry
                .lock()
                .await
                .dispatch(&category, table_id, &action, &operator, now, now_mono);

            result.map(|dispatched| {
                for event in dispatched.events() {
                    ipc.broadcast_event(Event::new(event_payload(event)));
                }
                ResponsePayload::ActionApplied {
                    message: dispatched.message,
                    table: dispatched.table,
                }
            })
        }

        Command::UpdateRate {
            category,
            table_id,
            rate,
            operator,
        } => {
            let result = registry
                .lock()
                .await
                .update_rate(&category, table_id, rate, &operator, now_mono);
            result.map(|table| table_updated(ipc, table))
        }

        Command::ClearSessions {
            category,
            table_id,
            operator,
        } => {
            let result = registry
                .lock()
                .await
                .clear_sessions(&category, table_id, &operator, now_mono);
            result.map(|table| table_updated(ipc, table))
        }

        Command::SplitBill {
            category,
            table_id,
            players,
        } => registry
            .lock()
            .await
            .split_bill(&category, table_id, players)
            .map(ResponsePayload::Split),

        Command::GetHealth => {
            let running_tables = registry.lock().await.running_tables();
            let store_ok = store.is_healthy();
            Ok(ResponsePayload::Health(HealthStatus {
                live: true,
                ready: store_ok,
                store_ok,
                running_tables,
            }))
        }

        Command::SubscribeEvents => {
            debug!(client_id = %client_id, "Client subscribed to events");
            Ok(ResponsePayload::Subscribed {
                client_id: client_id.clone(),
            })
        }

        Command::UnsubscribeEvents => {
            debug!(client_id = %client_id, "Client unsubscribed from events");
            Ok(ResponsePayload::Unsubscribed)
        }

        Command::Ping => Ok(ResponsePayload::Pong),
    };

    match result {
        Ok(payload) => Response::success(request_id, payload),
        Err(e) => {
            debug!(client_id = %client_id, request_id, error = %e, "Command failed");
            Response::error(request_id, ErrorInfo::from(&e))
        }
    }
}

fn table_updated(ipc: &IpcServer, table: cueclock_api::TableView) -> ResponsePayload {
    ipc.broadcast_event(Event::new(EventPayload::TableUpdated(table.clone())));
    ResponsePayload::Table(table)
}

/// Map a registry event onto the wire
pub fn event_payload(event: CoreEvent) -> EventPayload {
    match event {
        CoreEvent::TableChanged(table) => EventPayload::TableUpdated(table),
        CoreEvent::TableRefreshed {
            category,
            table_id,
            elapsed_seconds,
            amount,
        } => EventPayload::TableTick {
            category,
            table_id,
            elapsed_seconds,
            time_display: format_elapsed(elapsed_seconds),
            amount,
        },
        CoreEvent::SessionCompleted {
            category,
            table_id,
            session,
        } => EventPayload::SessionCompleted {
            category,
            table_id,
            session,
        },
    }
}
