//! Background maintenance loops.
//!
//! This module handles:
//! - Periodic dataset refresh: reload the schedule CSV and atomically swap
//!   a new immutable snapshot into the shared store
//! - Reminder dispatch: notify callers whose recorded next sweep is tomorrow

use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::dataset::{load_dataset, DatasetStore};
use crate::providers::push::{PushClient, PushError};
use crate::storage;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("push client error: {0}")]
    Push(#[from] PushError),
}

/// Owns the refresh and reminder loops. Lookups only ever see the dataset
/// through the shared store this manager swaps snapshots into.
pub struct SyncManager {
    pool: SqlitePool,
    config: Config,
    timezone: chrono_tz::Tz,
    dataset: DatasetStore,
    push: Option<PushClient>,
}

impl SyncManager {
    pub fn new(
        pool: SqlitePool,
        config: Config,
        timezone: chrono_tz::Tz,
        dataset: DatasetStore,
    ) -> Result<Self, SyncError> {
        let push = match &config.reminders.push_key {
            Some(key) => Some(PushClient::new(
                config.reminders.endpoint.clone(),
                key.clone(),
            )?),
            None => None,
        };

        Ok(Self {
            pool,
            config,
            timezone,
            dataset,
            push,
        })
    }

    /// Start the background loops. Runs forever.
    pub async fn start(self: Arc<Self>) {
        info!("Starting sync manager");

        let refresh_self = self.clone();
        let refresh_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(
                refresh_self.config.dataset.refresh_interval_secs,
            ));
            // Skip the first tick which fires immediately (the dataset was
            // loaded at startup).
            interval.tick().await;

            loop {
                interval.tick().await;
                refresh_self.refresh_dataset().await;
            }
        });

        let reminder_self = self.clone();
        let reminder_handle = tokio::spawn(async move {
            if reminder_self.push.is_none() {
                info!("No push key configured, reminder dispatch disabled");
                return;
            }
            let interval_secs = reminder_self.config.reminders.interval_secs;
            info!(interval_secs, "Starting reminder dispatch loop");
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(interval_secs));

            loop {
                interval.tick().await;
                reminder_self.dispatch_reminders().await;
            }
        });

        let _ = tokio::join!(refresh_handle, reminder_handle);
    }

    /// Reload the dataset and swap the snapshot in atomically. On failure the
    /// previous snapshot keeps serving; in-flight lookups keep the `Arc` they
    /// already cloned either way.
    async fn refresh_dataset(&self) {
        let path = self.config.dataset.path.clone();
        let loaded = tokio::task::spawn_blocking(move || load_dataset(&path)).await;

        match loaded {
            Ok(Ok(dataset)) => {
                let segments = dataset.segments.len();
                let rules = dataset.rule_count();
                *self.dataset.write().await = Arc::new(dataset);
                info!(segments, rules, "Refreshed street sweeping dataset");
            }
            Ok(Err(e)) => {
                error!(error = %e, "Dataset refresh failed, keeping previous snapshot");
            }
            Err(e) => {
                error!(error = %e, "Dataset refresh task failed, keeping previous snapshot");
            }
        }
    }

    /// Send a reminder to every caller whose most recent recorded sweep is
    /// tomorrow in the operational timezone.
    async fn dispatch_reminders(&self) {
        let Some(push) = &self.push else {
            return;
        };

        let tomorrow = Utc::now().with_timezone(&self.timezone).date_naive() + Duration::days(1);
        let due = match storage::due_reminders(&self.pool, tomorrow).await {
            Ok(due) => due,
            Err(e) => {
                error!(error = %e, "Failed to query due reminders");
                return;
            }
        };

        if due.is_empty() {
            return;
        }
        info!(count = due.len(), date = %tomorrow, "Dispatching sweep reminders");

        for reminder in due {
            let message = format!(
                "Move your car from {} before {}:00 tomorrow ({}). Sweeping runs until {}:00.",
                reminder.street, reminder.from_hour, reminder.next_sweep_date, reminder.to_hour
            );

            match push.send("Street Sweeping Reminder", &message).await {
                Ok(()) => {
                    info!(
                        phone_number = %reminder.phone_number,
                        street = %reminder.street,
                        "Sent sweep reminder"
                    );
                    if let Err(e) = storage::mark_notified(&self.pool, reminder.id).await {
                        error!(id = reminder.id, error = %e, "Failed to mark reminder as notified");
                    }
                }
                Err(e) => {
                    // Left un-notified; picked up again on the next cycle.
                    warn!(id = reminder.id, error = %e, "Failed to send reminder");
                }
            }
        }
    }
}
