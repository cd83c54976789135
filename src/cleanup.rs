// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The todo-api-server authors

//! # Completed-Todo Cleanup
//!
//! Background task that periodically purges completed todos and their
//! attachments. Completion is treated as "done with this item": once a
//! sweep runs, the row and any uploaded image are gone for good.
//!
//! ## Strategy
//!
//! Every `interval` the job:
//! 1. Collects all completed todos across owners.
//! 2. Removes their rows from the store.
//! 3. Best-effort deletes each attachment key; a failed object deletion
//!    is logged and skipped, never aborting the sweep.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown. The
//! job is only spawned when `CLEANUP_INTERVAL_SECS` is configured.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::storage::ObjectStore;
use crate::store::TodoStore;

/// Outcome of a single sweep.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub deleted_todos: usize,
    pub deleted_files: usize,
}

/// Background purge job for completed todos.
pub struct CleanupJob {
    store: Arc<RwLock<TodoStore>>,
    objects: Arc<ObjectStore>,
    interval: Duration,
}

impl CleanupJob {
    pub fn new(store: Arc<RwLock<TodoStore>>, objects: Arc<ObjectStore>, interval: Duration) -> Self {
        Self {
            store,
            objects,
            interval,
        }
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(job.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Cleanup job starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Cleanup job shutting down");
                    return;
                }
            }

            let report = self.run_once().await;
            if report.deleted_todos > 0 {
                info!(
                    deleted_todos = report.deleted_todos,
                    deleted_files = report.deleted_files,
                    "Cleanup sweep completed"
                );
            }
        }
    }

    /// Execute one sweep: remove completed todos, then their attachments.
    ///
    /// Rows go first so a crash between the two steps leaves at worst an
    /// orphaned object, never a todo pointing at a deleted attachment.
    pub async fn run_once(&self) -> CleanupReport {
        let done = {
            let mut store = self.store.write().await;
            let done = store.completed();
            let ids: Vec<i64> = done.iter().map(|todo| todo.id).collect();
            store.remove_many(&ids);
            done
        };

        let mut deleted_files = 0;
        for todo in &done {
            let Some(key) = &todo.image_key else {
                continue;
            };
            match self.objects.delete(key).await {
                Ok(true) => deleted_files += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(todo_id = todo.id, key = %key, error = %e, "Cleanup: failed to delete attachment");
                }
            }
        }

        CleanupReport {
            deleted_todos: done.len(),
            deleted_files,
        }
    }
}
