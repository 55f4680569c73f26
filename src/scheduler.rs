//! Cancellable single-shot delayed callbacks
//!
//! Match-start announcements and the activity-status poll are fired from
//! here. Each task runs once on its own tokio task after a delay. Tasks
//! are registered under an optional string key (the queue identity) so
//! that stopping or deleting a queue can cancel whatever is still
//! pending for it instead of letting stale announcements fire.

use crate::utils::generate_task_id;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::debug;
use uuid::Uuid;

struct TaskEntry {
    key: Option<String>,
    handle: AbortHandle,
}

/// Process-wide scheduler holding the set of pending timer tasks
#[derive(Clone, Default)]
pub struct Scheduler {
    tasks: Arc<Mutex<HashMap<Uuid, TaskEntry>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `job` once after `delay`, without blocking the caller.
    /// Returns an id usable with [`Scheduler::cancel`].
    pub fn schedule<F>(&self, key: Option<String>, delay: Duration, job: F) -> Uuid
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = generate_task_id();
        let tasks = Arc::clone(&self.tasks);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            job.await;
            if let Ok(mut tasks) = tasks.lock() {
                tasks.remove(&id);
            }
        });

        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.insert(
                id,
                TaskEntry {
                    key,
                    handle: handle.abort_handle(),
                },
            );
        }

        debug!("Scheduled task {} to fire in {:?}", id, delay);
        id
    }

    /// Abort one pending task; true when it was still registered
    pub fn cancel(&self, id: Uuid) -> bool {
        if let Ok(mut tasks) = self.tasks.lock() {
            if let Some(entry) = tasks.remove(&id) {
                entry.handle.abort();
                return true;
            }
        }
        false
    }

    /// Abort everything still pending under `key`; returns how many
    /// tasks were cancelled
    pub fn cancel_key(&self, key: &str) -> usize {
        let mut cancelled = 0;
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.retain(|id, entry| {
                if entry.key.as_deref() == Some(key) {
                    entry.handle.abort();
                    debug!("Cancelled pending task {} for '{}'", id, key);
                    cancelled += 1;
                    false
                } else {
                    true
                }
            });
        }
        cancelled
    }

    /// Number of tasks not yet fired or cancelled
    pub fn pending_count(&self) -> usize {
        self.tasks.lock().map(|tasks| tasks.len()).unwrap_or(0)
    }
}
