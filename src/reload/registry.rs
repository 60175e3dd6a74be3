//! Table of live reload tasks.

use crate::reload::{ReloadAction, TaskId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::warn;

/// Concurrent table of scheduled reload tasks, keyed by [`TaskId`].
///
/// Cloned handles share the same table. Registration and removal may happen
/// from any thread, including while [`ReloadRegistry::trigger_all`] runs: it
/// works on a snapshot, so tasks removed after the snapshot still complete
/// and tasks added after it are not triggered.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_tls::reload::ReloadRegistry;
///
/// # async fn example(registry: ReloadRegistry) {
/// for (id, applied) in registry.trigger_all().await {
///     println!("task {id}: applied={applied}");
/// }
/// # }
/// ```
#[derive(Clone, Default)]
pub struct ReloadRegistry {
    inner: Arc<RwLock<HashMap<TaskId, Arc<dyn ReloadAction>>>>,
}

impl ReloadRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action` under `id`, returning any action it replaced.
    pub fn register(
        &self,
        id: TaskId,
        action: Arc<dyn ReloadAction>,
    ) -> Option<Arc<dyn ReloadAction>> {
        self.inner.write().insert(id, action)
    }

    /// Remove the action registered under `id`.
    ///
    /// Returns `false` if nothing was registered.
    pub fn remove(&self, id: TaskId) -> bool {
        self.inner.write().remove(&id).is_some()
    }

    /// The action registered under `id`.
    pub fn get(&self, id: TaskId) -> Option<Arc<dyn ReloadAction>> {
        self.inner.read().get(&id).cloned()
    }

    /// Returns `true` if `id` is registered.
    pub fn contains(&self, id: TaskId) -> bool {
        self.inner.read().contains_key(&id)
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if no task is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Registered identifiers, in ascending order.
    pub fn ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<_> = self.inner.read().keys().copied().collect();
        ids.sort();
        ids
    }

    /// Identifiers of tasks that report themselves orphaned, in ascending order.
    pub fn orphaned(&self) -> Vec<TaskId> {
        let mut ids: Vec<_> = self
            .inner
            .read()
            .iter()
            .filter(|(_, action)| action.is_orphaned())
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// Run every registered task now and wait for all of them.
    ///
    /// Tasks run concurrently. Returns each task's result, `true` meaning its
    /// server's configuration changed, ordered by id. Intended for tests and
    /// ops tooling; the periodic path never waits on it.
    pub async fn trigger_all(&self) -> Vec<(TaskId, bool)> {
        let snapshot: Vec<_> = self
            .inner
            .read()
            .iter()
            .map(|(id, action)| (*id, Arc::clone(action)))
            .collect();

        let mut running = JoinSet::new();
        for (id, action) in snapshot {
            running.spawn(async move { (id, action.execute().await) });
        }

        let mut results = Vec::with_capacity(running.len());
        while let Some(joined) = running.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => warn!(error = %e, "Reload task did not complete during forced reload"),
            }
        }

        results.sort_by_key(|(id, _)| *id);
        results
    }
}
