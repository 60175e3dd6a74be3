//! Scheduling of periodic certificate reloads.

use crate::error::{ReloadError, Result};
use crate::reload::{ReloadAction, ReloadRegistry, ReloadTask, TaskId, TickCallback, Timer, TokioTimer};
use crate::server::TlsServer;
use crate::settings::CertificateSettings;
use crate::sources::{MaterialLoader, ReloadSource};
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info};

#[cfg(feature = "metrics")]
use crate::metrics::ReloadMetrics;

/// Shortest accepted reload period.
///
/// Bounds the file I/O and swap overhead a misconfigured period can cause.
pub const MIN_RELOAD_PERIOD: Duration = Duration::from_secs(30);

/// Handle returned by [`Scheduler::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskHandle {
    /// No reload period was configured; nothing was scheduled
    Disabled,
    /// A periodic reload is running under this id
    Scheduled(TaskId),
}

impl TaskHandle {
    /// Returns `true` for the disabled sentinel.
    pub fn is_disabled(&self) -> bool {
        matches!(self, TaskHandle::Disabled)
    }

    /// The task id, if something was scheduled.
    pub fn id(&self) -> Option<TaskId> {
        match self {
            TaskHandle::Disabled => None,
            TaskHandle::Scheduled(id) => Some(*id),
        }
    }
}

/// Drives reload tasks on a fixed period.
///
/// Each scheduler owns its [`ReloadRegistry`]; there is no process-wide
/// task table. Ticks only dispatch work onto the tokio runtime and return,
/// so a slow read or swap never delays other tasks. Executions of the same
/// task may overlap when one takes longer than the period.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_tls::prelude::*;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn example() -> hotswap_tls::error::Result<()> {
/// let tls = Arc::new(SharedTlsConfig::new(TlsConfig::from_pem(
///     std::fs::read("tls/cert.pem").unwrap_or_default(),
///     std::fs::read("tls/key.pem").unwrap_or_default(),
/// )));
///
/// let scheduler = Scheduler::new();
/// let handle = scheduler.start(
///     &tls,
///     ReloadSource::pem("tls/cert.pem", "tls/key.pem"),
///     Some(Duration::from_secs(300)),
/// )?;
///
/// // On shutdown
/// scheduler.cancel(handle);
/// # Ok(())
/// # }
/// ```
pub struct Scheduler {
    timer: Arc<dyn Timer>,
    registry: ReloadRegistry,
    loader: MaterialLoader,
    #[cfg(feature = "metrics")]
    metrics: Option<ReloadMetrics>,
}

impl Scheduler {
    /// Create a scheduler driven by tokio timers.
    pub fn new() -> Self {
        Self::with_timer(Arc::new(TokioTimer::new()))
    }

    /// Create a scheduler driven by a custom timer.
    pub fn with_timer(timer: Arc<dyn Timer>) -> Self {
        Self {
            timer,
            registry: ReloadRegistry::new(),
            loader: MaterialLoader::new(),
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Read material through `loader` instead of the local filesystem.
    pub fn with_loader(mut self, loader: MaterialLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Record every reload attempt in `metrics`.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, metrics: ReloadMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The registry of tasks started by this scheduler.
    pub fn registry(&self) -> &ReloadRegistry {
        &self.registry
    }

    /// Schedule periodic reloads of `source` into `server`.
    ///
    /// Without a period, nothing is scheduled and [`TaskHandle::Disabled`] is
    /// returned, so callers can always go through this entry point.
    ///
    /// # Errors
    ///
    /// Returns [`ReloadError::Configuration`] if:
    /// - `period` is below [`MIN_RELOAD_PERIOD`]
    /// - the server has no TLS configuration
    /// - the source is malformed
    /// - no tokio runtime is available to run reloads on
    ///
    /// Nothing is registered when an error is returned.
    pub fn start<S>(
        &self,
        server: &Arc<S>,
        source: ReloadSource,
        period: Option<Duration>,
    ) -> Result<TaskHandle>
    where
        S: TlsServer + 'static,
    {
        let Some(period) = period else {
            debug!("No TLS reload period configured, reloading disabled");
            return Ok(TaskHandle::Disabled);
        };

        if period < MIN_RELOAD_PERIOD {
            return Err(ReloadError::configuration(format!(
                "The reload period cannot be less than {} seconds",
                MIN_RELOAD_PERIOD.as_secs()
            )));
        }
        if server.active_tls_config().is_none() {
            return Err(ReloadError::configuration(
                "TLS/SSL is not enabled on the server",
            ));
        }
        source.validate()?;

        let runtime = Handle::try_current()
            .map_err(|e| ReloadError::configuration(format!("no tokio runtime: {}", e)))?;

        let slot: Arc<OnceLock<TaskId>> = Arc::new(OnceLock::new());
        let callback: TickCallback = {
            let slot = Arc::clone(&slot);
            let registry = self.registry.clone();
            // Weak, since the timer owns this callback.
            let timer: Weak<dyn Timer> = Arc::downgrade(&self.timer);
            Arc::new(move || {
                let Some(id) = slot.get().copied() else {
                    return;
                };
                // Looked up on every tick so a cancelled task can never run again.
                let Some(action) = registry.get(id) else {
                    return;
                };
                if action.is_orphaned() {
                    match timer.upgrade() {
                        Some(timer) => retire(id, timer.as_ref(), &registry),
                        None => registry.remove(id),
                    };
                    debug!(task_id = %id, "Server dropped, TLS reload task retired");
                    return;
                }
                runtime.spawn(async move {
                    action.execute().await;
                });
            })
        };

        let id = self.timer.every(period, callback)?;
        let task = ReloadTask::new(id, server, source, self.loader.clone());
        #[cfg(feature = "metrics")]
        let task = match &self.metrics {
            Some(metrics) => task.with_metrics(metrics.clone()),
            None => task,
        };

        self.registry.register(id, Arc::new(task));
        slot.get_or_init(|| id);

        info!(task_id = %id, period_secs = period.as_secs(), "TLS certificate reloading scheduled");
        Ok(TaskHandle::Scheduled(id))
    }

    /// Schedule reloads described by `settings`.
    ///
    /// # Errors
    ///
    /// See [`Scheduler::start`].
    pub fn start_with_settings<S>(
        &self,
        server: &Arc<S>,
        settings: &CertificateSettings,
    ) -> Result<TaskHandle>
    where
        S: TlsServer + 'static,
    {
        self.start(server, settings.source(), settings.reload_period())
    }

    /// Stop the periodic reload behind `handle`.
    ///
    /// Future ticks are disarmed and the task leaves the registry before this
    /// returns. An attempt already in flight is allowed to finish. Returns
    /// `false` for [`TaskHandle::Disabled`] and unknown handles.
    pub fn cancel(&self, handle: TaskHandle) -> bool {
        let Some(id) = handle.id() else {
            return false;
        };

        let cancelled = retire(id, self.timer.as_ref(), &self.registry);
        if cancelled {
            debug!(task_id = %id, "TLS certificate reloading cancelled");
        }
        cancelled
    }

    /// Run every scheduled reload now and wait for all of them.
    ///
    /// Returns `(id, applied)` for each task, ordered by id. Tasks whose
    /// server was dropped report `false` and are retired afterwards.
    pub async fn force_reload(&self) -> Vec<(TaskId, bool)> {
        let results = self.registry.trigger_all().await;
        self.retire_orphans();
        results
    }

    /// Cancel every task whose server was dropped, returning how many.
    ///
    /// Ticks retire such tasks on their own; this reclaims them without
    /// waiting for the next tick.
    pub fn retire_orphans(&self) -> usize {
        let orphaned = self.registry.orphaned();
        for id in &orphaned {
            retire(*id, self.timer.as_ref(), &self.registry);
            debug!(task_id = %id, "Server dropped, TLS reload task retired");
        }
        orphaned.len()
    }
}

/// Disarm the timer entry and drop the registry entry of `id`.
fn retire(id: TaskId, timer: &dyn Timer, registry: &ReloadRegistry) -> bool {
    let disarmed = timer.cancel(id);
    let removed = registry.remove(id);
    disarmed || removed
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
