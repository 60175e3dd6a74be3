//! One scheduled reload bound to a server and a source.

use crate::core::{Change, ChangeDetector, ConfigBuilder};
use crate::error::ReloadError;
use crate::reload::TaskId;
use crate::server::TlsServer;
use crate::sources::{MaterialLoader, ReloadSource};
use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, error, trace, warn};

#[cfg(feature = "metrics")]
use crate::metrics::ReloadMetrics;

/// How a single reload attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReloadOutcome {
    /// New material was installed on the server
    Applied,
    /// The material on disk matches the active configuration
    Unchanged,
    /// Reading, building or swapping failed; the old configuration stays
    Failed,
    /// The server is gone or no longer has TLS enabled
    Skipped,
}

impl ReloadOutcome {
    /// Returns `true` if the server's configuration changed.
    pub fn is_applied(self) -> bool {
        self == ReloadOutcome::Applied
    }

    /// Lowercase label, used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            ReloadOutcome::Applied => "applied",
            ReloadOutcome::Unchanged => "unchanged",
            ReloadOutcome::Failed => "failed",
            ReloadOutcome::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ReloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-erased reload action, as stored in the registry.
#[async_trait]
pub trait ReloadAction: Send + Sync {
    /// Run one reload attempt.
    ///
    /// Returns `true` if the server's configuration was changed. Never fails:
    /// every error is logged and reported as `false`.
    async fn execute(&self) -> bool;

    /// Returns `true` once the action can never do anything again, e.g.
    /// because its server was dropped. Orphaned actions are retired.
    fn is_orphaned(&self) -> bool {
        false
    }
}

/// Reload of one server's certificate material.
///
/// The task holds a weak reference to the server: it never keeps a server
/// alive, and attempts made after the server is dropped are skipped.
///
/// An attempt runs load, build and compare on tokio's blocking pool, then
/// awaits the server's swap. Failures leave the server untouched and do not
/// affect later attempts.
pub struct ReloadTask<S> {
    id: TaskId,
    server: Weak<S>,
    source: ReloadSource,
    loader: MaterialLoader,
    #[cfg(feature = "metrics")]
    metrics: Option<ReloadMetrics>,
}

impl<S: TlsServer + 'static> ReloadTask<S> {
    /// Create a task reloading `source` into `server`.
    pub fn new(id: TaskId, server: &Arc<S>, source: ReloadSource, loader: MaterialLoader) -> Self {
        Self {
            id,
            server: Arc::downgrade(server),
            source,
            loader,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Record every attempt in `metrics`.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, metrics: ReloadMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The task identifier.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The files this task re-reads.
    pub fn source(&self) -> &ReloadSource {
        &self.source
    }

    /// Run one reload attempt and report how it ended.
    pub async fn reload(&self) -> ReloadOutcome {
        #[cfg(feature = "metrics")]
        let started = self.metrics.as_ref().map(|m| m.start_reload());

        let outcome = self.attempt().await;

        #[cfg(feature = "metrics")]
        if let (Some(metrics), Some(started)) = (&self.metrics, started) {
            metrics.record_outcome(started, outcome);
        }

        outcome
    }

    async fn attempt(&self) -> ReloadOutcome {
        let Some(server) = self.server.upgrade() else {
            debug!(task_id = %self.id, "Server dropped, skipping TLS reload");
            return ReloadOutcome::Skipped;
        };
        let Some(active) = server.active_tls_config() else {
            warn!(task_id = %self.id, "TLS is no longer enabled on the server, skipping reload");
            return ReloadOutcome::Skipped;
        };

        let source = self.source.clone();
        let loader = self.loader.clone();
        // File reads must stay off the runtime's worker threads.
        let prepared = tokio::task::spawn_blocking(move || {
            let candidate = ConfigBuilder::new(&active).load(&loader, &source)?;
            Ok::<_, ReloadError>(ChangeDetector::detect(&active, candidate))
        })
        .await;

        let candidate = match prepared {
            Ok(Ok(Change::Changed(candidate))) => candidate,
            Ok(Ok(Change::Unchanged)) => {
                trace!(task_id = %self.id, "TLS material unchanged");
                return ReloadOutcome::Unchanged;
            }
            Ok(Err(e)) => {
                error!(
                    task_id = %self.id,
                    error = %e,
                    "Unable to reload the TLS certificate, keeping the current one"
                );
                return ReloadOutcome::Failed;
            }
            Err(e) => {
                error!(
                    task_id = %self.id,
                    error = %e,
                    "TLS reload worker did not complete, keeping the current certificate"
                );
                return ReloadOutcome::Failed;
            }
        };

        match server.swap_tls_config(candidate).await {
            Ok(true) => {
                debug!(task_id = %self.id, "TLS certificates updated");
                ReloadOutcome::Applied
            }
            Ok(false) => {
                trace!(task_id = %self.id, "Server reported no change");
                ReloadOutcome::Unchanged
            }
            Err(e) => {
                error!(
                    task_id = %self.id,
                    error = %e,
                    "Unable to reload the TLS certificate, keeping the current one"
                );
                ReloadOutcome::Failed
            }
        }
    }
}

#[async_trait]
impl<S: TlsServer + 'static> ReloadAction for ReloadTask<S> {
    async fn execute(&self) -> bool {
        self.reload().await.is_applied()
    }

    fn is_orphaned(&self) -> bool {
        self.server.strong_count() == 0
    }
}

impl<S> fmt::Debug for ReloadTask<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReloadTask")
            .field("id", &self.id)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
