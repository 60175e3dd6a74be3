//! The view of a TLS server that reloading needs.

use crate::core::TlsConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A TLS-terminating server whose configuration can be replaced while it runs.
///
/// The reload subsystem never owns the server. It reads the active
/// configuration as a clone base and submits candidates through
/// [`TlsServer::swap_tls_config`], which is the only place server-visible
/// state changes.
///
/// Executions of the same reload task may overlap, so `swap_tls_config` must
/// be safe under concurrent callers: last write wins, and a half-applied
/// configuration must never be observable.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use hotswap_tls::core::{SharedTlsConfig, TlsConfig};
/// use hotswap_tls::error::Result;
/// use hotswap_tls::server::TlsServer;
/// use std::sync::Arc;
///
/// struct Listener {
///     tls: SharedTlsConfig,
/// }
///
/// #[async_trait]
/// impl TlsServer for Listener {
///     fn active_tls_config(&self) -> Option<Arc<TlsConfig>> {
///         self.tls.get()
///     }
///
///     async fn swap_tls_config(&self, candidate: TlsConfig) -> Result<bool> {
///         self.tls.update(candidate).await
///     }
/// }
/// ```
#[async_trait]
pub trait TlsServer: Send + Sync {
    /// The live configuration, or `None` if TLS is not enabled.
    fn active_tls_config(&self) -> Option<Arc<TlsConfig>>;

    /// Atomically replace the live configuration.
    ///
    /// Resolves to `Ok(true)` when the candidate was installed and
    /// `Ok(false)` when there was nothing to change.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ReloadError::Swap`] if the candidate is
    /// rejected. The previous configuration must then remain active.
    async fn swap_tls_config(&self, candidate: TlsConfig) -> Result<bool>;
}
