//! Lock-free holder for a server's live TLS configuration.

use crate::core::TlsConfig;
use crate::error::{ReloadError, Result, ValidationError};
use crate::server::TlsServer;
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Type alias for validator functions.
type Validator = Arc<dyn Fn(&TlsConfig) -> std::result::Result<(), ValidationError> + Send + Sync>;

/// Holds the live [`TlsConfig`] of a listener.
///
/// Reads go through `arc-swap` and never block. Writers are serialized so
/// that concurrent reloads cannot interleave their compare and store steps:
/// an update equal to the live value resolves to `false` and the last
/// differing write wins. Handshakes holding an older `Arc` keep using it
/// until they finish.
///
/// # Examples
///
/// ```rust
/// use hotswap_tls::core::{SharedTlsConfig, TlsConfig};
///
/// # async fn example() -> hotswap_tls::error::Result<()> {
/// let tls = SharedTlsConfig::new(TlsConfig::from_pem(b"cert".to_vec(), b"key".to_vec()));
///
/// let applied = tls
///     .update(TlsConfig::from_pem(b"new-cert".to_vec(), b"key".to_vec()))
///     .await?;
/// assert!(applied);
/// # Ok(())
/// # }
/// ```
pub struct SharedTlsConfig {
    /// The current configuration, `None` when TLS is disabled
    current: Arc<ArcSwapOption<TlsConfig>>,
    /// Serializes writers, readers never take it
    write_lock: Arc<Mutex<()>>,
    /// Optional validator applied to every update
    validator: Option<Validator>,
}

impl SharedTlsConfig {
    /// Create a holder with TLS enabled.
    pub fn new(initial: TlsConfig) -> Self {
        Self {
            current: Arc::new(ArcSwapOption::from_pointee(initial)),
            write_lock: Arc::new(Mutex::new(())),
            validator: None,
        }
    }

    /// Create a holder for a listener without TLS.
    pub fn disabled() -> Self {
        Self {
            current: Arc::new(ArcSwapOption::empty()),
            write_lock: Arc::new(Mutex::new(())),
            validator: None,
        }
    }

    /// Reject updates that fail `validator`.
    ///
    /// Use this to plug in stricter checks, e.g. parsing the PEM blocks with
    /// the TLS library that will serve them.
    pub fn with_validation<F>(mut self, validator: F) -> Self
    where
        F: Fn(&TlsConfig) -> std::result::Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Get a reference-counted handle to the live configuration.
    ///
    /// This operation is lock-free.
    pub fn get(&self) -> Option<Arc<TlsConfig>> {
        self.current.load_full()
    }

    /// Returns `true` if a configuration is installed.
    pub fn is_enabled(&self) -> bool {
        self.current.load().is_some()
    }

    /// Install `candidate` unless it equals the live configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ReloadError::Swap`] if TLS is disabled or the validator
    /// rejects the candidate. The live configuration is left untouched.
    pub async fn update(&self, candidate: TlsConfig) -> Result<bool> {
        if let Some(validator) = &self.validator {
            validator(&candidate).map_err(|e| ReloadError::Swap(e.to_string()))?;
        }

        let _guard = self.write_lock.lock().await;

        match self.current.load_full() {
            None => Err(ReloadError::Swap("TLS is not enabled".to_string())),
            Some(active) if *active == candidate => Ok(false),
            Some(_) => {
                self.current.store(Some(Arc::new(candidate)));
                Ok(true)
            }
        }
    }
}

impl Clone for SharedTlsConfig {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
            write_lock: Arc::clone(&self.write_lock),
            validator: self.validator.clone(),
        }
    }
}

#[async_trait]
impl TlsServer for SharedTlsConfig {
    fn active_tls_config(&self) -> Option<Arc<TlsConfig>> {
        self.get()
    }

    async fn swap_tls_config(&self, candidate: TlsConfig) -> Result<bool> {
        self.update(candidate).await
    }
}
