//! Paths of the certificate material to re-read on every reload.

use crate::error::{ReloadError, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Where the reload reads its certificate material from.
///
/// Certificate and key files are paired positionally (`files[i]` goes with
/// `key_files[i]`). A keystore is an alternative to PEM pairs for identity
/// material; the truststore is independent of both.
///
/// # Examples
///
/// ```rust
/// use hotswap_tls::sources::ReloadSource;
///
/// let source = ReloadSource::pem("tls/cert.pem", "tls/key.pem");
/// assert!(source.validate().is_ok());
/// assert!(source.is_pem());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReloadSource {
    /// Certificate files in PEM format
    pub files: Vec<PathBuf>,
    /// Private key files in PEM format
    pub key_files: Vec<PathBuf>,
    /// Binary keystore holding the identity
    pub key_store_file: Option<PathBuf>,
    /// Binary truststore used to verify peers
    pub trust_store_file: Option<PathBuf>,
}

impl ReloadSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Source with a single PEM certificate/key pair.
    pub fn pem(cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        Self::new().with_pem_pair(cert, key)
    }

    /// Add a PEM certificate/key pair.
    pub fn with_pem_pair(mut self, cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        self.files.push(cert.into());
        self.key_files.push(key.into());
        self
    }

    /// Set the keystore file.
    pub fn with_key_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_store_file = Some(path.into());
        self
    }

    /// Set the truststore file.
    pub fn with_trust_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.trust_store_file = Some(path.into());
        self
    }

    /// Returns `true` if identity material comes from PEM pairs.
    pub fn is_pem(&self) -> bool {
        !self.files.is_empty() && !self.key_files.is_empty()
    }

    /// Returns `true` if no file is configured at all.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
            && self.key_files.is_empty()
            && self.key_store_file.is_none()
            && self.trust_store_file.is_none()
    }

    /// Check that the paths describe a consistent source.
    ///
    /// A keystore configured next to PEM pairs is accepted and ignored, PEM
    /// pairs take precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ReloadError::Configuration`] if certificate and key lists
    /// differ in length, including keys configured without certificates.
    pub fn validate(&self) -> Result<()> {
        if self.files.len() != self.key_files.len() {
            return Err(ReloadError::configuration(format!(
                "{} certificate file(s) but {} key file(s) configured",
                self.files.len(),
                self.key_files.len()
            )));
        }

        Ok(())
    }
}
