//! Structural validation of TLS configuration candidates.

use crate::core::{Identity, TlsConfig};
use crate::error::ValidationError;

/// Trait for configuration validation.
///
/// Implemented by [`TlsConfig`] so that a candidate is rejected before it can
/// reach the server. Validation is structural only: certificates are never
/// parsed or verified here.
///
/// # Examples
///
/// ```rust
/// use hotswap_tls::core::{TlsConfig, Validate};
///
/// let config = TlsConfig::from_pem(b"cert".to_vec(), Vec::new());
/// assert!(config.validate().is_err());
/// ```
pub trait Validate {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Should return a `ValidationError` describing what validation failed.
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for TlsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();

        match &self.identity {
            Identity::Pem(pem) => {
                if pem.certs.is_empty() {
                    errors.push(ValidationError::invalid_field(
                        "identity.certs",
                        "at least one certificate is required",
                    ));
                }
                if pem.certs.len() != pem.keys.len() {
                    errors.push(ValidationError::invalid_field(
                        "identity.keys",
                        format!(
                            "{} key(s) for {} certificate(s)",
                            pem.keys.len(),
                            pem.certs.len()
                        ),
                    ));
                }
                if pem.certs.iter().chain(&pem.keys).any(Vec::is_empty) {
                    errors.push(ValidationError::invalid_field(
                        "identity",
                        "certificate and key files must not be empty",
                    ));
                }
            }
            Identity::KeyStore(store) if store.value.is_empty() => {
                errors.push(ValidationError::invalid_field(
                    "identity.value",
                    "keystore must not be empty",
                ));
            }
            Identity::KeyStore(_) => {}
        }

        if self.trust.as_ref().is_some_and(|trust| trust.value.is_empty()) {
            errors.push(ValidationError::invalid_field(
                "trust.value",
                "truststore must not be empty",
            ));
        }

        ValidationError::from_list(errors)
    }
}
