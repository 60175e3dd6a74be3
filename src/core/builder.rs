//! Assembles candidate TLS configurations from freshly loaded material.

use crate::core::{Identity, PemKeyCert, TlsConfig, Validate};
use crate::error::{ReloadError, Result};
use crate::sources::{LoadedMaterial, MaterialLoader, ReloadSource};

/// Builds a candidate [`TlsConfig`] by overlaying new material on a clone of
/// the active one.
///
/// Precedence:
/// - PEM certificate/key pairs replace the identity, whatever it was.
/// - Otherwise a keystore replaces the content of the active keystore and
///   keeps its type, password and alias.
/// - A truststore replaces the content of the active trust options.
/// - Without an identity source the identity is left untouched.
///
/// Building is all-or-nothing: any failure discards the whole candidate.
///
/// # Examples
///
/// ```rust
/// use hotswap_tls::core::{ConfigBuilder, TlsConfig};
/// use hotswap_tls::sources::LoadedMaterial;
///
/// let active = TlsConfig::from_pem(b"old-cert".to_vec(), b"key".to_vec());
/// let material = LoadedMaterial {
///     certs: vec![b"new-cert".to_vec()],
///     keys: vec![b"key".to_vec()],
///     ..Default::default()
/// };
///
/// let candidate = ConfigBuilder::new(&active).overlay(material).unwrap();
/// assert_eq!(candidate.pem().unwrap().certs[0], b"new-cert");
/// ```
pub struct ConfigBuilder<'a> {
    active: &'a TlsConfig,
}

impl<'a> ConfigBuilder<'a> {
    /// Create a builder cloning from `active`.
    pub fn new(active: &'a TlsConfig) -> Self {
        Self { active }
    }

    /// Load the source's material and build a candidate from it.
    ///
    /// # Errors
    ///
    /// Returns [`ReloadError::Read`] if a file cannot be read and
    /// [`ReloadError::Build`] if the material does not fit the active
    /// configuration or the candidate fails validation.
    pub fn load(&self, loader: &MaterialLoader, source: &ReloadSource) -> Result<TlsConfig> {
        let material = loader.load(source)?;
        self.overlay(material)
    }

    /// Build a candidate from already loaded material.
    ///
    /// # Errors
    ///
    /// Returns [`ReloadError::Build`] if a keystore or truststore is supplied
    /// while the active configuration has no options of that kind, or if the
    /// candidate fails validation.
    pub fn overlay(&self, material: LoadedMaterial) -> Result<TlsConfig> {
        let mut candidate = self.active.clone();

        if material.has_pem() {
            candidate.identity = Identity::Pem(PemKeyCert::new(material.certs, material.keys));
        } else if let Some(value) = material.key_store {
            candidate.identity = match &candidate.identity {
                Identity::KeyStore(store) => Identity::KeyStore(store.with_value(value)),
                other => {
                    return Err(ReloadError::Build(format!(
                        "keystore configured but the active identity is {}",
                        other.kind()
                    )));
                }
            };
        }

        if let Some(value) = material.trust_store {
            let trust = candidate.trust.as_ref().ok_or_else(|| {
                ReloadError::Build(
                    "truststore configured but the active configuration has no trust options"
                        .to_string(),
                )
            })?;
            candidate.trust = Some(trust.with_value(value));
        }

        candidate.validate()?;
        Ok(candidate)
    }
}
