//! Snapshot of everything a listener needs to terminate TLS.

use std::fmt;

/// Client certificate policy, copied verbatim across reloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ClientAuth {
    /// Peers are not asked for a certificate.
    #[default]
    None,
    /// Peers may present a certificate.
    Request,
    /// Peers must present a certificate.
    Required,
}

/// A binary key or trust store plus the settings needed to open it.
///
/// Only [`StoreOptions::value`] is replaced on reload; the password, type and
/// alias are carried over from the active configuration.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct StoreOptions {
    /// Raw store content
    pub value: Vec<u8>,
    /// Store format, e.g. `PKCS12` or `JKS`
    pub store_type: String,
    /// Password protecting the store
    pub password: Option<String>,
    /// Entry to select inside the store
    pub alias: Option<String>,
}

impl StoreOptions {
    /// Create store options with the given format and content.
    pub fn new(store_type: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            value: value.into(),
            store_type: store_type.into(),
            password: None,
            alias: None,
        }
    }

    /// Set the store password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the entry alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Copy of these options with a different byte content.
    pub fn with_value(&self, value: Vec<u8>) -> Self {
        Self {
            value,
            ..self.clone()
        }
    }
}

impl fmt::Debug for StoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreOptions")
            .field("value", &format_args!("<{} bytes>", self.value.len()))
            .field("store_type", &self.store_type)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("alias", &self.alias)
            .finish()
    }
}

/// PEM certificate chains and private keys, paired positionally.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct PemKeyCert {
    /// One PEM blob per certificate file
    pub certs: Vec<Vec<u8>>,
    /// One PEM blob per key file, `keys[i]` belongs to `certs[i]`
    pub keys: Vec<Vec<u8>>,
}

impl PemKeyCert {
    /// Create a PEM identity from certificate and key blobs.
    pub fn new(certs: Vec<Vec<u8>>, keys: Vec<Vec<u8>>) -> Self {
        Self { certs, keys }
    }

    /// Number of certificate/key pairs.
    pub fn len(&self) -> usize {
        self.certs.len()
    }

    /// Returns `true` if no pair is present.
    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }
}

impl fmt::Debug for PemKeyCert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sizes = |blobs: &[Vec<u8>]| blobs.iter().map(Vec::len).collect::<Vec<_>>();
        f.debug_struct("PemKeyCert")
            .field("cert_bytes", &sizes(&self.certs))
            .field("key_bytes", &sizes(&self.keys))
            .finish()
    }
}

/// Material proving the server's identity during a handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// PEM certificate/key pairs
    Pem(PemKeyCert),
    /// Binary keystore
    KeyStore(StoreOptions),
}

impl Identity {
    /// Short label used in logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Identity::Pem(_) => "pem",
            Identity::KeyStore(_) => "keystore",
        }
    }
}

/// Immutable TLS configuration snapshot.
///
/// Two snapshots are equal iff every field, including the raw certificate,
/// key and store bytes, is identical. Reload uses that equality to skip
/// swaps when nothing changed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// Identity material
    pub identity: Identity,
    /// Trust material used to verify peers
    pub trust: Option<StoreOptions>,
    /// Enabled protocol versions, e.g. `TLSv1.3`
    pub protocols: Vec<String>,
    /// Enabled cipher suites, empty for the server default
    pub cipher_suites: Vec<String>,
    /// ALPN protocols offered to clients
    pub alpn: Vec<String>,
    /// Client certificate policy
    pub client_auth: ClientAuth,
}

impl TlsConfig {
    /// Create a configuration with the given identity and default settings.
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            trust: None,
            protocols: vec!["TLSv1.2".to_string(), "TLSv1.3".to_string()],
            cipher_suites: Vec::new(),
            alpn: vec!["h2".to_string(), "http/1.1".to_string()],
            client_auth: ClientAuth::None,
        }
    }

    /// Configuration backed by a single PEM certificate/key pair.
    pub fn from_pem(cert: impl Into<Vec<u8>>, key: impl Into<Vec<u8>>) -> Self {
        Self::new(Identity::Pem(PemKeyCert::new(
            vec![cert.into()],
            vec![key.into()],
        )))
    }

    /// Configuration backed by a keystore.
    pub fn from_key_store(store: StoreOptions) -> Self {
        Self::new(Identity::KeyStore(store))
    }

    /// Set the trust store.
    pub fn with_trust(mut self, trust: StoreOptions) -> Self {
        self.trust = Some(trust);
        self
    }

    /// Set the client certificate policy.
    pub fn with_client_auth(mut self, client_auth: ClientAuth) -> Self {
        self.client_auth = client_auth;
        self
    }

    /// Set the ALPN protocol list.
    pub fn with_alpn<I, S>(mut self, alpn: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alpn = alpn.into_iter().map(Into::into).collect();
        self
    }

    /// PEM pairs, if the identity is PEM based.
    pub fn pem(&self) -> Option<&PemKeyCert> {
        match &self.identity {
            Identity::Pem(pem) => Some(pem),
            Identity::KeyStore(_) => None,
        }
    }

    /// Keystore options, if the identity is keystore based.
    pub fn key_store(&self) -> Option<&StoreOptions> {
        match &self.identity {
            Identity::KeyStore(store) => Some(store),
            Identity::Pem(_) => None,
        }
    }
}
