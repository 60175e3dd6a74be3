//! Core TLS configuration types.

mod builder;
mod config_handle;
mod detector;
mod tls_config;
mod validation;

pub use builder::ConfigBuilder;
pub use config_handle::SharedTlsConfig;
pub use detector::{Change, ChangeDetector};
pub use tls_config::{ClientAuth, Identity, PemKeyCert, StoreOptions, TlsConfig};
pub use validation::Validate;
