//! # hotswap-tls
//!
//! Keep a running TLS listener's certificates fresh without restarting it.
//!
//! ## Overview
//!
//! Operators rotate certificate and key files on disk (an ACME client, a
//! secrets manager, a cron job). `hotswap-tls` periodically re-reads them,
//! compares the bytes with what the server is serving, and atomically swaps
//! in a new TLS configuration only when something changed:
//! - File reads run on tokio's blocking pool, never on the accept path
//! - Unchanged material never triggers a swap
//! - Any failure keeps the old certificates in place
//! - Schedule-time misconfiguration is reported immediately
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hotswap_tls::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> hotswap_tls::error::Result<()> {
//! let tls = Arc::new(SharedTlsConfig::new(TlsConfig::from_pem(
//!     std::fs::read("tls/cert.pem").unwrap_or_default(),
//!     std::fs::read("tls/key.pem").unwrap_or_default(),
//! )));
//!
//! let scheduler = Scheduler::new();
//! let handle = scheduler.start(
//!     &tls,
//!     ReloadSource::pem("tls/cert.pem", "tls/key.pem"),
//!     Some(Duration::from_secs(300)),
//! )?;
//!
//! // Lock-free read on every handshake
//! let current = tls.get();
//!
//! // Check the rotated files right away instead of waiting for the period
//! scheduler.force_reload().await;
//!
//! scheduler.cancel(handle);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `metrics`: OpenTelemetry counters and histograms for reload attempts

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod reload;
pub mod server;
pub mod settings;
pub mod sources;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{Identity, SharedTlsConfig, StoreOptions, TlsConfig};
    pub use crate::error::{ReloadError, Result};
    pub use crate::reload::{ReloadAction, Scheduler, TaskHandle};
    pub use crate::server::TlsServer;
    pub use crate::settings::{CertificateSettings, SettingsLoader};
    pub use crate::sources::ReloadSource;
}
