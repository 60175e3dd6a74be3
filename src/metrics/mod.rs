//! Built-in metrics for certificate reloads.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Reload attempts
//! - Applied, unchanged and failed outcomes
//! - Reload duration
//! - Time since the last applied update
//!
//! # Examples
//!
//! ```rust,no_run
//! use hotswap_tls::metrics::ReloadMetrics;
//! use hotswap_tls::reload::Scheduler;
//! use opentelemetry::global;
//!
//! let scheduler = Scheduler::new().with_metrics(ReloadMetrics::new(global::meter("my-app")));
//! ```

mod reload_metrics;

pub use reload_metrics::ReloadMetrics;
