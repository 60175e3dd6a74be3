//! Reload metrics tracking using OpenTelemetry.

use crate::reload::ReloadOutcome;
use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Metrics collector for reload attempts.
///
/// Counts attempts and their outcomes, and records how long each attempt
/// took, including the server swap.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_tls::metrics::ReloadMetrics;
/// use hotswap_tls::reload::ReloadOutcome;
/// use opentelemetry::global;
///
/// let metrics = ReloadMetrics::new(global::meter("hotswap-tls"));
///
/// let timer = metrics.start_reload();
/// // ... perform reload ...
/// metrics.record_outcome(timer, ReloadOutcome::Applied);
/// ```
#[derive(Clone)]
pub struct ReloadMetrics {
    reload_attempts: Counter<u64>,
    reload_applied: Counter<u64>,
    reload_unchanged: Counter<u64>,
    reload_failures: Counter<u64>,
    reload_duration: Histogram<f64>,
    certificate_age_seconds: Gauge<i64>,
    last_update: Arc<Mutex<Instant>>,
}

impl ReloadMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let reload_attempts = meter
            .u64_counter("hotswap_tls.reload.attempts")
            .with_description("Total number of certificate reload attempts")
            .build();

        let reload_applied = meter
            .u64_counter("hotswap_tls.reload.applied")
            .with_description("Number of reloads that installed new certificates")
            .build();

        let reload_unchanged = meter
            .u64_counter("hotswap_tls.reload.unchanged")
            .with_description("Number of reloads that found no change")
            .build();

        let reload_failures = meter
            .u64_counter("hotswap_tls.reload.failures")
            .with_description("Number of failed reloads")
            .build();

        let reload_duration = meter
            .f64_histogram("hotswap_tls.reload.duration")
            .with_description("Duration of reload attempts in seconds")
            .with_unit("s")
            .build();

        let certificate_age_seconds = meter
            .i64_gauge("hotswap_tls.certificate.age")
            .with_description("Time since certificates were last updated in seconds")
            .with_unit("s")
            .build();

        Self {
            reload_attempts,
            reload_applied,
            reload_unchanged,
            reload_failures,
            reload_duration,
            certificate_age_seconds,
            last_update: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Start a reload timer and count the attempt.
    pub fn start_reload(&self) -> Instant {
        self.reload_attempts.add(1, &[]);
        Instant::now()
    }

    /// Record how a reload started with [`ReloadMetrics::start_reload`] ended.
    pub fn record_outcome(&self, start: Instant, outcome: ReloadOutcome) {
        let attrs = [KeyValue::new("outcome", outcome.as_str())];
        self.reload_duration
            .record(start.elapsed().as_secs_f64(), &attrs);

        match outcome {
            ReloadOutcome::Applied => {
                self.reload_applied.add(1, &[]);
                *self.last_update.lock() = Instant::now();
            }
            ReloadOutcome::Unchanged => self.reload_unchanged.add(1, &[]),
            ReloadOutcome::Failed => self.reload_failures.add(1, &[]),
            ReloadOutcome::Skipped => {}
        }

        self.update_certificate_age();
    }

    /// Time since certificates were last applied.
    pub fn certificate_age(&self) -> Duration {
        self.last_update.lock().elapsed()
    }

    /// When certificates were last applied, or when the collector was created.
    pub fn last_update(&self) -> Instant {
        *self.last_update.lock()
    }

    /// Update the certificate age gauge.
    ///
    /// Call periodically to track how stale the installed material is.
    pub fn update_certificate_age(&self) {
        let age_secs = self.certificate_age().as_secs() as i64;
        self.certificate_age_seconds.record(age_secs, &[]);
    }
}
