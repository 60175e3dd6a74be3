//! Change detection between the active and candidate configurations.

use crate::core::TlsConfig;

/// Outcome of comparing a candidate against the active configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Byte-identical to the active configuration
    Unchanged,
    /// Differs from the active configuration and should be installed
    Changed(TlsConfig),
}

impl Change {
    /// Returns `true` if a swap is needed.
    pub fn is_changed(&self) -> bool {
        matches!(self, Change::Changed(_))
    }
}

/// Structural comparison that makes reloads idempotent.
pub struct ChangeDetector;

impl ChangeDetector {
    /// Compare `candidate` against `active`.
    pub fn detect(active: &TlsConfig, candidate: TlsConfig) -> Change {
        if candidate == *active {
            Change::Unchanged
        } else {
            Change::Changed(candidate)
        }
    }
}
