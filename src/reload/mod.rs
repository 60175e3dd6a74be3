//! Periodic reload scheduling.
//!
//! A [`Scheduler`] arms one [`Timer`] entry per server. Each tick runs a
//! [`ReloadTask`] that re-reads the configured files, builds a candidate
//! configuration and swaps it in only when the bytes changed.

mod registry;
mod scheduler;
mod task;
mod timer;

pub use registry::ReloadRegistry;
pub use scheduler::{MIN_RELOAD_PERIOD, Scheduler, TaskHandle};
pub use task::{ReloadAction, ReloadOutcome, ReloadTask};
pub use timer::{ManualTimer, TaskId, TickCallback, Timer, TokioTimer};
