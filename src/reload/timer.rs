//! Periodic timer facility driving reload ticks.

use crate::error::{ReloadError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Opaque identifier of a periodic timer entry, shared with its reload task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Wrap a raw identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw identifier.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Callback invoked on every tick. Must return quickly.
pub type TickCallback = Arc<dyn Fn() + Send + Sync>;

/// Shared timer driving periodic callbacks.
pub trait Timer: Send + Sync {
    /// Invoke `callback` every `period`, first one period from now.
    ///
    /// # Errors
    ///
    /// Returns [`ReloadError::Configuration`] if the timer cannot be armed.
    fn every(&self, period: Duration, callback: TickCallback) -> Result<TaskId>;

    /// Stop future ticks of `id`. Returns `false` if `id` is unknown.
    fn cancel(&self, id: TaskId) -> bool;
}

/// Timer backed by one tokio task per entry.
///
/// Ticks that are missed because the runtime was busy are delayed rather
/// than burst. Dropping the timer cancels every entry.
pub struct TokioTimer {
    next_id: AtomicU64,
    entries: Mutex<HashMap<TaskId, JoinHandle<()>>>,
}

impl TokioTimer {
    /// Create a timer with no entries.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of armed entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing is armed.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for TokioTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for TokioTimer {
    fn every(&self, period: Duration, callback: TickCallback) -> Result<TaskId> {
        if period.is_zero() {
            return Err(ReloadError::configuration("timer period must be non-zero"));
        }
        let runtime = Handle::try_current()
            .map_err(|e| ReloadError::configuration(format!("no tokio runtime: {}", e)))?;

        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let handle = runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                callback();
            }
        });

        self.entries.lock().insert(id, handle);
        Ok(id)
    }

    fn cancel(&self, id: TaskId) -> bool {
        match self.entries.lock().remove(&id) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        for (_, handle) in self.entries.get_mut().drain() {
            handle.abort();
        }
    }
}

/// Timer that only fires when told to.
///
/// Lets tests and ops tooling drive ticks deterministically instead of
/// waiting for the real cadence.
///
/// # Examples
///
/// ```rust
/// use hotswap_tls::reload::{ManualTimer, Timer};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::time::Duration;
///
/// let timer = ManualTimer::new();
/// let ticks = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&ticks);
///
/// let id = timer
///     .every(Duration::from_secs(60), Arc::new(move || {
///         counter.fetch_add(1, Ordering::SeqCst);
///     }))
///     .unwrap();
///
/// assert!(timer.fire(id));
/// assert!(timer.cancel(id));
/// assert!(!timer.fire(id));
/// assert_eq!(ticks.load(Ordering::SeqCst), 1);
/// ```
pub struct ManualTimer {
    next_id: AtomicU64,
    entries: Mutex<HashMap<TaskId, (Duration, TickCallback)>>,
}

impl ManualTimer {
    /// Create a timer with no entries.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fire one tick of `id`. Returns `false` if `id` is not armed.
    pub fn fire(&self, id: TaskId) -> bool {
        // Clone out of the lock so the callback may re-enter the timer.
        let callback = self.entries.lock().get(&id).map(|(_, cb)| Arc::clone(cb));
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// Fire one tick of every armed entry, returning how many fired.
    pub fn fire_all(&self) -> usize {
        let callbacks: Vec<TickCallback> = self
            .entries
            .lock()
            .values()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in &callbacks {
            callback();
        }
        callbacks.len()
    }

    /// Period `id` was armed with.
    pub fn period(&self, id: TaskId) -> Option<Duration> {
        self.entries.lock().get(&id).map(|(period, _)| *period)
    }

    /// Number of armed entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing is armed.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for ManualTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for ManualTimer {
    fn every(&self, period: Duration, callback: TickCallback) -> Result<TaskId> {
        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().insert(id, (period, callback));
        Ok(id)
    }

    fn cancel(&self, id: TaskId) -> bool {
        self.entries.lock().remove(&id).is_some()
    }
}
