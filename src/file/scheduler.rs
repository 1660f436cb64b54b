//! Per-entry expiry timers.
//!
//! Each armed id owns one lightweight tokio task that sleeps until the
//! entry's expiry and then reports the id on a channel. The scheduler never
//! touches registry state itself; the registry drains the channel and runs
//! its own delete path.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// One-shot expiry timers keyed by file id.
#[derive(Debug)]
pub struct ExpiryScheduler {
    timers: Mutex<HashMap<String, JoinHandle<()>>>,
    fired: mpsc::UnboundedSender<String>,
}

impl ExpiryScheduler {
    /// Create a scheduler and the receiver on which fired ids are delivered.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (fired, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            timers: Mutex::new(HashMap::new()),
            fired,
        };
        (scheduler, rx)
    }

    fn timers(&self) -> MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        self.timers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fire `id` at `fire_at`.
    ///
    /// A `fire_at` in the past fires on the next scheduler tick. Re-arming an
    /// id replaces its previous timer. Must be called from within a tokio
    /// runtime.
    pub fn arm(&self, id: &str, fire_at: DateTime<Utc>) {
        let delay = (fire_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        let deadline = Instant::now() + delay;
        let fired = self.fired.clone();
        let key = id.to_string();

        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            // Receiver gone means the registry is shutting down.
            let _ = fired.send(key);
        });

        if let Some(previous) = self.timers().insert(id.to_string(), handle) {
            previous.abort();
        }

        tracing::debug!(id = %id, delay_ms = delay.as_millis() as u64, "Expiry timer armed");
    }

    /// Cancel the timer for `id`.
    ///
    /// Returns `true` if a timer was pending. Cancelling an id that already
    /// fired or was never armed is a no-op.
    pub fn cancel(&self, id: &str) -> bool {
        match self.timers().remove(id) {
            Some(handle) => {
                let pending = !handle.is_finished();
                handle.abort();
                pending
            }
            None => false,
        }
    }

    /// Whether `id` has a timer registered.
    pub fn is_armed(&self, id: &str) -> bool {
        self.timers().contains_key(id)
    }

    /// Number of registered timers.
    pub fn armed_count(&self) -> usize {
        self.timers().len()
    }

    /// Cancel every timer.
    pub fn cancel_all(&self) {
        for (_, handle) in self.timers().drain() {
            handle.abort();
        }
    }
}

impl Drop for ExpiryScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
