//! Shared sensor measurement store
//!
//! One coarse lock over the whole record. Producers merge the fields they own
//! under a bounded lock wait; the inference engine copies the record by value
//! under the same lock. A snapshot therefore never mixes values from a
//! half-applied update, even though different fields may have been refreshed
//! at different times by different producers.
//!
//! Every access is timeout-bounded. A producer that cannot take the lock in
//! time skips its update for the cycle, keeping the prior values
//! authoritative; the engine skips its inference cycle. Neither case is an
//! error.

use std::sync::{Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::types::{SensorReadings, SensorUpdate};

/// Spacing between lock attempts while a deadline is pending.
const LOCK_RETRY_PAUSE: Duration = Duration::from_micros(100);

/// Mutex-guarded holder of the latest [`SensorReadings`].
#[derive(Debug, Default)]
pub struct SensorStore {
    inner: Mutex<SensorReadings>,
}

impl SensorStore {
    /// Create a store with zeroed readings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with known readings.
    pub fn with_initial(readings: SensorReadings) -> Self {
        Self {
            inner: Mutex::new(readings),
        }
    }

    /// Merge a producer's partial update into the record.
    ///
    /// Returns `false` without touching the record if the lock was not
    /// acquired within `timeout`; the caller treats that as "no update this
    /// cycle" and moves on. Producers must never block past their own
    /// periodic deadline on this lock.
    pub fn update(&self, update: &SensorUpdate, timeout: Duration) -> bool {
        match self.lock_within(timeout) {
            Some(mut guard) => {
                update.apply_to(&mut guard);
                true
            }
            None => {
                debug!(timeout_ms = timeout.as_millis() as u64, "sensor store busy, update skipped");
                false
            }
        }
    }

    /// Copy the whole record by value.
    ///
    /// The copy happens under the lock, so it is internally consistent with
    /// respect to every completed update. `None` on lock timeout.
    pub fn snapshot(&self, timeout: Duration) -> Option<SensorReadings> {
        match self.lock_within(timeout) {
            Some(guard) => Some(*guard),
            None => {
                debug!(timeout_ms = timeout.as_millis() as u64, "sensor store busy, snapshot skipped");
                None
            }
        }
    }

    /// Bounded lock acquisition: poll `try_lock` against a deadline.
    ///
    /// A poisoned lock is recovered rather than propagated — the record is
    /// plain data and field assignment cannot unwind partway.
    fn lock_within(&self, timeout: Duration) -> Option<MutexGuard<'_, SensorReadings>> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.inner.try_lock() {
                Ok(guard) => return Some(guard),
                Err(TryLockError::Poisoned(poisoned)) => return Some(poisoned.into_inner()),
                Err(TryLockError::WouldBlock) => {
                    if Instant::now() >= deadline {
                        return None;
                    }
                    thread::sleep(LOCK_RETRY_PAUSE);
                }
            }
        }
    }
}
