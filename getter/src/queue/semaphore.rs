//! Counting semaphore built on a mutex and condition variable.

use parking_lot::{Condvar, Mutex};

/// A classic counting semaphore.
///
/// `acquire` blocks while the count is zero; `release` increments the count
/// and wakes exactly one blocked caller.
#[derive(Debug)]
pub(crate) struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    /// Create a semaphore holding `permits` initial permits.
    pub(crate) fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            available: Condvar::new(),
        }
    }

    /// Take one permit, blocking until one is available.
    pub(crate) fn acquire(&self) {
        let mut permits = self.permits.lock();
        while *permits == 0 {
            self.available.wait(&mut permits);
        }
        *permits -= 1;
    }

    /// Return one permit and wake a single waiter.
    pub(crate) fn release(&self) {
        let mut permits = self.permits.lock();
        *permits += 1;
        // Notify while holding the lock so the waiter cannot miss the update.
        self.available.notify_one();
    }

    /// Current number of free permits (snapshot).
    pub(crate) fn available(&self) -> usize {
        *self.permits.lock()
    }
}
