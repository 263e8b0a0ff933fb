//! Bus lock shared between the foreground send path and the DIO0 receive handler.
//!
//! The flag is an `Arc<AtomicBool>` so a platform interrupt dispatcher running on
//! another thread can observe it. Acquisition never blocks: a caller that finds the
//! lock held backs off immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Non-blocking lock over the register bus
#[derive(Debug, Clone, Default)]
pub struct BusLock {
    held: Arc<AtomicBool>,
}

impl BusLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock, or `None` if it is already held
    pub fn try_acquire(&self) -> Option<BusGuard> {
        self.held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| BusGuard {
                held: Arc::clone(&self.held),
            })
    }

    pub fn is_locked(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Holds the bus lock until dropped
#[derive(Debug)]
pub struct BusGuard {
    held: Arc<AtomicBool>,
}

impl Drop for BusGuard {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
    }
}
