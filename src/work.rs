//! Shared atomic helpers for parallel progress accounting and early-stop
//! coordination.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Track completed steps and coordinate cancellation across workers.
#[derive(Debug, Default)]
pub(crate) struct ProgressMeter {
    done: AtomicU64,
    stop: AtomicBool,
}

impl ProgressMeter {
    pub(crate) const fn new() -> Self {
        Self {
            done: AtomicU64::new(0),
            stop: AtomicBool::new(false),
        }
    }

    /// Whether workers should stop.
    #[inline]
    pub(crate) fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Request that all workers stop at their next check.
    pub(crate) fn force_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Record one completed step; returns the total completed so far.
    #[inline]
    pub(crate) fn record(&self) -> u64 {
        self.done.fetch_add(1, Ordering::Relaxed) + 1
    }
}
