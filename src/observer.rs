//! Progress reporting and cooperative cancellation.
//!
//! Every long-running operation (cache build, DAG generation, file save and
//! load) takes an [`Observer`]. The observer is invoked with the step just
//! completed, the total number of steps for the phase, and the phase itself;
//! returning `false` cancels the operation, which unwinds with
//! [`Error::Cancelled`](crate::Error::Cancelled) and discards any partially
//! built state.
//!
//! Observers may block, so no internal lock is ever held across a callback.

use core::fmt;
use serde::{Deserialize, Serialize};

/// How often observers are notified, in steps. The generator and the file
/// codec default to every step.
pub const DEFAULT_CALLBACK_FREQUENCY: u64 = 1;

/// Stages at which progress is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Filling the cache with a hash chain off the epoch seed.
    CacheSeeding,
    /// Memory-hard strengthening rounds over the seeded cache.
    CacheGeneration,
    CacheSaving,
    CacheLoading,
    /// Deriving every DAG item from the cache.
    DagGeneration,
    DagSaving,
    DagLoading,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::CacheSeeding => "cache seeding",
            Phase::CacheGeneration => "cache generation",
            Phase::CacheSaving => "cache saving",
            Phase::CacheLoading => "cache loading",
            Phase::DagGeneration => "DAG generation",
            Phase::DagSaving => "DAG saving",
            Phase::DagLoading => "DAG loading",
        };
        f.write_str(name)
    }
}

/// Receives progress events; returns `false` to cancel the operation.
///
/// `Send + Sync` so the parallel DAG generator can share one observer across
/// its worker threads.
pub trait Observer: Send + Sync {
    fn report(&self, step: u64, max: u64, phase: Phase) -> bool;
}

/// Ignores all progress and never cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn report(&self, _step: u64, _max: u64, _phase: Phase) -> bool {
        true
    }
}

impl<F> Observer for F
where
    F: Fn(u64, u64, Phase) -> bool + Send + Sync,
{
    fn report(&self, step: u64, max: u64, phase: Phase) -> bool {
        self(step, max, phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn closures_are_observers() {
        let seen = AtomicU64::new(0);
        let observer = |step: u64, _max: u64, _phase: Phase| {
            seen.store(step, Ordering::Relaxed);
            true
        };
        assert!(observer.report(7, 10, Phase::CacheSeeding));
        assert_eq!(seen.load(Ordering::Relaxed), 7);
    }

    #[test]
    fn phase_display_names() {
        assert_eq!(Phase::CacheSeeding.to_string(), "cache seeding");
        assert_eq!(Phase::DagGeneration.to_string(), "DAG generation");
    }
}
