//! The process-wide, epoch-keyed map of shared DAG handles.
//!
//! Construction of a handle takes minutes and gigabytes, so the registry
//! guarantees that all callers asking for the same epoch end up holding the
//! same `Arc`. The lock covers only map lookup and insertion; builders run
//! outside it, and a builder that loses an insertion race simply drops its
//! result in favor of the established handle.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::dag::Dag;
use crate::error::Error;

pub struct DagRegistry {
    dags: Mutex<BTreeMap<u64, Arc<Dag>>>,
}

impl DagRegistry {
    pub const fn new() -> Self {
        Self {
            dags: Mutex::new(BTreeMap::new()),
        }
    }

    /// The registry shared by [`make_dag`](crate::make_dag) and
    /// [`load_dag`](crate::load_dag).
    pub fn global() -> &'static DagRegistry {
        static GLOBAL: DagRegistry = DagRegistry::new();
        &GLOBAL
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<u64, Arc<Dag>>> {
        self.dags.lock().expect("DAG registry poisoned")
    }

    /// The handle for `epoch`, if one is registered.
    pub fn get(&self, epoch: u64) -> Option<Arc<Dag>> {
        self.lock().get(&epoch).cloned()
    }

    /// Return the registered handle for `epoch`, or run `build` and register
    /// its result. `build` executes without the registry lock held; if two
    /// callers race, both may build but all receive the same handle.
    pub fn get_or_insert_with<F>(&self, epoch: u64, build: F) -> Result<Arc<Dag>, Error>
    where
        F: FnOnce() -> Result<Dag, Error>,
    {
        if let Some(existing) = self.get(epoch) {
            return Ok(existing);
        }
        let built = Arc::new(build()?);
        Ok(self.insert(built))
    }

    /// Register a handle under its own epoch. Returns the established handle:
    /// the given one, or the earlier winner if the epoch was already present.
    pub fn insert(&self, dag: Arc<Dag>) -> Arc<Dag> {
        let mut dags = self.lock();
        Arc::clone(dags.entry(dag.epoch()).or_insert(dag))
    }

    /// Drop the handle for `epoch` from the registry. Outstanding `Arc`s
    /// stay valid; the memory is released once the last one goes away.
    pub fn remove(&self, epoch: u64) -> Option<Arc<Dag>> {
        self.lock().remove(&epoch)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for DagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Cache;
    use crate::params::HASH_BYTES;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn tiny_dag(epoch: u64) -> Dag {
        let cache = Cache::from_parts(epoch, vec![epoch as u8; HASH_BYTES]);
        Dag::from_parts(epoch, cache, vec![epoch as u8; 2 * HASH_BYTES])
    }

    #[test]
    fn builder_runs_once_for_sequential_callers() {
        let registry = DagRegistry::new();
        let builds = AtomicUsize::new(0);
        let first = registry
            .get_or_insert_with(3, || {
                builds.fetch_add(1, Ordering::SeqCst);
                Ok(tiny_dag(3))
            })
            .unwrap();
        let second = registry
            .get_or_insert_with(3, || {
                builds.fetch_add(1, Ordering::SeqCst);
                Ok(tiny_dag(3))
            })
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn concurrent_acquisition_yields_one_handle() {
        let registry = DagRegistry::new();
        let builds = AtomicUsize::new(0);
        let handles: Vec<Arc<Dag>> = thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        registry
                            .get_or_insert_with(7, || {
                                builds.fetch_add(1, Ordering::SeqCst);
                                Ok(tiny_dag(7))
                            })
                            .unwrap()
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });
        // Racing builds are allowed; distinct published handles are not.
        assert!(builds.load(Ordering::SeqCst) >= 1);
        assert_eq!(registry.len(), 1);
        for handle in &handles[1..] {
            assert!(Arc::ptr_eq(&handles[0], handle));
        }
    }

    #[test]
    fn losing_insert_returns_winner() {
        let registry = DagRegistry::new();
        let winner = registry.insert(Arc::new(tiny_dag(1)));
        let loser = Arc::new(tiny_dag(1));
        let resolved = registry.insert(Arc::clone(&loser));
        assert!(Arc::ptr_eq(&resolved, &winner));
        assert!(!Arc::ptr_eq(&resolved, &loser));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn build_errors_leave_nothing_registered() {
        let registry = DagRegistry::new();
        let err = registry
            .get_or_insert_with(2, || Err(Error::InvalidConfig("boom".into())))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(registry.is_empty());
        assert!(registry.get(2).is_none());
    }

    #[test]
    fn distinct_epochs_get_distinct_handles() {
        let registry = DagRegistry::new();
        let a = registry.get_or_insert_with(0, || Ok(tiny_dag(0))).unwrap();
        let b = registry.get_or_insert_with(1, || Ok(tiny_dag(1))).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn remove_and_clear_evict_handles() {
        let registry = DagRegistry::new();
        let handle = registry.get_or_insert_with(4, || Ok(tiny_dag(4))).unwrap();
        let removed = registry.remove(4).unwrap();
        assert!(Arc::ptr_eq(&handle, &removed));
        assert!(registry.get(4).is_none());

        registry.insert(Arc::new(tiny_dag(5)));
        registry.insert(Arc::new(tiny_dag(6)));
        registry.clear();
        assert!(registry.is_empty());
        // The evicted handle is still readable by existing holders.
        assert_eq!(handle.epoch(), 4);
    }
}
