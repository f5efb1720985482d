//! Full DAG materialization and the generator configuration.
//!
//! A [`Dag`] owns the cache it was derived from plus every dataset item in
//! one contiguous buffer (roughly 1 GiB at epoch 0). Handles are immutable
//! and shared through the epoch registry; [`make_dag`] is the usual entry
//! point.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;

use derive_builder::Builder;

use crate::cache::{dataset_item_into, Cache};
use crate::error::Error;
use crate::hashimoto::{hashimoto_full, PowOutput};
use crate::observer::{NoopObserver, Observer, Phase, DEFAULT_CALLBACK_FREQUENCY};
use crate::params::HASH_BYTES;
use crate::registry::DagRegistry;
use crate::seed::seed_hash;
use crate::sizes::{dag_size, epoch_number};
use crate::work::ProgressMeter;

/// A fully materialized, epoch-bound DAG together with its cache.
#[derive(Debug)]
pub struct Dag {
    epoch: u64,
    cache: Cache,
    data: Vec<u8>,
}

impl Dag {
    pub(crate) fn from_parts(epoch: u64, cache: Cache, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len() % HASH_BYTES, 0);
        Self { epoch, cache, data }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Size of the DAG data in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Number of 64-byte items.
    pub fn item_count(&self) -> usize {
        self.data.len() / HASH_BYTES
    }

    /// The cache this DAG was derived from.
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The 64-byte item at `index`.
    pub fn item(&self, index: usize) -> &[u8] {
        &self.data[index * HASH_BYTES..(index + 1) * HASH_BYTES]
    }

    /// Full-mode hashimoto against this handle at its own size.
    pub fn compute(&self, header: [u8; 32], nonce: u64) -> PowOutput {
        hashimoto_full(self.size(), self, header, nonce)
    }
}

fn default_threads() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Configuration for full DAG construction.
///
/// ```
/// use egihash::DagGeneratorBuilder;
///
/// let generator = DagGeneratorBuilder::default()
///     .threads(4)
///     .build_validated()
///     .unwrap();
/// assert_eq!(generator.threads, 4);
/// ```
#[derive(Builder)]
#[builder(pattern = "owned")]
pub struct DagGenerator {
    /// Worker threads for item derivation; defaults to the host parallelism.
    #[builder(default = "default_threads()")]
    pub threads: usize,
    /// Observer notification interval, in items.
    #[builder(default = "DEFAULT_CALLBACK_FREQUENCY")]
    pub callback_frequency: u64,
    #[builder(default = "Arc::new(NoopObserver)")]
    pub observer: Arc<dyn Observer>,
}

impl std::fmt::Debug for DagGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DagGenerator")
            .field("threads", &self.threads)
            .field("callback_frequency", &self.callback_frequency)
            .finish_non_exhaustive()
    }
}

impl DagGeneratorBuilder {
    fn validate(&self) -> Result<(), Error> {
        if self.threads == Some(0) {
            return Err(Error::InvalidConfig("threads must be >= 1".into()));
        }
        if self.callback_frequency == Some(0) {
            return Err(Error::InvalidConfig(
                "callback frequency must be >= 1".into(),
            ));
        }
        Ok(())
    }

    pub fn build_validated(self) -> Result<DagGenerator, Error> {
        self.validate()?;
        self.build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

impl DagGenerator {
    /// Acquire the DAG for the epoch containing `block_number` through the
    /// process-wide registry, generating it with this configuration when no
    /// handle exists yet.
    pub fn make_dag(&self, block_number: u64) -> Result<Arc<Dag>, Error> {
        DagRegistry::global().get_or_insert_with(epoch_number(block_number), || {
            generate_dag(
                block_number,
                self.threads,
                self.callback_frequency,
                self.observer.as_ref(),
            )
        })
    }
}

/// Acquire the DAG for the epoch containing `block_number` through the
/// process-wide registry, generating it with default settings when no handle
/// exists yet.
pub fn make_dag(block_number: u64, observer: &dyn Observer) -> Result<Arc<Dag>, Error> {
    DagRegistry::global().get_or_insert_with(epoch_number(block_number), || {
        generate_dag(
            block_number,
            default_threads(),
            DEFAULT_CALLBACK_FREQUENCY,
            observer,
        )
    })
}

/// Build cache and DAG for a block number, outside any registry.
pub(crate) fn generate_dag(
    block_number: u64,
    threads: usize,
    frequency: u64,
    observer: &dyn Observer,
) -> Result<Dag, Error> {
    let seed = seed_hash(block_number);
    let cache = Cache::build(block_number, &seed, observer)?;
    let mut data = vec![0u8; dag_size(block_number) as usize];
    generate_into(&mut data, &cache, threads, frequency, observer)?;
    Ok(Dag::from_parts(cache.epoch(), cache, data))
}

/// Derive every item of `out` from the cache, splitting the buffer into
/// disjoint chunks across worker threads. The buffer is discarded by the
/// caller on cancellation.
pub(crate) fn generate_into(
    out: &mut [u8],
    cache: &Cache,
    threads: usize,
    frequency: u64,
    observer: &dyn Observer,
) -> Result<(), Error> {
    debug_assert_eq!(out.len() % HASH_BYTES, 0);
    let total_items = out.len() / HASH_BYTES;
    if total_items == 0 {
        return Ok(());
    }
    let workers = threads.max(1).min(total_items);
    let chunk_items = total_items.div_ceil(workers);
    let frequency = frequency.max(1);
    let cache_bytes = cache.as_bytes();
    let meter = ProgressMeter::new();

    thread::scope(|scope| {
        for (worker, chunk) in out.chunks_mut(chunk_items * HASH_BYTES).enumerate() {
            let meter = &meter;
            scope.spawn(move || {
                let base = worker * chunk_items;
                for (offset, item) in chunk.chunks_exact_mut(HASH_BYTES).enumerate() {
                    if meter.should_stop() {
                        return;
                    }
                    dataset_item_into(cache_bytes, (base + offset) as u64, item);
                    let done = meter.record();
                    if done % frequency == 0
                        && !observer.report(done, total_items as u64, Phase::DagGeneration)
                    {
                        meter.force_stop();
                        return;
                    }
                }
            });
        }
    });

    if meter.should_stop() {
        return Err(Error::Cancelled(Phase::DagGeneration));
    }
    Ok(())
}
