//! Ethash-family memory-hard proof-of-work engine.
//!
//! For every epoch of [`EPOCH_LENGTH`](params::EPOCH_LENGTH) blocks the
//! engine derives a seed hash, builds a multi-megabyte cache from it, and
//! (optionally) materializes a multi-gigabyte dataset ("DAG") from the
//! cache. The hashimoto loop then probes that dataset pseudo-randomly to
//! reduce a header and nonce to a 256-bit result digest plus a 256-bit mix
//! digest; the memory traffic is what makes the function ASIC-resistant.
//!
//! Two evaluation modes share one code path: *light* mode recomputes each
//! probed item from the cache (cheap memory, slow per hash) and *full* mode
//! indexes a materialized DAG (the miner's trade). DAG handles are immutable,
//! shared through an epoch-keyed process-wide registry, and can be saved to
//! and loaded from a compact on-disk format.
//!
//! ```no_run
//! use egihash::{make_dag, NoopObserver};
//!
//! let dag = make_dag(0, &NoopObserver)?;
//! let out = dag.compute([0u8; 32], 0x1234_5678);
//! println!("result {} mix {}", out.value_hex(), out.mix_hex());
//! # Ok::<(), egihash::Error>(())
//! ```
//!
//! Long-running operations report progress through an [`Observer`], which can
//! also cancel them; see [`Phase`] for the reported stages.

mod cache;
mod dag;
mod error;
mod file;
mod hashimoto;
mod observer;
pub mod params;
mod primitives;
mod registry;
mod seed;
mod sizes;
mod work;

pub use cache::Cache;
pub use dag::{make_dag, Dag, DagGenerator, DagGeneratorBuilder};
pub use error::{CorruptDagError, Error};
pub use file::{load_dag, save_dag};
pub use hashimoto::{hashimoto, hashimoto_full, hashimoto_light, PowOutput};
pub use observer::{NoopObserver, Observer, Phase, DEFAULT_CALLBACK_FREQUENCY};
pub use registry::DagRegistry;
pub use seed::{seed_for_epoch, seed_hash, EPOCH0_SEED};
pub use sizes::{
    cache_size, cache_size_for_epoch, dag_size, dag_size_for_epoch, epoch_number,
};

/// Build the cache for the epoch containing `block_number` from `seed`.
///
/// Equivalent to [`Cache::build`]; the seed is normally
/// [`seed_hash`]`(block_number)`.
pub fn make_cache(
    block_number: u64,
    seed: &[u8; 32],
    observer: &dyn Observer,
) -> Result<Cache, Error> {
    Cache::build(block_number, seed, observer)
}
