//! The per-epoch cache: a prime count of 64-byte items from which every DAG
//! item can be recomputed on demand.

use crate::error::Error;
use crate::observer::{Observer, Phase};
use crate::params::{CACHE_ROUNDS, DATASET_PARENTS, HASH_BYTES, HASH_WORDS};
use crate::primitives::{fnv, fnv64, keccak_512, keccak_512_into, le_word, set_le_word};
use crate::sizes::{cache_size_for_epoch, epoch_number};

/// An epoch-bound cache. Immutable once built; items are 64-byte views into
/// one contiguous backing buffer.
#[derive(Debug)]
pub struct Cache {
    epoch: u64,
    data: Vec<u8>,
}

impl Cache {
    /// Build the cache for the epoch containing `block_number` from the given
    /// seed. Reports [`Phase::CacheSeeding`] and [`Phase::CacheGeneration`]
    /// progress and honors cancellation.
    pub fn build(
        block_number: u64,
        seed: &[u8; 32],
        observer: &dyn Observer,
    ) -> Result<Self, Error> {
        let epoch = epoch_number(block_number);
        let mut data = vec![0u8; cache_size_for_epoch(epoch) as usize];
        build_into(&mut data, seed, observer)?;
        Ok(Self { epoch, data })
    }

    pub(crate) fn from_parts(epoch: u64, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len() % HASH_BYTES, 0);
        Self { epoch, data }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Size of the cache data in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Number of 64-byte items.
    pub fn item_count(&self) -> usize {
        self.data.len() / HASH_BYTES
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The 64-byte item at `index`.
    pub fn item(&self, index: usize) -> &[u8] {
        &self.data[index * HASH_BYTES..(index + 1) * HASH_BYTES]
    }

    /// Derive DAG item `index` from this cache (light mode).
    pub fn dataset_item(&self, index: u64) -> [u8; 64] {
        let mut out = [0u8; 64];
        dataset_item_into(&self.data, index, &mut out);
        out
    }
}

/// Two-phase cache construction over a preallocated buffer.
pub(crate) fn build_into(
    cache: &mut [u8],
    seed: &[u8; 32],
    observer: &dyn Observer,
) -> Result<(), Error> {
    debug_assert_eq!(cache.len() % HASH_BYTES, 0);
    let n = cache.len() / HASH_BYTES;

    // Phase A: a hash chain off the seed fills the cache.
    keccak_512_into(seed, &mut cache[..HASH_BYTES]);
    for i in 1..n {
        let (done, rest) = cache.split_at_mut(i * HASH_BYTES);
        keccak_512_into(&done[done.len() - HASH_BYTES..], &mut rest[..HASH_BYTES]);
        if !observer.report(i as u64, n as u64, Phase::CacheSeeding) {
            return Err(Error::Cancelled(Phase::CacheSeeding));
        }
    }

    // Phase B: memory-hard strengthening. Each item is replaced by the hash
    // of (its left neighbor XOR a pseudo-randomly chosen item).
    let total = (n * CACHE_ROUNDS) as u64;
    let mut step = 0u64;
    for _ in 0..CACHE_ROUNDS {
        for j in 0..n {
            let v = le_word(&cache[j * HASH_BYTES..], 0) as usize % n;
            let left = ((j + n - 1) % n) * HASH_BYTES;
            let chosen = v * HASH_BYTES;
            let mut mixed = [0u8; HASH_BYTES];
            for k in 0..HASH_BYTES {
                mixed[k] = cache[left + k] ^ cache[chosen + k];
            }
            keccak_512_into(&mixed, &mut cache[j * HASH_BYTES..(j + 1) * HASH_BYTES]);
            step += 1;
            if !observer.report(step, total, Phase::CacheGeneration) {
                return Err(Error::Cancelled(Phase::CacheGeneration));
            }
        }
    }
    Ok(())
}

/// Derive DAG item `index` into `out` from raw cache bytes.
pub(crate) fn dataset_item_into(cache: &[u8], index: u64, out: &mut [u8]) {
    let n = cache.len() / HASH_BYTES;
    let mut mix = [0u8; 64];
    mix.copy_from_slice(&cache[(index as usize % n) * HASH_BYTES..][..HASH_BYTES]);
    let word0 = le_word(&mix, 0) ^ index as u32;
    set_le_word(&mut mix, 0, word0);
    mix = keccak_512(&mix);
    for j in 0..DATASET_PARENTS {
        let parent = fnv((index ^ j as u64) as u32, le_word(&mix, j % HASH_WORDS)) as usize % n;
        fnv64(&mut mix, &cache[parent * HASH_BYTES..][..HASH_BYTES]);
    }
    out.copy_from_slice(&keccak_512(&mix));
}
