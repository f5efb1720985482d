//! Epoch mapping and the cache/DAG size schedules.
//!
//! Both schedules grow linearly per epoch and are then rounded down until the
//! item count is prime, which keeps the hashimoto probe pattern free of short
//! cycles.

use crate::params::{
    CACHE_BYTES_GROWTH, CACHE_BYTES_INIT, DATASET_BYTES_GROWTH, DATASET_BYTES_INIT, EPOCH_LENGTH,
    HASH_BYTES, MIX_BYTES,
};

/// Epochs beyond this bound are rejected by the file loader; the schedules
/// stay far below u64 overflow inside it.
pub(crate) const MAX_SUPPORTED_EPOCH: u64 = 1 << 26;

/// The epoch a block number belongs to.
pub fn epoch_number(block_number: u64) -> u64 {
    block_number / EPOCH_LENGTH
}

// Trial division is adequate here: item counts stay in the low billions over
// any realistic horizon.
fn is_prime(x: u64) -> bool {
    if x < 2 {
        return false;
    }
    if x % 2 == 0 {
        return x == 2;
    }
    let mut i = 3;
    while i * i <= x {
        if x % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

/// Cache size in bytes for a given epoch.
pub fn cache_size_for_epoch(epoch: u64) -> u64 {
    let mut size = CACHE_BYTES_INIT + CACHE_BYTES_GROWTH * epoch - HASH_BYTES as u64;
    while !is_prime(size / HASH_BYTES as u64) {
        size -= 2 * HASH_BYTES as u64;
    }
    size
}

/// Cache size in bytes for the epoch containing `block_number`.
pub fn cache_size(block_number: u64) -> u64 {
    cache_size_for_epoch(epoch_number(block_number))
}

/// Full DAG size in bytes for a given epoch.
pub fn dag_size_for_epoch(epoch: u64) -> u64 {
    let mut size = DATASET_BYTES_INIT + DATASET_BYTES_GROWTH * epoch - MIX_BYTES as u64;
    while !is_prime(size / MIX_BYTES as u64) {
        size -= 2 * MIX_BYTES as u64;
    }
    size
}

/// Full DAG size in bytes for the epoch containing `block_number`.
pub fn dag_size(block_number: u64) -> u64 {
    dag_size_for_epoch(epoch_number(block_number))
}

/// Sizes both sections of a DAG file, refusing epochs outside the supported
/// horizon. Used when the epoch comes from untrusted file headers.
pub(crate) fn file_section_sizes(epoch: u64) -> Option<(u64, u64)> {
    if epoch > MAX_SUPPORTED_EPOCH {
        return None;
    }
    Some((cache_size_for_epoch(epoch), dag_size_for_epoch(epoch)))
}
