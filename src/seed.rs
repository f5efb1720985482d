//! Seed-hash evolution across epochs.

use crate::primitives::keccak_256;
use crate::sizes::epoch_number;

/// Seed hash for the genesis epoch. Every later epoch's seed is derived from
/// this value by repeated hashing.
pub const EPOCH0_SEED: [u8; 32] = [0u8; 32];

/// Seed hash for a given epoch: `epoch` applications of Keccak-256 to the
/// genesis seed.
pub fn seed_for_epoch(epoch: u64) -> [u8; 32] {
    let mut seed = EPOCH0_SEED;
    for _ in 0..epoch {
        seed = keccak_256(&seed);
    }
    seed
}

/// Seed hash for the epoch containing `block_number`.
pub fn seed_hash(block_number: u64) -> [u8; 32] {
    seed_for_epoch(epoch_number(block_number))
}
