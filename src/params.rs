//! Algorithm parameters shared by every stage of the engine.

/// Bytes in a word.
pub const WORD_BYTES: usize = 4;
/// Length of a cache/DAG item in bytes.
pub const HASH_BYTES: usize = 64;
/// Width of the hashimoto mix in bytes.
pub const MIX_BYTES: usize = 128;
/// Words per 64-byte item.
pub const HASH_WORDS: usize = HASH_BYTES / WORD_BYTES;
/// Words per 128-byte mix.
pub const MIX_WORDS: usize = MIX_BYTES / WORD_BYTES;
/// Items per 128-byte mix page.
pub const MIX_HASHES: usize = MIX_BYTES / HASH_BYTES;
/// Number of parents of each DAG item.
pub const DATASET_PARENTS: usize = 256;
/// Number of rounds in cache production.
pub const CACHE_ROUNDS: usize = 3;
/// Number of accesses in the hashimoto loop.
pub const ACCESSES: usize = 64;

/// Blocks per epoch.
pub const EPOCH_LENGTH: u64 = 30_000;
/// Bytes in the cache at genesis. 2 to the power of 24.
pub const CACHE_BYTES_INIT: u64 = 1 << 24;
/// Cache growth per epoch. 2 to the power of 17.
pub const CACHE_BYTES_GROWTH: u64 = 1 << 17;
/// Bytes in the dataset at genesis. 2 to the power of 30.
pub const DATASET_BYTES_INIT: u64 = 1 << 30;
/// Dataset growth per epoch. 2 to the power of 23.
pub const DATASET_BYTES_GROWTH: u64 = 1 << 23;

/// Prime used by the FNV combinator; arithmetic is mod 2^32.
pub const FNV_PRIME: u32 = 0x0100_0193;
