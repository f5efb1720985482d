//! Hash primitives and the little-endian word codec.
//!
//! Every byte that enters or leaves a hash function travels through this
//! module: Keccak-256/512 wrappers, the canonical view of a 64-byte item as
//! 16 little-endian u32 words, and the FNV combinator in scalar and
//! element-wise forms.

use byteorder::{ByteOrder, LittleEndian};
use sha3::{Digest, Keccak256, Keccak512};

use crate::params::{FNV_PRIME, HASH_WORDS, MIX_WORDS, WORD_BYTES};

pub(crate) fn keccak_256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::default();
    hasher.update(input);
    hasher.finalize().into()
}

pub(crate) fn keccak_512(input: &[u8]) -> [u8; 64] {
    let mut hasher = Keccak512::default();
    hasher.update(input);
    hasher.finalize().into()
}

/// Hash `input` directly into a 64-byte slice of a larger buffer.
pub(crate) fn keccak_512_into(input: &[u8], out: &mut [u8]) {
    debug_assert_eq!(out.len(), 64);
    let mut hasher = Keccak512::default();
    hasher.update(input);
    out.copy_from_slice(&hasher.finalize());
}

/// Read word `index` of a little-endian word view.
#[inline]
pub(crate) fn le_word(bytes: &[u8], index: usize) -> u32 {
    LittleEndian::read_u32(&bytes[index * WORD_BYTES..])
}

/// Write word `index` of a little-endian word view.
#[inline]
pub(crate) fn set_le_word(bytes: &mut [u8], index: usize, value: u32) {
    LittleEndian::write_u32(&mut bytes[index * WORD_BYTES..], value);
}

/// `(a * FNV_PRIME) ^ b`, all arithmetic mod 2^32.
#[inline]
pub(crate) fn fnv(a: u32, b: u32) -> u32 {
    a.wrapping_mul(FNV_PRIME) ^ b
}

/// Element-wise FNV combine of a 64-byte item into `a`.
pub(crate) fn fnv64(a: &mut [u8; 64], b: &[u8]) {
    debug_assert_eq!(b.len(), 64);
    for i in 0..HASH_WORDS {
        let v = fnv(le_word(a, i), le_word(b, i));
        set_le_word(a, i, v);
    }
}

/// Element-wise FNV combine of a 128-byte page into `a`.
pub(crate) fn fnv128(a: &mut [u8; 128], b: &[u8; 128]) {
    for i in 0..MIX_WORDS {
        let v = fnv(le_word(a, i), le_word(b, i));
        set_le_word(a, i, v);
    }
}
