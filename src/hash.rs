//! Integer mixing used for bucket addressing and fingerprint derivation.
//!
//! Both mixes operate on a 32-bit signed hash code with wrapping arithmetic and
//! arithmetic right shifts, so the same code always yields the same bucket and
//! the same fingerprint regardless of platform.

use std::hash::{Hash, Hasher};

/// Largest number of buckets a table may have.
pub const MAX_CAPACITY: usize = 1 << 30;

/// Byte reserved for empty slots; never produced by [`fingerprint_bytes`].
pub(crate) const EMPTY_BYTE: u8 = 0;

/// Replacement for a derived fingerprint byte that would equal [`EMPTY_BYTE`].
pub(crate) const EMPTY_SUBSTITUTE: u8 = 40;

/// Round a requested capacity up to a power of two within `1..=MAX_CAPACITY`.
pub(crate) fn table_size_for(capacity: usize) -> usize {
    capacity.clamp(1, MAX_CAPACITY).next_power_of_two()
}

/// Hash an item with a fresh `H` and fold the 64-bit result into a 32-bit code.
pub(crate) fn hash_code<H, T>(item: &T) -> i32
where
    H: Hasher + Default,
    T: ?Sized + Hash,
{
    let mut hasher = H::default();
    item.hash(&mut hasher);
    let hash = hasher.finish();
    (hash ^ (hash >> 32)) as i32
}

/// Avalanche mix used for bucket indices.
pub(crate) fn index_mix(mut h: i32) -> i32 {
    h = h.wrapping_sub(h << 6);
    h ^= h >> 17;
    h = h.wrapping_sub(h << 9);
    h ^= h << 4;
    h = h.wrapping_sub(h << 3);
    h ^= h << 10;
    h ^= h >> 15;
    h
}

/// Fill `out` with fingerprint bytes derived from `code`.
///
/// Each byte advances the mixing state once more, so longer fingerprints extend
/// shorter ones: the first byte of a 4-byte fingerprint equals the 1-byte
/// fingerprint of the same key.
pub(crate) fn fingerprint_bytes(mut h: i32, out: &mut [u8]) {
    for byte in out.iter_mut() {
        h = h.wrapping_add(!(h << 15));
        h ^= h >> 10;
        h = h.wrapping_add(h << 3);
        h ^= h >> 6;
        h = h.wrapping_add(!(h << 11));
        h ^= h >> 16;
        *byte = match h as u8 {
            EMPTY_BYTE => EMPTY_SUBSTITUTE,
            b => b,
        };
    }
}
