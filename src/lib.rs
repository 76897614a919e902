// Cuckoo Table
// A fixed-capacity approximate key/value store built on cuckoo hashing.
// Keys are never stored: each entry is a short fingerprint plus an f64 value,
// living in one of two candidate buckets computed from the key.

//! Approximate key/value table with fingerprint storage and bounded cuckoo relocation.
//!
//! # Example
//!
//! ```
//! use cuckoo_table::CuckooTable;
//!
//! let mut table = CuckooTable::new(1024);
//! table.insert("alice", 1.5).unwrap();
//! assert!(table.contains("alice"));
//! assert_eq!(table.get("alice"), Some(1.5));
//! assert!(table.remove("alice"));
//! assert!(!table.contains("alice"));
//! ```

mod bucket;
mod fingerprint;
mod hash;

use derive_builder::Builder;
use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::bucket::Bucket;
use crate::hash::{hash_code, index_mix, table_size_for};

pub use crate::fingerprint::{Fingerprint, MAX_FINGERPRINT_LEN};
pub use crate::hash::MAX_CAPACITY;

/// Number of buckets used when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 1 << 16;

/// Slots per bucket used when no bucket size is configured.
pub const DEFAULT_BUCKET_SIZE: usize = 4;

/// Fingerprint length, in bytes, used when none is configured.
pub const DEFAULT_FINGERPRINT_LEN: usize = 1;

/// Relocation budget used when none is configured.
pub const DEFAULT_MAX_KICKS: usize = 500;

/// Value callers may substitute for a missed lookup: `table.get(key).unwrap_or(NOT_FOUND)`.
pub const NOT_FOUND: f64 = 0.0;

/// Error type for Cuckoo Table insert operations
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// Returned when neither candidate bucket could be freed within the kick budget
    #[error("Not enough space to store this item.")]
    NotEnoughSpace,
}

/// An approximate associative store mapping keys to `f64` values.
///
/// ## How It Works
///
/// 1. **Fingerprints**: a key is reduced to a short fingerprint (1 byte by
///    default). Only the fingerprint and the value are stored.
///
/// 2. **Two candidate buckets**: the primary bucket comes from the key's hash,
///    the secondary one is `primary ^ hash(fingerprint)`. Because the second
///    term depends only on the fingerprint, an entry can always be moved to its
///    other bucket without knowing its key.
///
/// 3. **Kicks**: when both candidates are full, a random resident of one of
///    them is displaced to make room and sent to its own alternate bucket,
///    possibly displacing another entry, up to `max_kicks` times.
///
/// ## Approximation
///
/// Distinct keys can share a fingerprint and a bucket. When that happens
/// `contains` reports a key that was never inserted and `get` may return the
/// value of the colliding key. Longer fingerprints make this rarer.
///
/// ## Occupancy
///
/// `len()` is the number of occupied slots. It grows on every successful
/// insert and shrinks on every successful remove.
///
/// ## Time Complexity
///
/// - **Lookup**: O(1), at most two buckets are scanned
/// - **Deletion**: O(1)
/// - **Insertion**: expected O(1), at most `max_kicks` relocations
#[derive(Builder)]
#[builder(
    pattern = "owned",
    build_fn(private, name = "base_build", validate = "Self::validate")
)]
pub struct CuckooTable<H = DefaultHasher, R = StdRng>
where
    H: Hasher + Default,
    R: Rng + SeedableRng,
{
    /// Number of buckets; rounded up to a power of two at build time
    #[builder(default = "DEFAULT_CAPACITY")]
    capacity: usize,

    /// Fingerprint length in bytes (1 to 8)
    #[builder(default = "DEFAULT_FINGERPRINT_LEN")]
    fingerprint_len: usize,

    /// Number of slots per bucket
    #[builder(default = "DEFAULT_BUCKET_SIZE")]
    bucket_size: usize,

    /// Maximum number of relocations tried before an insert gives up
    #[builder(default = "DEFAULT_MAX_KICKS")]
    max_kicks: usize,

    /// Source of the random choices made while relocating entries
    #[builder(default = "R::from_os_rng()")]
    rng: R,

    #[builder(setter(skip))]
    buckets: Vec<Bucket>,

    /// Number of occupied slots
    #[builder(setter(skip))]
    len: usize,

    #[builder(setter(skip))]
    _hasher: PhantomData<H>,
}

impl<H, R> CuckooTable<H, R>
where
    H: Hasher + Default,
    R: Rng + SeedableRng,
{
    /// Insert a key with its value.
    ///
    /// The entry goes into the first free slot of the primary bucket, then of
    /// the secondary bucket. If both are full, existing entries are relocated
    /// to make room.
    ///
    /// Inserting the same key twice stores two entries. Use
    /// [`insert_unique`](Self::insert_unique) to avoid that.
    ///
    /// Returns `Err(Error::NotEnoughSpace)` when relocation runs out of kicks.
    /// The table is left exactly as it was before the call.
    pub fn insert<T: ?Sized + Hash>(&mut self, key: &T, value: f64) -> Result<(), Error> {
        let (index, fingerprint) = self.index_and_fingerprint(key);
        let alt_index = self.alt_index(index, fingerprint);
        if self.buckets[index].add(fingerprint, value)
            || self.buckets[alt_index].add(fingerprint, value)
        {
            self.len += 1;
            return Ok(());
        }
        self.insert_with_kicks(index, alt_index, fingerprint, value)
    }

    /// Insert a key unless the table already reports it as present.
    ///
    /// Returns `Ok(true)` if the entry was inserted and `Ok(false)` if a
    /// matching fingerprint was already present in a candidate bucket (the key
    /// itself or a collision), in which case nothing changes.
    pub fn insert_unique<T: ?Sized + Hash>(&mut self, key: &T, value: f64) -> Result<bool, Error> {
        if self.contains(key) {
            return Ok(false);
        }
        self.insert(key, value).map(|_| true)
    }

    /// Look up the value stored for a key.
    ///
    /// Returns `None` if neither candidate bucket holds the key's fingerprint.
    /// If both do, the larger of the two values is returned.
    pub fn get<T: ?Sized + Hash>(&self, key: &T) -> Option<f64> {
        let (index, fingerprint) = self.index_and_fingerprint(key);
        let alt_index = self.alt_index(index, fingerprint);
        match (
            self.buckets[index].get(fingerprint),
            self.buckets[alt_index].get(fingerprint),
        ) {
            (Some(primary), Some(secondary)) => Some(primary.max(secondary)),
            (primary, secondary) => primary.or(secondary),
        }
    }

    /// Check if a key is in the table
    ///
    /// Returns `true` if the key is possibly in the table (may have false positives),
    /// `false` if it is definitely not in the table
    pub fn contains<T: ?Sized + Hash>(&self, key: &T) -> bool {
        let (index, fingerprint) = self.index_and_fingerprint(key);
        self.buckets[index].contains(fingerprint)
            || self.buckets[self.alt_index(index, fingerprint)].contains(fingerprint)
    }

    /// Remove one entry for a key, trying the primary bucket first.
    ///
    /// Returns `true` if an entry was removed.
    ///
    /// Only remove keys that were inserted: removing an absent key whose
    /// fingerprint collides with a stored one removes that other entry.
    pub fn remove<T: ?Sized + Hash>(&mut self, key: &T) -> bool {
        let (index, fingerprint) = self.index_and_fingerprint(key);
        let alt_index = self.alt_index(index, fingerprint);
        let removed =
            self.buckets[index].delete(fingerprint) || self.buckets[alt_index].delete(fingerprint);
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Count the entries matching a key's fingerprint in its candidate buckets.
    ///
    /// Counts duplicates from repeated inserts as well as collisions.
    pub fn count<T: ?Sized + Hash>(&self, key: &T) -> usize {
        let (index, fingerprint) = self.index_and_fingerprint(key);
        let alt_index = self.alt_index(index, fingerprint);
        let primary = self.buckets[index].count(fingerprint);
        if alt_index == index {
            primary
        } else {
            primary + self.buckets[alt_index].count(fingerprint)
        }
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        let removed: usize = self.buckets.iter_mut().map(Bucket::clear).sum();
        self.len -= removed;
    }

    /// Get the number of occupied slots
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets (always a power of two)
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn bucket_size(&self) -> usize {
        self.bucket_size
    }

    pub fn fingerprint_len(&self) -> usize {
        self.fingerprint_len
    }

    pub fn max_kicks(&self) -> usize {
        self.max_kicks
    }

    /// Total number of slots, `capacity() * bucket_size()`.
    pub fn slot_count(&self) -> usize {
        self.capacity * self.bucket_size
    }

    /// Fraction of slots currently occupied.
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.slot_count() as f64
    }

    /// The fingerprint this table derives for a key.
    pub fn fingerprint<T: ?Sized + Hash>(&self, key: &T) -> Fingerprint {
        self.index_and_fingerprint(key).1
    }

    /// The primary and secondary bucket indices of a key.
    ///
    /// Both are equal when the fingerprint hashes to zero under the index mask.
    pub fn candidate_buckets<T: ?Sized + Hash>(&self, key: &T) -> (usize, usize) {
        let (index, fingerprint) = self.index_and_fingerprint(key);
        (index, self.alt_index(index, fingerprint))
    }

    /// Map a folded hash code to a bucket index.
    fn bucket_index(&self, code: i32) -> usize {
        index_mix(code) as u32 as usize & (self.capacity - 1)
    }

    /// Compute the primary bucket index and the fingerprint of a key.
    ///
    /// Both come from the same hash code, pushed through two different
    /// avalanche mixes so that the index bits and the fingerprint bytes are
    /// not correlated.
    fn index_and_fingerprint<T: ?Sized + Hash>(&self, key: &T) -> (usize, Fingerprint) {
        let code = hash_code::<H, _>(key);
        let fingerprint = Fingerprint::derive(code, self.fingerprint_len);
        (self.bucket_index(code), fingerprint)
    }

    /// Computes the alternate bucket of a fingerprint currently at `index`.
    ///
    /// `alt_index(alt_index(i, f), f) == i` for every index and fingerprint,
    /// so an entry bounces between exactly two buckets no matter how often it
    /// is relocated.
    fn alt_index(&self, index: usize, fingerprint: Fingerprint) -> usize {
        index ^ self.bucket_index(hash_code::<H, _>(&fingerprint))
    }

    /// Insert an entry by displacing residents when both candidate buckets are full.
    ///
    /// # Kick Algorithm
    ///
    /// 1. **Pick** one of the two candidate buckets at random
    /// 2. **Swap** the incoming entry into a random slot of that bucket
    /// 3. **Move** the displaced entry towards its alternate bucket
    /// 4. **Succeed** if that bucket has a free slot, otherwise the displaced
    ///    entry becomes the incoming one and the walk repeats from there
    /// 5. **Fail** after `max_kicks` swaps
    ///
    /// Every swap is recorded. On failure the swaps are replayed in reverse,
    /// which puts each displaced entry back into its original slot and hands
    /// the caller's entry back out, leaving the table untouched.
    fn insert_with_kicks(
        &mut self,
        index: usize,
        alt_index: usize,
        mut fingerprint: Fingerprint,
        mut value: f64,
    ) -> Result<(), Error> {
        let incoming = fingerprint;
        let mut index = if self.rng.random_bool(0.5) {
            index
        } else {
            alt_index
        };
        let mut kicks = Vec::with_capacity(self.max_kicks.min(32));
        while kicks.len() < self.max_kicks {
            let position = self.rng.random_range(0..self.bucket_size);
            let (evicted, evicted_value) = self.buckets[index].swap(position, fingerprint, value);
            kicks.push((index, position));
            index = self.alt_index(index, evicted);
            if self.buckets[index].add(evicted, evicted_value) {
                self.len += 1;
                trace!("placed entry after {} kicks", kicks.len());
                return Ok(());
            }
            fingerprint = evicted;
            value = evicted_value;
        }
        // Reached the maximum number of kicks, undo them in reverse order
        while let Some((index, position)) = kicks.pop() {
            (fingerprint, value) = self.buckets[index].swap(position, fingerprint, value);
        }
        debug_assert!(fingerprint == incoming, "undo did not return the incoming entry ({value})");
        debug!(
            "insert failed after {} kicks at load factor {:.4}",
            self.max_kicks,
            self.load_factor()
        );
        Err(Error::NotEnoughSpace)
    }
}

impl CuckooTable<DefaultHasher, StdRng> {
    /// Create a new CuckooTableBuilder with default settings
    pub fn builder() -> CuckooTableBuilder<DefaultHasher, StdRng> {
        CuckooTableBuilder::default()
    }

    /// Create a table with `capacity` buckets (rounded up to a power of two)
    pub fn new(capacity: usize) -> Self {
        Self::builder()
            .capacity(capacity)
            .build()
            .expect("default table configuration is valid")
    }

    /// Create a table whose relocation choices are reproducible
    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::builder()
            .capacity(capacity)
            .seed(seed)
            .build()
            .expect("default table configuration is valid")
    }
}

impl Default for CuckooTable<DefaultHasher, StdRng> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<H, R> fmt::Debug for CuckooTable<H, R>
where
    H: Hasher + Default,
    R: Rng + SeedableRng,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CuckooTable")
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .field("bucket_size", &self.bucket_size)
            .field("fingerprint_len", &self.fingerprint_len)
            .field("max_kicks", &self.max_kicks)
            .finish_non_exhaustive()
    }
}

impl<H, R> CuckooTableBuilder<H, R>
where
    H: Hasher + Default,
    R: Rng + SeedableRng,
{
    /// Validate the builder configuration
    fn validate(&self) -> Result<(), String> {
        if let Some(fingerprint_len) = self.fingerprint_len
            && !(1..=MAX_FINGERPRINT_LEN).contains(&fingerprint_len)
        {
            return Err(format!(
                "fingerprint_len must be between 1 and {MAX_FINGERPRINT_LEN}"
            ));
        }
        if self.bucket_size == Some(0) {
            return Err("bucket_size must be greater than zero".into());
        }
        Ok(())
    }

    /// Seed the relocation rng, making every insert reproducible
    pub fn seed(self, seed: u64) -> Self {
        self.rng(R::seed_from_u64(seed))
    }

    /// Build a CuckooTable with the specified configuration
    pub fn build(self) -> Result<CuckooTable<H, R>, CuckooTableBuilderError> {
        let mut table = self.base_build()?;
        // Round the number of buckets up to a power of two so indices can be masked
        table.capacity = table_size_for(table.capacity);
        table.buckets = (0..table.capacity)
            .map(|_| Bucket::new(table.bucket_size, table.fingerprint_len))
            .collect();
        info!(
            "created cuckoo table: {} buckets x {} slots, {}-byte fingerprints, {} max kicks",
            table.capacity, table.bucket_size, table.fingerprint_len, table.max_kicks
        );
        Ok(table)
    }
}
