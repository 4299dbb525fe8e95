//! Open-addressing hash map with double hashing.
//!
//! All entries live directly in three parallel arrays (keys, values, slot
//! state). Collisions are resolved by probing with a second, key-derived step
//! size, so clusters do not form the way they do under linear probing.
//!
//! Deleted entries leave a [`Slot::Removed`] tombstone behind: lookups must
//! walk past it, insertions may reuse it. At least one [`Slot::Free`] slot
//! always exists, which is what terminates every probe sequence.
//!
//! The table grows and shrinks between two water marks derived from the
//! configured load factors, always landing on a capacity from
//! [`primes`]:
//!
//! ```text
//! high_water_mark = min(capacity - 2, capacity * max_load_factor)
//! low_water_mark  = capacity * min_load_factor
//! ```

use std::fmt;
use std::mem;
use std::ops::Add;

use tracing::debug;

use crate::error::{Result, VectorError};

pub mod primes;

use primes::{next_prime, LARGEST_PRIME};

/// Initial capacity used by [`OpenHashMap::new`].
pub const DEFAULT_CAPACITY: usize = 277;
/// Occupancy ratio under which the table shrinks.
pub const DEFAULT_MIN_LOAD_FACTOR: f64 = 0.2;
/// Occupancy ratio over which the table grows.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.5;

// ============================================================================
// Keys and slots
// ============================================================================

/// A primitive key with a 32-bit hash code.
pub trait HashKey: Copy + Eq + Default + fmt::Debug {
    /// Hash code of the key; the sign bit is masked off by the table.
    fn hash_code(self) -> i32;
}

impl HashKey for i32 {
    #[inline]
    fn hash_code(self) -> i32 {
        self
    }
}

impl HashKey for i64 {
    #[inline]
    fn hash_code(self) -> i32 {
        let bits = self as u64;
        (bits ^ (bits >> 32)) as i32
    }
}

impl HashKey for usize {
    #[inline]
    fn hash_code(self) -> i32 {
        let bits = self as u64;
        (bits ^ (bits >> 32)) as i32
    }
}

/// State of one table slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Slot {
    #[default]
    Free,
    Full,
    Removed,
}

/// Where an insertion for a key should land.
enum Insertion {
    /// The key is already stored at this slot
    Present(usize),
    /// The key is absent and may be written at this slot
    Vacant(usize),
}

// ============================================================================
// Configuration
// ============================================================================

/// Sizing parameters for an [`OpenHashMap`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HashConfig {
    pub initial_capacity: usize,
    pub min_load_factor: f64,
    pub max_load_factor: f64,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            min_load_factor: DEFAULT_MIN_LOAD_FACTOR,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }
}

impl HashConfig {
    /// Check capacity and load factors.
    ///
    /// Requires `0 < min < max < 1` and a capacity no larger than the
    /// largest tabulated prime.
    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity > LARGEST_PRIME {
            return Err(VectorError::InvalidConfiguration(format!(
                "initial capacity {} exceeds maximum {}",
                self.initial_capacity, LARGEST_PRIME
            )));
        }
        if !(self.min_load_factor > 0.0 && self.min_load_factor < 1.0) {
            return Err(VectorError::InvalidConfiguration(format!(
                "min load factor {} outside (0, 1)",
                self.min_load_factor
            )));
        }
        if !(self.max_load_factor > 0.0 && self.max_load_factor < 1.0) {
            return Err(VectorError::InvalidConfiguration(format!(
                "max load factor {} outside (0, 1)",
                self.max_load_factor
            )));
        }
        if self.min_load_factor >= self.max_load_factor {
            return Err(VectorError::InvalidConfiguration(format!(
                "min load factor {} must be below max load factor {}",
                self.min_load_factor, self.max_load_factor
            )));
        }
        Ok(())
    }
}

#[inline]
fn choose_high_water_mark(capacity: usize, max_load_factor: f64) -> usize {
    // capacity - 2 keeps a FREE slot around even at full load
    (capacity - 2).min((capacity as f64 * max_load_factor) as usize)
}

#[inline]
fn choose_low_water_mark(capacity: usize, min_load_factor: f64) -> usize {
    (capacity as f64 * min_load_factor) as usize
}

// ============================================================================
// OpenHashMap
// ============================================================================

/// Hash map from primitive keys to `Copy` values using open addressing.
#[derive(Clone)]
pub struct OpenHashMap<K, V> {
    keys: Vec<K>,
    values: Vec<V>,
    state: Vec<Slot>,
    /// Number of FULL slots
    distinct: usize,
    /// Number of FREE slots (REMOVED slots are not free)
    free_entries: usize,
    low_water_mark: usize,
    high_water_mark: usize,
    min_load_factor: f64,
    max_load_factor: f64,
}

/// The `int → double` instantiation.
pub type OpenIntDoubleHashMap = OpenHashMap<i32, f64>;

impl<K: HashKey, V: Copy + Default + PartialEq> OpenHashMap<K, V> {
    /// Create an empty map with the default configuration.
    pub fn new() -> Self {
        Self::setup(HashConfig::default())
    }

    /// Create an empty map able to hold about `initial_capacity` slots.
    pub fn with_capacity(initial_capacity: usize) -> Result<Self> {
        Self::with_config(HashConfig {
            initial_capacity,
            ..HashConfig::default()
        })
    }

    /// Create an empty map from an explicit configuration.
    pub fn with_config(config: HashConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::setup(config))
    }

    fn setup(config: HashConfig) -> Self {
        let capacity = next_prime(config.initial_capacity);
        Self {
            keys: vec![K::default(); capacity],
            values: vec![V::default(); capacity],
            state: vec![Slot::Free; capacity],
            distinct: 0,
            free_entries: capacity,
            // Established at the first rehash, so that a young table does
            // not shrink on its first removal.
            low_water_mark: 0,
            high_water_mark: choose_high_water_mark(capacity, config.max_load_factor),
            min_load_factor: config.min_load_factor,
            max_load_factor: config.max_load_factor,
        }
    }

    // ========================================================================
    // Size and sizing
    // ========================================================================

    /// Number of stored entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.distinct
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.distinct == 0
    }

    /// Number of slots in the table (always a tabulated prime).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.keys.len()
    }

    /// Occupancy under which a removal shrinks the table.
    pub fn low_water_mark(&self) -> usize {
        self.low_water_mark
    }

    /// Occupancy over which an insertion grows the table.
    pub fn high_water_mark(&self) -> usize {
        self.high_water_mark
    }

    pub fn min_load_factor(&self) -> f64 {
        self.min_load_factor
    }

    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    /// Smallest prime capacity at least `desired` whose high water mark can
    /// hold `size` entries.
    fn capacity_for(&self, size: usize, desired: usize) -> usize {
        let mut capacity = next_prime(desired.max(size + 1));
        while capacity < LARGEST_PRIME
            && choose_high_water_mark(capacity, self.max_load_factor) < size
        {
            capacity = next_prime(capacity + 1);
        }
        capacity
    }

    fn choose_grow_capacity(&self, size: usize) -> usize {
        let desired =
            (4.0 * size as f64 / (3.0 * self.min_load_factor + self.max_load_factor)) as usize;
        self.capacity_for(size, desired)
    }

    fn choose_shrink_capacity(&self, size: usize) -> usize {
        let desired =
            (4.0 * size as f64 / (self.min_load_factor + 3.0 * self.max_load_factor)) as usize;
        self.capacity_for(size, desired)
    }

    fn choose_mean_capacity(&self, size: usize) -> usize {
        let desired = (2.0 * size as f64 / (self.min_load_factor + self.max_load_factor)) as usize;
        self.capacity_for(size, desired)
    }

    /// Grow the table so it has at least `min_capacity` slots.
    pub fn ensure_capacity(&mut self, min_capacity: usize) {
        if self.capacity() < min_capacity {
            let capacity = self.capacity_for(self.distinct, min_capacity);
            self.rehash(capacity);
        }
    }

    /// Shrink the table to a capacity proportional to its contents.
    pub fn trim_to_size(&mut self) {
        let capacity = self.choose_mean_capacity(self.distinct);
        if self.capacity() > capacity {
            self.rehash(capacity);
        }
    }

    /// Remove every entry and trim the table.
    pub fn clear(&mut self) {
        self.state.fill(Slot::Free);
        self.values.fill(V::default());
        self.distinct = 0;
        self.free_entries = self.capacity();
        self.trim_to_size();
    }

    /// Reinsert every live entry into freshly allocated arrays of
    /// `new_capacity` slots. O(old capacity).
    fn rehash(&mut self, new_capacity: usize) {
        let old_capacity = self.capacity();
        debug!(
            old_capacity,
            new_capacity,
            size = self.distinct,
            "rehashing open hash map"
        );

        let old_keys = mem::replace(&mut self.keys, vec![K::default(); new_capacity]);
        let old_values = mem::replace(&mut self.values, vec![V::default(); new_capacity]);
        let old_state = mem::replace(&mut self.state, vec![Slot::Free; new_capacity]);

        self.free_entries = new_capacity;
        self.high_water_mark = choose_high_water_mark(new_capacity, self.max_load_factor);
        self.low_water_mark =
            choose_low_water_mark(new_capacity, self.min_load_factor).min(self.distinct);

        for ((key, value), slot) in old_keys.into_iter().zip(old_values).zip(old_state) {
            if slot != Slot::Full {
                continue;
            }
            let i = match self.index_of_insertion(key) {
                Insertion::Vacant(i) | Insertion::Present(i) => i,
            };
            self.keys[i] = key;
            self.values[i] = value;
            self.state[i] = Slot::Full;
            self.free_entries -= 1;
        }
    }

    // ========================================================================
    // Probing
    // ========================================================================

    /// First slot and step size of the probe sequence for `key`.
    #[inline]
    fn probe_start(&self, key: K) -> (usize, usize) {
        let len = self.capacity();
        let hash = (key.hash_code() & 0x7FFF_FFFF) as usize;
        // len is prime and >= 3; any step in 1..len-2 is coprime with it
        let step = (hash % (len - 2)).max(1);
        (hash % len, step)
    }

    /// Slot holding `key`, if present.
    fn index_of_key(&self, key: K) -> Option<usize> {
        let len = self.capacity();
        let (mut i, step) = self.probe_start(key);
        loop {
            match self.state[i] {
                Slot::Free => return None,
                Slot::Full if self.keys[i] == key => return Some(i),
                _ => i = (i + step) % len,
            }
        }
    }

    /// Slot where `key` lives or should be written.
    fn index_of_insertion(&self, key: K) -> Insertion {
        let len = self.capacity();
        let (mut i, step) = self.probe_start(key);

        // Stop at the first REMOVED or FREE slot, or at the key itself.
        while self.state[i] == Slot::Full && self.keys[i] != key {
            i = (i + step) % len;
        }

        if self.state[i] == Slot::Removed {
            // The key may still live further along; only reuse the
            // tombstone if the sequence ends without finding it.
            let tombstone = i;
            while self.state[i] != Slot::Free
                && (self.state[i] == Slot::Removed || self.keys[i] != key)
            {
                i = (i + step) % len;
            }
            if self.state[i] == Slot::Free {
                i = tombstone;
            }
        }

        if self.state[i] == Slot::Full {
            Insertion::Present(i)
        } else {
            Insertion::Vacant(i)
        }
    }

    // ========================================================================
    // Lookup and mutation
    // ========================================================================

    /// Value for `key`, or `V::default()` when absent.
    #[inline]
    pub fn get(&self, key: K) -> V {
        self.lookup(key).unwrap_or_default()
    }

    /// Value for `key`, if present.
    pub fn lookup(&self, key: K) -> Option<V> {
        self.index_of_key(key).map(|i| self.values[i])
    }

    pub fn contains_key(&self, key: K) -> bool {
        self.index_of_key(key).is_some()
    }

    pub fn contains_value(&self, value: V) -> bool {
        self.iter().any(|(_, v)| v == value)
    }

    /// Associate `value` with `key`.
    ///
    /// Returns true if the key was newly added, false if an existing value
    /// was replaced.
    pub fn put(&mut self, key: K, value: V) -> bool {
        let slot = match self.index_of_insertion(key) {
            Insertion::Present(i) => {
                self.values[i] = value;
                return false;
            }
            Insertion::Vacant(i) => i,
        };

        let slot = if self.distinct >= self.high_water_mark {
            let capacity = self.choose_grow_capacity(self.distinct + 1);
            self.rehash(capacity);
            match self.index_of_insertion(key) {
                Insertion::Vacant(i) | Insertion::Present(i) => i,
            }
        } else {
            slot
        };

        if self.state[slot] == Slot::Free {
            self.free_entries -= 1;
        }
        self.keys[slot] = key;
        self.values[slot] = value;
        self.state[slot] = Slot::Full;
        self.distinct += 1;

        if self.free_entries < 1 {
            let capacity = self.choose_grow_capacity(self.distinct + 1);
            self.rehash(capacity);
        }
        true
    }

    /// Remove `key`. Returns false if it was not present.
    pub fn remove(&mut self, key: K) -> bool {
        let Some(i) = self.index_of_key(key) else {
            return false;
        };
        self.state[i] = Slot::Removed;
        self.values[i] = V::default();
        self.distinct -= 1;

        if self.distinct < self.low_water_mark {
            let capacity = self.choose_shrink_capacity(self.distinct);
            self.rehash(capacity);
        }
        true
    }

    /// Keep only the entries for which `keep` returns true.
    ///
    /// Shrinks at most once, after the pass.
    pub fn retain(&mut self, mut keep: impl FnMut(K, V) -> bool) {
        for i in 0..self.capacity() {
            if self.state[i] == Slot::Full && !keep(self.keys[i], self.values[i]) {
                self.state[i] = Slot::Removed;
                self.values[i] = V::default();
                self.distinct -= 1;
            }
        }
        if self.distinct < self.low_water_mark {
            let capacity = self.choose_shrink_capacity(self.distinct);
            self.rehash(capacity);
        }
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Iterate over `(key, value)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (K, V)> + '_ {
        self.state
            .iter()
            .zip(self.keys.iter().zip(self.values.iter()))
            .filter(|(slot, _)| **slot == Slot::Full)
            .map(|(_, (key, value))| (*key, *value))
    }

    pub fn keys(&self) -> Vec<K> {
        self.iter().map(|(k, _)| k).collect()
    }

    pub fn values(&self) -> Vec<V> {
        self.iter().map(|(_, v)| v).collect()
    }

    /// Apply `f` to every key until it returns false.
    ///
    /// Returns false if the walk was cut short.
    pub fn for_each_key(&self, mut f: impl FnMut(K) -> bool) -> bool {
        self.iter().all(|(k, _)| f(k))
    }

    /// Apply `f` to every pair until it returns false.
    pub fn for_each_pair(&self, mut f: impl FnMut(K, V) -> bool) -> bool {
        self.iter().all(|(k, v)| f(k, v))
    }

    /// Rewrite stored values in place.
    pub fn for_each_value_mut(&mut self, mut f: impl FnMut(K, &mut V)) {
        for ((slot, key), value) in self
            .state
            .iter()
            .zip(self.keys.iter())
            .zip(self.values.iter_mut())
        {
            if *slot == Slot::Full {
                f(*key, value);
            }
        }
    }
}

impl<K: HashKey, V: Copy + Default + PartialEq + Add<Output = V>> OpenHashMap<K, V> {
    /// Add `increment` to the value of `key`, or store `new_value` if the
    /// key is absent. Returns the value now associated with `key`.
    ///
    /// The increment is applied to the key's resolved slot; an insertion that
    /// triggers a rehash goes through [`put`](Self::put) and never touches
    /// another key's value.
    pub fn adjust_or_put_value(&mut self, key: K, new_value: V, increment: V) -> V {
        match self.index_of_insertion(key) {
            Insertion::Present(i) => {
                self.values[i] = self.values[i] + increment;
                self.values[i]
            }
            Insertion::Vacant(_) => {
                self.put(key, new_value);
                new_value
            }
        }
    }
}

impl<K: HashKey, V: Copy + Default + PartialEq> Default for OpenHashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: HashKey, V: Copy + Default + PartialEq> PartialEq for OpenHashMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.lookup(k) == Some(v))
    }
}

impl<K: HashKey, V: Copy + Default + PartialEq + fmt::Debug> fmt::Debug for OpenHashMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
