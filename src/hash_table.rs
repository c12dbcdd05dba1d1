use alloc::collections::TryReserveError;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::iter::FusedIterator;

use crate::bucket::Bucket;
use crate::bucket::Record;
use crate::capacity::CapacityPolicy;
use crate::config::DEFAULT_CAPACITY;
use crate::config::GrowthCheck;
use crate::config::TableConfig;
use crate::error::ConfigError;
use crate::error::GrowError;
use crate::error::InsertError;
use crate::events::EventSink;
use crate::events::NoEvents;
use crate::events::TableEvent;
use crate::hasher::BucketHasher;
use crate::hasher::DivisionHasher;

/// Chain-length statistics for a table.
///
/// Requires the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone, PartialEq)]
pub struct ChainStats {
    /// Number of records in the table
    pub len: usize,
    /// Number of buckets
    pub capacity: usize,
    /// `len / capacity`
    pub load_factor: f64,
    /// Collision counter at the time of the snapshot
    pub collisions: usize,
    /// Buckets holding at least one record
    pub non_empty_buckets: usize,
    /// Length of the longest chain
    pub max_chain_len: usize,
    /// Mean chain length over non-empty buckets
    pub mean_chain_len: f64,
}

#[cfg(any(test, feature = "stats"))]
impl ChainStats {
    /// Short chains at a moderate load: no chain longer than three records
    /// and a load factor below 0.8.
    pub fn distribution_is_good(&self) -> bool {
        self.max_chain_len <= 3 && self.load_factor < 0.8
    }

    /// Fraction of buckets that hold at least one record.
    pub fn bucket_utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.non_empty_buckets as f64 / self.capacity as f64
        }
    }
}

#[cfg(any(test, feature = "stats"))]
impl core::fmt::Display for ChainStats {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "=== Chained Hash Table Statistics ===")?;
        writeln!(
            f,
            "Population: {}/{} ({:.3} load factor)",
            self.len, self.capacity, self.load_factor
        )?;
        writeln!(f, "Collisions: {}", self.collisions)?;
        writeln!(
            f,
            "Non-empty buckets: {}/{} ({:.1}%)",
            self.non_empty_buckets,
            self.capacity,
            self.bucket_utilization() * 100.0
        )?;
        writeln!(f, "Mean chain length: {:.2}", self.mean_chain_len)?;
        writeln!(f, "Max chain length: {}", self.max_chain_len)?;
        write!(
            f,
            "Distribution: {}",
            if self.distribution_is_good() {
                "good"
            } else {
                "needs improvement"
            }
        )
    }
}

/// A hash table resolving collisions by separate chaining.
///
/// Every bucket owns a chain of records in arrival order. The number of
/// buckets is always prime. When an insert would push the load factor
/// (`len / capacity`) over the configured threshold, the table first grows to
/// the next prime after twice its capacity, doubling again while that is still
/// not enough, and reinserts every record.
///
/// Keys are unique: inserting a key that is already present fails with
/// [`InsertError::DuplicateKey`] instead of replacing the stored value.
///
/// `H` maps keys to buckets. The default, [`DivisionHasher`], uses
/// `key mod capacity` and works with integer keys; wrap a `BuildHasher` in
/// [`Hashed`](crate::Hashed) for other key types.
///
/// ## Example
///
/// ```rust
/// use chain_hash::HashTable;
/// use chain_hash::InsertError;
///
/// let mut table = HashTable::new(13);
/// for id in [101, 102, 203, 304, 105, 206, 307, 108, 209, 310] {
///     table.insert(id, format!("employee {id}")).unwrap();
/// }
///
/// // The tenth insert would have pushed the load factor past 0.75.
/// assert_eq!(table.capacity(), 29);
/// assert_eq!(table.len(), 10);
/// assert_eq!(table.search(&101).map(String::as_str), Some("employee 101"));
///
/// assert_eq!(
///     table.insert(101, "again".to_string()),
///     Err(InsertError::DuplicateKey { index: 14 })
/// );
/// ```
#[derive(Clone)]
pub struct HashTable<K, V, H = DivisionHasher> {
    buckets: Vec<Bucket<K, V>>,
    len: usize,
    collisions: usize,
    policy: CapacityPolicy,
    hasher: H,
}

impl<K, V, H> Debug for HashTable<K, V, H>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> HashTable<K, V, DivisionHasher> {
    /// Creates a table with at least `initial_capacity` buckets, using the
    /// division method on integer keys.
    ///
    /// The capacity is rounded up to the next prime, and is never below 2.
    ///
    /// # Panics
    ///
    /// Panics if no prime at or above `initial_capacity` fits in a `usize`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::HashTable;
    ///
    /// let table: HashTable<u32, &str> = HashTable::new(14);
    /// assert_eq!(table.capacity(), 17);
    /// assert!(table.is_empty());
    /// ```
    pub fn new(initial_capacity: usize) -> Self {
        Self::with_hasher(initial_capacity, DivisionHasher)
    }

    /// Creates a table from a configuration, using the division method on
    /// integer keys.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::HashTable;
    /// use chain_hash::TableConfig;
    ///
    /// let config = TableConfig::default().initial_capacity(100).max_load_factor(0.5);
    /// let table: HashTable<i64, ()> = HashTable::with_config(config).unwrap();
    /// assert_eq!(table.capacity(), 101);
    /// assert_eq!(table.max_load_factor(), 0.5);
    /// ```
    pub fn with_config(config: TableConfig) -> Result<Self, ConfigError> {
        Self::with_config_and_hasher(config, DivisionHasher)
    }
}

impl<K, V, H> HashTable<K, V, H> {
    /// Creates a table with at least `initial_capacity` buckets and the given
    /// bucket hasher.
    ///
    /// # Panics
    ///
    /// Panics if no prime at or above `initial_capacity` fits in a `usize`.
    pub fn with_hasher(initial_capacity: usize, hasher: H) -> Self {
        let config = TableConfig::default().initial_capacity(initial_capacity);
        match Self::with_config_and_hasher(config, hasher) {
            Ok(table) => table,
            Err(err) => panic!("{err}"),
        }
    }

    /// Creates a table from a configuration and a bucket hasher.
    ///
    /// Fails if the configuration does not validate, or if the prime the
    /// initial capacity rounds up to is above the configured maximum.
    pub fn with_config_and_hasher(config: TableConfig, hasher: H) -> Result<Self, ConfigError> {
        config.validate()?;

        let capacity = CapacityPolicy::round_initial(config.initial_capacity)
            .ok_or(ConfigError::InitialCapacityOverflow(config.initial_capacity))?;
        if let Some(limit) = config.max_capacity {
            if capacity > limit {
                return Err(ConfigError::InitialExceedsMax {
                    initial: capacity,
                    limit,
                });
            }
        }

        let policy = CapacityPolicy::from_validated(&config, capacity);
        let mut buckets = Vec::with_capacity(policy.initial_capacity());
        buckets.resize_with(policy.initial_capacity(), Bucket::new);

        Ok(Self {
            buckets,
            len: 0,
            collisions: 0,
            policy,
            hasher,
        })
    }

    /// Returns the number of records in the table.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of buckets. Always prime.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns `len / capacity`.
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.capacity() as f64
    }

    /// Returns how many inserts, since the last rehash, joined a non-empty
    /// chain.
    ///
    /// A rehash resets the counter and recounts while it reinserts, so the
    /// value reflects the current layout rather than the table's history.
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Returns the load factor threshold that triggers a rehash.
    pub fn max_load_factor(&self) -> f64 {
        self.policy.max_load_factor()
    }

    /// Returns how the growth check counts records.
    pub fn growth_check(&self) -> GrowthCheck {
        self.policy.growth_check()
    }

    /// Returns the bucket hasher.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Returns an iterator over `(&key, &value)` pairs.
    ///
    /// Records are visited bucket by bucket in index order, and within a
    /// bucket in arrival order. The order changes when the table rehashes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::HashTable;
    ///
    /// let mut table = HashTable::new(13);
    /// table.insert(14u32, 'b').unwrap();
    /// table.insert(1u32, 'a').unwrap();
    /// table.insert(2u32, 'c').unwrap();
    ///
    /// let pairs: Vec<_> = table.iter().collect();
    /// assert_eq!(pairs, [(&14, &'b'), (&1, &'a'), (&2, &'c')]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            chain: Default::default(),
            remaining: self.len,
        }
    }

    /// Returns an iterator over the keys, in [`iter`](Self::iter) order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values, in [`iter`](Self::iter) order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns chain-length statistics for the current layout.
    ///
    /// Requires the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn stats(&self) -> ChainStats {
        let mut non_empty_buckets = 0;
        let mut max_chain_len = 0;
        for bucket in &self.buckets {
            if !bucket.is_empty() {
                non_empty_buckets += 1;
            }
            max_chain_len = max_chain_len.max(bucket.len());
        }

        ChainStats {
            len: self.len,
            capacity: self.capacity(),
            load_factor: self.load_factor(),
            collisions: self.collisions,
            non_empty_buckets,
            max_chain_len,
            mean_chain_len: if non_empty_buckets == 0 {
                0.0
            } else {
                self.len as f64 / non_empty_buckets as f64
            },
        }
    }

    /// Returns a histogram of chain lengths: entry `n` is the number of
    /// buckets holding exactly `n` records.
    ///
    /// Requires the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn chain_histogram(&self) -> Vec<usize> {
        let longest = self.buckets.iter().map(Bucket::len).max().unwrap_or(0);
        let mut hist = alloc::vec![0usize; longest + 1];
        for bucket in &self.buckets {
            hist[bucket.len()] += 1;
        }
        hist
    }
}

impl<K, V, H> HashTable<K, V, H>
where
    K: Eq,
    H: BucketHasher<K>,
{
    #[inline]
    fn bucket_index(&self, key: &K) -> usize {
        let index = self.hasher.index(key, self.capacity());
        debug_assert!(index < self.capacity());
        index
    }

    /// Inserts a record.
    ///
    /// If the key is already present the call fails with
    /// [`InsertError::DuplicateKey`] and the table is left untouched; the
    /// stored value is not replaced. Otherwise, if the insert would take the
    /// load factor over the threshold, the table rehashes into a larger
    /// prime capacity before storing the record.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::HashTable;
    /// use chain_hash::InsertError;
    ///
    /// let mut table = HashTable::new(13);
    /// assert_eq!(table.insert(7u8, "seven"), Ok(()));
    /// assert_eq!(
    ///     table.insert(7u8, "sept"),
    ///     Err(InsertError::DuplicateKey { index: 7 })
    /// );
    /// assert_eq!(table.search(&7), Some(&"seven"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Result<(), InsertError> {
        self.insert_with(key, value, NoEvents)
    }

    /// Like [`insert`](Self::insert), reporting what happened to `events`.
    ///
    /// A rehash is reported once, as [`TableEvent::Rehashed`]; records moved
    /// by the rehash are not reported individually.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::HashTable;
    /// use chain_hash::TableEvent;
    ///
    /// let mut table = HashTable::new(2);
    /// let mut events = Vec::new();
    /// table.insert_with(1u32, (), &mut events).unwrap();
    /// table.insert_with(3u32, (), &mut events).unwrap();
    ///
    /// assert_eq!(
    ///     events,
    ///     [
    ///         TableEvent::Inserted { index: 1 },
    ///         TableEvent::Rehashed { from: 2, to: 5 },
    ///         TableEvent::Inserted { index: 3 },
    ///     ]
    /// );
    /// ```
    pub fn insert_with(
        &mut self,
        key: K,
        value: V,
        mut events: impl EventSink,
    ) -> Result<(), InsertError> {
        let index = self.bucket_index(&key);
        if self.buckets[index].contains(&key) {
            events.record(TableEvent::DuplicateRejected { index });
            return Err(InsertError::DuplicateKey { index });
        }

        let index = if self.policy.needs_growth(self.len, self.capacity()) {
            let from = self.capacity();
            self.rehash()?;
            events.record(TableEvent::Rehashed {
                from,
                to: self.capacity(),
            });
            self.bucket_index(&key)
        } else {
            index
        };

        self.place(index, Record::new(key, value), &mut events);
        Ok(())
    }

    /// Appends a record to the chain at `index`, which must be the key's home
    /// bucket and must not already hold the key.
    fn place(&mut self, index: usize, record: Record<K, V>, events: &mut impl EventSink) {
        let bucket = &mut self.buckets[index];
        if !bucket.is_empty() {
            self.collisions += 1;
            events.record(TableEvent::Collision {
                index,
                chain_len: bucket.len(),
            });
        }
        bucket.append(record);
        self.len += 1;
        events.record(TableEvent::Inserted { index });
    }

    /// Grows to the smallest capacity on the doubling ladder that passes the
    /// growth check, then reinserts every record in one pass.
    ///
    /// Every allocation the move needs is made up front. If any of them
    /// fails, or the policy refuses to grow, the table is left as it was.
    /// Records are reinserted by ascending old bucket index, then in chain
    /// order, so the recounted collisions are reproducible.
    #[cold]
    fn rehash(&mut self) -> Result<(), GrowError> {
        let old_capacity = self.capacity();
        let new_capacity = self.policy.grow_capacity(self.len, old_capacity)?;
        let alloc_failed = |_: TryReserveError| GrowError::AllocationFailed {
            capacity: new_capacity,
        };

        let mut chain_lens: Vec<usize> = Vec::new();
        chain_lens.try_reserve_exact(new_capacity).map_err(alloc_failed)?;
        chain_lens.resize(new_capacity, 0);
        for record in self.buckets.iter().flat_map(|bucket| bucket.iter()) {
            chain_lens[self.hasher.index(&record.key, new_capacity)] += 1;
        }

        let mut buckets: Vec<Bucket<K, V>> = Vec::new();
        buckets.try_reserve_exact(new_capacity).map_err(alloc_failed)?;
        buckets.resize_with(new_capacity, Bucket::new);
        for (bucket, &chain_len) in buckets.iter_mut().zip(&chain_lens) {
            if chain_len > 0 {
                bucket.try_reserve_exact(chain_len).map_err(alloc_failed)?;
            }
        }
        drop(chain_lens);

        let old_buckets = core::mem::replace(&mut self.buckets, buckets);
        let old_len = core::mem::take(&mut self.len);
        self.collisions = 0;

        for bucket in old_buckets {
            for record in bucket.into_records() {
                let index = self.hasher.index(&record.key, new_capacity);
                self.place(index, record, &mut NoEvents);
            }
        }
        debug_assert_eq!(self.len, old_len);

        log::debug!(
            "rehashed {} records: {} -> {} buckets ({} collisions)",
            self.len,
            old_capacity,
            new_capacity,
            self.collisions
        );
        Ok(())
    }

    /// Returns the value stored under `key`.
    ///
    /// Never resizes the table.
    pub fn search(&self, key: &K) -> Option<&V> {
        self.buckets[self.bucket_index(key)]
            .find(key)
            .map(|record| &record.value)
    }

    /// Like [`search`](Self::search), also returning how many records in the
    /// key's home bucket were compared, the match included.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::HashTable;
    ///
    /// let mut table = HashTable::new(13);
    /// table.insert(1u32, "a").unwrap();
    /// table.insert(14u32, "b").unwrap();
    ///
    /// assert_eq!(table.search_with_comparisons(&1), (Some(&"a"), 1));
    /// assert_eq!(table.search_with_comparisons(&14), (Some(&"b"), 2));
    /// assert_eq!(table.search_with_comparisons(&27), (None, 2));
    /// assert_eq!(table.search_with_comparisons(&5), (None, 0));
    /// ```
    pub fn search_with_comparisons(&self, key: &K) -> (Option<&V>, usize) {
        let (record, comparisons) = self.buckets[self.bucket_index(key)].find_counted(key);
        (record.map(|record| &record.value), comparisons)
    }

    /// Returns `true` if a record with `key` is stored.
    pub fn contains_key(&self, key: &K) -> bool {
        self.buckets[self.bucket_index(key)].contains(key)
    }

    /// Removes the record stored under `key`, returning whether there was
    /// one.
    ///
    /// Never resizes the table and does not change the collision counter.
    pub fn delete(&mut self, key: &K) -> bool {
        self.delete_with(key, NoEvents)
    }

    /// Like [`delete`](Self::delete), reporting what happened to `events`.
    pub fn delete_with(&mut self, key: &K, mut events: impl EventSink) -> bool {
        let (index, removed) = self.take(key);
        match removed {
            Some(_) => {
                events.record(TableEvent::Removed { index });
                true
            }
            None => {
                events.record(TableEvent::NotFound { index });
                false
            }
        }
    }

    /// Removes the record stored under `key` and returns its value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_hash::HashTable;
    ///
    /// let mut table = HashTable::new(13);
    /// table.insert(203u32, "Carol").unwrap();
    /// assert_eq!(table.remove(&203), Some("Carol"));
    /// assert_eq!(table.remove(&203), None);
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.take(key).1.map(|record| record.value)
    }

    fn take(&mut self, key: &K) -> (usize, Option<Record<K, V>>) {
        let index = self.bucket_index(key);
        let removed = self.buckets[index].remove(key);
        if removed.is_some() {
            self.len -= 1;
        }
        (index, removed)
    }
}

impl<K, V> Default for HashTable<K, V, DivisionHasher> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<'a, K, V, H> IntoIterator for &'a HashTable<K, V, H> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the records of a [`HashTable`].
///
/// Created by [`HashTable::iter`].
pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Bucket<K, V>>,
    chain: core::slice::Iter<'a, Record<K, V>>,
    remaining: usize,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            chain: self.chain.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.chain.next() {
                self.remaining -= 1;
                return Some((&record.key, &record.value));
            }
            if self.remaining == 0 {
                return None;
            }
            self.chain = self.buckets.next()?.iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// An iterator over the keys of a [`HashTable`].
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// An iterator over the values of a [`HashTable`].
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeMap;
    use alloc::format;
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use core::hash::BuildHasher;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use siphasher::sip::SipHasher;

    use super::*;
    use crate::capacity::is_prime;
    use crate::hasher::Hashed;

    const EMPLOYEE_IDS: [u32; 10] = [101, 102, 203, 304, 105, 206, 307, 108, 209, 310];

    #[derive(Debug, Clone, PartialEq)]
    struct Employee {
        name: String,
        department: String,
        salary: f64,
    }

    fn employee(id: u32) -> Employee {
        Employee {
            name: format!("employee_{id}"),
            department: if id % 2 == 0 { "Engineering" } else { "Sales" }.to_string(),
            salary: 50_000.0 + id as f64 * 100.0,
        }
    }

    fn directory(config: TableConfig, ids: &[u32]) -> HashTable<u32, Employee> {
        let mut table = HashTable::with_config(config).unwrap();
        for &id in ids {
            table.insert(id, employee(id)).unwrap();
        }
        table
    }

    #[derive(Clone, Default)]
    struct SipBuilder;

    impl BuildHasher for SipBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(0x5eed, 0xc0ffee)
        }
    }

    #[test]
    fn initial_capacity_rounds_up_to_prime() {
        assert_eq!(HashTable::<u32, ()>::new(13).capacity(), 13);
        assert_eq!(HashTable::<u32, ()>::new(14).capacity(), 17);
        assert_eq!(HashTable::<u32, ()>::new(0).capacity(), 2);
        assert_eq!(HashTable::<u32, ()>::default().capacity(), 17);
    }

    #[test]
    fn example_directory_rehashes_on_tenth_insert() {
        let config = TableConfig::default().initial_capacity(13);
        let mut table = directory(config, &EMPLOYEE_IDS[..9]);
        assert_eq!(table.capacity(), 13);
        assert_eq!(table.collisions(), 3);

        let mut events = Vec::new();
        table.insert_with(310, employee(310), &mut events).unwrap();
        assert_eq!(
            events,
            [
                TableEvent::Rehashed { from: 13, to: 29 },
                TableEvent::Inserted { index: 20 },
            ]
        );

        assert_eq!(table.capacity(), 29);
        assert_eq!(table.len(), 10);
        assert_eq!(table.search(&101), Some(&employee(101)));
        // 101 and 304 share bucket 14 after the rehash.
        assert_eq!(table.collisions(), 1);
        assert!(table.load_factor() <= 0.75);
    }

    #[test]
    fn rehash_reinserts_in_bucket_then_chain_order() {
        let table = directory(TableConfig::default().initial_capacity(13), &EMPLOYEE_IDS);
        let keys: Vec<u32> = table.keys().copied().collect();
        assert_eq!(keys, [203, 206, 209, 304, 101, 102, 307, 105, 310, 108]);
        assert_eq!(table.search_with_comparisons(&101).1, 2);
        assert_eq!(table.search_with_comparisons(&304).1, 1);
    }

    #[test]
    fn current_growth_check_grows_one_insert_later() {
        let config = TableConfig::default()
            .initial_capacity(13)
            .growth_check(GrowthCheck::Current);
        let mut table = directory(config, &EMPLOYEE_IDS);
        assert_eq!(table.capacity(), 13);
        assert_eq!(table.len(), 10);
        assert_eq!(table.collisions(), 4);
        assert!(table.load_factor() > 0.75);

        table.insert(411, employee(411)).unwrap();
        assert_eq!(table.capacity(), 29);
        assert_eq!(table.collisions(), 1);

        table.insert(512, employee(512)).unwrap();
        assert_eq!(table.capacity(), 29);
        assert_eq!(table.len(), 12);
        assert_eq!(table.collisions(), 1);
        for id in EMPLOYEE_IDS.iter().chain(&[411, 512]) {
            assert_eq!(table.search(id), Some(&employee(*id)));
        }
    }

    #[test]
    fn duplicate_is_rejected_without_side_effects() {
        let mut table = directory(TableConfig::default().initial_capacity(13), &EMPLOYEE_IDS);
        let before: Vec<(u32, Employee)> =
            table.iter().map(|(k, v)| (*k, v.clone())).collect();

        let mut events = Vec::new();
        let result = table.insert_with(102, employee(999), &mut events);
        assert_eq!(result, Err(InsertError::DuplicateKey { index: 15 }));
        assert_eq!(events, [TableEvent::DuplicateRejected { index: 15 }]);

        let after: Vec<(u32, Employee)> = table.iter().map(|(k, v)| (*k, v.clone())).collect();
        assert_eq!(before, after);
        assert_eq!(table.len(), 10);
        assert_eq!(table.collisions(), 1);
        assert_eq!(table.search(&102), Some(&employee(102)));
    }

    #[test]
    fn duplicate_does_not_trigger_growth() {
        let config = TableConfig::default().initial_capacity(13);
        let mut table = directory(config, &EMPLOYEE_IDS[..9]);
        assert_eq!(
            table.insert(101, employee(101)),
            Err(InsertError::DuplicateKey { index: 10 })
        );
        assert_eq!(table.capacity(), 13);
    }

    #[test]
    fn delete_and_remove() {
        let mut table = directory(TableConfig::default().initial_capacity(13), &EMPLOYEE_IDS);
        let capacity = table.capacity();
        let collisions = table.collisions();

        assert!(table.delete(&203));
        assert!(!table.delete(&203));
        assert!(!table.delete(&999));
        assert_eq!(table.len(), 9);
        assert_eq!(table.search(&203), None);
        assert_eq!(table.remove(&310), Some(employee(310)));
        assert_eq!(table.remove(&310), None);
        assert_eq!(table.len(), 8);

        assert_eq!(table.capacity(), capacity);
        assert_eq!(table.collisions(), collisions);

        // A deleted key can be inserted again.
        table.insert(203, employee(203)).unwrap();
        assert_eq!(table.search(&203), Some(&employee(203)));
    }

    #[test]
    fn delete_preserves_chain_order() {
        let mut table: HashTable<u32, u32> = HashTable::new(13);
        for key in [1, 14, 27, 40] {
            table.insert(key, key).unwrap();
        }
        assert!(table.delete(&14));
        assert_eq!(table.search_with_comparisons(&40), (Some(&40), 3));
        let keys: Vec<u32> = table.keys().copied().collect();
        assert_eq!(keys, [1, 27, 40]);
    }

    #[test]
    fn delete_events() {
        let mut table: HashTable<u32, ()> = HashTable::new(13);
        table.insert(5, ()).unwrap();

        let mut events = Vec::new();
        assert!(table.delete_with(&5, &mut events));
        assert!(!table.delete_with(&18, &mut events));
        assert_eq!(
            events,
            [
                TableEvent::Removed { index: 5 },
                TableEvent::NotFound { index: 5 }
            ]
        );
    }

    #[test]
    fn collisions_are_counted_per_arrival() {
        let mut table: HashTable<u32, ()> = HashTable::new(13);
        let mut events = Vec::new();
        for key in [0, 13, 26] {
            table.insert_with(key, (), &mut events).unwrap();
        }
        assert_eq!(table.collisions(), 2);
        assert_eq!(
            events,
            [
                TableEvent::Inserted { index: 0 },
                TableEvent::Collision {
                    index: 0,
                    chain_len: 1
                },
                TableEvent::Inserted { index: 0 },
                TableEvent::Collision {
                    index: 0,
                    chain_len: 2
                },
                TableEvent::Inserted { index: 0 },
            ]
        );
    }

    #[test]
    fn growth_limit_leaves_table_untouched() {
        let config = TableConfig::default().initial_capacity(13).max_capacity(20);
        let mut table = directory(config, &EMPLOYEE_IDS[..9]);
        let before: Vec<(u32, Employee)> =
            table.iter().map(|(k, v)| (*k, v.clone())).collect();

        assert_eq!(
            table.insert(310, employee(310)),
            Err(InsertError::Grow(GrowError::CapacityLimit {
                requested: 29,
                limit: 20
            }))
        );
        assert_eq!(table.len(), 9);
        assert_eq!(table.capacity(), 13);
        assert_eq!(table.collisions(), 3);
        assert_eq!(table.search(&310), None);
        let after: Vec<(u32, Employee)> = table.iter().map(|(k, v)| (*k, v.clone())).collect();
        assert_eq!(before, after);

        // Making room lets the insert through without growing.
        assert!(table.delete(&209));
        table.insert(310, employee(310)).unwrap();
        assert_eq!(table.capacity(), 13);
        assert_eq!(table.len(), 9);
    }

    #[test]
    fn config_errors_surface_on_construction() {
        assert!(matches!(
            HashTable::<u32, ()>::with_config(TableConfig::default().max_load_factor(-0.5)),
            Err(ConfigError::InvalidLoadFactor(_))
        ));
        // 14 rounds up to 17, which is over the limit.
        assert_eq!(
            HashTable::<u32, ()>::with_config(
                TableConfig::default().initial_capacity(14).max_capacity(15)
            )
            .err(),
            Some(ConfigError::InitialExceedsMax {
                initial: 17,
                limit: 15
            })
        );
    }

    #[test]
    fn custom_load_factor() {
        let config = TableConfig::default().initial_capacity(11).max_load_factor(0.5);
        let mut table: HashTable<u64, u64> = HashTable::with_config(config).unwrap();
        for key in 0..5 {
            table.insert(key, key).unwrap();
        }
        assert_eq!(table.capacity(), 11);
        table.insert(5, 5).unwrap();
        assert_eq!(table.capacity(), 23);
        assert!(table.load_factor() <= 0.5);
    }

    #[test]
    fn small_threshold_grows_past_one_doubling() {
        let config = TableConfig::default().initial_capacity(2).max_load_factor(0.1);
        let mut table: HashTable<u32, ()> = HashTable::with_config(config).unwrap();

        let mut events = Vec::new();
        table.insert_with(1, (), &mut events).unwrap();
        // 5 buckets would leave one record at 0.2.
        assert_eq!(
            events,
            [
                TableEvent::Rehashed { from: 2, to: 11 },
                TableEvent::Inserted { index: 1 },
            ]
        );
        assert_eq!(table.capacity(), 11);

        for key in 2..300 {
            table.insert(key, ()).unwrap();
            assert!(table.load_factor() <= table.max_load_factor());
            assert!(is_prime(table.capacity()));
        }
        assert!((1..300).all(|key| table.contains_key(&key)));
    }

    #[test]
    #[cfg(all(target_pointer_width = "64", not(miri)))]
    fn allocation_failure_leaves_table_untouched() {
        // Keeping one record under this threshold needs ~10^17 buckets.
        let config = TableConfig::default()
            .initial_capacity(2)
            .max_load_factor(1e-17)
            .growth_check(GrowthCheck::Current);
        let mut table: HashTable<u64, &str> = HashTable::with_config(config).unwrap();
        table.insert(7, "seven").unwrap();

        let mut events = Vec::new();
        let result = table.insert_with(8, "eight", &mut events);
        assert!(matches!(
            result,
            Err(InsertError::Grow(GrowError::AllocationFailed { capacity }))
                if capacity >= 100_000_000_000_000_000
        ));
        assert!(events.is_empty());

        assert_eq!(table.len(), 1);
        assert_eq!(table.capacity(), 2);
        assert_eq!(table.collisions(), 0);
        assert_eq!(table.search(&7), Some(&"seven"));
        assert_eq!(table.search(&8), None);
        let pairs: Vec<(u64, &str)> = table.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(pairs, [(7, "seven")]);
    }

    #[test]
    fn invariants_hold_through_many_rehashes() {
        let mut table: HashTable<u64, u64> = HashTable::new(2);
        let mut capacities = vec![table.capacity()];
        for key in 0..5_000u64 {
            table.insert(key * 7, key).unwrap();
            assert!(is_prime(table.capacity()));
            assert!(table.load_factor() <= 0.75, "{}", table.load_factor());
            if *capacities.last().unwrap() != table.capacity() {
                capacities.push(table.capacity());
            }
        }
        assert_eq!(table.len(), 5_000);
        assert_eq!(table.iter().len(), 5_000);
        for key in 0..5_000u64 {
            assert_eq!(table.search(&(key * 7)), Some(&key));
        }
        for pair in capacities.windows(2) {
            assert_eq!(Some(pair[1]), crate::capacity::grow_target(pair[0]));
        }
    }

    #[test]
    fn random_interleaving_matches_model() {
        let mut rng = SmallRng::seed_from_u64(0x2545_f491);
        let mut table: HashTable<i32, u32> = HashTable::new(5);
        let mut model = BTreeMap::new();

        for step in 0..20_000u32 {
            let key = rng.random_range(-300..300);
            if rng.random_bool(0.6) {
                let expected = model.contains_key(&key);
                match table.insert(key, step) {
                    Ok(()) => {
                        assert!(!expected);
                        model.insert(key, step);
                    }
                    Err(InsertError::DuplicateKey { .. }) => assert!(expected),
                    Err(err) => panic!("unexpected {err}"),
                }
            } else {
                assert_eq!(table.delete(&key), model.remove(&key).is_some());
            }

            assert_eq!(table.len(), model.len());
            let probe = rng.random_range(-300..300);
            assert_eq!(table.search(&probe), model.get(&probe));
        }

        let mut contents: Vec<(i32, u32)> = table.iter().map(|(k, v)| (*k, *v)).collect();
        contents.sort_unstable();
        let expected: Vec<(i32, u32)> = model.into_iter().collect();
        assert_eq!(contents, expected);
    }

    #[test]
    fn string_keys_with_hashed() {
        let mut table: HashTable<String, u32, Hashed<SipBuilder>> =
            HashTable::with_hasher(13, Hashed::new(SipBuilder));
        for i in 0..100u32 {
            table.insert(format!("user{i}@company.com"), i).unwrap();
        }
        assert_eq!(table.len(), 100);
        assert!(is_prime(table.capacity()));
        for i in 0..100u32 {
            assert_eq!(table.search(&format!("user{i}@company.com")), Some(&i));
        }
        assert!(
            table
                .insert("user7@company.com".to_string(), 0)
                .is_err()
        );
        assert!(table.delete(&"user7@company.com".to_string()));
        assert_eq!(table.search(&"user7@company.com".to_string()), None);
    }

    #[test]
    fn iteration_is_restartable() {
        let table = directory(TableConfig::default().initial_capacity(13), &EMPLOYEE_IDS);
        let first: Vec<u32> = table.keys().copied().collect();
        let second: Vec<u32> = (&table).into_iter().map(|(k, _)| *k).collect();
        assert_eq!(first, second);

        let mut iter = table.iter();
        assert_eq!(iter.len(), 10);
        iter.next();
        let cloned = iter.clone();
        assert_eq!(cloned.len(), 9);
        assert_eq!(iter.count(), 9);
        assert_eq!(table.values().len(), 10);

        let empty: HashTable<u32, ()> = HashTable::new(7);
        assert_eq!(empty.iter().next(), None);
    }

    #[test]
    fn department_query_through_iteration() {
        let table = directory(TableConfig::default().initial_capacity(13), &EMPLOYEE_IDS);
        let mut engineering: Vec<u32> = table
            .iter()
            .filter(|(_, e)| e.department == "Engineering")
            .map(|(id, _)| *id)
            .collect();
        engineering.sort_unstable();
        assert_eq!(engineering, [102, 108, 206, 304, 310]);

        let payroll: f64 = table.values().map(|e| e.salary).sum();
        let expected: f64 = EMPLOYEE_IDS.iter().map(|&id| employee(id).salary).sum();
        assert!((payroll - expected).abs() < 1e-6);
    }

    #[test]
    fn clone_is_independent() {
        let mut table = directory(TableConfig::default().initial_capacity(13), &EMPLOYEE_IDS);
        let snapshot = table.clone();
        table.delete(&101);
        assert_eq!(snapshot.len(), 10);
        assert_eq!(snapshot.search(&101), Some(&employee(101)));
        assert_eq!(snapshot.capacity(), table.capacity());
    }

    #[test]
    fn debug_lists_records_as_a_map() {
        let mut table: HashTable<u32, &str> = HashTable::new(13);
        table.insert(2, "b").unwrap();
        table.insert(1, "a").unwrap();
        assert_eq!(format!("{table:?}"), r#"{1: "a", 2: "b"}"#);
    }

    #[test]
    fn stats_describe_chains() {
        let table = directory(TableConfig::default().initial_capacity(13), &EMPLOYEE_IDS);
        let stats = table.stats();
        assert_eq!(stats.len, 10);
        assert_eq!(stats.capacity, 29);
        assert_eq!(stats.collisions, 1);
        assert_eq!(stats.non_empty_buckets, 9);
        assert_eq!(stats.max_chain_len, 2);
        assert!((stats.mean_chain_len - 10.0 / 9.0).abs() < 1e-12);
        assert!(stats.distribution_is_good());

        let hist = table.chain_histogram();
        assert_eq!(hist, [20, 8, 1]);

        let rendered = format!("{stats}");
        assert!(rendered.contains("Population: 10/29"));
        assert!(rendered.contains("Distribution: good"));
    }

    #[test]
    fn stats_on_empty_table() {
        let table: HashTable<u32, ()> = HashTable::new(7);
        let stats = table.stats();
        assert_eq!(stats.non_empty_buckets, 0);
        assert_eq!(stats.mean_chain_len, 0.0);
        assert_eq!(table.chain_histogram(), [7]);
    }

    #[test]
    fn skewed_keys_degrade_distribution() {
        let config = TableConfig::default().initial_capacity(13).max_load_factor(100.0);
        let mut table: HashTable<u32, ()> = HashTable::with_config(config).unwrap();
        for i in 0..8 {
            table.insert(i * 13, ()).unwrap();
        }
        let stats = table.stats();
        assert_eq!(stats.max_chain_len, 8);
        assert_eq!(stats.collisions, 7);
        assert!(!stats.distribution_is_good());
    }
}
