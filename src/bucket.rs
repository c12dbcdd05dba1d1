use alloc::collections::TryReserveError;
use alloc::vec::Vec;

/// A stored key and its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<K, V> {
    /// Unique within a table.
    pub key: K,
    /// Payload stored alongside the key.
    pub value: V,
}

impl<K, V> Record<K, V> {
    /// Pairs a key with its value.
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

/// The chain of records that share a home bucket.
///
/// Records are kept in arrival order. The chain does not enforce key
/// uniqueness; [`HashTable`](crate::HashTable) checks [`Bucket::contains`]
/// before appending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket<K, V> {
    records: Vec<Record<K, V>>,
}

impl<K, V> Default for Bucket<K, V> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<K, V> Bucket<K, V> {
    /// Creates an empty chain without allocating.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in the chain.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no record has this bucket as its home.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in arrival order.
    pub fn iter(&self) -> core::slice::Iter<'_, Record<K, V>> {
        self.records.iter()
    }

    /// Adds a record at the tail of the chain.
    pub fn append(&mut self, record: Record<K, V>) {
        self.records.push(record);
    }

    /// Makes room for exactly `additional` more records, or reports why the
    /// allocator refused.
    pub fn try_reserve_exact(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.records.try_reserve_exact(additional)
    }

    pub(crate) fn into_records(self) -> Vec<Record<K, V>> {
        self.records
    }
}

impl<K: Eq, V> Bucket<K, V> {
    /// Returns `true` if a record with `key` is in the chain.
    pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Returns the first record whose key equals `key`.
    pub fn find(&self, key: &K) -> Option<&Record<K, V>> {
        self.records.iter().find(|record| record.key == *key)
    }

    /// Like [`find`](Self::find), also returning how many records were
    /// compared, the match included.
    ///
    /// A miss compares every record in the chain.
    pub fn find_counted(&self, key: &K) -> (Option<&Record<K, V>>, usize) {
        let mut comparisons = 0;
        for record in &self.records {
            comparisons += 1;
            if record.key == *key {
                return (Some(record), comparisons);
            }
        }
        (None, comparisons)
    }

    /// Removes and returns the first record whose key equals `key`.
    ///
    /// The remaining records keep their relative order.
    pub fn remove(&mut self, key: &K) -> Option<Record<K, V>> {
        let position = self.records.iter().position(|record| record.key == *key)?;
        Some(self.records.remove(position))
    }
}
