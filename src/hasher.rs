//! Mapping keys to bucket indexes.
//!
//! A [`BucketHasher`] turns a key and the table's current capacity into an
//! index in `0..capacity`. The index depends on the capacity, so the same key
//! lands in a different bucket after every rehash.

use core::hash::BuildHasher;
use core::hash::Hash;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// Hasher builder used by [`Hashed`] when none is given.
        pub type DefaultHashBuilder = foldhash::fast::FixedState;
    } else if #[cfg(feature = "std")] {
        /// Hasher builder used by [`Hashed`] when none is given.
        pub type DefaultHashBuilder = std::hash::RandomState;
    }
}

/// Maps a key to its home bucket for a given capacity.
pub trait BucketHasher<K: ?Sized> {
    /// Returns the bucket index of `key` in a table of `capacity` buckets.
    ///
    /// Implementations must return a value in `0..capacity` and must be
    /// deterministic for a fixed `(key, capacity)` pair. `capacity` is never
    /// zero.
    fn index(&self, key: &K, capacity: usize) -> usize;
}

/// Integer keys usable with the division method.
pub trait IntegerKey {
    /// Returns `self mod capacity`, always in `0..capacity`.
    ///
    /// Signed keys use the Euclidean remainder, so `-1` lands in the last
    /// bucket rather than producing a negative index.
    fn rem_capacity(&self, capacity: usize) -> usize;
}

macro_rules! unsigned_key {
    ($($ty:ty),*) => {
        $(
            impl IntegerKey for $ty {
                #[inline]
                fn rem_capacity(&self, capacity: usize) -> usize {
                    (*self as u128 % capacity as u128) as usize
                }
            }
        )*
    };
}

macro_rules! signed_key {
    ($($ty:ty),*) => {
        $(
            impl IntegerKey for $ty {
                #[inline]
                fn rem_capacity(&self, capacity: usize) -> usize {
                    (*self as i128).rem_euclid(capacity as i128) as usize
                }
            }
        )*
    };
}

unsigned_key!(u8, u16, u32, u64, u128, usize);
signed_key!(i8, i16, i32, i64, isize);

impl IntegerKey for i128 {
    #[inline]
    fn rem_capacity(&self, capacity: usize) -> usize {
        // `capacity as i128` cannot wrap: usize is at most 64 bits wide.
        self.rem_euclid(capacity as i128) as usize
    }
}

/// The division method: `key mod capacity`.
///
/// Only meaningful for integer keys, where prime capacities keep keys that
/// share low bits from piling into the same buckets.
///
/// # Examples
///
/// ```rust
/// use chain_hash::BucketHasher;
/// use chain_hash::DivisionHasher;
///
/// assert_eq!(DivisionHasher.index(&101u32, 13), 10);
/// assert_eq!(DivisionHasher.index(&-1i64, 13), 12);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DivisionHasher;

impl<K: IntegerKey + ?Sized> BucketHasher<K> for DivisionHasher {
    #[inline]
    fn index(&self, key: &K, capacity: usize) -> usize {
        key.rem_capacity(capacity)
    }
}

/// Hashes any `Hash` key with `S`, then applies the division method to the
/// 64-bit hash.
///
/// # Examples
///
/// ```rust
/// # #[cfg(any(feature = "std", feature = "foldhash"))]
/// # {
/// use chain_hash::BucketHasher;
/// use chain_hash::DefaultHashBuilder;
/// use chain_hash::Hashed;
///
/// let hasher = Hashed::<DefaultHashBuilder>::default();
/// let index = hasher.index("alice@company.com", 29);
/// assert!(index < 29);
/// assert_eq!(index, hasher.index("alice@company.com", 29));
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Hashed<S>(pub S);

impl<S> Hashed<S> {
    /// Wraps a hasher builder.
    pub fn new(hash_builder: S) -> Self {
        Self(hash_builder)
    }
}

impl<K, S> BucketHasher<K> for Hashed<S>
where
    K: Hash + ?Sized,
    S: BuildHasher,
{
    #[inline]
    fn index(&self, key: &K, capacity: usize) -> usize {
        (self.0.hash_one(key) % capacity as u64) as usize
    }
}
