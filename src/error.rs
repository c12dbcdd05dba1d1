use thiserror::Error;

/// Why an insert was refused.
///
/// Either way the table is left exactly as it was before the call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    /// A record with the same key is already stored.
    #[error("key already present in bucket {index}")]
    DuplicateKey {
        /// Home bucket of the existing record.
        index: usize,
    },
    /// The table needed to grow and could not.
    #[error(transparent)]
    Grow(#[from] GrowError),
}

/// Why a rehash could not take place.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowError {
    /// Doubling the capacity, or finding a prime above it, overflows `usize`.
    #[error("cannot grow past {capacity} buckets: capacity overflow")]
    CapacityOverflow {
        /// Capacity at the time of the failed growth.
        capacity: usize,
    },
    /// The next capacity is above the configured maximum.
    #[error("growing to {requested} buckets would exceed the limit of {limit}")]
    CapacityLimit {
        /// Capacity the table tried to grow to.
        requested: usize,
        /// Configured maximum.
        limit: usize,
    },
    /// The allocator refused the new bucket array.
    #[error("failed to allocate {capacity} buckets")]
    AllocationFailed {
        /// Capacity the table tried to grow to.
        capacity: usize,
    },
}

/// A [`TableConfig`](crate::TableConfig) that cannot describe a table.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// The load factor is not a finite, positive number.
    #[error("max load factor must be finite and positive, got {0}")]
    InvalidLoadFactor(f64),
    /// A maximum capacity of zero buckets.
    #[error("max capacity must be at least one bucket")]
    ZeroMaxCapacity,
    /// The starting capacity is already above the maximum.
    #[error("initial capacity {initial} exceeds max capacity {limit}")]
    InitialExceedsMax {
        /// Starting capacity, after rounding up to a prime when known.
        initial: usize,
        /// Configured maximum.
        limit: usize,
    },
    /// No prime at or above the requested capacity fits in a `usize`.
    #[error("no prime capacity at or above {0} fits in usize")]
    InitialCapacityOverflow(usize),
}
