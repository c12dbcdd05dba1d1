#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Records and the chains that hold them.
pub mod bucket;

/// Prime capacities and the growth rule.
///
/// A table's capacity is always prime. It starts at the smallest prime at or
/// above the requested size, and every rehash moves it to the smallest prime
/// at or above twice the current capacity.
pub mod capacity;

/// Construction-time table settings.
pub mod config;

/// Errors returned by table construction and inserts.
pub mod error;

pub mod events;

/// The chained hash table.
pub mod hash_table;

pub mod hasher;

pub use bucket::Bucket;
pub use bucket::Record;
pub use config::DEFAULT_CAPACITY;
pub use config::GrowthCheck;
pub use config::TableConfig;
pub use error::ConfigError;
pub use error::GrowError;
pub use error::InsertError;
pub use events::EventSink;
pub use events::LogEvents;
pub use events::NoEvents;
pub use events::TableEvent;
#[cfg(feature = "stats")]
pub use hash_table::ChainStats;
pub use hash_table::HashTable;
pub use hash_table::Iter;
pub use hash_table::Keys;
pub use hash_table::Values;
pub use hasher::BucketHasher;
#[cfg(any(feature = "foldhash", feature = "std"))]
pub use hasher::DefaultHashBuilder;
pub use hasher::DivisionHasher;
pub use hasher::Hashed;
pub use hasher::IntegerKey;
