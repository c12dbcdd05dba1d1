//! Diagnostics emitted by table mutations.
//!
//! The table never prints. Callers that want to see collisions, rehashes or
//! rejected duplicates pass an [`EventSink`] to
//! [`HashTable::insert_with`](crate::HashTable::insert_with) or
//! [`HashTable::delete_with`](crate::HashTable::delete_with).

use alloc::vec::Vec;

/// Something that happened while the table served a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableEvent {
    /// The table grew from `from` to `to` buckets and reinserted every record.
    Rehashed {
        /// Capacity before the rehash.
        from: usize,
        /// Capacity after the rehash.
        to: usize,
    },
    /// The new record joined a non-empty chain.
    Collision {
        /// Home bucket of the new record.
        index: usize,
        /// Chain length before the record was appended.
        chain_len: usize,
    },
    /// A record was stored.
    Inserted {
        /// Home bucket of the new record.
        index: usize,
    },
    /// The key was already present; nothing changed.
    DuplicateRejected {
        /// Home bucket of the existing record.
        index: usize,
    },
    /// A record was removed.
    Removed {
        /// Bucket the record was removed from.
        index: usize,
    },
    /// A delete found no record for the key.
    NotFound {
        /// Bucket that was searched.
        index: usize,
    },
}

/// Receives [`TableEvent`]s.
pub trait EventSink {
    /// Called once per event, in the order the events happen.
    fn record(&mut self, event: TableEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEvents;

impl EventSink for NoEvents {
    #[inline(always)]
    fn record(&mut self, _event: TableEvent) {}
}

/// Forwards events to the [`log`] facade.
///
/// Collisions and rejected duplicates are logged at `debug`, everything else
/// at `trace`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEvents;

impl EventSink for LogEvents {
    fn record(&mut self, event: TableEvent) {
        match event {
            TableEvent::Rehashed { from, to } => {
                log::trace!("rehashed {from} -> {to} buckets");
            }
            TableEvent::Collision { index, chain_len } => {
                log::debug!("collision at bucket {index} (chain length {chain_len})");
            }
            TableEvent::Inserted { index } => {
                log::trace!("inserted into bucket {index}");
            }
            TableEvent::DuplicateRejected { index } => {
                log::debug!("duplicate key rejected at bucket {index}");
            }
            TableEvent::Removed { index } => {
                log::trace!("removed from bucket {index}");
            }
            TableEvent::NotFound { index } => {
                log::trace!("delete missed bucket {index}");
            }
        }
    }
}

impl EventSink for Vec<TableEvent> {
    fn record(&mut self, event: TableEvent) {
        self.push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn record(&mut self, event: TableEvent) {
        (**self).record(event);
    }
}
