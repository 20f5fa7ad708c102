//! Narrow interface onto the external ordered key-value transaction.
//!
//! The storage layer does not persist anything itself: every record read or
//! write goes through these traits. The backing store must compare keys as
//! raw byte strings (unsigned lexicographic order) — the key codec relies on
//! big-endian field encoding to make byte order equal numeric order.
//!
//! Concurrency discipline: at most one writer per transaction, serialized by
//! the caller. Several logical iterators may share one transaction; each
//! iterator observes the transaction's mutation generation and must
//! re-validate ([`KvIterator::refresh_after_modify`]) once
//! [`KvIterator::underlying_modified`] reports divergence.

use bytes::Bytes;

use crate::error::Result;

pub mod mem;

/// One ordered key-value transaction. Assumed durable and crash-safe by the
/// surrounding database; this layer only requires a stable sort order and the
/// cursor operations below.
pub trait KvTransaction {
    /// Cursor type bound to this transaction.
    type Iter<'a>: KvIterator
    where
        Self: 'a;

    /// True when the transaction cannot accept writes.
    fn is_read_only(&self) -> bool;

    /// Monotonic counter bumped by every mutation inside this transaction.
    /// The explicit invalidation token behind the iterator refresh protocol.
    fn generation(&self) -> u64;

    /// Opens an unpositioned cursor.
    fn iterator(&self) -> Self::Iter<'_>;
}

/// Cursor over the ordered keyspace of one transaction.
///
/// Positioning methods return whether the cursor is valid afterwards; an
/// absolute seek (`goto_*`) re-observes the transaction and clears
/// [`KvIterator::underlying_modified`]. Mutating methods require a writable
/// transaction and leave the cursor positioned as documented per method.
pub trait KvIterator {
    /// Positions on the smallest key.
    fn goto_first_key(&mut self) -> bool;

    /// Positions on the largest key.
    fn goto_last_key(&mut self) -> bool;

    /// Positions on `key` exactly; invalid if absent.
    fn goto_key(&mut self, key: &[u8]) -> bool;

    /// Positions on the smallest key greater than or equal to `key`.
    fn goto_closest_key(&mut self, key: &[u8]) -> bool;

    /// Moves to the next key in sort order.
    fn next(&mut self) -> bool;

    /// Moves to the previous key in sort order.
    fn prev(&mut self) -> bool;

    /// True while positioned on an existing entry.
    fn is_valid(&self) -> bool;

    /// Key under the cursor, if valid.
    fn key(&self) -> Option<Bytes>;

    /// Value under the cursor, if valid.
    fn value(&self) -> Option<Bytes>;

    /// Replaces the value under the cursor.
    fn set_value(&mut self, value: &[u8]) -> Result<()>;

    /// Inserts `key` → `value` and positions on it. Returns `false` without
    /// writing when the key exists and `overwrite` is off.
    fn add_key_value(&mut self, key: &[u8], value: &[u8], overwrite: bool) -> Result<bool>;

    /// Deletes the entry under the cursor and positions on its successor
    /// (invalid when it was the last entry).
    fn delete_key(&mut self) -> Result<()>;

    /// Re-seats the cursor after sibling mutations: synchronizes with the
    /// transaction generation and, when the cached key vanished, moves to the
    /// closest surviving key at or after it. Returns validity.
    fn refresh_after_modify(&mut self) -> bool;

    /// True when a sibling operation mutated the transaction since this
    /// cursor last observed it.
    fn underlying_modified(&self) -> bool;
}
