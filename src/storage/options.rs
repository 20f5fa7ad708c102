//! Tuning knobs for the adjacency store.

use crate::types::{MAX_EID, MAX_VID};

/// Hard cap on accepted property size. A stored edge-run record holds at most
/// one threshold's worth of bytes or a single oversized edge, and an insertion
/// adds one more edge on top; with both knobs at or under these caps every
/// 3-byte body offset in the run codec stays representable.
pub const MAX_PROP_SIZE: usize = (1 << 23) - 64;

/// Hard cap on the split threshold, paired with [`MAX_PROP_SIZE`] to keep
/// edge-run body offsets in range.
pub const MAX_SPLIT_THRESHOLD: usize = 1 << 23;

/// Configuration for a [`super::Graph`].
///
/// The defaults suit page-sized KV backends; tests shrink
/// `split_threshold` to force record splits with little data.
#[derive(Clone, Debug)]
pub struct StoreOptions {
    /// Serialized record size above which an edge run is split, at most
    /// [`MAX_SPLIT_THRESHOLD`]. A run whose single edge exceeds this is
    /// stored oversized rather than rejected.
    pub split_threshold: usize,
    /// Largest property accepted for a vertex or an edge, in bytes, at most
    /// [`MAX_PROP_SIZE`].
    pub max_prop_size: usize,
    /// Largest vertex id the store will allocate. Capped by the 5-byte key
    /// field ([`MAX_VID`]).
    pub max_vid: u64,
    /// Largest edge id the store will allocate within one group. Capped by
    /// the 3-byte in-run field ([`MAX_EID`]).
    pub max_eid: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            split_threshold: 4096,
            max_prop_size: MAX_PROP_SIZE,
            max_vid: MAX_VID,
            max_eid: MAX_EID,
        }
    }
}

impl StoreOptions {
    /// Options with the default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the record split threshold, clamped to [`MAX_SPLIT_THRESHOLD`].
    pub fn split_threshold(mut self, bytes: usize) -> Self {
        self.split_threshold = bytes.min(MAX_SPLIT_THRESHOLD);
        self
    }

    /// Sets the maximum accepted property size, clamped to [`MAX_PROP_SIZE`].
    pub fn max_prop_size(mut self, bytes: usize) -> Self {
        self.max_prop_size = bytes.min(MAX_PROP_SIZE);
        self
    }

    /// Lowers the vertex id ceiling below the encoding cap.
    pub fn max_vid(mut self, vid: u64) -> Self {
        debug_assert!(vid <= MAX_VID);
        self.max_vid = vid;
        self
    }

    /// Lowers the per-group edge id ceiling below the encoding cap.
    pub fn max_eid(mut self, eid: u32) -> Self {
        debug_assert!(eid <= MAX_EID);
        self.max_eid = eid;
        self
    }
}
