//! Store-wide bookkeeping record.
//!
//! Lives under the empty key, which sorts before every 5-byte vertex key and
//! is never reached by record cursors (they always seek to a vid-prefixed
//! key). Holds the next vertex id to allocate and a per-label edge counter:
//!
//! ```text
//! [8B next_vid LE][2B label count LE]([2B lid LE][8B edges LE])*
//! ```
//!
//! Counters are little-endian; the record never participates in key ordering.

use std::collections::BTreeMap;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{GraphError, Result};
use crate::types::{LabelId, VertexId, MAX_VID};

/// Key of the meta record.
pub const META_KEY: &[u8] = b"";

/// Decoded meta record.
#[derive(Clone, Debug, Default)]
pub struct MetaRecord {
    next_vid: u64,
    label_counts: BTreeMap<u16, u64>,
}

impl MetaRecord {
    /// Fresh store state: first vid is zero, no edges.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a serialized meta record.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < 10 {
            return Err(GraphError::Corruption("meta record truncated".into()));
        }
        let next_vid = u64::from_le_bytes(buf[0..8].try_into().expect("8 bytes"));
        let n = usize::from(u16::from_le_bytes(buf[8..10].try_into().expect("2 bytes")));
        if buf.len() != 10 + n * 10 {
            return Err(GraphError::Corruption(
                "meta record label table length mismatch".into(),
            ));
        }
        let mut label_counts = BTreeMap::new();
        for i in 0..n {
            let at = 10 + i * 10;
            let lid = u16::from_le_bytes(buf[at..at + 2].try_into().expect("2 bytes"));
            let count = u64::from_le_bytes(buf[at + 2..at + 10].try_into().expect("8 bytes"));
            label_counts.insert(lid, count);
        }
        Ok(Self {
            next_vid,
            label_counts,
        })
    }

    /// Serializes the record.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(10 + self.label_counts.len() * 10);
        buf.put_u64_le(self.next_vid);
        buf.put_u16_le(self.label_counts.len() as u16);
        for (&lid, &count) in &self.label_counts {
            buf.put_u16_le(lid);
            buf.put_u64_le(count);
        }
        buf.freeze()
    }

    /// The vid the next `add_vertex` will receive.
    pub fn next_vid(&self) -> VertexId {
        VertexId(self.next_vid)
    }

    /// Hands out the next vid and advances the counter. Ids are never reused.
    pub fn allocate_vid(&mut self) -> Result<VertexId> {
        if self.next_vid > MAX_VID {
            return Err(GraphError::CapacityExceeded("vertex id space exhausted"));
        }
        let vid = VertexId(self.next_vid);
        self.next_vid += 1;
        Ok(vid)
    }

    /// Live edge count for a label.
    pub fn label_count(&self, lid: LabelId) -> u64 {
        self.label_counts.get(&lid.0).copied().unwrap_or(0)
    }

    /// Records one added edge of `lid`.
    pub fn incr_label(&mut self, lid: LabelId) {
        *self.label_counts.entry(lid.0).or_insert(0) += 1;
    }

    /// Records one removed edge of `lid`.
    pub fn decr_label(&mut self, lid: LabelId) -> Result<()> {
        match self.label_counts.get_mut(&lid.0) {
            Some(count) if *count > 0 => {
                *count -= 1;
                if *count == 0 {
                    self.label_counts.remove(&lid.0);
                }
                Ok(())
            }
            _ => Err(GraphError::Corruption(format!(
                "edge counter underflow for label {}",
                lid.0
            ))),
        }
    }
}
