//! Identifier newtypes and record-kind tags.

use std::fmt;

use crate::error::{GraphError, Result};

/// Vertex identifier, 40 bits wide. Allocated sequentially from the persisted
/// next-VID counter and never reused after deletion.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct VertexId(pub u64);

/// Edge schema label identifier.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct LabelId(pub u16);

/// Optional ordering field for multigraph edges between the same pair.
/// Unsigned so big-endian key bytes sort numerically.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct TemporalId(pub u64);

/// Disambiguates edges with identical (src, label, tid, dst). Dense from 0
/// within each such group; gaps left by deletion are never renumbered.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct EdgeId(pub u32);

/// Largest vertex id representable in the 5-byte key field.
pub const MAX_VID: u64 = (1 << 40) - 1;

/// Largest edge id representable in the 3-byte in-run field. The key reserves
/// four bytes, but the run encoding caps the id first.
pub const MAX_EID: u32 = (1 << 24) - 1;

/// Full identity of one edge. The out-edge record and its reciprocal in-edge
/// record share this identity; only the key swaps src and dst.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct EdgeUid {
    /// Source vertex.
    pub src: VertexId,
    /// Destination vertex.
    pub dst: VertexId,
    /// Edge label.
    pub lid: LabelId,
    /// Temporal ordering field.
    pub tid: TemporalId,
    /// Per-(src, lid, tid, dst) sequence number.
    pub eid: EdgeId,
}

impl EdgeUid {
    /// Creates an edge identity from its five components.
    pub fn new(src: VertexId, dst: VertexId, lid: LabelId, tid: TemporalId, eid: EdgeId) -> Self {
        Self {
            src,
            dst,
            lid,
            tid,
            eid,
        }
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-[{}:{}#{}]->{}",
            self.src, self.lid, self.tid.0, self.eid.0, self.dst
        )
    }
}

impl From<u64> for VertexId {
    fn from(value: u64) -> Self {
        VertexId(value)
    }
}

impl From<u16> for LabelId {
    fn from(value: u16) -> Self {
        LabelId(value)
    }
}

/// Record kind, encoded as the trailing key byte. The vertex-only form of a
/// combined record omits the byte entirely (inferred from the 5-byte key
/// length), which is what makes it sort first among a vertex's records.
#[repr(u8)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum PackType {
    /// Vertex properties plus both edge runs in one value.
    PackedData = 0x00,
    /// Vertex properties only.
    VertexOnly = 0x01,
    /// One run of outgoing edges.
    OutEdge = 0x02,
    /// One run of incoming edges.
    InEdge = 0x03,
}

impl PackType {
    /// Decodes a key type byte.
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0x00 => Ok(Self::PackedData),
            0x01 => Ok(Self::VertexOnly),
            0x02 => Ok(Self::OutEdge),
            0x03 => Ok(Self::InEdge),
            other => Err(GraphError::Corruption(format!(
                "unknown pack type: 0x{other:02X}"
            ))),
        }
    }

    /// Returns the key type byte.
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// True for the two edge-run kinds.
    pub fn is_edge(self) -> bool {
        matches!(self, Self::OutEdge | Self::InEdge)
    }
}
