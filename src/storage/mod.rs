//! Adjacency storage layer.
//!
//! Maps vertices and their edge lists onto an ordered byte-string keyspace
//! ([`crate::kv`]). A small vertex starts life as one combined record holding
//! its properties and both edge runs; growth splits it into a vertex-only
//! record plus per-direction edge-run records, re-splitting runs that exceed
//! the configured threshold. Records never merge back.

pub mod edge_value;
pub mod graph;
pub mod iter;
pub mod key;
pub mod meta;
pub mod options;
pub mod packed;
pub mod vertex_value;

pub use edge_value::{EdgeRef, EdgeValue, MAX_EDGES_PER_RUN};
pub use graph::Graph;
pub use iter::{Direction, EdgeIterator, VertexIterator};
pub use options::{StoreOptions, MAX_PROP_SIZE, MAX_SPLIT_THRESHOLD};
pub use packed::PackedValue;
pub use vertex_value::VertexValue;

/// One page of distinct neighbor ids, with pagination state.
#[derive(Clone, Debug, Default)]
pub struct PeerPage {
    /// Distinct neighbor vertex ids in key order.
    pub vids: Vec<crate::types::VertexId>,
    /// Resume position for the next page, or `None` when the edge list was
    /// exhausted.
    pub next: Option<PeerCursor>,
}

impl PeerPage {
    /// True when the page filled up before the edge list was exhausted.
    pub fn truncated(&self) -> bool {
        self.next.is_some()
    }
}

/// Opaque resume token for [`Graph::list_dst_vids`] / [`Graph::list_src_vids`]:
/// the scan position of the last edge a page consumed. Feeding it back resumes
/// the enumeration strictly after that edge.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct PeerCursor {
    pub(crate) lid: crate::types::LabelId,
    pub(crate) tid: crate::types::TemporalId,
    pub(crate) peer: crate::types::VertexId,
    pub(crate) eid: crate::types::EdgeId,
}
