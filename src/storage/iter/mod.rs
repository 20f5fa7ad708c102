//! Cursors over vertices and adjacency lists.
//!
//! Both cursors hold a logical position (a vertex id, or an edge identity)
//! rather than a raw KV position, so they survive the record churn caused by
//! splits and re-keying: after a sibling mutation,
//! `refresh_if_underlying_modified` re-seeks the logical position and lands
//! on it or on its closest surviving successor.

use crate::types::PackType;

mod edge;
mod vertex;

pub use edge::EdgeIterator;
pub use vertex::VertexIterator;

/// Which adjacency list of the anchor vertex an edge cursor walks.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Direction {
    /// Edges leaving the anchor.
    Out,
    /// Edges arriving at the anchor.
    In,
}

impl Direction {
    pub(crate) fn pack_type(self) -> PackType {
        match self {
            Direction::Out => PackType::OutEdge,
            Direction::In => PackType::InEdge,
        }
    }
}
