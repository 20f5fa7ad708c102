//! Adjacency-list storage layer for an embedded graph database.
//!
//! Vertices and their incident edges are mapped onto records of an ordered
//! byte-string key-value store (unsigned lexicographic comparison). Small
//! vertices keep their properties and both edge runs in a single combined
//! record; once a record outgrows the configured byte threshold it is split
//! into a vertex-only record plus one or more out/in edge-run records, each
//! keyed by the last edge it contains.
//!
//! The key-value transaction itself (durability, crash safety, MVCC) is an
//! external collaborator consumed through the narrow traits in [`kv`]; an
//! in-memory reference backend lives in [`kv::mem`].

pub mod error;
pub mod kv;
pub mod storage;
pub mod types;

pub use error::{GraphError, Result};
pub use storage::{Graph, StoreOptions};
pub use types::{EdgeId, EdgeUid, LabelId, PackType, TemporalId, VertexId};
