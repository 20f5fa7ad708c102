//! Vertex cursor.

use bytes::Bytes;

use crate::error::{GraphError, Result};
use crate::kv::{KvIterator, KvTransaction};
use crate::types::{PackType, VertexId, MAX_VID};

use super::super::key;
use super::super::packed::PackedValue;

/// Walks vertices in id order by visiting their anchor records.
pub struct VertexIterator<'a, T: KvTransaction + 'a> {
    it: T::Iter<'a>,
    vid: Option<VertexId>,
}

impl<'a, T: KvTransaction + 'a> VertexIterator<'a, T> {
    /// Opens an unpositioned cursor.
    pub fn new(txn: &'a T) -> Self {
        Self {
            it: txn.iterator(),
            vid: None,
        }
    }

    /// Positions on `vid`, or with `nearest` on the smallest existing vertex
    /// with an id at or above it. Returns validity.
    pub fn goto(&mut self, vid: VertexId, nearest: bool) -> bool {
        self.vid = None;
        if !self.it.goto_closest_key(&key::pack_vertex_key(vid)) {
            return false;
        }
        let Some(k) = self.it.key() else {
            return false;
        };
        // every vertex's smallest key is its anchor, so a closest seek from
        // a bare vid prefix always lands on an anchor
        let Some(found) = key::first_vid(&k) else {
            return false;
        };
        if found == vid || nearest {
            self.vid = Some(found);
        }
        self.vid.is_some()
    }

    /// Moves to the vertex with the next-larger id.
    pub fn next(&mut self) -> bool {
        let Some(cur) = self.vid else {
            return false;
        };
        if cur.0 >= MAX_VID {
            self.vid = None;
            return false;
        }
        self.goto(VertexId(cur.0 + 1), true)
    }

    /// Moves to the vertex with the next-smaller id.
    pub fn prev(&mut self) -> bool {
        let Some(cur) = self.vid else {
            return false;
        };
        self.vid = None;
        if self.it.goto_closest_key(&key::pack_vertex_key(cur)) {
            if !self.it.prev() {
                return false;
            }
        } else if !self.it.goto_last_key() {
            return false;
        }
        let Some(k) = self.it.key() else {
            return false;
        };
        // the meta record's empty key has no vid and ends the walk
        let Some(found) = key::first_vid(&k) else {
            return false;
        };
        self.goto(found, false)
    }

    /// True while positioned on a vertex.
    pub fn is_valid(&self) -> bool {
        self.vid.is_some()
    }

    /// Id of the current vertex.
    pub fn vid(&self) -> Option<VertexId> {
        self.vid
    }

    /// Property of the current vertex.
    pub fn property(&mut self) -> Result<Option<Bytes>> {
        let Some(vid) = self.vid else {
            return Ok(None);
        };
        if !self.it.goto_closest_key(&key::pack_vertex_key(vid)) {
            return Ok(None);
        }
        let (Some(k), Some(value)) = (self.it.key(), self.it.value()) else {
            return Ok(None);
        };
        if key::first_vid(&k) != Some(vid) {
            return Ok(None);
        }
        match key::node_kind(&k) {
            Some(PackType::PackedData) => {
                Ok(Some(PackedValue::from_bytes(value)?.property_bytes()))
            }
            Some(PackType::VertexOnly) => Ok(Some(value)),
            _ => Err(GraphError::Corruption(format!(
                "vertex {vid} has edge records but no anchor"
            ))),
        }
    }

    /// When a sibling cursor mutated the transaction, re-seeks the logical
    /// position: the same vertex if it survived, else the nearest id above
    /// it. Returns validity.
    pub fn refresh_if_underlying_modified(&mut self) -> bool {
        if !self.it.underlying_modified() {
            return self.vid.is_some();
        }
        self.it.refresh_after_modify();
        match self.vid {
            Some(v) => self.goto(v, true),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::mem::MemStore;
    use crate::storage::{Graph, StoreOptions};

    fn store_with(n: u64) -> (MemStore, Graph) {
        let store = MemStore::new();
        let graph = Graph::new(StoreOptions::default());
        let txn = store.write_txn();
        for i in 0..n {
            let prop = format!("v{i}");
            graph.add_vertex(&txn, prop.as_bytes()).unwrap();
        }
        (store, graph)
    }

    #[test]
    fn walks_vertices_in_order() {
        let (store, _) = store_with(3);
        let txn = store.read_txn();
        let mut it = VertexIterator::new(&txn);
        assert!(it.goto(VertexId(0), false));
        assert_eq!(it.property().unwrap().unwrap().as_ref(), b"v0");
        assert!(it.next());
        assert_eq!(it.vid(), Some(VertexId(1)));
        assert!(it.next());
        assert!(!it.next());
        assert!(!it.is_valid());
    }

    #[test]
    fn prev_stops_at_first_vertex() {
        let (store, _) = store_with(2);
        let txn = store.read_txn();
        let mut it = VertexIterator::new(&txn);
        assert!(it.goto(VertexId(1), false));
        assert!(it.prev());
        assert_eq!(it.vid(), Some(VertexId(0)));
        // the meta record sorts below but is not a vertex
        assert!(!it.prev());
    }

    #[test]
    fn nearest_skips_deleted_ids() {
        let (store, graph) = store_with(3);
        let txn = store.write_txn();
        assert!(graph.delete_vertex(&txn, VertexId(1), None).unwrap());
        let mut it = VertexIterator::new(&txn);
        assert!(!it.goto(VertexId(1), false));
        assert!(it.goto(VertexId(1), true));
        assert_eq!(it.vid(), Some(VertexId(2)));
    }

    #[test]
    fn refresh_heals_after_sibling_delete() {
        let (store, graph) = store_with(3);
        let txn = store.write_txn();
        let mut it = VertexIterator::new(&txn);
        assert!(it.goto(VertexId(1), false));
        assert!(graph.delete_vertex(&txn, VertexId(1), None).unwrap());
        assert!(it.refresh_if_underlying_modified());
        assert_eq!(it.vid(), Some(VertexId(2)));
    }
}
