//! Vertex CRUD.

use bytes::Bytes;
use tracing::trace;

use crate::error::Result;
use crate::kv::{KvIterator, KvTransaction};
use crate::types::{LabelId, VertexId};

use super::super::key;
use super::super::packed::PackedValue;
use super::{find_vertex, load_meta, store_meta, Graph, VertexRecord};

impl Graph {
    /// Creates a vertex with `prop` and returns its freshly allocated id.
    /// Ids are handed out sequentially and never reused.
    pub fn add_vertex<T: KvTransaction>(&self, txn: &T, prop: &[u8]) -> Result<VertexId> {
        self.check_writable(txn)?;
        self.check_prop_size(prop)?;
        let mut it = txn.iterator();
        let mut meta = load_meta(&mut it)?;
        let vid = meta.allocate_vid()?;
        if vid.0 > self.opts.max_vid {
            return Err(crate::error::GraphError::CapacityExceeded(
                "vertex id space exhausted",
            ));
        }
        let packed = PackedValue::new_vertex(prop);
        if packed.size() <= self.threshold() {
            it.add_key_value(&key::pack_vertex_key(vid), packed.as_bytes(), true)?;
        } else {
            // too big to ever live packed; start split
            it.add_key_value(&key::pack_vertex_only_key(vid), prop, true)?;
        }
        store_meta(&mut it, &meta)?;
        trace!(vid = vid.0, prop_len = prop.len(), "vertex added");
        Ok(vid)
    }

    /// True when `vid` exists.
    pub fn vertex_exists<T: KvTransaction>(&self, txn: &T, vid: VertexId) -> Result<bool> {
        let mut it = txn.iterator();
        Ok(find_vertex(&mut it, vid)?.is_some())
    }

    /// Property of `vid`, or `None` when the vertex does not exist.
    pub fn get_vertex_property<T: KvTransaction>(
        &self,
        txn: &T,
        vid: VertexId,
    ) -> Result<Option<Bytes>> {
        let mut it = txn.iterator();
        match find_vertex(&mut it, vid)? {
            None => Ok(None),
            Some(VertexRecord::Packed(p)) => Ok(Some(p.property_bytes())),
            Some(VertexRecord::Unpacked(v)) => Ok(Some(v.to_bytes())),
        }
    }

    /// Replaces the property of `vid`. Returns `false` when the vertex does
    /// not exist. A growing property may push a combined record over the
    /// threshold and split it.
    pub fn set_vertex_property<T: KvTransaction>(
        &self,
        txn: &T,
        vid: VertexId,
        prop: &[u8],
    ) -> Result<bool> {
        self.check_writable(txn)?;
        self.check_prop_size(prop)?;
        let mut it = txn.iterator();
        match find_vertex(&mut it, vid)? {
            None => Ok(false),
            Some(VertexRecord::Packed(p)) => {
                self.store_packed(&mut it, vid, prop, &p.out_run(), &p.in_run())?;
                Ok(true)
            }
            Some(VertexRecord::Unpacked(_)) => {
                // cursor sits on the vertex-only record
                it.set_value(prop)?;
                Ok(true)
            }
        }
    }

    /// The id the next [`Graph::add_vertex`] will allocate.
    pub fn next_vid<T: KvTransaction>(&self, txn: &T) -> Result<VertexId> {
        let mut it = txn.iterator();
        Ok(load_meta(&mut it)?.next_vid())
    }

    /// Number of live edges carrying `lid`, from the persisted counter.
    pub fn num_edges_with_label<T: KvTransaction>(&self, txn: &T, lid: LabelId) -> Result<u64> {
        let mut it = txn.iterator();
        Ok(load_meta(&mut it)?.label_count(lid))
    }
}
