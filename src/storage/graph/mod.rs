//! Graph operations over the record layout.
//!
//! [`Graph`] is stateless apart from its options: every operation takes the
//! caller's KV transaction, opens a cursor, and reads whatever bookkeeping it
//! needs from the store itself. That keeps the layer safe to share across
//! transactions without coordination of its own.

use tracing::debug;

use crate::error::{GraphError, Result};
use crate::kv::{KvIterator, KvTransaction};
use crate::types::{LabelId, PackType, TemporalId, VertexId};

use super::edge_value::EdgeValue;
use super::iter::{Direction, EdgeIterator, VertexIterator};
use super::key::{self, KeyBuf};
use super::meta::{MetaRecord, META_KEY};
use super::options::{StoreOptions, MAX_PROP_SIZE, MAX_SPLIT_THRESHOLD};
use super::packed::PackedValue;
use super::vertex_value::VertexValue;

mod delete_ops;
mod edge_ops;
mod query_ops;
mod vertex_ops;


/// The adjacency store. Construct once, use from any transaction.
pub struct Graph {
    opts: StoreOptions,
}

impl Graph {
    /// Creates a store handle with the given options.
    pub fn new(opts: StoreOptions) -> Self {
        Self { opts }
    }

    /// The options this handle was built with.
    pub fn options(&self) -> &StoreOptions {
        &self.opts
    }

    /// Opens a vertex cursor over `txn`.
    pub fn vertex_iterator<'a, T: KvTransaction>(&self, txn: &'a T) -> VertexIterator<'a, T> {
        VertexIterator::new(txn)
    }

    /// Opens an edge cursor over `txn`, anchored at `vid` in `dir`.
    pub fn edge_iterator<'a, T: KvTransaction>(
        &self,
        txn: &'a T,
        dir: Direction,
        vid: VertexId,
    ) -> EdgeIterator<'a, T> {
        EdgeIterator::new(txn, dir, vid)
    }

    fn check_writable<T: KvTransaction>(&self, txn: &T) -> Result<()> {
        if txn.is_read_only() {
            return Err(GraphError::ReadOnlyTxn);
        }
        Ok(())
    }

    fn check_prop_size(&self, prop: &[u8]) -> Result<()> {
        let cap = self.opts.max_prop_size.min(MAX_PROP_SIZE);
        if prop.len() > cap {
            return Err(GraphError::InvalidArgument(format!(
                "property of {} bytes exceeds the {cap}-byte limit",
                prop.len(),
            )));
        }
        Ok(())
    }

    /// Effective split threshold. The hard cap bounds record sizes so a
    /// subsequent insertion cannot overflow the run codec's offset table.
    fn threshold(&self) -> usize {
        self.opts.split_threshold.min(MAX_SPLIT_THRESHOLD)
    }

    /// Writes `run` under its last-edge key, first peeling left halves off
    /// while it exceeds the split threshold. `old_key` is the record's key
    /// before the mutation; the record is re-keyed when the last edge
    /// changed. The run must not be empty.
    fn store_run<I: KvIterator>(
        &self,
        it: &mut I,
        kind: PackType,
        anchor: VertexId,
        old_key: Option<&[u8]>,
        mut run: EdgeValue,
    ) -> Result<()> {
        debug_assert!(!run.is_empty());
        let threshold = self.threshold();
        let needs_split = run.size() > threshold && run.count() > 1;
        if let Some(old) = old_key {
            let new_key = run_key(kind, anchor, &run);
            if !needs_split && old == &new_key[..] {
                if !it.goto_key(old) {
                    return Err(GraphError::Corruption(
                        "edge record vanished mid-operation".into(),
                    ));
                }
                return it.set_value(run.as_bytes());
            }
            if !it.goto_key(old) {
                return Err(GraphError::Corruption(
                    "edge record vanished mid-operation".into(),
                ));
            }
            it.delete_key()?;
        }
        let mut peeled = 0usize;
        while run.size() > threshold && run.count() > 1 {
            let left = run.split_even(threshold);
            it.add_key_value(&run_key(kind, anchor, &left), left.as_bytes(), true)?;
            peeled += 1;
        }
        it.add_key_value(&run_key(kind, anchor, &run), run.as_bytes(), true)?;
        if peeled > 0 {
            debug!(anchor = anchor.0, kind = ?kind, peeled, "edge run split");
        }
        Ok(())
    }

    /// Replaces a combined record, converting to the split layout when the
    /// new value exceeds the threshold.
    fn store_packed<I: KvIterator>(
        &self,
        it: &mut I,
        vid: VertexId,
        prop: &[u8],
        out_run: &EdgeValue,
        in_run: &EdgeValue,
    ) -> Result<()> {
        let packed = PackedValue::compose(prop, out_run, in_run);
        if packed.size() > self.threshold() {
            return self.unpack(it, vid, &packed);
        }
        let vkey = key::pack_vertex_key(vid);
        if !it.goto_key(&vkey) {
            return Err(GraphError::Corruption(
                "combined record vanished mid-operation".into(),
            ));
        }
        it.set_value(packed.as_bytes())
    }

    /// First split of a vertex: the combined record becomes a vertex-only
    /// record plus one record per non-empty run. Never reversed.
    fn unpack<I: KvIterator>(
        &self,
        it: &mut I,
        vid: VertexId,
        packed: &PackedValue,
    ) -> Result<()> {
        let vkey = key::pack_vertex_key(vid);
        if !it.goto_key(&vkey) {
            return Err(GraphError::Corruption(
                "combined record vanished mid-operation".into(),
            ));
        }
        it.delete_key()?;
        it.add_key_value(&key::pack_vertex_only_key(vid), packed.property(), true)?;
        let out_run = packed.out_run();
        if !out_run.is_empty() {
            self.store_run(it, PackType::OutEdge, vid, None, out_run)?;
        }
        let in_run = packed.in_run();
        if !in_run.is_empty() {
            self.store_run(it, PackType::InEdge, vid, None, in_run)?;
        }
        debug!(vid = vid.0, "combined record unpacked");
        Ok(())
    }
}

/// Anchor record of a vertex: combined while small, vertex-only after the
/// first split.
enum VertexRecord {
    Packed(PackedValue),
    Unpacked(VertexValue),
}

/// Seeks the anchor record of `vid`, leaving the cursor on it when found.
fn find_vertex<I: KvIterator>(it: &mut I, vid: VertexId) -> Result<Option<VertexRecord>> {
    if !it.goto_closest_key(&key::pack_vertex_key(vid)) {
        return Ok(None);
    }
    let Some(found) = it.key() else {
        return Ok(None);
    };
    if key::first_vid(&found) != Some(vid) {
        return Ok(None);
    }
    let value = it
        .value()
        .ok_or_else(|| GraphError::Corruption("cursor valid but valueless".into()))?;
    match key::node_kind(&found) {
        Some(PackType::PackedData) => Ok(Some(VertexRecord::Packed(PackedValue::from_bytes(
            value,
        )?))),
        Some(PackType::VertexOnly) => Ok(Some(VertexRecord::Unpacked(VertexValue::new(value)))),
        _ => Err(GraphError::Corruption(format!(
            "vertex {vid} has edge records but no anchor"
        ))),
    }
}

fn run_of(packed: &PackedValue, kind: PackType) -> EdgeValue {
    debug_assert!(kind.is_edge());
    if kind == PackType::OutEdge {
        packed.out_run()
    } else {
        packed.in_run()
    }
}

/// Key an edge-run record sorts under: its last edge.
fn run_key(kind: PackType, anchor: VertexId, run: &EdgeValue) -> KeyBuf {
    let last = run.last_edge();
    key::pack_edge_key(kind, anchor, last.lid, last.tid, last.peer, last.eid)
}

fn load_meta<I: KvIterator>(it: &mut I) -> Result<MetaRecord> {
    if !it.goto_key(META_KEY) {
        return Ok(MetaRecord::new());
    }
    let value = it
        .value()
        .ok_or_else(|| GraphError::Corruption("meta record valueless".into()))?;
    MetaRecord::from_bytes(&value)
}

fn store_meta<I: KvIterator>(it: &mut I, meta: &MetaRecord) -> Result<()> {
    it.add_key_value(META_KEY, &meta.to_bytes(), true)?;
    Ok(())
}

/// Calls `f` once per non-empty run of `(vid, kind)`, in key order, until it
/// returns `Ok(false)`. The caller has already located the anchor record.
fn walk_runs<I, F>(it: &mut I, vid: VertexId, kind: PackType, rec: &VertexRecord, mut f: F) -> Result<()>
where
    I: KvIterator,
    F: FnMut(&EdgeValue) -> Result<bool>,
{
    match rec {
        VertexRecord::Packed(p) => {
            let run = run_of(p, kind);
            if !run.is_empty() {
                f(&run)?;
            }
            Ok(())
        }
        VertexRecord::Unpacked(_) => {
            let start =
                key::pack_edge_key(kind, vid, LabelId(0), TemporalId(0), VertexId(0), crate::types::EdgeId(0));
            if !it.goto_closest_key(&start) {
                return Ok(());
            }
            loop {
                let Some(k) = it.key() else { break };
                if !key::belongs_to(&k, vid, kind) {
                    break;
                }
                let value = it
                    .value()
                    .ok_or_else(|| GraphError::Corruption("cursor valid but valueless".into()))?;
                let run = EdgeValue::from_bytes(value)?;
                if !f(&run)? {
                    break;
                }
                if !it.next() {
                    break;
                }
            }
            Ok(())
        }
    }
}
