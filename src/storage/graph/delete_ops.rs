//! Vertex deletion with edge cascade.

use bytes::Bytes;
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::kv::{KvIterator, KvTransaction};
use crate::types::{EdgeId, LabelId, PackType, TemporalId, VertexId};

use super::super::edge_value::EdgeValue;
use super::super::key;
use super::super::packed::PackedValue;
use super::{find_vertex, load_meta, store_meta, Graph};

type EdgeEntry = (LabelId, TemporalId, VertexId, EdgeId);

impl Graph {
    /// Deletes `vid`, all of its records, and every reciprocal entry its
    /// edges left at other vertices. Returns `false` when the vertex does
    /// not exist.
    ///
    /// `on_edge` is invoked once per non-empty run being discarded, before
    /// any mutation, so callers can tear down secondary structures keyed by
    /// edge data.
    pub fn delete_vertex<T: KvTransaction>(
        &self,
        txn: &T,
        vid: VertexId,
        mut on_edge: Option<&mut dyn FnMut(PackType, &EdgeValue)>,
    ) -> Result<bool> {
        self.check_writable(txn)?;
        let mut it = txn.iterator();
        if find_vertex(&mut it, vid)?.is_none() {
            return Ok(false);
        }

        // the cursor sits on the anchor; sweep every record of the vertex
        // into memory before mutating anything
        let mut records: Vec<(Bytes, PackType, Bytes)> = Vec::new();
        loop {
            let Some(k) = it.key() else { break };
            if key::first_vid(&k) != Some(vid) {
                break;
            }
            let Some(kind) = key::node_kind(&k) else {
                return Err(GraphError::Corruption(format!(
                    "foreign key inside the range of vertex {vid}"
                )));
            };
            let value = it
                .value()
                .ok_or_else(|| GraphError::Corruption("cursor valid but valueless".into()))?;
            records.push((k, kind, value));
            if !it.next() {
                break;
            }
        }

        let mut out_edges: Vec<EdgeEntry> = Vec::new();
        let mut in_edges: Vec<EdgeEntry> = Vec::new();
        for (_, kind, value) in &records {
            match kind {
                PackType::PackedData => {
                    let p = PackedValue::from_bytes(value.clone())?;
                    for (k, run) in [
                        (PackType::OutEdge, p.out_run()),
                        (PackType::InEdge, p.in_run()),
                    ] {
                        if run.is_empty() {
                            continue;
                        }
                        if let Some(cb) = on_edge.as_mut() {
                            cb(k, &run);
                        }
                        collect(&run, pick(k, &mut out_edges, &mut in_edges));
                    }
                }
                PackType::VertexOnly => {}
                PackType::OutEdge | PackType::InEdge => {
                    let run = EdgeValue::from_bytes(value.clone())?;
                    if let Some(cb) = on_edge.as_mut() {
                        cb(*kind, &run);
                    }
                    collect(&run, pick(*kind, &mut out_edges, &mut in_edges));
                }
            }
        }

        for (k, _, _) in &records {
            if !it.goto_key(k) {
                return Err(GraphError::Corruption(
                    "vertex record vanished mid-delete".into(),
                ));
            }
            it.delete_key()?;
        }

        // unhook reciprocal entries at the peers; a self-loop's reciprocal
        // lived in the records deleted above
        let mut meta = load_meta(&mut it)?;
        for &(lid, tid, peer, eid) in &out_edges {
            meta.decr_label(lid)?;
            if peer == vid {
                continue;
            }
            if !self.remove_edge_one_side(&mut it, PackType::InEdge, peer, lid, tid, vid, eid)? {
                return Err(GraphError::Corruption(format!(
                    "in-side entry missing at vertex {peer} while deleting {vid}"
                )));
            }
        }
        for &(lid, tid, peer, eid) in &in_edges {
            if peer == vid {
                // already counted on the out pass
                continue;
            }
            meta.decr_label(lid)?;
            if !self.remove_edge_one_side(&mut it, PackType::OutEdge, peer, lid, tid, vid, eid)? {
                return Err(GraphError::Corruption(format!(
                    "out-side entry missing at vertex {peer} while deleting {vid}"
                )));
            }
        }
        store_meta(&mut it, &meta)?;
        debug!(
            vid = vid.0,
            out_edges = out_edges.len(),
            in_edges = in_edges.len(),
            "vertex deleted"
        );
        Ok(true)
    }
}

fn pick<'a>(
    kind: PackType,
    out_edges: &'a mut Vec<EdgeEntry>,
    in_edges: &'a mut Vec<EdgeEntry>,
) -> &'a mut Vec<EdgeEntry> {
    if kind == PackType::OutEdge {
        out_edges
    } else {
        in_edges
    }
}

fn collect(run: &EdgeValue, into: &mut Vec<EdgeEntry>) {
    for i in 0..run.count() {
        let e = run.edge(i);
        into.push((e.lid, e.tid, e.peer, e.eid));
    }
}
