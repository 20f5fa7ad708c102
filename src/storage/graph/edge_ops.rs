//! Edge CRUD.
//!
//! Every logical edge is stored twice: in the out-run of its source and in
//! the in-run of its destination, property included. The out-side insertion
//! allocates the edge id; the in-side mirrors it.

use bytes::Bytes;
use tracing::trace;

use crate::error::{GraphError, Result};
use crate::kv::{KvIterator, KvTransaction};
use crate::types::{EdgeId, EdgeUid, LabelId, PackType, TemporalId, VertexId, MAX_EID, MAX_VID};

use super::super::edge_value::{EdgeValue, MAX_EDGES_PER_RUN};
use super::super::key;
use super::{find_vertex, load_meta, run_key, run_of, store_meta, Graph, VertexRecord};

impl Graph {
    /// Inserts an edge `src -[lid:tid]-> dst` carrying `prop` and returns its
    /// full identity. The edge id is the smallest unused id in the
    /// `(src, lid, tid, dst)` group, so parallel edges number 0, 1, 2, ...
    /// Both endpoints must already exist.
    pub fn add_edge<T: KvTransaction>(
        &self,
        txn: &T,
        src: VertexId,
        dst: VertexId,
        lid: LabelId,
        tid: TemporalId,
        prop: &[u8],
    ) -> Result<EdgeUid> {
        self.check_writable(txn)?;
        self.check_prop_size(prop)?;
        if src.0 > MAX_VID || dst.0 > MAX_VID {
            return Err(GraphError::InvalidArgument(format!(
                "vertex id out of range: {} -> {}",
                src.0, dst.0
            )));
        }
        let mut it = txn.iterator();
        if find_vertex(&mut it, src)?.is_none() {
            return Err(GraphError::NotFound("source vertex"));
        }
        if find_vertex(&mut it, dst)?.is_none() {
            return Err(GraphError::NotFound("destination vertex"));
        }
        let eid = self.insert_edge_one_side(&mut it, PackType::OutEdge, src, lid, tid, dst, None, prop)?;
        self.insert_edge_one_side(&mut it, PackType::InEdge, dst, lid, tid, src, Some(eid), prop)?;
        let mut meta = load_meta(&mut it)?;
        meta.incr_label(lid);
        store_meta(&mut it, &meta)?;
        let uid = EdgeUid::new(src, dst, lid, tid, eid);
        trace!(%uid, prop_len = prop.len(), "edge added");
        Ok(uid)
    }

    /// Removes the edge. Returns `false` when it does not exist; a present
    /// out-entry with no reciprocal in-entry is corruption.
    pub fn delete_edge<T: KvTransaction>(&self, txn: &T, uid: &EdgeUid) -> Result<bool> {
        self.check_writable(txn)?;
        let mut it = txn.iterator();
        if !self.remove_edge_one_side(
            &mut it,
            PackType::OutEdge,
            uid.src,
            uid.lid,
            uid.tid,
            uid.dst,
            uid.eid,
        )? {
            return Ok(false);
        }
        if !self.remove_edge_one_side(
            &mut it,
            PackType::InEdge,
            uid.dst,
            uid.lid,
            uid.tid,
            uid.src,
            uid.eid,
        )? {
            return Err(GraphError::Corruption(format!(
                "edge {uid} lost its in-side entry"
            )));
        }
        let mut meta = load_meta(&mut it)?;
        meta.decr_label(uid.lid)?;
        store_meta(&mut it, &meta)?;
        trace!(%uid, "edge deleted");
        Ok(true)
    }

    /// Property of the edge, or `None` when it does not exist. Both sides
    /// carry the same bytes; this reads the out side.
    pub fn get_edge_property<T: KvTransaction>(
        &self,
        txn: &T,
        uid: &EdgeUid,
    ) -> Result<Option<Bytes>> {
        let mut it = txn.iterator();
        let found = self.locate_edge(&mut it, PackType::OutEdge, uid.src, uid.lid, uid.tid, uid.dst, uid.eid)?;
        Ok(found.map(|(run, pos)| Bytes::copy_from_slice(run.edge(pos).prop)))
    }

    /// Replaces the edge's property on both sides. Returns `false` when the
    /// edge does not exist.
    pub fn set_edge_property<T: KvTransaction>(
        &self,
        txn: &T,
        uid: &EdgeUid,
        prop: &[u8],
    ) -> Result<bool> {
        self.check_writable(txn)?;
        self.check_prop_size(prop)?;
        let mut it = txn.iterator();
        if !self.update_edge_one_side(
            &mut it,
            PackType::OutEdge,
            uid.src,
            uid.lid,
            uid.tid,
            uid.dst,
            uid.eid,
            prop,
        )? {
            return Ok(false);
        }
        if !self.update_edge_one_side(
            &mut it,
            PackType::InEdge,
            uid.dst,
            uid.lid,
            uid.tid,
            uid.src,
            uid.eid,
            prop,
        )? {
            return Err(GraphError::Corruption(format!(
                "edge {uid} lost its in-side entry"
            )));
        }
        Ok(true)
    }

    /// Inserts one directed entry. With `assigned == None` the edge id is
    /// allocated here; `Some(eid)` mirrors an id the out side already chose.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn insert_edge_one_side<I: KvIterator>(
        &self,
        it: &mut I,
        kind: PackType,
        anchor: VertexId,
        lid: LabelId,
        tid: TemporalId,
        peer: VertexId,
        assigned: Option<EdgeId>,
        prop: &[u8],
    ) -> Result<EdgeId> {
        loop {
            match find_vertex(it, anchor)? {
                None => return Err(GraphError::NotFound("vertex")),
                Some(VertexRecord::Packed(p)) => {
                    let mut out_run = p.out_run();
                    let mut in_run = p.in_run();
                    let run = if kind == PackType::OutEdge {
                        &mut out_run
                    } else {
                        &mut in_run
                    };
                    if run.count() == MAX_EDGES_PER_RUN {
                        // no room left in the embedded run; go to split layout
                        self.unpack(it, anchor, &p)?;
                        continue;
                    }
                    let (pos, eid) = match assigned {
                        Some(eid) => {
                            let (pos, found) = run.search_edge(lid, tid, peer, eid);
                            if found {
                                return Err(GraphError::Corruption(
                                    "mirrored edge entry already present".into(),
                                ));
                            }
                            (pos, eid)
                        }
                        None => {
                            // a combined record holds the whole adjacency, so
                            // the run alone decides the next id in the group
                            let (pos, _) = run.search_edge(lid, tid, peer, EdgeId(u32::MAX));
                            (pos, run.next_eid_at(pos, lid, tid, peer))
                        }
                    };
                    self.check_eid(eid)?;
                    run.insert_at(pos, lid, tid, peer, eid, prop);
                    self.store_packed(it, anchor, p.property(), &out_run, &in_run)?;
                    return Ok(eid);
                }
                Some(VertexRecord::Unpacked(_)) => {
                    let seek_eid = assigned.unwrap_or(EdgeId(u32::MAX));
                    let target = key::pack_edge_key(kind, anchor, lid, tid, peer, seek_eid);
                    let landed = it.goto_closest_key(&target);
                    let covering = landed
                        .then(|| it.key())
                        .flatten()
                        .filter(|k| key::belongs_to(k, anchor, kind));

                    if let Some(rkey) = covering {
                        // the record whose last edge is >= the new edge
                        let mut run = read_run(it)?;
                        if run.count() == MAX_EDGES_PER_RUN {
                            self.make_room(it, kind, anchor, &rkey, run)?;
                            continue;
                        }
                        let (pos, eid) = match assigned {
                            Some(eid) => {
                                let (pos, found) = run.search_edge(lid, tid, peer, eid);
                                if found {
                                    return Err(GraphError::Corruption(
                                        "mirrored edge entry already present".into(),
                                    ));
                                }
                                (pos, eid)
                            }
                            None => {
                                let (pos, _) = run.search_edge(lid, tid, peer, EdgeId(u32::MAX));
                                let eid = if pos == 0 {
                                    // the group may continue from the record
                                    // before this one
                                    eid_after_prev_record(it, &rkey, kind, anchor, lid, tid, peer)?
                                } else {
                                    run.next_eid_at(pos, lid, tid, peer)
                                };
                                (pos, eid)
                            }
                        };
                        self.check_eid(eid)?;
                        run.insert_at(pos, lid, tid, peer, eid, prop);
                        self.store_run(it, kind, anchor, Some(&rkey), run)?;
                        return Ok(eid);
                    }

                    // the new edge sorts past every record of this kind, or
                    // no such record exists; the preceding key tells which
                    let has_prev = if landed { it.prev() } else { it.goto_last_key() };
                    let prev_key = has_prev.then(|| it.key()).flatten();
                    let Some(rkey) = prev_key.filter(|k| key::belongs_to(k, anchor, kind)) else {
                        // first record of this kind for the anchor
                        let eid = assigned.unwrap_or(EdgeId(0));
                        self.check_eid(eid)?;
                        let mut run = EdgeValue::new();
                        run.insert_at(0, lid, tid, peer, eid, prop);
                        self.store_run(it, kind, anchor, None, run)?;
                        return Ok(eid);
                    };
                    // append to the tail record and re-key it
                    let mut run = read_run(it)?;
                    if run.count() == MAX_EDGES_PER_RUN {
                        self.make_room(it, kind, anchor, &rkey, run)?;
                        continue;
                    }
                    let pos = run.count();
                    let eid = match assigned {
                        Some(eid) => eid,
                        None => run.next_eid_at(pos, lid, tid, peer),
                    };
                    self.check_eid(eid)?;
                    run.insert_at(pos, lid, tid, peer, eid, prop);
                    self.store_run(it, kind, anchor, Some(&rkey), run)?;
                    return Ok(eid);
                }
            }
        }
    }

    /// Splits a full record in place so a retried lookup finds room.
    fn make_room<I: KvIterator>(
        &self,
        it: &mut I,
        kind: PackType,
        anchor: VertexId,
        rkey: &[u8],
        mut run: EdgeValue,
    ) -> Result<()> {
        let left = run.split_even(self.threshold());
        it.add_key_value(&run_key(kind, anchor, &left), left.as_bytes(), true)?;
        if !it.goto_key(rkey) {
            return Err(GraphError::Corruption(
                "edge record vanished mid-operation".into(),
            ));
        }
        it.set_value(run.as_bytes())
    }

    /// Removes one directed entry. `Ok(false)` when it is not present.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn remove_edge_one_side<I: KvIterator>(
        &self,
        it: &mut I,
        kind: PackType,
        anchor: VertexId,
        lid: LabelId,
        tid: TemporalId,
        peer: VertexId,
        eid: EdgeId,
    ) -> Result<bool> {
        match find_vertex(it, anchor)? {
            None => Ok(false),
            Some(VertexRecord::Packed(p)) => {
                let mut out_run = p.out_run();
                let mut in_run = p.in_run();
                let run = if kind == PackType::OutEdge {
                    &mut out_run
                } else {
                    &mut in_run
                };
                let (pos, found) = run.search_edge(lid, tid, peer, eid);
                if !found {
                    return Ok(false);
                }
                run.delete_at(pos);
                self.store_packed(it, anchor, p.property(), &out_run, &in_run)?;
                Ok(true)
            }
            Some(VertexRecord::Unpacked(_)) => {
                let target = key::pack_edge_key(kind, anchor, lid, tid, peer, eid);
                if !it.goto_closest_key(&target) {
                    return Ok(false);
                }
                let Some(rkey) = it.key() else {
                    return Ok(false);
                };
                if !key::belongs_to(&rkey, anchor, kind) {
                    return Ok(false);
                }
                let mut run = read_run(it)?;
                let (pos, found) = run.search_edge(lid, tid, peer, eid);
                if !found {
                    return Ok(false);
                }
                run.delete_at(pos);
                if run.is_empty() {
                    // drop the record; neighbors are never merged back
                    it.delete_key()?;
                } else {
                    self.store_run(it, kind, anchor, Some(&rkey), run)?;
                }
                Ok(true)
            }
        }
    }

    /// Updates the property of one directed entry. `Ok(false)` when absent.
    #[allow(clippy::too_many_arguments)]
    fn update_edge_one_side<I: KvIterator>(
        &self,
        it: &mut I,
        kind: PackType,
        anchor: VertexId,
        lid: LabelId,
        tid: TemporalId,
        peer: VertexId,
        eid: EdgeId,
        prop: &[u8],
    ) -> Result<bool> {
        match find_vertex(it, anchor)? {
            None => Ok(false),
            Some(VertexRecord::Packed(p)) => {
                let mut out_run = p.out_run();
                let mut in_run = p.in_run();
                let run = if kind == PackType::OutEdge {
                    &mut out_run
                } else {
                    &mut in_run
                };
                let (pos, found) = run.search_edge(lid, tid, peer, eid);
                if !found {
                    return Ok(false);
                }
                run.update_at(pos, prop);
                self.store_packed(it, anchor, p.property(), &out_run, &in_run)?;
                Ok(true)
            }
            Some(VertexRecord::Unpacked(_)) => {
                let target = key::pack_edge_key(kind, anchor, lid, tid, peer, eid);
                if !it.goto_closest_key(&target) {
                    return Ok(false);
                }
                let Some(rkey) = it.key() else {
                    return Ok(false);
                };
                if !key::belongs_to(&rkey, anchor, kind) {
                    return Ok(false);
                }
                let mut run = read_run(it)?;
                let (pos, found) = run.search_edge(lid, tid, peer, eid);
                if !found {
                    return Ok(false);
                }
                run.update_at(pos, prop);
                self.store_run(it, kind, anchor, Some(&rkey), run)?;
                Ok(true)
            }
        }
    }

    /// Read-only lookup of one directed entry: the run holding it plus the
    /// position inside that run.
    #[allow(clippy::too_many_arguments)]
    fn locate_edge<I: KvIterator>(
        &self,
        it: &mut I,
        kind: PackType,
        anchor: VertexId,
        lid: LabelId,
        tid: TemporalId,
        peer: VertexId,
        eid: EdgeId,
    ) -> Result<Option<(EdgeValue, usize)>> {
        match find_vertex(it, anchor)? {
            None => Ok(None),
            Some(VertexRecord::Packed(p)) => {
                let run = run_of(&p, kind);
                let (pos, found) = run.search_edge(lid, tid, peer, eid);
                Ok(found.then_some((run, pos)))
            }
            Some(VertexRecord::Unpacked(_)) => {
                let target = key::pack_edge_key(kind, anchor, lid, tid, peer, eid);
                if !it.goto_closest_key(&target) {
                    return Ok(None);
                }
                let Some(rkey) = it.key() else {
                    return Ok(None);
                };
                if !key::belongs_to(&rkey, anchor, kind) {
                    return Ok(None);
                }
                let run = read_run(it)?;
                let (pos, found) = run.search_edge(lid, tid, peer, eid);
                Ok(found.then_some((run, pos)))
            }
        }
    }
}

impl Graph {
    fn check_eid(&self, eid: EdgeId) -> Result<()> {
        if eid.0 > self.opts.max_eid.min(MAX_EID) {
            return Err(GraphError::CapacityExceeded(
                "edge id space exhausted for this (src, label, tid, dst) group",
            ));
        }
        Ok(())
    }
}

fn read_run<I: KvIterator>(it: &mut I) -> Result<EdgeValue> {
    let value = it
        .value()
        .ok_or_else(|| GraphError::Corruption("cursor valid but valueless".into()))?;
    EdgeValue::from_bytes(value)
}

/// Next edge id when inserting at the front of a record: the group may
/// straddle a record boundary, so the last edge of the previous sibling
/// record decides.
fn eid_after_prev_record<I: KvIterator>(
    it: &mut I,
    rkey: &[u8],
    kind: PackType,
    anchor: VertexId,
    lid: LabelId,
    tid: TemporalId,
    peer: VertexId,
) -> Result<EdgeId> {
    if !it.goto_key(rkey) {
        return Err(GraphError::Corruption(
            "edge record vanished mid-operation".into(),
        ));
    }
    if !it.prev() {
        return Ok(EdgeId(0));
    }
    let Some(k) = it.key() else {
        return Ok(EdgeId(0));
    };
    if !key::belongs_to(&k, anchor, kind) {
        return Ok(EdgeId(0));
    }
    let run = read_run(it)?;
    let last = run.last_edge();
    if (last.lid, last.tid, last.peer) == (lid, tid, peer) {
        Ok(EdgeId(last.eid.0 + 1))
    } else {
        Ok(EdgeId(0))
    }
}
