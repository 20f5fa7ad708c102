//! Edge cursor.

use bytes::Bytes;

use crate::error::{GraphError, Result};
use crate::kv::{KvIterator, KvTransaction};
use crate::types::{EdgeId, EdgeUid, LabelId, PackType, TemporalId, VertexId};

use super::super::edge_value::{EdgeRef, EdgeValue};
use super::super::key;
use super::super::packed::PackedValue;
use super::Direction;

/// Walks one adjacency list of one vertex in `(lid, tid, peer, eid)` order,
/// transparently crossing record boundaries when the list is split.
pub struct EdgeIterator<'a, T: KvTransaction + 'a> {
    it: T::Iter<'a>,
    dir: Direction,
    anchor: VertexId,
    /// Key of the record the cursor is in; `None` inside a combined record.
    record_key: Option<Bytes>,
    run: EdgeValue,
    pos: usize,
    valid: bool,
}

impl<'a, T: KvTransaction + 'a> EdgeIterator<'a, T> {
    /// Opens an unpositioned cursor over the `dir` list of `anchor`.
    pub fn new(txn: &'a T, dir: Direction, anchor: VertexId) -> Self {
        Self {
            it: txn.iterator(),
            dir,
            anchor,
            record_key: None,
            run: EdgeValue::new(),
            pos: 0,
            valid: false,
        }
    }

    /// The anchor vertex this cursor is bound to.
    pub fn anchor(&self) -> VertexId {
        self.anchor
    }

    /// The list being walked.
    pub fn direction(&self) -> Direction {
        self.dir
    }

    /// Positions on the edge with the given identity, or with `nearest` on
    /// the smallest edge sorting at or above it. `peer` is the non-anchor
    /// endpoint. Returns validity.
    pub fn goto(
        &mut self,
        lid: LabelId,
        tid: TemporalId,
        peer: VertexId,
        eid: EdgeId,
        nearest: bool,
    ) -> Result<bool> {
        self.valid = false;
        let kind = self.dir.pack_type();
        if !self.it.goto_closest_key(&key::pack_vertex_key(self.anchor)) {
            return Ok(false);
        }
        let Some(k) = self.it.key() else {
            return Ok(false);
        };
        if key::first_vid(&k) != Some(self.anchor) {
            return Ok(false);
        }
        match key::node_kind(&k) {
            Some(PackType::PackedData) => {
                let value = self.read_value()?;
                let p = PackedValue::from_bytes(value)?;
                let run = match self.dir {
                    Direction::Out => p.out_run(),
                    Direction::In => p.in_run(),
                };
                let (pos, found) = run.search_edge(lid, tid, peer, eid);
                if found || (nearest && pos < run.count()) {
                    self.record_key = None;
                    self.run = run;
                    self.pos = pos;
                    self.valid = true;
                }
                Ok(self.valid)
            }
            Some(PackType::VertexOnly) => {
                let target = key::pack_edge_key(kind, self.anchor, lid, tid, peer, eid);
                if !self.it.goto_closest_key(&target) {
                    return Ok(false);
                }
                let Some(rk) = self.it.key() else {
                    return Ok(false);
                };
                if !key::belongs_to(&rk, self.anchor, kind) {
                    return Ok(false);
                }
                let value = self.read_value()?;
                let run = EdgeValue::from_bytes(value)?;
                let (pos, found) = run.search_edge(lid, tid, peer, eid);
                if found || nearest {
                    // a record's last edge bounds everything in it, so the
                    // insertion point always falls inside the run here
                    debug_assert!(pos < run.count());
                    self.record_key = Some(rk);
                    self.run = run;
                    self.pos = pos;
                    self.valid = true;
                }
                Ok(self.valid)
            }
            _ => Err(GraphError::Corruption(format!(
                "vertex {} has edge records but no anchor",
                self.anchor
            ))),
        }
    }

    /// Positions on the first edge of the list.
    pub fn goto_first(&mut self) -> Result<bool> {
        self.goto(LabelId(0), TemporalId(0), VertexId(0), EdgeId(0), true)
    }

    /// Moves to the next edge, crossing into the next record when this one
    /// is exhausted.
    pub fn next(&mut self) -> Result<bool> {
        if !self.valid {
            return Ok(false);
        }
        if self.pos + 1 < self.run.count() {
            self.pos += 1;
            return Ok(true);
        }
        let Some(rk) = self.record_key.clone() else {
            // a combined record holds the whole list
            self.valid = false;
            return Ok(false);
        };
        if !self.it.goto_key(&rk) {
            return Err(GraphError::Corruption(
                "edge cursor record vanished; refresh required".into(),
            ));
        }
        if !self.it.next() {
            self.valid = false;
            return Ok(false);
        }
        let Some(k) = self.it.key() else {
            self.valid = false;
            return Ok(false);
        };
        if !key::belongs_to(&k, self.anchor, self.dir.pack_type()) {
            self.valid = false;
            return Ok(false);
        }
        let value = self.read_value()?;
        self.run = EdgeValue::from_bytes(value)?;
        self.record_key = Some(k);
        self.pos = 0;
        Ok(true)
    }

    /// Moves to the previous edge if one exists; otherwise keeps the current
    /// position and returns `false`.
    pub fn try_prev(&mut self) -> Result<bool> {
        if !self.valid {
            return Ok(false);
        }
        if self.pos > 0 {
            self.pos -= 1;
            return Ok(true);
        }
        let Some(rk) = self.record_key.clone() else {
            return Ok(false);
        };
        if !self.it.goto_key(&rk) {
            return Err(GraphError::Corruption(
                "edge cursor record vanished; refresh required".into(),
            ));
        }
        if !self.it.prev() {
            return Ok(false);
        }
        let Some(k) = self.it.key() else {
            return Ok(false);
        };
        if !key::belongs_to(&k, self.anchor, self.dir.pack_type()) {
            return Ok(false);
        }
        let value = self.read_value()?;
        let run = EdgeValue::from_bytes(value)?;
        self.pos = run.count() - 1;
        self.run = run;
        self.record_key = Some(k);
        Ok(true)
    }

    /// Moves to the previous edge, going invalid past the front of the list.
    /// [`EdgeIterator::try_prev`] is the position-preserving variant.
    pub fn prev(&mut self) -> Result<bool> {
        if self.try_prev()? {
            return Ok(true);
        }
        self.valid = false;
        Ok(false)
    }

    /// True while positioned on an edge.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The edge under the cursor.
    pub fn edge(&self) -> Option<EdgeRef<'_>> {
        self.valid.then(|| self.run.edge(self.pos))
    }

    /// Full identity of the edge under the cursor, with src and dst oriented
    /// by the cursor direction.
    pub fn uid(&self) -> Option<EdgeUid> {
        let e = self.edge()?;
        Some(match self.dir {
            Direction::Out => EdgeUid::new(self.anchor, e.peer, e.lid, e.tid, e.eid),
            Direction::In => EdgeUid::new(e.peer, self.anchor, e.lid, e.tid, e.eid),
        })
    }

    /// Property of the edge under the cursor.
    pub fn property(&self) -> Option<Bytes> {
        self.edge().map(|e| Bytes::copy_from_slice(e.prop))
    }

    /// When a sibling cursor mutated the transaction, re-seeks the logical
    /// position: the same edge if it survived splits and re-keying, else the
    /// nearest edge above it. Returns validity.
    pub fn refresh_if_underlying_modified(&mut self) -> Result<bool> {
        if !self.it.underlying_modified() {
            return Ok(self.valid);
        }
        self.it.refresh_after_modify();
        if !self.valid {
            return Ok(false);
        }
        let (lid, tid, peer, eid) = self.run.edge(self.pos).quad();
        self.goto(lid, tid, peer, eid, true)
    }

    fn read_value(&self) -> Result<Bytes> {
        self.it
            .value()
            .ok_or_else(|| GraphError::Corruption("cursor valid but valueless".into()))
    }
}
