//! Degree counts and neighbor listings.
//!
//! Both read only the run structure: degree counting sums count bytes
//! without decoding edges, and neighbor listing decodes peers but never
//! properties.

use crate::error::{GraphError, Result};
use crate::kv::{KvIterator, KvTransaction};
use crate::types::{EdgeId, LabelId, PackType, TemporalId, VertexId};

use super::super::edge_value::EdgeValue;
use super::super::key;
use super::super::{PeerCursor, PeerPage};
use super::{find_vertex, run_of, walk_runs, Graph, VertexRecord};

impl Graph {
    /// Number of outgoing edges of `vid`, or `None` when the vertex does not
    /// exist. With a limit, counting stops early: `(limit, true)` means at
    /// least `limit + 1` edges exist.
    pub fn num_out_edges<T: KvTransaction>(
        &self,
        txn: &T,
        vid: VertexId,
        limit: Option<u64>,
    ) -> Result<Option<(u64, bool)>> {
        self.count_edges(txn, vid, PackType::OutEdge, limit)
    }

    /// Incoming-edge counterpart of [`Graph::num_out_edges`].
    pub fn num_in_edges<T: KvTransaction>(
        &self,
        txn: &T,
        vid: VertexId,
        limit: Option<u64>,
    ) -> Result<Option<(u64, bool)>> {
        self.count_edges(txn, vid, PackType::InEdge, limit)
    }

    fn count_edges<T: KvTransaction>(
        &self,
        txn: &T,
        vid: VertexId,
        kind: PackType,
        limit: Option<u64>,
    ) -> Result<Option<(u64, bool)>> {
        let mut it = txn.iterator();
        let Some(rec) = find_vertex(&mut it, vid)? else {
            return Ok(None);
        };
        let mut total = 0u64;
        let mut truncated = false;
        walk_runs(&mut it, vid, kind, &rec, |run| {
            total += run.count() as u64;
            if let Some(l) = limit {
                if total > l {
                    total = l;
                    truncated = true;
                    return Ok(false);
                }
            }
            Ok(true)
        })?;
        Ok(Some((total, truncated)))
    }

    /// One page of up to `limit` distinct outgoing neighbors of `vid`, or
    /// `None` when the vertex does not exist. Pass `resume = None` for the
    /// first page and the previous page's [`PeerPage::next`] afterwards.
    /// Consecutive entries with the same peer (parallel edges of one group)
    /// are reported once; a neighbor whose edges are not adjacent in sort
    /// order can repeat.
    pub fn list_dst_vids<T: KvTransaction>(
        &self,
        txn: &T,
        vid: VertexId,
        resume: Option<PeerCursor>,
        limit: usize,
    ) -> Result<Option<PeerPage>> {
        self.list_peers(txn, vid, PackType::OutEdge, resume, limit)
    }

    /// Source counterpart of [`Graph::list_dst_vids`].
    pub fn list_src_vids<T: KvTransaction>(
        &self,
        txn: &T,
        vid: VertexId,
        resume: Option<PeerCursor>,
        limit: usize,
    ) -> Result<Option<PeerPage>> {
        self.list_peers(txn, vid, PackType::InEdge, resume, limit)
    }

    fn list_peers<T: KvTransaction>(
        &self,
        txn: &T,
        vid: VertexId,
        kind: PackType,
        resume: Option<PeerCursor>,
        limit: usize,
    ) -> Result<Option<PeerPage>> {
        let limit = limit.max(1);
        let mut it = txn.iterator();
        let Some(rec) = find_vertex(&mut it, vid)? else {
            return Ok(None);
        };
        let mut state = PageState {
            page: PeerPage::default(),
            consumed: resume,
            limit,
        };
        match rec {
            VertexRecord::Packed(p) => {
                let run = run_of(&p, kind);
                state.collect(&run, start_pos(&run, resume));
            }
            VertexRecord::Unpacked(_) => {
                // seek straight to the record covering the resume position
                let target = match resume {
                    Some(c) => key::pack_edge_key(kind, vid, c.lid, c.tid, c.peer, c.eid),
                    None => key::pack_edge_key(
                        kind,
                        vid,
                        LabelId(0),
                        TemporalId(0),
                        VertexId(0),
                        EdgeId(0),
                    ),
                };
                if !it.goto_closest_key(&target) {
                    return Ok(Some(state.page));
                }
                let mut first = true;
                loop {
                    let Some(k) = it.key() else { break };
                    if !key::belongs_to(&k, vid, kind) {
                        break;
                    }
                    let value = it.value().ok_or_else(|| {
                        GraphError::Corruption("cursor valid but valueless".into())
                    })?;
                    let run = EdgeValue::from_bytes(value)?;
                    let start = if first { start_pos(&run, resume) } else { 0 };
                    first = false;
                    if !state.collect(&run, start) {
                        break;
                    }
                    if !it.next() {
                        break;
                    }
                }
            }
        }
        Ok(Some(state.page))
    }
}

/// First unconsumed position in a run: just past the resume edge when the
/// cursor points into this run.
fn start_pos(run: &EdgeValue, resume: Option<PeerCursor>) -> usize {
    match resume {
        None => 0,
        Some(c) => {
            let (pos, found) = run.search_edge(c.lid, c.tid, c.peer, c.eid);
            pos + usize::from(found)
        }
    }
}

struct PageState {
    page: PeerPage,
    /// Scan position of the last edge consumed, full or not.
    consumed: Option<PeerCursor>,
    limit: usize,
}

impl PageState {
    /// Folds `run[start..]` into the page. Returns `false` once the page is
    /// full, leaving `page.next` at the last consumed edge.
    fn collect(&mut self, run: &EdgeValue, start: usize) -> bool {
        for i in start..run.count() {
            let e = run.edge(i);
            let at = PeerCursor {
                lid: e.lid,
                tid: e.tid,
                peer: e.peer,
                eid: e.eid,
            };
            if self.page.vids.last() == Some(&e.peer) {
                self.consumed = Some(at);
                continue;
            }
            if self.page.vids.len() == self.limit {
                self.page.next = self.consumed;
                return false;
            }
            self.page.vids.push(e.peer);
            self.consumed = Some(at);
        }
        true
    }
}
