//! Edge-run codec.
//!
//! One run holds a sorted sequence of edges sharing an anchor vertex, packed
//! into a single value:
//!
//! ```text
//! [1B count][3B offset x (count-1)][edge #0][edge #1]...
//! ```
//!
//! Offsets are relative to the start of the edge-body region and give the
//! first byte of edge #i for i >= 1 (edge #0 starts at the region start), so
//! entries before an insertion point keep their stored values when the table
//! grows. Each edge is:
//!
//! ```text
//! [1B sizes][0-2B lid][0|8B tid][0-5B peer vid][0-3B eid][property bytes]
//! ```
//!
//! The sizes byte packs four bit-fields, MSB first: bits 7..6 lid byte count,
//! bit 5 tid present, bits 4..2 peer-vid byte count, bits 1..0 eid byte
//! count. Every integer field is written big-endian in the minimum number of
//! bytes it needs; the property length is implied by the edge extent.
//!
//! All mutation is copy-on-write: the whole value is rebuilt and replaces the
//! old buffer, matching how the backing store treats values.

use bytes::{BufMut, Bytes, BytesMut};
use smallvec::SmallVec;

use crate::error::{GraphError, Result};
use crate::types::{EdgeId, LabelId, TemporalId, VertexId};

const OFFSET_LEN: usize = 3;

/// Largest body offset the 3-byte table entries can address.
const MAX_BODY_OFFSET: usize = (1 << 24) - 1;

/// The count byte caps a run at this many entries; the store splits a run
/// that reaches the cap even when it is under the byte threshold.
pub const MAX_EDGES_PER_RUN: usize = u8::MAX as usize;

/// Minimum bytes needed to represent `x` big-endian; zero needs none.
pub fn needed_bytes(x: u64) -> usize {
    (64 - x.leading_zeros() as usize).div_ceil(8)
}

fn header_len(count: usize) -> usize {
    1 + OFFSET_LEN * count.saturating_sub(1)
}

fn read_uint_be(bytes: &[u8]) -> u64 {
    let mut v = 0u64;
    for &b in bytes {
        v = (v << 8) | u64::from(b);
    }
    v
}

fn put_uint_be(buf: &mut impl Extend<u8>, value: u64, len: usize) {
    buf.extend(value.to_be_bytes()[8 - len..].iter().copied());
}

/// One decoded edge, borrowing its property bytes from the run.
#[derive(Copy, Clone, Debug)]
pub struct EdgeRef<'a> {
    /// Edge label.
    pub lid: LabelId,
    /// Temporal ordering field.
    pub tid: TemporalId,
    /// The other endpoint.
    pub peer: VertexId,
    /// Per-group sequence number.
    pub eid: EdgeId,
    /// Opaque property bytes.
    pub prop: &'a [u8],
}

impl EdgeRef<'_> {
    /// Sort tuple of this edge.
    pub fn quad(&self) -> (LabelId, TemporalId, VertexId, EdgeId) {
        (self.lid, self.tid, self.peer, self.eid)
    }
}

fn encode_fields(
    lid: LabelId,
    tid: TemporalId,
    peer: VertexId,
    eid: EdgeId,
) -> SmallVec<[u8; 19]> {
    let lid_len = needed_bytes(u64::from(lid.0));
    let tid_present = tid.0 != 0;
    let vid_len = needed_bytes(peer.0);
    let eid_len = needed_bytes(u64::from(eid.0));
    debug_assert!(vid_len <= 5, "peer vid exceeds 40 bits");
    debug_assert!(eid_len <= 3, "eid exceeds 24 bits");

    let mut out = SmallVec::new();
    out.push(
        ((lid_len as u8) << 6)
            | (u8::from(tid_present) << 5)
            | ((vid_len as u8) << 2)
            | (eid_len as u8),
    );
    put_uint_be(&mut out, u64::from(lid.0), lid_len);
    if tid_present {
        put_uint_be(&mut out, tid.0, 8);
    }
    put_uint_be(&mut out, peer.0, vid_len);
    put_uint_be(&mut out, u64::from(eid.0), eid_len);
    out
}

struct FieldLens {
    lid: usize,
    tid: usize,
    vid: usize,
    eid: usize,
}

impl FieldLens {
    fn unpack(sizes: u8) -> Result<Self> {
        let lens = Self {
            lid: usize::from(sizes >> 6),
            tid: if sizes & 0b10_0000 != 0 { 8 } else { 0 },
            vid: usize::from((sizes >> 2) & 0b111),
            eid: usize::from(sizes & 0b11),
        };
        if lens.vid > 5 {
            return Err(GraphError::Corruption(format!(
                "size indicator 0x{sizes:02X} claims a {}-byte vid",
                lens.vid
            )));
        }
        Ok(lens)
    }

    fn total(&self) -> usize {
        1 + self.lid + self.tid + self.vid + self.eid
    }
}

/// A sorted, offset-indexed run of edges sharing an anchor vertex.
#[derive(Clone, Debug)]
pub struct EdgeValue {
    buf: Bytes,
}

impl Default for EdgeValue {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeValue {
    /// Creates an empty run (a single `count = 0` byte).
    pub fn new() -> Self {
        Self {
            buf: Bytes::from_static(&[0u8]),
        }
    }

    /// Parses and fully validates a serialized run. After this succeeds the
    /// accessors below are infallible.
    pub fn from_bytes(buf: Bytes) -> Result<Self> {
        if buf.is_empty() {
            return Err(GraphError::Corruption("edge run shorter than count byte".into()));
        }
        let count = usize::from(buf[0]);
        let header = header_len(count);
        if buf.len() < header {
            return Err(GraphError::Corruption(
                "edge run offset table truncated".into(),
            ));
        }
        if count == 0 {
            if buf.len() != 1 {
                return Err(GraphError::Corruption(
                    "empty edge run carries trailing bytes".into(),
                ));
            }
            return Ok(Self { buf });
        }
        let body_len = buf.len() - header;
        let run = Self { buf };
        let mut prev_start = 0usize;
        for i in 0..count {
            let start = run.rel_start(i);
            if i > 0 && start <= prev_start {
                return Err(GraphError::Corruption(
                    "edge run offsets not strictly increasing".into(),
                ));
            }
            prev_start = start;
            let end = if i + 1 < count {
                run.rel_start(i + 1)
            } else {
                body_len
            };
            if end > body_len || start >= end {
                return Err(GraphError::Corruption("edge extent out of bounds".into()));
            }
            let body = &run.buf[header + start..header + end];
            let lens = FieldLens::unpack(body[0])?;
            if lens.total() > body.len() {
                return Err(GraphError::Corruption(
                    "edge fields overrun their extent".into(),
                ));
            }
        }
        Ok(run)
    }

    /// Number of edges in the run.
    pub fn count(&self) -> usize {
        usize::from(self.buf[0])
    }

    /// True when the run holds no edges.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Serialized size in bytes.
    pub fn size(&self) -> usize {
        self.buf.len()
    }

    /// Serialized form.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Cheap handle on the serialized form.
    pub fn to_bytes(&self) -> Bytes {
        self.buf.clone()
    }

    fn rel_start(&self, i: usize) -> usize {
        if i == 0 {
            return 0;
        }
        let at = 1 + OFFSET_LEN * (i - 1);
        read_uint_be(&self.buf[at..at + OFFSET_LEN]) as usize
    }

    fn extent(&self, i: usize) -> (usize, usize) {
        debug_assert!(i < self.count());
        let header = header_len(self.count());
        let start = header + self.rel_start(i);
        let end = if i + 1 < self.count() {
            header + self.rel_start(i + 1)
        } else {
            self.buf.len()
        };
        (start, end)
    }

    fn body(&self, i: usize) -> &[u8] {
        let (start, end) = self.extent(i);
        &self.buf[start..end]
    }

    /// Decodes edge `i`. Panics on out-of-range `i`; the buffer itself was
    /// validated on construction.
    pub fn edge(&self, i: usize) -> EdgeRef<'_> {
        let body = self.body(i);
        let lens = FieldLens::unpack(body[0]).expect("run validated on construction");
        let mut at = 1;
        let lid = LabelId(read_uint_be(&body[at..at + lens.lid]) as u16);
        at += lens.lid;
        let tid = TemporalId(read_uint_be(&body[at..at + lens.tid]));
        at += lens.tid;
        let peer = VertexId(read_uint_be(&body[at..at + lens.vid]));
        at += lens.vid;
        let eid = EdgeId(read_uint_be(&body[at..at + lens.eid]) as u32);
        at += lens.eid;
        EdgeRef {
            lid,
            tid,
            peer,
            eid,
            prop: &body[at..],
        }
    }

    /// Last edge of the run. Panics when the run is empty.
    pub fn last_edge(&self) -> EdgeRef<'_> {
        self.edge(self.count() - 1)
    }

    /// Binary search for the sort tuple. Returns `(position, found)`; the
    /// position is the insertion point when not found.
    pub fn search_edge(
        &self,
        lid: LabelId,
        tid: TemporalId,
        peer: VertexId,
        eid: EdgeId,
    ) -> (usize, bool) {
        let target = (lid, tid, peer, eid);
        let mut lo = 0usize;
        let mut hi = self.count();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.edge(mid).quad().cmp(&target) {
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
                std::cmp::Ordering::Equal => return (mid, true),
            }
        }
        (lo, false)
    }

    /// Edge id a fresh insertion at `pos` should take under the dense-EID
    /// rule: continue the group of the preceding edge, or start at zero.
    pub fn next_eid_at(
        &self,
        pos: usize,
        lid: LabelId,
        tid: TemporalId,
        peer: VertexId,
    ) -> EdgeId {
        if pos == 0 {
            return EdgeId(0);
        }
        let prev = self.edge(pos - 1);
        if (prev.lid, prev.tid, prev.peer) == (lid, tid, peer) {
            EdgeId(prev.eid.0 + 1)
        } else {
            EdgeId(0)
        }
    }

    fn rebuild(pieces: &[&[u8]]) -> Bytes {
        let count = pieces.len();
        debug_assert!(count <= MAX_EDGES_PER_RUN, "run exceeds count byte");
        let body: usize = pieces.iter().map(|p| p.len()).sum();
        let mut out = BytesMut::with_capacity(header_len(count) + body);
        out.put_u8(count as u8);
        let mut off = 0usize;
        for piece in pieces.iter().take(count.saturating_sub(1)) {
            off += piece.len();
            debug_assert!(off <= MAX_BODY_OFFSET, "body offset exceeds 24 bits");
            out.put_slice(&(off as u32).to_be_bytes()[1..]);
        }
        for piece in pieces {
            out.put_slice(piece);
        }
        out.freeze()
    }

    fn pieces(&self) -> Vec<&[u8]> {
        (0..self.count()).map(|i| self.body(i)).collect()
    }

    /// Inserts an edge at `pos`, rebuilding the value. Returns the number of
    /// bytes the run grew by.
    pub fn insert_at(
        &mut self,
        pos: usize,
        lid: LabelId,
        tid: TemporalId,
        peer: VertexId,
        eid: EdgeId,
        prop: &[u8],
    ) -> usize {
        debug_assert!(pos <= self.count());
        debug_assert!(self.count() < MAX_EDGES_PER_RUN);
        let mut body: Vec<u8> = encode_fields(lid, tid, peer, eid).to_vec();
        body.extend_from_slice(prop);
        let mut pieces = self.pieces();
        pieces.insert(pos, &body);
        let old = self.buf.len();
        self.buf = Self::rebuild(&pieces);
        self.buf.len() - old
    }

    /// Removes the edge at `pos`, rebuilding the value.
    pub fn delete_at(&mut self, pos: usize) {
        debug_assert!(pos < self.count());
        let mut pieces = self.pieces();
        pieces.remove(pos);
        self.buf = Self::rebuild(&pieces);
    }

    /// Replaces the property of the edge at `pos`. Overwrites in place when
    /// the length is unchanged, otherwise behaves like delete-plus-insert.
    /// Returns the signed size delta.
    pub fn update_at(&mut self, pos: usize, new_prop: &[u8]) -> isize {
        debug_assert!(pos < self.count());
        let old_len = self.buf.len();
        let (quad, prop_len) = {
            let cur = self.edge(pos);
            (cur.quad(), cur.prop.len())
        };
        if prop_len == new_prop.len() {
            let (start, end) = self.extent(pos);
            let prop_at = end - new_prop.len();
            debug_assert!(prop_at >= start);
            let mut raw = self.buf.to_vec();
            raw[prop_at..end].copy_from_slice(new_prop);
            self.buf = Bytes::from(raw);
            return 0;
        }
        let (lid, tid, peer, eid) = quad;
        self.delete_at(pos);
        self.insert_at(pos, lid, tid, peer, eid, new_prop);
        self.buf.len() as isize - old_len as isize
    }

    /// Splits off edges `[0, pos)` into a new run, keeping `[pos, count)` in
    /// `self`. `pos` must be in `1..count`.
    pub fn split_at(&mut self, pos: usize) -> EdgeValue {
        debug_assert!(pos >= 1 && pos < self.count());
        let pieces = self.pieces();
        let left = Self {
            buf: Self::rebuild(&pieces[..pos]),
        };
        self.buf = Self::rebuild(&pieces[pos..]);
        left
    }

    /// Splits near the middle by cumulative byte size, returning the left
    /// half and keeping the right half in `self`. The returned half is
    /// either at most `limit` serialized bytes or exactly one (oversized)
    /// edge, which bounds record sizes regardless of pathological entries.
    pub fn split_even(&mut self, limit: usize) -> EdgeValue {
        let count = self.count();
        debug_assert!(count >= 2, "nothing to split");
        let sizes: Vec<usize> = (0..count)
            .map(|i| {
                let (start, end) = self.extent(i);
                end - start
            })
            .collect();
        let total: usize = sizes.iter().sum();
        let half = total / 2;
        let mut pos = 1;
        let mut cum = sizes[0];
        while pos < count - 1 && cum < half {
            cum += sizes[pos];
            pos += 1;
        }
        while pos > 1 && header_len(pos) + sizes[..pos].iter().sum::<usize>() > limit {
            pos -= 1;
        }
        self.split_at(pos)
    }
}
