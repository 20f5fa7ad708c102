//! Sort-key codec for every record kind.
//!
//! Keys are compared by the store as raw bytes, so every multi-byte field is
//! written most-significant-byte first. Key shapes:
//!
//! - combined record: `[5B vid]`
//! - vertex-only record: `[5B vid][0x01]`
//! - edge-run record: `[5B anchor][1B kind][2B lid][8B tid][5B peer][4B eid]`
//!   where anchor is src for out-edges and dst for in-edges, keyed by the
//!   last edge the run contains.
//!
//! The combined key carries no type byte; being the shortest key with its
//! vid prefix it sorts before every other record of the vertex, and its kind
//! is inferred from the 5-byte length.

use smallvec::SmallVec;

use crate::types::{EdgeId, LabelId, PackType, TemporalId, VertexId};

/// Width of the vertex id field.
pub const VID_LEN: usize = 5;
/// Width of a combined-record key.
pub const VERTEX_KEY_LEN: usize = VID_LEN;
/// Width of a vertex-only key.
pub const VERTEX_ONLY_KEY_LEN: usize = VID_LEN + 1;
/// Width of an edge-run key: anchor + kind + lid + tid + peer + eid.
pub const EDGE_KEY_LEN: usize = VID_LEN + 1 + 2 + 8 + VID_LEN + 4;

const LID_AT: usize = VID_LEN + 1;
const TID_AT: usize = LID_AT + 2;
const PEER_AT: usize = TID_AT + 8;
const EID_AT: usize = PEER_AT + VID_LEN;

/// Key buffer sized for the largest key shape.
pub type KeyBuf = SmallVec<[u8; EDGE_KEY_LEN]>;

fn push_vid(buf: &mut KeyBuf, vid: VertexId) {
    debug_assert!(vid.0 <= crate::types::MAX_VID, "vid exceeds 40 bits");
    buf.push((vid.0 >> 32) as u8);
    buf.extend_from_slice(&(vid.0 as u32).to_be_bytes());
}

fn read_vid(bytes: &[u8]) -> VertexId {
    let hi = u64::from(bytes[0]) << 32;
    let lo = u64::from(u32::from_be_bytes(
        bytes[1..5].try_into().expect("slice has exactly 4 bytes"),
    ));
    VertexId(hi | lo)
}

/// Encodes the key of a combined (packed) record.
pub fn pack_vertex_key(vid: VertexId) -> KeyBuf {
    let mut buf = KeyBuf::new();
    push_vid(&mut buf, vid);
    buf
}

/// Encodes the key of a vertex-only record.
pub fn pack_vertex_only_key(vid: VertexId) -> KeyBuf {
    let mut buf = KeyBuf::new();
    push_vid(&mut buf, vid);
    buf.push(PackType::VertexOnly.to_byte());
    buf
}

/// Encodes the key of an edge-run record. `kind` must be one of the two
/// edge kinds; `anchor` owns the record and `peer` is the other endpoint.
pub fn pack_edge_key(
    kind: PackType,
    anchor: VertexId,
    lid: LabelId,
    tid: TemporalId,
    peer: VertexId,
    eid: EdgeId,
) -> KeyBuf {
    debug_assert!(kind.is_edge(), "edge key requires an edge kind");
    let mut buf = KeyBuf::new();
    push_vid(&mut buf, anchor);
    buf.push(kind.to_byte());
    buf.extend_from_slice(&lid.0.to_be_bytes());
    buf.extend_from_slice(&tid.0.to_be_bytes());
    push_vid(&mut buf, peer);
    buf.extend_from_slice(&eid.0.to_be_bytes());
    buf
}

/// Record kind implied by a key, or `None` for keys outside the record
/// keyspace (such as the meta key).
pub fn node_kind(key: &[u8]) -> Option<PackType> {
    match key.len() {
        VERTEX_KEY_LEN => Some(PackType::PackedData),
        VERTEX_ONLY_KEY_LEN | EDGE_KEY_LEN => PackType::from_byte(key[VID_LEN]).ok(),
        _ => None,
    }
}

/// Vertex id owning a record key, or `None` for foreign keys.
pub fn first_vid(key: &[u8]) -> Option<VertexId> {
    (key.len() >= VID_LEN).then(|| read_vid(&key[..VID_LEN]))
}

/// Label field of an edge-run key.
pub fn label(key: &[u8]) -> LabelId {
    debug_assert_eq!(key.len(), EDGE_KEY_LEN);
    LabelId(u16::from_be_bytes(
        key[LID_AT..TID_AT]
            .try_into()
            .expect("slice has exactly 2 bytes"),
    ))
}

/// Temporal field of an edge-run key.
pub fn temporal_id(key: &[u8]) -> TemporalId {
    debug_assert_eq!(key.len(), EDGE_KEY_LEN);
    TemporalId(u64::from_be_bytes(
        key[TID_AT..PEER_AT]
            .try_into()
            .expect("slice has exactly 8 bytes"),
    ))
}

/// Peer vertex id of an edge-run key.
pub fn second_vid(key: &[u8]) -> VertexId {
    debug_assert_eq!(key.len(), EDGE_KEY_LEN);
    read_vid(&key[PEER_AT..EID_AT])
}

/// Edge id of an edge-run key.
pub fn eid(key: &[u8]) -> EdgeId {
    debug_assert_eq!(key.len(), EDGE_KEY_LEN);
    EdgeId(u32::from_be_bytes(
        key[EID_AT..EDGE_KEY_LEN]
            .try_into()
            .expect("slice has exactly 4 bytes"),
    ))
}

/// True when `key` belongs to `vid` and carries the given kind.
pub fn belongs_to(key: &[u8], vid: VertexId, kind: PackType) -> bool {
    node_kind(key) == Some(kind) && first_vid(key) == Some(vid)
}
