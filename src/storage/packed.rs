//! Combined-record codec: vertex property plus both edge runs in one value.
//!
//! ```text
//! [4B out-run offset LE][4B in-run offset LE][vertex prop][out run][in run]
//! ```
//!
//! Offsets are absolute byte positions in the value. The vertex property
//! occupies the gap between the fixed header and the out-run offset. Unlike
//! keys, these offsets never take part in ordering, so they stay in the
//! platform-friendly little-endian form.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{GraphError, Result};

use super::edge_value::EdgeValue;

const HEADER_LEN: usize = 8;

/// A combined record: the whole vertex while it is small.
#[derive(Clone, Debug)]
pub struct PackedValue {
    buf: Bytes,
}

impl PackedValue {
    /// Builds a combined record from its three parts.
    pub fn compose(prop: &[u8], out_run: &EdgeValue, in_run: &EdgeValue) -> Self {
        let off_out = HEADER_LEN + prop.len();
        let off_in = off_out + out_run.size();
        let mut buf = BytesMut::with_capacity(off_in + in_run.size());
        buf.put_u32_le(off_out as u32);
        buf.put_u32_le(off_in as u32);
        buf.put_slice(prop);
        buf.put_slice(out_run.as_bytes());
        buf.put_slice(in_run.as_bytes());
        Self { buf: buf.freeze() }
    }

    /// Builds the record of a brand-new vertex: the property and two empty
    /// runs.
    pub fn new_vertex(prop: &[u8]) -> Self {
        Self::compose(prop, &EdgeValue::new(), &EdgeValue::new())
    }

    /// Parses and validates a serialized combined record, including both
    /// embedded runs.
    pub fn from_bytes(buf: Bytes) -> Result<Self> {
        if buf.len() < HEADER_LEN {
            return Err(GraphError::Corruption(
                "combined record shorter than its header".into(),
            ));
        }
        let off_out = Self::off_out_of(&buf);
        let off_in = Self::off_in_of(&buf);
        if off_out < HEADER_LEN || off_out > off_in || off_in > buf.len() {
            return Err(GraphError::Corruption(
                "combined record offsets out of order".into(),
            ));
        }
        EdgeValue::from_bytes(buf.slice(off_out..off_in))?;
        EdgeValue::from_bytes(buf.slice(off_in..))?;
        Ok(Self { buf })
    }

    fn off_out_of(buf: &[u8]) -> usize {
        u32::from_le_bytes(buf[0..4].try_into().expect("slice has exactly 4 bytes")) as usize
    }

    fn off_in_of(buf: &[u8]) -> usize {
        u32::from_le_bytes(buf[4..8].try_into().expect("slice has exactly 4 bytes")) as usize
    }

    /// Vertex property bytes.
    pub fn property(&self) -> &[u8] {
        &self.buf[HEADER_LEN..Self::off_out_of(&self.buf)]
    }

    /// Vertex property as a cheap sub-slice handle.
    pub fn property_bytes(&self) -> Bytes {
        self.buf.slice(HEADER_LEN..Self::off_out_of(&self.buf))
    }

    /// The outgoing-edge run.
    pub fn out_run(&self) -> EdgeValue {
        let (a, b) = (Self::off_out_of(&self.buf), Self::off_in_of(&self.buf));
        EdgeValue::from_bytes(self.buf.slice(a..b)).expect("validated on construction")
    }

    /// The incoming-edge run.
    pub fn in_run(&self) -> EdgeValue {
        let a = Self::off_in_of(&self.buf);
        EdgeValue::from_bytes(self.buf.slice(a..)).expect("validated on construction")
    }

    /// Serialized form.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Serialized size in bytes.
    pub fn size(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EdgeId, LabelId, TemporalId, VertexId};

    #[test]
    fn new_vertex_round_trip() {
        let packed = PackedValue::new_vertex(b"props");
        let packed = PackedValue::from_bytes(Bytes::copy_from_slice(packed.as_bytes())).unwrap();
        assert_eq!(packed.property(), b"props");
        assert!(packed.out_run().is_empty());
        assert!(packed.in_run().is_empty());
        // header + prop + two empty runs
        assert_eq!(packed.size(), 8 + 5 + 1 + 1);
    }

    #[test]
    fn compose_keeps_runs_separate() {
        let mut out = EdgeValue::new();
        out.insert_at(0, LabelId(1), TemporalId(0), VertexId(9), EdgeId(0), b"o");
        let mut inn = EdgeValue::new();
        inn.insert_at(0, LabelId(2), TemporalId(5), VertexId(4), EdgeId(0), b"i");

        let packed = PackedValue::compose(b"", &out, &inn);
        let packed = PackedValue::from_bytes(packed.buf.clone()).unwrap();
        assert!(packed.property().is_empty());
        assert_eq!(packed.out_run().edge(0).peer, VertexId(9));
        assert_eq!(packed.out_run().edge(0).prop, b"o");
        assert_eq!(packed.in_run().edge(0).peer, VertexId(4));
        assert_eq!(packed.in_run().edge(0).tid, TemporalId(5));
    }

    #[test]
    fn rejects_bad_offsets() {
        assert!(PackedValue::from_bytes(Bytes::from_static(&[0u8; 4])).is_err());
        // out offset points before the header
        let mut raw = vec![0u8; 10];
        raw[0] = 2;
        raw[4] = 9;
        assert!(PackedValue::from_bytes(Bytes::from(raw)).is_err());
        // in offset beyond the buffer
        let mut raw = vec![0u8; 10];
        raw[0] = 8;
        raw[4] = 99;
        assert!(PackedValue::from_bytes(Bytes::from(raw)).is_err());
    }
}
