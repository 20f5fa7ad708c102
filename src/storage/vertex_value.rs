//! Vertex-only record value: the property blob, stored verbatim.

use bytes::Bytes;

/// Value of a vertex-only record. The whole value is the vertex property;
/// an empty property is a zero-length value.
#[derive(Clone, Debug, Default)]
pub struct VertexValue {
    prop: Bytes,
}

impl VertexValue {
    /// Wraps a property blob.
    pub fn new(prop: Bytes) -> Self {
        Self { prop }
    }

    /// The property bytes.
    pub fn property(&self) -> &[u8] {
        &self.prop
    }

    /// Replaces the property.
    pub fn set_property(&mut self, prop: Bytes) {
        self.prop = prop;
    }

    /// Serialized form (identical to the property).
    pub fn as_bytes(&self) -> &[u8] {
        &self.prop
    }

    /// Cheap handle on the serialized form.
    pub fn to_bytes(&self) -> Bytes {
        self.prop.clone()
    }

    /// Serialized size in bytes.
    pub fn size(&self) -> usize {
        self.prop.len()
    }
}
