/// Component format of a single vertex attribute.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AttributeFormat {
    /// Three 32-bit floats.
    Float32x3,
    /// Four unsigned 16-bit integers, not normalized.
    Uint16x4,
    /// Two signed 16-bit integers, not normalized.
    Sint16x2,
    /// Four unsigned bytes, normalized to `0.0..=1.0`.
    Unorm8x4,
}

impl AttributeFormat {
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            AttributeFormat::Float32x3 => 12,
            AttributeFormat::Uint16x4 => 8,
            AttributeFormat::Sint16x2 => 4,
            AttributeFormat::Unorm8x4 => 4,
        }
    }
}

/// A named attribute at a fixed byte offset inside a vertex record.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexAttribute {
    pub name: &'static str,
    pub location: u32,
    pub format: AttributeFormat,
    pub offset: usize,
}

/// Byte layout of one interleaved vertex record.
///
/// This is the contract between the CPU-side packer and the shader's vertex
/// inputs; drivers build their pipeline state from it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexLayout {
    pub stride: usize,
    pub attributes: &'static [VertexAttribute],
}

impl VertexLayout {
    /// Looks up an attribute by its shader-side name.
    pub fn attribute(&self, name: &str) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Returns `true` if attributes are tightly packed and end exactly at `stride`.
    pub fn is_tightly_packed(&self) -> bool {
        let mut expected = 0;
        for attr in self.attributes {
            if attr.offset != expected {
                return false;
            }
            expected += attr.format.size();
        }
        expected == self.stride
    }
}
