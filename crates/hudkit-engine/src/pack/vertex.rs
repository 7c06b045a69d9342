use bytemuck::{Pod, Zeroable};

use crate::element::VisualElement;
use crate::gpu::{AttributeFormat, VertexAttribute, VertexLayout};

/// One overlay vertex as laid out in the GPU buffer.
///
/// Field order and widths are a fixed contract with the shader; see [`VERTEX_LAYOUT`].
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct UiVertex {
    /// Normalized x, y and depth.
    pub position: [f32; 3],
    /// Atlas x, y (page folded in), width, height in texels.
    pub texture_info: [u16; 4],
    /// Sub-region offset at this corner, in 1/16 texels.
    pub texture_offset: [i16; 2],
    /// RGBA tint.
    pub color: [u8; 4],
}

/// Bytes per vertex record.
pub const VERTEX_SIZE: usize = 28;

/// Two triangles, no index buffer.
pub const VERTICES_PER_ELEMENT: usize = 6;

const _: () = assert!(std::mem::size_of::<UiVertex>() == VERTEX_SIZE);

const ATTRIBUTES: [VertexAttribute; 4] = [
    VertexAttribute {
        name: "position",
        location: 0,
        format: AttributeFormat::Float32x3,
        offset: 0,
    },
    VertexAttribute {
        name: "texture_info",
        location: 1,
        format: AttributeFormat::Uint16x4,
        offset: 12,
    },
    VertexAttribute {
        name: "texture_offset",
        location: 2,
        format: AttributeFormat::Sint16x2,
        offset: 20,
    },
    VertexAttribute {
        name: "color",
        location: 3,
        format: AttributeFormat::Unorm8x4,
        offset: 24,
    },
];

/// Attribute layout matching [`UiVertex`].
pub static VERTEX_LAYOUT: VertexLayout = VertexLayout {
    stride: VERTEX_SIZE,
    attributes: &ATTRIBUTES,
};

/// The six corners of `element`'s quad.
///
/// Order: top-left, top-right, bottom-left, then bottom-right, bottom-left,
/// top-right.
pub fn quad_vertices(e: &VisualElement) -> [UiVertex; VERTICES_PER_ELEMENT] {
    let [x0, y0] = e.position();
    let [w, h] = e.size();
    let (x1, y1) = (x0 + w, y0 + h);
    let depth = e.depth();

    let [ox0, oy0] = e.sub_offset();
    let [sw, sh] = e.sub_size();
    let (ox1, oy1) = (ox0.saturating_add(sw), oy0.saturating_add(sh));

    let v = |x: f32, y: f32, tx: i16, ty: i16| UiVertex {
        position: [x, y, depth],
        texture_info: e.atlas_rect(),
        texture_offset: [tx, ty],
        color: e.color(),
    };

    [
        v(x0, y0, ox0, oy0),
        v(x1, y0, ox1, oy0),
        v(x0, y1, ox0, oy1),
        v(x1, y1, ox1, oy1),
        v(x0, y1, ox0, oy1),
        v(x1, y0, ox1, oy0),
    ]
}

/// Appends `element`'s six vertices to `out`. Returns the number of vertices written.
#[inline]
pub fn pack_element(element: &VisualElement, out: &mut Vec<u8>) -> usize {
    let quad = quad_vertices(element);
    out.extend_from_slice(bytemuck::cast_slice(&quad));
    quad.len()
}

/// Reads vertex records back from a packed byte stream.
///
/// Trailing bytes that do not form a whole record are ignored. Works on
/// unaligned input.
pub fn decode_vertices(bytes: &[u8]) -> impl Iterator<Item = UiVertex> + '_ {
    bytes
        .chunks_exact(VERTEX_SIZE)
        .map(bytemuck::pod_read_unaligned::<UiVertex>)
}
