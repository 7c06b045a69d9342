//! Binary vertex packing.
//!
//! Every live element becomes six [`UiVertex`] records (two triangles). The
//! byte layout is fixed and shared with the overlay shader.

mod vertex;

pub use vertex::{
    decode_vertices, pack_element, quad_vertices, UiVertex, VERTEX_LAYOUT, VERTEX_SIZE,
    VERTICES_PER_ELEMENT,
};
