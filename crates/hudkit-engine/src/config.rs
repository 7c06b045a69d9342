//! Overlay configuration.

use crate::coords::VirtualViewport;
use crate::gpu::BufferUsage;
use crate::pack::{VERTEX_SIZE, VERTICES_PER_ELEMENT};

/// Construction parameters for an [`Overlay`](crate::overlay::Overlay).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayConfig {
    /// Virtual space elements are placed in.
    pub viewport: VirtualViewport,
    /// Usage hint passed on every full re-specification.
    pub buffer_usage: BufferUsage,
    /// Element slots reserved up front.
    pub initial_slots: usize,
    /// Bytes reserved for the packed vertex stream.
    pub scratch_bytes: usize,
}

impl OverlayConfig {
    /// Config sized so `slots` live elements never reallocate.
    pub fn with_slots(slots: usize) -> Self {
        Self {
            initial_slots: slots,
            scratch_bytes: slots * VERTICES_PER_ELEMENT * VERTEX_SIZE,
            ..Self::default()
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            viewport: VirtualViewport::DEFAULT,
            buffer_usage: BufferUsage::Dynamic,
            initial_slots: 256,
            scratch_bytes: 256 * VERTICES_PER_ELEMENT * VERTEX_SIZE,
        }
    }
}
