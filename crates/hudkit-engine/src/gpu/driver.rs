use std::fmt;
use std::num::NonZeroU32;

use super::{GpuError, VertexLayout};

/// Driver-side name of a buffer object. Zero is never a valid name.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BufferId(NonZeroU32);

impl BufferId {
    #[inline]
    pub const fn new(raw: NonZeroU32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Binding point a buffer is attached to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferTarget {
    /// Per-vertex attribute data.
    Array,
    /// Index data.
    ElementArray,
}

/// Update-frequency hint passed along with a full re-specification.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum BufferUsage {
    Static,
    #[default]
    Dynamic,
    Stream,
}

/// Low-level GPU command interface.
///
/// Modeled as a bind-then-operate state machine: data operations act on
/// whatever buffer is bound to the given target. Callers never talk to an
/// implementation directly; they go through [`GpuContext`](super::GpuContext),
/// which deduplicates binds.
///
/// Two implementations ship with the crate:
/// - `render::WgpuDriver` records real wgpu work
/// - [`RecordingDriver`](super::RecordingDriver) keeps everything in memory
pub trait GpuDriver {
    /// Allocates a new, empty buffer name.
    fn create_buffer(&mut self) -> BufferId;

    /// Attaches `buffer` to `target`.
    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId);

    /// Replaces the entire backing store of the buffer bound to `target`.
    fn buffer_data(
        &mut self,
        target: BufferTarget,
        data: &[u8],
        usage: BufferUsage,
    ) -> Result<(), GpuError>;

    /// Overwrites `data.len()` bytes at `offset` without resizing.
    fn buffer_sub_data(
        &mut self,
        target: BufferTarget,
        offset: usize,
        data: &[u8],
    ) -> Result<(), GpuError>;

    /// Begins a write-only mapping of the first `len` bytes of the bound buffer.
    fn map_buffer(&mut self, target: BufferTarget, len: usize) -> Result<(), GpuError>;

    /// Bytes of the live mapping. Empty when nothing is mapped.
    fn mapped(&self) -> &[u8];

    /// Mutable bytes of the live mapping. Empty when nothing is mapped.
    fn mapped_mut(&mut self) -> &mut [u8];

    /// Ends the live mapping, committing its contents.
    fn unmap_buffer(&mut self, target: BufferTarget);

    /// Releases a buffer name and its storage.
    fn delete_buffer(&mut self, buffer: BufferId);

    /// Resets the depth channel so the pass does not clip against earlier content.
    fn clear_depth(&mut self);

    fn set_depth_write(&mut self, enabled: bool);

    fn set_blend(&mut self, enabled: bool);

    /// Selects the vertex attribute layout used by subsequent draws.
    fn bind_vertex_layout(&mut self, layout: &'static VertexLayout);

    /// Draws `count` vertices as a triangle list from the bound array buffer.
    fn draw_triangles(&mut self, first: u32, count: u32);
}
