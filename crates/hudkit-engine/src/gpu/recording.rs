use std::collections::HashMap;
use std::num::NonZeroU32;

use super::{BufferId, BufferTarget, BufferUsage, GpuDriver, GpuError, VertexLayout};

/// One call observed by [`RecordingDriver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    CreateBuffer(BufferId),
    BindBuffer { target: BufferTarget, buffer: BufferId },
    BufferData { target: BufferTarget, len: usize, usage: BufferUsage },
    BufferSubData { target: BufferTarget, offset: usize, len: usize },
    MapBuffer { target: BufferTarget, len: usize },
    UnmapBuffer(BufferTarget),
    DeleteBuffer(BufferId),
    ClearDepth,
    SetDepthWrite(bool),
    SetBlend(bool),
    BindVertexLayout { stride: usize },
    DrawTriangles { first: u32, count: u32 },
}

/// In-memory [`GpuDriver`].
///
/// Keeps a CPU copy of every buffer, validates binds the way a strict driver
/// would, and logs every call in order. Used for headless runs and tests.
#[derive(Debug)]
pub struct RecordingDriver {
    calls: Vec<DriverCall>,
    next_id: u32,
    bound: HashMap<BufferTarget, BufferId>,
    storage: HashMap<BufferId, Vec<u8>>,
    mapped: Option<BufferTarget>,
    // Reused across mappings; only grows.
    staging: Vec<u8>,
}

impl Default for RecordingDriver {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            next_id: 1,
            bound: HashMap::new(),
            storage: HashMap::new(),
            mapped: None,
            staging: Vec::new(),
        }
    }
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn calls(&self) -> &[DriverCall] {
        &self.calls
    }

    /// Drains the call log, leaving buffer state untouched.
    pub fn take_calls(&mut self) -> Vec<DriverCall> {
        std::mem::take(&mut self.calls)
    }

    /// Counts logged calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&DriverCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    /// Current contents of a live buffer.
    pub fn contents(&self, buffer: BufferId) -> Option<&[u8]> {
        self.storage.get(&buffer).map(Vec::as_slice)
    }

    #[inline]
    pub fn bound(&self, target: BufferTarget) -> Option<BufferId> {
        self.bound.get(&target).copied()
    }

    #[inline]
    pub fn is_mapped(&self) -> bool {
        self.mapped.is_some()
    }

    fn bound_storage(&mut self, target: BufferTarget) -> Result<&mut Vec<u8>, GpuError> {
        let buffer = self.bound(target).ok_or(GpuError::NothingBound(target))?;
        self.storage
            .get_mut(&buffer)
            .ok_or(GpuError::UnknownBuffer(buffer))
    }
}

impl GpuDriver for RecordingDriver {
    fn create_buffer(&mut self) -> BufferId {
        let raw = NonZeroU32::new(self.next_id).unwrap_or(NonZeroU32::MIN);
        self.next_id = self.next_id.wrapping_add(1).max(1);
        let id = BufferId::new(raw);
        self.storage.insert(id, Vec::new());
        self.calls.push(DriverCall::CreateBuffer(id));
        id
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId) {
        self.bound.insert(target, buffer);
        self.calls.push(DriverCall::BindBuffer { target, buffer });
    }

    fn buffer_data(
        &mut self,
        target: BufferTarget,
        data: &[u8],
        usage: BufferUsage,
    ) -> Result<(), GpuError> {
        if self.mapped.is_some() {
            return Err(GpuError::AlreadyMapped(target));
        }
        let storage = self.bound_storage(target)?;
        storage.clear();
        storage.extend_from_slice(data);
        self.calls.push(DriverCall::BufferData {
            target,
            len: data.len(),
            usage,
        });
        Ok(())
    }

    fn buffer_sub_data(
        &mut self,
        target: BufferTarget,
        offset: usize,
        data: &[u8],
    ) -> Result<(), GpuError> {
        let storage = self.bound_storage(target)?;
        let capacity = storage.len();
        let dst = offset
            .checked_add(data.len())
            .and_then(|end| storage.get_mut(offset..end))
            .ok_or(GpuError::OutOfRange {
                offset,
                len: data.len(),
                capacity,
            })?;
        dst.copy_from_slice(data);
        self.calls.push(DriverCall::BufferSubData {
            target,
            offset,
            len: data.len(),
        });
        Ok(())
    }

    fn map_buffer(&mut self, target: BufferTarget, len: usize) -> Result<(), GpuError> {
        if self.mapped.is_some() {
            return Err(GpuError::AlreadyMapped(target));
        }
        let buffer = self.bound(target).ok_or(GpuError::NothingBound(target))?;
        let storage = self
            .storage
            .get(&buffer)
            .ok_or(GpuError::UnknownBuffer(buffer))?;
        if len > storage.len() {
            return Err(GpuError::OutOfRange {
                offset: 0,
                len,
                capacity: storage.len(),
            });
        }
        self.staging.clear();
        self.staging.extend_from_slice(&storage[..len]);
        self.mapped = Some(target);
        self.calls.push(DriverCall::MapBuffer { target, len });
        Ok(())
    }

    fn mapped(&self) -> &[u8] {
        if self.mapped.is_some() {
            &self.staging
        } else {
            &[]
        }
    }

    fn mapped_mut(&mut self) -> &mut [u8] {
        if self.mapped.is_some() {
            &mut self.staging
        } else {
            &mut []
        }
    }

    fn unmap_buffer(&mut self, target: BufferTarget) {
        self.calls.push(DriverCall::UnmapBuffer(target));
        let Some(mapped_target) = self.mapped.take() else {
            return;
        };
        debug_assert_eq!(mapped_target, target, "unmapped a different target than mapped");
        let len = self.staging.len();
        if let Some(id) = self.bound.get(&mapped_target) {
            if let Some(storage) = self.storage.get_mut(id) {
                storage[..len].copy_from_slice(&self.staging);
            }
        }
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.storage.remove(&buffer);
        self.bound.retain(|_, b| *b != buffer);
        self.calls.push(DriverCall::DeleteBuffer(buffer));
    }

    fn clear_depth(&mut self) {
        self.calls.push(DriverCall::ClearDepth);
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.calls.push(DriverCall::SetDepthWrite(enabled));
    }

    fn set_blend(&mut self, enabled: bool) {
        self.calls.push(DriverCall::SetBlend(enabled));
    }

    fn bind_vertex_layout(&mut self, layout: &'static VertexLayout) {
        self.calls.push(DriverCall::BindVertexLayout {
            stride: layout.stride,
        });
    }

    fn draw_triangles(&mut self, first: u32, count: u32) {
        self.calls.push(DriverCall::DrawTriangles { first, count });
    }
}
