use std::ops::{Deref, DerefMut};

use super::{BufferId, BufferTarget, BufferUsage, GpuContext, GpuDriver, GpuError};

/// Owning handle over a GPU-side byte buffer.
///
/// The handle does not release anything on drop because releasing needs the
/// driver; call [`Buffer::delete`].
#[derive(Debug, PartialEq, Eq)]
pub struct Buffer {
    id: BufferId,
    /// Size of the current backing store in bytes.
    len: usize,
}

impl Buffer {
    pub fn create<D: GpuDriver>(gpu: &mut GpuContext<D>) -> Self {
        let id = gpu.driver.create_buffer();
        log::debug!("created gpu buffer {id}");
        Self { id, len: 0 }
    }

    #[inline]
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Size of the backing store established by the last [`data`](Self::data) call.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Binds through the cache. Returns `true` if the driver was called.
    #[inline]
    pub fn bind<D: GpuDriver>(&self, gpu: &mut GpuContext<D>, target: BufferTarget) -> bool {
        gpu.bindings.bind(&mut gpu.driver, self.id, target)
    }

    /// Replaces the backing store with `bytes`.
    ///
    /// Any previous mapping of this buffer is invalid afterwards.
    pub fn data<D: GpuDriver>(
        &mut self,
        gpu: &mut GpuContext<D>,
        bytes: &[u8],
        usage: BufferUsage,
    ) -> Result<(), GpuError> {
        let target = self.bound_target(gpu)?;
        gpu.driver.buffer_data(target, bytes, usage)?;
        if bytes.len() != self.len {
            log::debug!("buffer {} respecified: {} -> {} bytes", self.id, self.len, bytes.len());
        }
        self.len = bytes.len();
        Ok(())
    }

    /// Writes `bytes` at `offset` inside the existing allocation.
    pub fn sub_data<D: GpuDriver>(
        &self,
        gpu: &mut GpuContext<D>,
        offset: usize,
        bytes: &[u8],
    ) -> Result<(), GpuError> {
        let target = self.bound_target(gpu)?;
        self.check_range(offset, bytes.len())?;
        gpu.driver.buffer_sub_data(target, offset, bytes)
    }

    /// Maps the first `len` bytes for writing. The mapping ends when the guard drops.
    pub fn map_write<'a, D: GpuDriver>(
        &self,
        gpu: &'a mut GpuContext<D>,
        len: usize,
    ) -> Result<BufferMapping<'a, D>, GpuError> {
        let target = self.bound_target(gpu)?;
        self.check_range(0, len)?;
        gpu.driver.map_buffer(target, len)?;
        Ok(BufferMapping {
            driver: &mut gpu.driver,
            target,
        })
    }

    /// Releases the buffer. Clears the bind cache if this buffer was current.
    pub fn delete<D: GpuDriver>(self, gpu: &mut GpuContext<D>) {
        gpu.driver.delete_buffer(self.id);
        gpu.bindings.unbind_if_current(self.id);
        log::debug!("deleted gpu buffer {}", self.id);
    }

    fn bound_target<D: GpuDriver>(&self, gpu: &GpuContext<D>) -> Result<BufferTarget, GpuError> {
        match gpu.bindings.current() {
            Some((buffer, target)) if buffer == self.id => Ok(target),
            current => Err(GpuError::BufferNotBound {
                buffer: self.id,
                current: current.map(|(b, _)| b),
            }),
        }
    }

    fn check_range(&self, offset: usize, len: usize) -> Result<(), GpuError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.len => Ok(()),
            _ => Err(GpuError::OutOfRange {
                offset,
                len,
                capacity: self.len,
            }),
        }
    }
}

/// Live write mapping of a buffer prefix. Unmaps on drop.
pub struct BufferMapping<'a, D: GpuDriver> {
    driver: &'a mut D,
    target: BufferTarget,
}

impl<D: GpuDriver> Deref for BufferMapping<'_, D> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.driver.mapped()
    }
}

impl<D: GpuDriver> DerefMut for BufferMapping<'_, D> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.driver.mapped_mut()
    }
}

impl<D: GpuDriver> Drop for BufferMapping<'_, D> {
    fn drop(&mut self) {
        self.driver.unmap_buffer(self.target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{DriverCall, RecordingDriver};

    fn gpu() -> GpuContext<RecordingDriver> {
        GpuContext::new(RecordingDriver::new())
    }

    #[test]
    fn data_requires_binding() {
        let mut gpu = gpu();
        let mut buf = Buffer::create(&mut gpu);

        let err = buf.data(&mut gpu, &[1, 2, 3, 4], BufferUsage::Dynamic).unwrap_err();
        assert_eq!(
            err,
            GpuError::BufferNotBound {
                buffer: buf.id(),
                current: None
            }
        );
        assert_eq!(gpu.driver().count(|c| matches!(c, DriverCall::BufferData { .. })), 0);
    }

    #[test]
    fn data_on_other_bound_buffer_is_rejected() {
        let mut gpu = gpu();
        let mut a = Buffer::create(&mut gpu);
        let b = Buffer::create(&mut gpu);
        b.bind(&mut gpu, BufferTarget::Array);

        let err = a.data(&mut gpu, &[0; 4], BufferUsage::Dynamic).unwrap_err();
        assert_eq!(
            err,
            GpuError::BufferNotBound {
                buffer: a.id(),
                current: Some(b.id())
            }
        );
    }

    #[test]
    fn data_replaces_storage() {
        let mut gpu = gpu();
        let mut buf = Buffer::create(&mut gpu);
        buf.bind(&mut gpu, BufferTarget::Array);

        buf.data(&mut gpu, &[1, 2, 3, 4, 5, 6, 7, 8], BufferUsage::Dynamic).unwrap();
        assert_eq!(buf.len(), 8);
        buf.data(&mut gpu, &[9, 9, 9, 9], BufferUsage::Dynamic).unwrap();
        assert_eq!(buf.len(), 4);
        assert_eq!(gpu.driver().contents(buf.id()), Some(&[9u8, 9, 9, 9][..]));
    }

    #[test]
    fn sub_data_writes_in_place() {
        let mut gpu = gpu();
        let mut buf = Buffer::create(&mut gpu);
        buf.bind(&mut gpu, BufferTarget::Array);
        buf.data(&mut gpu, &[0; 8], BufferUsage::Dynamic).unwrap();

        buf.sub_data(&mut gpu, 4, &[7, 7, 7, 7]).unwrap();
        assert_eq!(gpu.driver().contents(buf.id()), Some(&[0u8, 0, 0, 0, 7, 7, 7, 7][..]));
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn sub_data_past_allocation_is_rejected() {
        let mut gpu = gpu();
        let mut buf = Buffer::create(&mut gpu);
        buf.bind(&mut gpu, BufferTarget::Array);
        buf.data(&mut gpu, &[0; 8], BufferUsage::Dynamic).unwrap();

        let err = buf.sub_data(&mut gpu, 6, &[1, 1, 1, 1]).unwrap_err();
        assert_eq!(
            err,
            GpuError::OutOfRange {
                offset: 6,
                len: 4,
                capacity: 8
            }
        );
    }

    #[test]
    fn mapping_commits_on_drop() {
        let mut gpu = gpu();
        let mut buf = Buffer::create(&mut gpu);
        buf.bind(&mut gpu, BufferTarget::Array);
        buf.data(&mut gpu, &[0; 8], BufferUsage::Dynamic).unwrap();

        {
            let mut map = buf.map_write(&mut gpu, 4).unwrap();
            assert_eq!(map.len(), 4);
            map.copy_from_slice(&[5, 6, 7, 8]);
        }

        assert_eq!(gpu.driver().contents(buf.id()), Some(&[5u8, 6, 7, 8, 0, 0, 0, 0][..]));
        assert_eq!(gpu.driver().count(|c| matches!(c, DriverCall::UnmapBuffer(_))), 1);
        assert!(!gpu.driver().is_mapped());
    }

    #[test]
    fn mapping_larger_than_allocation_is_rejected() {
        let mut gpu = gpu();
        let mut buf = Buffer::create(&mut gpu);
        buf.bind(&mut gpu, BufferTarget::Array);
        buf.data(&mut gpu, &[0; 4], BufferUsage::Dynamic).unwrap();

        assert!(matches!(
            buf.map_write(&mut gpu, 8),
            Err(GpuError::OutOfRange { capacity: 4, .. })
        ));
        assert_eq!(gpu.driver().count(|c| matches!(c, DriverCall::MapBuffer { .. })), 0);
    }

    #[test]
    fn delete_clears_cached_binding() {
        let mut gpu = gpu();
        let buf = Buffer::create(&mut gpu);
        let id = buf.id();
        buf.bind(&mut gpu, BufferTarget::Array);
        assert!(gpu.bindings().is_current(id));

        buf.delete(&mut gpu);
        assert_eq!(gpu.bindings().current(), None);
        assert_eq!(gpu.driver().contents(id), None);
    }

    #[test]
    fn deleting_other_buffer_keeps_binding() {
        let mut gpu = gpu();
        let a = Buffer::create(&mut gpu);
        let b = Buffer::create(&mut gpu);
        a.bind(&mut gpu, BufferTarget::Array);

        b.delete(&mut gpu);
        assert!(gpu.bindings().is_current(a.id()));
        assert!(!a.bind(&mut gpu, BufferTarget::Array));
    }
}
