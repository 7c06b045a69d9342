use std::fmt;

use super::{BufferId, BufferTarget};

/// A violated GPU-layer contract.
///
/// These are programming errors on the caller's side (uploading into a buffer
/// that is not bound, writing past an allocation). They are reported instead of
/// being forwarded to the driver, where they would corrupt state silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpuError {
    /// A data operation targeted a buffer that is not the currently bound one.
    BufferNotBound {
        buffer: BufferId,
        current: Option<BufferId>,
    },
    /// Nothing is bound to the target the operation needs.
    NothingBound(BufferTarget),
    /// The buffer id is not (or no longer) known to the driver.
    UnknownBuffer(BufferId),
    /// A write would extend past the buffer's current allocation.
    OutOfRange {
        offset: usize,
        len: usize,
        capacity: usize,
    },
    /// A mapping was requested while another one is still live.
    AlreadyMapped(BufferTarget),
    /// The driver cannot write at this offset (e.g. wgpu needs 4-byte alignment).
    Misaligned { offset: usize, align: usize },
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::BufferNotBound { buffer, current: Some(current) } => {
                write!(f, "buffer {buffer} is not bound (current: {current})")
            }
            GpuError::BufferNotBound { buffer, current: None } => {
                write!(f, "buffer {buffer} is not bound (nothing bound)")
            }
            GpuError::NothingBound(target) => write!(f, "no buffer bound to {target:?}"),
            GpuError::UnknownBuffer(buffer) => write!(f, "unknown buffer {buffer}"),
            GpuError::OutOfRange { offset, len, capacity } => write!(
                f,
                "write of {len} bytes at offset {offset} exceeds buffer capacity {capacity}"
            ),
            GpuError::AlreadyMapped(target) => write!(f, "{target:?} buffer is already mapped"),
            GpuError::Misaligned { offset, align } => {
                write!(f, "offset {offset} is not a multiple of {align}")
            }
        }
    }
}

impl std::error::Error for GpuError {}
