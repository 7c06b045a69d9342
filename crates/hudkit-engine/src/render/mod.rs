//! Overlay rendering.
//!
//! [`FrameCompositor`] turns the element pool into one vertex stream and one
//! draw call against any [`GpuDriver`](crate::gpu::GpuDriver).
//! [`WgpuDriver`] is the production driver; it replays the collected draws
//! into a render pass when handed a [`RenderTarget`].
//!
//! Convention:
//! - vertex positions are normalized (0..1, top-left origin, +Y down).
//! - depth is in (-1, 0]; the shader maps it to wgpu's 0..1 range.

mod compositor;
mod ctx;
mod wgpu_driver;

pub use compositor::{FrameCompositor, FrameStats, UploadKind};
pub use ctx::{RenderTarget, DEPTH_FORMAT};
pub use wgpu_driver::WgpuDriver;
