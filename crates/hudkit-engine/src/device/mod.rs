//! Window surface and device bootstrap.
//!
//! [`Gpu`] creates the wgpu instance, adapter, device and queue for a winit
//! window, keeps the surface configured across resizes, and owns the depth
//! attachment the overlay pass draws against.

mod depth;
mod gpu;
mod init;

pub use depth::DepthTarget;
pub use gpu::{Gpu, GpuFrame, SurfaceErrorAction};
pub use init::GpuInit;
