//! GPU resource layer.
//!
//! Everything that touches the driver goes through [`GpuContext`]: it owns the
//! [`GpuDriver`] and a [`BindingCache`] so repeated binds of the same buffer
//! collapse into a single driver call.

mod binding;
mod buffer;
mod context;
mod driver;
mod error;
mod layout;
mod recording;

pub use binding::BindingCache;
pub use buffer::{Buffer, BufferMapping};
pub use context::GpuContext;
pub use driver::{BufferId, BufferTarget, BufferUsage, GpuDriver};
pub use error::GpuError;
pub use layout::{AttributeFormat, VertexAttribute, VertexLayout};
pub use recording::{DriverCall, RecordingDriver};
