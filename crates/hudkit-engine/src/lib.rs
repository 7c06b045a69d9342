//! hudkit engine crate.
//!
//! A retained-mode 2D overlay: a pool of textured rectangles packed into one
//! vertex buffer and drawn with a single call per frame.
//!
//! Entry point is [`Overlay`]. It is generic over [`gpu::GpuDriver`]; use
//! [`render::WgpuDriver`] on a real device or [`gpu::RecordingDriver`] headless.

pub mod config;
pub mod coords;
pub mod device;
pub mod element;
pub mod gpu;
pub mod logging;
pub mod overlay;
pub mod pack;
pub mod render;
pub mod texture;

pub use config::OverlayConfig;
pub use overlay::Overlay;
