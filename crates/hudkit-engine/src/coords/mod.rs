//! Coordinate types.
//!
//! Callers place elements in a fixed virtual space; the pool stores them
//! normalized against [`VirtualViewport`].

mod rect;
mod viewport;

pub use rect::{SubRect, VirtualRect};
pub use viewport::VirtualViewport;
