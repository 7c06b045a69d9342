//! Element storage.
//!
//! [`ElementPool`] owns every overlay rectangle. Callers hold
//! [`ElementHandle`]s and mutate through the pool between frames.

mod depth;
mod element;
mod pool;

pub use depth::DEPTH_RANGE;
pub use element::{ElementHandle, VisualElement};
pub use pool::{ElementPool, SUB_TEXEL_SCALE};
