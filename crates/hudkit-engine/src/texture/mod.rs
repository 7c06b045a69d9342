//! Texture references.
//!
//! The atlas itself is owned elsewhere; this module only describes where a
//! texture lives in it and how a missing one is substituted.

mod info;
mod lookup;

pub use info::{TextureInfo, ATLAS_SIZE};
pub use lookup::{resolve, TextureLookup, TextureTable, MISSING_TEXTURE};
