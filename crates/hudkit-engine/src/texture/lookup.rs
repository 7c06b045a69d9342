use std::collections::HashMap;

use super::TextureInfo;

/// Name of the entry used when a requested texture is missing.
pub const MISSING_TEXTURE: &str = "missing_texture";

/// Source of atlas locations for named (or hashed) textures.
pub trait TextureLookup {
    fn lookup(&self, name: &str) -> Option<TextureInfo>;
}

/// Resolves `name`, falling back to [`MISSING_TEXTURE`] and then to
/// [`TextureInfo::PLACEHOLDER`]. Never fails: a missing texture must not cost a frame.
pub fn resolve<L: TextureLookup + ?Sized>(textures: &L, name: &str) -> TextureInfo {
    if let Some(info) = textures.lookup(name) {
        return info;
    }
    log::warn!("texture {name:?} not found; using {MISSING_TEXTURE}");
    textures
        .lookup(MISSING_TEXTURE)
        .unwrap_or(TextureInfo::PLACEHOLDER)
}

/// Plain name → location table.
#[derive(Debug, Default, Clone)]
pub struct TextureTable {
    entries: HashMap<String, TextureInfo>,
}

impl TextureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an entry, returning the previous location.
    pub fn insert(&mut self, name: impl Into<String>, info: TextureInfo) -> Option<TextureInfo> {
        self.entries.insert(name.into(), info)
    }

    pub fn remove(&mut self, name: &str) -> Option<TextureInfo> {
        self.entries.remove(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TextureLookup for TextureTable {
    fn lookup(&self, name: &str) -> Option<TextureInfo> {
        self.entries.get(name).copied()
    }
}
