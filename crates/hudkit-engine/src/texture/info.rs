/// Edge length of one atlas page in texels.
///
/// Pages are stacked vertically in texture-info space: page `n` starts at
/// `y = n * ATLAS_SIZE`. The shader divides it back out to pick the array layer.
pub const ATLAS_SIZE: u16 = 1024;

/// Location of a texture inside the atlas, as reported by the atlas owner.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct TextureInfo {
    /// Atlas page (texture array layer).
    pub atlas: u16,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl TextureInfo {
    /// Stand-in used when neither the requested texture nor the lookup's
    /// missing-texture entry exist: the first texel of page 0.
    pub const PLACEHOLDER: Self = Self::new(0, 0, 0, 1, 1);

    #[inline]
    pub const fn new(atlas: u16, x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            atlas,
            x,
            y,
            width,
            height,
        }
    }

    /// `[x, y, width, height]` with the page folded into `y`, as packed into vertices.
    #[inline]
    pub fn atlas_rect(&self) -> [u16; 4] {
        let page_y = self.atlas.saturating_mul(ATLAS_SIZE).saturating_add(self.y);
        [self.x, page_y, self.width, self.height]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_zero_keeps_y() {
        let t = TextureInfo::new(0, 16, 32, 8, 8);
        assert_eq!(t.atlas_rect(), [16, 32, 8, 8]);
    }

    #[test]
    fn page_is_folded_into_y() {
        let t = TextureInfo::new(2, 16, 32, 8, 8);
        assert_eq!(t.atlas_rect(), [16, 2 * ATLAS_SIZE + 32, 8, 8]);
    }

    #[test]
    fn out_of_range_page_saturates() {
        let t = TextureInfo::new(200, 0, 10, 1, 1);
        assert_eq!(t.atlas_rect()[1], u16::MAX);
    }
}
