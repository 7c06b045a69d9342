use super::depth::depth_for_rank;

/// Stable reference to a pool slot.
///
/// Handles are slot indices tagged with the slot's generation. Freeing a slot
/// bumps its generation, so an old handle never aliases the slot's next
/// occupant.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ElementHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl ElementHandle {
    /// Backing slot index.
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// One textured, tinted rectangle.
///
/// Position and size are normalized (virtual units divided by the viewport).
/// Texture sub-region values are in 1/16 texel units.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualElement {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) w: f32,
    pub(crate) h: f32,
    pub(crate) depth_rank: u32,
    pub(crate) atlas: [u16; 4],
    pub(crate) sub_offset: [i16; 2],
    pub(crate) sub_size: [i16; 2],
    pub(crate) color: [u8; 4],
    pub(crate) free: bool,
    pub(crate) generation: u32,
}

impl VisualElement {
    pub(crate) fn vacant() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            w: 0.0,
            h: 0.0,
            depth_rank: 0,
            atlas: [0; 4],
            sub_offset: [0; 2],
            sub_size: [0; 2],
            color: [255; 4],
            free: true,
            generation: 0,
        }
    }

    #[inline]
    pub fn position(&self) -> [f32; 2] {
        [self.x, self.y]
    }

    #[inline]
    pub fn size(&self) -> [f32; 2] {
        [self.w, self.h]
    }

    /// Allocation-order rank; lower ranks are further back.
    #[inline]
    pub fn depth_rank(&self) -> u32 {
        self.depth_rank
    }

    /// Depth written to the vertex stream, in `(-1, 0]`. Later allocations are smaller.
    #[inline]
    pub fn depth(&self) -> f32 {
        depth_for_rank(self.depth_rank)
    }

    /// `[x, y, width, height]` in atlas texels, page folded into `y`.
    #[inline]
    pub fn atlas_rect(&self) -> [u16; 4] {
        self.atlas
    }

    #[inline]
    pub fn sub_offset(&self) -> [i16; 2] {
        self.sub_offset
    }

    #[inline]
    pub fn sub_size(&self) -> [i16; 2] {
        self.sub_size
    }

    /// RGBA tint.
    #[inline]
    pub fn color(&self) -> [u8; 4] {
        self.color
    }

    #[inline]
    pub fn alpha(&self) -> u8 {
        self.color[3]
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.free
    }
}
