/// Rectangle in virtual viewport units (top-left origin, +Y down).
///
/// Layout anchoring is resolved by the caller; this is the final placement.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct VirtualRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl VirtualRect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

/// Sub-region of a texture in texels, relative to the texture's own origin.
///
/// Offsets may exceed the texture size; the shader wraps them, which is how
/// tiled backgrounds are drawn from a single small texture.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct SubRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl SubRect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Covers a whole `width`×`height` texture.
    #[inline]
    pub const fn full(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }
}
