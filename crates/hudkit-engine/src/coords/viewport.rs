use super::VirtualRect;

/// Fixed virtual coordinate space that HUD layouts are authored in.
///
/// Elements are positioned in virtual units (e.g. 800×480) and stored divided
/// by these dimensions, so the GPU only ever sees `0..1` coordinates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VirtualViewport {
    pub width: f32,
    pub height: f32,
}

impl VirtualViewport {
    /// The classic 800×480 HUD space.
    pub const DEFAULT: Self = Self::new(800.0, 480.0);

    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    #[inline]
    pub fn normalize_x(self, x: f32) -> f32 {
        x / self.width
    }

    #[inline]
    pub fn normalize_y(self, y: f32) -> f32 {
        y / self.height
    }

    /// Converts a virtual-unit rectangle to normalized `[x, y, w, h]`.
    #[inline]
    pub fn normalize(self, r: VirtualRect) -> [f32; 4] {
        [
            self.normalize_x(r.x),
            self.normalize_y(r.y),
            self.normalize_x(r.w),
            self.normalize_y(r.h),
        ]
    }
}

impl Default for VirtualViewport {
    fn default() -> Self {
        Self::DEFAULT
    }
}
