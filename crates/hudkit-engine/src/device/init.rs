use crate::render::DEPTH_FORMAT;
use crate::texture::ATLAS_SIZE;

/// Device and surface parameters for an overlay window.
///
/// Defaults target the smallest device that can run the overlay pass: one
/// texture-array atlas, a depth attachment, no optional features.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Backends wgpu may pick from.
    pub backends: wgpu::Backends,

    /// Adapter preference.
    ///
    /// The overlay is a single draw per frame; the low-power adapter is
    /// sufficient and avoids waking a discrete GPU on hybrid laptops.
    pub power_preference: wgpu::PowerPreference,

    /// Prefer an sRGB surface format when available.
    ///
    /// Atlas texels and tints are authored in sRGB.
    pub prefer_srgb: bool,

    /// Present mode.
    ///
    /// `AutoVsync` falls back to FIFO, which every surface supports.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// Ignored when the surface does not support it.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Atlas pages (texture array layers) the device must support.
    ///
    /// Folded into [`required_limits`](Self::required_limits) by
    /// [`device_limits`](Self::device_limits).
    pub atlas_pages: u32,

    /// Base limits requested from the adapter.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface.
    ///
    /// Hint only; support depends on platform and backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::LowPower,
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: None,
            atlas_pages: 1,
            required_limits: wgpu::Limits::downlevel_defaults(),
            desired_maximum_frame_latency: 2,
        }
    }
}

impl GpuInit {
    /// `required_limits` raised to what the overlay pass needs.
    pub fn device_limits(&self) -> wgpu::Limits {
        let mut limits = self.required_limits.clone();
        limits.max_texture_array_layers = limits.max_texture_array_layers.max(self.atlas_pages);
        limits.max_texture_dimension_2d = limits
            .max_texture_dimension_2d
            .max(u32::from(ATLAS_SIZE));
        limits
    }

    /// Checks that `adapter` can host the overlay before a device is requested.
    pub fn check_adapter(&self, adapter: &wgpu::Adapter) -> anyhow::Result<()> {
        let supported = adapter.limits();
        let needed = self.device_limits();
        anyhow::ensure!(
            supported.max_texture_array_layers >= needed.max_texture_array_layers,
            "adapter supports {} texture array layers, atlas needs {}",
            supported.max_texture_array_layers,
            needed.max_texture_array_layers
        );
        anyhow::ensure!(
            supported.max_texture_dimension_2d >= needed.max_texture_dimension_2d,
            "adapter max 2D texture size {} is below the atlas page size {ATLAS_SIZE}",
            supported.max_texture_dimension_2d
        );

        let depth = adapter.get_texture_format_features(DEPTH_FORMAT);
        anyhow::ensure!(
            depth
                .allowed_usages
                .contains(wgpu::TextureUsages::RENDER_ATTACHMENT),
            "adapter cannot render to {DEPTH_FORMAT:?}"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_cover_one_atlas_page() {
        let limits = GpuInit::default().device_limits();
        assert!(limits.max_texture_array_layers >= 1);
        assert!(limits.max_texture_dimension_2d >= u32::from(ATLAS_SIZE));
    }

    #[test]
    fn atlas_pages_raise_layer_limit() {
        let init = GpuInit {
            atlas_pages: 4096,
            ..GpuInit::default()
        };
        assert_eq!(init.device_limits().max_texture_array_layers, 4096);
    }

    #[test]
    fn larger_base_limits_are_kept() {
        let init = GpuInit {
            required_limits: wgpu::Limits::default(),
            ..GpuInit::default()
        };
        assert_eq!(
            init.device_limits().max_texture_dimension_2d,
            wgpu::Limits::default().max_texture_dimension_2d
        );
    }
}
