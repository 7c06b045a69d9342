/// Depth attachment format expected by the overlay pipeline.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Target for one frame's overlay pass (encoder + attachments).
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
    /// Must be a [`DEPTH_FORMAT`] view the same size as `color_view`.
    pub depth_view: &'a wgpu::TextureView,
    pub surface_format: wgpu::TextureFormat,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(
        encoder: &'a mut wgpu::CommandEncoder,
        color_view: &'a wgpu::TextureView,
        depth_view: &'a wgpu::TextureView,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        Self {
            encoder,
            color_view,
            depth_view,
            surface_format,
        }
    }
}
