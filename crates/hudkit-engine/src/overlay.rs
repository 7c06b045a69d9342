//! Caller-facing overlay state.

use crate::config::OverlayConfig;
use crate::coords::{SubRect, VirtualRect, VirtualViewport};
use crate::element::{ElementHandle, ElementPool, VisualElement};
use crate::gpu::{GpuContext, GpuDriver, GpuError};
use crate::render::{FrameCompositor, FrameStats};
use crate::texture::{self, TextureInfo, TextureLookup};

/// One overlay: the element pool plus the GPU resources that draw it.
///
/// Single-threaded and owned; every operation takes `&mut self`. Element
/// edits are cheap CPU writes and only reach the GPU on [`render_frame`].
///
/// [`render_frame`]: Overlay::render_frame
pub struct Overlay<D: GpuDriver> {
    gpu: GpuContext<D>,
    pool: ElementPool,
    compositor: FrameCompositor,
}

impl<D: GpuDriver> Overlay<D> {
    /// Takes ownership of `driver` and creates the overlay's vertex buffer.
    pub fn new(driver: D, config: OverlayConfig) -> Self {
        let viewport = if config.viewport.is_valid() {
            config.viewport
        } else {
            log::warn!(
                "invalid overlay viewport {:?}; using {:?}",
                config.viewport,
                VirtualViewport::DEFAULT
            );
            VirtualViewport::DEFAULT
        };

        let mut gpu = GpuContext::new(driver);
        let compositor = FrameCompositor::new(&mut gpu, config.buffer_usage, config.scratch_bytes);
        log::debug!(
            "overlay created ({}x{} virtual, {} slots reserved, buffer {})",
            viewport.width,
            viewport.height,
            config.initial_slots,
            compositor.buffer().id()
        );

        Self {
            gpu,
            pool: ElementPool::with_capacity(viewport, config.initial_slots),
            compositor,
        }
    }

    pub fn create_element(
        &mut self,
        texture: TextureInfo,
        bounds: VirtualRect,
        sub: SubRect,
    ) -> ElementHandle {
        self.pool.create(texture, bounds, sub)
    }

    /// Like [`create_element`](Self::create_element), resolving `name` first.
    /// Missing names fall back to the missing-texture entry.
    pub fn create_named<L: TextureLookup + ?Sized>(
        &mut self,
        textures: &L,
        name: &str,
        bounds: VirtualRect,
        sub: SubRect,
    ) -> ElementHandle {
        let info = texture::resolve(textures, name);
        self.pool.create(info, bounds, sub)
    }

    /// Moves an element by a delta in virtual units.
    #[inline]
    pub fn shift_element(&mut self, handle: ElementHandle, dx: f32, dy: f32) -> bool {
        self.pool.shift(handle, dx, dy)
    }

    #[inline]
    pub fn set_alpha(&mut self, handle: ElementHandle, alpha: f32) -> bool {
        self.pool.set_alpha(handle, alpha)
    }

    #[inline]
    pub fn set_tint(&mut self, handle: ElementHandle, r: u8, g: u8, b: u8) -> bool {
        self.pool.set_tint(handle, r, g, b)
    }

    #[inline]
    pub fn set_texture(&mut self, handle: ElementHandle, texture: TextureInfo, sub: SubRect) -> bool {
        self.pool.set_texture(handle, texture, sub)
    }

    #[inline]
    pub fn set_bounds(&mut self, handle: ElementHandle, bounds: VirtualRect) -> bool {
        self.pool.set_bounds(handle, bounds)
    }

    /// Releases an element. Freeing twice, or through a stale handle, is a no-op.
    #[inline]
    pub fn free_element(&mut self, handle: ElementHandle) -> bool {
        self.pool.free(handle)
    }

    #[inline]
    pub fn element(&self, handle: ElementHandle) -> Option<&VisualElement> {
        self.pool.get(handle)
    }

    #[inline]
    pub fn pool(&self) -> &ElementPool {
        &self.pool
    }

    /// Packs every live element and issues at most one draw.
    pub fn render_frame(&mut self) -> Result<FrameStats, GpuError> {
        let stats = self.compositor.render_frame(&mut self.gpu, &self.pool)?;
        log::trace!(
            "overlay frame: {} vertices, {} bytes, {:?}, {} draw(s)",
            stats.vertex_count,
            stats.byte_len,
            stats.upload,
            stats.draw_calls
        );
        Ok(stats)
    }

    #[inline]
    pub fn gpu(&self) -> &GpuContext<D> {
        &self.gpu
    }

    #[inline]
    pub fn driver(&self) -> &D {
        self.gpu.driver()
    }

    /// Direct driver access (e.g. to encode a pass).
    ///
    /// Binding state the driver changes behind the overlay's back must be
    /// reported through [`GpuContext::invalidate_bindings`].
    #[inline]
    pub fn driver_mut(&mut self) -> &mut D {
        self.gpu.driver_mut()
    }

    /// Releases the vertex buffer and hands the driver back.
    pub fn destroy(mut self) -> D {
        self.compositor.destroy(&mut self.gpu);
        log::debug!("overlay destroyed");
        self.gpu.into_driver()
    }
}
