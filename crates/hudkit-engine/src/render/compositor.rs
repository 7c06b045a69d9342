use crate::element::ElementPool;
use crate::gpu::{Buffer, BufferTarget, BufferUsage, GpuContext, GpuDriver, GpuError};
use crate::pack::{pack_element, VERTEX_LAYOUT};

/// How the vertex stream reached the GPU this frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UploadKind {
    /// Nothing live; no upload and no draw.
    Skipped,
    /// Backing store replaced and grown.
    Full,
    /// Written into the existing allocation through a mapping.
    Partial,
}

/// Summary of one composited frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FrameStats {
    pub vertex_count: u32,
    pub byte_len: usize,
    pub upload: UploadKind,
    pub draw_calls: u32,
}

/// Packs the pool into one vertex buffer and draws it with a single call.
///
/// Upload policy: the buffer only ever grows. A frame larger than anything
/// uploaded before re-specifies the buffer and raises the high-water mark;
/// every other frame maps the existing allocation and overwrites its prefix.
#[derive(Debug)]
pub struct FrameCompositor {
    buffer: Buffer,
    usage: BufferUsage,
    scratch: Vec<u8>,
    vertex_count: u32,
    high_water: Option<usize>,
}

impl FrameCompositor {
    pub fn new<D: GpuDriver>(gpu: &mut GpuContext<D>, usage: BufferUsage, scratch_bytes: usize) -> Self {
        Self {
            buffer: Buffer::create(gpu),
            usage,
            scratch: Vec::with_capacity(scratch_bytes),
            vertex_count: 0,
            high_water: None,
        }
    }

    /// Composites every live element and issues the frame's draw call.
    pub fn render_frame<D: GpuDriver>(
        &mut self,
        gpu: &mut GpuContext<D>,
        pool: &ElementPool,
    ) -> Result<FrameStats, GpuError> {
        self.vertex_count = 0;
        self.scratch.clear();

        for element in pool.slots() {
            if element.is_free() {
                continue;
            }
            self.vertex_count += pack_element(element, &mut self.scratch) as u32;
        }

        if self.vertex_count == 0 {
            return Ok(FrameStats {
                vertex_count: 0,
                byte_len: 0,
                upload: UploadKind::Skipped,
                draw_calls: 0,
            });
        }

        // Overlay must not clip against whatever was drawn underneath.
        gpu.driver.clear_depth();
        gpu.driver.set_depth_write(true);
        gpu.driver.set_blend(true);
        gpu.driver.bind_vertex_layout(&VERTEX_LAYOUT);
        self.buffer.bind(gpu, BufferTarget::Array);

        let upload = match self.upload(gpu) {
            Ok(kind) => kind,
            Err(e) => {
                gpu.driver.set_blend(false);
                return Err(e);
            }
        };

        gpu.driver.draw_triangles(0, self.vertex_count);
        gpu.driver.set_blend(false);

        Ok(FrameStats {
            vertex_count: self.vertex_count,
            byte_len: self.scratch.len(),
            upload,
            draw_calls: 1,
        })
    }

    fn upload<D: GpuDriver>(&mut self, gpu: &mut GpuContext<D>) -> Result<UploadKind, GpuError> {
        let len = self.scratch.len();

        if self.high_water.is_none_or(|hw| len > hw) {
            self.buffer.data(gpu, &self.scratch, self.usage)?;
            log::debug!(
                "overlay vertex buffer grown to {len} bytes ({} vertices)",
                self.vertex_count
            );
            self.high_water = Some(len);
            return Ok(UploadKind::Full);
        }

        let mut mapped = self.buffer.map_write(gpu, len)?;
        debug_assert_eq!(mapped.len(), len, "driver mapped a different length");
        mapped.copy_from_slice(&self.scratch);
        Ok(UploadKind::Partial)
    }

    /// Largest byte length uploaded so far.
    #[inline]
    pub fn high_water(&self) -> Option<usize> {
        self.high_water
    }

    /// Vertices emitted by the last frame.
    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Packed bytes of the last frame.
    #[inline]
    pub fn packed(&self) -> &[u8] {
        &self.scratch
    }

    #[inline]
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Releases the GPU buffer.
    pub fn destroy<D: GpuDriver>(self, gpu: &mut GpuContext<D>) {
        self.buffer.delete(gpu);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{SubRect, VirtualRect, VirtualViewport};
    use crate::element::ElementHandle;
    use crate::gpu::{DriverCall, RecordingDriver};
    use crate::pack::{decode_vertices, VERTEX_SIZE};
    use crate::texture::TextureInfo;

    struct Rig {
        gpu: GpuContext<RecordingDriver>,
        pool: ElementPool,
        comp: FrameCompositor,
    }

    impl Rig {
        fn new() -> Self {
            let mut gpu = GpuContext::new(RecordingDriver::new());
            let comp = FrameCompositor::new(&mut gpu, BufferUsage::Dynamic, 0);
            Self {
                gpu,
                pool: ElementPool::new(VirtualViewport::DEFAULT),
                comp,
            }
        }

        fn add(&mut self, x: f32) -> ElementHandle {
            self.pool.create(
                TextureInfo::new(0, 0, 0, 16, 16),
                VirtualRect::new(x, 0.0, 16.0, 16.0),
                SubRect::full(16.0, 16.0),
            )
        }

        /// Keeps exactly `n` elements live.
        fn resize(&mut self, live: &mut Vec<ElementHandle>, n: usize) {
            while live.len() > n {
                let h = live.pop().unwrap();
                self.pool.free(h);
            }
            while live.len() < n {
                let h = self.add(live.len() as f32);
                live.push(h);
            }
        }

        fn frame(&mut self) -> FrameStats {
            self.comp.render_frame(&mut self.gpu, &self.pool).unwrap()
        }

        fn count(&self, pred: impl Fn(&DriverCall) -> bool) -> usize {
            self.gpu.driver().count(pred)
        }
    }

    fn is_full(c: &DriverCall) -> bool {
        matches!(c, DriverCall::BufferData { .. })
    }

    fn is_map(c: &DriverCall) -> bool {
        matches!(c, DriverCall::MapBuffer { .. })
    }

    fn is_draw(c: &DriverCall) -> bool {
        matches!(c, DriverCall::DrawTriangles { .. })
    }

    #[test]
    fn empty_pool_draws_nothing() {
        let mut rig = Rig::new();
        let stats = rig.frame();
        assert_eq!(stats.upload, UploadKind::Skipped);
        assert_eq!(stats.draw_calls, 0);
        assert_eq!(rig.count(is_draw), 0);
        assert_eq!(rig.count(is_full), 0);
        assert_eq!(rig.comp.high_water(), None);
    }

    #[test]
    fn three_elements_one_draw() {
        let mut rig = Rig::new();
        for x in [0.0, 20.0, 40.0] {
            rig.add(x);
        }
        let stats = rig.frame();
        assert_eq!(stats.vertex_count, 18);
        assert_eq!(stats.byte_len, 18 * VERTEX_SIZE);
        assert_eq!(stats.upload, UploadKind::Full);
        assert_eq!(rig.count(is_draw), 1);
        assert!(rig
            .gpu
            .driver()
            .calls()
            .contains(&DriverCall::DrawTriangles { first: 0, count: 18 }));

        let id = rig.comp.buffer().id();
        assert_eq!(rig.gpu.driver().contents(id), Some(rig.comp.packed()));
    }

    #[test]
    fn freed_elements_are_not_packed() {
        let mut rig = Rig::new();
        let _a = rig.add(0.0);
        let b = rig.add(20.0);
        let _c = rig.add(40.0);
        rig.pool.free(b);

        let stats = rig.frame();
        assert_eq!(stats.vertex_count, 12);
        let xs: Vec<f32> = decode_vertices(rig.comp.packed())
            .step_by(6)
            .map(|v| v.position[0])
            .collect();
        assert_eq!(xs, vec![0.0, 40.0 / 800.0]);
    }

    #[test]
    fn no_respecification_below_high_water() {
        let mut rig = Rig::new();
        let mut live = Vec::new();

        rig.resize(&mut live, 5);
        assert_eq!(rig.frame().upload, UploadKind::Full);

        for n in [3, 5, 1, 4, 5, 2] {
            rig.resize(&mut live, n);
            assert_eq!(rig.frame().upload, UploadKind::Partial, "{n} live");
        }
        assert_eq!(rig.count(is_full), 1);
        assert_eq!(rig.count(is_map), 6);

        rig.resize(&mut live, 6);
        assert_eq!(rig.frame().upload, UploadKind::Full);
        rig.resize(&mut live, 5);
        assert_eq!(rig.frame().upload, UploadKind::Partial);
        assert_eq!(rig.count(is_full), 2);
        assert_eq!(rig.comp.high_water(), Some(6 * 6 * VERTEX_SIZE));
    }

    #[test]
    fn partial_update_overwrites_prefix() {
        let mut rig = Rig::new();
        let mut live = Vec::new();
        rig.resize(&mut live, 4);
        rig.frame();
        rig.resize(&mut live, 2);
        rig.pool.set_tint(live[0], 1, 2, 3);
        rig.frame();

        let id = rig.comp.buffer().id();
        let contents = rig.gpu.driver().contents(id).unwrap();
        assert_eq!(contents.len(), 4 * 6 * VERTEX_SIZE);
        assert_eq!(&contents[..rig.comp.packed().len()], rig.comp.packed());
        assert!(!rig.gpu.driver().is_mapped());
    }

    #[test]
    fn buffer_bind_is_cached_across_frames() {
        let mut rig = Rig::new();
        rig.add(0.0);
        for _ in 0..5 {
            rig.frame();
        }
        assert_eq!(rig.count(|c| matches!(c, DriverCall::BindBuffer { .. })), 1);
        assert_eq!(rig.gpu.bindings().hits(), 4);
    }

    #[test]
    fn draw_state_is_set_and_restored() {
        let mut rig = Rig::new();
        rig.add(0.0);
        rig.frame();
        let calls = rig.gpu.driver().calls();

        let pos = |want: &DriverCall| calls.iter().position(|c| c == want).unwrap();
        let draw = calls.iter().position(is_draw).unwrap();
        assert!(pos(&DriverCall::ClearDepth) < draw);
        assert!(pos(&DriverCall::SetDepthWrite(true)) < draw);
        assert!(pos(&DriverCall::SetBlend(true)) < draw);
        assert!(pos(&DriverCall::BindVertexLayout { stride: VERTEX_SIZE }) < draw);
        assert_eq!(calls.last(), Some(&DriverCall::SetBlend(false)));
    }

    #[test]
    fn scratch_capacity_is_kept() {
        let mut rig = Rig::new();
        let mut live = Vec::new();
        rig.resize(&mut live, 10);
        rig.frame();
        let cap = rig.comp.scratch.capacity();
        rig.resize(&mut live, 1);
        rig.frame();
        assert_eq!(rig.comp.scratch.capacity(), cap);
    }

    #[test]
    fn destroy_releases_buffer() {
        let mut rig = Rig::new();
        let id = rig.comp.buffer().id();
        rig.add(0.0);
        rig.frame();
        rig.comp.destroy(&mut rig.gpu);
        assert_eq!(rig.gpu.driver().contents(id), None);
        assert_eq!(rig.gpu.bindings().current(), None);
    }

    #[test]
    fn upload_error_skips_draw_and_restores_blend() {
        let mut rig = Rig::new();
        rig.add(0.0);
        rig.frame();
        rig.gpu
            .driver_mut()
            .map_buffer(BufferTarget::Array, VERTEX_SIZE)
            .unwrap();

        // Growing frame: the full re-specification is refused.
        rig.add(20.0);
        let result = rig.comp.render_frame(&mut rig.gpu, &rig.pool);
        assert_eq!(result, Err(GpuError::AlreadyMapped(BufferTarget::Array)));
        assert_eq!(rig.gpu.driver().calls().last(), Some(&DriverCall::SetBlend(false)));
        assert_eq!(rig.count(is_draw), 1);
        assert_eq!(rig.comp.high_water(), Some(6 * VERTEX_SIZE));
    }

    #[test]
    fn mapping_error_skips_draw_and_restores_blend() {
        let mut rig = Rig::new();
        rig.add(0.0);
        rig.frame();
        rig.gpu
            .driver_mut()
            .map_buffer(BufferTarget::Array, VERTEX_SIZE)
            .unwrap();

        // Same size: the partial path tries to map again.
        let result = rig.comp.render_frame(&mut rig.gpu, &rig.pool);
        assert_eq!(result, Err(GpuError::AlreadyMapped(BufferTarget::Array)));
        assert_eq!(rig.gpu.driver().calls().last(), Some(&DriverCall::SetBlend(false)));
        assert_eq!(rig.count(is_draw), 1);
    }
}
