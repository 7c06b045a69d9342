use std::collections::HashMap;
use std::num::NonZeroU32;

use crate::gpu::{
    AttributeFormat, BufferId, BufferTarget, BufferUsage, GpuDriver, GpuError, VertexLayout,
};

use super::{RenderTarget, DEPTH_FORMAT};

const ALIGN: usize = wgpu::COPY_BUFFER_ALIGNMENT as usize;

#[inline]
fn padded_len(len: usize) -> usize {
    len.div_ceil(ALIGN) * ALIGN
}

fn vertex_format(format: AttributeFormat) -> wgpu::VertexFormat {
    match format {
        AttributeFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
        AttributeFormat::Uint16x4 => wgpu::VertexFormat::Uint16x4,
        AttributeFormat::Sint16x2 => wgpu::VertexFormat::Sint16x2,
        AttributeFormat::Unorm8x4 => wgpu::VertexFormat::Unorm8x4,
    }
}

/// Writes `data`, padding the tail to the copy alignment when needed.
fn write_padded(
    queue: &wgpu::Queue,
    pad: &mut Vec<u8>,
    buffer: &wgpu::Buffer,
    offset: usize,
    data: &[u8],
) {
    if data.is_empty() {
        return;
    }
    if data.len() % ALIGN == 0 {
        queue.write_buffer(buffer, offset as u64, data);
        return;
    }
    pad.clear();
    pad.extend_from_slice(data);
    pad.resize(padded_len(data.len()), 0);
    queue.write_buffer(buffer, offset as u64, pad);
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct PipelineKey {
    format: wgpu::TextureFormat,
    blend: bool,
    depth_write: bool,
    layout: &'static VertexLayout,
}

#[derive(Debug, Copy, Clone)]
struct PendingDraw {
    buffer: BufferId,
    first: u32,
    count: u32,
    blend: bool,
    depth_write: bool,
    layout: &'static VertexLayout,
}

impl PendingDraw {
    fn key(&self, format: wgpu::TextureFormat) -> PipelineKey {
        PipelineKey {
            format,
            blend: self.blend,
            depth_write: self.depth_write,
            layout: self.layout,
        }
    }
}

struct DeviceBuffer {
    buffer: Option<wgpu::Buffer>,
    /// Logical length; the allocation is this rounded up to [`ALIGN`].
    len: usize,
}

/// [`GpuDriver`] on top of wgpu.
///
/// wgpu has no global bind state or immediate-mode draws, so this driver
/// emulates them: binds and render state are tracked here, buffer writes go
/// through the queue, and draw calls are collected until [`encode`](Self::encode)
/// replays them into a render pass.
///
/// Full re-specification allocates a fresh `wgpu::Buffer`; mappings are staged
/// on the CPU and written with `Queue::write_buffer` on unmap.
pub struct WgpuDriver {
    device: wgpu::Device,
    queue: wgpu::Queue,

    next_id: u32,
    buffers: HashMap<BufferId, DeviceBuffer>,
    bound: HashMap<BufferTarget, BufferId>,

    staging: Vec<u8>,
    mapped: Option<BufferTarget>,
    pad: Vec<u8>,

    layout: Option<&'static VertexLayout>,
    blend: bool,
    depth_write: bool,
    clear_depth: bool,
    draws: Vec<PendingDraw>,

    shader: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    sampler: wgpu::Sampler,
    atlas_bind_group: wgpu::BindGroup,

    // Bound until the owner supplies a real atlas.
    _fallback_atlas: wgpu::Texture,
}

impl WgpuDriver {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("hudkit overlay shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/overlay.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("hudkit overlay bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2Array,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("hudkit overlay pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        // Pixel-art atlas: no filtering between texels.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("hudkit overlay sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let fallback_atlas = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("hudkit fallback atlas"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &fallback_atlas,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &[255; 4],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        let fallback_view = fallback_atlas.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });
        let atlas_bind_group =
            create_atlas_bind_group(device, &bind_group_layout, &fallback_view, &sampler);

        Self {
            device: device.clone(),
            queue: queue.clone(),
            next_id: 1,
            buffers: HashMap::new(),
            bound: HashMap::new(),
            staging: Vec::new(),
            mapped: None,
            pad: Vec::new(),
            layout: None,
            blend: false,
            depth_write: true,
            clear_depth: false,
            draws: Vec::new(),
            shader,
            bind_group_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            sampler,
            atlas_bind_group,
            _fallback_atlas: fallback_atlas,
        }
    }

    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Binds the texture atlas sampled by the overlay shader.
    ///
    /// `view` must be a `D2Array` view of a filterable float format whose
    /// pages are `texture::ATLAS_SIZE` texels square.
    pub fn set_atlas(&mut self, view: &wgpu::TextureView) {
        self.atlas_bind_group =
            create_atlas_bind_group(&self.device, &self.bind_group_layout, view, &self.sampler);
        log::debug!("overlay atlas rebound");
    }

    /// Records the draws collected since the last call into one render pass.
    ///
    /// Color is loaded, not cleared; the overlay composites over what is
    /// already in `target`.
    pub fn encode(&mut self, target: &mut RenderTarget<'_>) {
        let clear_depth = std::mem::take(&mut self.clear_depth);
        if self.draws.is_empty() && !clear_depth {
            return;
        }

        let mut draws = std::mem::take(&mut self.draws);
        for draw in &draws {
            self.ensure_pipeline(draw.key(target.surface_format));
        }

        {
            let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("hudkit overlay pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: if clear_depth {
                            wgpu::LoadOp::Clear(1.0)
                        } else {
                            wgpu::LoadOp::Load
                        },
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_bind_group(0, &self.atlas_bind_group, &[]);

            for draw in &draws {
                let Some(pipeline) = self.pipelines.get(&draw.key(target.surface_format)) else {
                    continue;
                };
                let Some(buffer) = self.buffers.get(&draw.buffer).and_then(|b| b.buffer.as_ref())
                else {
                    log::warn!("draw references released buffer {}; skipped", draw.buffer);
                    continue;
                };
                rpass.set_pipeline(pipeline);
                rpass.set_vertex_buffer(0, buffer.slice(..));
                rpass.draw(draw.first..draw.first + draw.count, 0..1);
            }
        }

        draws.clear();
        self.draws = draws;
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }

        let attributes: Vec<wgpu::VertexAttribute> = key
            .layout
            .attributes
            .iter()
            .map(|a| wgpu::VertexAttribute {
                format: vertex_format(a.format),
                offset: a.offset as u64,
                shader_location: a.location,
            })
            .collect();

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("hudkit overlay pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: key.layout.stride as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: key.format,
                    blend: key.blend.then_some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            // Depth is the draw order: later allocations carry smaller depth.
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: key.depth_write,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!(
            "created overlay pipeline (format {:?}, blend {}, depth write {})",
            key.format,
            key.blend,
            key.depth_write
        );
        self.pipelines.insert(key, pipeline);
    }

    fn bound_buffer(&self, target: BufferTarget) -> Result<BufferId, GpuError> {
        let id = self
            .bound
            .get(&target)
            .copied()
            .ok_or(GpuError::NothingBound(target))?;
        if self.buffers.contains_key(&id) {
            Ok(id)
        } else {
            Err(GpuError::UnknownBuffer(id))
        }
    }

    /// Checks a write of `len` bytes at `offset` against wgpu's copy alignment.
    fn check_alignment(offset: usize, len: usize, buffer_len: usize) -> Result<(), GpuError> {
        if offset % ALIGN != 0 {
            return Err(GpuError::Misaligned {
                offset,
                align: ALIGN,
            });
        }
        let end = offset + len;
        // A ragged tail is only safe where it runs into allocation padding.
        if end % ALIGN != 0 && end != buffer_len {
            return Err(GpuError::Misaligned {
                offset: end,
                align: ALIGN,
            });
        }
        Ok(())
    }
}

fn create_atlas_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("hudkit overlay bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

impl GpuDriver for WgpuDriver {
    fn create_buffer(&mut self) -> BufferId {
        let raw = NonZeroU32::new(self.next_id).unwrap_or(NonZeroU32::MIN);
        self.next_id = self.next_id.wrapping_add(1).max(1);
        let id = BufferId::new(raw);
        self.buffers.insert(id, DeviceBuffer { buffer: None, len: 0 });
        id
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId) {
        self.bound.insert(target, buffer);
    }

    fn buffer_data(
        &mut self,
        target: BufferTarget,
        data: &[u8],
        _usage: BufferUsage,
    ) -> Result<(), GpuError> {
        if self.mapped.is_some() {
            return Err(GpuError::AlreadyMapped(target));
        }
        let id = self.bound_buffer(target)?;

        let usage = match target {
            BufferTarget::Array => wgpu::BufferUsages::VERTEX,
            BufferTarget::ElementArray => wgpu::BufferUsages::INDEX,
        } | wgpu::BufferUsages::COPY_DST;

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("hudkit overlay buffer"),
            size: padded_len(data.len()).max(ALIGN) as u64,
            usage,
            mapped_at_creation: false,
        });
        write_padded(&self.queue, &mut self.pad, &buffer, 0, data);

        let slot = self.buffers.get_mut(&id).ok_or(GpuError::UnknownBuffer(id))?;
        slot.buffer = Some(buffer);
        slot.len = data.len();
        Ok(())
    }

    fn buffer_sub_data(
        &mut self,
        target: BufferTarget,
        offset: usize,
        data: &[u8],
    ) -> Result<(), GpuError> {
        let id = self.bound_buffer(target)?;
        let slot = self.buffers.get(&id).ok_or(GpuError::UnknownBuffer(id))?;

        if offset.checked_add(data.len()).is_none_or(|end| end > slot.len) {
            return Err(GpuError::OutOfRange {
                offset,
                len: data.len(),
                capacity: slot.len,
            });
        }
        Self::check_alignment(offset, data.len(), slot.len)?;

        if let Some(buffer) = slot.buffer.as_ref() {
            write_padded(&self.queue, &mut self.pad, buffer, offset, data);
        }
        Ok(())
    }

    fn map_buffer(&mut self, target: BufferTarget, len: usize) -> Result<(), GpuError> {
        if self.mapped.is_some() {
            return Err(GpuError::AlreadyMapped(target));
        }
        let id = self.bound_buffer(target)?;
        let slot = self.buffers.get(&id).ok_or(GpuError::UnknownBuffer(id))?;
        if len > slot.len {
            return Err(GpuError::OutOfRange {
                offset: 0,
                len,
                capacity: slot.len,
            });
        }
        Self::check_alignment(0, len, slot.len)?;

        self.staging.clear();
        self.staging.resize(len, 0);
        self.mapped = Some(target);
        Ok(())
    }

    fn mapped(&self) -> &[u8] {
        if self.mapped.is_some() {
            &self.staging
        } else {
            &[]
        }
    }

    fn mapped_mut(&mut self) -> &mut [u8] {
        if self.mapped.is_some() {
            &mut self.staging
        } else {
            &mut []
        }
    }

    fn unmap_buffer(&mut self, target: BufferTarget) {
        if self.mapped.take().is_none() {
            return;
        }
        let Some(buffer) = self
            .bound
            .get(&target)
            .and_then(|id| self.buffers.get(id))
            .and_then(|slot| slot.buffer.as_ref())
        else {
            log::warn!("unmapped {target:?} with no buffer bound; mapping discarded");
            return;
        };
        write_padded(&self.queue, &mut self.pad, buffer, 0, &self.staging);
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
        self.bound.retain(|_, b| *b != buffer);
    }

    fn clear_depth(&mut self) {
        self.clear_depth = true;
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.depth_write = enabled;
    }

    fn set_blend(&mut self, enabled: bool) {
        self.blend = enabled;
    }

    fn bind_vertex_layout(&mut self, layout: &'static VertexLayout) {
        self.layout = Some(layout);
    }

    fn draw_triangles(&mut self, first: u32, count: u32) {
        let Some(layout) = self.layout else {
            log::warn!("draw without a vertex layout; skipped");
            return;
        };
        let Some(&buffer) = self.bound.get(&BufferTarget::Array) else {
            log::warn!("draw without an array buffer; skipped");
            return;
        };
        self.draws.push(PendingDraw {
            buffer,
            first,
            count,
            blend: self.blend,
            depth_write: self.depth_write,
            layout,
        });
    }
}
