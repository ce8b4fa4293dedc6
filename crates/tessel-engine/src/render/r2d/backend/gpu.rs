use core::ops::Range;
use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::coords::{Mat3x2, PixelRect, Viewport};
use crate::paint::{Color, ColorAdd};
use crate::render::r2d::renderer::Renderer2D;
use crate::render::r2d::state::{
    Blend, BlendOp, BlendState, CullMode, FillMode, PixelShaderId, RasterizerState, SamplerState,
    TextureAddressMode, TextureFilter, VertexShaderId,
};
use crate::render::r2d::vertex::{IndexType, Vertex2D};
use crate::render::r2d::vertex_buffer::VertexBatch;
use crate::render::{RenderCtx, RenderTarget};

use super::Renderer2DBackend;

/// wgpu executor for [`Renderer2D`] command lists.
///
/// `render()` uploads the frame's batches, replays the command list to collect
/// draw packets (pipeline key, uniform snapshot, scissor, viewport), then
/// encodes every packet into a single render pass on top of the target.
///
/// Only the built-in shape shaders exist; `INVALID` and unknown shader ids
/// bind them. Only pixel-stage sampler slot 0 is bound.
#[derive(Default)]
pub struct WgpuRenderer2D {
    pipeline_format: Option<wgpu::TextureFormat>,
    shader: Option<wgpu::ShaderModule>,
    uniform_layout: Option<wgpu::BindGroupLayout>,
    texture_layout: Option<wgpu::BindGroupLayout>,
    pipeline_layout: Option<wgpu::PipelineLayout>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    uniform_ubo: Option<wgpu::Buffer>,
    uniform_bind_group: Option<wgpu::BindGroup>,
    uniform_capacity: usize,
    uniform_stride: u64,

    white_view: Option<wgpu::TextureView>,
    samplers: HashMap<SamplerState, wgpu::BindGroup>,

    batches: Vec<GpuBatch>,

    // per-frame replay output
    target: Viewport,
    target_size: (u32, u32),
    state: ReplayState,
    uniforms: Vec<ShapeUniform>,
    packets: Vec<DrawPacket>,

    warned_shader: bool,
    warned_wireframe: bool,
    warned_vs_sampler: bool,
}

impl WgpuRenderer2D {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws the flushed command list of `renderer` into `target`.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        renderer: &Renderer2D,
    ) {
        if !ctx.viewport.is_valid() {
            return;
        }

        self.ensure_layouts(ctx);
        self.upload_batches(ctx, renderer.buffers().batches());

        self.target = ctx.viewport;
        self.target_size = ctx.viewport.physical_size();
        self.state = ReplayState::default();
        self.uniforms.clear();
        self.packets.clear();

        renderer.replay(self);

        if self.packets.is_empty() {
            return;
        }

        self.ensure_pipelines(ctx);
        self.ensure_samplers(ctx);
        self.upload_uniforms(ctx);
        self.encode(target);
    }

    // ── resources ──────────────────────────────────────────────────────────

    fn ensure_layouts(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline_layout.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tessel shape2d shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/shape2d.wgsl").into()),
        });

        let uniform_layout =
            ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("tessel shape2d uniform bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<ShapeUniform>() as u64,
                        ),
                    },
                    count: None,
                }],
            });

        let texture_layout =
            ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("tessel shape2d texture bgl"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
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

        let pipeline_layout =
            ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("tessel shape2d pipeline layout"),
                bind_group_layouts: &[&uniform_layout, &texture_layout],
                immediate_size: 0,
            });

        let white = ctx.device.create_texture_with_data(
            ctx.queue,
            &wgpu::TextureDescriptor {
                label: Some("tessel shape2d white texture"),
                size: wgpu::Extent3d { width: 1, height: 1, depth_or_array_layers: 1 },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &[255u8; 4],
        );

        let alignment = ctx.device.limits().min_uniform_buffer_offset_alignment as u64;
        let size = std::mem::size_of::<ShapeUniform>() as u64;
        self.uniform_stride = size.div_ceil(alignment) * alignment;

        log::debug!(
            "tessel: 2D pipeline layout for {:?} (uniform stride {})",
            ctx.surface_format,
            self.uniform_stride
        );

        self.pipeline_format = Some(ctx.surface_format);
        self.shader = Some(shader);
        self.uniform_layout = Some(uniform_layout);
        self.texture_layout = Some(texture_layout);
        self.pipeline_layout = Some(pipeline_layout);
        self.white_view = Some(white.create_view(&wgpu::TextureViewDescriptor::default()));

        self.pipelines.clear();
        self.samplers.clear();
        self.uniform_ubo = None;
        self.uniform_bind_group = None;
        self.uniform_capacity = 0;
    }

    fn upload_batches(&mut self, ctx: &RenderCtx<'_>, batches: &[VertexBatch]) {
        if self.batches.len() < batches.len() {
            self.batches.resize_with(batches.len(), GpuBatch::default);
        }

        for (i, (gpu, cpu)) in self.batches.iter_mut().zip(batches).enumerate() {
            if cpu.is_empty() {
                continue;
            }
            gpu.ensure_capacity(ctx, i, cpu.vertices().len(), cpu.indices().len());

            if let (Some(vbo), Some(ibo)) = (gpu.vbo.as_ref(), gpu.ibo.as_ref()) {
                ctx.queue.write_buffer(vbo, 0, bytemuck::cast_slice(cpu.vertices()));
                ctx.queue.write_buffer(ibo, 0, &index_bytes(cpu.indices()));
            }
        }
    }

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        let Some(format) = self.pipeline_format else { return };
        let Some(shader) = self.shader.as_ref() else { return };
        let Some(layout) = self.pipeline_layout.as_ref() else { return };

        let wireframe_supported = ctx.supports(wgpu::Features::POLYGON_MODE_LINE);

        for packet in &self.packets {
            if self.pipelines.contains_key(&packet.key) {
                continue;
            }

            let key = packet.key;
            let polygon_mode = match key.rasterizer.fill_mode {
                FillMode::Solid => wgpu::PolygonMode::Fill,
                FillMode::Wireframe if wireframe_supported => wgpu::PolygonMode::Line,
                FillMode::Wireframe => {
                    if !self.warned_wireframe {
                        self.warned_wireframe = true;
                        log::warn!("tessel: wireframe fill needs POLYGON_MODE_LINE; drawing solid");
                    }
                    wgpu::PolygonMode::Fill
                }
            };

            let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("tessel shape2d pipeline"),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[Vertex2D::layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: to_wgpu_blend(&key.blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Cw,
                    cull_mode: match key.rasterizer.cull_mode {
                        CullMode::Off => None,
                        CullMode::Front => Some(wgpu::Face::Front),
                        CullMode::Back => Some(wgpu::Face::Back),
                    },
                    polygon_mode,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

            log::debug!("tessel: created 2D pipeline {key:?}");
            self.pipelines.insert(key, pipeline);
        }
    }

    fn ensure_samplers(&mut self, ctx: &RenderCtx<'_>) {
        let Some(layout) = self.texture_layout.as_ref() else { return };
        let Some(white) = self.white_view.as_ref() else { return };

        let border_supported = ctx.supports(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER);

        for packet in &self.packets {
            if self.samplers.contains_key(&packet.sampler) {
                continue;
            }

            let sampler = ctx.device.create_sampler(&to_wgpu_sampler(&packet.sampler, border_supported));
            let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("tessel shape2d texture bind group"),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(white),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&sampler),
                    },
                ],
            });
            self.samplers.insert(packet.sampler, bind_group);
        }
    }

    fn upload_uniforms(&mut self, ctx: &RenderCtx<'_>) {
        let required = self.uniforms.len();
        if required > self.uniform_capacity || self.uniform_ubo.is_none() {
            let Some(layout) = self.uniform_layout.as_ref() else { return };

            let new_cap = required.next_power_of_two().max(64);
            let ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tessel shape2d uniform ubo"),
                size: new_cap as u64 * self.uniform_stride,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("tessel shape2d uniform bind group"),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &ubo,
                        offset: 0,
                        size: wgpu::BufferSize::new(std::mem::size_of::<ShapeUniform>() as u64),
                    }),
                }],
            });

            self.uniform_ubo = Some(ubo);
            self.uniform_bind_group = Some(bind_group);
            self.uniform_capacity = new_cap;
        }

        let Some(ubo) = self.uniform_ubo.as_ref() else { return };

        let stride = self.uniform_stride as usize;
        let mut bytes = vec![0u8; self.uniforms.len() * stride];
        for (chunk, u) in bytes.chunks_exact_mut(stride).zip(&self.uniforms) {
            chunk[..std::mem::size_of::<ShapeUniform>()].copy_from_slice(bytemuck::bytes_of(u));
        }
        ctx.queue.write_buffer(ubo, 0, &bytes);
    }

    // ── encoding ───────────────────────────────────────────────────────────

    fn encode(&self, target: &mut RenderTarget<'_>) {
        let Some(uniform_bind_group) = self.uniform_bind_group.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tessel 2d pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let mut bound_key = None;
        let mut bound_batch = None;
        let mut bound_sampler = None;

        for packet in &self.packets {
            let Some(pipeline) = self.pipelines.get(&packet.key) else { continue };
            let Some(sampler) = self.samplers.get(&packet.sampler) else { continue };
            let Some(batch) = self.batches.get(packet.batch as usize) else { continue };
            let (Some(vbo), Some(ibo)) = (batch.vbo.as_ref(), batch.ibo.as_ref()) else { continue };

            if bound_key != Some(packet.key) {
                rpass.set_pipeline(pipeline);
                bound_key = Some(packet.key);
            }
            if bound_sampler != Some(packet.sampler) {
                rpass.set_bind_group(1, sampler, &[]);
                bound_sampler = Some(packet.sampler);
            }
            if bound_batch != Some(packet.batch) {
                rpass.set_vertex_buffer(0, vbo.slice(..));
                rpass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint16);
                bound_batch = Some(packet.batch);
            }

            let offset = (packet.uniform as u64 * self.uniform_stride) as u32;
            rpass.set_bind_group(0, uniform_bind_group, &[offset]);

            let [vx, vy, vw, vh] = packet.viewport;
            rpass.set_viewport(vx, vy, vw, vh, 0.0, 1.0);
            let (sx, sy, sw, sh) = packet.scissor;
            rpass.set_scissor_rect(sx, sy, sw, sh);

            rpass.draw_indexed(packet.indices.clone(), 0, 0..1);
        }
    }

    // ── replay helpers ─────────────────────────────────────────────────────

    fn resolve_vs(&mut self, id: VertexShaderId) -> VertexShaderId {
        if id != VertexShaderId::SHAPE && !id.is_invalid() {
            self.warn_unknown_shader();
        }
        VertexShaderId::SHAPE
    }

    fn resolve_ps(&mut self, id: PixelShaderId) -> PixelShaderId {
        if id != PixelShaderId::SHAPE && !id.is_invalid() {
            self.warn_unknown_shader();
        }
        PixelShaderId::SHAPE
    }

    fn warn_unknown_shader(&mut self) {
        if !self.warned_shader {
            self.warned_shader = true;
            log::warn!("tessel: unknown shader id; using the built-in shape shader");
        }
    }

    /// Viewport rect in physical pixels and the logical size it maps.
    fn active_viewport(&self) -> ([f32; 4], Viewport) {
        let (tw, th) = self.target_size;
        let full = ([0.0, 0.0, tw as f32, th as f32], self.target);

        let Some(rect) = self.state.viewport else { return full };
        let Some((x, y, w, h)) = rect.clamp_to(tw, th) else { return full };

        let scale = self.target.scale_factor;
        let logical = Viewport::new(w as f32 / scale, h as f32 / scale, scale);
        ([x as f32, y as f32, w as f32, h as f32], logical)
    }

    /// Scissor rect for the next draw, or `None` if it clips everything.
    fn active_scissor(&self) -> Option<(u32, u32, u32, u32)> {
        let (tw, th) = self.target_size;
        if !self.state.rasterizer.scissor_enable {
            return Some((0, 0, tw, th));
        }
        match self.state.scissor {
            Some(rect) => rect.clamp_to(tw, th),
            None => Some((0, 0, tw, th)),
        }
    }
}

impl Renderer2DBackend for WgpuRenderer2D {
    fn set_buffers(&mut self) {}

    fn update_buffers(&mut self, batch_index: u32, batch: &VertexBatch) {
        self.state.batch = batch_index;
        self.state.batch_len = batch.indices().len() as u32;
    }

    fn set_color_mul(&mut self, color: &Color) {
        self.state.color_mul = *color;
        self.state.uniform_dirty = true;
    }

    fn set_color_add(&mut self, color: &ColorAdd) {
        self.state.color_add = *color;
        self.state.uniform_dirty = true;
    }

    fn set_blend_state(&mut self, state: &BlendState) {
        self.state.blend = *state;
    }

    fn set_rasterizer_state(&mut self, state: &RasterizerState) {
        self.state.rasterizer = *state;
    }

    fn set_vs_sampler_state(&mut self, slot: usize, state: &SamplerState) {
        if *state != SamplerState::DEFAULT_2D && !self.warned_vs_sampler {
            self.warned_vs_sampler = true;
            log::debug!("tessel: vertex-stage sampler slot {slot} is not used by shape shaders");
        }
    }

    fn set_ps_sampler_state(&mut self, slot: usize, state: &SamplerState) {
        if slot == 0 {
            self.state.ps_sampler = *state;
        }
    }

    fn set_scissor_rect(&mut self, rect: Option<PixelRect>) {
        self.state.scissor = rect;
    }

    fn set_viewport(&mut self, viewport: Option<PixelRect>) {
        self.state.viewport = viewport;
        self.state.uniform_dirty = true;
    }

    fn set_vertex_shader(&mut self, id: VertexShaderId) {
        self.state.vs = self.resolve_vs(id);
    }

    fn set_pixel_shader(&mut self, id: PixelShaderId) {
        self.state.ps = self.resolve_ps(id);
    }

    fn set_transform(&mut self, transform: &Mat3x2) {
        self.state.transform = *transform;
        self.state.uniform_dirty = true;
    }

    fn draw(&mut self, batch_index: u32, indices: Range<u32>) {
        if indices.end > self.state.batch_len || batch_index != self.state.batch {
            log::error!(
                "tessel: draw {indices:?} outside batch {batch_index} ({} indices)",
                self.state.batch_len
            );
            return;
        }

        let Some(scissor) = self.active_scissor() else { return };
        let (viewport, logical) = self.active_viewport();

        if self.state.uniform_dirty || self.uniforms.is_empty() {
            let transform = self.state.transform * logical.screen_matrix();
            self.uniforms.push(ShapeUniform {
                rows: transform.to_rows(),
                color_mul: self.state.color_mul.to_array(),
                color_add: self.state.color_add.to_array(),
            });
            self.state.uniform_dirty = false;
        }

        self.packets.push(DrawPacket {
            batch: batch_index,
            indices,
            key: PipelineKey {
                blend: self.state.blend,
                rasterizer: RasterizerState { scissor_enable: false, ..self.state.rasterizer },
                vs: self.state.vs,
                ps: self.state.ps,
            },
            uniform: self.uniforms.len() as u32 - 1,
            sampler: self.state.ps_sampler,
            scissor,
            viewport,
        });
    }
}

// ── GPU types ─────────────────────────────────────────────────────────────

/// Uniform block (64 bytes), one per distinct transform/color state:
///
///  offset  0  rows       [[f32; 4]; 2]
///  offset 32  color_mul  [f32; 4]
///  offset 48  color_add  [f32; 4]
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ShapeUniform {
    rows: [[f32; 4]; 2],
    color_mul: [f32; 4],
    color_add: [f32; 4],
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct PipelineKey {
    blend: BlendState,
    rasterizer: RasterizerState,
    vs: VertexShaderId,
    ps: PixelShaderId,
}

#[derive(Debug, Clone)]
struct DrawPacket {
    batch: u32,
    indices: Range<u32>,
    key: PipelineKey,
    uniform: u32,
    sampler: SamplerState,
    scissor: (u32, u32, u32, u32),
    viewport: [f32; 4],
}

/// Values in effect while replaying. Overwritten by the seed commands first.
#[derive(Debug, Clone)]
struct ReplayState {
    batch: u32,
    batch_len: u32,
    color_mul: Color,
    color_add: ColorAdd,
    blend: BlendState,
    rasterizer: RasterizerState,
    ps_sampler: SamplerState,
    scissor: Option<PixelRect>,
    viewport: Option<PixelRect>,
    vs: VertexShaderId,
    ps: PixelShaderId,
    transform: Mat3x2,
    uniform_dirty: bool,
}

impl Default for ReplayState {
    fn default() -> Self {
        Self {
            batch: 0,
            batch_len: 0,
            color_mul: Color::WHITE,
            color_add: ColorAdd::ZERO,
            blend: BlendState::DEFAULT_2D,
            rasterizer: RasterizerState::DEFAULT_2D,
            ps_sampler: SamplerState::DEFAULT_2D,
            scissor: None,
            viewport: None,
            vs: VertexShaderId::SHAPE,
            ps: PixelShaderId::SHAPE,
            transform: Mat3x2::IDENTITY,
            uniform_dirty: true,
        }
    }
}

#[derive(Default)]
struct GpuBatch {
    vbo: Option<wgpu::Buffer>,
    ibo: Option<wgpu::Buffer>,
    vertex_capacity: usize,
    index_capacity: usize,
}

impl GpuBatch {
    fn ensure_capacity(&mut self, ctx: &RenderCtx<'_>, batch: usize, vertices: usize, indices: usize) {
        if vertices > self.vertex_capacity || self.vbo.is_none() {
            let cap = vertices.next_power_of_two().max(64);
            self.vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tessel shape2d vbo"),
                size: (cap * std::mem::size_of::<Vertex2D>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.vertex_capacity = cap;
            log::debug!("tessel: batch {batch} vertex buffer grown to {cap}");
        }

        if indices > self.index_capacity || self.ibo.is_none() {
            let cap = indices.next_power_of_two().max(64);
            self.ibo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tessel shape2d ibo"),
                size: (cap * std::mem::size_of::<IndexType>()) as u64,
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.index_capacity = cap;
        }
    }
}

/// Index data padded to the 4-byte copy alignment.
fn index_bytes(indices: &[IndexType]) -> Vec<u8> {
    let mut bytes = bytemuck::cast_slice::<IndexType, u8>(indices).to_vec();
    bytes.resize(bytes.len().next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT as usize), 0);
    bytes
}

// ── state translation ─────────────────────────────────────────────────────

fn to_wgpu_factor(b: Blend) -> wgpu::BlendFactor {
    match b {
        Blend::Zero => wgpu::BlendFactor::Zero,
        Blend::One => wgpu::BlendFactor::One,
        Blend::SrcColor => wgpu::BlendFactor::Src,
        Blend::InvSrcColor => wgpu::BlendFactor::OneMinusSrc,
        Blend::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        Blend::InvSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
        Blend::DestAlpha => wgpu::BlendFactor::DstAlpha,
        Blend::InvDestAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
        Blend::DestColor => wgpu::BlendFactor::Dst,
        Blend::InvDestColor => wgpu::BlendFactor::OneMinusDst,
        Blend::SrcAlphaSat => wgpu::BlendFactor::SrcAlphaSaturated,
    }
}

fn to_wgpu_component(src: Blend, dst: Blend, op: BlendOp) -> wgpu::BlendComponent {
    let operation = match op {
        BlendOp::Add => wgpu::BlendOperation::Add,
        BlendOp::Subtract => wgpu::BlendOperation::Subtract,
        BlendOp::RevSubtract => wgpu::BlendOperation::ReverseSubtract,
        BlendOp::Min => wgpu::BlendOperation::Min,
        BlendOp::Max => wgpu::BlendOperation::Max,
    };

    // Min/Max ignore factors; wgpu requires them to be One.
    if matches!(op, BlendOp::Min | BlendOp::Max) {
        return wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::One,
            operation,
        };
    }

    wgpu::BlendComponent {
        src_factor: to_wgpu_factor(src),
        dst_factor: to_wgpu_factor(dst),
        operation,
    }
}

fn to_wgpu_blend(state: &BlendState) -> Option<wgpu::BlendState> {
    state.enable.then(|| wgpu::BlendState {
        color: to_wgpu_component(state.src, state.dst, state.op),
        alpha: to_wgpu_component(state.src_alpha, state.dst_alpha, state.op_alpha),
    })
}

fn to_wgpu_address(mode: TextureAddressMode, border_supported: bool) -> wgpu::AddressMode {
    match mode {
        TextureAddressMode::Repeat => wgpu::AddressMode::Repeat,
        TextureAddressMode::Mirror => wgpu::AddressMode::MirrorRepeat,
        TextureAddressMode::Clamp => wgpu::AddressMode::ClampToEdge,
        TextureAddressMode::Border if border_supported => wgpu::AddressMode::ClampToBorder,
        TextureAddressMode::Border => wgpu::AddressMode::ClampToEdge,
    }
}

fn to_wgpu_filter(filter: TextureFilter) -> wgpu::FilterMode {
    match filter {
        TextureFilter::Nearest => wgpu::FilterMode::Nearest,
        TextureFilter::Linear => wgpu::FilterMode::Linear,
    }
}

fn to_wgpu_sampler(state: &SamplerState, border_supported: bool) -> wgpu::SamplerDescriptor<'static> {
    let mipmap_filter = match state.mip {
        TextureFilter::Nearest => wgpu::MipmapFilterMode::Nearest,
        TextureFilter::Linear => wgpu::MipmapFilterMode::Linear,
    };

    // Anisotropy is only valid with linear filtering everywhere.
    let all_linear = [state.min, state.mag, state.mip]
        .iter()
        .all(|f| *f == TextureFilter::Linear);
    let anisotropy_clamp = if all_linear { state.max_anisotropy.clamp(1, 16) as u16 } else { 1 };

    let border_color = (state.address_u == TextureAddressMode::Border && border_supported)
        .then_some(wgpu::SamplerBorderColor::TransparentBlack);

    wgpu::SamplerDescriptor {
        label: Some("tessel shape2d sampler"),
        address_mode_u: to_wgpu_address(state.address_u, border_supported),
        address_mode_v: to_wgpu_address(state.address_v, border_supported),
        address_mode_w: to_wgpu_address(state.address_w, border_supported),
        mag_filter: to_wgpu_filter(state.mag),
        min_filter: to_wgpu_filter(state.min),
        mipmap_filter,
        anisotropy_clamp,
        border_color,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── state translation ─────────────────────────────────────────────────

    #[test]
    fn opaque_disables_blending() {
        assert!(to_wgpu_blend(&BlendState::OPAQUE).is_none());
    }

    #[test]
    fn straight_alpha_factors() {
        let b = to_wgpu_blend(&BlendState::NON_PREMULTIPLIED).expect("enabled");
        assert_eq!(b.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(b.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
        assert_eq!(b.alpha.src_factor, wgpu::BlendFactor::Zero);
    }

    #[test]
    fn min_max_force_unit_factors() {
        let state = BlendState { op: BlendOp::Max, ..BlendState::NON_PREMULTIPLIED };
        let b = to_wgpu_blend(&state).expect("enabled");
        assert_eq!(b.color.operation, wgpu::BlendOperation::Max);
        assert_eq!(b.color.src_factor, wgpu::BlendFactor::One);
        assert_eq!(b.color.dst_factor, wgpu::BlendFactor::One);
    }

    #[test]
    fn border_falls_back_without_feature() {
        assert_eq!(
            to_wgpu_address(TextureAddressMode::Border, false),
            wgpu::AddressMode::ClampToEdge
        );
        let d = to_wgpu_sampler(
            &SamplerState {
                address_u: TextureAddressMode::Border,
                ..SamplerState::DEFAULT_2D
            },
            false,
        );
        assert!(d.border_color.is_none());
    }

    #[test]
    fn anisotropy_needs_linear_filters() {
        let aniso = SamplerState { max_anisotropy: 8, ..SamplerState::CLAMP_LINEAR };
        assert_eq!(to_wgpu_sampler(&aniso, true).anisotropy_clamp, 8);

        let nearest = SamplerState { max_anisotropy: 8, ..SamplerState::CLAMP_NEAREST };
        assert_eq!(to_wgpu_sampler(&nearest, true).anisotropy_clamp, 1);
    }

    #[test]
    fn index_bytes_are_padded() {
        assert_eq!(index_bytes(&[1, 2, 3]).len(), 8);
        assert_eq!(index_bytes(&[1, 2]).len(), 4);
    }

    // ── packet collection ─────────────────────────────────────────────────

    fn collect(renderer: &Renderer2D, target: Viewport) -> WgpuRenderer2D {
        let mut backend = WgpuRenderer2D::new();
        backend.target = target;
        backend.target_size = target.physical_size();
        renderer.replay(&mut backend);
        backend
    }

    #[test]
    fn uniform_snapshots_follow_state_changes() {
        let mut r = Renderer2D::default();
        r.begin_frame();
        let rect = crate::coords::Rect::new(0.0, 0.0, 10.0, 10.0);
        r.add_rect(rect, Color::WHITE);
        r.set_blend_state(BlendState::ADDITIVE);
        r.add_rect(rect, Color::WHITE);
        r.set_color_mul(Color::BLACK);
        r.add_rect(rect, Color::WHITE);
        r.flush();

        let b = collect(&r, Viewport::new(100.0, 100.0, 1.0));
        assert_eq!(b.packets.len(), 3);
        // blend change reuses the uniform, color change adds one
        assert_eq!(b.uniforms.len(), 2);
        assert_eq!(b.packets[1].uniform, 0);
        assert_eq!(b.packets[2].uniform, 1);
        assert_ne!(b.packets[0].key, b.packets[1].key);
    }

    #[test]
    fn scissor_only_applies_when_enabled() {
        let mut r = Renderer2D::default();
        r.begin_frame();
        let rect = crate::coords::Rect::new(0.0, 0.0, 10.0, 10.0);
        r.set_scissor_rect(Some(PixelRect::new(10, 10, 20, 20)));
        r.add_rect(rect, Color::WHITE);
        r.set_rasterizer_state(RasterizerState::DEFAULT_2D.with_scissor());
        r.add_rect(rect, Color::WHITE);
        r.set_scissor_rect(Some(PixelRect::new(500, 500, 20, 20)));
        r.add_rect(rect, Color::WHITE);
        r.flush();

        let b = collect(&r, Viewport::new(200.0, 100.0, 2.0));
        // third rect is clipped entirely and dropped
        assert_eq!(b.packets.len(), 2);
        assert_eq!(b.packets[0].scissor, (0, 0, 400, 200));
        assert_eq!(b.packets[1].scissor, (10, 10, 20, 20));
        // scissor toggling does not split pipelines
        assert_eq!(b.packets[0].key, b.packets[1].key);
    }

    #[test]
    fn unknown_shaders_resolve_to_builtin() {
        let mut r = Renderer2D::default();
        r.begin_frame();
        r.set_custom_vs(Some(VertexShaderId(42)));
        r.add_rect(crate::coords::Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE);
        r.flush();

        let b = collect(&r, Viewport::new(10.0, 10.0, 1.0));
        assert_eq!(b.packets[0].key.vs, VertexShaderId::SHAPE);
        assert!(b.warned_shader);
    }
}
