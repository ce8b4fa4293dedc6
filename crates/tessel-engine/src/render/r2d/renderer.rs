use crate::coords::{Mat3x2, PixelRect, Rect, Vec2};
use crate::paint::{Color, ColorAdd};

use super::backend::Renderer2DBackend;
use super::builder::{self, LineStyle};
use super::command::{CommandManager, CommandType};
use super::state::{BlendState, PixelShaderId, RasterizerState, SamplerState, VertexShaderId};
use super::vertex_buffer::{BatchWriter, Renderer2DConfig, VertexBufferManager2D};

/// Immediate-mode 2D drawing front end.
///
/// Shape calls tessellate into vertex batches and record draws; state setters
/// are coalesced by the [`CommandManager`]. A frame is `begin_frame()`, any
/// number of `add_*`/`set_*` calls, `flush()`, then `replay()` into a backend.
#[derive(Debug)]
pub struct Renderer2D {
    commands: CommandManager,
    buffers: VertexBufferManager2D,
    custom_vs: Option<VertexShaderId>,
    custom_ps: Option<PixelShaderId>,
}

impl Renderer2D {
    pub fn new(config: Renderer2DConfig) -> Self {
        Self {
            commands: CommandManager::new(),
            buffers: VertexBufferManager2D::new(config),
            custom_vs: None,
            custom_ps: None,
        }
    }

    pub fn begin_frame(&mut self) {
        self.commands.reset();
        self.buffers.reset();
    }

    /// Commits the pending draw and staged state. Call once before `replay()`.
    #[inline]
    pub fn flush(&mut self) {
        self.commands.flush();
    }

    #[inline]
    pub fn commands(&self) -> &CommandManager {
        &self.commands
    }

    #[inline]
    pub fn buffers(&self) -> &VertexBufferManager2D {
        &self.buffers
    }

    /// Walks the recorded commands and forwards them to `backend`.
    ///
    /// Draw ranges are consecutive within a batch and restart at 0 after each
    /// `UpdateBuffers`.
    pub fn replay<B: Renderer2DBackend + ?Sized>(&self, backend: &mut B) {
        let cm = &self.commands;
        let mut batch = 0u32;
        let mut start = 0u32;

        for command in cm.commands() {
            let i = command.index;
            match command.kind {
                CommandType::SetBuffers => backend.set_buffers(),
                CommandType::UpdateBuffers => {
                    batch = i;
                    start = 0;
                    backend.update_buffers(batch, self.buffers.batch(batch));
                }
                CommandType::Draw => {
                    let count = cm.draw(i).index_count;
                    backend.draw(batch, start..start + count);
                    start += count;
                }
                CommandType::ColorMul => backend.set_color_mul(cm.color_mul(i)),
                CommandType::ColorAdd => backend.set_color_add(cm.color_add(i)),
                CommandType::BlendState => backend.set_blend_state(cm.blend_state(i)),
                CommandType::RasterizerState => {
                    backend.set_rasterizer_state(cm.rasterizer_state(i));
                }
                CommandType::VsSamplerState(slot) => {
                    let slot = slot as usize;
                    backend.set_vs_sampler_state(slot, cm.vs_sampler_state(slot, i));
                }
                CommandType::PsSamplerState(slot) => {
                    let slot = slot as usize;
                    backend.set_ps_sampler_state(slot, cm.ps_sampler_state(slot, i));
                }
                CommandType::ScissorRect => backend.set_scissor_rect(*cm.scissor_rect(i)),
                CommandType::Viewport => backend.set_viewport(*cm.viewport(i)),
                CommandType::SetVs => backend.set_vertex_shader(cm.vs(i)),
                CommandType::SetPs => backend.set_pixel_shader(cm.ps(i)),
                CommandType::Transform => backend.set_transform(cm.combined_transform(i)),
            }
        }
    }

    // ── state ─────────────────────────────────────────────────────────────

    #[inline]
    pub fn set_color_mul(&mut self, color: Color) {
        self.commands.push_color_mul(color);
    }

    #[inline]
    pub fn color_mul(&self) -> Color {
        *self.commands.current_color_mul()
    }

    #[inline]
    pub fn set_color_add(&mut self, color: ColorAdd) {
        self.commands.push_color_add(color);
    }

    #[inline]
    pub fn color_add(&self) -> ColorAdd {
        *self.commands.current_color_add()
    }

    #[inline]
    pub fn set_blend_state(&mut self, state: BlendState) {
        self.commands.push_blend_state(state);
    }

    #[inline]
    pub fn blend_state(&self) -> BlendState {
        *self.commands.current_blend_state()
    }

    #[inline]
    pub fn set_rasterizer_state(&mut self, state: RasterizerState) {
        self.commands.push_rasterizer_state(state);
    }

    #[inline]
    pub fn rasterizer_state(&self) -> RasterizerState {
        *self.commands.current_rasterizer_state()
    }

    #[inline]
    pub fn set_vs_sampler_state(&mut self, slot: usize, state: SamplerState) {
        self.commands.push_vs_sampler_state(slot, state);
    }

    #[inline]
    pub fn vs_sampler_state(&self, slot: usize) -> SamplerState {
        *self.commands.current_vs_sampler_state(slot)
    }

    #[inline]
    pub fn set_ps_sampler_state(&mut self, slot: usize, state: SamplerState) {
        self.commands.push_ps_sampler_state(slot, state);
    }

    #[inline]
    pub fn ps_sampler_state(&self, slot: usize) -> SamplerState {
        *self.commands.current_ps_sampler_state(slot)
    }

    /// Scissor rect in physical pixels. Only applied while the rasterizer
    /// state has `scissor_enable` set.
    #[inline]
    pub fn set_scissor_rect(&mut self, rect: Option<PixelRect>) {
        self.commands.push_scissor_rect(rect);
    }

    #[inline]
    pub fn scissor_rect(&self) -> Option<PixelRect> {
        *self.commands.current_scissor_rect()
    }

    #[inline]
    pub fn set_viewport(&mut self, viewport: Option<PixelRect>) {
        self.commands.push_viewport(viewport);
    }

    #[inline]
    pub fn viewport(&self) -> Option<PixelRect> {
        *self.commands.current_viewport()
    }

    #[inline]
    pub fn set_local_transform(&mut self, local: Mat3x2) {
        self.commands.push_local_transform(local);
    }

    #[inline]
    pub fn local_transform(&self) -> Mat3x2 {
        *self.commands.current_local_transform()
    }

    #[inline]
    pub fn set_camera_transform(&mut self, camera: Mat3x2) {
        self.commands.push_camera_transform(camera);
    }

    #[inline]
    pub fn camera_transform(&self) -> Mat3x2 {
        *self.commands.current_camera_transform()
    }

    #[inline]
    pub fn max_scaling(&self) -> f32 {
        self.commands.current_max_scaling()
    }

    /// Vertex shader used by following shapes instead of the engine shader.
    #[inline]
    pub fn set_custom_vs(&mut self, id: Option<VertexShaderId>) {
        self.custom_vs = id;
    }

    #[inline]
    pub fn custom_vs(&self) -> Option<VertexShaderId> {
        self.custom_vs
    }

    /// Pixel shader used by following shapes instead of the engine shader.
    #[inline]
    pub fn set_custom_ps(&mut self, id: Option<PixelShaderId>) {
        self.custom_ps = id;
    }

    #[inline]
    pub fn custom_ps(&self) -> Option<PixelShaderId> {
        self.custom_ps
    }

    // ── shapes ────────────────────────────────────────────────────────────

    pub fn add_line(&mut self, style: LineStyle, start: Vec2, end: Vec2, thickness: f32, colors: [Color; 2]) {
        self.add_shape(|w, _| builder::build_line(w, style, start, end, thickness, colors));
    }

    pub fn add_triangle(&mut self, points: [Vec2; 3], color: Color) {
        self.add_shape(|w, _| builder::build_triangle(w, points, color));
    }

    pub fn add_triangle_colors(&mut self, points: [Vec2; 3], colors: [Color; 3]) {
        self.add_shape(|w, _| builder::build_triangle_colors(w, points, colors));
    }

    pub fn add_rect(&mut self, rect: Rect, color: Color) {
        self.add_shape(|w, _| builder::build_rect(w, rect, color));
    }

    /// `colors` are top-left, top-right, bottom-right, bottom-left.
    pub fn add_rect_colors(&mut self, rect: Rect, colors: [Color; 4]) {
        self.add_shape(|w, _| builder::build_rect_colors(w, rect, colors));
    }

    pub fn add_rect_frame(&mut self, inner: Rect, thickness: f32, inner_color: Color, outer_color: Color) {
        self.add_shape(|w, _| builder::build_rect_frame(w, inner, thickness, inner_color, outer_color));
    }

    pub fn add_quad(&mut self, points: [Vec2; 4], color: Color) {
        self.add_shape(|w, _| builder::build_quad(w, points, color));
    }

    pub fn add_quad_colors(&mut self, points: [Vec2; 4], colors: [Color; 4]) {
        self.add_shape(|w, _| builder::build_quad_colors(w, points, colors));
    }

    pub fn add_circle(&mut self, center: Vec2, r: f32, inner_color: Color, outer_color: Color) {
        self.add_shape(|w, scale| builder::build_circle(w, center, r, inner_color, outer_color, scale));
    }

    pub fn add_circle_frame(
        &mut self,
        center: Vec2,
        r_inner: f32,
        thickness: f32,
        inner_color: Color,
        outer_color: Color,
    ) {
        self.add_shape(|w, scale| {
            builder::build_circle_frame(w, center, r_inner, thickness, inner_color, outer_color, scale)
        });
    }

    fn add_shape(&mut self, build: impl FnOnce(&mut BatchWriter<'_>, f32) -> u32) {
        self.commands.push_engine_vs(self.custom_vs.unwrap_or(VertexShaderId::SHAPE));
        self.commands.push_engine_ps(self.custom_ps.unwrap_or(PixelShaderId::SHAPE));

        let scale = self.commands.current_max_scaling();
        let index_count = build(&mut self.buffers.writer(&mut self.commands), scale);

        if index_count > 0 {
            self.commands.push_draw(index_count);
        }
    }
}

impl Default for Renderer2D {
    fn default() -> Self {
        Self::new(Renderer2DConfig::default())
    }
}
