use crate::coords::{Mat3x2, PixelRect};
use crate::paint::{Color, ColorAdd};

use super::state::{BlendState, PixelShaderId, RasterizerState, SamplerState, VertexShaderId};
use super::tracker::StateTracker;

const SAMPLER_SLOTS: usize = SamplerState::MAX_SAMPLER_COUNT;

/// Kind of a recorded command.
///
/// Sampler commands carry their slot; the stage is part of the variant.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CommandType {
    SetBuffers,
    UpdateBuffers,
    Draw,
    ColorMul,
    ColorAdd,
    BlendState,
    RasterizerState,
    VsSamplerState(u8),
    PsSamplerState(u8),
    ScissorRect,
    Viewport,
    SetVs,
    SetPs,
    Transform,
}

/// One recorded command.
///
/// `index` points into the value buffer of `kind`: the draw buffer for `Draw`,
/// the batch list for `UpdateBuffers`, and is unused (0) for `SetBuffers`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Command {
    pub kind: CommandType,
    pub index: u32,
}

impl Command {
    #[inline]
    pub const fn new(kind: CommandType, index: u32) -> Self {
        Self { kind, index }
    }
}

/// A committed draw: `index_count` indices following the previous draw in the active batch.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct DrawCommand {
    pub index_count: u32,
}

/// Live value plus committed history for one state category.
///
/// `buffer` is never empty; its last element is the last committed value.
#[derive(Debug, Clone)]
struct StateSlot<T> {
    current: T,
    buffer: Vec<T>,
}

impl<T: Clone + PartialEq> StateSlot<T> {
    fn new(seed: T) -> Self {
        Self {
            current: seed.clone(),
            buffer: vec![seed],
        }
    }

    fn last(&self) -> &T {
        self.buffer
            .last()
            .expect("state buffer always holds its seed value")
    }

    /// Stages `value`, marking `kind` dirty on the first change since the last flush
    /// and un-marking it when the value returns to the committed one.
    fn push(&mut self, kind: CommandType, tracker: &mut StateTracker, value: T) {
        if !tracker.has(kind) {
            if value != self.current {
                self.current = value;
                tracker.set(kind);
            }
        } else {
            if value == *self.last() {
                tracker.clear(kind);
            }
            self.current = value;
        }
    }

    fn commit(&mut self, kind: CommandType, tracker: &StateTracker, commands: &mut Vec<Command>) {
        if tracker.has(kind) {
            commands.push(Command::new(kind, self.buffer.len() as u32));
            self.buffer.push(self.current.clone());
        }
    }

    /// Shrinks history to `seed` and makes it live again.
    fn reseed(&mut self, seed: T) {
        self.buffer.clear();
        self.buffer.push(seed.clone());
        self.current = seed;
    }

    /// Carries the last committed value over as the new seed.
    fn carry_forward(&mut self) {
        let last = self.last().clone();
        self.reseed(last);
    }

    fn get(&self, index: u32, what: &str) -> &T {
        match self.buffer.get(index as usize) {
            Some(v) => v,
            None => panic!(
                "{what} index {index} out of range (buffer holds {})",
                self.buffer.len()
            ),
        }
    }
}

/// Deferred 2D command recorder.
///
/// State pushes are staged against a per-category dirty bit and only turn into
/// commands at a flush, so a value that is changed and changed back between two
/// draws costs nothing. Consecutive draws under identical state merge into one
/// `Draw` with the summed index count.
///
/// Frame protocol:
/// - `reset()` once at frame start (seeds one command per category)
/// - `push_*` / `push_draw` while recording
/// - `flush()` before handing `commands()` to a backend
#[derive(Debug, Clone)]
pub struct CommandManager {
    commands: Vec<Command>,
    tracker: StateTracker,

    draws: Vec<DrawCommand>,
    pending_draw: DrawCommand,

    color_mul: StateSlot<Color>,
    color_add: StateSlot<ColorAdd>,
    blend_state: StateSlot<BlendState>,
    rasterizer_state: StateSlot<RasterizerState>,
    vs_samplers: [StateSlot<SamplerState>; SAMPLER_SLOTS],
    ps_samplers: [StateSlot<SamplerState>; SAMPLER_SLOTS],
    scissor_rect: StateSlot<Option<PixelRect>>,
    viewport: StateSlot<Option<PixelRect>>,
    vertex_shader: StateSlot<VertexShaderId>,
    pixel_shader: StateSlot<PixelShaderId>,

    /// Combined (local x camera) transform history.
    transform: StateSlot<Mat3x2>,
    local_transform: Mat3x2,
    camera_transform: Mat3x2,
    max_scaling: f32,
}

impl CommandManager {
    pub fn new() -> Self {
        let mut manager = Self {
            commands: Vec::new(),
            tracker: StateTracker::new(),
            draws: Vec::new(),
            pending_draw: DrawCommand::default(),
            color_mul: StateSlot::new(Color::WHITE),
            color_add: StateSlot::new(ColorAdd::ZERO),
            blend_state: StateSlot::new(BlendState::DEFAULT_2D),
            rasterizer_state: StateSlot::new(RasterizerState::DEFAULT_2D),
            vs_samplers: core::array::from_fn(|_| StateSlot::new(SamplerState::DEFAULT_2D)),
            ps_samplers: core::array::from_fn(|_| StateSlot::new(SamplerState::DEFAULT_2D)),
            scissor_rect: StateSlot::new(None),
            viewport: StateSlot::new(None),
            vertex_shader: StateSlot::new(VertexShaderId::INVALID),
            pixel_shader: StateSlot::new(PixelShaderId::INVALID),
            transform: StateSlot::new(Mat3x2::IDENTITY),
            local_transform: Mat3x2::IDENTITY,
            camera_transform: Mat3x2::IDENTITY,
            max_scaling: 1.0,
        };
        manager.reset();
        manager
    }

    /// Starts a new frame.
    ///
    /// Every state buffer shrinks to its last committed value (shader ids fall
    /// back to `INVALID`), draws are dropped, and one seed command per category
    /// is recorded so a backend replaying from scratch sees every state explicitly.
    pub fn reset(&mut self) {
        self.commands.clear();
        self.tracker.clear_all();

        self.draws.clear();
        self.pending_draw = DrawCommand::default();

        self.color_mul.carry_forward();
        self.color_add.carry_forward();
        self.blend_state.carry_forward();
        self.rasterizer_state.carry_forward();
        for slot in self.vs_samplers.iter_mut().chain(self.ps_samplers.iter_mut()) {
            slot.carry_forward();
        }
        self.scissor_rect.carry_forward();
        self.viewport.carry_forward();
        self.vertex_shader.reseed(VertexShaderId::INVALID);
        self.pixel_shader.reseed(PixelShaderId::INVALID);
        self.transform.carry_forward();
        self.max_scaling = self.transform.current.max_scaling();

        self.commands.push(Command::new(CommandType::SetBuffers, 0));
        self.commands.push(Command::new(CommandType::UpdateBuffers, 0));
        self.commands.push(Command::new(CommandType::ColorMul, 0));
        self.commands.push(Command::new(CommandType::ColorAdd, 0));
        self.commands.push(Command::new(CommandType::BlendState, 0));
        self.commands.push(Command::new(CommandType::RasterizerState, 0));
        for slot in 0..SAMPLER_SLOTS as u8 {
            self.commands.push(Command::new(CommandType::VsSamplerState(slot), 0));
        }
        for slot in 0..SAMPLER_SLOTS as u8 {
            self.commands.push(Command::new(CommandType::PsSamplerState(slot), 0));
        }
        self.commands.push(Command::new(CommandType::ScissorRect, 0));
        self.commands.push(Command::new(CommandType::Viewport, 0));
        self.commands.push(Command::new(CommandType::SetVs, 0));
        self.commands.push(Command::new(CommandType::SetPs, 0));
        self.commands.push(Command::new(CommandType::Transform, 0));
    }

    /// Commits the pending draw and every dirty category, in a fixed category order.
    pub fn flush(&mut self) {
        if self.pending_draw.index_count > 0 {
            self.commands
                .push(Command::new(CommandType::Draw, self.draws.len() as u32));
            self.draws.push(self.pending_draw);
            self.pending_draw = DrawCommand::default();
        }

        let tracker = &self.tracker;
        let commands = &mut self.commands;

        if tracker.has(CommandType::SetBuffers) {
            commands.push(Command::new(CommandType::SetBuffers, 0));
        }

        self.color_mul.commit(CommandType::ColorMul, tracker, commands);
        self.color_add.commit(CommandType::ColorAdd, tracker, commands);
        self.blend_state.commit(CommandType::BlendState, tracker, commands);
        self.rasterizer_state
            .commit(CommandType::RasterizerState, tracker, commands);
        for (slot, state) in self.vs_samplers.iter_mut().enumerate() {
            state.commit(CommandType::VsSamplerState(slot as u8), tracker, commands);
        }
        for (slot, state) in self.ps_samplers.iter_mut().enumerate() {
            state.commit(CommandType::PsSamplerState(slot as u8), tracker, commands);
        }
        self.scissor_rect.commit(CommandType::ScissorRect, tracker, commands);
        self.viewport.commit(CommandType::Viewport, tracker, commands);
        self.vertex_shader.commit(CommandType::SetVs, tracker, commands);
        self.pixel_shader.commit(CommandType::SetPs, tracker, commands);
        self.transform.commit(CommandType::Transform, tracker, commands);

        self.tracker.clear_all();
    }

    /// Recorded commands, valid until the next `reset()`.
    #[inline]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Index count accumulated for the draw that has not been committed yet.
    #[inline]
    pub fn pending_index_count(&self) -> u32 {
        self.pending_draw.index_count
    }

    // ── buffers ───────────────────────────────────────────────────────────

    /// Requests that the engine vertex/index buffers be rebound before the next draw.
    #[inline]
    pub fn push_set_buffers(&mut self) {
        self.tracker.set(CommandType::SetBuffers);
    }

    /// Commits everything recorded so far, then switches draws to `batch_index`.
    pub fn push_update_buffers(&mut self, batch_index: u32) {
        self.flush();
        self.commands
            .push(Command::new(CommandType::UpdateBuffers, batch_index));
    }

    // ── draw ──────────────────────────────────────────────────────────────

    /// Adds `index_count` indices to the pending draw, committing staged state first.
    pub fn push_draw(&mut self, index_count: u32) {
        if self.tracker.has_state_change() {
            self.flush();
        }

        self.pending_draw.index_count += index_count;
    }

    #[inline]
    pub fn draw(&self, index: u32) -> &DrawCommand {
        match self.draws.get(index as usize) {
            Some(d) => d,
            None => panic!("draw index {index} out of range (buffer holds {})", self.draws.len()),
        }
    }

    // ── color ─────────────────────────────────────────────────────────────

    /// Colors and transforms must be finite: a NaN never compares equal to
    /// itself, so it would be re-committed on every flush.
    #[inline]
    pub fn push_color_mul(&mut self, color: Color) {
        debug_assert!(color.is_finite(), "color mul must be finite: {color:?}");
        self.color_mul
            .push(CommandType::ColorMul, &mut self.tracker, color);
    }

    #[inline]
    pub fn color_mul(&self, index: u32) -> &Color {
        self.color_mul.get(index, "color mul")
    }

    #[inline]
    pub fn current_color_mul(&self) -> &Color {
        &self.color_mul.current
    }

    #[inline]
    pub fn push_color_add(&mut self, color: ColorAdd) {
        debug_assert!(color.is_finite(), "color add must be finite: {color:?}");
        self.color_add
            .push(CommandType::ColorAdd, &mut self.tracker, color);
    }

    #[inline]
    pub fn color_add(&self, index: u32) -> &ColorAdd {
        self.color_add.get(index, "color add")
    }

    #[inline]
    pub fn current_color_add(&self) -> &ColorAdd {
        &self.color_add.current
    }

    // ── pipeline state ────────────────────────────────────────────────────

    #[inline]
    pub fn push_blend_state(&mut self, state: BlendState) {
        self.blend_state
            .push(CommandType::BlendState, &mut self.tracker, state);
    }

    #[inline]
    pub fn blend_state(&self, index: u32) -> &BlendState {
        self.blend_state.get(index, "blend state")
    }

    #[inline]
    pub fn current_blend_state(&self) -> &BlendState {
        &self.blend_state.current
    }

    #[inline]
    pub fn push_rasterizer_state(&mut self, state: RasterizerState) {
        self.rasterizer_state
            .push(CommandType::RasterizerState, &mut self.tracker, state);
    }

    #[inline]
    pub fn rasterizer_state(&self, index: u32) -> &RasterizerState {
        self.rasterizer_state.get(index, "rasterizer state")
    }

    #[inline]
    pub fn current_rasterizer_state(&self) -> &RasterizerState {
        &self.rasterizer_state.current
    }

    // ── samplers ──────────────────────────────────────────────────────────

    /// # Panics
    /// Panics if `slot >= SamplerState::MAX_SAMPLER_COUNT`.
    pub fn push_vs_sampler_state(&mut self, slot: usize, state: SamplerState) {
        let kind = CommandType::VsSamplerState(sampler_slot(slot));
        self.vs_samplers[slot].push(kind, &mut self.tracker, state);
    }

    pub fn vs_sampler_state(&self, slot: usize, index: u32) -> &SamplerState {
        self.vs_samplers[sampler_slot(slot) as usize].get(index, "vertex-stage sampler")
    }

    pub fn current_vs_sampler_state(&self, slot: usize) -> &SamplerState {
        &self.vs_samplers[sampler_slot(slot) as usize].current
    }

    /// # Panics
    /// Panics if `slot >= SamplerState::MAX_SAMPLER_COUNT`.
    pub fn push_ps_sampler_state(&mut self, slot: usize, state: SamplerState) {
        let kind = CommandType::PsSamplerState(sampler_slot(slot));
        self.ps_samplers[slot].push(kind, &mut self.tracker, state);
    }

    pub fn ps_sampler_state(&self, slot: usize, index: u32) -> &SamplerState {
        self.ps_samplers[sampler_slot(slot) as usize].get(index, "pixel-stage sampler")
    }

    pub fn current_ps_sampler_state(&self, slot: usize) -> &SamplerState {
        &self.ps_samplers[sampler_slot(slot) as usize].current
    }

    // ── scissor / viewport ────────────────────────────────────────────────

    #[inline]
    pub fn push_scissor_rect(&mut self, rect: Option<PixelRect>) {
        self.scissor_rect
            .push(CommandType::ScissorRect, &mut self.tracker, rect);
    }

    #[inline]
    pub fn scissor_rect(&self, index: u32) -> &Option<PixelRect> {
        self.scissor_rect.get(index, "scissor rect")
    }

    #[inline]
    pub fn current_scissor_rect(&self) -> &Option<PixelRect> {
        &self.scissor_rect.current
    }

    #[inline]
    pub fn push_viewport(&mut self, viewport: Option<PixelRect>) {
        self.viewport
            .push(CommandType::Viewport, &mut self.tracker, viewport);
    }

    #[inline]
    pub fn viewport(&self, index: u32) -> &Option<PixelRect> {
        self.viewport.get(index, "viewport")
    }

    #[inline]
    pub fn current_viewport(&self) -> &Option<PixelRect> {
        &self.viewport.current
    }

    // ── shaders ───────────────────────────────────────────────────────────

    #[inline]
    pub fn push_engine_vs(&mut self, id: VertexShaderId) {
        self.vertex_shader
            .push(CommandType::SetVs, &mut self.tracker, id);
    }

    #[inline]
    pub fn vs(&self, index: u32) -> VertexShaderId {
        *self.vertex_shader.get(index, "vertex shader")
    }

    #[inline]
    pub fn push_engine_ps(&mut self, id: PixelShaderId) {
        self.pixel_shader
            .push(CommandType::SetPs, &mut self.tracker, id);
    }

    #[inline]
    pub fn ps(&self, index: u32) -> PixelShaderId {
        *self.pixel_shader.get(index, "pixel shader")
    }

    // ── transform ─────────────────────────────────────────────────────────

    pub fn push_local_transform(&mut self, local: Mat3x2) {
        debug_assert!(local.is_finite(), "local transform must be finite: {local:?}");
        let changed = local != self.local_transform;
        self.push_transform(local, self.camera_transform, changed);
    }

    pub fn push_camera_transform(&mut self, camera: Mat3x2) {
        debug_assert!(camera.is_finite(), "camera transform must be finite: {camera:?}");
        let changed = camera != self.camera_transform;
        self.push_transform(self.local_transform, camera, changed);
    }

    /// Same staging rule as `StateSlot::push`, except that the first change is
    /// detected on the input matrix and a revert on the combined one.
    fn push_transform(&mut self, local: Mat3x2, camera: Mat3x2, changed: bool) {
        let kind = CommandType::Transform;
        let combined = local * camera;

        if !self.tracker.has(kind) {
            if !changed {
                return;
            }
            self.tracker.set(kind);
        } else if combined == *self.transform.last() {
            self.tracker.clear(kind);
        }

        self.local_transform = local;
        self.camera_transform = camera;
        self.transform.current = combined;
        self.max_scaling = combined.max_scaling();
    }

    #[inline]
    pub fn combined_transform(&self, index: u32) -> &Mat3x2 {
        self.transform.get(index, "transform")
    }

    #[inline]
    pub fn current_local_transform(&self) -> &Mat3x2 {
        &self.local_transform
    }

    #[inline]
    pub fn current_camera_transform(&self) -> &Mat3x2 {
        &self.camera_transform
    }

    #[inline]
    pub fn current_combined_transform(&self) -> &Mat3x2 {
        &self.transform.current
    }

    #[inline]
    pub fn current_max_scaling(&self) -> f32 {
        self.max_scaling
    }
}

impl Default for CommandManager {
    fn default() -> Self {
        Self::new()
    }
}

fn sampler_slot(slot: usize) -> u8 {
    assert!(
        slot < SAMPLER_SLOTS,
        "sampler slot {slot} out of range (max {SAMPLER_SLOTS})"
    );
    slot as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Seed commands recorded by every `reset()`.
    const SEED_COUNT: usize = 2 + 4 + 2 * SAMPLER_SLOTS + 5;

    fn recorded(m: &CommandManager) -> Vec<CommandType> {
        m.commands()[SEED_COUNT..].iter().map(|c| c.kind).collect()
    }

    const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);
    const BLUE: Color = Color::new(0.0, 0.0, 1.0, 1.0);

    // ── reset ─────────────────────────────────────────────────────────────

    #[test]
    fn new_manager_is_seeded() {
        let m = CommandManager::new();
        assert_eq!(m.commands().len(), SEED_COUNT);
        assert_eq!(m.commands()[0], Command::new(CommandType::SetBuffers, 0));
        assert_eq!(m.commands()[1], Command::new(CommandType::UpdateBuffers, 0));
        assert!(m.commands().iter().all(|c| c.index == 0));
        assert_eq!(*m.color_mul(0), Color::WHITE);
        assert_eq!(m.vs(0), VertexShaderId::INVALID);
        assert_eq!(m.ps(0), PixelShaderId::INVALID);
    }

    #[test]
    fn reset_carries_last_state_forward() {
        let mut m = CommandManager::new();
        m.push_color_mul(RED);
        m.push_blend_state(BlendState::ADDITIVE);
        m.push_engine_vs(VertexShaderId::SHAPE);
        m.push_engine_ps(PixelShaderId::SHAPE);
        m.push_local_transform(Mat3x2::translate(5.0, 5.0));
        m.push_draw(6);
        m.push_color_mul(BLUE);
        m.push_draw(3);
        m.flush();

        m.reset();

        assert_eq!(m.commands().len(), SEED_COUNT);
        assert_eq!(*m.color_mul(0), BLUE);
        assert_eq!(*m.current_color_mul(), BLUE);
        assert_eq!(*m.blend_state(0), BlendState::ADDITIVE);
        assert_eq!(*m.combined_transform(0), Mat3x2::translate(5.0, 5.0));
        assert_eq!(m.vs(0), VertexShaderId::INVALID);
        assert_eq!(m.ps(0), PixelShaderId::INVALID);
        assert_eq!(m.pending_index_count(), 0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn reset_truncates_buffers_to_one_entry() {
        let mut m = CommandManager::new();
        m.push_color_mul(RED);
        m.flush();
        assert_eq!(*m.color_mul(1), RED);

        m.reset();
        let _ = m.color_mul(1);
    }

    fn panics(f: impl FnOnce()) -> bool {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)).is_err()
    }

    #[test]
    fn reset_leaves_every_category_with_its_carried_value() {
        let add = ColorAdd::new(0.1, 0.2, 0.3);
        let scissor = Some(PixelRect::new(1, 2, 3, 4));
        let viewport = Some(PixelRect::new(0, 0, 64, 32));
        let camera = Mat3x2::translate(3.0, 4.0);

        let mut m = CommandManager::new();
        m.push_color_mul(RED);
        m.push_color_add(add);
        m.push_blend_state(BlendState::ADDITIVE);
        m.push_rasterizer_state(RasterizerState::SOLID_CULL_BACK);
        for slot in 0..SAMPLER_SLOTS {
            m.push_vs_sampler_state(slot, SamplerState::REPEAT_NEAREST);
            m.push_ps_sampler_state(slot, SamplerState::MIRROR_LINEAR);
        }
        m.push_scissor_rect(scissor);
        m.push_viewport(viewport);
        m.push_engine_vs(VertexShaderId::SHAPE);
        m.push_engine_ps(PixelShaderId::SHAPE);
        m.push_camera_transform(camera);
        m.flush();

        m.reset();

        assert_eq!(*m.color_mul(0), RED);
        assert_eq!(*m.color_add(0), add);
        assert_eq!(*m.blend_state(0), BlendState::ADDITIVE);
        assert_eq!(*m.rasterizer_state(0), RasterizerState::SOLID_CULL_BACK);
        assert_eq!(*m.scissor_rect(0), scissor);
        assert_eq!(*m.viewport(0), viewport);
        assert_eq!(m.vs(0), VertexShaderId::INVALID);
        assert_eq!(m.ps(0), PixelShaderId::INVALID);
        assert_eq!(*m.combined_transform(0), camera);
        for slot in 0..SAMPLER_SLOTS {
            assert_eq!(*m.vs_sampler_state(slot, 0), SamplerState::REPEAT_NEAREST);
            assert_eq!(*m.ps_sampler_state(slot, 0), SamplerState::MIRROR_LINEAR);
        }

        assert!(panics(|| { m.color_mul(1); }));
        assert!(panics(|| { m.color_add(1); }));
        assert!(panics(|| { m.blend_state(1); }));
        assert!(panics(|| { m.rasterizer_state(1); }));
        assert!(panics(|| { m.scissor_rect(1); }));
        assert!(panics(|| { m.viewport(1); }));
        assert!(panics(|| { m.vs(1); }));
        assert!(panics(|| { m.ps(1); }));
        assert!(panics(|| { m.combined_transform(1); }));
        for slot in 0..SAMPLER_SLOTS {
            assert!(panics(|| { m.vs_sampler_state(slot, 1); }));
            assert!(panics(|| { m.ps_sampler_state(slot, 1); }));
        }
    }

    #[test]
    #[should_panic(expected = "draw index 0 out of range")]
    fn reset_drops_draws() {
        let mut m = CommandManager::new();
        m.push_draw(6);
        m.flush();
        m.reset();
        let _ = m.draw(0);
    }

    // ── coalescing ────────────────────────────────────────────────────────

    #[test]
    fn repeated_push_commits_once() {
        let mut m = CommandManager::new();
        m.push_color_mul(RED);
        m.push_color_mul(RED);
        m.flush();

        assert_eq!(recorded(&m), vec![CommandType::ColorMul]);
        assert_eq!(m.commands()[SEED_COUNT].index, 1);
        assert_eq!(*m.color_mul(1), RED);
    }

    #[test]
    fn pushing_current_value_is_a_no_op() {
        let mut m = CommandManager::new();
        m.push_color_mul(Color::WHITE);
        m.push_blend_state(BlendState::DEFAULT_2D);
        m.push_scissor_rect(None);
        m.flush();
        assert!(recorded(&m).is_empty());
    }

    #[test]
    fn toggle_back_is_suppressed() {
        let mut m = CommandManager::new();
        m.push_color_mul(RED);
        m.push_color_mul(Color::WHITE);
        m.flush();
        assert!(recorded(&m).is_empty());
    }

    #[test]
    fn revert_then_change_again_commits_latest() {
        let mut m = CommandManager::new();
        m.push_color_mul(RED);
        m.push_color_mul(Color::WHITE);
        m.push_color_mul(BLUE);
        m.flush();
        assert_eq!(recorded(&m), vec![CommandType::ColorMul]);
        assert_eq!(*m.color_mul(1), BLUE);
    }

    #[test]
    fn change_while_dirty_updates_live_value() {
        let mut m = CommandManager::new();
        m.push_color_mul(RED);
        m.push_color_mul(BLUE);
        assert_eq!(*m.current_color_mul(), BLUE);
        m.flush();
        assert_eq!(*m.color_mul(1), BLUE);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "color mul must be finite")]
    fn nan_color_is_rejected() {
        let mut m = CommandManager::new();
        m.push_color_mul(Color::new(f32::NAN, 0.0, 0.0, 1.0));
    }

    #[test]
    #[cfg(debug_assertions)]
    fn non_finite_transforms_are_rejected() {
        let bad = Mat3x2::translate(f32::INFINITY, 0.0);
        assert!(panics(|| CommandManager::new().push_local_transform(bad)));
        assert!(panics(|| CommandManager::new().push_camera_transform(bad)));
        assert!(panics(|| CommandManager::new().push_color_add(ColorAdd::new(0.0, f32::NAN, 0.0))));
    }

    // ── draws ─────────────────────────────────────────────────────────────

    #[test]
    fn consecutive_draws_merge() {
        let mut m = CommandManager::new();
        m.push_draw(6);
        m.push_draw(3);
        m.push_draw(12);
        m.flush();

        assert_eq!(recorded(&m), vec![CommandType::Draw]);
        assert_eq!(m.draw(0).index_count, 21);
    }

    #[test]
    fn state_change_commits_before_next_draw() {
        let mut m = CommandManager::new();
        m.push_draw(6);
        m.push_blend_state(BlendState::ADDITIVE);
        m.push_draw(6);
        m.flush();

        assert_eq!(
            recorded(&m),
            vec![CommandType::Draw, CommandType::BlendState, CommandType::Draw]
        );
        assert_eq!(m.draw(0).index_count, 6);
        assert_eq!(m.draw(1).index_count, 6);
        assert_eq!(*m.blend_state(1), BlendState::ADDITIVE);
    }

    #[test]
    fn reverted_state_does_not_split_draws() {
        let mut m = CommandManager::new();
        m.push_draw(6);
        m.push_color_mul(RED);
        m.push_color_mul(Color::WHITE);
        m.push_draw(6);
        m.flush();

        assert_eq!(recorded(&m), vec![CommandType::Draw]);
        assert_eq!(m.draw(0).index_count, 12);
    }

    #[test]
    fn mixed_scenario_batches_same_state_draws() {
        let mut m = CommandManager::new();
        m.push_blend_state(BlendState::ADDITIVE);
        m.push_color_mul(RED);
        m.push_draw(6);
        m.push_color_mul(RED);
        m.push_draw(6);
        m.flush();

        assert_eq!(
            recorded(&m),
            vec![CommandType::ColorMul, CommandType::BlendState, CommandType::Draw]
        );
        assert_eq!(m.draw(0).index_count, 12);
    }

    #[test]
    fn flush_without_pending_work_records_nothing() {
        let mut m = CommandManager::new();
        m.flush();
        m.flush();
        assert!(recorded(&m).is_empty());
    }

    // ── buffers ───────────────────────────────────────────────────────────

    #[test]
    fn update_buffers_commits_pending_draw_first() {
        let mut m = CommandManager::new();
        m.push_draw(6);
        m.push_update_buffers(1);
        m.push_draw(3);
        m.flush();

        let tail: Vec<Command> = m.commands()[SEED_COUNT..].to_vec();
        assert_eq!(
            tail,
            vec![
                Command::new(CommandType::Draw, 0),
                Command::new(CommandType::UpdateBuffers, 1),
                Command::new(CommandType::Draw, 1),
            ]
        );
    }

    #[test]
    fn set_buffers_request_is_committed() {
        let mut m = CommandManager::new();
        m.push_set_buffers();
        m.push_draw(3);
        m.flush();
        assert_eq!(recorded(&m), vec![CommandType::SetBuffers, CommandType::Draw]);
    }

    // ── samplers ──────────────────────────────────────────────────────────

    #[test]
    fn sampler_slots_commit_independently() {
        let mut m = CommandManager::new();
        m.push_ps_sampler_state(2, SamplerState::REPEAT_NEAREST);
        m.push_vs_sampler_state(0, SamplerState::CLAMP_NEAREST);
        m.flush();

        assert_eq!(
            recorded(&m),
            vec![CommandType::VsSamplerState(0), CommandType::PsSamplerState(2)]
        );
        assert_eq!(*m.ps_sampler_state(2, 1), SamplerState::REPEAT_NEAREST);
        assert_eq!(*m.current_ps_sampler_state(1), SamplerState::DEFAULT_2D);
    }

    #[test]
    #[should_panic(expected = "sampler slot")]
    fn sampler_slot_is_checked() {
        let mut m = CommandManager::new();
        m.push_ps_sampler_state(SAMPLER_SLOTS, SamplerState::DEFAULT_2D);
    }

    // ── shaders ───────────────────────────────────────────────────────────

    #[test]
    fn engine_shaders_commit_once_per_frame() {
        let mut m = CommandManager::new();
        m.push_engine_vs(VertexShaderId::SHAPE);
        m.push_engine_ps(PixelShaderId::SHAPE);
        m.push_draw(3);
        m.push_engine_vs(VertexShaderId::SHAPE);
        m.push_engine_ps(PixelShaderId::SHAPE);
        m.push_draw(3);
        m.flush();

        assert_eq!(
            recorded(&m),
            vec![CommandType::SetVs, CommandType::SetPs, CommandType::Draw]
        );
        assert_eq!(m.vs(1), VertexShaderId::SHAPE);
    }

    // ── transform ─────────────────────────────────────────────────────────

    #[test]
    fn combined_transform_is_local_times_camera() {
        let mut m = CommandManager::new();
        let local = Mat3x2::scale(2.0, 2.0);
        let camera = Mat3x2::translate(100.0, 50.0);

        m.push_local_transform(local);
        m.push_camera_transform(camera);

        assert_eq!(*m.current_combined_transform(), local * camera);
        assert!((m.current_max_scaling() - 2.0).abs() < 1e-5);

        m.flush();
        assert_eq!(recorded(&m), vec![CommandType::Transform]);
        assert_eq!(*m.combined_transform(1), local * camera);
    }

    #[test]
    fn transform_revert_is_suppressed() {
        let mut m = CommandManager::new();
        m.push_local_transform(Mat3x2::translate(1.0, 2.0));
        m.push_local_transform(Mat3x2::IDENTITY);
        m.flush();

        assert!(recorded(&m).is_empty());
        assert_eq!(*m.current_local_transform(), Mat3x2::IDENTITY);
    }

    #[test]
    fn camera_revert_through_local_is_suppressed() {
        // Combined matrix returns to the committed one via a different split.
        let mut m = CommandManager::new();
        m.push_camera_transform(Mat3x2::translate(10.0, 0.0));
        m.push_camera_transform(Mat3x2::IDENTITY);
        m.push_local_transform(Mat3x2::IDENTITY);
        m.flush();
        assert!(recorded(&m).is_empty());
        assert_eq!(*m.current_camera_transform(), Mat3x2::IDENTITY);
    }

    // ── getters ───────────────────────────────────────────────────────────

    #[test]
    #[should_panic(expected = "viewport index 3 out of range")]
    fn getter_out_of_range_panics() {
        let m = CommandManager::new();
        let _ = m.viewport(3);
    }

    #[test]
    fn scissor_and_viewport_are_recorded() {
        let mut m = CommandManager::new();
        let rect = Some(PixelRect::new(0, 0, 64, 64));
        m.push_scissor_rect(rect);
        m.push_viewport(rect);
        m.flush();

        assert_eq!(
            recorded(&m),
            vec![CommandType::ScissorRect, CommandType::Viewport]
        );
        assert_eq!(*m.scissor_rect(1), rect);
        assert_eq!(*m.current_viewport(), rect);
    }
}
