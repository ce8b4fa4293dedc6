use bitflags::bitflags;

use super::command::CommandType;

bitflags! {
    /// One bit per state category that can change between draws.
    ///
    /// Sampler slots occupy one byte per shader stage.
    #[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
    pub struct StateFlags: u64 {
        const SET_BUFFERS      = 1 << 0;
        const COLOR_MUL        = 1 << 1;
        const COLOR_ADD        = 1 << 2;
        const BLEND_STATE      = 1 << 3;
        const RASTERIZER_STATE = 1 << 4;
        const SCISSOR_RECT     = 1 << 5;
        const VIEWPORT         = 1 << 6;
        const SET_VS           = 1 << 7;
        const SET_PS           = 1 << 8;
        const TRANSFORM        = 1 << 9;
        const VS_SAMPLERS      = 0xFF << 16;
        const PS_SAMPLERS      = 0xFF << 24;
    }
}

impl StateFlags {
    /// Flag for `kind`. Commands that carry no state (`UpdateBuffers`, `Draw`) map to empty.
    pub fn of(kind: CommandType) -> StateFlags {
        match kind {
            CommandType::SetBuffers => StateFlags::SET_BUFFERS,
            CommandType::UpdateBuffers | CommandType::Draw => StateFlags::empty(),
            CommandType::ColorMul => StateFlags::COLOR_MUL,
            CommandType::ColorAdd => StateFlags::COLOR_ADD,
            CommandType::BlendState => StateFlags::BLEND_STATE,
            CommandType::RasterizerState => StateFlags::RASTERIZER_STATE,
            CommandType::VsSamplerState(slot) => Self::sampler_bit(16, slot),
            CommandType::PsSamplerState(slot) => Self::sampler_bit(24, slot),
            CommandType::ScissorRect => StateFlags::SCISSOR_RECT,
            CommandType::Viewport => StateFlags::VIEWPORT,
            CommandType::SetVs => StateFlags::SET_VS,
            CommandType::SetPs => StateFlags::SET_PS,
            CommandType::Transform => StateFlags::TRANSFORM,
        }
    }

    fn sampler_bit(base: u32, slot: u8) -> StateFlags {
        assert!(slot < 8, "sampler slot {slot} out of range");
        StateFlags::from_bits_retain(1 << (base + slot as u32))
    }
}

/// Dirty-bit set over state categories changed since the last flush.
#[derive(Debug, Default, Clone)]
pub struct StateTracker {
    dirty: StateFlags,
}

impl StateTracker {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn set(&mut self, kind: CommandType) {
        self.dirty.insert(StateFlags::of(kind));
    }

    #[inline]
    pub fn clear(&mut self, kind: CommandType) {
        self.dirty.remove(StateFlags::of(kind));
    }

    #[inline]
    pub fn clear_all(&mut self) {
        self.dirty = StateFlags::empty();
    }

    #[inline]
    pub fn has(&self, kind: CommandType) -> bool {
        self.dirty.intersects(StateFlags::of(kind))
    }

    /// True if any category is dirty; a pending draw must be committed before it changes.
    #[inline]
    pub fn has_state_change(&self) -> bool {
        !self.dirty.is_empty()
    }

    #[inline]
    pub fn flags(&self) -> StateFlags {
        self.dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear_single_category() {
        let mut t = StateTracker::new();
        assert!(!t.has_state_change());

        t.set(CommandType::BlendState);
        assert!(t.has(CommandType::BlendState));
        assert!(!t.has(CommandType::ColorMul));
        assert!(t.has_state_change());

        t.clear(CommandType::BlendState);
        assert!(!t.has(CommandType::BlendState));
        assert!(!t.has_state_change());
    }

    #[test]
    fn clear_all_resets_everything() {
        let mut t = StateTracker::new();
        t.set(CommandType::Transform);
        t.set(CommandType::PsSamplerState(3));
        t.clear_all();
        assert!(!t.has_state_change());
        assert_eq!(t.flags(), StateFlags::empty());
    }

    #[test]
    fn sampler_slots_are_independent() {
        let mut t = StateTracker::new();
        t.set(CommandType::VsSamplerState(2));
        assert!(t.has(CommandType::VsSamplerState(2)));
        assert!(!t.has(CommandType::VsSamplerState(1)));
        assert!(!t.has(CommandType::PsSamplerState(2)));
    }

    #[test]
    fn stateless_commands_are_never_dirty() {
        let mut t = StateTracker::new();
        t.set(CommandType::Draw);
        t.set(CommandType::UpdateBuffers);
        assert!(!t.has(CommandType::Draw));
        assert!(!t.has_state_change());
    }

    #[test]
    #[should_panic(expected = "sampler slot")]
    fn sampler_slot_out_of_range_panics() {
        let mut t = StateTracker::new();
        t.set(CommandType::PsSamplerState(8));
    }
}
