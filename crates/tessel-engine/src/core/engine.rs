use crate::paint::Color;
use crate::render::r2d::{Renderer2D, Renderer2DConfig, WgpuRenderer2D};
use crate::time::{FrameClock, FrameTime};

/// Per-window engine settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub renderer: Renderer2DConfig,
    /// Color the surface is cleared to before 2D drawing.
    pub clear_color: Color,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            renderer: Renderer2DConfig::default(),
            clear_color: Color::new(0.8, 0.9, 1.0, 1.0),
        }
    }
}

/// Explicit per-window engine context: 2D recorder, its GPU backend and the
/// frame clock.
///
/// Fields are declared in reverse construction order so they drop in reverse.
pub struct Engine {
    backend: WgpuRenderer2D,
    renderer: Renderer2D,
    clock: FrameClock,
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let clock = FrameClock::new();
        let renderer = Renderer2D::new(config.renderer);
        let backend = WgpuRenderer2D::new();
        log::debug!("tessel: engine created ({:?})", config.renderer);

        Self { backend, renderer, clock, config }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn set_clear_color(&mut self, color: Color) {
        self.config.clear_color = color;
    }

    #[inline]
    pub fn renderer(&self) -> &Renderer2D {
        &self.renderer
    }

    #[inline]
    pub fn renderer_mut(&mut self) -> &mut Renderer2D {
        &mut self.renderer
    }

    pub(crate) fn tick(&mut self) -> FrameTime {
        self.clock.tick()
    }

    pub(crate) fn reset_clock(&mut self) {
        self.clock.reset();
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut Renderer2D, &mut WgpuRenderer2D) {
        (&mut self.renderer, &mut self.backend)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
