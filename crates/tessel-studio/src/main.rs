use anyhow::Result;

use tessel_engine::coords::{Mat3x2, PixelRect, Rect, Vec2, Viewport};
use tessel_engine::core::{App, AppControl, FrameCtx};
use tessel_engine::device::GpuInit;
use tessel_engine::logging::{init_logging, LoggingConfig};
use tessel_engine::paint::{Color, ColorAdd};
use tessel_engine::render::r2d::{BlendState, LineStyle, RasterizerState, Renderer2D};
use tessel_engine::window::{Runtime, RuntimeConfig};

/// Shape gallery: every primitive, blend modes, a scissored strip and a
/// rotating camera-transformed group.
struct Gallery {
    last_title_frame: u64,
}

impl App for Gallery {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let t = ctx.time.elapsed;

        // Refresh the fps readout twice a second at 60 Hz.
        if ctx.time.frame_index >= self.last_title_frame + 30 {
            self.last_title_frame = ctx.time.frame_index;
            ctx.window.set_title(&format!("tessel studio · {:.0} fps", ctx.time.fps));
        }

        ctx.render(|r, viewport| draw_gallery(r, viewport, t))
    }
}

fn draw_gallery(r: &mut Renderer2D, viewport: Viewport, t: f32) {
    let white = Color::WHITE;
    let red = Color::from_rgba8(230, 70, 60, 255);
    let green = Color::from_rgba8(70, 190, 90, 255);
    let blue = Color::from_rgba8(60, 110, 230, 255);
    let yellow = Color::from_rgba8(240, 200, 40, 255);

    r.set_camera_transform(Mat3x2::IDENTITY);
    r.set_local_transform(Mat3x2::IDENTITY);
    r.set_blend_state(BlendState::DEFAULT_2D);
    r.set_rasterizer_state(RasterizerState::DEFAULT_2D);
    r.set_color_add(ColorAdd::ZERO);

    // ── row 1: primitives ─────────────────────────────────────────────────
    r.add_rect(Rect::new(20.0, 20.0, 120.0, 80.0), red);
    r.add_rect_colors(Rect::new(160.0, 20.0, 120.0, 80.0), [red, green, blue, yellow]);
    r.add_rect_frame(Rect::new(310.0, 30.0, 100.0, 60.0), 8.0, white, blue);
    r.add_triangle([Vec2::new(440.0, 100.0), Vec2::new(500.0, 20.0), Vec2::new(560.0, 100.0)], green);
    r.add_triangle_colors(
        [Vec2::new(580.0, 100.0), Vec2::new(640.0, 20.0), Vec2::new(700.0, 100.0)],
        [red, green, blue],
    );
    r.add_quad_colors(
        [
            Vec2::new(730.0, 30.0),
            Vec2::new(830.0, 20.0),
            Vec2::new(810.0, 100.0),
            Vec2::new(740.0, 90.0),
        ],
        [yellow, red, blue, green],
    );

    // ── row 2: circles and lines ──────────────────────────────────────────
    r.add_circle(Vec2::new(80.0, 180.0), 50.0, white, blue);
    r.add_circle_frame(Vec2::new(220.0, 180.0), 35.0, 12.0, yellow, red);
    for (i, radius) in [2.0, 4.0, 7.0, 12.0, 24.0].into_iter().enumerate() {
        r.add_circle(Vec2::new(300.0 + i as f32 * 50.0, 180.0), radius, green, green);
    }
    r.add_line(LineStyle::SquareCap, Vec2::new(560.0, 140.0), Vec2::new(700.0, 220.0), 10.0, [red, blue]);
    r.add_line(LineStyle::NoCap, Vec2::new(560.0, 220.0), Vec2::new(700.0, 140.0), 10.0, [white; 2]);

    // ── row 3: blend modes ────────────────────────────────────────────────
    let blends = [
        BlendState::NON_PREMULTIPLIED,
        BlendState::ADDITIVE,
        BlendState::SUBTRACTIVE,
        BlendState::MULTIPLICATIVE,
    ];
    for (i, blend) in blends.into_iter().enumerate() {
        let x = 20.0 + i as f32 * 130.0;
        r.set_blend_state(BlendState::DEFAULT_2D);
        r.add_rect(Rect::new(x, 260.0, 110.0, 80.0), blue);
        r.set_blend_state(blend);
        r.add_circle(Vec2::new(x + 55.0, 300.0), 36.0, yellow.with_alpha(0.8), yellow.with_alpha(0.8));
    }
    r.set_blend_state(BlendState::DEFAULT_2D);

    // ── row 4: scissored strip, physical pixels ───────────────────────────
    let s = viewport.scale_factor;
    r.set_rasterizer_state(RasterizerState::DEFAULT_2D.with_scissor());
    r.set_scissor_rect(Some(PixelRect::new(
        (20.0 * s) as i32,
        (370.0 * s) as i32,
        (400.0 * s) as i32,
        (60.0 * s) as i32,
    )));
    let offset = (t * 80.0) % 80.0;
    for i in 0..8 {
        let x = 20.0 + i as f32 * 80.0 - offset;
        r.add_rect(Rect::new(x, 370.0, 40.0, 60.0), if i % 2 == 0 { red } else { white });
    }
    r.set_rasterizer_state(RasterizerState::DEFAULT_2D);
    r.set_scissor_rect(None);

    // ── row 5: camera + local transforms, color multiply ──────────────────
    let center = Vec2::new(viewport.width - 160.0, viewport.height - 140.0);
    r.set_camera_transform(Mat3x2::rotate(t * 0.5) * Mat3x2::translate(center.x, center.y));
    r.set_color_mul(Color::new(1.0, 1.0, 1.0, 0.5 + 0.5 * (t * 2.0).sin().abs()));
    for i in 0..6 {
        let angle = i as f32 * core::f32::consts::TAU / 6.0;
        r.set_local_transform(Mat3x2::translate(80.0, 0.0) * Mat3x2::rotate(angle));
        r.add_rect(Rect::new(-15.0, -15.0, 30.0, 30.0), blue);
    }
    r.set_local_transform(Mat3x2::scale_at(1.5, Vec2::zero()));
    r.add_circle(Vec2::zero(), 20.0, white, red);

    r.set_color_mul(Color::WHITE);
    r.set_local_transform(Mat3x2::IDENTITY);
    r.set_camera_transform(Mat3x2::IDENTITY);
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    log::info!("tessel studio starting");

    Runtime::run(
        RuntimeConfig {
            title: "tessel studio".to_string(),
            ..RuntimeConfig::default()
        },
        GpuInit::default(),
        Gallery { last_title_frame: 0 },
    )
}
