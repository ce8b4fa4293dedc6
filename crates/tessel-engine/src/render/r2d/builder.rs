//! CPU tessellation of 2D primitives into vertex/index buffer regions.
//!
//! Every `build_*` function asks a [`BufferCreator`] for exactly the space it
//! needs, fills it, and returns the number of indices written. A creator that
//! cannot reserve space returns `None`; the primitive is then dropped and the
//! builder returns 0.

use std::sync::LazyLock;

use crate::coords::{Rect, Vec2};
use crate::paint::Color;

use super::vertex::{IndexType, Vertex2D};

/// Writable region handed out by a [`BufferCreator`].
///
/// `index_offset` is the batch-relative index of `vertices[0]`.
pub struct BufferSlot<'a> {
    pub vertices: &'a mut [Vertex2D],
    pub indices: &'a mut [IndexType],
    pub index_offset: IndexType,
}

/// Allocator for vertex/index space.
pub trait BufferCreator {
    /// Reserves `vertex_count` vertices and `index_count` indices.
    ///
    /// Returns `None` when the space cannot be provided.
    fn create_buffer(&mut self, vertex_count: u16, index_count: u32) -> Option<BufferSlot<'_>>;
}

/// Line end-cap style.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum LineStyle {
    /// Ends are extended by half the thickness.
    #[default]
    SquareCap,
    /// Ends stop exactly at the endpoints.
    NoCap,
}

/// Highest circle quality (segments per quadrant).
pub const MAX_CIRCLE_QUALITY: u16 = 63;

const RECT_INDEX_TABLE: [IndexType; 6] = [0, 1, 2, 2, 1, 3];

const QUAD_INDEX_TABLE: [IndexType; 6] = [0, 1, 3, 3, 1, 2];

/// `(sin, -cos)` of `i * (π/2) / q` for every quality `q` in `1..=63` and `i` in `0..q`,
/// rows packed back to back.
static SIN_COS_TABLE: LazyLock<Vec<Vec2>> = LazyLock::new(|| {
    let q_max = MAX_CIRCLE_QUALITY as usize;
    let mut table = Vec::with_capacity(q_max * (q_max + 1) / 2);

    for quality in 1..=MAX_CIRCLE_QUALITY {
        let rad_delta = core::f32::consts::FRAC_PI_2 / quality as f32;

        for i in 0..quality {
            let (s, c) = (rad_delta * i as f32).sin_cos();
            table.push(Vec2::new(s, -c));
        }
    }

    table
});

#[inline]
const fn sin_cos_row(quality: u16) -> usize {
    let q = quality as usize;
    q * (q - 1) / 2
}

/// Quadrant rows for `quality`.
fn sin_cos(quality: u16) -> &'static [Vec2] {
    let start = sin_cos_row(quality);
    &SIN_COS_TABLE[start..start + quality as usize]
}

/// Segments per quarter circle for an on-screen radius `r`.
///
/// Step function: `r <= 2` → 2, `r <= 4` → 3, `r < 8` → 4, then one extra
/// segment every 8 px, capped at [`MAX_CIRCLE_QUALITY`]. Huge, infinite and
/// NaN radii land on the cap.
pub fn circle_quality(r: f32) -> u16 {
    if r <= 2.0 {
        2
    } else if r <= 4.0 {
        3
    } else if r < 8.0 {
        4
    } else {
        // Clamped in float so the cast never sees an out-of-range value.
        (5.0 + ((r - 8.0) / 8.0).floor()).min(f32::from(MAX_CIRCLE_QUALITY)) as u16
    }
}

fn write_indices(slot: &mut BufferSlot<'_>, table: &[IndexType]) {
    for (dst, &i) in slot.indices.iter_mut().zip(table) {
        *dst = slot.index_offset + i;
    }
}

// ── lines ─────────────────────────────────────────────────────────────────

/// Builds a thick line as a quad. `colors` are the start and end colors.
///
/// A degenerate segment (`start == end`, or a non-finite direction) builds nothing.
pub fn build_line(
    creator: &mut impl BufferCreator,
    style: LineStyle,
    start: Vec2,
    end: Vec2,
    thickness: f32,
    colors: [Color; 2],
) -> u32 {
    let dir = (end - start).normalized();
    if !dir.is_finite() {
        return 0;
    }

    let half = thickness * 0.5;
    let normal = dir.perp() * half;

    let (start, end) = match style {
        LineStyle::SquareCap => (start - dir * half, end + dir * half),
        LineStyle::NoCap => (start, end),
    };

    let Some(mut slot) = creator.create_buffer(4, 6) else { return 0 };

    slot.vertices[0].set(start + normal, colors[0]);
    slot.vertices[1].set(start - normal, colors[0]);
    slot.vertices[2].set(end + normal, colors[1]);
    slot.vertices[3].set(end - normal, colors[1]);

    write_indices(&mut slot, &RECT_INDEX_TABLE);
    6
}

// ── triangles ─────────────────────────────────────────────────────────────

pub fn build_triangle(creator: &mut impl BufferCreator, points: [Vec2; 3], color: Color) -> u32 {
    build_triangle_colors(creator, points, [color; 3])
}

pub fn build_triangle_colors(
    creator: &mut impl BufferCreator,
    points: [Vec2; 3],
    colors: [Color; 3],
) -> u32 {
    let Some(mut slot) = creator.create_buffer(3, 3) else { return 0 };

    for i in 0..3 {
        slot.vertices[i].set(points[i], colors[i]);
    }

    write_indices(&mut slot, &[0, 1, 2]);
    3
}

// ── rects ─────────────────────────────────────────────────────────────────

pub fn build_rect(creator: &mut impl BufferCreator, rect: Rect, color: Color) -> u32 {
    build_rect_colors(creator, rect, [color; 4])
}

/// `colors` are top-left, top-right, bottom-right, bottom-left.
pub fn build_rect_colors(creator: &mut impl BufferCreator, rect: Rect, colors: [Color; 4]) -> u32 {
    let Some(mut slot) = creator.create_buffer(4, 6) else { return 0 };

    let (l, t, r, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());
    slot.vertices[0].set(Vec2::new(l, t), colors[0]);
    slot.vertices[1].set(Vec2::new(r, t), colors[1]);
    slot.vertices[2].set(Vec2::new(l, b), colors[3]);
    slot.vertices[3].set(Vec2::new(r, b), colors[2]);

    write_indices(&mut slot, &RECT_INDEX_TABLE);
    6
}

/// Frame of width `thickness` drawn outside `inner`.
pub fn build_rect_frame(
    creator: &mut impl BufferCreator,
    inner: Rect,
    thickness: f32,
    inner_color: Color,
    outer_color: Color,
) -> u32 {
    const INDICES: [IndexType; 24] = [
        0, 1, 4, 4, 1, 5, // top
        1, 2, 5, 5, 2, 6, // right
        2, 3, 6, 6, 3, 7, // bottom
        3, 0, 7, 7, 0, 4, // left
    ];

    let Some(mut slot) = creator.create_buffer(8, 24) else { return 0 };

    let outer = inner.inflated(thickness);
    for (base, r, color) in [(0, outer, outer_color), (4, inner, inner_color)] {
        slot.vertices[base].set(Vec2::new(r.left(), r.top()), color);
        slot.vertices[base + 1].set(Vec2::new(r.right(), r.top()), color);
        slot.vertices[base + 2].set(Vec2::new(r.right(), r.bottom()), color);
        slot.vertices[base + 3].set(Vec2::new(r.left(), r.bottom()), color);
    }

    write_indices(&mut slot, &INDICES);
    24
}

// ── quads ─────────────────────────────────────────────────────────────────

/// `points` run clockwise from the top-left corner.
pub fn build_quad(creator: &mut impl BufferCreator, points: [Vec2; 4], color: Color) -> u32 {
    build_quad_colors(creator, points, [color; 4])
}

pub fn build_quad_colors(
    creator: &mut impl BufferCreator,
    points: [Vec2; 4],
    colors: [Color; 4],
) -> u32 {
    let Some(mut slot) = creator.create_buffer(4, 6) else { return 0 };

    for i in 0..4 {
        slot.vertices[i].set(points[i], colors[i]);
    }

    write_indices(&mut slot, &QUAD_INDEX_TABLE);
    6
}

// ── circles ───────────────────────────────────────────────────────────────

/// Writes the rim of one circle into `dst` (`4 * quality` entries), starting at
/// 12 o'clock and running clockwise. Only one quadrant is looked up; the other
/// three are mirrored from it.
fn write_rim(dst: &mut [Vertex2D], center: Vec2, r: f32, quality: u16, stride: usize) {
    let q = quality as usize;

    for (i, cs) in sin_cos(quality).iter().enumerate() {
        let x = cs.x * r;
        let y = cs.y * r;

        dst[i * stride].set_pos(center.x + x, center.y + y);
        dst[(i + q) * stride].set_pos(center.x - y, center.y + x);
        dst[(i + 2 * q) * stride].set_pos(center.x - x, center.y - y);
        dst[(i + 3 * q) * stride].set_pos(center.x + y, center.y - x);
    }
}

/// Filled circle as a triangle fan around the center vertex.
///
/// `scale` is the current transform's max scaling; quality follows the
/// on-screen radius.
pub fn build_circle(
    creator: &mut impl BufferCreator,
    center: Vec2,
    r: f32,
    inner_color: Color,
    outer_color: Color,
    scale: f32,
) -> u32 {
    let quality = circle_quality(r * scale);
    let full = quality * 4;
    let vertex_count = full + 1;
    let index_count = full as u32 * 3;

    let Some(slot) = creator.create_buffer(vertex_count, index_count) else { return 0 };

    slot.vertices[0].set(center, inner_color);
    for v in &mut slot.vertices[1..] {
        v.color = outer_color.to_array();
    }
    write_rim(&mut slot.vertices[1..], center, r, quality, 1);

    let base = slot.index_offset;
    for (i, tri) in slot.indices.chunks_exact_mut(3).enumerate() {
        let i = i as IndexType;
        let next = if i + 1 == full { 1 } else { i + 2 };
        tri[0] = base + i + 1;
        tri[1] = base;
        tri[2] = base + next;
    }

    index_count
}

/// Ring between `r_inner` and `r_inner + thickness`.
pub fn build_circle_frame(
    creator: &mut impl BufferCreator,
    center: Vec2,
    r_inner: f32,
    thickness: f32,
    inner_color: Color,
    outer_color: Color,
    scale: f32,
) -> u32 {
    let r_outer = r_inner + thickness;
    let quality = circle_quality(r_outer * scale);
    let full = quality * 4;
    let vertex_count = full * 2;
    let index_count = full as u32 * 6;

    let Some(slot) = creator.create_buffer(vertex_count, index_count) else { return 0 };

    // Interleaved: even = inner rim, odd = outer rim.
    for pair in slot.vertices.chunks_exact_mut(2) {
        pair[0].color = inner_color.to_array();
        pair[1].color = outer_color.to_array();
    }
    write_rim(slot.vertices, center, r_inner, quality, 2);
    write_rim(&mut slot.vertices[1..], center, r_outer, quality, 2);

    let base = slot.index_offset;
    for (i, quad) in slot.indices.chunks_exact_mut(6).enumerate() {
        let i = i as IndexType;
        let a = i * 2;
        let c = if i + 1 == full { 0 } else { a + 2 };
        quad.copy_from_slice(&[
            base + a,
            base + a + 1,
            base + c,
            base + c,
            base + a + 1,
            base + c + 1,
        ]);
    }

    index_count
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Growable test allocator with an optional vertex cap.
    #[derive(Default)]
    struct Sink {
        vertices: Vec<Vertex2D>,
        indices: Vec<IndexType>,
        max_vertices: Option<usize>,
    }

    impl BufferCreator for Sink {
        fn create_buffer(&mut self, vertex_count: u16, index_count: u32) -> Option<BufferSlot<'_>> {
            let v0 = self.vertices.len();
            if self.max_vertices.is_some_and(|max| v0 + vertex_count as usize > max) {
                return None;
            }
            let i0 = self.indices.len();
            self.vertices.resize(v0 + vertex_count as usize, Vertex2D::default());
            self.indices.resize(i0 + index_count as usize, 0);
            Some(BufferSlot {
                vertices: &mut self.vertices[v0..],
                indices: &mut self.indices[i0..],
                index_offset: v0 as IndexType,
            })
        }
    }

    fn full() -> Sink {
        Sink { max_vertices: Some(0), ..Sink::default() }
    }

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    // ── quality ───────────────────────────────────────────────────────────

    #[test]
    fn quality_steps() {
        assert_eq!(circle_quality(0.5), 2);
        assert_eq!(circle_quality(2.0), 2);
        assert_eq!(circle_quality(3.0), 3);
        assert_eq!(circle_quality(4.0), 3);
        assert_eq!(circle_quality(7.9), 4);
        assert_eq!(circle_quality(8.0), 5);
        assert_eq!(circle_quality(16.0), 6);
        assert_eq!(circle_quality(100_000.0), MAX_CIRCLE_QUALITY);
    }

    #[test]
    fn quality_is_monotonic_and_capped() {
        let mut prev = 0;
        let mut r = 0.0f32;
        while r < 2_000.0 {
            let q = circle_quality(r);
            assert!(q >= prev, "quality dropped at r = {r}");
            assert!(q <= MAX_CIRCLE_QUALITY);
            prev = q;
            r += 0.25;
        }
    }

    #[test]
    fn quality_saturates_for_huge_radii() {
        for r in [2_000.0, 3.0e10, f32::MAX, f32::INFINITY, f32::NAN] {
            assert_eq!(circle_quality(r), MAX_CIRCLE_QUALITY, "r = {r}");
        }
    }

    #[test]
    fn sin_cos_table_rows() {
        assert_eq!(SIN_COS_TABLE.len(), 2016);
        for q in [1u16, 2, 17, 63] {
            let row = sin_cos(q);
            assert_eq!(row.len(), q as usize);
            assert!(approx(row[0], Vec2::new(0.0, -1.0)));
        }
        let last = sin_cos(2)[1];
        let h = core::f32::consts::FRAC_1_SQRT_2;
        assert!(approx(last, Vec2::new(h, -h)));
    }

    // ── lines ─────────────────────────────────────────────────────────────

    #[test]
    fn uncapped_line_corners() {
        let mut sink = Sink::default();
        let n = build_line(
            &mut sink,
            LineStyle::NoCap,
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            4.0,
            [Color::WHITE, Color::BLACK],
        );
        assert_eq!(n, 6);
        assert!(approx(sink.vertices[0].position(), Vec2::new(0.0, 2.0)));
        assert!(approx(sink.vertices[1].position(), Vec2::new(0.0, -2.0)));
        assert!(approx(sink.vertices[2].position(), Vec2::new(10.0, 2.0)));
        assert_eq!(sink.vertices[3].color, Color::BLACK.to_array());
        assert_eq!(sink.indices, vec![0, 1, 2, 2, 1, 3]);
    }

    #[test]
    fn square_cap_extends_endpoints() {
        let mut sink = Sink::default();
        build_line(
            &mut sink,
            LineStyle::SquareCap,
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            4.0,
            [Color::WHITE; 2],
        );
        assert!(approx(sink.vertices[0].position(), Vec2::new(-2.0, 2.0)));
        assert!(approx(sink.vertices[3].position(), Vec2::new(12.0, -2.0)));
    }

    #[test]
    fn degenerate_line_builds_nothing() {
        let mut sink = Sink::default();
        let p = Vec2::new(5.0, 5.0);
        assert_eq!(build_line(&mut sink, LineStyle::SquareCap, p, p, 2.0, [Color::WHITE; 2]), 0);
        assert!(sink.vertices.is_empty());
    }

    // ── simple shapes ─────────────────────────────────────────────────────

    #[test]
    fn indices_are_offset_by_batch_position() {
        let mut sink = Sink::default();
        build_triangle(&mut sink, [Vec2::zero(); 3], Color::WHITE);
        build_rect(&mut sink, Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE);
        assert_eq!(&sink.indices[3..], &[3, 4, 5, 5, 4, 6]);
    }

    #[test]
    fn rect_corner_colors() {
        let c = [
            Color::new(1.0, 0.0, 0.0, 1.0),
            Color::new(0.0, 1.0, 0.0, 1.0),
            Color::new(0.0, 0.0, 1.0, 1.0),
            Color::new(1.0, 1.0, 0.0, 1.0),
        ];
        let mut sink = Sink::default();
        build_rect_colors(&mut sink, Rect::new(10.0, 20.0, 30.0, 40.0), c);

        // vertex order: TL, TR, BL, BR
        assert_eq!(sink.vertices[0].pos, [10.0, 20.0]);
        assert_eq!(sink.vertices[3].pos, [40.0, 60.0]);
        assert_eq!(sink.vertices[2].color, c[3].to_array());
        assert_eq!(sink.vertices[3].color, c[2].to_array());
    }

    #[test]
    fn rect_frame_wraps_inner_rect() {
        let mut sink = Sink::default();
        let n = build_rect_frame(&mut sink, Rect::new(10.0, 10.0, 20.0, 20.0), 5.0, Color::WHITE, Color::BLACK);
        assert_eq!(n, 24);
        assert_eq!(sink.vertices.len(), 8);
        assert_eq!(sink.vertices[0].pos, [5.0, 5.0]);
        assert_eq!(sink.vertices[6].pos, [30.0, 30.0]);
        assert_eq!(sink.vertices[0].color, Color::BLACK.to_array());
        assert_eq!(sink.vertices[4].color, Color::WHITE.to_array());
    }

    #[test]
    fn quad_uses_quad_table() {
        let mut sink = Sink::default();
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(2.0, 0.0), Vec2::new(2.0, 2.0), Vec2::new(0.0, 2.0)];
        assert_eq!(build_quad(&mut sink, pts, Color::WHITE), 6);
        assert_eq!(sink.indices, vec![0, 1, 3, 3, 1, 2]);
    }

    // ── circles ───────────────────────────────────────────────────────────

    #[test]
    fn circle_vertex_and_index_counts() {
        let mut sink = Sink::default();
        let n = build_circle(&mut sink, Vec2::new(50.0, 50.0), 10.0, Color::WHITE, Color::BLACK, 1.0);
        let q = circle_quality(10.0) as usize;
        assert_eq!(n as usize, q * 4 * 3);
        assert_eq!(sink.vertices.len(), q * 4 + 1);
    }

    #[test]
    fn circle_rim_lies_on_radius() {
        let mut sink = Sink::default();
        let center = Vec2::new(50.0, 40.0);
        build_circle(&mut sink, center, 20.0, Color::WHITE, Color::BLACK, 1.0);

        assert_eq!(sink.vertices[0].position(), center);
        assert_eq!(sink.vertices[0].color, Color::WHITE.to_array());
        for v in &sink.vertices[1..] {
            assert!(((v.position() - center).length() - 20.0).abs() < 1e-3);
            assert_eq!(v.color, Color::BLACK.to_array());
        }
        // First rim vertex is at 12 o'clock.
        assert!(approx(sink.vertices[1].position(), Vec2::new(50.0, 20.0)));
    }

    #[test]
    fn circle_fan_closes() {
        let mut sink = Sink::default();
        build_circle(&mut sink, Vec2::zero(), 1.0, Color::WHITE, Color::WHITE, 1.0);
        let full = 8;
        assert_eq!(&sink.indices[..3], &[1, 0, 2]);
        assert_eq!(&sink.indices[sink.indices.len() - 3..], &[full, 0, 1]);
    }

    #[test]
    fn circle_quality_follows_scale() {
        let mut small = Sink::default();
        let mut large = Sink::default();
        build_circle(&mut small, Vec2::zero(), 10.0, Color::WHITE, Color::WHITE, 1.0);
        build_circle(&mut large, Vec2::zero(), 10.0, Color::WHITE, Color::WHITE, 8.0);
        assert!(large.vertices.len() > small.vertices.len());
    }

    #[test]
    fn circle_frame_counts_and_radii() {
        let mut sink = Sink::default();
        let center = Vec2::new(0.0, 0.0);
        let n = build_circle_frame(&mut sink, center, 10.0, 4.0, Color::WHITE, Color::BLACK, 1.0);
        let q = circle_quality(14.0) as usize;
        assert_eq!(n as usize, q * 4 * 6);
        assert_eq!(sink.vertices.len(), q * 8);
        assert!((sink.vertices[0].position().length() - 10.0).abs() < 1e-3);
        assert!((sink.vertices[1].position().length() - 14.0).abs() < 1e-3);
        assert!(sink.indices.iter().all(|&i| (i as usize) < sink.vertices.len()));
    }

    // ── backpressure ──────────────────────────────────────────────────────

    #[test]
    fn exhausted_creator_drops_every_shape() {
        let mut sink = full();
        let r = Rect::new(0.0, 0.0, 1.0, 1.0);
        let p = Vec2::zero();
        assert_eq!(build_rect(&mut sink, r, Color::WHITE), 0);
        assert_eq!(build_triangle(&mut sink, [p; 3], Color::WHITE), 0);
        assert_eq!(build_circle(&mut sink, p, 5.0, Color::WHITE, Color::WHITE, 1.0), 0);
        assert_eq!(build_circle_frame(&mut sink, p, 5.0, 1.0, Color::WHITE, Color::WHITE, 1.0), 0);
        assert_eq!(build_rect_frame(&mut sink, r, 1.0, Color::WHITE, Color::WHITE), 0);
        assert_eq!(build_quad(&mut sink, [p; 4], Color::WHITE), 0);
        assert_eq!(
            build_line(&mut sink, LineStyle::NoCap, p, Vec2::new(1.0, 0.0), 1.0, [Color::WHITE; 2]),
            0
        );
        assert!(sink.vertices.is_empty());
    }
}
