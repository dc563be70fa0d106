use bevy_color::{Alpha, Color};
use bevy_ecs::prelude::*;
use bevy_math::Vec3;
use bevy_reflect::Reflect;

use crate::primitives::*;

pub const MIN_LINE_WIDTH: f32 = 0.01;
pub const MIN_DASH_LENGTH: f32 = 0.1;
pub const MIN_ARROW_HEAD_SIZE: f32 = 0.1;
/// Arrowheads are drawn this much wider than the line they cap.
pub const ARROW_HEAD_WIDTH_SCALE: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    /// Short dashes: `0.3` of the dash length, `0.5` of the gap length.
    Dotted,
}

impl LineStyle {
    /// The `(dash, gap)` pattern of this style, `None` for a solid line.
    pub fn pattern(self, dash_length: f32, gap_length: f32) -> Option<(f32, f32)> {
        match self {
            LineStyle::Solid => None,
            LineStyle::Dashed => Some((dash_length, gap_length)),
            LineStyle::Dotted => Some((dash_length * 0.3, gap_length * 0.5)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct LineParams {
    width: f32,
    style: LineStyle,
    dash_length: f32,
    gap_length: f32,
    arrow_head: bool,
    arrow_head_size: f32,
    parallel_count: u32,
    parallel_spacing: f32,
}

impl Default for LineParams {
    fn default() -> Self {
        LineParams {
            width: 0.1,
            style: LineStyle::Solid,
            dash_length: 0.5,
            gap_length: 0.3,
            arrow_head: true,
            arrow_head_size: 0.5,
            parallel_count: 1,
            parallel_spacing: 0.25,
        }
    }
}

impl LineParams {
    pub fn with_style(self, style: LineStyle) -> Self {
        LineParams { style, ..self }
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.set_width(width);
        self
    }

    pub fn with_dashes(mut self, dash_length: f32, gap_length: f32) -> Self {
        self.set_dashes(dash_length, gap_length);
        self
    }

    pub fn with_arrow_head(mut self, enabled: bool, size: f32) -> Self {
        self.arrow_head = enabled;
        self.arrow_head_size = size.max(MIN_ARROW_HEAD_SIZE);
        self
    }

    pub fn with_parallel_lines(mut self, count: u32, spacing: f32) -> Self {
        self.parallel_count = count.max(1);
        self.parallel_spacing = spacing.max(0.0);
        self
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn arrow_head_width(&self) -> f32 {
        self.width * ARROW_HEAD_WIDTH_SCALE
    }

    pub fn style(&self) -> LineStyle {
        self.style
    }

    pub fn dash_length(&self) -> f32 {
        self.dash_length
    }

    pub fn gap_length(&self) -> f32 {
        self.gap_length
    }

    pub fn arrow_head(&self) -> bool {
        self.arrow_head
    }

    pub fn arrow_head_size(&self) -> f32 {
        self.arrow_head_size
    }

    pub fn parallel_count(&self) -> u32 {
        self.parallel_count
    }

    pub fn parallel_spacing(&self) -> f32 {
        self.parallel_spacing
    }

    pub fn set_width(&mut self, width: f32) {
        self.width = width.max(MIN_LINE_WIDTH);
    }

    pub fn set_dashes(&mut self, dash_length: f32, gap_length: f32) {
        self.dash_length = dash_length.max(MIN_DASH_LENGTH);
        self.gap_length = gap_length.max(MIN_DASH_LENGTH);
    }

    fn sanitized(self) -> Self {
        LineParams {
            width: self.width.max(MIN_LINE_WIDTH),
            dash_length: self.dash_length.max(MIN_DASH_LENGTH),
            gap_length: self.gap_length.max(MIN_DASH_LENGTH),
            arrow_head_size: self.arrow_head_size.max(MIN_ARROW_HEAD_SIZE),
            parallel_count: self.parallel_count.max(1),
            parallel_spacing: self.parallel_spacing.max(0.0),
            ..self
        }
    }
}

/// The four points of an arrowhead outline.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ArrowHead {
    pub left_wing: Vec3,
    pub tip: Vec3,
    pub right_wing: Vec3,
    pub base: Vec3,
}

impl ArrowHead {
    /// Polyline order: left wing, tip, right wing, base.
    pub fn points(&self) -> [Vec3; 4] {
        [self.left_wing, self.tip, self.right_wing, self.base]
    }
}

/// A single segment from `start` to `end`.
pub fn solid(start: Vec3, end: Vec3) -> LineSegment {
    LineSegment::new(start, end)
}

/// Splits `start..end` into dashes of `dash_length` separated by `gap_length`.
///
/// Only whole dash periods are emitted and every dash is clipped to the line, so no segment
/// reaches past `end`.
pub fn dashed(start: Vec3, end: Vec3, dash_length: f32, gap_length: f32) -> Vec<LineSegment> {
    let total = start.distance(end);
    let period = dash_length.max(0.0) + gap_length.max(0.0);
    if total <= f32::EPSILON || period <= f32::EPSILON {
        return Vec::new();
    }
    let direction = (end - start) / total;
    let count = (total / period).floor() as usize;
    (0..count)
        .map(|i| {
            let from = i as f32 * period;
            let to = (from + dash_length).min(total);
            LineSegment::new(start + direction * from, start + direction * to)
        })
        .collect()
}

/// Unit vector perpendicular to `direction` on the ground plane, falling back to the forward axis
/// when `direction` is vertical.
pub fn perpendicular(direction: Vec3) -> Vec3 {
    let right = direction.cross(Vec3::Y).normalize_or_zero();
    if right != Vec3::ZERO {
        return right;
    }
    let fallback = direction.cross(Vec3::NEG_Z).normalize_or_zero();
    if fallback != Vec3::ZERO {
        fallback
    } else {
        Vec3::X
    }
}

fn forward_or_default(direction: Vec3) -> Vec3 {
    let direction = direction.normalize_or_zero();
    if direction == Vec3::ZERO {
        Vec3::NEG_Z
    } else {
        direction
    }
}

/// Arrowhead whose tip sits at `tip`, pointing along `direction`.
pub fn arrow_head(tip: Vec3, direction: Vec3, size: f32) -> ArrowHead {
    let direction = forward_or_default(direction);
    let base = tip - direction * size;
    let wing = perpendicular(direction) * (size * 0.5);
    ArrowHead {
        left_wing: base - wing,
        tip,
        right_wing: base + wing,
        base,
    }
}

/// Offsets of `count` parallel lines: line `i` sits `i * spacing` away, on the positive side of
/// `perpendicular` for even `i` and the negative side for odd `i`.
pub fn parallel_offsets(
    count: u32,
    spacing: f32,
    perpendicular: Vec3,
) -> impl Iterator<Item = Vec3> {
    (0..count).map(move |i| {
        let side = if i % 2 == 0 { 1.0 } else { -1.0 };
        perpendicular * (i as f32 * spacing * side)
    })
}

/// Segments and arrowheads of a line indicator, in world space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineGeometry {
    start: Vec3,
    end: Vec3,
    lines: Vec<Vec<LineSegment>>,
    arrow_heads: Vec<ArrowHead>,
}

impl LineGeometry {
    /// Lines from `start` toward `start + direction * range`, shortened by `fill_amount`.
    pub fn build(
        start: Vec3,
        direction: Vec3,
        range: f32,
        fill_amount: f32,
        params: &LineParams,
    ) -> Self {
        let direction = forward_or_default(direction);
        let end = start.lerp(start + direction * range, fill_amount.clamp(0.0, 1.0));
        let pattern = params.style.pattern(params.dash_length, params.gap_length);
        let mut geometry = LineGeometry {
            start,
            end,
            ..Default::default()
        };
        for offset in parallel_offsets(
            params.parallel_count,
            params.parallel_spacing,
            perpendicular(direction),
        ) {
            let (from, to) = (start + offset, end + offset);
            geometry.lines.push(match pattern {
                None => vec![solid(from, to)],
                Some((dash, gap)) => dashed(from, to, dash, gap),
            });
            if params.arrow_head {
                geometry
                    .arrow_heads
                    .push(arrow_head(to, direction, params.arrow_head_size));
            }
        }
        geometry
    }

    pub fn start(&self) -> Vec3 {
        self.start
    }

    /// End of the center line after the fill amount is applied.
    pub fn end(&self) -> Vec3 {
        self.end
    }

    /// Segments of each parallel line, center line first.
    pub fn lines(&self) -> &[Vec<LineSegment>] {
        &self.lines
    }

    pub fn segments(&self) -> impl Iterator<Item = &LineSegment> + '_ {
        self.lines.iter().flatten()
    }

    pub fn arrow_heads(&self) -> &[ArrowHead] {
        &self.arrow_heads
    }
}

/// Straight line indicator for precise targeting.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct LineIndicator {
    state: IndicatorState,
    params: LineParams,
    #[reflect(ignore)]
    geometry: LineGeometry,
}

impl Default for LineIndicator {
    fn default() -> Self {
        LineIndicator::new(LineParams::default())
    }
}

impl LineIndicator {
    pub fn new(params: LineParams) -> Self {
        let mut line = LineIndicator {
            state: IndicatorState::default(),
            params,
            geometry: LineGeometry::default(),
        };
        line.configure(params);
        line
    }

    pub fn with_range(mut self, range: f32) -> Self {
        self.state.set_range(range);
        self
    }

    pub fn with_color(mut self, color: impl Into<Color>) -> Self {
        self.state.set_color(color);
        self
    }

    pub fn params(&self) -> &LineParams {
        &self.params
    }

    pub fn geometry(&self) -> &LineGeometry {
        &self.geometry
    }

    pub fn set_style(&mut self, style: LineStyle) {
        self.configure(self.params.with_style(style));
    }

    /// Color of the line and its arrowheads.
    pub fn line_color(&self) -> Color {
        let config = self.state.config();
        let color = mix_colors(config.fill_color(), config.color(), config.fill_amount());
        match config.fill_enabled() {
            true => color.with_alpha(config.fill_color().alpha()),
            false => color,
        }
    }
}

impl IndicatorShape for LineIndicator {
    type Params = LineParams;

    fn state(&self) -> &IndicatorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut IndicatorState {
        &mut self.state
    }

    fn configure(&mut self, params: LineParams) {
        if self.state.mark_configured() {
            self.params = params.sanitized();
        }
    }

    fn recompute(&mut self, anchor: &IndicatorAnchor) {
        let config = self.state.config();
        let direction = self.state.target().direction_from(anchor);
        self.geometry = LineGeometry::build(
            anchor.origin,
            *direction,
            config.range(),
            config.fill_amount(),
            &self.params,
        );
    }

    fn release(&mut self) {
        self.geometry = LineGeometry::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_returns_endpoints_in_order() {
        let (a, b) = (Vec3::new(1.0, 2.0, 3.0), Vec3::new(-4.0, 0.5, 9.0));
        assert_eq!(solid(a, b), LineSegment::new(a, b));
        assert_eq!(solid(b, a), LineSegment::new(b, a));
    }

    #[test]
    fn dashes_never_overshoot() {
        let (start, end) = (Vec3::ZERO, Vec3::new(3.0, 0.0, 4.0));
        let total = start.distance(end);
        for (dash, gap) in [(0.5, 0.3), (1.0, 0.1), (0.15, 0.05), (4.9, 0.1), (2.0, 2.0)] {
            let segments = dashed(start, end, dash, gap);
            assert_eq!(segments.len(), (total / (dash + gap)).floor() as usize);
            let drawn: f32 = segments.iter().map(LineSegment::length).sum();
            assert!(drawn <= total + 1e-4);
            let axis = (end - start) / total;
            for segment in &segments {
                assert!((segment.end - start).dot(axis) <= total + 1e-4);
                assert!(segment.length() <= dash + 1e-4);
            }
        }
    }

    #[test]
    fn dashes_are_idempotent() {
        let (start, end) = (Vec3::new(-1.0, 0.5, 2.0), Vec3::new(6.5, 0.5, -3.25));
        assert_eq!(dashed(start, end, 0.4, 0.2), dashed(start, end, 0.4, 0.2));
    }

    #[test]
    fn short_line_has_no_dashes() {
        assert!(dashed(Vec3::ZERO, Vec3::X * 0.5, 0.5, 0.3).is_empty());
        assert!(dashed(Vec3::ZERO, Vec3::ZERO, 0.5, 0.3).is_empty());
    }

    #[test]
    fn dotted_pattern_is_shorter() {
        assert_eq!(LineStyle::Dotted.pattern(1.0, 1.0), Some((0.3, 0.5)));
        assert_eq!(LineStyle::Solid.pattern(1.0, 1.0), None);
    }

    #[test]
    fn arrow_head_shape() {
        let head = arrow_head(Vec3::new(0.0, 0.0, -10.0), Vec3::NEG_Z, 1.0);
        assert_eq!(head.base, Vec3::new(0.0, 0.0, -9.0));
        assert!(head.right_wing.abs_diff_eq(Vec3::new(0.5, 0.0, -9.0), 1e-6));
        assert!(head.left_wing.abs_diff_eq(Vec3::new(-0.5, 0.0, -9.0), 1e-6));
        assert_eq!(head.points()[1], head.tip);
    }

    #[test]
    fn vertical_arrow_uses_fallback_axis() {
        let head = arrow_head(Vec3::Y * 5.0, Vec3::Y, 2.0);
        assert_eq!(head.base, Vec3::Y * 3.0);
        let span = head.right_wing - head.left_wing;
        assert!((span.length() - 2.0).abs() < 1e-5);
        assert!(span.dot(Vec3::Y).abs() < 1e-6);
    }

    #[test]
    fn fill_shortens_without_turning() {
        let params = LineParams::default();
        let geometry = LineGeometry::build(Vec3::ZERO, Vec3::X, 10.0, 0.25, &params);
        assert!(geometry.end().abs_diff_eq(Vec3::X * 2.5, 1e-6));
        assert_eq!(geometry.lines()[0], vec![LineSegment::new(Vec3::ZERO, geometry.end())]);
        assert_eq!(geometry.arrow_heads()[0].tip, geometry.end());
    }

    #[test]
    fn parallel_lines_alternate_sides() {
        let offsets: Vec<Vec3> = parallel_offsets(4, 0.5, Vec3::X).collect();
        assert_eq!(
            offsets,
            vec![
                Vec3::ZERO,
                Vec3::new(-0.5, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(-1.5, 0.0, 0.0),
            ]
        );

        let params = LineParams::default()
            .with_parallel_lines(3, 0.5)
            .with_style(LineStyle::Dashed)
            .with_dashes(1.0, 1.0);
        let geometry = LineGeometry::build(Vec3::ZERO, Vec3::NEG_Z, 10.0, 1.0, &params);
        assert_eq!(geometry.lines().len(), 3);
        assert_eq!(geometry.arrow_heads().len(), 3);
        assert!(geometry.lines().iter().all(|line| line.len() == 5));
        assert_eq!(geometry.segments().count(), 15);
    }

    #[test]
    fn indicator_follows_target() {
        let mut line = LineIndicator::new(LineParams::default()).with_range(4.0);
        line.state_mut().set_point(Vec3::new(0.0, 1.0, 100.0));
        line.update(&IndicatorAnchor::at(Vec3::Y), 0.016);
        assert!(line
            .geometry()
            .end()
            .abs_diff_eq(Vec3::new(0.0, 1.0, 4.0), 1e-5));
    }

    #[test]
    fn params_are_clamped() {
        let params = LineParams::default()
            .with_width(0.0)
            .with_dashes(0.0, -1.0)
            .with_arrow_head(true, 0.0);
        assert_eq!(params.width(), MIN_LINE_WIDTH);
        assert_eq!(params.dash_length(), MIN_DASH_LENGTH);
        assert_eq!(params.gap_length(), MIN_DASH_LENGTH);
        assert_eq!(params.arrow_head_size(), MIN_ARROW_HEAD_SIZE);
    }

    #[test]
    fn line_color_keeps_fill_alpha() {
        let line = LineIndicator::default();
        assert!((line.line_color().alpha() - 0.3).abs() < 1e-6);
    }
}
