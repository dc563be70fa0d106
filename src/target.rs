use std::f32::consts::TAU;

use bevy_color::{Alpha, Color};
use bevy_ecs::prelude::*;
use bevy_math::{Quat, Vec3};
use bevy_reflect::Reflect;
use bevy_transform::components::Transform;
use bevy_utils::tracing::debug;

use crate::{cone::MIN_RESOLUTION, mesh::IndicatorMesh, primitives::*};

pub const MIN_TARGET_RADIUS: f32 = 0.1;
/// Smallest gap kept between the inner and outer radius.
pub const RADIUS_EPSILON: f32 = 0.1;
/// Crosshair half-length relative to the inner radius.
pub const CROSSHAIR_SCALE: f32 = 0.8;

/// How the decorative rings are spread between the inner and outer radius.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub enum RingLayout {
    /// `ring_count` rings evenly spaced strictly between the inner and outer radius.
    #[default]
    Even,
    /// Rings stepping inward from the outer radius by a fixed spacing.
    Spaced(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct PulseEffect {
    pub speed: f32,
    pub amplitude: f32,
}

impl Default for PulseEffect {
    fn default() -> Self {
        PulseEffect {
            speed: 2.0,
            amplitude: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct TargetParams {
    inner_radius: f32,
    outer_radius: f32,
    resolution: u32,
    ring_count: u32,
    ring_layout: RingLayout,
    rings: bool,
    crosshair: bool,
    sector_count: u32,
    /// Spin in degrees per second.
    rotation_speed: Option<f32>,
    pulse: Option<PulseEffect>,
}

impl Default for TargetParams {
    fn default() -> Self {
        TargetParams {
            inner_radius: 1.0,
            outer_radius: 3.0,
            resolution: 36,
            ring_count: 3,
            ring_layout: RingLayout::Even,
            rings: true,
            crosshair: true,
            sector_count: 0,
            rotation_speed: None,
            pulse: None,
        }
    }
}

impl TargetParams {
    pub fn new(inner_radius: f32, outer_radius: f32) -> Self {
        let mut params = TargetParams::default();
        params.set_inner_radius(inner_radius);
        params.set_outer_radius(outer_radius);
        params
    }

    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution.max(MIN_RESOLUTION);
        self
    }

    pub fn with_rings(self, ring_count: u32, ring_layout: RingLayout) -> Self {
        TargetParams {
            rings: ring_count > 0,
            ring_count,
            ring_layout,
            ..self
        }
    }

    pub fn with_crosshair(self, crosshair: bool) -> Self {
        TargetParams { crosshair, ..self }
    }

    pub fn with_sectors(self, sector_count: u32) -> Self {
        TargetParams {
            sector_count,
            ..self
        }
    }

    pub fn with_rotation(self, degrees_per_second: f32) -> Self {
        TargetParams {
            rotation_speed: Some(degrees_per_second),
            ..self
        }
    }

    pub fn with_pulse(self, pulse: PulseEffect) -> Self {
        TargetParams {
            pulse: Some(pulse),
            ..self
        }
    }

    pub fn inner_radius(&self) -> f32 {
        self.inner_radius
    }

    pub fn outer_radius(&self) -> f32 {
        self.outer_radius
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn ring_count(&self) -> u32 {
        self.ring_count
    }

    pub fn ring_layout(&self) -> RingLayout {
        self.ring_layout
    }

    pub fn sector_count(&self) -> u32 {
        self.sector_count
    }

    pub fn rotation_speed(&self) -> Option<f32> {
        self.rotation_speed
    }

    pub fn pulse(&self) -> Option<PulseEffect> {
        self.pulse
    }

    pub fn crosshair_size(&self) -> f32 {
        self.inner_radius * CROSSHAIR_SCALE
    }

    /// Sets the inner radius, pushing the outer radius out if the two would cross.
    pub fn set_inner_radius(&mut self, radius: f32) {
        self.inner_radius = radius.max(MIN_TARGET_RADIUS);
        if self.outer_radius < self.inner_radius + RADIUS_EPSILON {
            debug!(
                "Outer radius {} bumped to {}",
                self.outer_radius,
                self.inner_radius + RADIUS_EPSILON
            );
            self.outer_radius = self.inner_radius + RADIUS_EPSILON;
        }
    }

    /// Sets the outer radius, never closer than [`RADIUS_EPSILON`] to the inner radius.
    pub fn set_outer_radius(&mut self, radius: f32) {
        self.outer_radius = radius.max(self.inner_radius + RADIUS_EPSILON);
    }

    pub fn set_rings_visible(&mut self, visible: bool) {
        self.rings = visible;
    }

    pub fn set_crosshair_visible(&mut self, visible: bool) {
        self.crosshair = visible;
    }

    /// Radii of the decorative rings, innermost last for [`RingLayout::Spaced`].
    pub fn ring_radii(&self) -> Vec<f32> {
        if !self.rings {
            return Vec::new();
        }
        (0..self.ring_count)
            .map(|k| match self.ring_layout {
                RingLayout::Even => {
                    let t = (k + 1) as f32 / (self.ring_count + 1) as f32;
                    self.inner_radius + (self.outer_radius - self.inner_radius) * t
                }
                RingLayout::Spaced(spacing) => self.outer_radius - (k + 1) as f32 * spacing,
            })
            .filter(|radius| *radius > 0.0)
            .collect()
    }

    fn sanitized(self) -> Self {
        let mut params = TargetParams {
            resolution: self.resolution.max(MIN_RESOLUTION),
            ..self
        };
        params.set_inner_radius(self.inner_radius);
        params.set_outer_radius(self.outer_radius);
        params
    }
}

/// Closed circle of `resolution` segments; the last point repeats the first.
pub fn ring(radius: f32, resolution: u32) -> Vec<Vec3> {
    let resolution = resolution.max(MIN_RESOLUTION);
    let step = TAU / resolution as f32;
    let mut points: Vec<Vec3> = (0..resolution)
        .map(|i| ground_point(step * i as f32, radius))
        .collect();
    points.push(points[0]);
    points
}

/// Flat ring between `inner_radius` and `outer_radius`, two triangles per segment.
///
/// Vertices `0..=resolution` are the inner circle and the rest the outer one; the seam vertex is
/// duplicated so UVs stay continuous.
pub fn annulus(inner_radius: f32, outer_radius: f32, resolution: u32) -> IndicatorMesh {
    let resolution = resolution.max(MIN_RESOLUTION);
    let inner_radius = inner_radius.max(0.0);
    let outer_radius = outer_radius.max(inner_radius + RADIUS_EPSILON);
    let step = TAU / resolution as f32;
    let mut mesh =
        IndicatorMesh::with_capacity(2 * (resolution as usize + 1), 2 * resolution as usize);

    for radius in [inner_radius, outer_radius] {
        for i in 0..=resolution {
            let angle = step * (i % resolution) as f32;
            mesh.push_vertex(ground_point(angle, radius), outer_radius);
        }
    }

    let outer = resolution + 1;
    for i in 0..resolution {
        mesh.push_triangle([i, outer + i, i + 1]);
        mesh.push_triangle([i + 1, outer + i, outer + i + 1]);
    }
    mesh
}

/// A horizontal and a vertical segment crossing at the origin, each `2 * size` long.
pub fn crosshair(size: f32) -> [LineSegment; 2] {
    [
        LineSegment::new(Vec3::NEG_X * size, Vec3::X * size),
        LineSegment::new(Vec3::NEG_Z * size, Vec3::Z * size),
    ]
}

/// `count` spokes from the center to `radius`, evenly dividing the circle.
pub fn sectors(count: u32, radius: f32) -> Vec<LineSegment> {
    let step = TAU / count.max(1) as f32;
    (0..count)
        .map(|k| LineSegment::new(Vec3::ZERO, ground_point(step * k as f32, radius)))
        .collect()
}

/// Local-space geometry of a target indicator, centered on the origin of the XZ plane.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetGeometry {
    mesh: IndicatorMesh,
    rings: Vec<Vec<Vec3>>,
    crosshair: Option<[LineSegment; 2]>,
    sectors: Vec<LineSegment>,
}

impl TargetGeometry {
    pub fn build(params: &TargetParams) -> Self {
        TargetGeometry {
            mesh: annulus(params.inner_radius, params.outer_radius, params.resolution),
            rings: params
                .ring_radii()
                .into_iter()
                .map(|radius| ring(radius, params.resolution))
                .collect(),
            crosshair: params
                .crosshair
                .then(|| crosshair(params.crosshair_size())),
            sectors: sectors(params.sector_count, params.outer_radius),
        }
    }

    pub fn mesh(&self) -> &IndicatorMesh {
        &self.mesh
    }

    pub fn rings(&self) -> &[Vec<Vec3>] {
        &self.rings
    }

    pub fn crosshair(&self) -> Option<&[LineSegment; 2]> {
        self.crosshair.as_ref()
    }

    pub fn sectors(&self) -> &[LineSegment] {
        &self.sectors
    }
}

/// Circular area-of-effect indicator placed at the aim point.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct TargetIndicator {
    state: IndicatorState,
    params: TargetParams,
    placement: Transform,
    spin_degrees: f32,
    #[reflect(ignore)]
    geometry: TargetGeometry,
}

impl Default for TargetIndicator {
    fn default() -> Self {
        TargetIndicator::new(TargetParams::default())
    }
}

impl TargetIndicator {
    pub fn new(params: TargetParams) -> Self {
        let mut target = TargetIndicator {
            state: IndicatorState::default(),
            params,
            placement: Transform::IDENTITY,
            spin_degrees: 0.0,
            geometry: TargetGeometry::default(),
        };
        target.configure(params);
        target
    }

    pub fn with_range(mut self, range: f32) -> Self {
        self.state.set_range(range);
        self
    }

    pub fn with_color(mut self, color: impl Into<Color>) -> Self {
        self.state.set_color(color);
        self
    }

    pub fn params(&self) -> &TargetParams {
        &self.params
    }

    pub fn geometry(&self) -> &TargetGeometry {
        &self.geometry
    }

    /// Center, spin and pulse scale to apply to the local geometry.
    pub fn placement(&self) -> Transform {
        self.placement
    }

    pub fn set_inner_radius(&mut self, radius: f32) {
        let mut params = self.params;
        params.set_inner_radius(radius);
        self.configure(params);
    }

    pub fn set_outer_radius(&mut self, radius: f32) {
        let mut params = self.params;
        params.set_outer_radius(radius);
        self.configure(params);
    }

    pub fn fill_color(&self) -> Color {
        let config = self.state.config();
        let color = mix_colors(config.fill_color(), config.color(), config.fill_amount());
        color.with_alpha(config.fill_color().alpha() * config.fill_amount())
    }

    pub fn ring_color(&self) -> Color {
        let config = self.state.config();
        mix_colors(config.color(), config.fill_color(), 0.3)
    }

    pub fn crosshair_color(&self) -> Color {
        self.state.config().display_color(self.state.elapsed())
    }

    /// Aim point when within range, otherwise the point at range along the aim direction.
    fn center(&self, anchor: &IndicatorAnchor) -> Vec3 {
        let range = self.state.config().range();
        let target = self.state.target();
        match target.point() {
            Some(point) if point.distance(anchor.origin) <= range => point,
            _ => anchor.origin + *target.direction_from(anchor) * range,
        }
    }
}

impl IndicatorShape for TargetIndicator {
    type Params = TargetParams;

    fn state(&self) -> &IndicatorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut IndicatorState {
        &mut self.state
    }

    fn configure(&mut self, params: TargetParams) {
        if !self.state.mark_configured() {
            return;
        }
        self.params = params.sanitized();
        self.geometry = TargetGeometry::build(&self.params);
    }

    fn recompute(&mut self, anchor: &IndicatorAnchor) {
        let scale = match self.params.pulse {
            Some(pulse) => 1.0 + (self.state.elapsed() * pulse.speed).sin() * pulse.amplitude,
            None => 1.0,
        };
        self.placement = Transform::from_translation(self.center(anchor))
            .with_rotation(Quat::from_rotation_y(self.spin_degrees.to_radians()))
            .with_scale(Vec3::splat(scale));
    }

    fn release(&mut self) {
        self.geometry = TargetGeometry::default();
    }

    fn update(&mut self, anchor: &IndicatorAnchor, delta_seconds: f32) {
        if !self.state.advance(delta_seconds) {
            return;
        }
        if let Some(speed) = self.params.rotation_speed {
            self.spin_degrees = (self.spin_degrees + speed * delta_seconds) % 360.0;
        }
        self.recompute(anchor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outer_radius_never_below_inner() {
        let mut params = TargetParams::new(2.0, 5.0);
        params.set_outer_radius(1.0);
        assert_eq!(params.outer_radius(), params.inner_radius() + RADIUS_EPSILON);

        params.set_inner_radius(10.0);
        assert_eq!(params.outer_radius(), 10.0 + RADIUS_EPSILON);

        let params = TargetParams::new(4.0, 0.0);
        assert_eq!(params.outer_radius(), 4.0 + RADIUS_EPSILON);
    }

    #[test]
    fn ring_is_closed() {
        let points = ring(2.0, 12);
        assert_eq!(points.len(), 13);
        assert_eq!(points.first(), points.last());
        assert!(points.iter().all(|p| (p.length() - 2.0).abs() < 1e-5));
    }

    #[test]
    fn annulus_layout() {
        let resolution = 16;
        let mesh = annulus(1.0, 3.0, resolution);
        assert_eq!(mesh.vertex_count(), 2 * (resolution as usize + 1));
        assert_eq!(mesh.triangle_count(), 2 * resolution as usize);
        let vertex_count = mesh.vertex_count() as u32;
        assert!(mesh.indices().iter().all(|i| *i < vertex_count));
        assert!(mesh.triangles().all(|tri| tri.normal().y > 0.0));
        assert!((mesh.positions()[0].length() - 1.0).abs() < 1e-6);
        assert!((mesh.positions()[resolution as usize + 1].length() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn generation_is_idempotent() {
        assert_eq!(annulus(0.5, 2.0, 24), annulus(0.5, 2.0, 24));
        assert_eq!(ring(1.7, 33), ring(1.7, 33));
        assert_eq!(sectors(5, 2.5), sectors(5, 2.5));
    }

    #[test]
    fn crosshair_spans_both_axes() {
        let [horizontal, vertical] = crosshair(0.8);
        assert!((horizontal.length() - 1.6).abs() < 1e-6);
        assert!((vertical.length() - 1.6).abs() < 1e-6);
        assert_eq!(horizontal.start.dot(vertical.end), 0.0);
    }

    #[test]
    fn sectors_divide_circle() {
        let spokes = sectors(4, 2.0);
        assert_eq!(spokes.len(), 4);
        assert!(spokes.iter().all(|s| s.start == Vec3::ZERO));
        assert!(spokes[1].end.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), 1e-5));
        assert!(sectors(0, 2.0).is_empty());
    }

    #[test]
    fn even_rings_sit_between_radii() {
        let params = TargetParams::new(1.0, 5.0).with_rings(3, RingLayout::Even);
        assert_eq!(params.ring_radii(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn spaced_rings_skip_non_positive_radii() {
        let params = TargetParams::new(0.5, 3.0).with_rings(5, RingLayout::Spaced(1.0));
        assert_eq!(params.ring_radii(), vec![2.0, 1.0]);
    }

    #[test]
    fn hidden_rings_and_crosshair() {
        let mut params = TargetParams::default().with_crosshair(false);
        params.set_rings_visible(false);
        let geometry = TargetGeometry::build(&params);
        assert!(geometry.rings().is_empty());
        assert!(geometry.crosshair().is_none());
    }

    #[test]
    fn placed_at_point_within_range() {
        let mut target = TargetIndicator::default().with_range(10.0);
        target.state_mut().set_point(Vec3::new(3.0, 0.0, 4.0));
        target.update(&IndicatorAnchor::default(), 0.016);
        assert_eq!(target.placement().translation, Vec3::new(3.0, 0.0, 4.0));

        target.state_mut().set_point(Vec3::new(30.0, 0.0, 40.0));
        target.update(&IndicatorAnchor::default(), 0.016);
        assert!(target
            .placement()
            .translation
            .abs_diff_eq(Vec3::new(6.0, 0.0, 8.0), 1e-5));
    }

    #[test]
    fn placed_along_direction() {
        let mut target = TargetIndicator::default().with_range(5.0);
        target.update(&IndicatorAnchor::at(Vec3::Y), 0.016);
        assert!(target
            .placement()
            .translation
            .abs_diff_eq(Vec3::new(0.0, 1.0, -5.0), 1e-6));
    }

    #[test]
    fn spins_while_active() {
        let mut target = TargetIndicator::new(TargetParams::default().with_rotation(90.0));
        target.update(&IndicatorAnchor::default(), 1.0);
        let forward = target.placement().rotation * Vec3::NEG_Z;
        assert!(forward.abs_diff_eq(Vec3::NEG_X, 1e-5));

        target.state_mut().set_visible(false);
        target.update(&IndicatorAnchor::default(), 1.0);
        assert!((target.placement().rotation * Vec3::NEG_Z).abs_diff_eq(Vec3::NEG_X, 1e-5));
    }

    #[test]
    fn pulse_scales_placement() {
        let pulse = PulseEffect {
            speed: 1.0,
            amplitude: 0.5,
        };
        let mut target = TargetIndicator::new(TargetParams::default().with_pulse(pulse));
        target.update(&IndicatorAnchor::default(), std::f32::consts::FRAC_PI_2);
        assert!((target.placement().scale.x - 1.5).abs() < 1e-5);
    }

    #[test]
    fn setters_rebuild_geometry() {
        let mut target = TargetIndicator::default();
        target.set_inner_radius(4.0);
        assert_eq!(target.params().outer_radius(), 4.0 + RADIUS_EPSILON);
        let outer = target.geometry().mesh().positions()[target.params().resolution() as usize + 1];
        assert!((outer.length() - (4.0 + RADIUS_EPSILON)).abs() < 1e-5);
    }
}
