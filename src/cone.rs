use std::f32::consts::FRAC_PI_2;

use bevy_color::{Alpha, Color};
use bevy_ecs::prelude::*;
use bevy_math::{Quat, Vec3};
use bevy_reflect::Reflect;
use bevy_transform::components::Transform;
use bevy_utils::tracing::debug;

use crate::{
    mesh::{fan, IndicatorMesh},
    primitives::*,
};

pub const MIN_CONE_ANGLE: f32 = 1.0;
pub const MAX_CONE_ANGLE: f32 = 180.0;
/// Fewest segments any circular shape is built from.
pub const MIN_RESOLUTION: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ConeParams {
    angle_degrees: f32,
    resolution: u32,
    outline: bool,
}

impl Default for ConeParams {
    fn default() -> Self {
        ConeParams {
            angle_degrees: 45.0,
            resolution: 20,
            outline: true,
        }
    }
}

impl ConeParams {
    pub fn new(angle_degrees: f32, resolution: u32) -> Self {
        let mut params = ConeParams::default();
        params.set_angle(angle_degrees);
        params.set_resolution(resolution);
        params
    }

    pub fn with_outline(self, outline: bool) -> Self {
        ConeParams { outline, ..self }
    }

    /// Opening angle in degrees, within `[MIN_CONE_ANGLE, MAX_CONE_ANGLE]`.
    pub fn angle_degrees(&self) -> f32 {
        self.angle_degrees
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn outline(&self) -> bool {
        self.outline
    }

    pub fn set_angle(&mut self, angle_degrees: f32) {
        self.angle_degrees = clamp_angle(angle_degrees);
    }

    pub fn set_resolution(&mut self, resolution: u32) {
        self.resolution = resolution.max(MIN_RESOLUTION);
    }
}

fn clamp_angle(angle_degrees: f32) -> f32 {
    let clamped = angle_degrees.clamp(MIN_CONE_ANGLE, MAX_CONE_ANGLE);
    if clamped != angle_degrees {
        debug!("Cone angle {angle_degrees} clamped to {clamped}");
    }
    clamped
}

/// Rim of the sector, `resolution + 1` points from the right edge to the left edge of the cone.
fn rim(angle_degrees: f32, length: f32, resolution: u32) -> Vec<Vec3> {
    let angle = angle_degrees.to_radians();
    let step = angle / resolution as f32;
    let start = FRAC_PI_2 - angle * 0.5;
    (0..=resolution)
        .map(|i| ground_point(start + step * i as f32, length))
        .collect()
}

/// Sector mesh and outline of a cone indicator, in the cone's local space.
///
/// The cone opens along `-Z` on the XZ plane.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConeGeometry {
    mesh: IndicatorMesh,
    outline: Vec<Vec3>,
    params: ConeParams,
    length: f32,
}

impl ConeGeometry {
    pub fn build(params: &ConeParams, length: f32) -> Self {
        let (angle, resolution) = (params.angle_degrees, params.resolution);
        ConeGeometry {
            mesh: Self::generate(angle, length, resolution),
            outline: match params.outline {
                true => Self::outline(angle, length, resolution),
                false => Vec::new(),
            },
            params: *params,
            length,
        }
    }

    /// Whether this geometry was built from `params` at `length`.
    pub fn matches(&self, params: &ConeParams, length: f32) -> bool {
        !self.mesh.is_empty() && self.params == *params && self.length == length
    }

    /// Triangle fan with one apex and `resolution + 1` rim vertices, so `resolution + 2` vertices
    /// and `resolution` triangles. Inputs are clamped to valid values.
    pub fn generate(angle_degrees: f32, length: f32, resolution: u32) -> IndicatorMesh {
        let length = length.max(MIN_RANGE);
        let rim = rim(
            clamp_angle(angle_degrees),
            length,
            resolution.max(MIN_RESOLUTION),
        );
        fan(Vec3::ZERO, &rim, length, false)
    }

    /// Closed wedge outline: apex, rim, apex.
    pub fn outline(angle_degrees: f32, length: f32, resolution: u32) -> Vec<Vec3> {
        let rim = rim(
            clamp_angle(angle_degrees),
            length.max(MIN_RANGE),
            resolution.max(MIN_RESOLUTION),
        );
        let mut outline = Vec::with_capacity(rim.len() + 2);
        outline.push(Vec3::ZERO);
        outline.extend(rim);
        outline.push(Vec3::ZERO);
        outline
    }

    pub fn mesh(&self) -> &IndicatorMesh {
        &self.mesh
    }

    pub fn outline_points(&self) -> &[Vec3] {
        &self.outline
    }
}

/// Sector-shaped indicator for wide area targeting.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct ConeIndicator {
    state: IndicatorState,
    params: ConeParams,
    placement: Transform,
    #[reflect(ignore)]
    geometry: ConeGeometry,
}

impl Default for ConeIndicator {
    fn default() -> Self {
        ConeIndicator::new(ConeParams::default())
    }
}

impl ConeIndicator {
    pub fn new(params: ConeParams) -> Self {
        let mut cone = ConeIndicator {
            state: IndicatorState::default(),
            params,
            placement: Transform::IDENTITY,
            geometry: ConeGeometry::default(),
        };
        cone.configure(params);
        cone
    }

    pub fn with_range(mut self, range: f32) -> Self {
        self.set_range(range);
        self
    }

    pub fn with_color(mut self, color: impl Into<Color>) -> Self {
        self.state.set_color(color);
        self
    }

    pub fn params(&self) -> &ConeParams {
        &self.params
    }

    pub fn geometry(&self) -> &ConeGeometry {
        &self.geometry
    }

    /// World placement of the local geometry: the anchor origin, turned toward the aim.
    pub fn placement(&self) -> Transform {
        self.placement
    }

    pub fn set_angle(&mut self, angle_degrees: f32) {
        let mut params = self.params;
        params.set_angle(angle_degrees);
        self.configure(params);
    }

    pub fn set_resolution(&mut self, resolution: u32) {
        let mut params = self.params;
        params.set_resolution(resolution);
        self.configure(params);
    }

    pub fn set_range(&mut self, range: f32) {
        self.state.set_range(range);
        self.rebuild();
    }

    /// Sector fill color: fades from the outline color toward the fill color as fill grows.
    pub fn fill_color(&self) -> Color {
        let config = self.state.config();
        let color = mix_colors(
            config.fill_color(),
            config.color(),
            1.0 - config.fill_amount(),
        );
        color.with_alpha(config.fill_color().alpha() * config.fill_amount())
    }

    pub fn outline_color(&self) -> Color {
        self.state.config().display_color(self.state.elapsed())
    }

    fn rebuild(&mut self) {
        if self.state.is_destroyed() {
            return;
        }
        self.geometry = ConeGeometry::build(&self.params, self.state.config().range());
    }
}

impl IndicatorShape for ConeIndicator {
    type Params = ConeParams;

    fn state(&self) -> &IndicatorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut IndicatorState {
        &mut self.state
    }

    fn configure(&mut self, params: ConeParams) {
        if !self.state.mark_configured() {
            return;
        }
        self.params = ConeParams::new(params.angle_degrees, params.resolution)
            .with_outline(params.outline);
        self.rebuild();
    }

    fn recompute(&mut self, anchor: &IndicatorAnchor) {
        // Range or params may have been edited through the shared state or reflection.
        if !self.geometry.matches(&self.params, self.state.config().range()) {
            self.rebuild();
        }
        let direction = self.state.target().direction_from(anchor);
        // Aiming straight up or down keeps the last heading.
        let flat = Vec3::new(direction.x, 0.0, direction.z);
        let rotation = match flat.length_squared() > f32::EPSILON {
            true => Quat::from_rotation_y((-flat.x).atan2(-flat.z)),
            false => self.placement.rotation,
        };
        self.placement = Transform::from_translation(anchor.origin).with_rotation(rotation);
    }

    fn release(&mut self) {
        self.geometry = ConeGeometry::default();
    }
}
