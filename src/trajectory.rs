use std::f32::consts::FRAC_PI_2;

use bevy_color::{Alpha, Color};
use bevy_ecs::prelude::*;
use bevy_math::Vec3;
use bevy_reflect::Reflect;
use bevy_transform::components::Transform;
use bevy_utils::tracing::{debug, trace};

use crate::{
    line::MIN_LINE_WIDTH,
    mesh::{disc, IndicatorMesh},
    primitives::*,
};

pub const MIN_LAUNCH_SPEED: f32 = 0.1;
pub const MIN_GRAVITY: f32 = 0.1;
pub const MIN_FLIGHT_TIME: f32 = 0.1;
pub const MIN_TRAJECTORY_RESOLUTION: u32 = 2;
pub const MIN_DRAG_MASS: f32 = 0.01;
/// Length of the launch velocity preview segment.
pub const VELOCITY_PREVIEW_LENGTH: f32 = 2.0;
/// Horizontal distance under which a shot is treated as straight up or down.
const VERTICAL_EPSILON: f32 = 1e-4;
const LANDING_MARKER_SEGMENTS: u32 = 24;

/// Approximate wind and air resistance applied on top of the ballistic path.
///
/// The offset is `0.5 * (wind / mass) * t² * exp(-air_resistance * t)`. This is a cheap visual
/// approximation and does not integrate a drag equation.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct DragParams {
    pub air_resistance: f32,
    pub wind: Vec3,
    pub mass: f32,
}

impl Default for DragParams {
    fn default() -> Self {
        DragParams {
            air_resistance: 0.1,
            wind: Vec3::ZERO,
            mass: 1.0,
        }
    }
}

impl DragParams {
    pub fn offset(&self, time: f32) -> Vec3 {
        let acceleration = self.wind / self.mass.max(MIN_DRAG_MASS);
        let decay = (-self.air_resistance.max(0.0) * time).exp();
        0.5 * acceleration * time * time * decay
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct TrajectoryParams {
    launch_speed: f32,
    gravity: f32,
    max_flight_time: f32,
    resolution: u32,
    drag: Option<DragParams>,
    landing_marker_size: f32,
    width: f32,
    show_trajectory: bool,
    show_landing: bool,
    show_apex: bool,
    show_velocity: bool,
}

impl Default for TrajectoryParams {
    fn default() -> Self {
        TrajectoryParams {
            launch_speed: 10.0,
            gravity: 9.81,
            max_flight_time: 5.0,
            resolution: 50,
            drag: None,
            landing_marker_size: 0.5,
            width: 0.1,
            show_trajectory: true,
            show_landing: true,
            show_apex: false,
            show_velocity: false,
        }
    }
}

impl TrajectoryParams {
    pub fn new(launch_speed: f32, gravity: f32) -> Self {
        TrajectoryParams {
            launch_speed: launch_speed.max(MIN_LAUNCH_SPEED),
            gravity: gravity.max(MIN_GRAVITY),
            ..Default::default()
        }
    }

    pub fn with_max_flight_time(self, max_flight_time: f32) -> Self {
        TrajectoryParams {
            max_flight_time: max_flight_time.max(MIN_FLIGHT_TIME),
            ..self
        }
    }

    pub fn with_resolution(self, resolution: u32) -> Self {
        TrajectoryParams {
            resolution: resolution.max(MIN_TRAJECTORY_RESOLUTION),
            ..self
        }
    }

    pub fn with_drag(self, drag: DragParams) -> Self {
        TrajectoryParams {
            drag: Some(drag),
            ..self
        }
    }

    pub fn with_landing_marker(self, size: f32) -> Self {
        TrajectoryParams {
            landing_marker_size: size.max(MIN_RANGE),
            show_landing: true,
            ..self
        }
    }

    pub fn with_width(self, width: f32) -> Self {
        TrajectoryParams {
            width: width.max(MIN_LINE_WIDTH),
            ..self
        }
    }

    pub fn with_trajectory_visible(self, show_trajectory: bool) -> Self {
        TrajectoryParams {
            show_trajectory,
            ..self
        }
    }

    pub fn with_markers(self, landing: bool, apex: bool, velocity: bool) -> Self {
        TrajectoryParams {
            show_landing: landing,
            show_apex: apex,
            show_velocity: velocity,
            ..self
        }
    }

    pub fn launch_speed(&self) -> f32 {
        self.launch_speed
    }

    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    pub fn max_flight_time(&self) -> f32 {
        self.max_flight_time
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn drag(&self) -> Option<DragParams> {
        self.drag
    }

    pub fn landing_marker_size(&self) -> f32 {
        self.landing_marker_size
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn show_trajectory(&self) -> bool {
        self.show_trajectory
    }

    pub fn show_landing(&self) -> bool {
        self.show_landing
    }

    pub fn show_apex(&self) -> bool {
        self.show_apex
    }

    pub fn show_velocity(&self) -> bool {
        self.show_velocity
    }

    /// Furthest reachable horizontal distance on flat ground.
    pub fn max_range(&self) -> f32 {
        self.launch_speed * self.launch_speed / self.gravity
    }

    fn sanitized(self) -> Self {
        TrajectoryParams {
            launch_speed: self.launch_speed.max(MIN_LAUNCH_SPEED),
            gravity: self.gravity.max(MIN_GRAVITY),
            max_flight_time: self.max_flight_time.max(MIN_FLIGHT_TIME),
            resolution: self.resolution.max(MIN_TRAJECTORY_RESOLUTION),
            landing_marker_size: self.landing_marker_size.max(MIN_RANGE),
            width: self.width.max(MIN_LINE_WIDTH),
            ..self
        }
    }
}

/// Launch velocity that hits a target, or a straight-line fallback when it can't be reached.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LaunchSolution {
    pub velocity: Vec3,
    /// Elevation above the horizontal plane, in radians.
    pub angle: f32,
    /// Time to reach the target, uncapped.
    pub flight_time: f32,
    pub feasible: bool,
}

impl LaunchSolution {
    fn unreachable(displacement: Vec3, speed: f32) -> Self {
        let horizontal = Vec3::new(displacement.x, 0.0, displacement.z).length();
        LaunchSolution {
            velocity: displacement.normalize_or_zero() * speed,
            angle: displacement.y.atan2(horizontal),
            flight_time: displacement.length() / speed,
            feasible: false,
        }
    }
}

/// Solves the low launch angle that carries a projectile from `origin` to `target`.
///
/// The discriminant of the range equation with a height difference decides feasibility:
///
/// `v⁴ - g (g d² + 2 h v²)`
///
/// where `d` is the horizontal distance and `h` the height of the target above the origin. A
/// target straight above or below the origin is solved as a vertical shot.
pub fn solve_launch_velocity(origin: Vec3, target: Vec3, speed: f32, gravity: f32) -> LaunchSolution {
    let speed = speed.max(MIN_LAUNCH_SPEED);
    let gravity = gravity.max(MIN_GRAVITY);
    let displacement = target - origin;
    let height = displacement.y;
    let flat = Vec3::new(displacement.x, 0.0, displacement.z);
    let distance = flat.length();

    if distance < VERTICAL_EPSILON {
        return solve_vertical(height, speed, gravity)
            .unwrap_or_else(|| LaunchSolution::unreachable(displacement, speed));
    }

    let speed_sq = speed * speed;
    let discriminant =
        speed_sq * speed_sq - gravity * (gravity * distance * distance + 2.0 * height * speed_sq);
    if discriminant < 0.0 {
        trace!("Target {target} unreachable at speed {speed}");
        return LaunchSolution::unreachable(displacement, speed);
    }

    let angle = ((speed_sq - discriminant.sqrt()) / (gravity * distance)).atan();
    let horizontal = flat / distance;
    let (sin, cos) = angle.sin_cos();
    LaunchSolution {
        velocity: horizontal * speed * cos + Vec3::Y * speed * sin,
        angle,
        flight_time: distance / (speed * cos),
        feasible: true,
    }
}

/// First arrival at `height` when firing straight up or down.
fn solve_vertical(height: f32, speed: f32, gravity: f32) -> Option<LaunchSolution> {
    let (velocity, angle, flight_time) = if height.abs() < VERTICAL_EPSILON {
        (Vec3::Y * speed, FRAC_PI_2, 0.0)
    } else if height > 0.0 {
        let discriminant = speed * speed - 2.0 * gravity * height;
        if discriminant < 0.0 {
            return None;
        }
        (
            Vec3::Y * speed,
            FRAC_PI_2,
            (speed - discriminant.sqrt()) / gravity,
        )
    } else {
        let discriminant = speed * speed - 2.0 * gravity * height;
        (
            Vec3::NEG_Y * speed,
            -FRAC_PI_2,
            (discriminant.sqrt() - speed) / gravity,
        )
    };
    Some(LaunchSolution {
        velocity,
        angle,
        flight_time,
        feasible: true,
    })
}

/// A projectile path in closed form, so samples don't depend on frame rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallisticPath {
    pub origin: Vec3,
    pub velocity: Vec3,
    pub gravity: f32,
    pub drag: Option<DragParams>,
}

impl BallisticPath {
    pub fn new(origin: Vec3, velocity: Vec3, gravity: f32) -> Self {
        BallisticPath {
            origin,
            velocity,
            gravity: gravity.max(MIN_GRAVITY),
            drag: None,
        }
    }

    pub fn with_drag(self, drag: Option<DragParams>) -> Self {
        BallisticPath { drag, ..self }
    }

    /// Position after `time` seconds. `position(0.0)` is exactly the origin.
    pub fn position(&self, time: f32) -> Vec3 {
        let fall = 0.5 * Vec3::NEG_Y * self.gravity * time * time;
        let drift = self.drag.map_or(Vec3::ZERO, |drag| drag.offset(time));
        self.origin + self.velocity * time + fall + drift
    }

    /// Time at which the vertical velocity reaches zero.
    pub fn apex_time(&self) -> f32 {
        self.velocity.y / self.gravity
    }

    /// Highest point within `[0, flight_time]`, or the origin if the path only descends in that
    /// window.
    pub fn apex(&self, flight_time: f32) -> Vec3 {
        let time = self.apex_time();
        match (0.0..=flight_time).contains(&time) {
            true => self.position(time),
            false => self.origin,
        }
    }

    /// `resolution` positions evenly spaced over `[0, flight_time * fill]`.
    pub fn trace(&self, flight_time: f32, resolution: u32, fill: f32) -> Vec<Vec3> {
        let resolution = resolution.max(MIN_TRAJECTORY_RESOLUTION);
        let duration = flight_time * fill.clamp(0.0, 1.0);
        let step = duration / (resolution - 1) as f32;
        (0..resolution)
            .map(|i| self.position(step * i as f32))
            .collect()
    }

    pub fn sample(&self, flight_time: f32, resolution: u32, fill: f32) -> TrajectoryResult {
        TrajectoryResult {
            points: self.trace(flight_time, resolution, fill),
            landing_point: self.position(flight_time),
            apex_point: self.apex(flight_time),
            flight_time,
            launch_velocity: self.velocity,
            feasible: true,
        }
    }
}

/// Sampled projectile path, recomputed every update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrajectoryResult {
    points: Vec<Vec3>,
    landing_point: Vec3,
    apex_point: Vec3,
    flight_time: f32,
    launch_velocity: Vec3,
    feasible: bool,
}

impl TrajectoryResult {
    /// Straight path from `origin` to `target`, truncated by `fill`.
    pub fn straight_line(
        origin: Vec3,
        target: Vec3,
        solution: &LaunchSolution,
        resolution: u32,
        fill: f32,
    ) -> Self {
        let resolution = resolution.max(MIN_TRAJECTORY_RESOLUTION);
        let end = fill.clamp(0.0, 1.0);
        let points = (0..resolution)
            .map(|i| origin.lerp(target, end * i as f32 / (resolution - 1) as f32))
            .collect();
        TrajectoryResult {
            points,
            landing_point: target,
            apex_point: origin.lerp(target, 0.5),
            flight_time: solution.flight_time,
            launch_velocity: solution.velocity,
            feasible: false,
        }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn landing_point(&self) -> Vec3 {
        self.landing_point
    }

    pub fn apex_point(&self) -> Vec3 {
        self.apex_point
    }

    pub fn flight_time(&self) -> f32 {
        self.flight_time
    }

    pub fn launch_velocity(&self) -> Vec3 {
        self.launch_velocity
    }

    pub fn is_feasible(&self) -> bool {
        self.feasible
    }
}

/// Solves and samples the path from `origin` to `target`, capping the flight time.
pub fn plan_trajectory(
    origin: Vec3,
    target: Vec3,
    params: &TrajectoryParams,
    fill: f32,
) -> TrajectoryResult {
    let solution = solve_launch_velocity(origin, target, params.launch_speed, params.gravity);
    if !solution.feasible {
        debug!(
            "Falling back to a straight line, {} is out of reach",
            target
        );
        return TrajectoryResult::straight_line(
            origin,
            target,
            &solution,
            params.resolution,
            fill,
        );
    }
    let flight_time = solution.flight_time.min(params.max_flight_time);
    BallisticPath::new(origin, solution.velocity, params.gravity)
        .with_drag(params.drag)
        .sample(flight_time, params.resolution, fill)
}

/// Ballistic arc from the anchor to the aim point, with optional landing, apex and velocity
/// markers.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct TrajectoryIndicator {
    state: IndicatorState,
    params: TrajectoryParams,
    #[reflect(ignore)]
    result: TrajectoryResult,
    #[reflect(ignore)]
    landing_marker: IndicatorMesh,
}

impl Default for TrajectoryIndicator {
    fn default() -> Self {
        TrajectoryIndicator::new(TrajectoryParams::default())
    }
}

impl TrajectoryIndicator {
    pub fn new(params: TrajectoryParams) -> Self {
        let mut trajectory = TrajectoryIndicator {
            state: IndicatorState::default(),
            params,
            result: TrajectoryResult::default(),
            landing_marker: IndicatorMesh::default(),
        };
        trajectory.configure(params);
        trajectory
    }

    pub fn with_range(mut self, range: f32) -> Self {
        self.state.set_range(range);
        self
    }

    pub fn with_color(mut self, color: impl Into<Color>) -> Self {
        self.state.set_color(color);
        self
    }

    pub fn params(&self) -> &TrajectoryParams {
        &self.params
    }

    pub fn result(&self) -> &TrajectoryResult {
        &self.result
    }

    /// Disc mesh drawn at the landing point, centered on the local origin.
    pub fn landing_marker(&self) -> &IndicatorMesh {
        &self.landing_marker
    }

    pub fn landing_transform(&self) -> Option<Transform> {
        (self.params.show_landing && !self.result.points.is_empty())
            .then(|| Transform::from_translation(self.result.landing_point))
    }

    /// Sampled path to draw, empty while the trajectory line is hidden. Markers stay available.
    pub fn visible_points(&self) -> &[Vec3] {
        match self.params.show_trajectory {
            true => &self.result.points,
            false => &[],
        }
    }

    /// Apex marker position. Unreachable shots report the midpoint of the fallback line.
    pub fn apex(&self) -> Option<Vec3> {
        (self.params.show_apex && !self.result.points.is_empty())
            .then_some(self.result.apex_point)
    }

    pub fn velocity_preview(&self) -> Option<LineSegment> {
        if !self.params.show_velocity {
            return None;
        }
        let start = *self.result.points.first()?;
        let end = start + self.result.launch_velocity.normalize_or_zero() * VELOCITY_PREVIEW_LENGTH;
        Some(LineSegment::new(start, end))
    }

    /// One color per sampled point, fading from the line color to the fill color.
    pub fn point_colors(&self) -> Vec<Color> {
        let config = self.state.config();
        let last = self.result.points.len().saturating_sub(1).max(1) as f32;
        (0..self.result.points.len())
            .map(|i| {
                let t = i as f32 / last;
                mix_colors(config.color(), config.fill_color(), t).with_alpha(1.0 - 0.5 * t)
            })
            .collect()
    }

    pub fn set_launch_speed(&mut self, speed: f32) {
        let params = TrajectoryParams {
            launch_speed: speed,
            ..self.params
        };
        self.configure(params);
    }

    pub fn set_gravity(&mut self, gravity: f32) {
        let params = TrajectoryParams {
            gravity,
            ..self.params
        };
        self.configure(params);
    }

    pub fn set_max_flight_time(&mut self, max_flight_time: f32) {
        let params = TrajectoryParams {
            max_flight_time,
            ..self.params
        };
        self.configure(params);
    }

    pub fn set_width(&mut self, width: f32) {
        let params = TrajectoryParams {
            width,
            ..self.params
        };
        self.configure(params);
    }

    pub fn set_trajectory_visible(&mut self, visible: bool) {
        self.configure(self.params.with_trajectory_visible(visible));
    }

    pub fn set_landing_marker_size(&mut self, size: f32) {
        self.configure(self.params.with_landing_marker(size));
    }

    pub fn set_markers_visible(&mut self, landing: bool, apex: bool, velocity: bool) {
        self.configure(self.params.with_markers(landing, apex, velocity));
    }

    fn aim_point(&self, anchor: &IndicatorAnchor) -> Vec3 {
        let target = self.state.target();
        target.point().unwrap_or_else(|| {
            anchor.origin + *target.direction_from(anchor) * self.state.config().range()
        })
    }
}

impl IndicatorShape for TrajectoryIndicator {
    type Params = TrajectoryParams;

    fn state(&self) -> &IndicatorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut IndicatorState {
        &mut self.state
    }

    fn configure(&mut self, params: TrajectoryParams) {
        if !self.state.mark_configured() {
            return;
        }
        self.params = params.sanitized();
        self.landing_marker = disc(self.params.landing_marker_size, LANDING_MARKER_SEGMENTS);
    }

    fn recompute(&mut self, anchor: &IndicatorAnchor) {
        let target = self.aim_point(anchor);
        let fill = self.state.config().fill_amount();
        self.result = plan_trajectory(anchor.origin, target, &self.params, fill);
    }

    fn release(&mut self) {
        self.result = TrajectoryResult::default();
        self.landing_marker.clear();
    }
}
