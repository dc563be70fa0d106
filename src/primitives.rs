use bevy_color::{palettes::css, Alpha, Color, LinearRgba, Mix};
use bevy_math::{Dir3, Vec3};
use bevy_reflect::Reflect;
use bevy_transform::components::GlobalTransform;
use bevy_utils::tracing::{debug, warn};

/// Smallest range any indicator will accept.
pub const MIN_RANGE: f32 = 0.1;

/// Point on the XZ ground plane, `angle` radians counter-clockwise from `+X` when seen from above.
///
/// Polygons built by walking this with an increasing angle face `+Y`.
#[inline]
pub fn ground_point(angle: f32, radius: f32) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    Vec3::new(cos * radius, 0.0, -sin * radius)
}

/// Linear blend between two colors, alpha included.
pub fn mix_colors(from: Color, to: Color, factor: f32) -> Color {
    LinearRgba::from(from)
        .mix(&LinearRgba::from(to), factor)
        .into()
}

/// Settings shared by every indicator shape.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct IndicatorConfig {
    color: Color,
    fill_color: Color,
    range: f32,
    fill_amount: f32,
    fill_enabled: bool,
    active: bool,
    animation_enabled: bool,
    animation_speed: f32,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        IndicatorConfig {
            color: css::RED.into(),
            fill_color: Color::srgba(1.0, 0.0, 0.0, 0.3),
            range: 10.0,
            fill_amount: 1.0,
            fill_enabled: true,
            active: true,
            animation_enabled: false,
            animation_speed: 1.0,
        }
    }
}

impl IndicatorConfig {
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn fill_color(&self) -> Color {
        self.fill_color
    }

    /// Distance covered by the indicator, never below [`MIN_RANGE`].
    pub fn range(&self) -> f32 {
        self.range
    }

    /// Fraction of the shape currently drawn, in `[0, 1]`.
    pub fn fill_amount(&self) -> f32 {
        self.fill_amount
    }

    pub fn fill_enabled(&self) -> bool {
        self.fill_enabled
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn animation_enabled(&self) -> bool {
        self.animation_enabled
    }

    pub fn animation_speed(&self) -> f32 {
        self.animation_speed
    }

    pub fn set_color(&mut self, color: impl Into<Color>) {
        self.color = color.into();
    }

    pub fn set_fill_color(&mut self, color: impl Into<Color>) {
        self.fill_color = color.into();
    }

    pub fn set_range(&mut self, range: f32) {
        if range < MIN_RANGE {
            debug!("Indicator range {range} clamped to {MIN_RANGE}");
        }
        self.range = range.max(MIN_RANGE);
    }

    pub fn set_fill_amount(&mut self, amount: f32) {
        self.fill_amount = amount.clamp(0.0, 1.0);
    }

    pub fn set_fill_enabled(&mut self, enabled: bool) {
        self.fill_enabled = enabled;
    }

    pub fn set_animation(&mut self, enabled: bool, speed: f32) {
        self.animation_enabled = enabled;
        self.animation_speed = speed;
    }

    /// Alpha multiplier of the pulsing animation at `elapsed` seconds, `1.0` when disabled.
    pub fn pulse(&self, elapsed: f32) -> f32 {
        match self.animation_enabled {
            true => (elapsed * self.animation_speed).sin() * 0.1 + 0.9,
            false => 1.0,
        }
    }

    /// The outline color with the pulse animation applied.
    pub fn display_color(&self, elapsed: f32) -> Color {
        self.color
            .with_alpha(self.color.alpha() * self.pulse(elapsed))
    }
}

/// What an indicator is aimed at. Setting one variant replaces the other.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub enum AimTarget {
    /// No aim, the anchor's forward axis is used.
    #[default]
    Forward,
    Direction(Dir3),
    Point(Vec3),
}

impl AimTarget {
    /// A zero-length `direction` means "no aim" and yields [`AimTarget::Forward`].
    pub fn from_direction(direction: Vec3) -> Self {
        Dir3::new(direction)
            .map(AimTarget::Direction)
            .unwrap_or(AimTarget::Forward)
    }

    pub fn point(&self) -> Option<Vec3> {
        match self {
            AimTarget::Point(point) => Some(*point),
            _ => None,
        }
    }

    /// Resolves the aim direction as seen from `anchor`.
    pub fn direction_from(&self, anchor: &IndicatorAnchor) -> Dir3 {
        match self {
            AimTarget::Forward => anchor.forward,
            AimTarget::Direction(direction) => *direction,
            AimTarget::Point(point) => Dir3::new(*point - anchor.origin).unwrap_or(anchor.forward),
        }
    }
}

/// World placement of an indicator, usually taken from the entity's [`GlobalTransform`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorAnchor {
    pub origin: Vec3,
    pub forward: Dir3,
    pub up: Dir3,
}

impl Default for IndicatorAnchor {
    fn default() -> Self {
        IndicatorAnchor {
            origin: Vec3::ZERO,
            forward: Dir3::NEG_Z,
            up: Dir3::Y,
        }
    }
}

impl IndicatorAnchor {
    pub fn at(origin: Vec3) -> Self {
        IndicatorAnchor {
            origin,
            ..Default::default()
        }
    }
}

impl From<&GlobalTransform> for IndicatorAnchor {
    fn from(transform: &GlobalTransform) -> Self {
        IndicatorAnchor {
            origin: transform.translation(),
            forward: transform.forward(),
            up: transform.up(),
        }
    }
}

/// Lifecycle shared by every shape.
///
/// `Uninitialized -> Configured -> Active <-> Inactive -> Destroyed`. `Destroyed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum IndicatorLifecycle {
    #[default]
    Uninitialized,
    Configured,
    Active,
    Inactive,
    Destroyed,
}

/// Configuration, aim and lifecycle of one indicator instance.
#[derive(Debug, Clone, Default, PartialEq, Reflect)]
pub struct IndicatorState {
    config: IndicatorConfig,
    target: AimTarget,
    lifecycle: IndicatorLifecycle,
    elapsed: f32,
}

impl IndicatorState {
    pub fn new(config: IndicatorConfig) -> Self {
        IndicatorState {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    pub fn target(&self) -> AimTarget {
        self.target
    }

    pub fn lifecycle(&self) -> IndicatorLifecycle {
        self.lifecycle
    }

    /// Seconds accumulated while the indicator was active.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_visible(&self) -> bool {
        self.lifecycle == IndicatorLifecycle::Active
    }

    pub fn is_destroyed(&self) -> bool {
        self.lifecycle == IndicatorLifecycle::Destroyed
    }

    /// Mutable access to the configuration, `None` once destroyed.
    pub fn config_mut(&mut self) -> Option<&mut IndicatorConfig> {
        if self.is_destroyed() {
            warn!("Ignoring configuration change on a destroyed indicator");
            return None;
        }
        Some(&mut self.config)
    }

    pub fn set_color(&mut self, color: impl Into<Color>) {
        if let Some(config) = self.config_mut() {
            config.set_color(color);
        }
    }

    pub fn set_fill_color(&mut self, color: impl Into<Color>) {
        if let Some(config) = self.config_mut() {
            config.set_fill_color(color);
        }
    }

    pub fn set_range(&mut self, range: f32) {
        if let Some(config) = self.config_mut() {
            config.set_range(range);
        }
    }

    pub fn set_fill_amount(&mut self, amount: f32) {
        if let Some(config) = self.config_mut() {
            config.set_fill_amount(amount);
        }
    }

    pub fn set_target(&mut self, target: AimTarget) {
        if self.config_mut().is_some() {
            self.target = target;
        }
    }

    pub fn set_direction(&mut self, direction: Vec3) {
        self.set_target(AimTarget::from_direction(direction));
    }

    pub fn set_point(&mut self, point: Vec3) {
        self.set_target(AimTarget::Point(point));
    }

    /// Shows or hides the indicator without discarding its geometry.
    pub fn set_visible(&mut self, visible: bool) {
        let Some(config) = self.config_mut() else {
            return;
        };
        config.active = visible;
        self.lifecycle = match (self.lifecycle, visible) {
            (IndicatorLifecycle::Active | IndicatorLifecycle::Inactive, true) => {
                IndicatorLifecycle::Active
            }
            (IndicatorLifecycle::Active | IndicatorLifecycle::Inactive, false) => {
                IndicatorLifecycle::Inactive
            }
            (lifecycle, _) => lifecycle,
        };
    }

    /// Enters [`IndicatorLifecycle::Configured`] the first time parameters are set. Returns `false`
    /// if the indicator is destroyed and must not be touched.
    pub fn mark_configured(&mut self) -> bool {
        match self.lifecycle {
            IndicatorLifecycle::Destroyed => {
                warn!("Ignoring parameters for a destroyed indicator");
                false
            }
            IndicatorLifecycle::Uninitialized => {
                self.lifecycle = IndicatorLifecycle::Configured;
                true
            }
            _ => true,
        }
    }

    /// Advances the animation clock and settles the lifecycle. Returns `true` when the indicator is
    /// active and its geometry should be recomputed this frame.
    pub fn advance(&mut self, delta_seconds: f32) -> bool {
        match self.lifecycle {
            IndicatorLifecycle::Uninitialized | IndicatorLifecycle::Destroyed => return false,
            IndicatorLifecycle::Configured => {
                self.lifecycle = match self.config.active {
                    true => IndicatorLifecycle::Active,
                    false => IndicatorLifecycle::Inactive,
                };
            }
            _ => (),
        }
        if self.lifecycle != IndicatorLifecycle::Active {
            return false;
        }
        self.elapsed += delta_seconds.max(0.0);
        true
    }

    pub fn destroy(&mut self) {
        self.lifecycle = IndicatorLifecycle::Destroyed;
    }
}

/// Capability shared by the cone, line, target and trajectory indicators.
pub trait IndicatorShape {
    type Params;

    fn state(&self) -> &IndicatorState;

    fn state_mut(&mut self) -> &mut IndicatorState;

    /// Replaces the shape parameters and rebuilds anchor-independent geometry.
    fn configure(&mut self, params: Self::Params);

    /// Rebuilds the geometry for the current state as seen from `anchor`.
    fn recompute(&mut self, anchor: &IndicatorAnchor);

    /// Drops every owned geometry buffer.
    fn release(&mut self);

    fn is_visible(&self) -> bool {
        self.state().is_visible()
    }

    /// Per-frame entry point, driven by the plugin or by an external game loop.
    fn update(&mut self, anchor: &IndicatorAnchor, delta_seconds: f32) {
        if self.state_mut().advance(delta_seconds) {
            self.recompute(anchor);
        }
    }

    fn destroy(&mut self) {
        self.release();
        self.state_mut().destroy();
    }
}

/// A straight piece of an indicator outline.
#[derive(Debug, PartialEq, Copy, Clone, Default, Reflect)]
pub struct LineSegment {
    pub start: Vec3,
    pub end: Vec3,
}

impl LineSegment {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        LineSegment { start, end }
    }

    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    pub fn direction(&self) -> Option<Dir3> {
        Dir3::new(self.end - self.start).ok()
    }
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub struct Triangle {
    pub v0: Vec3,
    pub v1: Vec3,
    pub v2: Vec3,
}

impl Triangle {
    /// Unnormalized face normal, following the winding order.
    pub fn normal(&self) -> Vec3 {
        (self.v1 - self.v0).cross(self.v2 - self.v0)
    }
}

impl From<[Vec3; 3]> for Triangle {
    fn from(vertices: [Vec3; 3]) -> Self {
        Triangle {
            v0: vertices[0],
            v1: vertices[1],
            v2: vertices[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn ground_points_turn_counter_clockwise() {
        assert!(ground_point(0.0, 2.0).abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
        assert!(ground_point(FRAC_PI_2, 1.0).abs_diff_eq(Vec3::NEG_Z, 1e-6));
    }

    #[test]
    fn fill_amount_is_clamped() {
        let mut config = IndicatorConfig::default();
        config.set_fill_amount(1.5);
        assert_eq!(config.fill_amount(), 1.0);
        config.set_fill_amount(-0.5);
        assert_eq!(config.fill_amount(), 0.0);
    }

    #[test]
    fn range_is_floored() {
        let mut config = IndicatorConfig::default();
        config.set_range(-4.0);
        assert_eq!(config.range(), MIN_RANGE);
    }

    #[test]
    fn zero_direction_means_forward() {
        let anchor = IndicatorAnchor::default();
        let target = AimTarget::from_direction(Vec3::ZERO);
        assert_eq!(target, AimTarget::Forward);
        assert_eq!(target.direction_from(&anchor), Dir3::NEG_Z);
    }

    #[test]
    fn point_replaces_direction() {
        let mut state = IndicatorState::default();
        state.set_direction(Vec3::X);
        state.set_point(Vec3::new(0.0, 0.0, 5.0));
        let anchor = IndicatorAnchor::default();
        assert_eq!(state.target().direction_from(&anchor), Dir3::Z);
        assert_eq!(state.target().point(), Some(Vec3::new(0.0, 0.0, 5.0)));
    }

    #[test]
    fn point_on_origin_falls_back_to_forward() {
        let anchor = IndicatorAnchor::at(Vec3::ONE);
        assert_eq!(AimTarget::Point(Vec3::ONE).direction_from(&anchor), Dir3::NEG_Z);
    }

    #[test]
    fn lifecycle_transitions() {
        let mut state = IndicatorState::default();
        assert!(!state.advance(0.1));
        assert_eq!(state.lifecycle(), IndicatorLifecycle::Uninitialized);

        assert!(state.mark_configured());
        assert_eq!(state.lifecycle(), IndicatorLifecycle::Configured);
        assert!(state.advance(0.1));
        assert_eq!(state.lifecycle(), IndicatorLifecycle::Active);

        state.set_visible(false);
        assert_eq!(state.lifecycle(), IndicatorLifecycle::Inactive);
        assert!(!state.advance(0.1));
        state.set_visible(true);
        assert!(state.is_visible());

        state.destroy();
        assert!(!state.mark_configured());
        state.set_visible(true);
        state.set_range(50.0);
        assert_eq!(state.lifecycle(), IndicatorLifecycle::Destroyed);
        assert_eq!(state.config().range(), IndicatorConfig::default().range());
    }

    #[test]
    fn hidden_before_first_update_stays_inactive() {
        let mut state = IndicatorState::default();
        state.mark_configured();
        state.set_visible(false);
        assert!(!state.advance(0.1));
        assert_eq!(state.lifecycle(), IndicatorLifecycle::Inactive);
    }

    #[test]
    fn pulse_is_neutral_without_animation() {
        let mut config = IndicatorConfig::default();
        assert_eq!(config.pulse(3.0), 1.0);
        config.set_animation(true, 2.0);
        let pulse = config.pulse(3.0);
        assert!((0.8..=1.0).contains(&pulse));
    }
}
