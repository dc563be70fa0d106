//! # Aim Indicators
//!
//! Cone, line, target and trajectory indicators that show where an entity is aiming, what area it
//! covers, or which path a projectile will follow.
//!
//! Add [`AimIndicatorPlugin`] and insert one of the indicator components on an entity with a
//! [`GlobalTransform`]. Every frame the plugin recomputes the indicator geometry from the entity's
//! position and facing. Indicators don't render themselves: read the meshes, line segments and
//! colors they expose and draw them however you like, or enable the `debug` feature and add
//! [`debug::AimIndicatorDebugPlugin`] to see them as gizmos.
//!
//! Indicators can also be driven without the plugin by calling [`IndicatorShape::update`] from
//! your own game loop.

pub mod cone;
#[cfg(feature = "debug")]
pub mod debug;
pub mod line;
pub mod mesh;
pub mod primitives;
pub mod target;
pub mod trajectory;

use bevy_app::prelude::*;
use bevy_ecs::prelude::*;
use bevy_time::Time;
use bevy_transform::{components::GlobalTransform, TransformSystem};
use bevy_utils::tracing::*;

use crate::{
    cone::ConeIndicator, line::LineIndicator, primitives::*, target::TargetIndicator,
    trajectory::TrajectoryIndicator,
};

pub mod prelude {
    pub use crate::{
        cone::*, line::*, mesh::*, primitives::*, target::*, trajectory::*, AimIndicatorPlugin,
        AimIndicatorPluginState, AimIndicatorSystem,
    };

    #[cfg(feature = "debug")]
    pub use crate::debug::AimIndicatorDebugPlugin;
}

#[derive(Default)]
pub struct AimIndicatorPlugin;
impl Plugin for AimIndicatorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AimIndicatorPluginState>()
            .configure_sets(
                PostUpdate,
                AimIndicatorSystem::Update.after(TransformSystem::TransformPropagate),
            )
            .add_systems(
                PostUpdate,
                (
                    update_indicators::<ConeIndicator>,
                    update_indicators::<LineIndicator>,
                    update_indicators::<TargetIndicator>,
                    update_indicators::<TrajectoryIndicator>,
                )
                    .in_set(AimIndicatorSystem::Update)
                    .run_if(|state: Res<AimIndicatorPluginState>| state.update_indicators),
            );

        app.register_type::<ConeIndicator>()
            .register_type::<LineIndicator>()
            .register_type::<TargetIndicator>()
            .register_type::<TrajectoryIndicator>();
    }
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum AimIndicatorSystem {
    Update,
    #[cfg(feature = "debug")]
    DebugDraw,
}

/// Global plugin state used to pause indicator updates or toggle debug drawing.
#[derive(Resource, Debug, Clone)]
pub struct AimIndicatorPluginState {
    pub update_indicators: bool,
    #[cfg(feature = "debug")]
    pub debug_draw: bool,
}

impl Default for AimIndicatorPluginState {
    fn default() -> Self {
        AimIndicatorPluginState {
            update_indicators: true,
            #[cfg(feature = "debug")]
            debug_draw: false,
        }
    }
}

#[cfg(feature = "debug")]
impl AimIndicatorPluginState {
    pub fn with_debug_draw(self) -> Self {
        AimIndicatorPluginState {
            debug_draw: true,
            ..self
        }
    }
}

/// Advances every indicator of type `S`, anchored to its entity's [`GlobalTransform`] if it has
/// one.
pub fn update_indicators<S: IndicatorShape + Component>(
    time: Res<Time>,
    mut indicators: Query<(&mut S, Option<&GlobalTransform>)>,
) {
    let span = info_span!("update_indicators", shape = std::any::type_name::<S>());
    let _guard = span.enter();
    let delta_seconds = time.delta_seconds();
    for (mut indicator, transform) in &mut indicators {
        let anchor = transform.map(IndicatorAnchor::from).unwrap_or_default();
        indicator.update(&anchor, delta_seconds);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bevy_math::Vec3;
    use bevy_transform::components::Transform;

    use super::*;

    fn app() -> App {
        let mut app = App::new();
        app.init_resource::<Time>().add_plugins(AimIndicatorPlugin);
        app
    }

    #[test]
    fn updates_indicators_from_transform() {
        let mut app = app();
        let origin = Vec3::new(2.0, 0.0, 3.0);
        let line = app
            .world_mut()
            .spawn((
                LineIndicator::default().with_range(5.0),
                GlobalTransform::from(Transform::from_translation(origin)),
            ))
            .id();
        let cone = app.world_mut().spawn(ConeIndicator::default()).id();

        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_millis(100));
        app.update();

        let line = app.world().get::<LineIndicator>(line).unwrap();
        assert_eq!(line.state().lifecycle(), IndicatorLifecycle::Active);
        assert_eq!(line.geometry().start(), origin);
        assert!(line
            .geometry()
            .end()
            .abs_diff_eq(origin + Vec3::NEG_Z * 5.0, 1e-5));

        let cone = app.world().get::<ConeIndicator>(cone).unwrap();
        assert!(cone.is_visible());
        assert!((cone.state().elapsed() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn paused_state_skips_updates() {
        let mut app = App::new();
        app.init_resource::<Time>()
            .insert_resource(AimIndicatorPluginState {
                update_indicators: false,
                ..Default::default()
            })
            .add_plugins(AimIndicatorPlugin);
        let target = app.world_mut().spawn(TargetIndicator::default()).id();
        app.update();

        let target = app.world().get::<TargetIndicator>(target).unwrap();
        assert_eq!(target.state().lifecycle(), IndicatorLifecycle::Configured);
        assert!(!target.is_visible());
    }

    #[test]
    fn hidden_indicators_stay_inactive() {
        let mut app = app();
        let mut trajectory = TrajectoryIndicator::default();
        trajectory.state_mut().set_visible(false);
        let entity = app.world_mut().spawn(trajectory).id();
        app.update();

        let trajectory = app.world().get::<TrajectoryIndicator>(entity).unwrap();
        assert_eq!(trajectory.state().lifecycle(), IndicatorLifecycle::Inactive);
        assert!(trajectory.result().points().is_empty());
    }
}
