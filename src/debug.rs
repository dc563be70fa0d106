//! Gizmo rendering of every indicator, for prototyping and debugging.
//!
//! Requires [`bevy_gizmos`]'s plugin to be present in the app, and
//! [`AimIndicatorPluginState::debug_draw`] to be enabled.

use bevy_app::prelude::*;
use bevy_color::Color;
use bevy_ecs::prelude::*;
use bevy_gizmos::prelude::Gizmos;
use bevy_math::{Dir3, Quat, Vec3};

use crate::{
    cone::ConeIndicator, line::LineIndicator, primitives::*, target::TargetIndicator,
    trajectory::TrajectoryIndicator, AimIndicatorPluginState, AimIndicatorSystem,
};

const MARKER_RADIUS: f32 = 0.1;

#[derive(Default)]
pub struct AimIndicatorDebugPlugin;
impl Plugin for AimIndicatorDebugPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            PostUpdate,
            (draw_cones, draw_lines, draw_targets, draw_trajectories)
                .in_set(AimIndicatorSystem::DebugDraw)
                .after(AimIndicatorSystem::Update)
                .run_if(|state: Option<Res<AimIndicatorPluginState>>| {
                    state.is_some_and(|state| state.debug_draw)
                }),
        );
    }
}

pub fn draw_cones(mut gizmos: Gizmos, cones: Query<&ConeIndicator>) {
    for cone in cones.iter().filter(|cone| cone.is_visible()) {
        let placement = cone.placement();
        gizmos.linestrip(
            cone.geometry()
                .outline_points()
                .iter()
                .map(|point| placement.transform_point(*point)),
            cone.outline_color(),
        );
    }
}

pub fn draw_lines(mut gizmos: Gizmos, lines: Query<&LineIndicator>) {
    for line in lines.iter().filter(|line| line.is_visible()) {
        let color = line.line_color();
        for segment in line.geometry().segments() {
            gizmos.line(segment.start, segment.end, color);
        }
        for head in line.geometry().arrow_heads() {
            gizmos.linestrip(head.points(), color);
        }
    }
}

pub fn draw_targets(mut gizmos: Gizmos, targets: Query<&TargetIndicator>) {
    for target in targets.iter().filter(|target| target.is_visible()) {
        let placement = target.placement();
        let geometry = target.geometry();
        let params = target.params();
        let center = placement.translation;
        let scale = placement.scale.x;

        let fill = target.fill_color();
        gizmos.circle(center, Dir3::Y, params.outer_radius() * scale, fill);
        gizmos.circle(center, Dir3::Y, params.inner_radius() * scale, fill);

        let ring_color = target.ring_color();
        for ring in geometry.rings() {
            gizmos.linestrip(
                ring.iter().map(|point| placement.transform_point(*point)),
                ring_color,
            );
        }

        let crosshair = target.crosshair_color();
        let spokes = geometry.crosshair().into_iter().flatten();
        for segment in spokes.chain(geometry.sectors()) {
            gizmos.line(
                placement.transform_point(segment.start),
                placement.transform_point(segment.end),
                crosshair,
            );
        }
    }
}

pub fn draw_trajectories(mut gizmos: Gizmos, trajectories: Query<&TrajectoryIndicator>) {
    for trajectory in trajectories.iter().filter(|t| t.is_visible()) {
        gizmos.linestrip_gradient(
            trajectory
                .visible_points()
                .iter()
                .copied()
                .zip(trajectory.point_colors()),
        );

        let color = trajectory.state().config().color();
        if let Some(landing) = trajectory.landing_transform() {
            let radius = trajectory.params().landing_marker_size();
            gizmos.circle(landing.translation, Dir3::Y, radius, color);
        }
        if let Some(apex) = trajectory.apex() {
            gizmos.sphere(apex, Quat::IDENTITY, MARKER_RADIUS, color);
        }
        if let Some(preview) = trajectory.velocity_preview() {
            gizmos.arrow(preview.start, preview.end, Color::WHITE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_draw_disabled_by_default() {
        assert!(!AimIndicatorPluginState::default().debug_draw);
        assert!(AimIndicatorPluginState::default().with_debug_draw().debug_draw);
    }

    #[test]
    fn markers_sit_on_trajectory() {
        let mut trajectory = TrajectoryIndicator::default();
        trajectory.update(&IndicatorAnchor::at(Vec3::Y), 0.016);
        let landing = trajectory.landing_transform().unwrap();
        assert!(landing.translation.abs_diff_eq(Vec3::new(0.0, 1.0, -10.0), 0.01));
    }
}
