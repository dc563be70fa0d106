use bevy_math::Vec3;
use bevy_mod_aim_indicator::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn cone_mesh(c: &mut Criterion) {
    let mut group = c.benchmark_group("cone_mesh");
    for resolution in [8, 32, 128] {
        group.bench_with_input(
            BenchmarkId::from_parameter(resolution),
            &resolution,
            |b, resolution| {
                b.iter(|| ConeGeometry::generate(black_box(60.0), 10.0, *resolution));
            },
        );
    }
    group.finish();
}

fn target_annulus(c: &mut Criterion) {
    let mut group = c.benchmark_group("target_annulus");
    for resolution in [16, 64, 256] {
        group.bench_with_input(
            BenchmarkId::from_parameter(resolution),
            &resolution,
            |b, resolution| {
                b.iter(|| annulus(black_box(1.0), 3.0, *resolution));
            },
        );
    }
    group.finish();
}

fn trajectory_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("trajectory_sampling");
    let target = Vec3::new(10.0, 0.0, 0.0);
    for resolution in [10, 50, 500] {
        let params = TrajectoryParams::new(15.0, 9.81).with_resolution(resolution);
        group.bench_with_input(
            BenchmarkId::from_parameter(resolution),
            &params,
            |b, params| {
                b.iter(|| plan_trajectory(Vec3::ZERO, black_box(target), params, 1.0));
            },
        );
    }
    group.finish();
}

fn dashed_line(c: &mut Criterion) {
    c.bench_function("dashed_line", |b| {
        b.iter(|| dashed(Vec3::ZERO, black_box(Vec3::new(0.0, 0.0, -50.0)), 0.5, 0.25));
    });
}

criterion_group!(
    benches,
    cone_mesh,
    target_annulus,
    trajectory_sampling,
    dashed_line
);
criterion_main!(benches);
