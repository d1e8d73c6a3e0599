//! # Odometry Wheel and Follower Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Instant;

use odo_lib::{
    follower::{AdvanceRule, Follower, Params},
    loc::Pose,
    odo::{OdometryWheel, TickCounter},
    path::{Path, PathPoint},
};

fn odo_wheel_benchmark(c: &mut Criterion) {
    // ---- Wheel geometry ----

    let counter = TickCounter::new();
    let mut wheel = OdometryWheel::new(counter.clone(), 1024, 3.0, Pose::new(-6.0, 2.0, 0.3)).unwrap();

    c.bench_function("OdometryWheel::update_delta", |b| {
        b.iter(|| {
            counter.add(17);
            wheel.update_delta()
        })
    });

    c.bench_function("OdometryWheel::odo_delta_to_bot_angle", |b| {
        b.iter(|| wheel.odo_delta_to_bot_angle(black_box(4.2), black_box(0.5), black_box(-1.0)))
    });

    c.bench_function("OdometryWheel::robot_angle_to_odo_delta", |b| {
        b.iter(|| wheel.robot_angle_to_odo_delta(black_box(0.1), black_box(0.5), black_box(-1.0)))
    });

    // ---- Follower scan over a dense path ----

    // Circle of radius 100 sampled every degree
    let points = (0..360)
        .map(|i| {
            let t = (i as f64).to_radians();
            PathPoint::new(100.0 * t.cos(), 100.0 * t.sin(), t + std::f64::consts::FRAC_PI_2, 0.5)
        })
        .collect();
    let path = Path::new(points).unwrap();

    c.bench_function("Follower::proc", |b| {
        b.iter(|| {
            let mut follower = Follower::new(Params {
                advance_rule: AdvanceRule::PastReached,
                ..Params::default()
            });
            follower.begin_path(path.clone()).unwrap();
            follower
                .proc(black_box(&Pose::new(95.0, 20.0, 1.7)), Instant::now())
                .unwrap()
        })
    });
}

criterion_group!(benches, odo_wheel_benchmark);
criterion_main!(benches);
