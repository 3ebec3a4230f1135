// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Safe-Set Certification Benchmarks
// ─────────────────────────────────────────────────────────────────────
//! Criterion benchmarks for one full update cycle on 2-D grids and for
//! the boundary and line-search primitives.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use safeset_core::{
    line_search_bisection, smallest_boundary_value, BoundedError, ContinuousEngine, DiscreteEngine,
    Discretization, GridWorld, LinearDynamics, LyapunovFunction, QuadraticLyapunov,
};

fn grid(n: usize) -> Arc<dyn Discretization> {
    Arc::new(GridWorld::new(&[(-1.0, 1.0), (-1.0, 1.0)], &[n, n]).expect("grid"))
}

fn seed(grid: &dyn Discretization) -> Vec<bool> {
    grid.all_points()
        .chunks_exact(2)
        .map(|x| x[0].abs() <= 0.2 && x[1].abs() <= 0.2)
        .collect()
}

// ── Discrete-time update ────────────────────────────────────────────

fn bench_discrete_update(c: &mut Criterion, n: usize) {
    let grid = grid(n);
    // Lightly damped rotation
    let dynamics = LinearDynamics::autonomous(vec![0.9, 0.1, -0.1, 0.9], 2).expect("dynamics");
    let dynamics = BoundedError::new(dynamics, vec![1e-3, 1e-3]).expect("error bound");
    let mut engine = DiscreteEngine::discrete(
        grid.clone(),
        Arc::new(QuadraticLyapunov::identity(2)),
        Arc::new(dynamics),
        2.0 / n as f64,
        1.0,
        4.0,
    )
    .expect("engine")
    .with_initial_set(seed(grid.as_ref()))
    .expect("seed");

    c.bench_function(&format!("discrete_update_{n}x{n}"), |b| {
        b.iter(|| engine.update_safe_set(black_box(1e-3), None))
    });
}

fn bench_discrete_update_50(c: &mut Criterion) {
    bench_discrete_update(c, 50);
}

fn bench_discrete_update_200(c: &mut Criterion) {
    bench_discrete_update(c, 200);
}

// ── Continuous-time update ──────────────────────────────────────────

fn bench_continuous_update_100(c: &mut Criterion) {
    let n = 100;
    let grid = grid(n);
    let dynamics = LinearDynamics::autonomous(vec![-1.0, 1.0, -1.0, -1.0], 2).expect("dynamics");
    let mut engine = ContinuousEngine::continuous(
        grid.clone(),
        Arc::new(QuadraticLyapunov::identity(2)),
        Arc::new(dynamics),
        2.0 / n as f64,
        4.0,
    )
    .expect("engine")
    .with_initial_set(seed(grid.as_ref()))
    .expect("seed");

    c.bench_function("continuous_update_100x100", |b| {
        b.iter(|| engine.update_safe_set(black_box(1e-3), None))
    });
}

// ── Primitives ──────────────────────────────────────────────────────

fn bench_smallest_boundary_value(c: &mut Criterion) {
    let grid = GridWorld::new(&[(-1.0, 1.0), (-1.0, 1.0), (-1.0, 1.0)], &[40, 40, 40]).expect("grid");
    let v = QuadraticLyapunov::identity(3);
    c.bench_function("smallest_boundary_value_40^3", |b| {
        b.iter(|| smallest_boundary_value(|x, d| v.values(x, d), black_box(&grid)))
    });
}

fn bench_line_search(c: &mut Criterion) {
    c.bench_function("line_search_bisection_1e-9", |b| {
        b.iter(|| line_search_bisection(|x| x < black_box(0.3), [0.0, 1.0], 1e-9))
    });
}

criterion_group!(
    benches,
    bench_discrete_update_50,
    bench_discrete_update_200,
    bench_continuous_update_100,
    bench_smallest_boundary_value,
    bench_line_search,
);
criterion_main!(benches);
