use criterion::{criterion_group, criterion_main, Criterion};

use daa_core::bands::alt::AltBands;
use daa_core::bands::gs::new_gs_bands;
use daa_core::bands::trk::new_trk_bands;
use daa_core::bands::vs::new_vs_bands;
use daa_core::bands::{Alertor, MultiBands};
use daa_core::error::ErrorLog;
use daa_core::geo::{Position, Projection, TrafficState, Velocity};
use daa_core::planner::{GridPlanner, RrtParameters, RrtPlanner};
use daa_core::geo::{Polygon, Vect3};

fn make_multi() -> MultiBands {
    let trk = new_trk_bands(0.0, 0.3, 5f64.to_radians(), std::f64::consts::PI, std::f64::consts::PI, true, 10.0, 60.0);
    let gs = new_gs_bands(1.0, 5.0, 30.0, 1.0, true, 10.0, 60.0);
    let vs = new_vs_bands(1.0, -10.0, 10.0, 0.5, true, 10.0, 60.0);
    let alt = AltBands::new(0.0, 1000.0, 50.0, 5.0, 1.0, true, 10.0, 60.0);
    MultiBands::new(trk, gs, vs, alt)
}

fn make_traffic(proj: &Projection, n: usize) -> Vec<TrafficState> {
    let own = TrafficState::make_ownship("own", Position::new(0.0, 0.0, 500.0), Velocity::new(0.0, 20.0, 0.0), proj);
    (0..n)
        .map(|i| {
            let lat_offset = 0.002 * (i as f64 + 1.0);
            own.make_intruder(
                format!("tfc{i}"),
                Position::new(lat_offset, 0.0, 500.0),
                Velocity::new(std::f64::consts::PI, 20.0, 0.0),
                proj,
            )
        })
        .collect()
}

fn multi_bands_compute_benchmark(c: &mut Criterion) {
    let proj = Projection::new(Position::new(0.0, 0.0, 0.0));
    let own = TrafficState::make_ownship("own", Position::new(0.0, 0.0, 500.0), Velocity::new(0.0, 20.0, 0.0), &proj);
    let traffic = make_traffic(&proj, 5);
    let alertor = Alertor::default_single_level(500.0, 100.0, 60.0);

    c.bench_function("multi_bands_compute_5_traffic", |b| {
        b.iter(|| {
            let mut multi = make_multi();
            let mut errors = ErrorLog::new();
            multi.compute(&own, &traffic, &alertor, &mut errors);
        })
    });
}

fn grid_planner_benchmark(c: &mut Criterion) {
    let planner = GridPlanner::default();
    let start = Vect3::new(0.0, 0.0, 100.0);
    let goal = Vect3::new(800.0, 600.0, 100.0);
    let keep_out = vec![Polygon::new(
        vec![
            Vect3::new(300.0, 200.0, 0.0),
            Vect3::new(500.0, 200.0, 0.0),
            Vect3::new(500.0, 400.0, 0.0),
            Vect3::new(300.0, 400.0, 0.0),
        ],
        0.0,
        300.0,
    )];

    c.bench_function("grid_planner_route_around_keep_out", |b| {
        b.iter(|| planner.search(start, goal, &keep_out))
    });
}

fn rrt_planner_benchmark(c: &mut Criterion) {
    let planner = RrtPlanner::new(RrtParameters::default());
    let proj = Projection::new(Position::new(0.0, 0.0, 0.0));
    let traffic = make_traffic(&proj, 3);
    let start = Vect3::new(0.0, 0.0, 100.0);
    let velocity = Vect3::new(0.0, 20.0, 0.0);
    let goal = Vect3::new(1000.0, 0.0, 100.0);
    let bounds = (Vect3::new(-2000.0, -2000.0, 0.0), Vect3::new(2000.0, 2000.0, 500.0));

    c.bench_function("rrt_planner_reroute_around_traffic", |b| {
        b.iter(|| planner.search(start, velocity, goal, bounds, &[], &traffic))
    });
}

criterion_group!(benches, multi_bands_compute_benchmark, grid_planner_benchmark, rrt_planner_benchmark);
criterion_main!(benches);
