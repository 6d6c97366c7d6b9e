//! The integer-indexed band search shared by all four kinematic
//! dimensions. A concrete dimension supplies a `TrajectoryGenerator`
//! (instead of the original's protected-inheritance chain) and this module
//! walks discrete steps along the maneuver until a loss of separation or a
//! repulsiveness violation is found, then folds the conflict-free run
//! indices into an `IntervalSet`.

use crate::detector::Detector;
use crate::geo::{TrafficState, Vect3, Velocity};

use super::interval::{Interval, IntervalSet};

/// Turn/accelerate/climb direction for the non-altitude dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    Neg,
    Pos,
}

/// Supplies the two primitives the integer search needs from a concrete
/// kinematic dimension: how the ownship's projected position/velocity
/// evolve under a one-directional maneuver, and how coarse the sampling
/// step should be.
pub trait TrajectoryGenerator {
    /// Position and velocity of the ownship at `t` seconds into the
    /// maneuver, applied in direction `dir`.
    fn trajectory(&self, ownship: &TrafficState, t: f64, dir: Dir) -> (Vect3, Velocity);

    /// Sampling step along the maneuver, in seconds.
    fn time_step(&self, ownship: &TrafficState) -> f64;
}

/// Parameters shared by every integer-core search invocation.
pub struct SearchParams<'a> {
    pub conflict_det: &'a dyn Detector,
    pub recovery_det: Option<&'a dyn Detector>,
    pub b: f64,
    pub t: f64,
    pub b2: f64,
    pub t2: f64,
    pub max_k: usize,
    pub epsh: f64,
    pub epsv: f64,
}

/// Outcome of one directional integer search: the conflict-free runs found
/// before the first loss-of-separation/non-repulsive step, and whether the
/// search was cut short by hitting `max_k` (a candidate "recovery" run).
pub struct SearchResult {
    pub runs: IntervalSet,
    pub bands_search_index: usize,
    pub hit_cap: bool,
}

/// Runs the core search in one direction against the given traffic set.
pub fn search<G: TrajectoryGenerator>(
    gen: &G,
    ownship: &TrafficState,
    traffic: &[TrafficState],
    dir: Dir,
    params: &SearchParams,
) -> SearchResult {
    let dt = gen.time_step(ownship);
    let first_los_step = first_los_step(gen, ownship, traffic, dir, params, dt);
    let first_nonrepulsive = first_nonrepulsive_step(gen, ownship, traffic, dir, params, dt);

    let bands_search_index = first_los_step.min(first_nonrepulsive).min(params.max_k);
    let hit_cap = bands_search_index == params.max_k
        && first_los_step > params.max_k
        && first_nonrepulsive > params.max_k;

    let mut runs = IntervalSet::new();
    let mut run_start: Option<usize> = None;
    for k in 0..=bands_search_index {
        let (pos, vel) = gen.trajectory(ownship, k as f64 * dt, dir);
        let conflict = step_in_conflict(ownship, pos, vel, traffic, params);
        if conflict {
            if let Some(start) = run_start.take() {
                runs.union(Interval::new(start as f64, (k - 1) as f64));
            }
        } else if run_start.is_none() {
            run_start = Some(k);
        }
    }
    if let Some(start) = run_start {
        runs.union(Interval::new(start as f64, bands_search_index as f64));
    }

    SearchResult { runs, bands_search_index, hit_cap }
}

fn step_in_conflict(
    ownship: &TrafficState,
    pos: Vect3,
    vel: Velocity,
    traffic: &[TrafficState],
    params: &SearchParams,
) -> bool {
    for intr in traffic {
        // Relative vector to the (constant-velocity-projected) intruder.
        let s_rel = intr.s - pos;
        let c = params.conflict_det.conflict(s_rel, vel, intr.v, params.b, params.t);
        if c.conflict() {
            return true;
        }
        if let Some(rec) = params.recovery_det {
            let r = rec.conflict(s_rel, vel, intr.v, params.b2, params.t2);
            if r.conflict() {
                return true;
            }
        }
    }
    let _ = ownship;
    false
}

fn first_los_step<G: TrajectoryGenerator>(
    gen: &G,
    ownship: &TrafficState,
    traffic: &[TrafficState],
    dir: Dir,
    params: &SearchParams,
    dt: f64,
) -> usize {
    for k in 0..=params.max_k {
        let (pos, vel) = gen.trajectory(ownship, k as f64 * dt, dir);
        if step_in_conflict(ownship, pos, vel, traffic, params) {
            return k;
        }
    }
    params.max_k + 1
}

/// Repulsive criterion: the transition from step `k-1` to step `k` must
/// not decrease the sign-consistent separation measure against the most
/// urgent reference aircraft. At `k=0` the criterion is trivially
/// satisfied. `eps` carries the horizontal or vertical epsilon sign
/// (`+1`, `-1`, or `0` to disable the check for that axis).
fn first_nonrepulsive_step<G: TrajectoryGenerator>(
    gen: &G,
    ownship: &TrafficState,
    traffic: &[TrafficState],
    dir: Dir,
    params: &SearchParams,
    dt: f64,
) -> usize {
    if traffic.is_empty() || (params.epsh == 0.0 && params.epsv == 0.0) {
        return params.max_k + 1;
    }
    let reference = &traffic[0];
    let mut prev = gen.trajectory(ownship, 0.0, dir);
    for k in 1..=params.max_k {
        let cur = gen.trajectory(ownship, k as f64 * dt, dir);
        if !is_repulsive(prev, cur, reference, params.epsh, params.epsv) {
            return k;
        }
        prev = cur;
    }
    params.max_k + 1
}

fn is_repulsive(
    prev: (Vect3, Velocity),
    cur: (Vect3, Velocity),
    reference: &TrafficState,
    epsh: f64,
    epsv: f64,
) -> bool {
    if epsh != 0.0 {
        let s_prev = reference.s - prev.0;
        let s_cur = reference.s - cur.0;
        let cross_prev = s_prev.det2d(&(prev.1.to_vect3() - reference.v.to_vect3()));
        let cross_cur = s_cur.det2d(&(cur.1.to_vect3() - reference.v.to_vect3()));
        if epsh > 0.0 && cross_cur < cross_prev - 1e-9 {
            return false;
        }
        if epsh < 0.0 && cross_cur > cross_prev + 1e-9 {
            return false;
        }
    }
    if epsv != 0.0 {
        let sep_prev = (reference.s.z - prev.0.z).abs();
        let sep_cur = (reference.s.z - cur.0.z).abs();
        if epsv > 0.0 && sep_cur < sep_prev - 1e-9 {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::CylinderDetector;
    use crate::geo::{Position, Projection};

    struct ConstantTurn {
        omega: f64,
        radius: f64,
    }

    impl TrajectoryGenerator for ConstantTurn {
        fn trajectory(&self, ownship: &TrafficState, t: f64, dir: Dir) -> (Vect3, Velocity) {
            let sign = if dir == Dir::Pos { 1.0 } else { -1.0 };
            let dtrack = sign * self.omega * t;
            let new_track = (ownship.v.track + dtrack).rem_euclid(2.0 * std::f64::consts::PI);
            let new_vel = ownship.v.with_track(new_track);
            (ownship.s + new_vel.to_vect3() * t, new_vel)
        }

        fn time_step(&self, _ownship: &TrafficState) -> f64 {
            0.1 / self.omega.max(1e-6)
        }
    }

    fn proj() -> Projection {
        Projection::new(Position::new(0.0, 0.0, 0.0))
    }

    #[test]
    fn search_with_no_traffic_is_all_conflict_free() {
        let p = proj();
        let own = TrafficState::make_ownship("own", Position::new(0.0, 0.0, 100.0), Velocity::new(0.0, 20.0, 0.0), &p);
        let gen = ConstantTurn { omega: 0.1, radius: 200.0 };
        let det = CylinderDetector::new(500.0, 100.0);
        let params = SearchParams {
            conflict_det: &det,
            recovery_det: None,
            b: 0.0,
            t: 60.0,
            b2: 0.0,
            t2: 60.0,
            max_k: 20,
            epsh: 0.0,
            epsv: 0.0,
        };
        let result = search(&gen, &own, &[], Dir::Pos, &params);
        assert!(!result.runs.is_empty());
        let _ = gen.radius;
    }

    #[test]
    fn search_with_head_on_traffic_finds_a_loss_of_separation_step() {
        let p = proj();
        let own = TrafficState::make_ownship("own", Position::new(0.0, 0.0, 100.0), Velocity::new(0.0, 20.0, 0.0), &p);
        let intr = own.make_intruder("tfc1", Position::new(0.001, 0.0, 100.0), Velocity::new(std::f64::consts::PI, 20.0, 0.0), &p);
        let gen = ConstantTurn { omega: 0.05, radius: 400.0 };
        let det = CylinderDetector::new(500.0, 100.0);
        let params = SearchParams {
            conflict_det: &det,
            recovery_det: None,
            b: 0.0,
            t: 30.0,
            b2: 0.0,
            t2: 30.0,
            max_k: 50,
            epsh: 0.0,
            epsv: 0.0,
        };
        let result = search(&gen, &own, &[intr], Dir::Pos, &params);
        assert!(result.bands_search_index < 50);
    }
}
