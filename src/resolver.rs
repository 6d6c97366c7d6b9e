//! Fuses geofence, traffic, and cross-track deviation into a single
//! resolution: either a velocity command (maneuver mode) or a replacement
//! plan (trajectory mode). Priority order follows spec.md §4.9.

use crate::bands::{Dir, MultiBands};
use crate::geo::{TrafficState, Vect3, Velocity};
use crate::geofence::{FenceType, Geofence};
use crate::plan::{point_on_offset_path, NavPoint, Plan};
use crate::planner::{track_is_conflict_free, GridPlanner, RrtParameters, RrtPlanner};

#[derive(Debug, Clone)]
pub enum Resolution {
    Maneuver { vn: f64, ve: f64, vu: f64, heading: f64 },
    Trajectory(Plan),
    /// No resolver branch fired; the FMS should continue on the mission
    /// plan unchanged.
    None,
}

pub struct ResolverParams {
    pub allowed_deviation_m: f64,
    pub cross_track_gain: f64,
    pub preferred_offset_deg: f64,
    pub fence_buffer_m: f64,
    pub max_ceiling_m: f64,
    pub resolution_speed: f64,
}

impl Default for ResolverParams {
    fn default() -> Self {
        ResolverParams {
            allowed_deviation_m: 50.0,
            cross_track_gain: 0.2,
            preferred_offset_deg: 5.0,
            fence_buffer_m: 5.0,
            max_ceiling_m: 3000.0,
            resolution_speed: 10.0,
        }
    }
}

pub struct Resolver {
    pub params: ResolverParams,
}

impl Resolver {
    pub fn new(params: ResolverParams) -> Self {
        Resolver { params }
    }

    /// Runs the priority cascade. `mission_plan` is the plan ownship should
    /// otherwise be following; `next_wp` is its next waypoint, used for the
    /// keep-in recovery feasibility check and the traffic-conflict reroute
    /// target.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve(
        &self,
        ownship: &TrafficState,
        multi: &MultiBands,
        fences: &[Geofence],
        traffic: &[TrafficState],
        next_wp: Option<Vect3>,
        cross_track_deviation: f64,
        keep_in_bounds: (Vect3, Vect3),
    ) -> Resolution {
        if let Some(r) = self.resolve_keep_in(ownship, fences, next_wp) {
            tracing::debug!("resolver: keep-in fence violation, trajectory resolution");
            return r;
        }
        if let Some(r) = self.resolve_keep_out(ownship, fences, next_wp) {
            tracing::debug!("resolver: keep-out fence conflict, trajectory resolution");
            return r;
        }
        if let Some(r) = self.resolve_traffic(ownship, multi, traffic, next_wp, keep_in_bounds) {
            tracing::debug!("resolver: traffic conflict resolution");
            return r;
        }
        if let Some(r) = self.resolve_cross_track(ownship, cross_track_deviation, next_wp) {
            tracing::debug!("resolver: cross-track deviation resolution");
            return r;
        }
        Resolution::None
    }

    fn resolve_keep_in(&self, ownship: &TrafficState, fences: &[Geofence], next_wp: Option<Vect3>) -> Option<Resolution> {
        let violated = fences.iter().find(|f| f.fence_type == FenceType::KeepIn && f.violation)?;
        let recovery = violated.recovery_point?;
        let mut plan = Plan::new();
        plan.push(NavPoint::new(recovery, 0.0));
        if let Some(wp) = next_wp {
            if violated.check_wp_feasibility(recovery, wp, 5.0) {
                let dist = (wp - recovery).norm();
                plan.push(NavPoint::new(wp, dist / self.params.resolution_speed.max(1e-3)));
            }
        }
        let _ = ownship;
        Some(Resolution::Trajectory(plan))
    }

    fn resolve_keep_out(&self, ownship: &TrafficState, fences: &[Geofence], next_wp: Option<Vect3>) -> Option<Resolution> {
        let violated = fences.iter().find(|f| f.fence_type == FenceType::KeepOut && (f.violation || f.conflict))?;
        let goal = next_wp.unwrap_or(ownship.s);

        let keep_out_polys: Vec<_> = fences
            .iter()
            .filter(|f| f.fence_type == FenceType::KeepOut)
            .map(|f| f.polygon.clone())
            .collect();
        let grid = GridPlanner::default();
        let grid_result = grid.search(ownship.s, goal, &keep_out_polys);
        let grid_len = if grid_result.goal_reached { grid_result.plan.path_distance() } else { f64::INFINITY };

        let go_above = self.go_above_plan(ownship.s, goal, violated, self.params.max_ceiling_m);
        let go_above_len = match &go_above {
            Some(p) => p.path_distance(),
            None => f64::INFINITY,
        };

        let chosen = if grid_len <= go_above_len { Some(grid_result.plan) } else { go_above };
        chosen.map(Resolution::Trajectory)
    }

    /// Four-waypoint climb / traverse / descend plan clearing a keep-out
    /// fence vertically: climb to `ceiling + 1m` above the fence, traverse
    /// over it, then descend back toward `goal`'s altitude. `None` (treated
    /// as length +infinity by the caller) if the fence ceiling already
    /// exceeds `max_ceiling`.
    fn go_above_plan(&self, start: Vect3, goal: Vect3, fence: &Geofence, max_ceiling: f64) -> Option<Plan> {
        let clearance_alt = fence.polygon.ceiling + 1.0;
        if clearance_alt > max_ceiling {
            return None;
        }
        let climb_point = Vect3::new(start.x, start.y, clearance_alt);
        let traverse_point = Vect3::new(goal.x, goal.y, clearance_alt);
        let descend_point = goal;

        let speed = self.params.resolution_speed.max(1e-3);
        let mut plan = Plan::new();
        let mut t = 0.0;
        plan.push(NavPoint::new(start, t));
        t += (climb_point - start).norm() / speed;
        plan.push(NavPoint::new(climb_point, t));
        t += (traverse_point - climb_point).norm() / speed;
        plan.push(NavPoint::new(traverse_point, t));
        t += (descend_point - traverse_point).norm() / speed;
        plan.push(NavPoint::new(descend_point, t));
        Some(plan)
    }

    fn resolve_traffic(
        &self,
        ownship: &TrafficState,
        multi: &MultiBands,
        traffic: &[TrafficState],
        next_wp: Option<Vect3>,
        keep_in_bounds: (Vect3, Vect3),
    ) -> Option<Resolution> {
        if multi.alerting(ownship, 0, 0, 0) == 0 {
            return None;
        }

        let dir = multi.preferred_track_direction(ownship);
        let preferred = multi.track_resolution(ownship, dir);
        if preferred.is_finite() {
            let offset = self.params.preferred_offset_deg.to_radians() * if dir == Dir::Pos { 1.0 } else { -1.0 };
            let heading = (preferred + offset).rem_euclid(2.0 * std::f64::consts::PI);
            if !self.turn_crosses_band(multi, ownship.v.track, heading) {
                let vel = Velocity::new(heading, ownship.v.gs, ownship.v.vs);
                let c = vel.to_vect3();
                return Some(Resolution::Maneuver { vn: c.y, ve: c.x, vu: c.z, heading });
            }
        }

        let goal = next_wp.unwrap_or(ownship.s);
        let rrt = RrtPlanner::new(RrtParameters::default());
        let result = rrt.search(ownship.s, ownship.v.to_vect3(), goal, keep_in_bounds, &[], traffic);
        Some(Resolution::Trajectory(result.plan))
    }

    fn resolve_cross_track(&self, ownship: &TrafficState, deviation: f64, next_wp: Option<Vect3>) -> Option<Resolution> {
        if deviation.abs() <= self.params.allowed_deviation_m {
            return None;
        }
        let wp = next_wp?;
        if deviation.abs() <= 2.0 * self.params.allowed_deviation_m {
            let v = ownship.v.gs;
            let vs = (self.params.cross_track_gain * deviation).clamp(-v, v);
            let vf = (v * v - vs * vs).max(0.0).sqrt();
            let path_track = ownship.v.track;
            let heading = path_track - vs.signum() * std::f64::consts::FRAC_PI_2;
            let vel = Velocity::new(heading.rem_euclid(2.0 * std::f64::consts::PI), vf, ownship.v.vs);
            let c = vel.to_vect3();
            Some(Resolution::Maneuver { vn: c.y, ve: c.x, vu: c.z, heading: vel.track })
        } else {
            let reconverge = point_on_offset_path(ownship.s, wp, ownship.s);
            let mut plan = Plan::new();
            plan.push(NavPoint::new(ownship.s, 0.0));
            let dist = (reconverge - ownship.s).norm().max((wp - ownship.s).norm());
            plan.push(NavPoint::new(wp, dist / self.params.resolution_speed.max(1e-3)));
            Some(Resolution::Trajectory(plan))
        }
    }

    /// True if turning from `from_track` to `to_track` along the shorter
    /// arc passes through a conflict-colored cell of the track bands.
    fn turn_crosses_band(&self, multi: &MultiBands, from_track: f64, to_track: f64) -> bool {
        let two_pi = 2.0 * std::f64::consts::PI;
        let mut delta = (to_track - from_track).rem_euclid(two_pi);
        if delta > std::f64::consts::PI {
            delta -= two_pi;
        }
        let steps = 8;
        for i in 0..=steps {
            let t = (from_track + delta * (i as f64 / steps as f64)).rem_euclid(two_pi);
            if !track_is_conflict_free(multi, t) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::alt::AltBands;
    use crate::bands::gs::new_gs_bands;
    use crate::bands::trk::new_trk_bands;
    use crate::bands::vs::new_vs_bands;
    use crate::bands::{Alertor, MultiBands};
    use crate::error::ErrorLog;
    use crate::geo::{Polygon, Position, Projection};

    fn make_multi_no_conflict() -> (MultiBands, TrafficState) {
        let proj = Projection::new(Position::new(0.0, 0.0, 0.0));
        let own = TrafficState::make_ownship("own", Position::new(0.0, 0.0, 100.0), Velocity::new(0.0, 20.0, 0.0), &proj);
        let trk = new_trk_bands(0.0, 0.3, 5f64.to_radians(), std::f64::consts::PI, std::f64::consts::PI, true, 10.0, 60.0);
        let gs = new_gs_bands(1.0, 5.0, 30.0, 1.0, true, 10.0, 60.0);
        let vs = new_vs_bands(1.0, -10.0, 10.0, 0.5, true, 10.0, 60.0);
        let alt = AltBands::new(0.0, 1000.0, 50.0, 5.0, 1.0, true, 10.0, 60.0);
        let mut multi = MultiBands::new(trk, gs, vs, alt);
        let alertor = Alertor::default_single_level(500.0, 100.0, 60.0);
        let mut errors = ErrorLog::new();
        multi.compute(&own, &[], &alertor, &mut errors);
        (multi, own)
    }

    #[test]
    fn no_conflict_and_within_tolerance_yields_no_resolution() {
        let (multi, own) = make_multi_no_conflict();
        let resolver = Resolver::new(ResolverParams::default());
        let r = resolver.resolve(
            &own,
            &multi,
            &[],
            &[],
            Some(Vect3::new(1000.0, 0.0, 100.0)),
            5.0,
            (Vect3::new(-1000.0, -1000.0, 0.0), Vect3::new(1000.0, 1000.0, 300.0)),
        );
        assert!(matches!(r, Resolution::None));
    }

    #[test]
    fn keep_in_violation_takes_priority_over_everything_else() {
        let (multi, own) = make_multi_no_conflict();
        let polygon = Polygon::new(
            vec![
                Vect3::new(-100.0, -100.0, 0.0),
                Vect3::new(100.0, -100.0, 0.0),
                Vect3::new(100.0, 100.0, 0.0),
                Vect3::new(-100.0, 100.0, 0.0),
            ],
            0.0,
            500.0,
        );
        let mut fence = Geofence::new(1, FenceType::KeepIn, polygon, 30.0, 5.0);
        let plan = Plan::from_points(vec![NavPoint::new(Vect3::new(500.0, 500.0, 100.0), 0.0)]);
        fence.check_violation(Vect3::new(500.0, 500.0, 100.0), 0.0, &plan);
        let resolver = Resolver::new(ResolverParams::default());
        let r = resolver.resolve(
            &own,
            &multi,
            &[fence],
            &[],
            Some(Vect3::new(0.0, 0.0, 100.0)),
            500.0,
            (Vect3::new(-1000.0, -1000.0, 0.0), Vect3::new(1000.0, 1000.0, 300.0)),
        );
        assert!(matches!(r, Resolution::Trajectory(_)));
    }

    #[test]
    fn go_above_returns_none_when_ceiling_exceeds_max() {
        let resolver = Resolver::new(ResolverParams { max_ceiling_m: 200.0, ..Default::default() });
        let polygon = Polygon::new(
            vec![
                Vect3::new(0.0, 0.0, 0.0),
                Vect3::new(100.0, 0.0, 0.0),
                Vect3::new(100.0, 100.0, 0.0),
                Vect3::new(0.0, 100.0, 0.0),
            ],
            0.0,
            500.0,
        );
        let fence = Geofence::new(1, FenceType::KeepOut, polygon, 30.0, 5.0);
        let plan = resolver.go_above_plan(Vect3::new(0.0, 0.0, 100.0), Vect3::new(200.0, 0.0, 100.0), &fence, 200.0);
        assert!(plan.is_none());
    }
}
