//! Kino-dynamic RRT: expands a tree of nodes under a first-order damped
//! linear motion model, used to reroute around a predicted traffic
//! conflict the A* grid planner is not suited for (it reasons about
//! static geofences, not moving intruders).

use rand::Rng;

use crate::bands::MultiBands;
use crate::geo::{Polygon, TrafficState, Vect3, Velocity};
use crate::plan::{NavPoint, Plan};

/// Damping gain in `v' = -Kc(v - u)`, matching the original's fixed
/// constant rather than exposing it as a tunable (it is a property of the
/// assumed autopilot velocity-tracking loop, not a planner search
/// parameter).
const KC: f64 = 0.3;

#[derive(Debug, Clone, Copy)]
pub struct RrtParameters {
    pub step_count: usize,
    pub dt: f64,
    pub goal_tolerance_m: f64,
    pub max_nodes: usize,
    /// Resolved Open Question (c): the RRT's traffic-clearance guard,
    /// promoted from a hard-coded constant to a tunable parameter,
    /// defaulted to the configured detector's protection radius.
    pub min_traffic_clearance_m: f64,
    pub resolution_speed: f64,
}

impl Default for RrtParameters {
    fn default() -> Self {
        RrtParameters {
            step_count: 5,
            dt: 1.0,
            goal_tolerance_m: 3.0,
            max_nodes: 2000,
            min_traffic_clearance_m: 500.0,
            resolution_speed: 10.0,
        }
    }
}

struct Node {
    position: Vect3,
    velocity: Vect3,
    parent: Option<usize>,
    cost: f64,
}

pub struct RrtPlanner {
    pub params: RrtParameters,
}

pub struct RrtResult {
    pub plan: Plan,
    pub goal_reached: bool,
}

impl RrtPlanner {
    pub fn new(params: RrtParameters) -> Self {
        RrtPlanner { params }
    }

    pub fn search(
        &self,
        start: Vect3,
        start_vel: Vect3,
        goal: Vect3,
        keep_in_bounds: (Vect3, Vect3),
        keep_out: &[Polygon],
        traffic: &[TrafficState],
    ) -> RrtResult {
        let mut rng = rand::thread_rng();
        let mut nodes = vec![Node { position: start, velocity: start_vel, parent: None, cost: 0.0 }];

        for _ in 0..self.params.max_nodes {
            if let Some(goal_idx) = self.try_direct_path(&nodes, goal, keep_out, traffic) {
                return RrtResult { plan: self.unwind(&nodes, goal_idx, Some(goal)), goal_reached: true };
            }

            let sample = if rng.gen_bool(0.1) {
                goal
            } else {
                Vect3::new(
                    rng.gen_range(keep_in_bounds.0.x..=keep_in_bounds.1.x),
                    rng.gen_range(keep_in_bounds.0.y..=keep_in_bounds.1.y),
                    start.z,
                )
            };

            let nearest = self.nearest(&nodes, sample);
            let u = (sample - nodes[nearest].position).hat() * self.target_speed(&nodes[nearest]);

            if let Some((pos, vel)) = self.integrate(&nodes[nearest], u, keep_out, traffic) {
                let cost = nodes[nearest].cost + (pos - nodes[nearest].position).norm();
                nodes.push(Node { position: pos, velocity: vel, parent: Some(nearest), cost });
                let idx = nodes.len() - 1;
                if (pos - goal).norm2d() <= self.params.goal_tolerance_m {
                    return RrtResult { plan: self.unwind(&nodes, idx, None), goal_reached: true };
                }
            }
        }

        // Best-effort: return the path to the node closest to goal.
        let best = (0..nodes.len())
            .min_by(|&a, &b| {
                (nodes[a].position - goal).norm().partial_cmp(&(nodes[b].position - goal).norm()).unwrap()
            })
            .unwrap_or(0);
        RrtResult { plan: self.unwind(&nodes, best, None), goal_reached: false }
    }

    fn target_speed(&self, node: &Node) -> f64 {
        node.velocity.norm2d().max(5.0)
    }

    fn nearest(&self, nodes: &[Node], sample: Vect3) -> usize {
        (0..nodes.len())
            .min_by(|&a, &b| {
                (nodes[a].position - sample).norm().partial_cmp(&(nodes[b].position - sample).norm()).unwrap()
            })
            .unwrap_or(0)
    }

    /// RK2 integration of `x' = v, v' = -Kc(v - u)` over `step_count` steps
    /// of `dt`, rejecting the candidate if it crosses a keep-out polygon or
    /// comes within `min_traffic_clearance_m` of any traffic.
    fn integrate(&self, from: &Node, u: Vect3, keep_out: &[Polygon], traffic: &[TrafficState]) -> Option<(Vect3, Vect3)> {
        let mut x = from.position;
        let mut v = from.velocity;
        for _ in 0..self.params.step_count {
            let dt = self.params.dt;
            let k1v = (u - v) * KC;
            let k1x = v;
            let mid_v = v + k1v * (dt / 2.0);
            let mid_x = x + k1x * (dt / 2.0);
            let k2v = (u - mid_v) * KC;
            let k2x = mid_v;
            v = v + k2v * dt;
            x = x + k2x * dt;

            if keep_out.iter().any(|poly| poly.contains_2d(&x)) {
                return None;
            }
            if self.turn_crosses_keep_out(from.position, x, keep_out) {
                return None;
            }
            for intr in traffic {
                let dist = (intr.s - x).norm2d();
                if dist < self.params.min_traffic_clearance_m && self.closing(&x, &v, intr) {
                    return None;
                }
            }
        }
        Some((x, v))
    }

    fn closing(&self, pos: &Vect3, vel: &Vect3, intr: &TrafficState) -> bool {
        let rel_pos = intr.s - *pos;
        let rel_vel = intr.v.to_vect3() - *vel;
        rel_pos.dot2d(&rel_vel) < 0.0
    }

    /// Straight-line intersection test between the segment `from -> to` and
    /// every keep-out polygon edge, catching the case where the sampled
    /// endpoint is clear but the arc swept through a fence.
    fn turn_crosses_keep_out(&self, from: Vect3, to: Vect3, keep_out: &[Polygon]) -> bool {
        for poly in keep_out {
            let n = poly.vertices.len();
            if n < 2 {
                continue;
            }
            let mut j = n - 1;
            for i in 0..n {
                if segments_intersect_2d(from, to, poly.vertices[j], poly.vertices[i]) {
                    return true;
                }
                j = i;
            }
        }
        false
    }

    /// Direct-path-to-goal bias: if the straight segment from the nearest
    /// existing node to the goal is clear, accept it immediately.
    fn try_direct_path(&self, nodes: &[Node], goal: Vect3, keep_out: &[Polygon], traffic: &[TrafficState]) -> Option<usize> {
        let idx = self.nearest(nodes, goal);
        let from = &nodes[idx];
        if (from.position - goal).norm2d() <= self.params.goal_tolerance_m {
            return Some(idx);
        }
        if self.turn_crosses_keep_out(from.position, goal, keep_out) {
            return None;
        }
        for intr in traffic {
            if point_to_segment_min_dist(intr.s, from.position, goal) < self.params.min_traffic_clearance_m {
                return None;
            }
        }
        Some(idx)
    }

    fn unwind(&self, nodes: &[Node], mut idx: usize, goal: Option<Vect3>) -> Plan {
        let mut positions = Vec::new();
        loop {
            positions.push(nodes[idx].position);
            match nodes[idx].parent {
                Some(p) => idx = p,
                None => break,
            }
        }
        positions.reverse();
        if let Some(g) = goal {
            positions.push(g);
        }
        let mut plan = Plan::new();
        let mut t = 0.0;
        if let Some(&first) = positions.first() {
            plan.push(NavPoint::new(first, t));
            for pair in positions.windows(2) {
                let dist = (pair[1] - pair[0]).norm();
                t += dist / self.params.resolution_speed.max(1e-3);
                plan.push(NavPoint::new(pair[1], t));
            }
        }
        plan
    }
}

fn point_to_segment_min_dist(p: Vect3, a: Vect3, b: Vect3) -> f64 {
    let ab = b - a;
    let len2 = ab.dot2d(&ab);
    let t = if len2 < 1e-9 { 0.0 } else { ((p - a).dot2d(&ab) / len2).clamp(0.0, 1.0) };
    let closest = a.add_scal(t, &ab);
    (p - closest).norm2d()
}

fn segments_intersect_2d(p1: Vect3, p2: Vect3, p3: Vect3, p4: Vect3) -> bool {
    let d1 = direction_2d(p3, p4, p1);
    let d2 = direction_2d(p3, p4, p2);
    let d3 = direction_2d(p1, p2, p3);
    let d4 = direction_2d(p1, p2, p4);
    ((d1 > 0.0) != (d2 > 0.0)) && ((d3 > 0.0) != (d4 > 0.0))
}

fn direction_2d(a: Vect3, b: Vect3, c: Vect3) -> f64 {
    (b - a).det2d(&(c - a))
}

/// Evaluates whether the ownship's current track, under the given
/// MultiBands output, lies in a conflict region — used by the resolver
/// before reaching for the RRT at all (spec §4.9 item 3).
pub fn track_is_conflict_free(multi: &MultiBands, current_track: f64) -> bool {
    let idx = multi.trk.range_of(current_track);
    if idx < 0 || idx as usize >= multi.trk.ranges().len() {
        return false;
    }
    !multi.trk.ranges()[idx as usize].region.is_conflict_region()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{Position, Projection};

    #[test]
    fn direct_path_with_no_obstacles_reaches_goal_immediately() {
        let planner = RrtPlanner::new(RrtParameters::default());
        let start = Vect3::new(0.0, 0.0, 100.0);
        let goal = Vect3::new(50.0, 0.0, 100.0);
        let result = planner.search(
            start,
            Vect3::new(0.0, 10.0, 0.0),
            goal,
            (Vect3::new(-500.0, -500.0, 0.0), Vect3::new(500.0, 500.0, 300.0)),
            &[],
            &[],
        );
        assert!(result.goal_reached);
    }

    #[test]
    fn segments_intersect_detects_a_crossing() {
        let a = Vect3::new(0.0, 0.0, 0.0);
        let b = Vect3::new(10.0, 10.0, 0.0);
        let c = Vect3::new(0.0, 10.0, 0.0);
        let d = Vect3::new(10.0, 0.0, 0.0);
        assert!(segments_intersect_2d(a, b, c, d));
    }

    #[test]
    fn segments_intersect_rejects_parallel_segments() {
        let a = Vect3::new(0.0, 0.0, 0.0);
        let b = Vect3::new(10.0, 0.0, 0.0);
        let c = Vect3::new(0.0, 5.0, 0.0);
        let d = Vect3::new(10.0, 5.0, 0.0);
        assert!(!segments_intersect_2d(a, b, c, d));
    }

    #[test]
    fn avoids_traffic_within_clearance_radius() {
        let proj = Projection::new(Position::new(0.0, 0.0, 0.0));
        let own = TrafficState::make_ownship("own", Position::new(0.0, 0.0, 100.0), Velocity::new(0.0, 10.0, 0.0), &proj);
        let intr = own.make_intruder("tfc", Position::new(0.0005, 0.0, 100.0), Velocity::new(std::f64::consts::PI, 10.0, 0.0), &proj);
        let planner = RrtPlanner::new(RrtParameters { min_traffic_clearance_m: 1000.0, ..Default::default() });
        let result = planner.search(
            Vect3::new(0.0, 0.0, 100.0),
            Vect3::new(0.0, 10.0, 0.0),
            Vect3::new(0.0, 200.0, 100.0),
            (Vect3::new(-500.0, -500.0, 0.0), Vect3::new(500.0, 500.0, 300.0)),
            &[],
            &[intr],
        );
        assert!(result.plan.len() >= 1);
    }
}
