//! Plan / NavPoint data model: an ordered, time-tagged sequence of
//! waypoints shared by the mission plan, the active resolution plan, and
//! the A*/RRT planner outputs.

use serde::{Deserialize, Serialize};

use crate::geo::Vect3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub position: Vect3,
    /// Seconds since plan start; non-decreasing across the plan.
    pub time: f64,
}

impl NavPoint {
    pub fn new(position: Vect3, time: f64) -> Self {
        NavPoint { position, time }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    points: Vec<NavPoint>,
}

impl Plan {
    pub fn new() -> Self {
        Plan { points: Vec::new() }
    }

    pub fn from_points(points: Vec<NavPoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[1].time >= w[0].time), "plan times must be non-decreasing");
        Plan { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn point(&self, i: usize) -> Option<NavPoint> {
        self.points.get(i).copied()
    }

    pub fn push(&mut self, p: NavPoint) {
        self.points.push(p);
    }

    pub fn last(&self) -> Option<NavPoint> {
        self.points.last().copied()
    }

    pub fn path_distance(&self) -> f64 {
        self.points.windows(2).map(|w| (w[1].position - w[0].position).norm()).sum()
    }

    /// Index of the segment active at time `t`: the pair `(i, i+1)` such
    /// that `points[i].time <= t <= points[i+1].time`. `None` before the
    /// first point or after the last.
    pub fn segment(&self, t: f64) -> Option<usize> {
        if self.points.len() < 2 {
            return None;
        }
        for i in 0..self.points.len() - 1 {
            if t >= self.points[i].time && t <= self.points[i + 1].time {
                return Some(i);
            }
        }
        None
    }

    /// Linearly interpolated position along the plan at time `t`.
    pub fn position_at(&self, t: f64) -> Option<Vect3> {
        let i = self.segment(t)?;
        let (a, b) = (self.points[i], self.points[i + 1]);
        let span = b.time - a.time;
        let frac = if span > 1e-9 { (t - a.time) / span } else { 0.0 };
        Some(a.position + (b.position - a.position) * frac)
    }

    /// A new plan covering only `[t0, t1]`, with interpolated endpoints.
    pub fn cut_down(&self, t0: f64, t1: f64) -> Plan {
        let mut out = Vec::new();
        if let Some(p) = self.position_at(t0) {
            out.push(NavPoint::new(p, t0));
        }
        for p in &self.points {
            if p.time > t0 && p.time < t1 {
                out.push(*p);
            }
        }
        if let Some(p) = self.position_at(t1) {
            out.push(NavPoint::new(p, t1));
        }
        Plan::from_points(out)
    }

    /// Advances every point's timestamp by `dt`, leaving positions fixed
    /// (used when a cached plan needs to be re-anchored after a tick).
    pub fn linear_projection(&self, dt: f64) -> Plan {
        Plan::from_points(self.points.iter().map(|p| NavPoint::new(p.position, p.time + dt)).collect())
    }
}

/// Computes the point on the two-point offset path `(from -> to)` closest
/// to `current`, projected back onto the segment. Used by the resolver's
/// cross-track branch to find the reconvergence point toward the mission
/// path rather than a raw perpendicular offset.
pub fn point_on_offset_path(from: Vect3, to: Vect3, current: Vect3) -> Vect3 {
    let path = to - from;
    let len2 = path.dot(&path);
    if len2 < 1e-9 {
        return from;
    }
    let t = ((current - from).dot(&path) / len2).clamp(0.0, 1.0);
    from.add_scal(t, &path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> Plan {
        Plan::from_points(vec![
            NavPoint::new(Vect3::new(0.0, 0.0, 100.0), 0.0),
            NavPoint::new(Vect3::new(100.0, 0.0, 100.0), 10.0),
            NavPoint::new(Vect3::new(100.0, 100.0, 100.0), 20.0),
        ])
    }

    #[test]
    fn segment_picks_the_active_leg() {
        let plan = sample_plan();
        assert_eq!(plan.segment(5.0), Some(0));
        assert_eq!(plan.segment(15.0), Some(1));
        assert_eq!(plan.segment(25.0), None);
    }

    #[test]
    fn position_at_interpolates() {
        let plan = sample_plan();
        let p = plan.position_at(5.0).unwrap();
        assert!((p.x - 50.0).abs() < 1e-9);
    }

    #[test]
    fn path_distance_sums_segment_lengths() {
        let plan = sample_plan();
        assert!((plan.path_distance() - 200.0).abs() < 1e-6);
    }

    #[test]
    fn cut_down_preserves_interior_points_and_interpolates_ends() {
        let plan = sample_plan();
        let cut = plan.cut_down(5.0, 15.0);
        assert_eq!(cut.len(), 3);
        assert!((cut.point(0).unwrap().time - 5.0).abs() < 1e-9);
    }

    #[test]
    fn point_on_offset_path_clamps_to_segment() {
        let from = Vect3::new(0.0, 0.0, 0.0);
        let to = Vect3::new(10.0, 0.0, 0.0);
        let p = point_on_offset_path(from, to, Vect3::new(-5.0, 3.0, 0.0));
        assert_eq!(p, from);
    }
}
