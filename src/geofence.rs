//! Polygon keep-in/keep-out fence engine: containment, lookahead
//! entry/exit prediction against a plan, and recovery-point synthesis.

use serde::{Deserialize, Serialize};

use crate::geo::{Polygon, Position, Projection, Vect3};
use crate::plan::Plan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FenceType {
    KeepIn,
    KeepOut,
}

/// A prediction window during which the ownship's planned trajectory
/// enters (keep-out) or leaves (keep-in) the fence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FenceConflict {
    pub t_in: f64,
    pub t_out: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geofence {
    pub id: u32,
    pub fence_type: FenceType,
    pub polygon: Polygon,
    /// Lookahead horizon, seconds, for the plan-sampling conflict check.
    pub lookahead_time: f64,
    /// Recovery-point buffer, meters.
    pub buffer_m: f64,

    #[serde(skip)]
    pub violation: bool,
    #[serde(skip)]
    pub conflict: bool,
    #[serde(skip)]
    pub recovery_point: Option<Vect3>,
}

impl Geofence {
    pub fn new(id: u32, fence_type: FenceType, polygon: Polygon, lookahead_time: f64, buffer_m: f64) -> Self {
        Geofence {
            id,
            fence_type,
            polygon,
            lookahead_time,
            buffer_m,
            violation: false,
            conflict: false,
            recovery_point: None,
        }
    }

    fn currently_safe(&self, p: &Vect3) -> bool {
        match self.fence_type {
            FenceType::KeepIn => self.polygon.contains(p),
            FenceType::KeepOut => !self.polygon.contains(p),
        }
    }

    /// Updates `violation`/`conflict`/`recovery_point` against the current
    /// ownship position and a sampled window of `plan` starting at
    /// `elapsed_time`. Sample spacing is coarse (1s) since fences change
    /// slowly relative to the bands recompute rate.
    pub fn check_violation(&mut self, ownship_pos: Vect3, elapsed_time: f64, plan: &Plan) {
        self.violation = !self.currently_safe(&ownship_pos);

        self.conflict = false;
        let mut window: Option<(f64, f64)> = None;
        let mut t = elapsed_time;
        let end = elapsed_time + self.lookahead_time;
        while t <= end {
            if let Some(pos) = plan.position_at(t) {
                if !self.currently_safe(&pos) {
                    self.conflict = true;
                    window = Some(match window {
                        None => (t, t),
                        Some((lo, _hi)) => (lo, t),
                    });
                }
            }
            t += 1.0;
        }

        if self.violation || self.conflict {
            self.recovery_point = Some(self.compute_recovery_point(&ownship_pos));
        } else {
            self.recovery_point = None;
        }

        let _ = window;
    }

    /// Conflict window, if `check_violation` found one.
    pub fn conflict_window(&self, ownship_pos: Vect3, elapsed_time: f64, plan: &Plan) -> Option<FenceConflict> {
        let mut t_in = None;
        let mut t_out = None;
        let mut t = elapsed_time;
        let end = elapsed_time + self.lookahead_time;
        while t <= end {
            if let Some(pos) = plan.position_at(t) {
                if !self.currently_safe(&pos) {
                    if t_in.is_none() {
                        t_in = Some(t);
                    }
                    t_out = Some(t);
                }
            }
            t += 1.0;
        }
        let _ = ownship_pos;
        match (t_in, t_out) {
            (Some(i), Some(o)) => Some(FenceConflict { t_in: i, t_out: o }),
            _ => None,
        }
    }

    /// Nearest point strictly inside the keep-in polygon (buffered inward)
    /// or strictly outside each keep-out polygon (projected to the nearest
    /// edge and pushed outward by `buffer_m` along the outward normal).
    fn compute_recovery_point(&self, from: &Vect3) -> Vect3 {
        match self.fence_type {
            FenceType::KeepIn => {
                let centroid = self.polygon.centroid_2d();
                let dist = self.polygon.distance_to_boundary_2d(from);
                if dist >= self.buffer_m {
                    *from
                } else {
                    // Pull toward the centroid until clear of the buffer zone.
                    let dir = (centroid - *from).hat();
                    from.add_scal(self.buffer_m - dist, &dir)
                }
            }
            FenceType::KeepOut => {
                let (nearest, outward_normal) = self.nearest_edge_point_and_normal(from);
                nearest.add_scal(self.buffer_m, &outward_normal)
            }
        }
    }

    fn nearest_edge_point_and_normal(&self, p: &Vect3) -> (Vect3, Vect3) {
        let verts = &self.polygon.vertices;
        let n = verts.len();
        if n < 2 {
            return (*p, Vect3::ZERO);
        }
        let mut best_dist = f64::INFINITY;
        let mut best_point = *p;
        let mut best_normal = Vect3::ZERO;
        let mut j = n - 1;
        for i in 0..n {
            let a = verts[j];
            let b = verts[i];
            let ab = b - a;
            let len2 = ab.x * ab.x + ab.y * ab.y;
            let t = if len2 < 1e-9 { 0.0 } else { (((*p - a).x * ab.x + (*p - a).y * ab.y) / len2).clamp(0.0, 1.0) };
            let closest = Vect3::new(a.x + t * ab.x, a.y + t * ab.y, p.z);
            let d = (*p - closest).norm2d();
            if d < best_dist {
                best_dist = d;
                best_point = closest;
                // Outward normal: rotate the edge vector -90 degrees,
                // oriented away from the polygon centroid.
                let normal = Vect3::new(ab.y, -ab.x, 0.0).hat();
                let centroid = self.polygon.centroid_2d();
                let to_centroid = centroid - closest;
                best_normal = if normal.dot2d(&to_centroid) > 0.0 { -normal } else { normal };
            }
            j = i;
        }
        (best_point, best_normal)
    }

    /// Whether the straight segment `wp_now -> wp_next` stays safe (for
    /// keep-out) or contained (for keep-in), sampled at `step_m` meter
    /// spacing.
    pub fn check_wp_feasibility(&self, wp_now: Vect3, wp_next: Vect3, step_m: f64) -> bool {
        let total = (wp_next - wp_now).norm2d();
        if total < 1e-9 {
            return self.currently_safe(&wp_now);
        }
        let steps = (total / step_m.max(1e-3)).ceil() as usize;
        for i in 0..=steps {
            let frac = i as f64 / steps as f64;
            let p = wp_now.add_scal(frac, &(wp_next - wp_now));
            if !self.currently_safe(&p) {
                return false;
            }
        }
        true
    }
}

/// Projects a polygon's geodetic vertex list into the ownship frame.
pub fn project_polygon_vertices(vertices: &[Position], floor: f64, ceiling: f64, proj: &Projection) -> Polygon {
    Polygon::new(vertices.iter().map(|p| proj.project(p)).collect(), floor, ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::NavPoint;

    fn square_polygon() -> Polygon {
        Polygon::new(
            vec![
                Vect3::new(0.0, 0.0, 0.0),
                Vect3::new(100.0, 0.0, 0.0),
                Vect3::new(100.0, 100.0, 0.0),
                Vect3::new(0.0, 100.0, 0.0),
            ],
            0.0,
            200.0,
        )
    }

    #[test]
    fn keep_in_violation_when_outside() {
        let mut fence = Geofence::new(1, FenceType::KeepIn, square_polygon(), 30.0, 5.0);
        let plan = Plan::from_points(vec![NavPoint::new(Vect3::new(200.0, 200.0, 50.0), 0.0)]);
        fence.check_violation(Vect3::new(200.0, 200.0, 50.0), 0.0, &plan);
        assert!(fence.violation);
        assert!(fence.recovery_point.is_some());
    }

    #[test]
    fn keep_out_violation_when_inside() {
        let mut fence = Geofence::new(2, FenceType::KeepOut, square_polygon(), 30.0, 5.0);
        let plan = Plan::from_points(vec![NavPoint::new(Vect3::new(50.0, 50.0, 50.0), 0.0)]);
        fence.check_violation(Vect3::new(50.0, 50.0, 50.0), 0.0, &plan);
        assert!(fence.violation);
        let rp = fence.recovery_point.unwrap();
        assert!(!fence.polygon.contains_2d(&rp));
    }

    #[test]
    fn no_violation_when_keep_in_contains_position() {
        let mut fence = Geofence::new(3, FenceType::KeepIn, square_polygon(), 30.0, 5.0);
        let plan = Plan::from_points(vec![NavPoint::new(Vect3::new(50.0, 50.0, 50.0), 0.0)]);
        fence.check_violation(Vect3::new(50.0, 50.0, 50.0), 0.0, &plan);
        assert!(!fence.violation);
        assert!(fence.recovery_point.is_none());
    }

    #[test]
    fn wp_feasibility_detects_crossing_a_keep_out_zone() {
        let fence = Geofence::new(4, FenceType::KeepOut, square_polygon(), 30.0, 5.0);
        assert!(!fence.check_wp_feasibility(Vect3::new(-10.0, 50.0, 50.0), Vect3::new(200.0, 50.0, 50.0), 5.0));
        assert!(fence.check_wp_feasibility(Vect3::new(-10.0, 200.0, 50.0), Vect3::new(200.0, 200.0, 50.0), 5.0));
    }
}
