use serde::{Deserialize, Serialize};

use super::vect3::Vect3;

/// A simple (non-self-intersecting) horizontal polygon, vertices in the
/// projected frame, plus a vertical extent. Vertices are assumed given in
/// order (either winding) and the last implicitly connects to the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Vect3>,
    pub floor: f64,
    pub ceiling: f64,
}

impl Polygon {
    pub fn new(vertices: Vec<Vect3>, floor: f64, ceiling: f64) -> Self {
        Polygon { vertices, floor, ceiling }
    }

    /// Even-odd rule point-in-polygon test, ignoring altitude.
    pub fn contains_2d(&self, p: &Vect3) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let vi = &self.vertices[i];
            let vj = &self.vertices[j];
            let intersects = ((vi.y > p.y) != (vj.y > p.y))
                && (p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x);
            if intersects {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    pub fn contains(&self, p: &Vect3) -> bool {
        p.z >= self.floor && p.z <= self.ceiling && self.contains_2d(p)
    }

    /// Signed distance in meters from `p` to the nearest edge, positive when
    /// `p` is inside the polygon. Used by both fence entry/exit timing and
    /// recovery-point synthesis.
    pub fn distance_to_boundary_2d(&self, p: &Vect3) -> f64 {
        let n = self.vertices.len();
        if n < 2 {
            return 0.0;
        }
        let mut min_dist = f64::INFINITY;
        let mut j = n - 1;
        for i in 0..n {
            let d = point_to_segment_distance(p, &self.vertices[j], &self.vertices[i]);
            if d < min_dist {
                min_dist = d;
            }
            j = i;
        }
        if self.contains_2d(p) {
            min_dist
        } else {
            -min_dist
        }
    }

    /// Centroid of the vertex list (not the area centroid; adequate for the
    /// inward-shrink recovery-point heuristic).
    pub fn centroid_2d(&self) -> Vect3 {
        let n = self.vertices.len().max(1) as f64;
        let sum = self.vertices.iter().fold(Vect3::ZERO, |acc, v| acc + *v);
        Vect3::new(sum.x / n, sum.y / n, (self.floor + self.ceiling) / 2.0)
    }
}

fn point_to_segment_distance(p: &Vect3, a: &Vect3, b: &Vect3) -> f64 {
    let ab = *b - *a;
    let ap = *p - *a;
    let len2 = ab.x * ab.x + ab.y * ab.y;
    let t = if len2 < 1e-9 { 0.0 } else { ((ap.x * ab.x + ap.y * ab.y) / len2).clamp(0.0, 1.0) };
    let closest = Vect3::new(a.x + t * ab.x, a.y + t * ab.y, 0.0);
    let d = Vect3::new(p.x - closest.x, p.y - closest.y, 0.0);
    d.norm2d()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::new(
            vec![
                Vect3::new(0.0, 0.0, 0.0),
                Vect3::new(10.0, 0.0, 0.0),
                Vect3::new(10.0, 10.0, 0.0),
                Vect3::new(0.0, 10.0, 0.0),
            ],
            0.0,
            100.0,
        )
    }

    #[test]
    fn contains_point_inside() {
        let poly = square();
        assert!(poly.contains_2d(&Vect3::new(5.0, 5.0, 0.0)));
    }

    #[test]
    fn excludes_point_outside() {
        let poly = square();
        assert!(!poly.contains_2d(&Vect3::new(15.0, 5.0, 0.0)));
    }

    #[test]
    fn altitude_bounds_are_respected() {
        let poly = square();
        assert!(!poly.contains(&Vect3::new(5.0, 5.0, 200.0)));
        assert!(poly.contains(&Vect3::new(5.0, 5.0, 50.0)));
    }

    #[test]
    fn boundary_distance_is_positive_inside_negative_outside() {
        let poly = square();
        assert!(poly.distance_to_boundary_2d(&Vect3::new(5.0, 5.0, 0.0)) > 0.0);
        assert!(poly.distance_to_boundary_2d(&Vect3::new(-5.0, 5.0, 0.0)) < 0.0);
    }
}
