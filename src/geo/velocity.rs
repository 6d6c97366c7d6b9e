use serde::{Deserialize, Serialize};

use super::vect3::Vect3;

/// Velocity expressed both as compass track/ground-speed/vertical-speed
/// (the form the bands algorithm reasons about directly) and convertible
/// to/from the Cartesian `Vect3` frame used by the planners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    /// radians, compass bearing (0 = north, increasing clockwise)
    pub track: f64,
    /// meters/second, horizontal speed
    pub gs: f64,
    /// meters/second, positive up
    pub vs: f64,
}

impl Velocity {
    pub fn new(track: f64, gs: f64, vs: f64) -> Self {
        Velocity { track, gs, vs }
    }

    pub fn from_vect3(v: &Vect3) -> Self {
        Velocity {
            track: v.track(),
            gs: v.norm2d(),
            vs: v.z,
        }
    }

    pub fn to_vect3(&self) -> Vect3 {
        Vect3::new(self.track.sin() * self.gs, self.track.cos() * self.gs, self.vs)
    }

    pub fn with_track(&self, track: f64) -> Self {
        Velocity { track, ..*self }
    }

    pub fn with_gs(&self, gs: f64) -> Self {
        Velocity { gs, ..*self }
    }

    pub fn with_vs(&self, vs: f64) -> Self {
        Velocity { vs, ..*self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vect3_roundtrip() {
        let v = Velocity::new(0.7, 12.0, -1.5);
        let back = Velocity::from_vect3(&v.to_vect3());
        assert!((back.track - v.track).abs() < 1e-9);
        assert!((back.gs - v.gs).abs() < 1e-9);
        assert!((back.vs - v.vs).abs() < 1e-9);
    }

    #[test]
    fn north_track_has_zero_x_component() {
        let v = Velocity::new(0.0, 10.0, 0.0);
        let c = v.to_vect3();
        assert!(c.x.abs() < 1e-9);
        assert!((c.y - 10.0).abs() < 1e-9);
    }
}
