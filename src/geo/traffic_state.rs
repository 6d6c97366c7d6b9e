use super::position::{Position, Projection};
use super::vect3::Vect3;
use super::velocity::Velocity;

/// An aircraft's projected state: identity, geodetic position, and the
/// local `Vect3`/`Velocity` pair produced by a shared `Projection` centered
/// on the ownship. All bands, detector, and planner code operates on the
/// projected frame; the geodetic `position` field is kept only for
/// reporting back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficState {
    pub id: String,
    pub position: Position,
    pub s: Vect3,
    pub v: Velocity,
}

impl TrafficState {
    /// Sentinel for "no such aircraft" — an empty id and a position/velocity
    /// that cannot coincide with any real projected state. Callers check
    /// `is_invalid()` rather than relying on `Option` plumbing through the
    /// bands/resolver call chain the way the original's `INVALID` constant
    /// does.
    pub fn invalid() -> Self {
        TrafficState {
            id: String::new(),
            position: Position::new(f64::NAN, f64::NAN, f64::NAN),
            s: Vect3::new(f64::NAN, f64::NAN, f64::NAN),
            v: Velocity::new(f64::NAN, f64::NAN, f64::NAN),
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.id.is_empty() && self.s.x.is_nan()
    }

    pub fn make_ownship(id: impl Into<String>, position: Position, velocity: Velocity, proj: &Projection) -> Self {
        TrafficState {
            id: id.into(),
            position,
            s: proj.project(&position),
            v: velocity,
        }
    }

    pub fn make_intruder(&self, id: impl Into<String>, position: Position, velocity: Velocity, proj: &Projection) -> Self {
        TrafficState {
            id: id.into(),
            position,
            s: proj.project(&position),
            v: velocity,
        }
    }

    /// Position of this aircraft relative to `self`, i.e. `other.s - self.s`.
    pub fn relative_position(&self, other: &TrafficState) -> Vect3 {
        other.s - self.s
    }

    /// Velocity of `other` relative to `self`, in the Cartesian frame.
    pub fn relative_velocity(&self, other: &TrafficState) -> Vect3 {
        other.v.to_vect3() - self.v.to_vect3()
    }

    pub fn find<'a>(traffic: &'a [TrafficState], id: &str) -> Option<&'a TrafficState> {
        traffic.iter().find(|t| t.id == id)
    }
}
