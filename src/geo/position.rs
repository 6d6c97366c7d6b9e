use serde::{Deserialize, Serialize};

use super::vect3::Vect3;

/// Geodetic position, the unprojected form carried at system boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_msl: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64, altitude_msl: f64) -> Self {
        Position { latitude, longitude, altitude_msl }
    }
}

/// Flat-earth projection centered on an origin latitude/longitude, used to
/// turn geodetic positions into the local `Vect3` frame the bands and
/// planner algorithms operate in. Valid over the scale of a single DAA
/// encounter (tens of kilometers); no attempt is made at a general-purpose
/// geodesy library.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    origin: Position,
    /// meters per degree of latitude, meters per degree of longitude at the origin
    m_per_deg_lat: f64,
    m_per_deg_lon: f64,
}

const EARTH_RADIUS_M: f64 = 6_378_137.0;

impl Projection {
    pub fn new(origin: Position) -> Self {
        let m_per_deg_lat = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        let m_per_deg_lon = m_per_deg_lat * origin.latitude.to_radians().cos();
        Projection { origin, m_per_deg_lat, m_per_deg_lon }
    }

    pub fn project(&self, p: &Position) -> Vect3 {
        let x = (p.longitude - self.origin.longitude) * self.m_per_deg_lon;
        let y = (p.latitude - self.origin.latitude) * self.m_per_deg_lat;
        let z = p.altitude_msl - self.origin.altitude_msl;
        Vect3::new(x, y, z)
    }

    pub fn inverse(&self, v: &Vect3) -> Position {
        if self.m_per_deg_lon.abs() < 1e-9 {
            return Position::new(self.origin.latitude, self.origin.longitude, self.origin.altitude_msl + v.z);
        }
        Position::new(
            self.origin.latitude + v.y / self.m_per_deg_lat,
            self.origin.longitude + v.x / self.m_per_deg_lon,
            self.origin.altitude_msl + v.z,
        )
    }
}
