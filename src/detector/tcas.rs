use serde::{Deserialize, Serialize};

use crate::geo::{Vect3, Velocity};

use super::cylinder::CylinderDetector;
use super::{ConflictData, Detector};

/// Altitude-banded protection volume approximating the TCAS RA/TA
/// sensitivity-level table: radius and half-height scale with the
/// ownship's altitude band rather than being fixed constants. The band is
/// selected once, at construction, from the ownship's current altitude
/// (`for_ownship_altitude`) and then behaves as a fixed-volume detector for
/// the lifetime of the value — altitude does not flow through `violation`/
/// `conflict` themselves, matching every other `Detector`'s signature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TcasDetector {
    bands: [(f64, f64, f64); 7],
    active: CylinderDetector,
}

/// (altitude ceiling in meters for this band, radius_m, half_height_m),
/// bands listed low to high, the final entry's ceiling is ignored (applies
/// above the previous one). Values follow the coarse shape of the TCAS II
/// sensitivity-level table (tighter volumes at low altitude, looser above
/// FL200).
const DEFAULT_BANDS: [(f64, f64, f64); 7] = [
    (305.0, 556.0, 91.0),
    (610.0, 926.0, 137.0),
    (1220.0, 926.0, 137.0),
    (2130.0, 1112.0, 152.0),
    (3050.0, 1297.0, 213.0),
    (6100.0, 1853.0, 305.0),
    (f64::INFINITY, 2224.0, 366.0),
];

impl Default for TcasDetector {
    fn default() -> Self {
        TcasDetector::for_ownship_altitude(DEFAULT_BANDS, 0.0)
    }
}

impl TcasDetector {
    /// Builds a detector with the given band table, pinned to whichever
    /// band covers `alt_msl`.
    pub fn for_ownship_altitude(bands: [(f64, f64, f64); 7], alt_msl: f64) -> Self {
        let active = Self::volume_for_altitude(&bands, alt_msl);
        TcasDetector { bands, active }
    }

    /// Same as `for_ownship_altitude` but using the default TCAS II band
    /// table.
    pub fn new(alt_msl: f64) -> Self {
        Self::for_ownship_altitude(DEFAULT_BANDS, alt_msl)
    }

    fn volume_for_altitude(bands: &[(f64, f64, f64); 7], alt_msl: f64) -> CylinderDetector {
        for &(ceiling, radius, half_height) in bands {
            if alt_msl <= ceiling {
                return CylinderDetector::new(radius, half_height);
            }
        }
        let (_, radius, half_height) = bands[bands.len() - 1];
        CylinderDetector::new(radius, half_height)
    }
}

impl Detector for TcasDetector {
    fn identifier(&self) -> &str {
        "tcas"
    }

    fn violation(&self, s_rel: Vect3, vo: Velocity, vi: Velocity) -> bool {
        self.active.violation(s_rel, vo, vi)
    }

    fn conflict(&self, s_rel: Vect3, vo: Velocity, vi: Velocity, b: f64, t: f64) -> ConflictData {
        self.active.conflict(s_rel, vo, vi, b, t)
    }

    fn copy(&self) -> Box<dyn Detector> {
        Box::new(*self)
    }

    fn scaled(&self, factor: f64) -> Box<dyn Detector> {
        let mut bands = self.bands;
        for b in bands.iter_mut() {
            b.1 *= factor;
            b.2 *= factor;
        }
        let active = CylinderDetector::new(self.active.radius_m * factor, self.active.half_height_m * factor);
        Box::new(TcasDetector { bands, active })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_altitude_band_is_tighter_than_high_altitude_band() {
        let low = TcasDetector::new(100.0);
        let high = TcasDetector::new(5000.0);
        assert!(low.active.radius_m < high.active.radius_m);
    }

    #[test]
    fn scaling_preserves_the_active_band_selection() {
        let d = TcasDetector::new(5000.0);
        let scaled = d.scaled(0.5);
        let s_rel = Vect3::new(0.0, 0.0, 0.0);
        let vo = Velocity::new(0.0, 10.0, 0.0);
        let vi = Velocity::new(0.0, 10.0, 0.0);
        assert!(scaled.violation(s_rel, vo, vi));
    }
}
