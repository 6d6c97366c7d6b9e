use crate::geo::{TrafficState, Vect3, Velocity};

use super::integer_core::{Dir, TrajectoryGenerator};
use super::real_bands::{DimensionConfig, RealBands};

/// Vertical-speed maneuver: constant vertical acceleration, clamped to
/// `[min_vs, max_vs]`. Instantaneous when `vertical_accel` is zero.
pub struct VsGenerator {
    pub vertical_accel: f64,
    pub min_vs: f64,
    pub max_vs: f64,
    pub step: f64,
}

impl VsGenerator {
    pub fn new(vertical_accel: f64, min_vs: f64, max_vs: f64, step: f64) -> Self {
        VsGenerator { vertical_accel, min_vs, max_vs, step }
    }

    pub fn is_instantaneous(&self) -> bool {
        self.vertical_accel <= 0.0
    }
}

impl TrajectoryGenerator for VsGenerator {
    fn trajectory(&self, ownship: &TrafficState, t: f64, dir: Dir) -> (Vect3, Velocity) {
        let sign = if dir == Dir::Pos { 1.0 } else { -1.0 };
        let vs = if self.is_instantaneous() {
            (ownship.v.vs + sign * self.step).clamp(self.min_vs, self.max_vs)
        } else {
            (ownship.v.vs + sign * self.vertical_accel * t).clamp(self.min_vs, self.max_vs)
        };
        let vel = ownship.v.with_vs(vs);
        (ownship.s + vel.to_vect3() * t, vel)
    }

    fn time_step(&self, _ownship: &TrafficState) -> f64 {
        if self.is_instantaneous() {
            1.0
        } else {
            self.step / self.vertical_accel.max(1e-6)
        }
    }
}

pub type VsBands = RealBands<VsGenerator>;

pub fn new_vs_bands(
    vertical_accel: f64,
    min_vs: f64,
    max_vs: f64,
    step: f64,
    recovery: bool,
    recovery_stability_time: f64,
    lookahead_time: f64,
) -> VsBands {
    let config = DimensionConfig {
        min_val: min_vs,
        max_val: max_vs,
        modulus: 0.0,
        step,
        recovery,
        recovery_stability_time,
        ca_factor: 0.2,
        lookahead_time,
    };
    RealBands::new(VsGenerator::new(vertical_accel, min_vs, max_vs, step), config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_to_configured_range() {
        let gen = VsGenerator::new(0.0, -5.0, 5.0, 10.0);
        assert!(gen.is_instantaneous());
    }
}
