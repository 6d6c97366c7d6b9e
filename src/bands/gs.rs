use crate::geo::{TrafficState, Vect3, Velocity};

use super::integer_core::{Dir, TrajectoryGenerator};
use super::real_bands::{DimensionConfig, RealBands};

/// Ground-speed maneuver: constant horizontal acceleration, clamped to
/// `[min_gs, max_gs]`. Instantaneous when `horizontal_accel` is zero.
pub struct GsGenerator {
    pub horizontal_accel: f64,
    pub min_gs: f64,
    pub max_gs: f64,
    pub step: f64,
}

impl GsGenerator {
    pub fn new(horizontal_accel: f64, min_gs: f64, max_gs: f64, step: f64) -> Self {
        GsGenerator { horizontal_accel, min_gs, max_gs, step }
    }

    pub fn is_instantaneous(&self) -> bool {
        self.horizontal_accel <= 0.0
    }
}

impl TrajectoryGenerator for GsGenerator {
    fn trajectory(&self, ownship: &TrafficState, t: f64, dir: Dir) -> (Vect3, Velocity) {
        let sign = if dir == Dir::Pos { 1.0 } else { -1.0 };
        let gs = if self.is_instantaneous() {
            (ownship.v.gs + sign * self.step).clamp(self.min_gs, self.max_gs)
        } else {
            (ownship.v.gs + sign * self.horizontal_accel * t).clamp(self.min_gs, self.max_gs)
        };
        let vel = ownship.v.with_gs(gs);
        (ownship.s + vel.to_vect3() * t, vel)
    }

    fn time_step(&self, _ownship: &TrafficState) -> f64 {
        if self.is_instantaneous() {
            1.0
        } else {
            self.step / self.horizontal_accel.max(1e-6)
        }
    }
}

pub type GsBands = RealBands<GsGenerator>;

pub fn new_gs_bands(
    horizontal_accel: f64,
    min_gs: f64,
    max_gs: f64,
    step: f64,
    recovery: bool,
    recovery_stability_time: f64,
    lookahead_time: f64,
) -> GsBands {
    let config = DimensionConfig {
        min_val: min_gs,
        max_val: max_gs,
        modulus: 0.0,
        step,
        recovery,
        recovery_stability_time,
        ca_factor: 0.2,
        lookahead_time,
    };
    RealBands::new(GsGenerator::new(horizontal_accel, min_gs, max_gs, step), config)
}
