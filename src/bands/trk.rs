use crate::geo::{TrafficState, Vect3, Velocity};

use super::integer_core::{Dir, TrajectoryGenerator};
use super::real_bands::{DimensionConfig, RealBands};

const G: f64 = 9.80665;

/// Track-angle maneuver: a constant-rate turn left or right. Falls back to
/// an instantaneous (zero-radius) trajectory when both `turn_rate` and
/// `bank_angle` are zero, matching the "instant maneuver" mode the
/// original allows for simplified kinematics.
pub struct TrkGenerator {
    pub turn_rate: f64,
    pub bank_angle: f64,
    pub step: f64,
}

impl TrkGenerator {
    pub fn new(turn_rate: f64, bank_angle: f64, step: f64) -> Self {
        TrkGenerator { turn_rate, bank_angle, step }
    }

    fn omega(&self, gs: f64) -> f64 {
        if self.turn_rate > 0.0 {
            self.turn_rate
        } else if self.bank_angle > 0.0 && gs > 1e-3 {
            (G * self.bank_angle.tan() / gs).abs()
        } else {
            0.0
        }
    }

    pub fn is_instantaneous(&self) -> bool {
        self.turn_rate <= 0.0 && self.bank_angle <= 0.0
    }
}

impl TrajectoryGenerator for TrkGenerator {
    fn trajectory(&self, ownship: &TrafficState, t: f64, dir: Dir) -> (Vect3, Velocity) {
        let sign = if dir == Dir::Pos { 1.0 } else { -1.0 };
        if self.is_instantaneous() {
            let new_track = (ownship.v.track + sign * self.step).rem_euclid(2.0 * std::f64::consts::PI);
            let vel = ownship.v.with_track(new_track);
            return (ownship.s + vel.to_vect3() * t, vel);
        }
        let omega = self.omega(ownship.v.gs);
        let new_track = (ownship.v.track + sign * omega * t).rem_euclid(2.0 * std::f64::consts::PI);
        let vel = ownship.v.with_track(new_track);
        // Position integrated along the arc: approximate with the chord at
        // the new heading scaled by gs*t, adequate at the sampling
        // resolution this search operates at.
        (ownship.s + vel.to_vect3() * t, vel)
    }

    fn time_step(&self, ownship: &TrafficState) -> f64 {
        if self.is_instantaneous() {
            1.0
        } else {
            self.step / self.omega(ownship.v.gs).max(1e-6)
        }
    }
}

pub type TrkBands = RealBands<TrkGenerator>;

pub fn new_trk_bands(
    turn_rate: f64,
    bank_angle: f64,
    step: f64,
    left_trk: f64,
    right_trk: f64,
    recovery: bool,
    recovery_stability_time: f64,
    lookahead_time: f64,
) -> TrkBands {
    let config = DimensionConfig {
        min_val: -left_trk,
        max_val: right_trk,
        modulus: 2.0 * std::f64::consts::PI,
        step,
        recovery,
        recovery_stability_time,
        ca_factor: 0.2,
        lookahead_time,
    };
    RealBands::new(TrkGenerator::new(turn_rate, bank_angle, step), config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instantaneous_mode_when_both_kinematics_are_zero() {
        let gen = TrkGenerator::new(0.0, 0.0, 0.1);
        assert!(gen.is_instantaneous());
    }

    #[test]
    fn bank_angle_drives_a_nonzero_turn_rate() {
        let gen = TrkGenerator::new(0.0, 0.5, 0.1);
        assert!(gen.omega(20.0) > 0.0);
    }

    #[test]
    fn explicit_turn_rate_takes_precedence_over_bank_angle() {
        let gen = TrkGenerator::new(0.2, 0.5, 0.1);
        assert!((gen.omega(20.0) - 0.2).abs() < 1e-9);
    }
}
