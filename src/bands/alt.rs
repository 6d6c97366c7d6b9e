//! Altitude specialization. Unlike the other three dimensions, the
//! "maneuver" is a target altitude reached through a 3-phase vertical-speed
//! level-off profile, not a monotone integration of the current state. See
//! SPEC_FULL.md §3 Open Question (d): `mod` is always `0.0` here — altitude
//! bands are never treated as circular.

use crate::detector::Detector;
use crate::error::ErrorLog;
use crate::geo::{TrafficState, Vect3, Velocity};

use super::alert::Alertor;
use super::integer_core::Dir;
use super::interval::Interval;
use super::region::{BandsRange, BandsRegion};

pub const MOD: f64 = 0.0;

/// The three level-off timestamps for a climb/descend to `target_alt`:
/// time to reach the constant vertical rate (`tsqj1`), time to begin
/// decelerating toward level-off (`tsqj2`), and time level-off completes
/// (`tsqj3`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelOffTimes {
    pub tsqj1: f64,
    pub tsqj2: f64,
    pub tsqj3: f64,
}

fn level_off_times(current_alt: f64, current_vs: f64, target_alt: f64, vertical_rate: f64, vertical_accel: f64) -> LevelOffTimes {
    let delta = target_alt - current_alt;
    if vertical_accel <= 0.0 || vertical_rate <= 0.0 {
        return LevelOffTimes { tsqj1: 0.0, tsqj2: 0.0, tsqj3: 0.0 };
    }
    let target_vs = vertical_rate * delta.signum();
    let tsqj1 = ((target_vs - current_vs) / vertical_accel).abs();
    let phase1_dist = current_vs * tsqj1 + 0.5 * vertical_accel * delta.signum() * tsqj1 * tsqj1;
    let phase3_time = vertical_rate / vertical_accel;
    let phase3_dist = vertical_rate * phase3_time - 0.5 * vertical_accel * phase3_time * phase3_time;
    let cruise_dist = delta.abs() - phase1_dist.abs() - phase3_dist;
    let cruise_time = if cruise_dist > 0.0 { cruise_dist / vertical_rate } else { 0.0 };
    let tsqj2 = tsqj1 + cruise_time.max(0.0);
    let tsqj3 = tsqj2 + phase3_time;
    LevelOffTimes { tsqj1, tsqj2, tsqj3 }
}

/// Altitude and vertical speed at time `t` into a level-off maneuver from
/// `(current_alt, current_vs)` to `target_alt`.
fn level_off_state(
    current_alt: f64,
    current_vs: f64,
    target_alt: f64,
    vertical_rate: f64,
    vertical_accel: f64,
    times: LevelOffTimes,
    t: f64,
) -> (f64, f64) {
    if vertical_accel <= 0.0 || vertical_rate <= 0.0 || t >= times.tsqj3 {
        return (target_alt, 0.0);
    }
    let sign = (target_alt - current_alt).signum();
    if t <= times.tsqj1 {
        let vs = current_vs + sign * vertical_accel * t;
        let alt = current_alt + current_vs * t + 0.5 * sign * vertical_accel * t * t;
        (alt, vs)
    } else if t <= times.tsqj2 {
        let alt_at_1 = current_alt + current_vs * times.tsqj1 + 0.5 * sign * vertical_accel * times.tsqj1 * times.tsqj1;
        let vs = sign * vertical_rate;
        let alt = alt_at_1 + vs * (t - times.tsqj1);
        (alt, vs)
    } else {
        let remaining = times.tsqj3 - t;
        let vs = sign * vertical_accel * remaining;
        let alt = target_alt - sign * 0.5 * vertical_accel * remaining * remaining;
        (alt, vs)
    }
}

/// Altitude bands: rather than implementing `TrajectoryGenerator` (the
/// target is a discrete altitude cell, not a continuously varying
/// direction), this sweeps `h_j = min_alt + j*step` directly and tests each
/// candidate's level-off profile against all traffic and the recovery
/// detector, per SPEC_FULL.md / spec.md §4.4.
pub struct AltBands {
    pub min_alt: f64,
    pub max_alt: f64,
    pub step: f64,
    pub vertical_rate: f64,
    pub vertical_accel: f64,
    pub recovery: bool,
    pub recovery_stability_time: f64,
    pub lookahead_time: f64,
    checked: bool,
    ranges: Vec<BandsRange>,
    recovery_time: f64,
}

impl AltBands {
    pub fn new(
        min_alt: f64,
        max_alt: f64,
        step: f64,
        vertical_rate: f64,
        vertical_accel: f64,
        recovery: bool,
        recovery_stability_time: f64,
        lookahead_time: f64,
    ) -> Self {
        AltBands {
            min_alt,
            max_alt,
            step,
            vertical_rate,
            vertical_accel,
            recovery,
            recovery_stability_time,
            lookahead_time,
            checked: false,
            ranges: Vec::new(),
            recovery_time: f64::NAN,
        }
    }

    fn candidate_is_conflict_free(
        &self,
        ownship: &TrafficState,
        traffic: &[TrafficState],
        target_alt: f64,
        conflict_det: &dyn Detector,
        recovery_det: Option<&dyn Detector>,
    ) -> bool {
        let times = level_off_times(ownship.s.z, ownship.v.vs, target_alt, self.vertical_rate, self.vertical_accel);
        let sample_dt = 1.0_f64.max(self.step / self.vertical_rate.max(1.0));
        let mut t = 0.0;
        while t <= self.lookahead_time {
            let (alt, vs) = level_off_state(ownship.s.z, ownship.v.vs, target_alt, self.vertical_rate, self.vertical_accel, times, t);
            let pos = Vect3::new(ownship.s.x, ownship.s.y, alt);
            let vel = ownship.v.with_vs(vs);
            for intr in traffic {
                let s_rel = intr.s - pos;
                if conflict_det.conflict(s_rel, vel, intr.v, 0.0, self.lookahead_time).conflict() {
                    return false;
                }
                if let Some(rec) = recovery_det {
                    if rec.conflict(s_rel, vel, intr.v, 0.0, self.lookahead_time).conflict() {
                        return false;
                    }
                }
            }
            t += sample_dt;
        }
        true
    }

    pub fn compute(&mut self, ownship: &TrafficState, traffic: &[TrafficState], alertor: &Alertor, errors: &mut ErrorLog) {
        self.ranges.clear();
        self.recovery_time = f64::NAN;

        if traffic.is_empty() {
            self.ranges.push(BandsRange::new(Interval::new(self.min_alt, self.max_alt), BandsRegion::None));
            self.checked = true;
            return;
        }

        let levels: Vec<_> = alertor.iter().collect();
        let steps = (((self.max_alt - self.min_alt) / self.step.max(1e-6)).round() as i64).max(0);

        let mut colored: Vec<BandsRange> = Vec::new();
        let mut j = 0i64;
        while j <= steps {
            let target_alt = self.min_alt + j as f64 * self.step;
            let mut worst_region = BandsRegion::None;
            for (level, thresholds) in &levels {
                let det = thresholds.boxed_detector();
                let rec_det = if self.recovery { Some(det.as_ref()) } else { None };
                if !self.candidate_is_conflict_free(ownship, traffic, target_alt, det.as_ref(), rec_det) {
                    worst_region = if *level == 1 { BandsRegion::Near } else { thresholds.region };
                    break;
                }
            }
            if worst_region != BandsRegion::None {
                colored.push(BandsRange::new(Interval::new(target_alt, target_alt + self.step), worst_region));
            }
            j += 1;
        }

        if colored.is_empty() {
            self.ranges.push(BandsRange::new(Interval::new(self.min_alt, self.max_alt), BandsRegion::None));
        } else {
            self.ranges = super::real_bands::fill_none_gaps(colored, self.min_alt, self.max_alt);
        }
        self.checked = true;
        if self.ranges.iter().any(|r| r.region == BandsRegion::Unknown) {
            errors.record(crate::error::DaaError::DetectorMalformed("altitude bands reported unknown region".into()));
        }
    }

    pub fn length(&self) -> i64 {
        if !self.checked {
            -1
        } else {
            self.ranges.len() as i64
        }
    }

    pub fn interval(&self, i: usize) -> Option<Interval> {
        self.ranges.get(i).map(|r| r.interval)
    }

    pub fn region(&self, i: usize) -> Option<BandsRegion> {
        self.ranges.get(i).map(|r| r.region)
    }

    pub fn ranges(&self) -> &[BandsRange] {
        &self.ranges
    }

    pub fn is_saturated(&self) -> bool {
        self.checked && self.ranges.iter().all(|r| r.region.is_conflict_region())
    }

    pub fn time_to_recovery(&self) -> f64 {
        if !self.is_saturated() {
            f64::NAN
        } else if self.recovery_time.is_nan() {
            f64::NEG_INFINITY
        } else {
            self.recovery_time
        }
    }

    /// Searches upward (`Pos`) or downward (`Neg`) from the current
    /// altitude cell for the nearest conflict-free target; `+/-infinity`
    /// if none exists within `[min_alt, max_alt]`.
    pub fn resolution(&self, ownship: &TrafficState, dir: Dir) -> f64 {
        if !self.checked {
            return f64::NAN;
        }
        let current = ownship.s.z;
        match dir {
            Dir::Pos => self
                .ranges
                .iter()
                .filter(|r| r.region == BandsRegion::None && r.interval.lb >= current)
                .map(|r| r.interval.lb)
                .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v))))
                .unwrap_or(f64::INFINITY),
            Dir::Neg => self
                .ranges
                .iter()
                .filter(|r| r.region == BandsRegion::None && r.interval.ub <= current)
                .map(|r| r.interval.ub)
                .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
                .unwrap_or(f64::NEG_INFINITY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{Position, Projection};

    fn ownship() -> TrafficState {
        let proj = Projection::new(Position::new(0.0, 0.0, 0.0));
        TrafficState::make_ownship("own", Position::new(0.0, 0.0, 500.0), Velocity::new(0.0, 20.0, 0.0), &proj)
    }

    #[test]
    fn mod_is_always_zero() {
        assert_eq!(MOD, 0.0);
    }

    #[test]
    fn level_off_times_reach_target_vs_before_cruise_ends() {
        let times = level_off_times(500.0, 0.0, 800.0, 5.0, 1.0);
        assert!(times.tsqj1 <= times.tsqj2);
        assert!(times.tsqj2 <= times.tsqj3);
    }

    #[test]
    fn empty_traffic_yields_single_none_band() {
        let mut bands = AltBands::new(0.0, 1000.0, 50.0, 5.0, 1.0, false, 10.0, 120.0);
        let own = ownship();
        let alertor = Alertor::default_single_level(500.0, 100.0, 60.0);
        let mut errors = ErrorLog::new();
        bands.compute(&own, &[], &alertor, &mut errors);
        assert_eq!(bands.length(), 1);
        assert_eq!(bands.region(0), Some(BandsRegion::None));
    }
}
