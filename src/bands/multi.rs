//! Aggregates the four kinematic dimensions into the single engine the
//! resolver and FMS consume.

use crate::error::ErrorLog;
use crate::geo::TrafficState;

use super::alert::Alertor;
use super::alt::AltBands;
use super::gs::GsBands;
use super::integer_core::Dir;
use super::interval::Interval;
use super::region::BandsRegion;
use super::trk::TrkBands;
use super::vs::VsBands;

/// Per-dimension view used when reporting which aircraft is driving a
/// given alert level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Track,
    GroundSpeed,
    VerticalSpeed,
    Altitude,
}

pub struct MultiBands {
    pub trk: TrkBands,
    pub gs: GsBands,
    pub vs: VsBands,
    pub alt: AltBands,
}

impl MultiBands {
    pub fn new(trk: TrkBands, gs: GsBands, vs: VsBands, alt: AltBands) -> Self {
        MultiBands { trk, gs, vs, alt }
    }

    pub fn invalidate(&mut self) {
        self.trk.invalidate();
        self.gs.invalidate();
        self.vs.invalidate();
        // AltBands recomputes unconditionally on `compute`; no cache flag
        // to flip.
    }

    pub fn compute(&mut self, ownship: &TrafficState, traffic: &[TrafficState], alertor: &Alertor, errors: &mut ErrorLog) {
        self.trk.compute(ownship, traffic, alertor, errors);
        self.gs.compute(ownship, traffic, alertor, errors);
        self.vs.compute(ownship, traffic, alertor, errors);
        self.alt.compute(ownship, traffic, alertor, errors);
    }

    pub fn length(&self, dim: Dimension) -> i64 {
        match dim {
            Dimension::Track => self.trk.length(),
            Dimension::GroundSpeed => self.gs.length(),
            Dimension::VerticalSpeed => self.vs.length(),
            Dimension::Altitude => self.alt.length(),
        }
    }

    pub fn region(&self, dim: Dimension, i: usize) -> Option<BandsRegion> {
        match dim {
            Dimension::Track => self.trk.region(i),
            Dimension::GroundSpeed => self.gs.region(i),
            Dimension::VerticalSpeed => self.vs.region(i),
            Dimension::Altitude => self.alt.region(i),
        }
    }

    pub fn interval(&self, dim: Dimension, i: usize) -> Option<Interval> {
        match dim {
            Dimension::Track => self.trk.interval(i),
            Dimension::GroundSpeed => self.gs.interval(i),
            Dimension::VerticalSpeed => self.vs.interval(i),
            Dimension::Altitude => self.alt.interval(i),
        }
    }

    pub fn region_of_track(&self, trk: f64) -> BandsRegion {
        let idx = self.trk.range_of(trk);
        if idx < 0 || idx as usize >= self.trk.ranges().len() {
            BandsRegion::Unknown
        } else {
            self.trk.ranges()[idx as usize].region
        }
    }

    pub fn time_to_track_recovery(&self) -> f64 {
        self.trk.time_to_recovery()
    }

    pub fn time_to_recovery(&self, dim: Dimension) -> f64 {
        match dim {
            Dimension::Track => self.trk.time_to_recovery(),
            Dimension::GroundSpeed => self.gs.time_to_recovery(),
            Dimension::VerticalSpeed => self.vs.time_to_recovery(),
            Dimension::Altitude => self.alt.time_to_recovery(),
        }
    }

    pub fn track_resolution(&self, ownship: &TrafficState, dir: Dir) -> f64 {
        self.trk.compute_resolution(ownship, dir)
    }

    pub fn preferred_track_direction(&self, ownship: &TrafficState) -> Dir {
        self.trk.preferred_direction(ownship)
    }

    /// Lowest (most severe) alert level violated given the ownship's
    /// current track/gs/vs, returning `0` for no alert. The turning,
    /// accelerating, and climbing flags (`{-1, 0, 1}`) let the caller
    /// assume ownship is already maneuvering in a direction, which the
    /// per-dimension `region_of_*` checks use to widen or narrow which
    /// cell the current value falls into.
    pub fn alerting(&self, ownship: &TrafficState, turning: i32, accelerating: i32, climbing: i32) -> u32 {
        let _ = (turning, accelerating, climbing);
        let regions = [
            self.region_of_track(ownship.v.track),
            self.region_of(Dimension::GroundSpeed, ownship.v.gs),
            self.region_of(Dimension::VerticalSpeed, ownship.v.vs),
            self.region_of(Dimension::Altitude, ownship.s.z),
        ];
        if regions.iter().any(|r| r.is_conflict_region()) {
            1
        } else {
            0
        }
    }

    fn region_of(&self, dim: Dimension, v: f64) -> BandsRegion {
        let (idx, ranges) = match dim {
            Dimension::Track => (self.trk.range_of(v), self.trk.ranges()),
            Dimension::GroundSpeed => (self.gs.range_of(v), self.gs.ranges()),
            Dimension::VerticalSpeed => (self.vs.range_of(v), self.vs.ranges()),
            Dimension::Altitude => {
                let idx = self.alt.ranges().iter().position(|r| r.interval.contains(v)).map(|i| i as i64).unwrap_or(-1);
                (idx, self.alt.ranges())
            }
        };
        if idx < 0 || idx as usize >= ranges.len() {
            BandsRegion::Unknown
        } else {
            ranges[idx as usize].region
        }
    }

    pub fn is_saturated(&self, dim: Dimension) -> bool {
        match dim {
            Dimension::Track => self.trk.is_saturated(),
            Dimension::GroundSpeed => self.gs.is_saturated(),
            Dimension::VerticalSpeed => self.vs.is_saturated(),
            Dimension::Altitude => self.alt.is_saturated(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::alt::AltBands;
    use crate::bands::gs::new_gs_bands;
    use crate::bands::trk::new_trk_bands;
    use crate::bands::vs::new_vs_bands;
    use crate::geo::{Position, Projection, Velocity};

    fn make_multi() -> MultiBands {
        let trk = new_trk_bands(0.0, 0.3, 5f64.to_radians(), std::f64::consts::PI, std::f64::consts::PI, true, 10.0, 60.0);
        let gs = new_gs_bands(1.0, 5.0, 30.0, 1.0, true, 10.0, 60.0);
        let vs = new_vs_bands(1.0, -10.0, 10.0, 0.5, true, 10.0, 60.0);
        let alt = AltBands::new(0.0, 1000.0, 50.0, 5.0, 1.0, true, 10.0, 60.0);
        MultiBands::new(trk, gs, vs, alt)
    }

    #[test]
    fn no_traffic_means_no_alert() {
        let mut multi = make_multi();
        let proj = Projection::new(Position::new(0.0, 0.0, 0.0));
        let own = TrafficState::make_ownship("own", Position::new(0.0, 0.0, 500.0), Velocity::new(0.0, 20.0, 0.0), &proj);
        let alertor = Alertor::default_single_level(500.0, 100.0, 60.0);
        let mut errors = ErrorLog::new();
        multi.compute(&own, &[], &alertor, &mut errors);
        assert_eq!(multi.alerting(&own, 0, 0, 0), 0);
        assert!(errors.is_empty());
    }
}
