//! Flight Management System (C10): the outer state machine tying the
//! detector, bands, geofence, and resolver components into a single
//! per-tick decision, and the autopilot-facing publication of bands and
//! resolution output. Grounded on `QuadFMS.{h,cpp}` and
//! `QuadFMS_DetectConflict.cpp`'s tick loop structure.

use crate::autopilot::{truncate_ranges, VisualizationBands, VisualizationRange};
use crate::bands::{Alertor, Dimension, MultiBands};
use crate::error::{DaaError, ErrorLog};
use crate::flight_data::{FlightData, ManeuverCommand};
use crate::geo::{Position, TrafficState, Vect3, Velocity};
use crate::geofence::FenceType;
use crate::resolver::{Resolution, Resolver};

/// Outer mission phase. The original distinguishes these for telemetry and
/// ground-station display; only `Cruise` is where conflict detection and
/// resolution actually run (spec §4.10) — the others are pass-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightPhase {
    Idle,
    Preflight,
    Takeoff,
    Climb,
    Cruise,
    Descend,
    Approach,
    Land,
}

/// Which plan the FMS is currently following.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanMode {
    Mission,
    Trajectory,
    Maneuver,
}

/// Conflict-resolution sub-state machine, active only while `PlanMode` is
/// not already a resolver output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveState {
    Idle,
    Compute,
    Maneuver,
    Trajectory,
    Resume,
}

/// Minimum distance (meters, ownship to nearest traffic) below which
/// visualization-bands publication switches from throttled (once per
/// `VIS_THROTTLE_TICKS`) to every tick, matching the original's
/// distance-gated telemetry rate.
const VIS_CLOSE_RANGE_M: f64 = 2000.0;
const VIS_THROTTLE_TICKS: u32 = 5;

pub struct Fms {
    pub flight_data: FlightData,
    pub resolver: Resolver,
    pub multi_bands: MultiBands,
    pub alertor: Alertor,
    pub phase: FlightPhase,
    pub plan_mode: PlanMode,
    pub resolve_state: ResolveState,
    elapsed_time: f64,
    ticks_since_vis: u32,
    errors: ErrorLog,
}

impl Fms {
    pub fn new(flight_data: FlightData, resolver: Resolver, multi_bands: MultiBands, alertor: Alertor) -> Self {
        Fms {
            flight_data,
            resolver,
            multi_bands,
            alertor,
            phase: FlightPhase::Idle,
            plan_mode: PlanMode::Mission,
            resolve_state: ResolveState::Idle,
            elapsed_time: 0.0,
            ticks_since_vis: 0,
            errors: ErrorLog::new(),
        }
    }

    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    /// Advances the state machine by one control period `dt` (seconds,
    /// nominally 1/20 s per spec §5's ~20 Hz tick rate), given the current
    /// ownship state and its surrounding traffic. Never blocks: all
    /// flight-data access is non-blocking mutex acquisition and all
    /// detector/planner calls are deterministic and time-bounded (spec §5).
    pub fn tick(&mut self, dt: f64, ownship: &TrafficState, traffic: &[TrafficState]) {
        self.elapsed_time += dt;
        self.advance_phase(ownship);

        if self.phase != FlightPhase::Cruise {
            return;
        }

        self.multi_bands.compute(ownship, traffic, &self.alertor, &mut self.errors);

        let mut fences = self.flight_data.fences();
        for fence in fences.iter_mut() {
            let plan = match self.plan_mode {
                PlanMode::Mission => self.flight_data.mission_plan(),
                PlanMode::Trajectory => self.flight_data.resolution_plan(),
                PlanMode::Maneuver => self.flight_data.mission_plan(),
            };
            fence.check_violation(ownship.s, self.elapsed_time, &plan);
        }
        self.flight_data.set_fences(fences.clone());

        let alerting = self.multi_bands.alerting(ownship, 0, 0, 0) != 0;
        let fence_conflict = fences.iter().any(|f| f.violation || f.conflict);

        if self.plan_mode == PlanMode::Mission && (alerting || fence_conflict) {
            self.resolve_state = ResolveState::Compute;
        }

        if self.resolve_state == ResolveState::Compute {
            self.run_resolver(ownship, &fences, traffic);
        }

        self.check_resume(ownship);
    }

    fn advance_phase(&mut self, ownship: &TrafficState) {
        self.phase = match self.phase {
            FlightPhase::Idle if self.flight_data.start_mission_requested() => FlightPhase::Preflight,
            FlightPhase::Preflight => FlightPhase::Takeoff,
            FlightPhase::Takeoff if ownship.v.vs.abs() < 0.1 && ownship.s.z > 1.0 => FlightPhase::Climb,
            FlightPhase::Climb if ownship.v.vs.abs() < 0.1 => FlightPhase::Cruise,
            other => other,
        };
    }

    fn run_resolver(&mut self, ownship: &TrafficState, fences: &[crate::geofence::Geofence], traffic: &[TrafficState]) {
        let next_wp_idx = self.flight_data.next_mission_wp();
        let mission_plan = self.flight_data.mission_plan();
        let next_wp = mission_plan.point(next_wp_idx).map(|p| p.position);

        let keep_in_bounds = fences
            .iter()
            .find(|f| f.fence_type == FenceType::KeepIn)
            .map(|f| {
                let verts = &f.polygon.vertices;
                let (mut lo, mut hi) = (Vect3::new(f64::INFINITY, f64::INFINITY, f.polygon.floor), Vect3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f.polygon.ceiling));
                for v in verts {
                    lo.x = lo.x.min(v.x);
                    lo.y = lo.y.min(v.y);
                    hi.x = hi.x.max(v.x);
                    hi.y = hi.y.max(v.y);
                }
                (lo, hi)
            })
            .unwrap_or((Vect3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, 0.0), Vect3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY)));

        let cross_track = self.flight_data.cross_track_deviation();
        let resolution = self.resolver.resolve(ownship, &self.multi_bands, fences, traffic, next_wp, cross_track, keep_in_bounds);

        match resolution {
            Resolution::Maneuver { vn, ve, vu, heading } => {
                self.flight_data.set_maneuver(ManeuverCommand { vn, ve, vu, heading });
                self.plan_mode = PlanMode::Maneuver;
                self.resolve_state = ResolveState::Maneuver;
            }
            Resolution::Trajectory(plan) => {
                self.flight_data.set_resolution_plan(plan);
                self.plan_mode = PlanMode::Trajectory;
                self.resolve_state = ResolveState::Trajectory;
            }
            Resolution::None => {
                self.errors.record(DaaError::NoResolution);
            }
        }
    }

    /// Returns to the mission plan once the conflict that triggered
    /// resolution has cleared: bands and fences report clear, or (in
    /// trajectory mode) the resolution plan's final waypoint has been
    /// reached.
    fn check_resume(&mut self, ownship: &TrafficState) {
        if self.plan_mode == PlanMode::Mission {
            return;
        }

        let fences_clear = self.flight_data.fences().iter().all(|f| !f.violation && !f.conflict);
        let bands_clear = self.multi_bands.alerting(ownship, 0, 0, 0) == 0;

        let goal_reached = match self.plan_mode {
            PlanMode::Trajectory => {
                let plan = self.flight_data.resolution_plan();
                plan.last().map(|p| (p.position - ownship.s).norm() < 5.0).unwrap_or(true)
            }
            PlanMode::Maneuver => fences_clear && bands_clear,
            PlanMode::Mission => true,
        };

        if fences_clear && bands_clear && goal_reached {
            self.resolve_state = ResolveState::Resume;
            self.plan_mode = PlanMode::Mission;
            self.resolve_state = ResolveState::Idle;
        }
    }

    /// Builds the ground-station visualization packet and decides whether
    /// this tick should actually publish it: suppressed entirely when every
    /// dimension is all-clear, otherwise throttled to once every
    /// `VIS_THROTTLE_TICKS` unless the nearest traffic is inside
    /// `VIS_CLOSE_RANGE_M`, in which case every tick publishes.
    pub fn publish_bands(&mut self, ownship: &TrafficState, traffic: &[TrafficState]) -> Option<(VisualizationBands, f64, Position, Velocity, Option<ManeuverCommand>)> {
        let bands = self.collect_visualization_bands();
        if bands.is_all_clear() {
            self.ticks_since_vis = 0;
            return None;
        }

        let nearest = traffic.iter().map(|t| ownship.relative_position(t).norm()).fold(f64::INFINITY, f64::min);
        self.ticks_since_vis += 1;
        let should_publish = nearest <= VIS_CLOSE_RANGE_M || self.ticks_since_vis >= VIS_THROTTLE_TICKS;
        if !should_publish {
            return None;
        }
        self.ticks_since_vis = 0;

        let maneuver = matches!(self.plan_mode, PlanMode::Maneuver).then(|| self.flight_data.maneuver());
        Some((bands, self.elapsed_time, ownship.position, ownship.v, maneuver))
    }

    fn collect_visualization_bands(&self) -> VisualizationBands {
        VisualizationBands {
            trk: truncate_ranges(self.ranges_for(Dimension::Track)),
            gs: truncate_ranges(self.ranges_for(Dimension::GroundSpeed)),
            vs: truncate_ranges(self.ranges_for(Dimension::VerticalSpeed)),
            alt: truncate_ranges(self.ranges_for(Dimension::Altitude)),
        }
    }

    fn ranges_for(&self, dim: Dimension) -> Vec<VisualizationRange> {
        let len = self.multi_bands.length(dim);
        if len < 0 {
            return Vec::new();
        }
        (0..len as usize)
            .filter_map(|i| {
                let interval = self.multi_bands.interval(dim, i)?;
                let region = self.multi_bands.region(dim, i)?;
                Some(VisualizationRange { low: interval.lb, high: interval.ub, region })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::alt::AltBands;
    use crate::bands::gs::new_gs_bands;
    use crate::bands::trk::new_trk_bands;
    use crate::bands::vs::new_vs_bands;
    use crate::geo::{Position, Projection};
    use crate::plan::Plan;
    use crate::resolver::ResolverParams;

    fn make_fms() -> (Fms, TrafficState) {
        let trk = new_trk_bands(0.0, 0.3, 5f64.to_radians(), std::f64::consts::PI, std::f64::consts::PI, true, 10.0, 60.0);
        let gs = new_gs_bands(1.0, 5.0, 30.0, 1.0, true, 10.0, 60.0);
        let vs = new_vs_bands(1.0, -10.0, 10.0, 0.5, true, 10.0, 60.0);
        let alt = AltBands::new(0.0, 1000.0, 50.0, 5.0, 1.0, true, 10.0, 60.0);
        let multi = MultiBands::new(trk, gs, vs, alt);
        let alertor = Alertor::default_single_level(500.0, 100.0, 60.0);
        let flight_data = FlightData::new(Plan::new());
        let resolver = Resolver::new(ResolverParams::default());
        let mut fms = Fms::new(flight_data, resolver, multi, alertor);
        fms.phase = FlightPhase::Cruise;

        let proj = Projection::new(Position::new(0.0, 0.0, 0.0));
        let own = TrafficState::make_ownship("own", Position::new(0.0, 0.0, 100.0), Velocity::new(0.0, 20.0, 0.0), &proj);
        (fms, own)
    }

    #[test]
    fn tick_with_no_conflicts_stays_in_mission_mode() {
        let (mut fms, own) = make_fms();
        fms.tick(0.05, &own, &[]);
        assert_eq!(fms.plan_mode, PlanMode::Mission);
        assert!(fms.errors().is_empty());
    }

    #[test]
    fn publish_bands_suppressed_when_all_clear() {
        let (mut fms, own) = make_fms();
        fms.tick(0.05, &own, &[]);
        assert!(fms.publish_bands(&own, &[]).is_none());
    }

    #[test]
    fn idle_phase_never_runs_conflict_detection() {
        let (mut fms, own) = make_fms();
        fms.phase = FlightPhase::Idle;
        fms.tick(0.05, &own, &[]);
        assert_eq!(fms.phase, FlightPhase::Idle);
        assert!(fms.errors().is_empty());
    }
}
