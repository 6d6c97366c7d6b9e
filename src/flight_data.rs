//! Shared flight state: the single record the FMS, resolver, and autopilot
//! bridge all read and mutate across a tick. Guarded by a `Mutex` the way
//! the original's `AircraftData_t` guards its fields with a `pthread_mutex_t`,
//! wrapped in `Arc` for the same multi-owner access pattern the teacher uses
//! for its shared engine handles.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::geo::{TrafficState, Vect3};
use crate::geofence::Geofence;
use crate::plan::Plan;

#[derive(Debug, Clone, Default)]
pub struct Attitude {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub heading: f64,
}

/// The resolver's most recent maneuver output, held here so the autopilot
/// bridge can read it independently of the resolver call that produced it.
#[derive(Debug, Clone, Default)]
pub struct ManeuverCommand {
    pub vn: f64,
    pub ve: f64,
    pub vu: f64,
    pub heading: f64,
}

#[derive(Debug, Default)]
struct Inner {
    attitude: Attitude,
    cross_track_deviation: f64,
    cross_track_offset: f64,
    maneuver: ManeuverCommand,
    next_mission_wp: usize,
    next_resolution_wp: usize,
    mission_plan: Plan,
    resolution_plan: Plan,
    fence_list: Vec<Geofence>,
    traffic_list: Vec<TrafficState>,
    start_mission: bool,
}

/// Shared, cloneable handle onto one aircraft's flight state. Clones share
/// the same underlying lock, matching the original's single `AircraftData_t`
/// instance reached from multiple threads (MAVLink receive, FMS tick,
/// ground-station interface).
#[derive(Debug, Clone, Default)]
pub struct FlightData {
    inner: Arc<Mutex<Inner>>,
}

impl FlightData {
    pub fn new(mission_plan: Plan) -> Self {
        FlightData {
            inner: Arc::new(Mutex::new(Inner { mission_plan, ..Default::default() })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn attitude(&self) -> Attitude {
        self.lock().attitude.clone()
    }

    pub fn set_attitude(&self, attitude: Attitude) {
        self.lock().attitude = attitude;
    }

    pub fn cross_track_deviation(&self) -> f64 {
        self.lock().cross_track_deviation
    }

    pub fn set_cross_track(&self, deviation: f64, offset: f64) {
        let mut inner = self.lock();
        inner.cross_track_deviation = deviation;
        inner.cross_track_offset = offset;
    }

    pub fn maneuver(&self) -> ManeuverCommand {
        self.lock().maneuver.clone()
    }

    pub fn set_maneuver(&self, cmd: ManeuverCommand) {
        self.lock().maneuver = cmd;
    }

    pub fn next_mission_wp(&self) -> usize {
        self.lock().next_mission_wp
    }

    pub fn set_next_mission_wp(&self, idx: usize) {
        self.lock().next_mission_wp = idx;
    }

    pub fn advance_mission_wp(&self) {
        self.lock().next_mission_wp += 1;
    }

    pub fn next_resolution_wp(&self) -> usize {
        self.lock().next_resolution_wp
    }

    pub fn set_next_resolution_wp(&self, idx: usize) {
        self.lock().next_resolution_wp = idx;
    }

    pub fn advance_resolution_wp(&self) {
        self.lock().next_resolution_wp += 1;
    }

    pub fn mission_plan(&self) -> Plan {
        self.lock().mission_plan.clone()
    }

    pub fn set_mission_plan(&self, plan: Plan) {
        let mut inner = self.lock();
        inner.mission_plan = plan;
        inner.next_mission_wp = 0;
    }

    pub fn resolution_plan(&self) -> Plan {
        self.lock().resolution_plan.clone()
    }

    pub fn set_resolution_plan(&self, plan: Plan) {
        let mut inner = self.lock();
        inner.resolution_plan = plan;
        inner.next_resolution_wp = 0;
    }

    pub fn fences(&self) -> Vec<Geofence> {
        self.lock().fence_list.clone()
    }

    pub fn set_fences(&self, fences: Vec<Geofence>) {
        self.lock().fence_list = fences;
    }

    pub fn add_fence(&self, fence: Geofence) {
        self.lock().fence_list.push(fence);
    }

    pub fn remove_fence(&self, id: u32) {
        self.lock().fence_list.retain(|f| f.id != id);
    }

    pub fn traffic(&self) -> Vec<TrafficState> {
        self.lock().traffic_list.clone()
    }

    pub fn set_traffic(&self, traffic: Vec<TrafficState>) {
        self.lock().traffic_list = traffic;
    }

    pub fn upsert_traffic(&self, id: impl Into<String>, position: Vect3, velocity: crate::geo::Velocity) {
        let id = id.into();
        let mut inner = self.lock();
        if let Some(existing) = inner.traffic_list.iter_mut().find(|t| t.id == id) {
            existing.s = position;
            existing.v = velocity;
        } else {
            inner.traffic_list.push(TrafficState { id, position: crate::geo::Position::new(0.0, 0.0, 0.0), s: position, v: velocity });
        }
    }

    pub fn start_mission_requested(&self) -> bool {
        self.lock().start_mission
    }

    pub fn request_start_mission(&self, flag: bool) {
        self.lock().start_mission = flag;
    }
}
