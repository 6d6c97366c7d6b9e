//! Abstract bridge to the vehicle's autopilot / ground-station link
//! (spec §6). The wire encoding of these messages is out of scope here —
//! `wire.rs` covers the plan-interpreter bridge's own framing separately —
//! this module only fixes the message shapes and the trait a concrete
//! transport (MAVLink, a simulator, a test double) implements.

use serde::{Deserialize, Serialize};

use crate::bands::region::BandsRegion;
use crate::flight_data::{Attitude, ManeuverCommand};
use crate::geo::{Position, Velocity};

/// Inbound telemetry the autopilot bridge delivers into `FlightData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InboundMessage {
    Position { position: Position, velocity: Velocity },
    Attitude(Attitude),
    WaypointReached { index: usize },
    CommandAck { command_id: u32, accepted: bool },
}

/// Outbound commands the FMS issues to the autopilot. Each variant carries
/// the numeric `command_id` the caller must match against a later
/// `CommandAck` to confirm the autopilot actually executed it, mirroring
/// the original's `COMMAND_ACK` handshake.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OutboundCommand {
    Arm { command_id: u32, arm: bool },
    Takeoff { command_id: u32, climb_to_m: f64 },
    SetMode { command_id: u32, mode: AutopilotMode },
    GotoWaypoint { command_id: u32, index: usize },
    SetVelocity { command_id: u32, vn: f64, ve: f64, vu: f64 },
    SetYaw { command_id: u32, heading: f64 },
    SetSpeed { command_id: u32, speed: f64 },
    Land { command_id: u32 },
}

impl OutboundCommand {
    pub fn command_id(&self) -> u32 {
        match *self {
            OutboundCommand::Arm { command_id, .. }
            | OutboundCommand::Takeoff { command_id, .. }
            | OutboundCommand::SetMode { command_id, .. }
            | OutboundCommand::GotoWaypoint { command_id, .. }
            | OutboundCommand::SetVelocity { command_id, .. }
            | OutboundCommand::SetYaw { command_id, .. }
            | OutboundCommand::SetSpeed { command_id, .. }
            | OutboundCommand::Land { command_id } => command_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutopilotMode {
    Manual,
    Guided,
    Auto,
    Land,
}

/// Trait a concrete link implements; the FMS only ever talks to this
/// trait, never to a transport directly, so a simulator and a real
/// MAVLink/serial bridge are interchangeable in tests.
pub trait AutopilotBridge {
    /// Drains any telemetry received since the last call. Never blocks —
    /// the FMS thread must not stall on the link (spec §5).
    fn poll_inbound(&mut self) -> Vec<InboundMessage>;

    /// Enqueues a command for transmission; returns immediately.
    fn send_command(&mut self, command: OutboundCommand);

    /// Converts a `ManeuverCommand` into the matching velocity-setpoint
    /// outbound command, tagging it with `command_id`.
    fn maneuver_command(&self, command_id: u32, maneuver: &ManeuverCommand) -> OutboundCommand {
        OutboundCommand::SetVelocity {
            command_id,
            vn: maneuver.vn,
            ve: maneuver.ve,
            vu: maneuver.vu,
        }
    }
}

/// Up to 5 coloured intervals per dimension, the summary form the ground
/// station actually renders rather than the full internal `IntervalSet`.
/// Grounded on the original's `mavlink_kinematic_bands_t` packing, which
/// caps each dimension at 5 ranges and drops the remainder.
pub const MAX_VISUALIZATION_RANGES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualizationRange {
    pub low: f64,
    pub high: f64,
    pub region: BandsRegion,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisualizationBands {
    pub trk: Vec<VisualizationRange>,
    pub gs: Vec<VisualizationRange>,
    pub vs: Vec<VisualizationRange>,
    pub alt: Vec<VisualizationRange>,
}

impl VisualizationBands {
    /// True only when every dimension has at most one range and that
    /// range is `BandsRegion::None` — the "nothing to show" case the FMS
    /// uses to suppress a visualization message entirely rather than
    /// sending an all-clear packet every tick.
    pub fn is_all_clear(&self) -> bool {
        [&self.trk, &self.gs, &self.vs, &self.alt]
            .iter()
            .all(|ranges| ranges.len() <= 1 && ranges.iter().all(|r| r.region == BandsRegion::None))
    }
}

pub(crate) fn truncate_ranges(mut ranges: Vec<VisualizationRange>) -> Vec<VisualizationRange> {
    ranges.truncate(MAX_VISUALIZATION_RANGES);
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullBridge {
        sent: Vec<OutboundCommand>,
    }

    impl AutopilotBridge for NullBridge {
        fn poll_inbound(&mut self) -> Vec<InboundMessage> {
            Vec::new()
        }

        fn send_command(&mut self, command: OutboundCommand) {
            self.sent.push(command);
        }
    }

    #[test]
    fn maneuver_command_carries_through_components() {
        let bridge = NullBridge { sent: Vec::new() };
        let maneuver = ManeuverCommand { vn: 1.0, ve: 2.0, vu: 3.0, heading: 0.5 };
        let cmd = bridge.maneuver_command(7, &maneuver);
        match cmd {
            OutboundCommand::SetVelocity { command_id, vn, ve, vu } => {
                assert_eq!(command_id, 7);
                assert_eq!((vn, ve, vu), (1.0, 2.0, 3.0));
            }
            _ => panic!("expected SetVelocity"),
        }
    }

    #[test]
    fn command_id_extracts_from_every_variant() {
        assert_eq!(OutboundCommand::Land { command_id: 42 }.command_id(), 42);
        assert_eq!(OutboundCommand::Arm { command_id: 9, arm: true }.command_id(), 9);
    }

    #[test]
    fn all_clear_detection() {
        let clear = VisualizationBands::default();
        assert!(clear.is_all_clear());

        let mut conflicted = VisualizationBands::default();
        conflicted.trk.push(VisualizationRange { low: 0.0, high: 1.0, region: BandsRegion::Near });
        assert!(!conflicted.is_all_clear());
    }

    #[test]
    fn truncate_ranges_caps_at_five() {
        let ranges: Vec<_> = (0..8).map(|i| VisualizationRange { low: i as f64, high: i as f64 + 1.0, region: BandsRegion::None }).collect();
        assert_eq!(truncate_ranges(ranges).len(), MAX_VISUALIZATION_RANGES);
    }
}
