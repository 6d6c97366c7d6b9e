use serde::{Deserialize, Serialize};

use super::interval::Interval;

/// Severity coloring of a maneuver-range interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BandsRegion {
    /// No predicted conflict within the lookahead horizon.
    None,
    Far,
    Mid,
    Near,
    /// Conflict so imminent the search could not clear it; only present
    /// while `collision_avoidance_bands` is enabled.
    Recovery,
    /// A detector invariant failed; this dimension's bands cannot be
    /// trusted until re-parameterized.
    Unknown,
}

impl BandsRegion {
    pub fn is_conflict_region(&self) -> bool {
        !matches!(self, BandsRegion::None)
    }
}

/// An interval tagged with its severity region. Adjacent ranges with the
/// same region are intentionally not merged; region transitions are the
/// band structure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandsRange {
    pub interval: Interval,
    pub region: BandsRegion,
}

impl BandsRange {
    pub fn new(interval: Interval, region: BandsRegion) -> Self {
        BandsRange { interval, region }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_reflects_severity() {
        assert!(BandsRegion::None < BandsRegion::Far);
        assert!(BandsRegion::Near < BandsRegion::Recovery);
    }

    #[test]
    fn none_is_not_a_conflict_region() {
        assert!(!BandsRegion::None.is_conflict_region());
        assert!(BandsRegion::Near.is_conflict_region());
    }
}
