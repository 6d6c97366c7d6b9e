use serde::{Deserialize, Serialize};

use crate::detector::{CylinderDetector, Detector, TcasDetector};

use super::region::BandsRegion;

/// The detector kinds an `AlertThresholds` can carry. A `Box<dyn Detector>`
/// field would make `AlertThresholds` impossible to derive `Serialize`/
/// `Deserialize` for, so this is a closed enum of the two concrete volumes
/// spec §4.2/C2 names (cylinder, TCAS table) instead — both are plain data
/// and serialize directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DetectorKind {
    Cylinder(CylinderDetector),
    Tcas(TcasDetector),
}

impl DetectorKind {
    pub fn boxed(&self) -> Box<dyn Detector> {
        match self {
            DetectorKind::Cylinder(d) => d.copy(),
            DetectorKind::Tcas(d) => d.copy(),
        }
    }
}

impl From<CylinderDetector> for DetectorKind {
    fn from(d: CylinderDetector) -> Self {
        DetectorKind::Cylinder(d)
    }
}

impl From<TcasDetector> for DetectorKind {
    fn from(d: TcasDetector) -> Self {
        DetectorKind::Tcas(d)
    }
}

/// One alert level's detector, timing, and per-dimension spread.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub detector: DetectorKind,
    pub alerting_time: f64,
    pub early_alerting_time: f64,
    pub region: BandsRegion,
    pub spread_trk: f64,
    pub spread_gs: f64,
    pub spread_vs: f64,
    pub spread_alt: f64,
}

impl AlertThresholds {
    pub fn new(
        detector: impl Into<DetectorKind>,
        alerting_time: f64,
        early_alerting_time: f64,
        region: BandsRegion,
    ) -> Self {
        AlertThresholds {
            detector: detector.into(),
            alerting_time,
            early_alerting_time: early_alerting_time.max(alerting_time),
            region,
            spread_trk: 0.0,
            spread_gs: 0.0,
            spread_vs: 0.0,
            spread_alt: 0.0,
        }
    }

    pub fn with_spreads(mut self, spread_trk: f64, spread_gs: f64, spread_vs: f64, spread_alt: f64) -> Self {
        self.spread_trk = spread_trk.min(std::f64::consts::PI);
        self.spread_gs = spread_gs;
        self.spread_vs = spread_vs;
        self.spread_alt = spread_alt;
        self
    }

    pub fn boxed_detector(&self) -> Box<dyn Detector> {
        self.detector.boxed()
    }
}

/// Ordered list of `AlertThresholds`, level 1 = most urgent. Region labels
/// coarsen the severity ordering so multiple levels can share a color.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alertor {
    levels: Vec<AlertThresholds>,
}

impl Alertor {
    pub fn new(levels: Vec<AlertThresholds>) -> Self {
        Alertor { levels }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Levels are 1-indexed, matching the original's 1..=N convention.
    pub fn level(&self, level: usize) -> Option<&AlertThresholds> {
        level.checked_sub(1).and_then(|i| self.levels.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &AlertThresholds)> {
        self.levels.iter().enumerate().map(|(i, t)| (i + 1, t))
    }

    /// A reasonable default alertor: a single NEAR-level cylinder detector
    /// with the recovery-bands collision-avoidance volume implicit in the
    /// core's own `ca_factor` shrink, not duplicated here.
    pub fn default_single_level(radius_m: f64, half_height_m: f64, alerting_time: f64) -> Self {
        Alertor::new(vec![AlertThresholds::new(
            CylinderDetector::new(radius_m, half_height_m),
            alerting_time,
            alerting_time * 1.5,
            BandsRegion::Near,
        )
        .with_spreads(
            30f64.to_radians(),
            10.0,
            2.0,
            100.0,
        )])
    }

    /// Same single-NEAR-level shape as `default_single_level`, but backed by
    /// the TCAS sensitivity-level table (spec §4.2's second volume type)
    /// pinned to the ownship's current altitude, instead of a fixed cylinder.
    pub fn default_tcas_level(alt_msl: f64, alerting_time: f64) -> Self {
        Alertor::new(vec![AlertThresholds::new(
            TcasDetector::new(alt_msl),
            alerting_time,
            alerting_time * 1.5,
            BandsRegion::Near,
        )
        .with_spreads(
            30f64.to_radians(),
            10.0,
            2.0,
            100.0,
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_is_one_indexed() {
        let a = Alertor::default_single_level(500.0, 100.0, 60.0);
        assert!(a.level(0).is_none());
        assert!(a.level(1).is_some());
        assert!(a.level(2).is_none());
    }

    #[test]
    fn early_alerting_time_is_never_below_alerting_time() {
        let t = AlertThresholds::new(CylinderDetector::new(500.0, 100.0), 60.0, 10.0, BandsRegion::Near);
        assert!(t.early_alerting_time >= t.alerting_time);
    }

    #[test]
    fn tcas_backed_alertor_is_reachable_through_boxed_detector() {
        let a = Alertor::default_tcas_level(5000.0, 60.0);
        let thresholds = a.level(1).unwrap();
        assert_eq!(thresholds.detector, DetectorKind::Tcas(TcasDetector::new(5000.0)));
        assert_eq!(thresholds.boxed_detector().identifier(), "tcas");
    }

    #[test]
    fn spread_trk_is_clamped_to_pi() {
        let t = AlertThresholds::new(CylinderDetector::new(500.0, 100.0), 60.0, 60.0, BandsRegion::Near)
            .with_spreads(10.0, 0.0, 0.0, 0.0);
        assert!(t.spread_trk <= std::f64::consts::PI);
    }
}
