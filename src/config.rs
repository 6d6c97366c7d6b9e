//! `KinematicBandsParameters` (spec §3) and the key-value parameter loader.
//!
//! The original ICAROUS core reads these from a `params/*.txt` file via a
//! `ParameterData` table; file I/O is out of scope here (spec §1/§6), so
//! this module only covers the typed mapping from an already-read
//! `HashMap<String, String>`, never touching `std::fs` itself.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::bands::alt::AltBands;
use crate::bands::gs::{new_gs_bands, GsBands};
use crate::bands::trk::{new_trk_bands, TrkBands};
use crate::bands::vs::{new_vs_bands, VsBands};
use crate::bands::MultiBands;
use crate::error::DaaError;

/// Immutable configuration for one `MultiBands` instance. Recognized keys
/// match spec §3 exactly; a parameter file with unrecognized keys is
/// accepted and the extras are ignored (spec §6 "Persisted state").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicBandsParameters {
    pub lookahead_time: f64,
    pub left_trk: f64,
    pub right_trk: f64,
    pub min_gs: f64,
    pub max_gs: f64,
    pub min_vs: f64,
    pub max_vs: f64,
    pub min_alt: f64,
    pub max_alt: f64,
    pub trk_step: f64,
    pub gs_step: f64,
    pub vs_step: f64,
    pub alt_step: f64,
    pub horizontal_accel: f64,
    pub vertical_accel: f64,
    /// Exactly one of `turn_rate`/`bank_angle` should be nonzero; `trk.rs`'s
    /// generator already prefers `turn_rate` when both are set.
    pub turn_rate: f64,
    pub bank_angle: f64,
    pub vertical_rate: f64,
    pub recovery_stability_time: f64,
    pub min_horizontal_recovery: f64,
    pub min_vertical_recovery: f64,
    pub horizontal_nmac: f64,
    pub vertical_nmac: f64,
    pub ca_factor: f64,
    pub collision_avoidance_bands: bool,
    pub recovery_trk_bands: bool,
    pub recovery_gs_bands: bool,
    pub recovery_vs_bands: bool,
    pub recovery_alt_bands: bool,
    pub conflict_criteria: bool,
    pub recovery_criteria: bool,
}

impl Default for KinematicBandsParameters {
    fn default() -> Self {
        KinematicBandsParameters {
            lookahead_time: 60.0,
            left_trk: std::f64::consts::PI,
            right_trk: std::f64::consts::PI,
            min_gs: 1.0,
            max_gs: 30.0,
            min_vs: -10.0,
            max_vs: 10.0,
            min_alt: 0.0,
            max_alt: 1000.0,
            trk_step: 5f64.to_radians(),
            gs_step: 1.0,
            vs_step: 0.5,
            alt_step: 50.0,
            horizontal_accel: 1.0,
            vertical_accel: 1.0,
            turn_rate: 0.0,
            bank_angle: 0.3,
            vertical_rate: 5.0,
            recovery_stability_time: 10.0,
            min_horizontal_recovery: 500.0,
            min_vertical_recovery: 100.0,
            horizontal_nmac: 150.0,
            vertical_nmac: 30.0,
            ca_factor: 0.2,
            collision_avoidance_bands: false,
            recovery_trk_bands: true,
            recovery_gs_bands: true,
            recovery_vs_bands: true,
            recovery_alt_bands: true,
            conflict_criteria: true,
            recovery_criteria: true,
        }
    }
}

impl KinematicBandsParameters {
    /// Builds the four `RealBands`/`AltBands` dimensions this configuration
    /// describes, ready to hand to a fresh `MultiBands`.
    pub fn build_multi_bands(&self) -> MultiBands {
        let trk: TrkBands = new_trk_bands(
            self.turn_rate,
            self.bank_angle,
            self.trk_step,
            self.left_trk,
            self.right_trk,
            self.recovery_trk_bands,
            self.recovery_stability_time,
            self.lookahead_time,
        );
        let gs: GsBands = new_gs_bands(
            self.horizontal_accel,
            self.min_gs,
            self.max_gs,
            self.gs_step,
            self.recovery_gs_bands,
            self.recovery_stability_time,
            self.lookahead_time,
        );
        let vs: VsBands = new_vs_bands(
            self.vertical_accel,
            self.min_vs,
            self.max_vs,
            self.vs_step,
            self.recovery_vs_bands,
            self.recovery_stability_time,
            self.lookahead_time,
        );
        let alt = AltBands::new(
            self.min_alt,
            self.max_alt,
            self.alt_step,
            self.vertical_rate,
            self.vertical_accel,
            self.recovery_alt_bands,
            self.recovery_stability_time,
            self.lookahead_time,
        );
        MultiBands::new(trk, gs, vs, alt)
    }

    /// Overlays recognized keys from `table` onto `self`, leaving
    /// unrecognized keys untouched (ignored, not an error) and failing only
    /// when a recognized key's value can't parse as the expected type.
    pub fn apply_overrides(mut self, table: &HashMap<String, String>) -> Result<Self, DaaError> {
        macro_rules! set_f64 {
            ($key:literal, $field:ident) => {
                if let Some(raw) = table.get($key) {
                    self.$field = parse_f64($key, raw)?;
                }
            };
        }
        macro_rules! set_bool {
            ($key:literal, $field:ident) => {
                if let Some(raw) = table.get($key) {
                    self.$field = parse_bool($key, raw)?;
                }
            };
        }

        set_f64!("lookahead_time", lookahead_time);
        set_f64!("left_trk", left_trk);
        set_f64!("right_trk", right_trk);
        set_f64!("min_gs", min_gs);
        set_f64!("max_gs", max_gs);
        set_f64!("min_vs", min_vs);
        set_f64!("max_vs", max_vs);
        set_f64!("min_alt", min_alt);
        set_f64!("max_alt", max_alt);
        set_f64!("trk_step", trk_step);
        set_f64!("gs_step", gs_step);
        set_f64!("vs_step", vs_step);
        set_f64!("alt_step", alt_step);
        set_f64!("horizontal_accel", horizontal_accel);
        set_f64!("vertical_accel", vertical_accel);
        set_f64!("turn_rate", turn_rate);
        set_f64!("bank_angle", bank_angle);
        set_f64!("vertical_rate", vertical_rate);
        set_f64!("recovery_stability_time", recovery_stability_time);
        set_f64!("min_horizontal_recovery", min_horizontal_recovery);
        set_f64!("min_vertical_recovery", min_vertical_recovery);
        set_f64!("horizontal_nmac", horizontal_nmac);
        set_f64!("vertical_nmac", vertical_nmac);
        set_f64!("ca_factor", ca_factor);
        set_bool!("collision_avoidance_bands", collision_avoidance_bands);
        set_bool!("recovery_trk_bands", recovery_trk_bands);
        set_bool!("recovery_gs_bands", recovery_gs_bands);
        set_bool!("recovery_vs_bands", recovery_vs_bands);
        set_bool!("recovery_alt_bands", recovery_alt_bands);
        set_bool!("conflict_criteria", conflict_criteria);
        set_bool!("recovery_criteria", recovery_criteria);

        self.validate()
    }

    /// Invariants from spec §3: `alerting_time`-adjacent bounds live on
    /// `AlertThresholds`, not here, but the bounds this struct owns
    /// (non-negative lookahead, ordered min/max pairs, spread_trk ≤ π via
    /// `left_trk`/`right_trk`) are checked eagerly so a bad parameter file
    /// is rejected at load time rather than surfacing as a silent empty
    /// band later.
    fn validate(self) -> Result<Self, DaaError> {
        if self.lookahead_time < 0.0 {
            return Err(DaaError::InvalidInput("lookahead_time must be non-negative".into()));
        }
        if self.min_gs > self.max_gs || self.min_vs > self.max_vs || self.min_alt > self.max_alt {
            return Err(DaaError::InvalidInput("min/max bound is inverted".into()));
        }
        if !(0.0..=1.0).contains(&self.ca_factor) || self.ca_factor <= 0.0 {
            return Err(DaaError::InvalidInput("ca_factor must be in (0, 1]".into()));
        }
        Ok(self)
    }
}

fn parse_f64(key: &str, raw: &str) -> Result<f64, DaaError> {
    raw.parse::<f64>().map_err(|_| DaaError::InvalidInput(format!("{key}: cannot parse {raw:?} as a number")))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, DaaError> {
    match raw {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(DaaError::InvalidInput(format!("{key}: cannot parse {raw:?} as a bool"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_keys_are_ignored() {
        let mut table = HashMap::new();
        table.insert("min_gs".to_string(), "2.0".to_string());
        table.insert("some_future_param".to_string(), "whatever".to_string());
        let params = KinematicBandsParameters::default().apply_overrides(&table).unwrap();
        assert_eq!(params.min_gs, 2.0);
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let mut table = HashMap::new();
        table.insert("min_gs".to_string(), "50.0".to_string());
        table.insert("max_gs".to_string(), "10.0".to_string());
        let err = KinematicBandsParameters::default().apply_overrides(&table).unwrap_err();
        assert!(matches!(err, DaaError::InvalidInput(_)));
    }

    #[test]
    fn malformed_numeric_value_is_rejected() {
        let mut table = HashMap::new();
        table.insert("lookahead_time".to_string(), "not-a-number".to_string());
        let err = KinematicBandsParameters::default().apply_overrides(&table).unwrap_err();
        assert!(matches!(err, DaaError::InvalidInput(_)));
    }

    #[test]
    fn build_multi_bands_produces_a_usable_engine() {
        let params = KinematicBandsParameters::default();
        let multi = params.build_multi_bands();
        assert_eq!(multi.length(crate::bands::Dimension::Track), -1);
    }
}
