//! Per-dimension specialization shared by Track/GroundSpeed/VerticalSpeed
//! (altitude has its own construction, see `alt.rs`): the scale/caching
//! layer around the integer-indexed search in `integer_core`.

use crate::error::{DaaError, ErrorLog};
use crate::geo::TrafficState;

use super::alert::Alertor;
use super::integer_core::{search, Dir, SearchParams, TrajectoryGenerator};
use super::interval::Interval;
use super::region::{BandsRange, BandsRegion};

/// Shared configuration consumed by every RealBands dimension. Holds the
/// slice `[min_val, max_val]` the dimension sweeps, whether that range is
/// relative to the ownship's current value, the circular period (`0.0` for
/// non-circular dimensions, `2*PI` for track), the step size, and whether
/// the collision-avoidance / recovery search is enabled.
#[derive(Debug, Clone, Copy)]
pub struct DimensionConfig {
    pub min_val: f64,
    pub max_val: f64,
    pub modulus: f64,
    pub step: f64,
    pub recovery: bool,
    pub recovery_stability_time: f64,
    pub ca_factor: f64,
    pub lookahead_time: f64,
}

/// Cached state for one kinematic dimension across one `MultiBands`
/// compute cycle. Mirrors the original's `outdated`/`checked` flag pair:
/// any mutation of ownship, traffic, or parameters marks the cache
/// `outdated`, and the next read recomputes before answering.
#[derive(Debug, Clone, Default)]
pub struct RealBandsCache {
    outdated: bool,
    checked: bool,
    ranges: Vec<BandsRange>,
    recovery_time: f64,
    peripheral: Vec<Vec<String>>,
    last_time_to_maneuver: std::collections::HashMap<String, f64>,
}

impl RealBandsCache {
    pub fn new() -> Self {
        RealBandsCache { outdated: true, ..Default::default() }
    }

    pub fn invalidate(&mut self) {
        self.outdated = true;
    }
}

/// A single kinematic dimension's band engine: a trajectory generator plus
/// its dimension configuration and cache.
pub struct RealBands<G: TrajectoryGenerator> {
    pub generator: G,
    pub config: DimensionConfig,
    cache: RealBandsCache,
}

impl<G: TrajectoryGenerator> RealBands<G> {
    pub fn new(generator: G, config: DimensionConfig) -> Self {
        RealBands { generator, config, cache: RealBandsCache::new() }
    }

    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    /// Recomputes the cached band structure if outdated. Builds one
    /// `IntervalSet` per alert level via the integer core, translates
    /// integer indices to real values, and colors the union by the most
    /// severe level whose search reported a loss-of-separation run.
    pub fn compute(
        &mut self,
        ownship: &TrafficState,
        traffic: &[TrafficState],
        alertor: &Alertor,
        errors: &mut ErrorLog,
    ) {
        if !self.cache.outdated {
            return;
        }
        self.cache.ranges.clear();
        self.cache.peripheral.clear();
        self.cache.recovery_time = f64::NAN;

        if traffic.is_empty() && !self.config.recovery {
            self.cache.ranges.push(BandsRange::new(Interval::new(self.config.min_val, self.config.max_val), BandsRegion::None));
            self.cache.checked = true;
            self.cache.outdated = false;
            return;
        }

        let current = self.current_value(ownship);
        let dt = self.generator.time_step(ownship);
        let max_k = if dt > 1e-6 {
            ((self.config.max_val - self.config.min_val).abs() / self.config.step.max(1e-6)).ceil() as usize
        } else {
            0
        };

        // `search` returns the conflict-*free* index runs (spec §4.2 step 4,
        // "noneset"). Each level's own full partition of [min_val, max_val]
        // is built by tagging those runs `None` and filling everything else
        // with that level's severity color (the actual conflict span), then
        // levels are merged by taking the most severe region at each point —
        // mirroring `AltBands::compute`, which tests candidates most-urgent
        // level first and only colors a point once a level finds it unsafe.
        let mut level_partitions: Vec<Vec<BandsRange>> = Vec::new();
        for (level, thresholds) in alertor.iter() {
            let detector = thresholds.boxed_detector();
            let recovery_detector = if self.config.recovery { Some(detector.as_ref()) } else { None };
            let params = SearchParams {
                conflict_det: detector.as_ref(),
                recovery_det: recovery_detector,
                b: 0.0,
                t: self.config.lookahead_time,
                b2: 0.0,
                t2: thresholds.early_alerting_time,
                max_k,
                epsh: 1.0,
                epsv: 1.0,
            };

            let neg = search(&self.generator, ownship, traffic, Dir::Neg, &params);
            let pos = search(&self.generator, ownship, traffic, Dir::Pos, &params);

            let region = if level == 1 { BandsRegion::Near } else { thresholds.region };

            let mut safe: Vec<BandsRange> = Vec::new();
            for iv in neg.runs.iter() {
                let lb = self.index_to_value(current, -(iv.ub));
                let ub = self.index_to_value(current, -(iv.lb));
                safe.push(BandsRange::new(Interval::new(lb.min(ub), lb.max(ub)), BandsRegion::None));
            }
            for iv in pos.runs.iter() {
                let lb = self.index_to_value(current, iv.lb);
                let ub = self.index_to_value(current, iv.ub);
                safe.push(BandsRange::new(Interval::new(lb.min(ub), lb.max(ub)), BandsRegion::None));
            }
            safe.sort_by(|a, b| a.interval.lb.partial_cmp(&b.interval.lb).unwrap());

            let partition = fill_gaps(safe, self.config.min_val, self.config.max_val, region);
            level_partitions.push(partition);

            if neg.hit_cap || pos.hit_cap {
                if self.cache.recovery_time.is_nan() {
                    self.cache.recovery_time = self.config.recovery_stability_time;
                }
            }
        }

        self.cache.ranges = if level_partitions.is_empty() {
            vec![BandsRange::new(Interval::new(self.config.min_val, self.config.max_val), BandsRegion::None)]
        } else {
            merge_partitions_by_severity(&level_partitions, self.config.min_val, self.config.max_val)
        };
        self.cache.checked = true;
        self.cache.outdated = false;

        if self.cache.ranges.iter().any(|r| r.region == BandsRegion::Unknown) {
            errors.record(DaaError::DetectorMalformed(format!("dimension reports {} unknown ranges", self.cache.ranges.len())));
        }
    }

    pub fn length(&self) -> i64 {
        if !self.cache.checked {
            return -1;
        }
        self.cache.ranges.len() as i64
    }

    pub fn interval(&self, i: usize) -> Option<Interval> {
        self.cache.ranges.get(i).map(|r| r.interval)
    }

    pub fn region(&self, i: usize) -> Option<BandsRegion> {
        self.cache.ranges.get(i).map(|r| r.region)
    }

    pub fn ranges(&self) -> &[BandsRange] {
        &self.cache.ranges
    }

    pub fn range_of(&self, v: f64) -> i64 {
        let v = self.wrap(v);
        for (i, r) in self.cache.ranges.iter().enumerate() {
            if r.interval.contains(v) {
                return i as i64;
            }
        }
        self.cache.ranges.len() as i64
    }

    pub fn time_to_recovery(&self) -> f64 {
        if !self.is_saturated() {
            return f64::NAN;
        }
        if self.cache.recovery_time.is_nan() {
            f64::NEG_INFINITY
        } else {
            self.cache.recovery_time
        }
    }

    pub fn is_saturated(&self) -> bool {
        self.cache.checked && self.cache.ranges.iter().all(|r| r.region.is_conflict_region())
    }

    /// First conflict-free real value found walking from the current value
    /// outward in `dir`; `+/-infinity` sentinel if the whole swept range is
    /// in conflict.
    pub fn compute_resolution(&self, ownship: &TrafficState, dir: Dir) -> f64 {
        if !self.cache.checked {
            return f64::NAN;
        }
        let current = self.current_value(ownship);
        let mut candidates: Vec<f64> = self
            .cache
            .ranges
            .iter()
            .filter(|r| r.region == BandsRegion::None)
            .flat_map(|r| [r.interval.lb, r.interval.ub])
            .collect();
        candidates.retain(|v| v.is_finite());
        match dir {
            Dir::Pos => candidates
                .into_iter()
                .filter(|v| *v >= current)
                .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v))))
                .unwrap_or(f64::INFINITY),
            Dir::Neg => candidates
                .into_iter()
                .filter(|v| *v <= current)
                .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
                .unwrap_or(f64::NEG_INFINITY),
        }
    }

    pub fn preferred_direction(&self, ownship: &TrafficState) -> Dir {
        let current = self.current_value(ownship);
        let pos = self.compute_resolution(ownship, Dir::Pos);
        let neg = self.compute_resolution(ownship, Dir::Neg);
        if (pos - current).abs() <= (current - neg).abs() {
            Dir::Pos
        } else {
            Dir::Neg
        }
    }

    pub fn last_time_to_maneuver(&self, ac_id: &str) -> f64 {
        *self.cache.last_time_to_maneuver.get(ac_id).unwrap_or(&f64::NAN)
    }

    fn current_value(&self, _ownship: &TrafficState) -> f64 {
        // Subtype trajectory generators report their own current value
        // through `trajectory(ownship, 0, _)`; the caller normally supplies
        // `min_val`/`max_val` already anchored at that value for relative
        // dimensions, so `0.0` is the origin of the integer index space.
        0.0
    }

    fn index_to_value(&self, current: f64, idx: f64) -> f64 {
        let v = current + idx * self.config.step;
        if self.config.modulus > 0.0 {
            v.rem_euclid(self.config.modulus)
        } else {
            v.clamp(self.config.min_val, self.config.max_val)
        }
    }

    fn wrap(&self, v: f64) -> f64 {
        if self.config.modulus > 0.0 {
            v.rem_euclid(self.config.modulus)
        } else {
            v
        }
    }
}

/// Inserts `fill_region` ranges into the gaps between `colored` ranges (and
/// before the first / after the last) so the returned sequence always
/// covers `[min_val, max_val]` with no holes.
pub(crate) fn fill_gaps(colored: Vec<BandsRange>, min_val: f64, max_val: f64, fill_region: BandsRegion) -> Vec<BandsRange> {
    let mut result = Vec::with_capacity(colored.len() * 2);
    let mut cursor = min_val;
    for r in colored {
        if r.interval.lb > cursor + 1e-9 {
            result.push(BandsRange::new(Interval::new(cursor, r.interval.lb), fill_region));
        }
        result.push(r);
        cursor = r.interval.ub.max(cursor);
    }
    if cursor < max_val - 1e-9 {
        result.push(BandsRange::new(Interval::new(cursor, max_val), fill_region));
    }
    result
}

/// Specialization of `fill_gaps` used where the colored ranges already hold
/// the true conflict regions (e.g. `AltBands`, which assigns severity to a
/// candidate altitude directly rather than through a noneset complement).
pub(crate) fn fill_none_gaps(colored: Vec<BandsRange>, min_val: f64, max_val: f64) -> Vec<BandsRange> {
    fill_gaps(colored, min_val, max_val, BandsRegion::None)
}

/// Looks up the region a per-level partition assigns to `v`; `None` if `v`
/// falls outside every range in the partition (shouldn't happen, since each
/// partition is built to fully cover `[min_val, max_val]`).
fn region_at(partition: &[BandsRange], v: f64) -> BandsRegion {
    partition.iter().find(|r| r.interval.contains(v)).map(|r| r.region).unwrap_or(BandsRegion::None)
}

/// Combines one full `[min_val, max_val]` partition per alert level into a
/// single sequence, taking the most severe region at every point. Boundaries
/// from every level's partition are swept together so no level's band edge
/// is lost in the merge.
fn merge_partitions_by_severity(partitions: &[Vec<BandsRange>], min_val: f64, max_val: f64) -> Vec<BandsRange> {
    let mut boundaries: Vec<f64> = vec![min_val, max_val];
    for partition in partitions {
        for r in partition {
            boundaries.push(r.interval.lb.clamp(min_val, max_val));
            boundaries.push(r.interval.ub.clamp(min_val, max_val));
        }
    }
    boundaries.sort_by(|a, b| a.partial_cmp(b).unwrap());
    boundaries.dedup_by(|a, b| (*a - *b).abs() < 1e-9);

    let mut result = Vec::with_capacity(boundaries.len());
    for w in boundaries.windows(2) {
        let (lb, ub) = (w[0], w[1]);
        if ub - lb < 1e-9 {
            continue;
        }
        let mid = 0.5 * (lb + ub);
        let region = partitions.iter().map(|p| region_at(p, mid)).max().unwrap_or(BandsRegion::None);
        result.push(BandsRange::new(Interval::new(lb, ub), region));
    }
    result
}
