//! Crate-wide error taxonomy and the per-component error log.
//!
//! Most failure modes described here are advisory, not exceptional: a
//! saturated band, a timed-out planner, and an out-of-range parameter are
//! all routine operating conditions for a DAA system and are reported as
//! sentinel values alongside a log entry, never as a propagated `Err` that
//! would abort a tick. `DaaError` exists for the smaller set of calls that
//! really can't produce a sensible sentinel (malformed wire messages,
//! detector construction).

use std::time::Instant;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DaaError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no resolution available")]
    NoResolution,
    #[error("planner exceeded its iteration budget")]
    PlannerTimeout,
    #[error("detector failed an internal invariant check: {0}")]
    DetectorMalformed(String),
    #[error("wire codec error: {0}")]
    Codec(String),
    #[error("io error: {0}")]
    Io(String),
}

/// Accumulates `(Instant, DaaError)` entries for one component. The FMS
/// tick loop drains each component's log at tick boundaries rather than
/// propagating errors across thread or component boundaries directly.
#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: Vec<(Instant, DaaError)>,
}

impl ErrorLog {
    pub fn new() -> Self {
        ErrorLog { entries: Vec::new() }
    }

    pub fn record(&mut self, err: DaaError) {
        tracing::warn!(error = %err, "component error logged");
        self.entries.push((Instant::now(), err));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn drain(&mut self) -> Vec<(Instant, DaaError)> {
        self.entries.drain(..).collect()
    }

    pub fn latest(&self) -> Option<&DaaError> {
        self.entries.last().map(|(_, e)| e)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_drains_in_order() {
        let mut log = ErrorLog::new();
        log.record(DaaError::NoResolution);
        log.record(DaaError::PlannerTimeout);
        assert_eq!(log.len(), 2);
        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].1, DaaError::NoResolution);
        assert!(log.is_empty());
    }

    #[test]
    fn latest_returns_most_recent() {
        let mut log = ErrorLog::new();
        log.record(DaaError::InvalidInput("nan ownship".into()));
        log.record(DaaError::NoResolution);
        assert_eq!(log.latest(), Some(&DaaError::NoResolution));
    }
}
