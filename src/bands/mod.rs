//! Kinematic conflict bands: the integer-indexed search core, the four
//! concrete maneuver dimensions, and their aggregation into `MultiBands`.

pub mod alert;
pub mod alt;
pub mod gs;
pub mod integer_core;
pub mod interval;
pub mod multi;
pub mod real_bands;
pub mod region;
pub mod trk;
pub mod vs;

pub use alert::{AlertThresholds, Alertor};
pub use alt::AltBands;
pub use gs::GsBands;
pub use integer_core::Dir;
pub use interval::{Interval, IntervalSet};
pub use multi::{Dimension, MultiBands};
pub use region::{BandsRange, BandsRegion};
pub use trk::TrkBands;
pub use vs::VsBands;
