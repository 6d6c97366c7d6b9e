//! Reroute planners consumed by the resolver: weighted-grid A* for static
//! geofence routing, kino-dynamic RRT for dynamic traffic rerouting.

pub mod grid;
pub mod rrt;

pub use grid::{GridPlanner, GridResult};
pub use rrt::{track_is_conflict_free, RrtParameters, RrtPlanner, RrtResult};
