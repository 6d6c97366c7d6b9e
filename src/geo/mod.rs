//! Flat-earth projected geometry shared by the bands, geofence, and planner
//! modules: vectors, positions, velocities, polygons, and the projected
//! traffic-state frame.

pub mod polygon;
pub mod position;
pub mod traffic_state;
pub mod vect3;
pub mod velocity;

pub use polygon::Polygon;
pub use position::{Position, Projection};
pub use traffic_state::TrafficState;
pub use vect3::Vect3;
pub use velocity::Velocity;
