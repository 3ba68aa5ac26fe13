//! flightlog-core: Flight reconstruction from ADS-B telemetry.
//!
//! No async, no event files, no JSON: just the algorithms. Events go in one
//! at a time, completed flights come out. The `flightlog` CLI owns loading
//! and serialization.

pub mod airports;
pub mod config;
pub mod geo;
pub mod moving_average;
pub mod plane;
pub mod stats;
pub mod tracker;
pub mod types;

// Re-export commonly used types at crate root
pub use airports::{Airport, AirportIndex};
pub use config::TrackerConfig;
pub use geo::GeoCoordinate;
pub use plane::{classify_airborne, PlaneTracker};
pub use tracker::Tracker;
pub use types::*;
