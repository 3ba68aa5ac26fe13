//! Immutable airport collection with nearest-airport lookup.
//!
//! The search runs on a 2-D k-d tree over raw (latitude, longitude) pairs,
//! so "nearest" means nearest in degree space. Great-circle distance is only
//! computed to or from the result. Near the poles, or across wide longitude
//! spans, this can pick an airport that is not the true great-circle nearest.

use std::collections::HashSet;

use kiddo::{KdTree, SquaredEuclidean};
use serde::{Deserialize, Serialize};

use crate::geo::GeoCoordinate;
use crate::types::{FlightError, Result};

/// An airport as loaded from the airport list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub identifier: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Field elevation in feet.
    pub elevation: f64,
}

impl Airport {
    pub fn new(identifier: impl Into<String>, latitude: f64, longitude: f64, elevation: f64) -> Self {
        Airport {
            identifier: identifier.into(),
            latitude,
            longitude,
            elevation,
        }
    }

    pub fn coordinate(&self) -> GeoCoordinate {
        GeoCoordinate::new(self.latitude, self.longitude)
    }
}

/// Read-only spatial index over a fixed set of airports.
///
/// Built once, then shared (typically behind an `Arc`) by every plane tracker.
/// There is no mutation API after construction.
pub struct AirportIndex {
    airports: Vec<Airport>,
    tree: KdTree<f64, 2>,
}

impl AirportIndex {
    /// Build the index. Airports without a finite location are dropped.
    ///
    /// Airports sharing an exact position with an earlier one stay listed for
    /// [`get`](Self::get) but are left out of the tree, so lookups at that
    /// position return the first of them.
    ///
    /// Fails with [`FlightError::EmptyAirportIndex`] when nothing usable remains,
    /// so [`nearest`](Self::nearest) can always return an airport.
    pub fn new(airports: Vec<Airport>) -> Result<Self> {
        let total = airports.len();
        let airports: Vec<Airport> = airports
            .into_iter()
            .filter(|a| a.latitude.is_finite() && a.longitude.is_finite())
            .collect();

        let dropped = total - airports.len();
        if dropped > 0 {
            tracing::warn!(dropped, "Skipping airports without a valid location");
        }
        if airports.is_empty() {
            return Err(FlightError::EmptyAirportIndex);
        }

        // kiddo cannot hold more items at one point than fit in a leaf
        let mut tree: KdTree<f64, 2> = KdTree::with_capacity(airports.len());
        let mut occupied = HashSet::with_capacity(airports.len());
        for (idx, airport) in airports.iter().enumerate() {
            if occupied.insert(position_key(airport)) {
                tree.add(&[airport.latitude, airport.longitude], idx as u64);
            }
        }

        let coincident = airports.len() - occupied.len();
        if coincident > 0 {
            tracing::debug!(coincident, "Airports sharing a position with an earlier entry");
        }

        tracing::info!(count = airports.len(), "Built airport index");

        Ok(AirportIndex { airports, tree })
    }

    /// Airport closest to `coordinate` in (latitude, longitude) space.
    ///
    /// The caller must pass a coordinate with a location; NaN input yields an
    /// arbitrary airport.
    pub fn nearest(&self, coordinate: &GeoCoordinate) -> &Airport {
        let hit = self
            .tree
            .nearest_one::<SquaredEuclidean>(&[coordinate.latitude, coordinate.longitude]);
        &self.airports[hit.item as usize]
    }

    /// Nearest airport plus its great-circle distance in miles.
    pub fn nearest_with_distance(&self, coordinate: &GeoCoordinate) -> (&Airport, f64) {
        let airport = self.nearest(coordinate);
        let distance = airport.coordinate().distance_to(coordinate);
        (airport, distance)
    }

    /// Look up an airport by identifier (case-insensitive).
    pub fn get(&self, identifier: &str) -> Option<&Airport> {
        self.airports
            .iter()
            .find(|a| a.identifier.eq_ignore_ascii_case(identifier))
    }

    pub fn len(&self) -> usize {
        self.airports.len()
    }

    /// Always false for a successfully built index.
    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Airport> {
        self.airports.iter()
    }
}

/// Bit pattern of a finite position, with -0.0 folded into 0.0.
fn position_key(airport: &Airport) -> (u64, u64) {
    ((airport.latitude + 0.0).to_bits(), (airport.longitude + 0.0).to_bits())
}

impl std::fmt::Debug for AirportIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AirportIndex")
            .field("airports", &self.airports.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
