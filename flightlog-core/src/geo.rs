//! Latitude/longitude value type with great-circle distance and bearing.

use serde::{Deserialize, Serialize};

/// Spherical Earth radius used for all distances, in statute miles.
pub const EARTH_RADIUS_MILES: f64 = 3962.17341;

/// A point in decimal degrees. NaN in either axis means "no location".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        GeoCoordinate {
            latitude,
            longitude,
        }
    }

    pub fn absent() -> Self {
        GeoCoordinate::new(f64::NAN, f64::NAN)
    }

    pub fn has_location(&self) -> bool {
        !self.latitude.is_nan() && !self.longitude.is_nan()
    }

    /// Great-circle (haversine) distance in miles. NaN if either side has no location.
    pub fn distance_to(&self, other: &GeoCoordinate) -> f64 {
        if !self.has_location() || !other.has_location() {
            return f64::NAN;
        }
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        EARTH_RADIUS_MILES * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
    }

    /// Initial compass bearing towards `other`, in degrees within [0, 360).
    pub fn bearing_to(&self, other: &GeoCoordinate) -> f64 {
        let phi1 = self.latitude.to_radians();
        let phi2 = other.latitude.to_radians();
        let delta_lambda = (other.longitude - self.longitude).to_radians();
        let y = delta_lambda.sin() * phi2.cos();
        let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();
        (y.atan2(x).to_degrees() + 360.0) % 360.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
