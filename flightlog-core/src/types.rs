//! Shared types, error enum, and telemetry/flight records for flightlog-core.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::geo::GeoCoordinate;

/// All errors produced by flightlog-core.
#[derive(Debug, Error)]
pub enum FlightError {
    #[error("event for aircraft {actual} passed to tracker for aircraft {expected}")]
    AircraftMismatch { expected: String, actual: String },
    #[error("airport index needs at least one airport with a valid location")]
    EmptyAirportIndex,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FlightError>;

// ---------------------------------------------------------------------------
// Three-valued logic
// ---------------------------------------------------------------------------

/// A boolean that may not be known yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriState {
    #[default]
    Unknown,
    True,
    False,
}

impl TriState {
    pub fn is_true(self) -> bool {
        self == TriState::True
    }

    pub fn is_known(self) -> bool {
        self != TriState::Unknown
    }
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => TriState::True,
            Some(false) => TriState::False,
            None => TriState::Unknown,
        }
    }
}

/// Airborne classification of a single aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AirborneState {
    #[default]
    Unknown,
    Grounded,
    Airborne,
}

impl std::fmt::Display for AirborneState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AirborneState::Unknown => write!(f, "unknown"),
            AirborneState::Grounded => write!(f, "grounded"),
            AirborneState::Airborne => write!(f, "airborne"),
        }
    }
}

// ---------------------------------------------------------------------------
// Telemetry events
// ---------------------------------------------------------------------------

/// One timestamped telemetry report for one aircraft.
///
/// Every numeric field is optional. On input, a field that is missing, `null`,
/// or not a number deserializes to `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdsbEvent {
    pub identifier: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64", skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64", skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64", skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64", skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64", skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
}

impl AdsbEvent {
    pub fn new(identifier: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        AdsbEvent {
            identifier: identifier.into(),
            timestamp,
            latitude: None,
            longitude: None,
            altitude: None,
            speed: None,
            heading: None,
        }
    }

    pub fn with_position(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Position, only when both latitude and longitude are valid.
    pub fn coordinate(&self) -> Option<GeoCoordinate> {
        match (valid(self.latitude), valid(self.longitude)) {
            (Some(lat), Some(lon)) => Some(GeoCoordinate::new(lat, lon)),
            _ => None,
        }
    }

    pub fn altitude(&self) -> Option<f64> {
        valid(self.altitude)
    }

    pub fn speed(&self) -> Option<f64> {
        valid(self.speed)
    }
}

fn valid(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientNumber {
    Number(f64),
    Other(serde::de::IgnoredAny),
}

fn deserialize_lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LenientNumber::deserialize(deserializer)? {
        LenientNumber::Number(v) if v.is_finite() => Some(v),
        LenientNumber::Number(_) | LenientNumber::Other(_) => None,
    })
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

/// Parse an RFC 3339 timestamp, or a naive ISO-8601 date-time taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

// ---------------------------------------------------------------------------
// Flights
// ---------------------------------------------------------------------------

/// A reconstructed flight. Any field but the aircraft may be unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    pub aircraft_identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_airport: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_airport: Option<String>,
}

impl Flight {
    pub fn new(aircraft_identifier: impl Into<String>) -> Self {
        Flight {
            aircraft_identifier: aircraft_identifier.into(),
            departure_time: None,
            departure_airport: None,
            arrival_time: None,
            arrival_airport: None,
        }
    }

    /// True once the flight has landed somewhere.
    pub fn is_complete(&self) -> bool {
        self.arrival_airport.is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
