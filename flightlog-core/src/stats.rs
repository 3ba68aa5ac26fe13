//! Earliest/latest valid readings for the flight in progress.
//!
//! Speed, altitude and position are tracked independently: an event only
//! touches the field groups it carries valid values for. `reset()` collapses
//! every "earliest" onto the matching "latest", which is how a single
//! long-lived tracker marks the start of each new flight.

use chrono::{DateTime, Utc};

use crate::geo::GeoCoordinate;
use crate::types::AdsbEvent;

/// A value and the time of the event that carried it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading<T> {
    pub value: T,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct FieldTrack<T: Copy> {
    earliest: Option<Reading<T>>,
    latest: Option<Reading<T>>,
}

impl<T: Copy> Default for FieldTrack<T> {
    fn default() -> Self {
        FieldTrack {
            earliest: None,
            latest: None,
        }
    }
}

impl<T: Copy> FieldTrack<T> {
    fn observe(&mut self, value: T, timestamp: DateTime<Utc>) {
        let reading = Reading { value, timestamp };
        self.latest = Some(reading);
        if self.earliest.is_none() {
            self.earliest = Some(reading);
        }
    }

    fn reset(&mut self) {
        self.earliest = self.latest;
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlightStatTracker {
    speed: FieldTrack<f64>,
    altitude: FieldTrack<f64>,
    coordinate: FieldTrack<GeoCoordinate>,
}

impl FlightStatTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_event(&mut self, event: &AdsbEvent) {
        if let Some(speed) = event.speed() {
            self.speed.observe(speed, event.timestamp);
        }
        if let Some(altitude) = event.altitude() {
            self.altitude.observe(altitude, event.timestamp);
        }
        if let Some(coordinate) = event.coordinate() {
            self.coordinate.observe(coordinate, event.timestamp);
        }
    }

    /// Start a new observation span at the latest readings.
    pub fn reset(&mut self) {
        self.speed.reset();
        self.altitude.reset();
        self.coordinate.reset();
    }

    /// Most recent timestamp across all field groups.
    pub fn latest_time(&self) -> Option<DateTime<Utc>> {
        [
            self.speed.latest.map(|r| r.timestamp),
            self.altitude.latest.map(|r| r.timestamp),
            self.coordinate.latest.map(|r| r.timestamp),
        ]
        .into_iter()
        .flatten()
        .max()
    }

    pub fn earliest_coordinate_time(&self) -> Option<DateTime<Utc>> {
        self.coordinate.earliest.map(|r| r.timestamp)
    }

    pub fn earliest_speed(&self) -> Option<f64> {
        self.speed.earliest.map(|r| r.value)
    }

    pub fn latest_speed(&self) -> Option<f64> {
        self.speed.latest.map(|r| r.value)
    }

    pub fn earliest_altitude(&self) -> Option<f64> {
        self.altitude.earliest.map(|r| r.value)
    }

    pub fn latest_altitude(&self) -> Option<f64> {
        self.altitude.latest.map(|r| r.value)
    }

    pub fn earliest_coordinate(&self) -> Option<GeoCoordinate> {
        self.coordinate.earliest.map(|r| r.value)
    }

    pub fn latest_coordinate(&self) -> Option<GeoCoordinate> {
        self.coordinate.latest.map(|r| r.value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
