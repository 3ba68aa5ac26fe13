//! Per-aircraft airborne/grounded state machine.
//!
//! Pure logic: events go in through [`PlaneTracker::process_event`] in
//! timestamp order, flights come out of [`PlaneTracker::flights`].
//!
//! Each positioned event updates the nearest airport and a moving average of
//! the distance to it, then re-classifies the aircraft unless the previous
//! transition happened less than `min_transition_delay` ago. A grounded to
//! airborne transition starts a new flight window; airborne to grounded
//! closes the flight and records it.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::airports::{Airport, AirportIndex};
use crate::config::TrackerConfig;
use crate::moving_average::MovingAverage;
use crate::stats::FlightStatTracker;
use crate::types::*;

/// Classify an aircraft from its latest readings.
///
/// * `average_distance_mi`: moving average distance to the nearest airport (NaN if none).
/// * `altitude_above_airport_ft`: latest altitude minus the nearest airport's elevation.
/// * `speed`: latest speed.
///
/// Low altitude or low speed means grounded. Otherwise far from every airport
/// means airborne. Near an airport with neither altitude nor speed known the
/// answer is `Unknown`.
pub fn classify_airborne(
    average_distance_mi: f64,
    altitude_above_airport_ft: Option<f64>,
    speed: Option<f64>,
    config: &TrackerConfig,
) -> AirborneState {
    // NaN compares false: no samples is "not near"
    let near_airport = average_distance_mi <= config.airport_distance_mi;
    let low_altitude = TriState::from(
        altitude_above_airport_ft.map(|alt| alt < config.altitude_threshold_ft),
    );
    let low_speed = TriState::from(speed.map(|spd| spd < config.speed_threshold));

    if low_altitude.is_true() || low_speed.is_true() {
        AirborneState::Grounded
    } else if !near_airport {
        AirborneState::Airborne
    } else if !low_altitude.is_known() && !low_speed.is_known() {
        AirborneState::Unknown
    } else {
        AirborneState::Airborne
    }
}

/// State for a single aircraft.
#[derive(Debug)]
pub struct PlaneTracker {
    identifier: String,
    airports: Arc<AirportIndex>,
    config: TrackerConfig,
    stats: FlightStatTracker,
    distance_average: MovingAverage,
    flights: Vec<Flight>,

    state: AirborneState,
    // None until the first real transition, so it never blocks one
    last_transition: Option<DateTime<Utc>>,
    most_recently_visited: Option<Airport>,
    latest_closest: Option<Airport>,
}

impl PlaneTracker {
    pub fn new(identifier: impl Into<String>, airports: Arc<AirportIndex>, config: TrackerConfig) -> Self {
        PlaneTracker {
            identifier: identifier.into(),
            airports,
            distance_average: MovingAverage::new(config.average_window),
            config,
            stats: FlightStatTracker::new(),
            flights: Vec::new(),
            state: AirborneState::Unknown,
            last_transition: None,
            most_recently_visited: None,
            latest_closest: None,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn state(&self) -> AirborneState {
        self.state
    }

    pub fn last_transition(&self) -> Option<DateTime<Utc>> {
        self.last_transition
    }

    pub fn most_recently_visited(&self) -> Option<&Airport> {
        self.most_recently_visited.as_ref()
    }

    pub fn latest_closest_airport(&self) -> Option<&Airport> {
        self.latest_closest.as_ref()
    }

    pub fn stats(&self) -> &FlightStatTracker {
        &self.stats
    }

    /// Flights that have landed, without the one in progress.
    pub fn completed_flights(&self) -> &[Flight] {
        &self.flights
    }

    /// Completed flights, plus a departure-only flight if currently airborne.
    pub fn flights(&self) -> Vec<Flight> {
        let mut flights = self.flights.clone();
        if self.state == AirborneState::Airborne {
            flights.push(self.generate_flight());
        }
        flights
    }

    /// Feed the next event for this aircraft.
    ///
    /// Fails only if the event belongs to another aircraft.
    pub fn process_event(&mut self, event: &AdsbEvent) -> Result<()> {
        if event.identifier != self.identifier {
            return Err(FlightError::AircraftMismatch {
                expected: self.identifier.clone(),
                actual: event.identifier.clone(),
            });
        }

        self.stats.process_event(event);

        let Some(coordinate) = event.coordinate() else {
            return Ok(());
        };

        let (closest, distance) = self.airports.nearest_with_distance(&coordinate);
        self.latest_closest = Some(closest.clone());
        self.distance_average.ingest(distance, event.timestamp);

        if self.state != AirborneState::Unknown {
            if let Some(last) = self.last_transition {
                if event.timestamp - last <= self.config.min_transition_delay {
                    return Ok(());
                }
            }
        }

        let previous = self.state;
        let current = self.classify();
        if current == AirborneState::Unknown {
            return Ok(());
        }
        self.state = current;

        if current == AirborneState::Grounded && self.most_recently_visited.is_none() {
            self.most_recently_visited = self.latest_closest.clone();
        }

        if previous != AirborneState::Unknown && previous != current {
            self.last_transition = Some(event.timestamp);
            tracing::debug!(
                aircraft = %self.identifier,
                from = %previous,
                to = %current,
                at = %event.timestamp,
                "Airborne state transition"
            );
            self.handle_transition(previous, current);
        }

        Ok(())
    }

    /// Build a flight from the current window.
    ///
    /// Departure comes from the last airport visited, arrival from the latest
    /// position, and only when grounded.
    pub fn generate_flight(&self) -> Flight {
        let mut flight = Flight::new(self.identifier.clone());

        if let Some(origin) = &self.most_recently_visited {
            flight.departure_airport = Some(origin.identifier.clone());
            flight.departure_time = self.stats.earliest_coordinate_time();
        }

        if self.state == AirborneState::Grounded {
            if let Some(end) = self.stats.latest_coordinate() {
                flight.arrival_airport = Some(self.airports.nearest(&end).identifier.clone());
            }
            flight.arrival_time = self.stats.latest_time();
        }

        flight
    }

    fn classify(&self) -> AirborneState {
        let altitude_above_airport = self
            .stats
            .latest_altitude()
            .zip(self.latest_closest.as_ref())
            .map(|(alt, airport)| alt - airport.elevation);

        classify_airborne(
            self.distance_average.average(),
            altitude_above_airport,
            self.stats.latest_speed(),
            &self.config,
        )
    }

    fn handle_transition(&mut self, previous: AirborneState, current: AirborneState) {
        match (previous, current) {
            (AirborneState::Grounded, AirborneState::Airborne) => {
                self.stats.reset();
            }
            (AirborneState::Airborne, AirborneState::Grounded) => {
                // Generate before overwriting the origin airport
                let flight = self.generate_flight();
                tracing::debug!(
                    aircraft = %self.identifier,
                    departure = ?flight.departure_airport,
                    arrival = ?flight.arrival_airport,
                    "Flight completed"
                );
                self.flights.push(flight);
                self.most_recently_visited = self.latest_closest.clone();
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    // Airport A near Philadelphia, B near Boston. FAR is ~260 mi from both.
    const A: (f64, f64) = (39.8719, -75.2411);
    const A_ELEV: f64 = 36.0;
    const B: (f64, f64) = (42.3656, -71.0096);
    const B_ELEV: f64 = 20.0;
    const FAR: (f64, f64) = (41.0, -80.5);

    fn airports() -> Arc<AirportIndex> {
        Arc::new(
            AirportIndex::new(vec![
                Airport::new("KPHL", A.0, A.1, A_ELEV),
                Airport::new("KBOS", B.0, B.1, B_ELEV),
            ])
            .unwrap(),
        )
    }

    fn make_tracker() -> PlaneTracker {
        PlaneTracker::new("N123", airports(), TrackerConfig::default())
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 6, 1, 12, 0, 0).unwrap()
    }

    fn at(offset: TimeDelta) -> DateTime<Utc> {
        t0() + offset
    }

    fn grounded_at(pos: (f64, f64), elev: f64, ts: DateTime<Utc>) -> AdsbEvent {
        AdsbEvent::new("N123", ts)
            .with_position(pos.0, pos.1)
            .with_speed(50.0)
            .with_altitude(elev + 50.0)
    }

    fn cruising(ts: DateTime<Utc>) -> AdsbEvent {
        AdsbEvent::new("N123", ts)
            .with_position(FAR.0, FAR.1)
            .with_speed(300.0)
            .with_altitude(30000.0)
    }

    // -- classifier ---------------------------------------------------------

    #[test]
    fn test_classify_low_altitude_grounded() {
        let cfg = TrackerConfig::default();
        assert_eq!(classify_airborne(50.0, Some(100.0), Some(400.0), &cfg), AirborneState::Grounded);
        assert_eq!(classify_airborne(f64::NAN, Some(499.9), None, &cfg), AirborneState::Grounded);
    }

    #[test]
    fn test_classify_low_speed_grounded() {
        let cfg = TrackerConfig::default();
        assert_eq!(classify_airborne(50.0, Some(9000.0), Some(149.0), &cfg), AirborneState::Grounded);
        assert_eq!(classify_airborne(50.0, None, Some(0.0), &cfg), AirborneState::Grounded);
    }

    #[test]
    fn test_classify_far_is_airborne() {
        let cfg = TrackerConfig::default();
        assert_eq!(classify_airborne(3.1, None, None, &cfg), AirborneState::Airborne);
        assert_eq!(classify_airborne(f64::NAN, None, None, &cfg), AirborneState::Airborne);
        assert_eq!(classify_airborne(10.0, Some(500.0), Some(150.0), &cfg), AirborneState::Airborne);
    }

    #[test]
    fn test_classify_near_without_evidence_unknown() {
        let cfg = TrackerConfig::default();
        assert_eq!(classify_airborne(3.0, None, None, &cfg), AirborneState::Unknown);
        assert_eq!(classify_airborne(0.0, None, None, &cfg), AirborneState::Unknown);
    }

    #[test]
    fn test_classify_near_with_high_readings_airborne() {
        let cfg = TrackerConfig::default();
        assert_eq!(classify_airborne(1.0, Some(2000.0), None, &cfg), AirborneState::Airborne);
        assert_eq!(classify_airborne(1.0, None, Some(180.0), &cfg), AirborneState::Airborne);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let cfg = TrackerConfig::default();
        let inputs = [
            (1.0, Some(100.0), Some(200.0)),
            (5.0, None, Some(300.0)),
            (2.0, None, None),
            (f64::NAN, Some(800.0), Some(90.0)),
        ];
        for (dist, alt, spd) in inputs {
            let first = classify_airborne(dist, alt, spd, &cfg);
            for _ in 0..3 {
                assert_eq!(classify_airborne(dist, alt, spd, &cfg), first);
            }
        }
    }

    // -- state machine ------------------------------------------------------

    #[test]
    fn test_mismatched_identifier_is_error() {
        let mut tracker = make_tracker();
        let event = AdsbEvent::new("N999", t0()).with_position(A.0, A.1);
        let err = tracker.process_event(&event).unwrap_err();
        match err {
            FlightError::AircraftMismatch { expected, actual } => {
                assert_eq!(expected, "N123");
                assert_eq!(actual, "N999");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_event_without_position_only_updates_stats() {
        let mut tracker = make_tracker();
        let event = AdsbEvent::new("N123", t0()).with_speed(20.0).with_altitude(0.0);
        tracker.process_event(&event).unwrap();

        assert_eq!(tracker.state(), AirborneState::Unknown);
        assert!(tracker.latest_closest_airport().is_none());
        assert_eq!(tracker.stats().latest_speed(), Some(20.0));
    }

    #[test]
    fn test_first_grounded_sets_origin() {
        let mut tracker = make_tracker();
        tracker.process_event(&grounded_at(A, A_ELEV, t0())).unwrap();

        assert_eq!(tracker.state(), AirborneState::Grounded);
        assert_eq!(tracker.most_recently_visited().map(|a| a.identifier.as_str()), Some("KPHL"));
        // Leaving Unknown is not a transition
        assert!(tracker.last_transition().is_none());
        assert!(tracker.flights().is_empty());
    }

    #[test]
    fn test_round_trip_flight() {
        let mut tracker = make_tracker();
        let takeoff = at(TimeDelta::minutes(11));
        let landing = at(TimeDelta::minutes(40));

        tracker.process_event(&grounded_at(A, A_ELEV, t0())).unwrap();
        assert_eq!(tracker.state(), AirborneState::Grounded);

        tracker.process_event(&cruising(takeoff)).unwrap();
        assert_eq!(tracker.state(), AirborneState::Airborne);
        assert_eq!(tracker.last_transition(), Some(takeoff));

        tracker.process_event(&grounded_at(B, B_ELEV, landing)).unwrap();
        assert_eq!(tracker.state(), AirborneState::Grounded);

        let flights = tracker.flights();
        assert_eq!(flights.len(), 1);
        let flight = &flights[0];
        assert_eq!(flight.aircraft_identifier, "N123");
        assert_eq!(flight.departure_airport.as_deref(), Some("KPHL"));
        // Window was reset at the takeoff event
        assert_eq!(flight.departure_time, Some(takeoff));
        assert_eq!(flight.arrival_airport.as_deref(), Some("KBOS"));
        assert_eq!(flight.arrival_time, Some(landing));

        // Next flight departs from where this one landed
        assert_eq!(tracker.most_recently_visited().map(|a| a.identifier.as_str()), Some("KBOS"));
    }

    #[test]
    fn test_in_progress_flight() {
        let mut tracker = make_tracker();
        let takeoff = at(TimeDelta::minutes(11));
        tracker.process_event(&grounded_at(A, A_ELEV, t0())).unwrap();
        tracker.process_event(&cruising(takeoff)).unwrap();
        tracker.process_event(&cruising(at(TimeDelta::minutes(30)))).unwrap();

        assert!(tracker.completed_flights().is_empty());
        let flights = tracker.flights();
        assert_eq!(flights.len(), 1);
        assert_eq!(flights[0].departure_airport.as_deref(), Some("KPHL"));
        assert_eq!(flights[0].departure_time, Some(takeoff));
        assert!(flights[0].arrival_airport.is_none());
        assert!(flights[0].arrival_time.is_none());

        // Snapshot does not alter the tracker
        assert!(tracker.completed_flights().is_empty());
    }

    #[test]
    fn test_hysteresis_blocks_within_delay() {
        let mut tracker = make_tracker();
        let takeoff = at(TimeDelta::minutes(20));
        tracker.process_event(&grounded_at(A, A_ELEV, t0())).unwrap();
        tracker.process_event(&cruising(takeoff)).unwrap();
        assert_eq!(tracker.state(), AirborneState::Airborne);

        let too_soon = takeoff + TimeDelta::minutes(9) + TimeDelta::seconds(59);
        tracker.process_event(&grounded_at(B, B_ELEV, too_soon)).unwrap();
        assert_eq!(tracker.state(), AirborneState::Airborne);
        assert!(tracker.completed_flights().is_empty());
    }

    #[test]
    fn test_hysteresis_allows_after_delay() {
        let mut tracker = make_tracker();
        let takeoff = at(TimeDelta::minutes(20));
        tracker.process_event(&grounded_at(A, A_ELEV, t0())).unwrap();
        tracker.process_event(&cruising(takeoff)).unwrap();

        let later = takeoff + TimeDelta::minutes(10) + TimeDelta::seconds(1);
        tracker.process_event(&grounded_at(B, B_ELEV, later)).unwrap();
        assert_eq!(tracker.state(), AirborneState::Grounded);
        assert_eq!(tracker.completed_flights().len(), 1);
        assert_eq!(tracker.last_transition(), Some(later));
    }

    #[test]
    fn test_hysteresis_exact_delay_still_blocked() {
        let mut tracker = make_tracker();
        let takeoff = at(TimeDelta::minutes(20));
        tracker.process_event(&grounded_at(A, A_ELEV, t0())).unwrap();
        tracker.process_event(&cruising(takeoff)).unwrap();

        tracker
            .process_event(&grounded_at(B, B_ELEV, takeoff + TimeDelta::minutes(10)))
            .unwrap();
        assert_eq!(tracker.state(), AirborneState::Airborne);
    }

    #[test]
    fn test_ambiguous_stays_unknown() {
        let mut tracker = make_tracker();
        for i in 0..30 {
            let event = AdsbEvent::new("N123", at(TimeDelta::minutes(i)))
                .with_position(A.0 + 0.001, A.1 - 0.001);
            tracker.process_event(&event).unwrap();
        }
        assert_eq!(tracker.state(), AirborneState::Unknown);
        assert!(tracker.flights().is_empty());
        assert!(tracker.most_recently_visited().is_none());
    }

    #[test]
    fn test_unknown_result_keeps_previous_state() {
        let mut tracker = make_tracker();
        // Far from everything, no altitude or speed: airborne
        tracker
            .process_event(&AdsbEvent::new("N123", t0()).with_position(FAR.0, FAR.1))
            .unwrap();
        assert_eq!(tracker.state(), AirborneState::Airborne);

        // Near an airport with still no altitude or speed: cannot tell
        tracker
            .process_event(
                &AdsbEvent::new("N123", at(TimeDelta::minutes(15))).with_position(A.0, A.1),
            )
            .unwrap();
        assert_eq!(tracker.state(), AirborneState::Airborne);
        assert!(tracker.last_transition().is_none());
    }

    #[test]
    fn test_nearness_follows_windowed_average() {
        let mut tracker = make_tracker();
        for i in 0..4 {
            let event = AdsbEvent::new("N123", at(TimeDelta::minutes(i))).with_position(FAR.0, FAR.1);
            tracker.process_event(&event).unwrap();
        }
        assert_eq!(tracker.state(), AirborneState::Airborne);

        // One sighting right on the field, still no altitude or speed
        let over_field = AdsbEvent::new("N123", at(TimeDelta::seconds(210))).with_position(A.0, A.1);
        tracker.process_event(&over_field).unwrap();
        assert_eq!(tracker.latest_closest_airport().map(|a| a.identifier.as_str()), Some("KPHL"));

        // Judged on that event's distance alone it would be ambiguous
        let cfg = TrackerConfig::default();
        assert_eq!(classify_airborne(0.0, None, None, &cfg), AirborneState::Unknown);
        // The far history still dominates the 5 minute average
        assert!(tracker.distance_average.average() > cfg.airport_distance_mi);
        assert_eq!(tracker.classify(), AirborneState::Airborne);

        // Once the far samples age out of the window, the field is near
        for m in [9, 10] {
            let event = AdsbEvent::new("N123", at(TimeDelta::minutes(m))).with_position(A.0, A.1);
            tracker.process_event(&event).unwrap();
        }
        assert_eq!(tracker.distance_average.len(), 2);
        assert_eq!(tracker.classify(), AirborneState::Unknown);
        assert_eq!(tracker.state(), AirborneState::Airborne);
    }

    #[test]
    fn test_landing_without_known_origin() {
        let mut tracker = make_tracker();
        tracker.process_event(&cruising(t0())).unwrap();
        assert_eq!(tracker.state(), AirborneState::Airborne);
        // Departure unknown while in flight
        assert_eq!(tracker.flights()[0].departure_airport, None);

        let landing = at(TimeDelta::minutes(50));
        tracker.process_event(&grounded_at(B, B_ELEV, landing)).unwrap();
        let flights = tracker.flights();
        assert_eq!(flights.len(), 1);
        assert_eq!(flights[0].arrival_airport.as_deref(), Some("KBOS"));
        assert_eq!(flights[0].arrival_time, Some(landing));
        // The first grounded sighting also seeds the origin before the flight is built
        assert_eq!(flights[0].departure_airport.as_deref(), Some("KBOS"));
        assert_eq!(flights[0].departure_time, Some(t0()));
    }

    #[test]
    fn test_two_consecutive_flights() {
        let mut tracker = make_tracker();
        tracker.process_event(&grounded_at(A, A_ELEV, t0())).unwrap();
        tracker.process_event(&cruising(at(TimeDelta::minutes(15)))).unwrap();
        tracker.process_event(&grounded_at(B, B_ELEV, at(TimeDelta::minutes(60)))).unwrap();
        tracker.process_event(&cruising(at(TimeDelta::minutes(90)))).unwrap();
        tracker.process_event(&grounded_at(A, A_ELEV, at(TimeDelta::minutes(150)))).unwrap();

        let flights = tracker.flights();
        assert_eq!(flights.len(), 2);
        assert_eq!(flights[0].departure_airport.as_deref(), Some("KPHL"));
        assert_eq!(flights[0].arrival_airport.as_deref(), Some("KBOS"));
        assert_eq!(flights[1].departure_airport.as_deref(), Some("KBOS"));
        assert_eq!(flights[1].departure_time, Some(at(TimeDelta::minutes(90))));
        assert_eq!(flights[1].arrival_airport.as_deref(), Some("KPHL"));
        assert_eq!(flights[1].arrival_time, Some(at(TimeDelta::minutes(150))));
    }
}
