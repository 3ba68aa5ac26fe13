//! Fleet-wide registry: one `PlaneTracker` per aircraft identifier.
//!
//! Pure logic, no I/O. Events are demultiplexed by identifier and handed to
//! the owning plane tracker, which is created on first sighting. Flights are
//! collected at the end, in first-sighting order.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use crate::airports::AirportIndex;
use crate::config::TrackerConfig;
use crate::plane::PlaneTracker;
use crate::types::*;

/// Track every aircraft in a batch of events.
///
/// Events for a given aircraft must arrive in non-decreasing timestamp order.
/// Interleaving between aircraft is free.
pub struct Tracker {
    airports: Arc<AirportIndex>,
    config: TrackerConfig,
    planes: HashMap<String, PlaneTracker>,
    // First-sighting order, for deterministic output
    order: Vec<String>,

    // Counters
    pub total_events: u64,
    pub positioned_events: u64,
}

impl Tracker {
    pub fn new(airports: Arc<AirportIndex>, config: TrackerConfig) -> Self {
        Tracker {
            airports,
            config,
            planes: HashMap::new(),
            order: Vec::new(),
            total_events: 0,
            positioned_events: 0,
        }
    }

    /// Route one event to its aircraft's tracker, creating it if needed.
    pub fn update(&mut self, event: &AdsbEvent) -> Result<()> {
        self.total_events += 1;
        if event.coordinate().is_some() {
            self.positioned_events += 1;
        }

        let plane = match self.planes.entry(event.identifier.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                tracing::trace!(aircraft = %event.identifier, "New aircraft");
                self.order.push(event.identifier.clone());
                entry.insert(PlaneTracker::new(
                    event.identifier.clone(),
                    Arc::clone(&self.airports),
                    self.config.clone(),
                ))
            }
        };
        plane.process_event(event)
    }

    /// Feed a whole batch, stopping at the first error.
    pub fn process_all<'a, I>(&mut self, events: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a AdsbEvent>,
    {
        for event in events {
            self.update(event)?;
        }
        tracing::info!(
            events = self.total_events,
            positioned = self.positioned_events,
            aircraft = self.planes.len(),
            "Processed events"
        );
        Ok(())
    }

    /// All flights, completed and in progress, grouped by aircraft in
    /// first-sighting order.
    pub fn flights(&self) -> Vec<Flight> {
        self.order
            .iter()
            .filter_map(|id| self.planes.get(id))
            .flat_map(|plane| plane.flights())
            .collect()
    }

    /// All flights ordered by aircraft identifier, then departure time
    /// (unknown departures first).
    pub fn flights_sorted(&self) -> Vec<Flight> {
        let mut flights = self.flights();
        flights.sort_by(|a, b| {
            a.aircraft_identifier
                .cmp(&b.aircraft_identifier)
                .then(a.departure_time.cmp(&b.departure_time))
        });
        flights
    }

    pub fn get(&self, identifier: &str) -> Option<&PlaneTracker> {
        self.planes.get(identifier)
    }

    pub fn aircraft_count(&self) -> usize {
        self.planes.len()
    }

    /// Plane trackers in first-sighting order.
    pub fn planes(&self) -> impl Iterator<Item = &PlaneTracker> {
        self.order.iter().filter_map(|id| self.planes.get(id))
    }

    pub fn airports(&self) -> &AirportIndex {
        &self.airports
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
