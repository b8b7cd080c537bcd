//! Trip registry: every trip, kept in ascending start-time order.
//!
//! Only the bookkeeping lives here. Moving dives in and out of trips, and
//! deleting trips when they empty, is done by the assigner in
//! [`crate::assign`], which keeps membership and start times consistent.

use std::collections::HashMap;

use crate::models::{Trip, TripId};

#[derive(Debug, Default)]
pub struct TripRegistry {
    trips: HashMap<TripId, Trip>,
    order: Vec<TripId>,
    next_id: u32,
}

impl TripRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: TripId) -> Option<&Trip> {
        self.trips.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TripId) -> Option<&mut Trip> {
        self.trips.get_mut(&id)
    }

    pub fn contains(&self, id: TripId) -> bool {
        self.trips.contains_key(&id)
    }

    /// Trips in ascending start-time order.
    pub fn iter(&self) -> impl Iterator<Item = &Trip> + '_ {
        self.order.iter().filter_map(|id| self.trips.get(id))
    }

    pub fn ids(&self) -> &[TripId] {
        &self.order
    }

    /// The latest trip starting at or before `when`.
    pub fn find_matching(&self, when: i64) -> Option<TripId> {
        let idx = self.partition(when);
        idx.checked_sub(1).map(|i| self.order[i])
    }

    /// The trip starting exactly at `when`.
    pub fn find_by_time(&self, when: i64) -> Option<TripId> {
        self.find_matching(when)
            .filter(|id| self.trips[id].when == when)
    }

    /// A trip other than `except` starting exactly at `when`.
    pub fn find_other_at(&self, when: i64, except: TripId) -> Option<TripId> {
        let end = self.partition(when);
        self.order[..end]
            .iter()
            .rev()
            .take_while(|id| self.trips[*id].when == when)
            .find(|id| **id != except)
            .copied()
    }

    /// Index of the first trip starting after `when`.
    fn partition(&self, when: i64) -> usize {
        self.order.partition_point(|id| self.trips[id].when <= when)
    }

    /// Register a trip under a fresh id. The caller guarantees no other trip
    /// starts at the same time.
    pub(crate) fn insert(&mut self, mut trip: Trip) -> TripId {
        assert!(trip.when != 0, "trip registered without a start time");
        self.next_id += 1;
        let id = TripId(self.next_id);
        trip.id = id;
        let idx = self.partition(trip.when);
        self.order.insert(idx, id);
        tracing::debug!(trip = ?id, when = trip.when, "registered trip");
        self.trips.insert(id, trip);
        id
    }

    /// Drop an empty trip. Panics if it still has members.
    pub(crate) fn remove(&mut self, id: TripId) -> Option<Trip> {
        let trip = self.trips.remove(&id)?;
        assert!(
            trip.dives.is_empty(),
            "trip {id:?} deleted with {} dives",
            trip.dives.len()
        );
        self.order.retain(|t| *t != id);
        tracing::debug!(trip = ?id, "deleted trip");
        Some(trip)
    }

    /// Change a trip's start time and move it to its new place.
    pub(crate) fn set_start(&mut self, id: TripId, when: i64) {
        let Some(trip) = self.trips.get_mut(&id) else {
            return;
        };
        if trip.when == when {
            return;
        }
        trip.when = when;
        self.order.retain(|t| *t != id);
        let idx = self.partition(when);
        self.order.insert(idx, id);
    }
}
