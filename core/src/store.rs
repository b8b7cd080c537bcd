use std::collections::HashMap;

use crate::models::{Dive, DiveId, TripId};

#[derive(Clone, Debug, Default)]
pub struct DiveQuery {
    pub start_time_min: Option<i64>,
    pub start_time_max: Option<i64>,
    pub trip: Option<TripId>,
    pub selected_only: bool,
}

impl DiveQuery {
    pub fn matches(&self, dive: &Dive) -> bool {
        self.start_time_min.map_or(true, |t| dive.when >= t)
            && self.start_time_max.map_or(true, |t| dive.when <= t)
            && self.trip.map_or(true, |t| dive.trip == Some(t))
            && (!self.selected_only || dive.selected)
    }
}

/// Dives in ascending `when` order, addressable by position and by id.
///
/// The store never touches trip membership: callers detach a dive from its
/// trip before removing it, and re-sort it after changing its `when`.
#[derive(Debug, Default)]
pub struct DiveStore {
    dives: HashMap<DiveId, Dive>,
    order: Vec<DiveId>,
    next_id: u32,
    amount_selected: usize,
    current: Option<DiveId>,
}

impl DiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn allocate_id(&mut self) -> DiveId {
        self.next_id += 1;
        DiveId(self.next_id)
    }

    /// Insert at `idx`, shifting later dives up. Assigns and returns a fresh id.
    pub fn insert_at(&mut self, idx: usize, mut dive: Dive) -> DiveId {
        assert!(idx <= self.order.len(), "insert position {idx} out of range");
        let id = self.allocate_id();
        dive.id = id;
        dive.trip = None;
        if dive.selected {
            self.amount_selected += 1;
            self.current = Some(id);
        }
        self.order.insert(idx, id);
        self.dives.insert(id, dive);
        tracing::debug!(dive = ?id, idx, "inserted dive");
        id
    }

    /// Insert after every dive starting at or before this one.
    pub fn insert_sorted(&mut self, dive: Dive) -> DiveId {
        let idx = self.sorted_position(dive.when);
        self.insert_at(idx, dive)
    }

    fn sorted_position(&self, when: i64) -> usize {
        self.order.partition_point(|id| self.dives[id].when <= when)
    }

    /// Remove the dive at `idx`, shifting later dives down.
    ///
    /// Panics if the dive is still in a trip.
    pub fn remove_at(&mut self, idx: usize) -> Option<Dive> {
        if idx >= self.order.len() {
            return None;
        }
        let id = self.order[idx];
        if let Some(dive) = self.dives.get(&id) {
            assert!(
                dive.trip.is_none(),
                "dive {id:?} removed while still in trip {:?}",
                dive.trip
            );
        }
        if self.dives.get(&id).is_some_and(|d| d.selected) {
            self.deselect(id);
        }
        self.order.remove(idx);
        tracing::debug!(dive = ?id, idx, "removed dive");
        self.dives.remove(&id)
    }

    pub fn get(&self, id: DiveId) -> Option<&Dive> {
        self.dives.get(&id)
    }

    /// Mutable access. Changing `when` here requires a [`DiveStore::resort`].
    pub fn get_mut(&mut self, id: DiveId) -> Option<&mut Dive> {
        self.dives.get_mut(&id)
    }

    pub fn at(&self, idx: usize) -> Option<&Dive> {
        self.order.get(idx).and_then(|id| self.dives.get(id))
    }

    pub fn id_at(&self, idx: usize) -> Option<DiveId> {
        self.order.get(idx).copied()
    }

    pub fn position(&self, id: DiveId) -> Option<usize> {
        self.order.iter().position(|d| *d == id)
    }

    pub fn ids(&self) -> &[DiveId] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dive> + '_ {
        self.order.iter().filter_map(|id| self.dives.get(id))
    }

    pub fn list(&self, query: &DiveQuery) -> Vec<&Dive> {
        self.iter().filter(|d| query.matches(d)).collect()
    }

    /// Move a dive whose `when` changed back into time order.
    /// Returns its new position.
    pub fn resort(&mut self, id: DiveId) -> Option<usize> {
        let old = self.position(id)?;
        self.order.remove(old);
        let when = self.dives[&id].when;
        let idx = self.sorted_position(when);
        self.order.insert(idx, id);
        Some(idx)
    }

    pub fn selected_count(&self) -> usize {
        self.amount_selected
    }

    /// The dive the user is looking at, if any dive is selected.
    pub fn current(&self) -> Option<DiveId> {
        self.current
    }

    pub fn selected_ids(&self) -> Vec<DiveId> {
        self.iter().filter(|d| d.selected).map(|d| d.id).collect()
    }

    pub fn select(&mut self, id: DiveId) {
        if let Some(dive) = self.dives.get_mut(&id) {
            if !dive.selected {
                dive.selected = true;
                self.amount_selected += 1;
                self.current = Some(id);
            }
        }
    }

    /// Deselect a dive; if it was the current one, the nearest earlier
    /// selected dive (or else the nearest later one) becomes current.
    pub fn deselect(&mut self, id: DiveId) {
        let Some(dive) = self.dives.get_mut(&id) else {
            return;
        };
        if !dive.selected {
            return;
        }
        dive.selected = false;
        self.amount_selected -= 1;

        if self.amount_selected == 0 {
            self.current = None;
            return;
        }
        if self.current != Some(id) {
            return;
        }
        let Some(idx) = self.position(id) else {
            return;
        };
        let earlier = self.order[..idx]
            .iter()
            .rev()
            .find(|d| self.dives[*d].selected);
        let later = self.order[idx + 1..]
            .iter()
            .find(|d| self.dives[*d].selected);
        self.current = earlier.or(later).copied();
    }

    /// Make `id` the only selected dive.
    pub fn select_only(&mut self, id: DiveId) -> bool {
        if !self.dives.contains_key(&id) {
            return false;
        }
        for dive in self.dives.values_mut() {
            dive.selected = false;
        }
        self.amount_selected = 0;
        self.current = None;
        self.select(id);
        true
    }

    pub fn clear_selection(&mut self) {
        for dive in self.dives.values_mut() {
            dive.selected = false;
        }
        self.amount_selected = 0;
        self.current = None;
    }
}
