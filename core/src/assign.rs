//! Moving dives between trips.
//!
//! Every membership change keeps three things true: a dive's `trip` names
//! the trip that lists it, a trip's start time is the earliest `when` of its
//! members, and no trip is left without members.

use std::cmp::Ordering;

use crate::divelog::DiveLog;
use crate::models::{DiveId, Trip, TripDraft, TripFlag, TripId};

/// A top-level row of the dive list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entry {
    Dive(DiveId),
    Trip(TripId),
}

/// Dive list row with its children, ready for display.
#[derive(Clone, Debug, PartialEq, uniffi::Enum)]
pub enum ListEntry {
    Trip { trip: TripId, dives: Vec<DiveId> },
    Dive { dive: DiveId },
}

fn is_blank(text: &Option<String>) -> bool {
    text.as_deref().map_or(true, |s| s.trim().is_empty())
}

impl DiveLog {
    /// Put a dive into a trip, taking it out of any other trip first.
    ///
    /// Returns the trip holding the dive afterwards. That differs from
    /// `trip` when the lowered start landed on another trip's start and the
    /// two were folded together.
    pub fn add_dive_to_trip(&mut self, dive: DiveId, trip: TripId) -> Option<TripId> {
        let current = self.dives.get(dive)?.trip;
        if current == Some(trip) {
            return Some(trip);
        }
        let trip_when = self.trips.get(trip)?.when;
        assert!(trip_when != 0, "trip {trip:?} has no start time");

        self.detach(dive, TripFlag::Unset);
        // the old trip may fold into this one, but this one stays
        if !self.trips.contains(trip) {
            return None;
        }

        self.link_member(trip, dive);
        if let Some(d) = self.dives.get_mut(dive) {
            d.trip = Some(trip);
            d.trip_flag = TripFlag::Assigned;
        }
        self.mark_changed();
        tracing::debug!(dive = ?dive, trip = ?trip, "added dive to trip");
        Some(self.refresh_trip_start(trip))
    }

    /// Take a dive out of its trip and keep it out of auto-grouping.
    pub fn remove_dive_from_trip(&mut self, dive: DiveId) {
        if self.detach(dive, TripFlag::NoTrip).is_some() {
            self.mark_changed();
        }
    }

    /// Unlink a dive from its trip, leaving `flag` on it. Deletes the trip
    /// when it empties, otherwise recomputes its start if the dive held it.
    pub(crate) fn detach(&mut self, dive: DiveId, flag: TripFlag) -> Option<TripId> {
        let d = self.dives.get_mut(dive)?;
        let trip_id = d.trip.take()?;
        d.trip_flag = flag;
        let when = d.when;

        let trip = self.trips.get_mut(trip_id)?;
        let pos = trip.dives.iter().position(|m| *m == dive);
        assert!(pos.is_some(), "dive {dive:?} missing from its trip {trip_id:?}");
        if let Some(pos) = pos {
            trip.dives.remove(pos);
        }

        if trip.dives.is_empty() {
            self.trips.remove(trip_id);
            tracing::debug!(trip = ?trip_id, "last dive left trip");
        } else if trip.when == when {
            self.refresh_trip_start(trip_id);
        }
        Some(trip_id)
    }

    /// Place `dive` among the trip's members in time order.
    fn link_member(&mut self, trip: TripId, dive: DiveId) {
        let Some(when) = self.dives.get(dive).map(|d| d.when) else {
            return;
        };
        let dives = &self.dives;
        if let Some(t) = self.trips.get_mut(trip) {
            t.dives.retain(|m| *m != dive);
            let idx = t
                .dives
                .partition_point(|m| dives.get(*m).map_or(i64::MIN, |d| d.when) <= when);
            t.dives.insert(idx, dive);
        }
    }

    /// Reset a trip's start to the earliest timed member, then fold it into
    /// any other trip now starting at the same moment. Returns the trip
    /// that holds the members afterwards.
    fn refresh_trip_start(&mut self, trip: TripId) -> TripId {
        let Some(t) = self.trips.get(trip) else {
            return trip;
        };
        let earliest = t
            .dives
            .iter()
            .filter_map(|m| self.dives.get(*m))
            .map(|d| d.when)
            .filter(|when| *when != 0)
            .min();
        if let Some(when) = earliest {
            self.trips.set_start(trip, when);
        }
        self.fold_start_collision(trip)
    }

    /// Two trips never share a start time: if another trip starts when
    /// `trip` does, `trip` is merged into it.
    fn fold_start_collision(&mut self, trip: TripId) -> TripId {
        let Some(t) = self.trips.get(trip) else {
            return trip;
        };
        let Some(other) = self.trips.find_other_at(t.when, trip) else {
            return trip;
        };
        let (location, notes) = (t.location.clone(), t.notes.clone());
        self.fill_blanks(other, location, notes);
        tracing::debug!(trip = ?trip, into = ?other, "trip start collided");
        self.merge_trips(other, trip);
        other
    }

    /// Copy `location` and `notes` into the trip where it has none.
    fn fill_blanks(&mut self, trip: TripId, location: Option<String>, notes: Option<String>) {
        let Some(t) = self.trips.get_mut(trip) else {
            return;
        };
        if is_blank(&t.location) && !is_blank(&location) {
            t.location = location;
        }
        if is_blank(&t.notes) && !is_blank(&notes) {
            t.notes = notes;
        }
    }

    /// Add dives oldest first, following the trip if it gets folded.
    fn add_dives_to_trip(&mut self, mut dives: Vec<DiveId>, trip: TripId) -> TripId {
        dives.sort_by_key(|d| self.dives.get(*d).map_or(0, |d| d.when));
        let mut target = trip;
        for dive in dives {
            if let Some(t) = self.add_dive_to_trip(dive, target) {
                target = t;
            }
        }
        target
    }

    /// Register a trip. A draft starting exactly when an existing trip does
    /// is merged into that trip instead: its dives move over, and its
    /// location and notes fill in blanks.
    ///
    /// Draft dives missing from the log are ignored, and the trip starts at
    /// its earliest dive whatever the draft says. Panics when a new trip
    /// would be left without dives.
    pub fn insert_trip(&mut self, draft: TripDraft) -> TripId {
        let TripDraft {
            when,
            location,
            notes,
            autogen,
            dives,
        } = draft;
        let dives: Vec<DiveId> = dives
            .into_iter()
            .filter(|d| self.dives.get(*d).is_some())
            .collect();
        let start = dives
            .iter()
            .filter_map(|d| self.dives.get(*d))
            .map(|d| d.when)
            .filter(|when| *when != 0)
            .min()
            .unwrap_or(when);

        let existing = self
            .trips
            .find_by_time(when)
            .or_else(|| self.trips.find_by_time(start));
        if let Some(existing) = existing {
            self.fill_blanks(existing, location, notes);
            let trip = self.add_dives_to_trip(dives, existing);
            tracing::debug!(trip = ?trip, "merged trip draft into existing trip");
            return trip;
        }

        assert!(
            !dives.is_empty(),
            "trip draft at {when} has none of its dives in the log"
        );
        let id = self.trips.insert(Trip {
            when: start,
            location,
            notes,
            autogen,
            ..Trip::default()
        });
        self.add_dives_to_trip(dives, id)
    }

    /// Start a new trip holding just this dive. A dive without a start
    /// time cannot seed a trip.
    pub fn create_trip_from_dive(&mut self, dive: DiveId) -> Option<TripId> {
        let d = self.dives.get(dive)?;
        if d.when == 0 {
            return None;
        }
        let draft = TripDraft {
            when: d.when,
            location: d.location.clone(),
            dives: vec![dive],
            ..TripDraft::default()
        };
        let trip = self.insert_trip(draft);
        if let Some(d) = self.dives.get_mut(dive) {
            d.trip_flag = TripFlag::InTrip;
        }
        tracing::info!("Created trip {:?} from dive {:?}", trip, dive);
        Some(trip)
    }

    /// Group trip-less dives with the dive before them when they start
    /// within the configured gap, and give the rest trips of their own.
    /// Dives marked [`TripFlag::NoTrip`] and dives without a start time
    /// are left alone.
    pub fn autogroup(&mut self) {
        let gap = self.config().grouping.gap_threshold_sec;
        let mut last: Option<DiveId> = None;
        let mut created = 0;
        let mut joined = 0;

        for idx in 0..self.dives.len() {
            let Some(id) = self.dives.id_at(idx) else {
                break;
            };
            let Some(dive) = self.dives.get(id) else {
                continue;
            };
            if dive.trip.is_some() {
                last = Some(id);
                continue;
            }
            if !dive.needs_trip() || dive.when == 0 {
                last = None;
                continue;
            }
            let when = dive.when;
            let location = dive.location.clone();

            let previous = last
                .and_then(|prev| self.dives.get(prev))
                .filter(|prev| when < prev.when + gap)
                .map(|prev| (prev.id, prev.trip));
            last = Some(id);

            if let Some((prev, prev_trip)) = previous {
                let trip = match prev_trip {
                    Some(trip) => Some(trip),
                    None => self.create_autogen_trip(prev),
                };
                if let Some(trip) = trip.and_then(|t| self.add_dive_to_trip(id, t)) {
                    self.fill_blanks(trip, location, None);
                    joined += 1;
                    continue;
                }
            }

            if self.create_autogen_trip(id).is_some() {
                created += 1;
            }
        }

        if created + joined > 0 {
            tracing::info!(
                "Auto-grouped dives: {} new trips, {} dives joined",
                created,
                joined
            );
        }
    }

    fn create_autogen_trip(&mut self, dive: DiveId) -> Option<TripId> {
        let trip = self.create_trip_from_dive(dive)?;
        if let Some(t) = self.trips.get_mut(trip) {
            t.autogen = true;
        }
        Some(trip)
    }

    /// Move every dive of `source` into `target`; `source` disappears.
    pub fn merge_trips(&mut self, target: TripId, source: TripId) {
        assert!(target != source, "cannot merge trip {target:?} into itself");
        if !self.trips.contains(target) {
            return;
        }
        let Some(moved) = self
            .trips
            .get_mut(source)
            .map(|t| std::mem::take(&mut t.dives))
        else {
            return;
        };
        self.trips.remove(source);

        for dive in moved {
            if let Some(d) = self.dives.get_mut(dive) {
                d.trip = Some(target);
                d.trip_flag = TripFlag::Assigned;
            }
            self.link_member(target, dive);
        }
        self.mark_changed();
        tracing::info!("Merged trip {:?} into {:?}", source, target);
        self.refresh_trip_start(target);
    }

    /// Split a trip before `from_dive`: it and every later member move to a
    /// new trip. Returns the new trip, or `None` when `from_dive` is not a
    /// non-first member of a trip.
    pub fn split_trip(&mut self, from_dive: DiveId) -> Option<TripId> {
        let trip = self.dives.get(from_dive)?.trip?;
        let members = self.trips.get(trip)?.dives.clone();
        let pos = members.iter().position(|m| *m == from_dive)?;
        if pos == 0 || self.trips.get(trip)?.when == self.dives.get(from_dive)?.when {
            return None;
        }

        let new_trip = self.create_trip_from_dive(from_dive)?;
        let new_trip = self.add_dives_to_trip(members[pos + 1..].to_vec(), new_trip);
        tracing::info!("Split trip {:?} at dive {:?} into {:?}", trip, from_dive, new_trip);
        Some(new_trip)
    }

    /// Put a trip-less dive into the trip of the dive right before it. The
    /// trip-less dives directly after it follow when both are selected.
    pub fn merge_dive_into_trip_above(&mut self, dive: DiveId) -> Option<TripId> {
        let idx = self.dives.position(dive)?;
        if self.dives.get(dive)?.trip.is_some() {
            return None;
        }
        let mut trip = self.dives.at(idx.checked_sub(1)?)?.trip?;

        trip = self.add_dive_to_trip(dive, trip)?;
        self.set_trip_flag(dive, TripFlag::InTrip);

        let mut prev_selected = self.dives.get(dive).is_some_and(|d| d.selected);
        let mut next = idx + 1;
        while let Some(d) = self.dives.at(next) {
            if d.trip.is_some() || !(prev_selected && d.selected) {
                break;
            }
            let id = d.id;
            prev_selected = d.selected;
            if let Some(t) = self.add_dive_to_trip(id, trip) {
                trip = t;
            }
            self.set_trip_flag(id, TripFlag::InTrip);
            next += 1;
        }
        Some(trip)
    }

    fn set_trip_flag(&mut self, dive: DiveId, flag: TripFlag) {
        if let Some(d) = self.dives.get_mut(dive) {
            d.trip_flag = flag;
        }
    }

    /// Dissolve a trip. Its dives stay out of auto-grouping.
    pub fn remove_trip(&mut self, trip: TripId) -> bool {
        let Some(members) = self.trips.get(trip).map(|t| t.dives.clone()) else {
            return false;
        };
        // latest first, so the start never moves while the trip empties
        for dive in members.into_iter().rev() {
            self.detach(dive, TripFlag::NoTrip);
        }
        self.mark_changed();
        tracing::info!("Removed trip {:?}", trip);
        true
    }

    /// Dissolve every automatically created trip, leaving its dives free
    /// to be grouped again.
    pub fn remove_autogen_trips(&mut self) -> usize {
        let mut removed = 0;
        loop {
            let Some(trip) = self.trips.iter().find(|t| t.autogen).map(|t| t.id) else {
                break;
            };
            let members = self.trips.get(trip).map(|t| t.dives.clone()).unwrap_or_default();
            for dive in members.into_iter().rev() {
                self.detach(dive, TripFlag::Unset);
            }
            removed += 1;
        }
        if removed > 0 {
            self.mark_changed();
            tracing::info!("Removed {} auto-generated trips", removed);
        }
        removed
    }

    /// Change a dive's start time, keeping trips consistent.
    ///
    /// A sole member drags its trip along. Otherwise the dive leaves its
    /// trip when it would start before the trip or land in a later trip's
    /// span. The dive list is re-sorted, and auto-grouping runs if enabled.
    pub fn set_dive_time(&mut self, dive: DiveId, when: i64) -> bool {
        let Some(d) = self.dives.get(dive) else {
            return false;
        };
        if d.when == when {
            return false;
        }

        if let Some(trip) = d.trip {
            let (members, trip_when) = self
                .trips
                .get(trip)
                .map_or((0, 0), |t| (t.member_count(), t.when));
            if members > 1 && (when < trip_when || self.trips.find_matching(when) != Some(trip)) {
                self.detach(dive, TripFlag::Unset);
            }
        }

        let trip = match self.dives.get_mut(dive) {
            Some(d) => {
                d.when = when;
                d.trip
            }
            None => return false,
        };
        self.dives.resort(dive);

        if let Some(trip) = trip {
            self.link_member(trip, dive);
            self.refresh_trip_start(trip);
        }

        self.mark_changed();
        tracing::debug!(dive = ?dive, when, "retimed dive");
        if self.config().grouping.autogroup {
            self.autogroup();
        }
        true
    }

    /// Display order of two top-level rows. A dive is placed by its trip's
    /// start time when the two rows belong to different trips.
    pub fn compare_for_display(&self, a: Entry, b: Entry) -> Ordering {
        let (mut when_a, trip_a) = self.entry_time(a);
        let (mut when_b, trip_b) = self.entry_time(b);
        if trip_a != trip_b {
            if let Some(t) = trip_a.and_then(|t| self.trips.get(t)) {
                when_a = t.when;
            }
            if let Some(t) = trip_b.and_then(|t| self.trips.get(t)) {
                when_b = t.when;
            }
        }
        when_a.cmp(&when_b)
    }

    fn entry_time(&self, entry: Entry) -> (i64, Option<TripId>) {
        match entry {
            Entry::Dive(id) => self.dives.get(id).map_or((0, None), |d| (d.when, d.trip)),
            Entry::Trip(id) => self.trips.get(id).map_or((0, None), |t| (t.when, Some(id))),
        }
    }

    /// The dive list as shown: trips with their members, and dives outside
    /// any trip, oldest first.
    pub fn display_entries(&self) -> Vec<ListEntry> {
        let mut top: Vec<Entry> = self
            .trips
            .ids()
            .iter()
            .map(|t| Entry::Trip(*t))
            .chain(
                self.dives
                    .iter()
                    .filter(|d| d.trip.is_none())
                    .map(|d| Entry::Dive(d.id)),
            )
            .collect();
        top.sort_by(|a, b| self.compare_for_display(*a, *b));

        top.into_iter()
            .map(|entry| match entry {
                Entry::Trip(trip) => ListEntry::Trip {
                    trip,
                    dives: self
                        .trips
                        .get(trip)
                        .map(|t| t.dives.clone())
                        .unwrap_or_default(),
                },
                Entry::Dive(dive) => ListEntry::Dive { dive },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::Dive;

    const HOUR: i64 = 3600;
    const T: i64 = 1_700_000_000;

    fn log_with(times: &[i64]) -> (DiveLog, Vec<DiveId>) {
        let mut log = DiveLog::default();
        let ids = times
            .iter()
            .map(|t| log.add_dive(Dive::new(*t, 2_400)))
            .collect();
        (log, ids)
    }

    fn trip_of(log: &DiveLog, dive: DiveId) -> Option<TripId> {
        log.dive(dive).and_then(|d| d.trip)
    }

    /// Membership and start-time invariants over the whole log.
    fn assert_consistent(log: &DiveLog) {
        for trip in log.trips().iter() {
            assert!(!trip.dives.is_empty(), "empty trip {:?}", trip.id);
            let earliest = trip
                .dives
                .iter()
                .map(|d| log.dive(*d).unwrap().when)
                .min()
                .unwrap();
            assert_eq!(trip.when, earliest, "stale start on {:?}", trip.id);
            for d in &trip.dives {
                assert_eq!(trip_of(log, *d), Some(trip.id));
            }
        }
        for dive in log.dives().iter() {
            if let Some(t) = dive.trip {
                assert!(log.trip(t).unwrap().contains(dive.id));
            }
        }
    }

    #[test]
    fn test_add_dive_to_trip_lowers_start() {
        let (mut log, ids) = log_with(&[T, T + HOUR]);
        let trip = log.create_trip_from_dive(ids[1]).unwrap();
        assert_eq!(log.trip(trip).unwrap().when, T + HOUR);

        log.add_dive_to_trip(ids[0], trip);
        let t = log.trip(trip).unwrap();
        assert_eq!(t.when, T);
        assert_eq!(t.dives, vec![ids[0], ids[1]]);
        assert_eq!(log.dive(ids[0]).unwrap().trip_flag, TripFlag::Assigned);
        assert_consistent(&log);
    }

    #[test]
    fn test_add_dive_to_same_trip_is_noop() {
        let (mut log, ids) = log_with(&[T]);
        let trip = log.create_trip_from_dive(ids[0]).unwrap();
        log.add_dive_to_trip(ids[0], trip);
        assert_eq!(log.trip(trip).unwrap().member_count(), 1);
        assert_eq!(log.dive(ids[0]).unwrap().trip_flag, TripFlag::InTrip);
    }

    #[test]
    fn test_moving_last_dive_deletes_old_trip() {
        let (mut log, ids) = log_with(&[T, T + HOUR]);
        let a = log.create_trip_from_dive(ids[0]).unwrap();
        let b = log.create_trip_from_dive(ids[1]).unwrap();

        log.add_dive_to_trip(ids[1], a);
        assert!(log.trip(b).is_none());
        assert_eq!(log.trips().len(), 1);
        assert_consistent(&log);
    }

    #[test]
    fn test_remove_sole_member_deletes_trip() {
        let (mut log, ids) = log_with(&[T]);
        let trip = log.create_trip_from_dive(ids[0]).unwrap();
        log.remove_dive_from_trip(ids[0]);

        assert!(log.trip(trip).is_none());
        assert!(log.trips().is_empty());
        let dive = log.dive(ids[0]).unwrap();
        assert_eq!(dive.trip, None);
        assert_eq!(dive.trip_flag, TripFlag::NoTrip);
    }

    #[test]
    fn test_remove_earliest_member_moves_start() {
        let (mut log, ids) = log_with(&[T, T + HOUR, T + 2 * HOUR]);
        let trip = log.create_trip_from_dive(ids[0]).unwrap();
        log.add_dive_to_trip(ids[1], trip);
        log.add_dive_to_trip(ids[2], trip);

        log.remove_dive_from_trip(ids[0]);
        assert_eq!(log.trip(trip).unwrap().when, T + HOUR);
        assert_consistent(&log);
    }

    #[test]
    fn test_insert_trip_merges_same_start() {
        let (mut log, ids) = log_with(&[T, T + HOUR]);
        let trip = log.create_trip_from_dive(ids[0]).unwrap();

        let merged = log.insert_trip(TripDraft {
            when: T,
            location: Some("Dahab".to_string()),
            dives: vec![ids[1]],
            ..TripDraft::default()
        });
        assert_eq!(merged, trip);
        assert_eq!(log.trips().len(), 1);
        let t = log.trip(trip).unwrap();
        assert_eq!(t.location.as_deref(), Some("Dahab"));
        assert_eq!(t.dives, vec![ids[0], ids[1]]);
    }

    #[test]
    fn test_insert_trip_keeps_existing_location() {
        let (mut log, ids) = log_with(&[T, T + HOUR]);
        log.dives.get_mut(ids[0]).unwrap().location = Some("Blue Hole".to_string());
        let trip = log.create_trip_from_dive(ids[0]).unwrap();

        log.insert_trip(TripDraft {
            when: T,
            location: Some("Dahab".to_string()),
            dives: vec![ids[1]],
            ..TripDraft::default()
        });
        assert_eq!(log.trip(trip).unwrap().location.as_deref(), Some("Blue Hole"));
    }

    #[test]
    fn test_insert_trip_fills_blank_notes_only() {
        let (mut log, ids) = log_with(&[T, T + HOUR, T + 2 * HOUR]);
        let trip = log.create_trip_from_dive(ids[0]).unwrap();

        log.insert_trip(TripDraft {
            when: T,
            notes: Some("Liveaboard week".to_string()),
            dives: vec![ids[1]],
            ..TripDraft::default()
        });
        assert_eq!(log.trip(trip).unwrap().notes.as_deref(), Some("Liveaboard week"));

        log.insert_trip(TripDraft {
            when: T,
            notes: Some("Shore diving".to_string()),
            dives: vec![ids[2]],
            ..TripDraft::default()
        });
        assert_eq!(log.trips().len(), 1);
        assert_eq!(log.trip(trip).unwrap().notes.as_deref(), Some("Liveaboard week"));
    }

    #[test]
    #[should_panic]
    fn test_insert_trip_of_unknown_dives_panics() {
        let mut log = DiveLog::default();
        log.insert_trip(TripDraft {
            when: T,
            dives: vec![DiveId(999)],
            ..TripDraft::default()
        });
    }

    #[test]
    fn test_insert_trip_skips_unknown_dives() {
        let (mut log, ids) = log_with(&[T]);
        let trip = log.insert_trip(TripDraft {
            when: T,
            dives: vec![DiveId(999), ids[0]],
            ..TripDraft::default()
        });
        assert_eq!(log.trip(trip).unwrap().dives, vec![ids[0]]);
        assert_consistent(&log);
    }

    #[test]
    fn test_insert_trip_starts_at_earliest_dive() {
        let (mut log, ids) = log_with(&[T, T + HOUR]);
        let trip = log.insert_trip(TripDraft {
            when: T - 5 * HOUR,
            dives: vec![ids[1], ids[0]],
            ..TripDraft::default()
        });
        let t = log.trip(trip).unwrap();
        assert_eq!(t.when, T);
        assert_eq!(t.dives, vec![ids[0], ids[1]]);
        assert_consistent(&log);
    }

    #[test]
    fn test_insert_trip_joins_trip_at_resolved_start() {
        let (mut log, ids) = log_with(&[T, T + HOUR]);
        let existing = log.create_trip_from_dive(ids[0]).unwrap();
        let trip = log.insert_trip(TripDraft {
            when: T - 5 * HOUR,
            dives: vec![ids[0], ids[1]],
            ..TripDraft::default()
        });
        assert_eq!(trip, existing);
        assert_eq!(log.trips().len(), 1);
        assert_consistent(&log);
    }

    fn assert_distinct_starts(log: &DiveLog) {
        let starts: Vec<i64> = log.trips().iter().map(|t| t.when).collect();
        assert!(starts.windows(2).all(|w| w[0] < w[1]), "shared start in {starts:?}");
    }

    #[test]
    fn test_retimed_sole_member_folds_into_trip_at_same_start() {
        let (mut log, ids) = log_with(&[T, T + 10 * HOUR]);
        let a = log.create_trip_from_dive(ids[0]).unwrap();
        let b = log.create_trip_from_dive(ids[1]).unwrap();
        log.trips.get_mut(b).unwrap().location = Some("Marsa Alam".to_string());

        log.set_dive_time(ids[1], T);
        assert_eq!(log.trips().ids(), &[a]);
        assert_eq!(trip_of(&log, ids[1]), Some(a));
        assert_eq!(log.trip(a).unwrap().location.as_deref(), Some("Marsa Alam"));
        assert_distinct_starts(&log);
        assert_consistent(&log);
    }

    #[test]
    fn test_lowered_start_folds_into_trip_at_same_start() {
        let (mut log, ids) = log_with(&[T, T, T + 10 * HOUR]);
        let a = log.create_trip_from_dive(ids[0]).unwrap();
        let b = log.create_trip_from_dive(ids[2]).unwrap();

        // the joining dive starts exactly when trip a does
        assert_eq!(log.add_dive_to_trip(ids[1], b), Some(a));
        assert!(log.trip(b).is_none());
        assert_eq!(log.trip(a).unwrap().member_count(), 3);
        assert_distinct_starts(&log);
        assert_consistent(&log);
    }

    #[test]
    fn test_raised_start_folds_into_trip_at_same_start() {
        let (mut log, ids) = log_with(&[T, T + HOUR, T + HOUR]);
        let a = log.create_trip_from_dive(ids[0]).unwrap();
        log.add_dive_to_trip(ids[1], a);
        let c = log.create_trip_from_dive(ids[2]).unwrap();
        assert_ne!(a, c);

        // a's start moves up to T+1h, where c already starts
        log.remove_dive_from_trip(ids[0]);
        assert!(log.trip(a).is_none());
        assert_eq!(trip_of(&log, ids[1]), Some(c));
        assert_eq!(log.trip(c).unwrap().member_count(), 2);
        assert_distinct_starts(&log);
        assert_consistent(&log);
    }

    #[test]
    fn test_autogroup_skips_untimed_dives() {
        let mut config = Config::default();
        config.grouping.autogroup = true;
        let mut log = DiveLog::new(config);
        let untimed = log.add_dive(Dive::new(0, 2_400));
        let timed = log.add_dive(Dive::new(T, 2_400));

        assert_eq!(trip_of(&log, untimed), None);
        assert!(trip_of(&log, timed).is_some());
        assert_eq!(log.create_trip_from_dive(untimed), None);
    }

    #[test]
    fn test_autogroup_splits_on_gap() {
        let (mut log, ids) = log_with(&[T, T + HOUR, T + 50 * HOUR, T + 200 * HOUR]);
        log.autogroup();

        let first = trip_of(&log, ids[0]).unwrap();
        assert_eq!(trip_of(&log, ids[1]), Some(first));
        assert_eq!(trip_of(&log, ids[2]), Some(first));
        let second = trip_of(&log, ids[3]).unwrap();
        assert_ne!(first, second);
        assert!(log.trip(first).unwrap().autogen);
        assert!(log.trip(second).unwrap().autogen);
        assert_consistent(&log);
    }

    #[test]
    fn test_autogroup_respects_gap_setting() {
        let mut config = Config::default();
        config.grouping.gap_threshold_sec = 24 * HOUR;
        let mut log = DiveLog::new(config);
        let a = log.add_dive(Dive::new(T, 2_400));
        let b = log.add_dive(Dive::new(T + HOUR, 2_400));
        let c = log.add_dive(Dive::new(T + 50 * HOUR, 2_400));
        log.autogroup();

        assert_eq!(trip_of(&log, a), trip_of(&log, b));
        assert_ne!(trip_of(&log, b), trip_of(&log, c));
    }

    #[test]
    fn test_autogroup_skips_no_trip_dives() {
        let (mut log, ids) = log_with(&[T, T + HOUR, T + 2 * HOUR]);
        log.dives.get_mut(ids[1]).unwrap().trip_flag = TripFlag::NoTrip;
        log.autogroup();

        assert_eq!(trip_of(&log, ids[1]), None);
        // the opted-out dive breaks the chain
        assert_ne!(trip_of(&log, ids[0]), trip_of(&log, ids[2]));
        assert_eq!(log.trips().len(), 2);
    }

    #[test]
    fn test_autogroup_joins_existing_trip() {
        let (mut log, ids) = log_with(&[T, T + HOUR]);
        let manual = log.create_trip_from_dive(ids[0]).unwrap();
        log.autogroup();
        assert_eq!(trip_of(&log, ids[1]), Some(manual));
        assert!(!log.trip(manual).unwrap().autogen);
    }

    #[test]
    fn test_autogroup_on_add() {
        let mut config = Config::default();
        config.grouping.autogroup = true;
        let mut log = DiveLog::new(config);
        let a = log.add_dive(Dive::new(T, 2_400));
        let b = log.add_dive(Dive::new(T + HOUR, 2_400));
        assert!(trip_of(&log, a).is_some());
        assert_eq!(trip_of(&log, a), trip_of(&log, b));
    }

    #[test]
    fn test_split_then_merge_restores_trip() {
        let (mut log, ids) = log_with(&[T, T + HOUR, T + 2 * HOUR, T + 3 * HOUR]);
        let trip = log.create_trip_from_dive(ids[0]).unwrap();
        for id in &ids[1..] {
            log.add_dive_to_trip(*id, trip);
        }

        let tail = log.split_trip(ids[2]).unwrap();
        assert_eq!(log.trip(trip).unwrap().dives, vec![ids[0], ids[1]]);
        assert_eq!(log.trip(tail).unwrap().dives, vec![ids[2], ids[3]]);
        assert_eq!(log.trip(tail).unwrap().when, T + 2 * HOUR);
        assert_consistent(&log);

        log.merge_trips(trip, tail);
        assert!(log.trip(tail).is_none());
        let t = log.trip(trip).unwrap();
        assert_eq!(t.dives, ids);
        assert_eq!(t.when, T);
        assert_consistent(&log);
    }

    #[test]
    fn test_split_at_first_member_refused() {
        let (mut log, ids) = log_with(&[T, T + HOUR]);
        let trip = log.create_trip_from_dive(ids[0]).unwrap();
        log.add_dive_to_trip(ids[1], trip);
        assert_eq!(log.split_trip(ids[0]), None);
        assert_eq!(log.trips().len(), 1);
    }

    #[test]
    #[should_panic]
    fn test_merge_trip_into_itself_panics() {
        let (mut log, ids) = log_with(&[T]);
        let trip = log.create_trip_from_dive(ids[0]).unwrap();
        log.merge_trips(trip, trip);
    }

    #[test]
    fn test_merge_dive_into_trip_above() {
        let (mut log, ids) = log_with(&[T, T + HOUR, T + 2 * HOUR, T + 3 * HOUR]);
        let trip = log.create_trip_from_dive(ids[0]).unwrap();
        log.select_dive(ids[1]);
        log.select_dive(ids[2]);

        assert_eq!(log.merge_dive_into_trip_above(ids[1]), Some(trip));
        assert_eq!(log.trip(trip).unwrap().dives, vec![ids[0], ids[1], ids[2]]);
        assert_eq!(trip_of(&log, ids[3]), None);
        assert_eq!(log.dive(ids[1]).unwrap().trip_flag, TripFlag::InTrip);

        assert_eq!(log.merge_dive_into_trip_above(ids[3]), Some(trip));
        assert_eq!(log.merge_dive_into_trip_above(ids[3]), None);

        // nothing above the first dive
        let (mut other, other_ids) = log_with(&[T]);
        assert_eq!(other.merge_dive_into_trip_above(other_ids[0]), None);
    }

    #[test]
    fn test_remove_trip_marks_dives() {
        let (mut log, ids) = log_with(&[T, T + HOUR]);
        let trip = log.create_trip_from_dive(ids[0]).unwrap();
        log.add_dive_to_trip(ids[1], trip);

        assert!(log.remove_trip(trip));
        assert!(log.trips().is_empty());
        for id in &ids {
            let d = log.dive(*id).unwrap();
            assert_eq!(d.trip, None);
            assert_eq!(d.trip_flag, TripFlag::NoTrip);
        }
        assert!(!log.remove_trip(trip));
    }

    #[test]
    fn test_remove_autogen_trips_allows_regrouping() {
        let (mut log, ids) = log_with(&[T, T + HOUR, T + 100 * HOUR]);
        let manual = log.create_trip_from_dive(ids[2]).unwrap();
        log.autogroup();
        assert_eq!(log.trips().len(), 2);

        assert_eq!(log.remove_autogen_trips(), 1);
        assert_eq!(log.trips().ids(), &[manual]);
        assert_eq!(trip_of(&log, ids[0]), None);
        assert_eq!(log.dive(ids[0]).unwrap().trip_flag, TripFlag::Unset);

        log.autogroup();
        assert_eq!(trip_of(&log, ids[0]), trip_of(&log, ids[1]));
        assert!(trip_of(&log, ids[0]).is_some());
    }

    #[test]
    fn test_set_dive_time_sole_member_moves_trip() {
        let (mut log, ids) = log_with(&[T]);
        let trip = log.create_trip_from_dive(ids[0]).unwrap();
        assert!(log.set_dive_time(ids[0], T - HOUR));
        assert_eq!(log.trip(trip).unwrap().when, T - HOUR);
        assert_consistent(&log);
    }

    #[test]
    fn test_set_dive_time_before_trip_detaches() {
        let (mut log, ids) = log_with(&[T, T + HOUR]);
        let trip = log.create_trip_from_dive(ids[0]).unwrap();
        log.add_dive_to_trip(ids[1], trip);

        assert!(log.set_dive_time(ids[1], T - HOUR));
        assert_eq!(trip_of(&log, ids[1]), None);
        assert_eq!(log.dives().ids(), &[ids[1], ids[0]]);
        assert_consistent(&log);
    }

    #[test]
    fn test_set_dive_time_into_later_trip_detaches() {
        let (mut log, ids) = log_with(&[T, T + HOUR, T + 100 * HOUR]);
        let first = log.create_trip_from_dive(ids[0]).unwrap();
        log.add_dive_to_trip(ids[1], first);
        log.create_trip_from_dive(ids[2]).unwrap();

        log.set_dive_time(ids[1], T + 101 * HOUR);
        assert_eq!(trip_of(&log, ids[1]), None);
        assert_consistent(&log);
    }

    #[test]
    fn test_set_dive_time_within_trip_refreshes_start() {
        let (mut log, ids) = log_with(&[T, T + HOUR]);
        let trip = log.create_trip_from_dive(ids[0]).unwrap();
        log.add_dive_to_trip(ids[1], trip);

        log.set_dive_time(ids[0], T + 2 * HOUR);
        let t = log.trip(trip).unwrap();
        assert_eq!(t.when, T + HOUR);
        assert_eq!(t.dives, vec![ids[1], ids[0]]);
        assert_consistent(&log);
        assert!(!log.set_dive_time(ids[0], T + 2 * HOUR));
    }

    #[test]
    fn test_delete_dive_leaves_trip() {
        let (mut log, ids) = log_with(&[T, T + HOUR]);
        let trip = log.create_trip_from_dive(ids[0]).unwrap();
        log.add_dive_to_trip(ids[1], trip);

        log.delete_dive(ids[0]).unwrap();
        assert_eq!(log.trip(trip).unwrap().dives, vec![ids[1]]);
        log.delete_dive(ids[1]).unwrap();
        assert!(log.trips().is_empty());
    }

    #[test]
    fn test_display_order() {
        let (mut log, ids) = log_with(&[T, T + HOUR, T + 30 * HOUR, T + 100 * HOUR]);
        let trip = log.create_trip_from_dive(ids[0]).unwrap();
        log.add_dive_to_trip(ids[3], trip);

        // a trip member sorts by its trip's start
        assert_eq!(
            log.compare_for_display(Entry::Dive(ids[3]), Entry::Dive(ids[1])),
            Ordering::Less
        );
        assert_eq!(
            log.compare_for_display(Entry::Trip(trip), Entry::Dive(ids[1])),
            Ordering::Less
        );
        assert_eq!(
            log.compare_for_display(Entry::Dive(ids[0]), Entry::Dive(ids[3])),
            Ordering::Less
        );

        assert_eq!(
            log.display_entries(),
            vec![
                ListEntry::Trip {
                    trip,
                    dives: vec![ids[0], ids[3]]
                },
                ListEntry::Dive { dive: ids[1] },
                ListEntry::Dive { dive: ids[2] },
            ]
        );
    }
}
