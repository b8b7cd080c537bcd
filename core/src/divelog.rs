//! The dive log: dives, trips and settings behind one owner.
//!
//! Every structural change goes through [`DiveLog`] so trip membership,
//! trip start times and the dive order stay consistent. Trip operations
//! live in [`crate::assign`], decompression replay in [`crate::deco`].

use crate::config::Config;
use crate::deco::{self, DecoState, TissueModel};
use crate::models::{Dive, DiveId, Trip, TripFlag, TripId};
use crate::stats::DerivedStats;
use crate::store::{DiveQuery, DiveStore};
use crate::trips::TripRegistry;

#[derive(Debug, Default)]
pub struct DiveLog {
    pub(crate) dives: DiveStore,
    pub(crate) trips: TripRegistry,
    config: Config,
    changed: bool,
}

impl DiveLog {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    pub fn dives(&self) -> &DiveStore {
        &self.dives
    }

    pub fn trips(&self) -> &TripRegistry {
        &self.trips
    }

    pub fn dive(&self, id: DiveId) -> Option<&Dive> {
        self.dives.get(id)
    }

    pub fn trip(&self, id: TripId) -> Option<&Trip> {
        self.trips.get(id)
    }

    pub fn list_dives(&self, query: &DiveQuery) -> Vec<&Dive> {
        self.dives.list(query)
    }

    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    pub fn mark_saved(&mut self) {
        self.changed = false;
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.changed
    }

    /// Add a dive in time order. Stats are computed on the way in, and the
    /// dive is grouped into a trip when auto-grouping is on.
    pub fn add_dive(&mut self, mut dive: Dive) -> DiveId {
        dive.stats = DerivedStats::compute(&dive, self.config.stats.surface_depth_mm);
        let id = self.dives.insert_sorted(dive);
        self.after_add(id);
        id
    }

    /// Add a dive at a specific list position, for imports that already
    /// know where it goes.
    pub fn add_dive_at(&mut self, idx: usize, mut dive: Dive) -> DiveId {
        dive.stats = DerivedStats::compute(&dive, self.config.stats.surface_depth_mm);
        let id = self.dives.insert_at(idx, dive);
        self.after_add(id);
        id
    }

    fn after_add(&mut self, id: DiveId) {
        tracing::debug!(dive = ?id, "added dive");
        self.changed = true;
        if self.config.grouping.autogroup {
            self.autogroup();
        }
    }

    /// Remove a dive, taking it out of its trip first.
    pub fn delete_dive(&mut self, id: DiveId) -> Option<Dive> {
        let idx = self.dives.position(id)?;
        self.detach(id, TripFlag::NoTrip);
        let dive = self.dives.remove_at(idx)?;
        self.changed = true;
        tracing::debug!(dive = ?id, "deleted dive");
        Some(dive)
    }

    pub fn delete_dive_at(&mut self, idx: usize) -> Option<Dive> {
        let id = self.dives.id_at(idx)?;
        self.delete_dive(id)
    }

    /// Delete every selected dive. Returns how many went.
    pub fn delete_selected_dives(&mut self) -> usize {
        let selected = self.dives.selected_ids();
        let count = selected
            .into_iter()
            .filter_map(|id| self.delete_dive(id))
            .count();
        if count > 0 {
            tracing::info!("Deleted {} selected dives", count);
        }
        count
    }

    /// Recompute one dive's derived statistics after its data changed.
    pub fn refresh_stats(&mut self, id: DiveId) -> bool {
        let surface_depth_mm = self.config.stats.surface_depth_mm;
        let Some(dive) = self.dives.get_mut(id) else {
            return false;
        };
        dive.stats = DerivedStats::compute(dive, surface_depth_mm);
        true
    }

    pub fn refresh_all_stats(&mut self) {
        let ids = self.dives.ids().to_vec();
        for id in ids {
            self.refresh_stats(id);
        }
    }

    pub fn select_dive(&mut self, id: DiveId) {
        self.dives.select(id);
    }

    pub fn deselect_dive(&mut self, id: DiveId) {
        self.dives.deselect(id);
    }

    pub fn select_only(&mut self, id: DiveId) -> bool {
        self.dives.select_only(id)
    }

    pub fn clear_selection(&mut self) {
        self.dives.clear_selection();
    }

    /// Replay the repetitive-dive history leading up to `id` through `model`.
    pub fn init_decompression<M: TissueModel>(
        &self,
        id: DiveId,
        model: &M,
    ) -> Option<DecoState<M::Tissues>> {
        deco::replay(
            &self.dives,
            id,
            model,
            self.config.deco.surface_interval_limit_sec,
        )
    }
}
