//! Foreign-language surface of the engine.
//!
//! Apps hold a [`DiveLogHandle`] and plug their own tissue model in through
//! [`ForeignTissueModel`]. Operations that would trip an internal assertion
//! on bad input are checked here first, so misuse from the app side comes
//! back as `false` or `None` instead of a panic across the boundary.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::assign::ListEntry;
use crate::config::Config;
use crate::deco::{ExposureSegment, TissueModel};
use crate::divelog::DiveLog;
use crate::error::Error;
use crate::gas::parse_gas_mix;
use crate::models::{Dive, DiveId, GasMix, Trip, TripDraft, TripId};
use crate::stats::GasClass;

#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct TissueUpdate {
    pub tissues: Vec<f64>,
    pub tolerance: f64,
}

/// Tissue model implemented by the host app. Tissues are opaque to the
/// engine and passed back unchanged.
#[uniffi::export(with_foreign)]
pub trait ForeignTissueModel: Send + Sync {
    fn clear(&self, surface_pressure_bar: f64) -> Vec<f64>;
    fn add_segment(&self, tissues: Vec<f64>, segment: ExposureSegment) -> TissueUpdate;
}

struct ForeignModel(Arc<dyn ForeignTissueModel>);

impl TissueModel for ForeignModel {
    type Tissues = Vec<f64>;

    fn clear(&self, surface_pressure_bar: f64) -> Vec<f64> {
        self.0.clear(surface_pressure_bar)
    }

    fn add_segment(&self, tissues: Vec<f64>, segment: &ExposureSegment) -> (Vec<f64>, f64) {
        let update = self.0.add_segment(tissues, segment.clone());
        (update.tissues, update.tolerance)
    }
}

#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct DecoReplay {
    pub tissues: Vec<f64>,
    pub tolerance: f64,
    pub dives_replayed: u32,
}

#[derive(uniffi::Object)]
pub struct DiveLogHandle {
    inner: Mutex<DiveLog>,
}

impl DiveLogHandle {
    fn log(&self) -> MutexGuard<'_, DiveLog> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[uniffi::export]
impl DiveLogHandle {
    #[uniffi::constructor]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(DiveLog::default()),
        })
    }

    #[uniffi::constructor]
    pub fn with_config_toml(config: String) -> std::result::Result<Arc<Self>, Error> {
        let config = Config::from_toml_str(&config)?;
        Ok(Arc::new(Self {
            inner: Mutex::new(DiveLog::new(config)),
        }))
    }

    pub fn add_dive(&self, dive: Dive) -> DiveId {
        self.log().add_dive(dive)
    }

    pub fn delete_dive(&self, dive: DiveId) -> bool {
        self.log().delete_dive(dive).is_some()
    }

    pub fn delete_selected_dives(&self) -> u32 {
        self.log().delete_selected_dives() as u32
    }

    pub fn dive(&self, dive: DiveId) -> Option<Dive> {
        self.log().dive(dive).cloned()
    }

    /// All dive ids, oldest first.
    pub fn dive_ids(&self) -> Vec<DiveId> {
        self.log().dives().ids().to_vec()
    }

    pub fn trip(&self, trip: TripId) -> Option<Trip> {
        self.log().trip(trip).cloned()
    }

    pub fn set_dive_time(&self, dive: DiveId, when: i64) -> bool {
        self.log().set_dive_time(dive, when)
    }

    pub fn refresh_stats(&self, dive: DiveId) -> bool {
        self.log().refresh_stats(dive)
    }

    pub fn refresh_all_stats(&self) {
        self.log().refresh_all_stats();
    }

    pub fn select_dive(&self, dive: DiveId) {
        self.log().select_dive(dive);
    }

    pub fn deselect_dive(&self, dive: DiveId) {
        self.log().deselect_dive(dive);
    }

    pub fn select_only(&self, dive: DiveId) -> bool {
        self.log().select_only(dive)
    }

    pub fn selected_dive_ids(&self) -> Vec<DiveId> {
        self.log().dives().selected_ids()
    }

    pub fn current_dive(&self) -> Option<DiveId> {
        self.log().dives().current()
    }

    /// The trip holding the dive afterwards.
    pub fn add_dive_to_trip(&self, dive: DiveId, trip: TripId) -> Option<TripId> {
        self.log().add_dive_to_trip(dive, trip)
    }

    pub fn remove_dive_from_trip(&self, dive: DiveId) {
        self.log().remove_dive_from_trip(dive);
    }

    /// `None` for a draft with no start time, or one with none of its
    /// dives in the log and no trip to merge into.
    pub fn insert_trip(&self, draft: TripDraft) -> Option<TripId> {
        let mut log = self.log();
        if draft.when == 0 {
            return None;
        }
        let known = draft.dives.iter().any(|d| log.dive(*d).is_some());
        if !known && log.trips().find_by_time(draft.when).is_none() {
            return None;
        }
        Some(log.insert_trip(draft))
    }

    pub fn create_trip_from_dive(&self, dive: DiveId) -> Option<TripId> {
        self.log().create_trip_from_dive(dive)
    }

    pub fn autogroup(&self) {
        self.log().autogroup();
    }

    pub fn merge_trips(&self, target: TripId, source: TripId) -> bool {
        let mut log = self.log();
        if target == source || log.trip(target).is_none() || log.trip(source).is_none() {
            return false;
        }
        log.merge_trips(target, source);
        true
    }

    pub fn split_trip(&self, from_dive: DiveId) -> Option<TripId> {
        self.log().split_trip(from_dive)
    }

    pub fn merge_dive_into_trip_above(&self, dive: DiveId) -> Option<TripId> {
        self.log().merge_dive_into_trip_above(dive)
    }

    pub fn remove_trip(&self, trip: TripId) -> bool {
        self.log().remove_trip(trip)
    }

    pub fn remove_autogen_trips(&self) -> u32 {
        self.log().remove_autogen_trips() as u32
    }

    pub fn display_entries(&self) -> Vec<ListEntry> {
        self.log().display_entries()
    }

    pub fn init_decompression(
        &self,
        dive: DiveId,
        model: Arc<dyn ForeignTissueModel>,
    ) -> Option<DecoReplay> {
        let state = self
            .log()
            .init_decompression(dive, &ForeignModel(model))?;
        Some(DecoReplay {
            tissues: state.tissues,
            tolerance: state.tolerance,
            dives_replayed: state.dives_replayed as u32,
        })
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.log().has_unsaved_changes()
    }

    pub fn mark_saved(&self) {
        self.log().mark_saved();
    }
}

#[uniffi::export]
pub fn parse_gas(text: String) -> std::result::Result<GasMix, Error> {
    parse_gas_mix(&text)
}

#[uniffi::export]
pub fn gas_mix_label(mix: GasMix) -> String {
    mix.label()
}

#[uniffi::export]
pub fn gas_class_label(class: GasClass) -> String {
    class.label()
}

#[uniffi::export]
pub fn init_logging(level: String) -> bool {
    crate::logging::init_with_level(&level)
}
