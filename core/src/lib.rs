pub mod assign;
pub mod config;
pub mod deco;
pub mod divelog;
pub mod error;
pub mod ffi;
pub mod gas;
pub mod logging;
pub mod models;
pub mod stats;
pub mod store;
pub mod trips;
pub mod units;

uniffi::setup_scaffolding!("divelog");

pub use assign::{Entry, ListEntry};
pub use config::Config;
pub use deco::{DecoState, ExposureSegment, TissueModel};
pub use divelog::DiveLog;
pub use error::Error;
pub use ffi::{DiveLogHandle, ForeignTissueModel};
pub use gas::parse_gas_mix;
pub use models::{
    Cylinder, Dive, DiveComputer, DiveId, Event, EventKind, GasMix, Sample, Trip, TripDraft,
    TripFlag, TripId, WeightSystem,
};
pub use stats::{DerivedStats, GasClass};
pub use store::{DiveQuery, DiveStore};
pub use trips::TripRegistry;
