use crate::stats::DerivedStats;
use crate::units::{O2_IN_AIR, SEAWATER_SALINITY, SURFACE_PRESSURE_MBAR};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DiveId(pub u32);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TripId(pub u32);

uniffi::custom_newtype!(DiveId, u32);
uniffi::custom_newtype!(TripId, u32);

/// Gas mixture as O2/He fractions in permille. Zero O2 means "not set",
/// which is treated as air.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, uniffi::Record)]
pub struct GasMix {
    pub o2_permille: i32,
    pub he_permille: i32,
}

impl GasMix {
    pub const AIR: GasMix = GasMix {
        o2_permille: O2_IN_AIR,
        he_permille: 0,
    };

    pub fn new(o2_permille: i32, he_permille: i32) -> Self {
        Self {
            o2_permille,
            he_permille,
        }
    }

    pub fn is_unset(&self) -> bool {
        self.o2_permille == 0 && self.he_permille == 0
    }

    /// O2 fraction with an unset value resolved to air.
    pub fn o2(&self) -> i32 {
        if self.o2_permille == 0 {
            O2_IN_AIR
        } else {
            self.o2_permille
        }
    }

    /// Air, allowing for the 21% vs 20.9% rounding people enter.
    pub fn is_air(&self) -> bool {
        self.he_permille == 0 && (self.o2() - O2_IN_AIR).abs() <= 1
    }
}

#[derive(Clone, Debug, Default, PartialEq, uniffi::Record)]
pub struct Cylinder {
    pub size_ml: i32,
    pub working_pressure_mbar: i32,
    pub description: Option<String>,
    pub gas: GasMix,
    /// Pressures entered by the diver (0 when not recorded).
    pub start_mbar: i32,
    pub end_mbar: i32,
    /// Pressures taken from the dive computer's tank sensor.
    pub sample_start_mbar: i32,
    pub sample_end_mbar: i32,
}

impl Cylinder {
    /// A cylinder slot with nothing filled in.
    pub fn is_empty(&self) -> bool {
        self.size_ml == 0
            && self.working_pressure_mbar == 0
            && self.description.is_none()
            && self.gas.is_unset()
            && self.start_mbar == 0
            && self.end_mbar == 0
    }

    pub fn start_pressure_mbar(&self) -> i32 {
        if self.start_mbar != 0 {
            self.start_mbar
        } else {
            self.sample_start_mbar
        }
    }

    pub fn end_pressure_mbar(&self) -> i32 {
        if self.end_mbar != 0 {
            self.end_mbar
        } else {
            self.sample_end_mbar
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, uniffi::Record)]
pub struct WeightSystem {
    pub grams: i32,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, uniffi::Record)]
pub struct Sample {
    /// Time offset from dive start in seconds
    pub t_sec: i32,
    pub depth_mm: i32,
    /// Measured pO2 (mbar), for rebreathers or O2 sensors
    pub po2_mbar: Option<i32>,
    /// Cylinder breathed from at this sample
    pub cylinder_index: u32,
}

#[derive(Clone, Debug, PartialEq, uniffi::Enum)]
pub enum EventKind {
    GasChange { o2_permille: i32, he_permille: i32 },
    Bookmark,
    Other { name: String },
}

#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct Event {
    pub t_sec: i32,
    pub kind: EventKind,
}

/// One dive computer's recording of a dive.
#[derive(Clone, Debug, Default, PartialEq, uniffi::Record)]
pub struct DiveComputer {
    pub model: String,
    pub duration_sec: i32,
    pub max_depth_mm: i32,
    pub mean_depth_mm: i32,
    pub surface_pressure_mbar: Option<i32>,
    /// Grams per 10 litres
    pub salinity: Option<i32>,
    pub samples: Vec<Sample>,
    pub events: Vec<Event>,
}

/// How a dive came to be (or not be) in a trip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, uniffi::Enum)]
pub enum TripFlag {
    #[default]
    Unset,
    /// Explicitly taken out of trips; auto-grouping leaves it alone.
    NoTrip,
    /// Seeded a trip of its own.
    InTrip,
    /// Moved into an existing trip.
    Assigned,
}

#[derive(Clone, Debug, Default, PartialEq, uniffi::Record)]
pub struct Dive {
    pub id: DiveId,
    pub number: i32,
    /// Start time as Unix timestamp
    pub when: i64,
    pub duration_sec: i32,
    pub rating: i32,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub cylinders: Vec<Cylinder>,
    pub weights: Vec<WeightSystem>,
    pub computers: Vec<DiveComputer>,
    pub stats: DerivedStats,
    pub selected: bool,
    pub trip: Option<TripId>,
    pub trip_flag: TripFlag,
}

impl Dive {
    pub fn new(when: i64, duration_sec: i32) -> Self {
        Self {
            when,
            duration_sec,
            ..Self::default()
        }
    }

    pub fn end_time(&self) -> i64 {
        self.when + self.duration_sec as i64
    }

    /// The primary dive computer record.
    pub fn dc(&self) -> Option<&DiveComputer> {
        self.computers.first()
    }

    pub fn surface_pressure_mbar(&self) -> i32 {
        self.dc()
            .and_then(|dc| dc.surface_pressure_mbar)
            .filter(|p| *p > 0)
            .unwrap_or(SURFACE_PRESSURE_MBAR)
    }

    pub fn salinity(&self) -> i32 {
        self.dc()
            .and_then(|dc| dc.salinity)
            .filter(|s| *s > 0)
            .unwrap_or(SEAWATER_SALINITY)
    }

    pub fn needs_trip(&self) -> bool {
        self.trip_flag != TripFlag::NoTrip
    }
}

#[derive(Clone, Debug, Default, PartialEq, uniffi::Record)]
pub struct Trip {
    pub id: TripId,
    /// Start time: the earliest `when` among the member dives
    pub when: i64,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub autogen: bool,
    /// Member dives in chronological order
    pub dives: Vec<DiveId>,
}

impl Trip {
    pub fn member_count(&self) -> usize {
        self.dives.len()
    }

    pub fn contains(&self, dive: DiveId) -> bool {
        self.dives.contains(&dive)
    }
}

/// A trip that has not been registered yet. Its dives are moved into
/// whichever trip ends up holding the draft's start time.
#[derive(Clone, Debug, Default, PartialEq, uniffi::Record)]
pub struct TripDraft {
    pub when: i64,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub autogen: bool,
    pub dives: Vec<DiveId>,
}
