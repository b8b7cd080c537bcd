//! Derived per-dive statistics.
//!
//! Pure functions over a dive's cylinders, weights and samples. Degenerate
//! input (no cylinders, no duration, no samples) produces zero rather than
//! an error, so callers can cache the result unconditionally.

use std::cmp::Ordering;

use crate::models::{Dive, DiveComputer, EventKind};
use crate::units::{depth_to_mbar, mbar_to_atm, O2_IN_AIR};

/// Samples shallower than this (mm) count as time at the surface.
pub const DEFAULT_SURFACE_DEPTH_MM: i32 = 100;

/// pO2 (mbar) below which no pulmonary toxicity accrues.
const OTU_PO2_THRESHOLD_MBAR: i32 = 500;

/// The "maximal" gas of a dive, used for display and sorting.
///
/// All zero means plain air.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, uniffi::Record)]
pub struct GasClass {
    pub o2_permille: i32,
    pub he_permille: i32,
    /// Leanest O2 across the dive's cylinders
    pub o2_low_permille: i32,
}

impl GasClass {
    pub const AIR: GasClass = GasClass {
        o2_permille: 0,
        he_permille: 0,
        o2_low_permille: 0,
    };

    pub fn is_air(&self) -> bool {
        self.o2_permille == 0 && self.he_permille == 0
    }
}

impl Ord for GasClass {
    /// Helium first, then O2, then the low end of the O2 range.
    fn cmp(&self, other: &Self) -> Ordering {
        self.he_permille
            .cmp(&other.he_permille)
            .then(self.o2_permille.cmp(&other.o2_permille))
            .then(self.o2_low_permille.cmp(&other.o2_low_permille))
    }
}

impl PartialOrd for GasClass {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Cached per-dive numbers shown in the dive list.
#[derive(Clone, Debug, Default, PartialEq, uniffi::Record)]
pub struct DerivedStats {
    /// Surface air consumption in ml/min
    pub sac_ml_min: i32,
    pub otu: i32,
    pub total_weight_g: i32,
    pub gas: GasClass,
}

impl DerivedStats {
    pub fn compute(dive: &Dive, surface_depth_mm: i32) -> Self {
        DerivedStats {
            sac_ml_min: calculate_sac(dive, surface_depth_mm),
            otu: calculate_otu(dive),
            total_weight_g: total_weight(Some(dive)),
            gas: classify_gas(dive),
        }
    }
}

/// Pick the representative gas of a dive.
///
/// Trimix trumps nitrox (highest He wins, O2 breaks ties) and nitrox trumps
/// air, even when hypoxic. A dive breathing nothing but air is reported as
/// [`GasClass::AIR`].
pub fn classify_gas(dive: &Dive) -> GasClass {
    let mut best: Option<(i32, i32)> = None;
    let mut min_o2 = 1000;

    for cyl in dive.cylinders.iter().filter(|c| !c.is_empty()) {
        let o2 = if cyl.gas.is_air() {
            O2_IN_AIR
        } else {
            cyl.gas.o2()
        };
        let he = cyl.gas.he_permille;
        min_o2 = min_o2.min(o2);

        let wins = match best {
            None => true,
            Some((best_o2, best_he)) => he > best_he || (he == best_he && o2 > best_o2),
        };
        if wins {
            best = Some((o2, he));
        }
    }

    match best {
        None => GasClass::AIR,
        Some((o2, he)) if he == 0 && o2 == O2_IN_AIR && min_o2 == o2 => GasClass::AIR,
        Some((o2, he)) => GasClass {
            o2_permille: o2,
            he_permille: he,
            o2_low_permille: min_o2,
        },
    }
}

/// Total ballast in grams.
pub fn total_weight(dive: Option<&Dive>) -> i32 {
    dive.map(|d| d.weights.iter().map(|w| w.grams).sum())
        .unwrap_or(0)
}

/// Gas used across all sized cylinders, in litres at surface pressure.
pub fn calculate_air_use(dive: &Dive) -> f64 {
    dive.cylinders
        .iter()
        .filter(|c| c.size_ml != 0)
        .map(|c| {
            let atm = mbar_to_atm(c.start_pressure_mbar()) - mbar_to_atm(c.end_pressure_mbar());
            atm * c.size_ml as f64 / 1000.0
        })
        .sum()
}

/// Surface air consumption in ml/min, from the first dive computer.
///
/// Surface stretches in the middle of a dive are taken out of the duration;
/// stretches at the very start or end are left in.
pub fn calculate_sac(dive: &Dive, surface_depth_mm: i32) -> i32 {
    let air_use = calculate_air_use(dive);
    if air_use == 0.0 {
        return 0;
    }
    let dc = dive.dc();
    let mut duration = dc
        .map(|dc| dc.duration_sec)
        .filter(|d| *d > 0)
        .unwrap_or(dive.duration_sec);
    if duration <= 0 {
        return 0;
    }

    if let Some(dc) = dc {
        duration -= interior_surface_time(dc, surface_depth_mm);
    }
    if duration <= 0 {
        return 0;
    }

    let mean_depth = dc.map(mean_depth_mm).unwrap_or(0);
    let pressure_bar =
        depth_to_mbar(mean_depth, dive.surface_pressure_mbar(), dive.salinity()) as f64 / 1000.0;
    let sac = air_use / pressure_bar * 60.0 / duration as f64;

    (sac * 1000.0) as i32
}

/// Seconds spent in surface runs that touch neither end of the profile.
fn interior_surface_time(dc: &DiveComputer, surface_depth_mm: i32) -> i32 {
    let samples = &dc.samples;
    let mut total = 0;
    let mut i = 0;
    while i < samples.len() {
        if samples[i].depth_mm >= surface_depth_mm {
            i += 1;
            continue;
        }
        let mut end = i + 1;
        while end < samples.len() && samples[end].depth_mm < surface_depth_mm {
            end += 1;
        }
        if i > 0 && end < samples.len() {
            total += samples[end - 1].t_sec - samples[i].t_sec;
        }
        i = end;
    }
    total
}

/// Recorded mean depth, or the time-weighted mean of the samples.
fn mean_depth_mm(dc: &DiveComputer) -> i32 {
    if dc.mean_depth_mm > 0 || dc.samples.len() < 2 {
        return dc.mean_depth_mm;
    }
    let mut weighted: i64 = 0;
    let mut span: i64 = 0;
    for pair in dc.samples.windows(2) {
        let dt = (pair[1].t_sec - pair[0].t_sec) as i64;
        weighted += (pair[0].depth_mm as i64 + pair[1].depth_mm as i64) * dt / 2;
        span += dt;
    }
    if span > 0 {
        (weighted / span) as i32
    } else {
        0
    }
}

/// O2 breathed at `t_sec`: the first cylinder's mix, overridden by the
/// latest gas change at or before that time.
pub fn active_o2(dive: &Dive, dc: &DiveComputer, t_sec: i32) -> i32 {
    let mut o2 = dive.cylinders.first().map(|c| c.gas.o2()).unwrap_or(O2_IN_AIR);
    for event in &dc.events {
        if event.t_sec > t_sec {
            break;
        }
        if let EventKind::GasChange { o2_permille, .. } = event.kind {
            o2 = if o2_permille == 0 { O2_IN_AIR } else { o2_permille };
        }
    }
    o2
}

/// Oxygen toxicity units over the first dive computer's profile.
pub fn calculate_otu(dive: &Dive) -> i32 {
    let Some(dc) = dive.dc() else {
        return 0;
    };
    let surface = dive.surface_pressure_mbar();
    let salinity = dive.salinity();

    let mut otu = 0.0;
    for pair in dc.samples.windows(2) {
        let (prev, sample) = (&pair[0], &pair[1]);
        let dt = (sample.t_sec - prev.t_sec) as f64;
        let po2 = match sample.po2_mbar.filter(|p| *p > 0) {
            Some(po2) => po2,
            None => {
                let o2 = active_o2(dive, dc, sample.t_sec);
                let ambient = depth_to_mbar(sample.depth_mm, surface, salinity);
                (o2 as f64 / 1000.0 * ambient as f64) as i32
            }
        };
        if po2 >= OTU_PO2_THRESHOLD_MBAR {
            let excess = (po2 - OTU_PO2_THRESHOLD_MBAR) as f64 / 1000.0;
            otu += excess.powf(0.83) * dt / 30.0;
        }
    }
    (otu + 0.5) as i32
}
