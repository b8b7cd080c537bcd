//! Repetitive-dive history replay.
//!
//! Before planning or rendering a dive, the tissue model has to be loaded
//! with whatever the diver did in the preceding surface intervals. This
//! module picks the relevant earlier dives and feeds them, gap by gap and
//! second by second, through a caller-supplied [`TissueModel`].

use crate::models::{Dive, DiveId, GasMix};
use crate::store::DiveStore;
use crate::units::{depth_to_mbar, interpolate, mbar_to_bar};

/// Default surface interval after which earlier dives no longer count.
pub const SURFACE_INTERVAL_LIMIT_SEC: i64 = 48 * 60 * 60;

/// A stretch of constant exposure handed to the tissue model.
#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct ExposureSegment {
    /// Ambient pressure (bar)
    pub pressure_bar: f64,
    pub gas: GasMix,
    pub duration_sec: u32,
    /// Measured pO2 (mbar), 0 for open circuit
    pub po2_mbar: i32,
}

impl ExposureSegment {
    /// Breathing air at the surface.
    pub fn surface(pressure_bar: f64, duration_sec: i64) -> Self {
        Self {
            pressure_bar,
            gas: GasMix::AIR,
            duration_sec: u32::try_from(duration_sec.max(0)).unwrap_or(u32::MAX),
            po2_mbar: 0,
        }
    }
}

/// Tissue saturation model driven by the replay.
///
/// The model never holds state of its own: every step takes the tissues
/// and returns the updated ones together with the ceiling tolerance.
pub trait TissueModel {
    type Tissues: Clone;

    /// Tissues equilibrated at the surface.
    fn clear(&self, surface_pressure_bar: f64) -> Self::Tissues;

    /// Expose the tissues to one segment.
    fn add_segment(
        &self,
        tissues: Self::Tissues,
        segment: &ExposureSegment,
    ) -> (Self::Tissues, f64);
}

#[derive(Clone, Debug, PartialEq)]
pub struct DecoState<T> {
    pub tissues: T,
    /// Tolerance returned by the last segment, 0.0 when nothing was replayed
    pub tolerance: f64,
    pub dives_replayed: usize,
}

/// One-second exposure segments along a dive's primary profile, with depth
/// interpolated linearly between samples.
pub fn profile_segments(dive: &Dive) -> impl Iterator<Item = ExposureSegment> + '_ {
    let surface = dive.surface_pressure_mbar();
    let salinity = dive.salinity();
    let samples = dive.dc().map(|dc| dc.samples.as_slice()).unwrap_or_default();

    samples.windows(2).flat_map(move |pair| {
        let (prev, next) = (&pair[0], &pair[1]);
        let gas = dive
            .cylinders
            .get(next.cylinder_index as usize)
            .map(|c| c.gas)
            .filter(|g| !g.is_unset())
            .unwrap_or(GasMix::AIR);
        let po2_mbar = next.po2_mbar.unwrap_or(0);
        let whole = next.t_sec - prev.t_sec;

        (prev.t_sec..next.t_sec).map(move |t| {
            let depth = interpolate(prev.depth_mm, next.depth_mm, t - prev.t_sec, whole);
            ExposureSegment {
                pressure_bar: mbar_to_bar(depth_to_mbar(depth, surface, salinity)),
                gas,
                duration_sec: 1,
                po2_mbar,
            }
        })
    })
}

/// Dives whose residual gas still matters for `target`, oldest first.
///
/// Walks back from the target while each earlier dive ended within
/// `limit_sec` of the earliest dive taken so far. When the target is in a
/// trip, dives of other trips are skipped over.
fn history<'a>(store: &'a DiveStore, target: DiveId, limit_sec: i64) -> Option<Vec<&'a Dive>> {
    let idx = store.position(target)?;
    let dive = store.get(target)?;
    let relevant = |p: &Dive| dive.trip.is_none() || p.trip == dive.trip;

    let mut earliest_when = dive.when;
    let mut picked = Vec::new();
    for i in (0..idx).rev() {
        let Some(prev) = store.at(i) else {
            continue;
        };
        if !relevant(prev) {
            continue;
        }
        if prev.when > earliest_when || prev.end_time() + limit_sec < earliest_when {
            break;
        }
        earliest_when = prev.when;
        picked.push(prev);
    }
    picked.reverse();
    Some(picked)
}

/// Load `model` with the history preceding `target`.
///
/// Returns `None` when the dive is unknown. With no history the tissues are
/// cleared at the target's surface pressure.
pub fn replay<M: TissueModel>(
    store: &DiveStore,
    target: DiveId,
    model: &M,
    limit_sec: i64,
) -> Option<DecoState<M::Tissues>> {
    let dive = store.get(target)?;
    let history = history(store, target, limit_sec)?;
    let target_surface = mbar_to_bar(dive.surface_pressure_mbar());

    let Some(first) = history.first() else {
        return Some(DecoState {
            tissues: model.clear(target_surface),
            tolerance: 0.0,
            dives_replayed: 0,
        });
    };

    let mut tissues = model.clear(mbar_to_bar(first.surface_pressure_mbar()));
    let mut tolerance = 0.0;
    let mut last_end: Option<i64> = None;

    // a surface interval is spent at the pressure of the dive that ends it
    for prev in &history {
        if let Some(end) = last_end {
            if prev.when > end {
                let surface = mbar_to_bar(prev.surface_pressure_mbar());
                let segment = ExposureSegment::surface(surface, prev.when - end);
                (tissues, tolerance) = model.add_segment(tissues, &segment);
            }
        }
        for segment in profile_segments(prev) {
            (tissues, tolerance) = model.add_segment(tissues, &segment);
        }
        last_end = Some(prev.end_time());
    }

    if let Some(end) = last_end {
        if dive.when > end {
            let segment = ExposureSegment::surface(target_surface, dive.when - end);
            (tissues, tolerance) = model.add_segment(tissues, &segment);
        }
    }

    tracing::debug!(
        dive = ?target,
        history = history.len(),
        tolerance,
        "replayed decompression history"
    );
    Some(DecoState {
        tissues,
        tolerance,
        dives_replayed: history.len(),
    })
}
