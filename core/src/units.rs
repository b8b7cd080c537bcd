//! Unit conversion helpers.
//!
//! Dives store integer quantities (millimetres, millibar, millilitres, grams,
//! permille). These pure functions turn them into the pressures the
//! statistics and replay code need.

/// Fraction of O2 in air, in permille.
pub const O2_IN_AIR: i32 = 209;

/// Default surface atmospheric pressure at sea level (mbar).
pub const SURFACE_PRESSURE_MBAR: i32 = 1013;

/// Sea water salinity in grams per 10 litres.
pub const SEAWATER_SALINITY: i32 = 10300;

/// One standard atmosphere (mbar).
const MBAR_PER_ATM: f64 = 1013.25;

/// Ambient pressure (mbar) at `depth_mm` below a surface at `surface_mbar`,
/// for water of the given salinity (g/10L).
pub fn depth_to_mbar(depth_mm: i32, surface_mbar: i32, salinity: i32) -> i32 {
    let specific_weight = salinity as f64 / 10_000.0 * 0.981;
    (depth_mm as f64 / 10.0 * specific_weight + surface_mbar as f64 + 0.5) as i32
}

pub fn mbar_to_atm(mbar: i32) -> f64 {
    mbar as f64 / MBAR_PER_ATM
}

pub fn mbar_to_bar(mbar: i32) -> f64 {
    mbar as f64 / 1000.0
}

/// Linear interpolation between `a` and `b`, `part` of the way through
/// `whole`, rounded to the nearest integer.
pub fn interpolate(a: i32, b: i32, part: i32, whole: i32) -> i32 {
    if whole <= 0 {
        return a;
    }
    let (a, b, part, whole) = (a as i64, b as i64, part as i64, whole as i64);
    let x = a * (whole - part) + b * part;
    ((x + whole / 2).div_euclid(whole)) as i32
}
