//! Earth rotation, sidereal time, and atmospheric refraction
//!
//! Implements the Earth Rotation Angle (ERA) per IAU 2000 Resolution B1.8,
//! Greenwich Mean Sidereal Time (GMST) per USNO Circular 179, Section 2.6.2,
//! and atmospheric refraction per the Bennett (1982) formula.
//!
//! GMST here stands in for apparent sidereal time: the equation of the
//! equinoxes is at most ~1.2 s, below the lunar series accuracy.

use crate::constants::J2000;

/// Compute the Earth Rotation Angle (ERA) for a UT1 date
///
/// Uses the expression from IAU Resolution B1.8 of 2000.
/// Returns a fraction between 0.0 and 1.0 representing whole rotations.
///
/// # Arguments
/// * `jd_ut1` - UT1 Julian date (whole part)
/// * `fraction_ut1` - UT1 Julian date (fractional part)
pub fn earth_rotation_angle(jd_ut1: f64, fraction_ut1: f64) -> f64 {
    let th = 0.7790572732640 + 0.00273781191135448 * (jd_ut1 - J2000 + fraction_ut1);
    (th.rem_euclid(1.0) + jd_ut1.rem_euclid(1.0) + fraction_ut1).rem_euclid(1.0)
}

/// Compute Greenwich Mean Sidereal Time (GMST) in hours
///
/// Follows the "equinox method" from USNO Circular 179, Section 2.6.2.
/// Precession-in-RA terms are from Capitaine et al. (2003), eq. (42).
///
/// # Arguments
/// * `jd_ut1` - UT1 Julian date (UTC is close enough here)
/// * `tt_centuries` - TT time in Julian centuries since J2000.0
pub fn sidereal_time(jd_ut1: f64, tt_centuries: f64) -> f64 {
    let theta = earth_rotation_angle(jd_ut1, 0.0);

    // Precession-in-RA terms in mean sidereal time
    // Coefficients in arcseconds, from USNO Circular 179 / Capitaine et al. (2003)
    let t = tt_centuries;
    let st = 0.014506
        + ((((-0.0000000368 * t - 0.000029956) * t - 0.00000044) * t + 1.3915817) * t
            + 4612.156534)
            * t;

    // st is in arcseconds (54000 arcseconds per hour of RA);
    // theta is in rotations (24 hours per rotation)
    (st / 54000.0 + theta * 24.0).rem_euclid(24.0)
}

const DEG2RAD: f64 = std::f64::consts::PI / 180.0;

/// Compute atmospheric refraction for an observed altitude.
///
/// Uses the Bennett formula: given the altitude at which a body is
/// observed, returns the amount by which the atmosphere has raised it.
///
/// # Arguments
/// * `alt_degrees` — Observed altitude above horizon in degrees
/// * `temperature_c` — Air temperature in Celsius
/// * `pressure_mbar` — Atmospheric pressure in millibars
///
/// Returns refraction in degrees. Returns 0.0 outside the range [-1°, 89.9°].
pub fn refraction(alt_degrees: f64, temperature_c: f64, pressure_mbar: f64) -> f64 {
    if !(-1.0..=89.9).contains(&alt_degrees) {
        return 0.0;
    }
    let r = 0.016667 / ((alt_degrees + 7.31 / (alt_degrees + 4.4)) * DEG2RAD).tan();
    r * (0.28 * pressure_mbar / (temperature_c + 273.0))
}
