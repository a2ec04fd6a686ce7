//! Shared astronomical and geodetic constants

use std::f64::consts::PI;

/// Full circle in radians
pub const TAU: f64 = 2.0 * PI;

/// Seconds per day
pub const DAY_S: f64 = 86_400.0;

/// Julian date of the J2000.0 epoch (2000 January 1.5 TT)
pub const J2000: f64 = 2_451_545.0;

/// Days per Julian century
pub const JULIAN_CENTURY_DAYS: f64 = 36_525.0;

/// TT − UTC in seconds for the modern era (32.184 s + 37 leap seconds).
///
/// Treated as fixed: a one-second error in the time argument moves the
/// Moon by well under an arcsecond, far below the accuracy of the
/// compiled-in lunar series.
pub const TT_MINUS_UTC_S: f64 = 69.184;

/// WGS84 equatorial radius in kilometers
pub const WGS84_RADIUS_KM: f64 = 6_378.137;

/// WGS84 inverse flattening (a / (a - b))
pub const WGS84_INVERSE_FLATTENING: f64 = 298.257_223_563;

/// Standard atmospheric refraction at the horizon (34 arcminutes).
///
/// The Moon is treated as a point source: rise and set are the instants
/// its topocentric center crosses this depression angle. Parallax is
/// handled geometrically in `toposlib`, not folded into this constant.
pub const MOON_HORIZON_DEGREES: f64 = -34.0 / 60.0;
