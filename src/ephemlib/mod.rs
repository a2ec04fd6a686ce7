//! Lunar and solar ephemeris
//!
//! Positions come from compiled-in truncated series from Jean Meeus,
//! "Astronomical Algorithms": Ch. 47 for the Moon (top periodic terms of
//! Tables 47.A and 47.B plus the A1/A2/A3 additives, ~0.3° in longitude)
//! and Ch. 25 for the Sun's apparent longitude. That accuracy puts lunar
//! rise/set/transit instants within a couple of minutes of reference
//! almanacs, which is ample for feeding-window prediction.
//!
//! The provider is an owned value injected into the event finder, behind
//! the [`LunarEphemeris`] trait so tests can substitute a stub. Queries
//! are only meaningful inside [`LunarEphemeris::valid_jd_tt`]; the event
//! finder checks its whole search window up front and degrades cleanly.

use std::f64::consts::PI;
use std::ops::RangeInclusive;

use thiserror::Error;

const DEG: f64 = PI / 180.0;

/// Errors from the ephemeris provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EphemerisError {
    /// A query (or search window) falls outside the series validity range
    #[error("JD {jd} is outside the ephemeris validity range ({start}..{end})")]
    OutOfRange { jd: f64, start: f64, end: f64 },
}

/// Geocentric ecliptic coordinates of date
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EclipticCoord {
    /// Ecliptic longitude in degrees [0, 360)
    pub longitude_deg: f64,
    /// Ecliptic latitude in degrees
    pub latitude_deg: f64,
    /// Distance from Earth's center in kilometers
    pub distance_km: f64,
}

/// Geocentric equatorial coordinates of date
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquatorialCoord {
    /// Right ascension in degrees [0, 360)
    pub ra_deg: f64,
    /// Declination in degrees
    pub dec_deg: f64,
    /// Distance from Earth's center in kilometers
    pub distance_km: f64,
}

/// Source of lunar (and supporting solar) positions as a function of time.
///
/// All time arguments are TT Julian dates. Implementations must be
/// deterministic: identical inputs produce bit-identical outputs.
pub trait LunarEphemeris {
    /// TT Julian date range over which this provider is valid.
    fn valid_jd_tt(&self) -> RangeInclusive<f64>;

    /// Geocentric ecliptic position of the Moon.
    fn moon_ecliptic(&self, jd_tt: f64) -> EclipticCoord;

    /// Apparent ecliptic longitude of the Sun in degrees [0, 360).
    fn sun_apparent_longitude(&self, jd_tt: f64) -> f64;

    /// Verify that an entire search window lies inside the validity range.
    fn check_window(&self, jd_start: f64, jd_end: f64) -> Result<(), EphemerisError> {
        let range = self.valid_jd_tt();
        for jd in [jd_start, jd_end] {
            if !range.contains(&jd) {
                return Err(EphemerisError::OutOfRange {
                    jd,
                    start: *range.start(),
                    end: *range.end(),
                });
            }
        }
        Ok(())
    }

    /// Geocentric equatorial position of the Moon, using the mean
    /// obliquity of date.
    fn moon_equatorial(&self, jd_tt: f64) -> EquatorialCoord {
        let ecl = self.moon_ecliptic(jd_tt);
        let t = crate::timelib::julian_centuries(jd_tt);
        let (ra, dec) = ecliptic_to_equatorial(
            ecl.longitude_deg,
            ecl.latitude_deg,
            obliquity_corrected(t),
        );
        EquatorialCoord {
            ra_deg: ra,
            dec_deg: dec,
            distance_km: ecl.distance_km,
        }
    }

    /// Moon phase angle in degrees [0, 360): the Moon-Sun ecliptic
    /// longitude difference. 0° = new, 90° = first quarter, 180° = full,
    /// 270° = last quarter.
    fn moon_phase_angle(&self, jd_tt: f64) -> f64 {
        normalize_degrees(self.moon_ecliptic(jd_tt).longitude_deg - self.sun_apparent_longitude(jd_tt))
    }
}

/// Human-readable moon phase names indexed by quarter 0..3
pub const MOON_PHASE_NAMES: &[&str] = &["New Moon", "First Quarter", "Full Moon", "Last Quarter"];

/// Name of the quarter nearest a phase angle in degrees.
pub fn moon_phase_name(phase_angle_deg: f64) -> &'static str {
    let idx = ((phase_angle_deg / 90.0).round() as usize) % 4;
    MOON_PHASE_NAMES[idx]
}

// Periodic terms for longitude and distance (Meeus Table 47.A, top 20)
// Each entry: (D, M, Mp, F, coeff_l, coeff_r)
// coeff_l in units of 1e-6 degrees, coeff_r in units of 1e-3 km
const TERMS_LR: [(f64, f64, f64, f64, f64, f64); 20] = [
    (0.0, 0.0, 1.0, 0.0, 6_288_774.0, -20_905_355.0),
    (2.0, 0.0, -1.0, 0.0, 1_274_027.0, -3_699_111.0),
    (2.0, 0.0, 0.0, 0.0, 658_314.0, -2_955_968.0),
    (0.0, 0.0, 2.0, 0.0, 213_618.0, -569_925.0),
    (0.0, 1.0, 0.0, 0.0, -185_116.0, 48_888.0),
    (0.0, 0.0, 0.0, 2.0, -114_332.0, -3_149.0),
    (2.0, 0.0, -2.0, 0.0, 58_793.0, 246_158.0),
    (2.0, -1.0, -1.0, 0.0, 57_066.0, -152_138.0),
    (2.0, 0.0, 1.0, 0.0, 53_322.0, -170_733.0),
    (2.0, -1.0, 0.0, 0.0, 45_758.0, -204_586.0),
    (0.0, 1.0, -1.0, 0.0, -40_923.0, -129_620.0),
    (1.0, 0.0, 0.0, 0.0, -34_720.0, 108_743.0),
    (0.0, 1.0, 1.0, 0.0, -30_383.0, 104_755.0),
    (2.0, 0.0, 0.0, -2.0, 15_327.0, 10_321.0),
    (0.0, 0.0, 1.0, 2.0, -12_528.0, 0.0),
    (0.0, 0.0, 1.0, -2.0, 10_980.0, 79_661.0),
    (4.0, 0.0, -1.0, 0.0, 10_675.0, -34_782.0),
    (0.0, 0.0, 3.0, 0.0, 10_034.0, -23_210.0),
    (4.0, 0.0, -2.0, 0.0, 8_548.0, -21_636.0),
    (2.0, 1.0, -1.0, 0.0, -7_888.0, 24_208.0),
];

// Periodic terms for latitude (Meeus Table 47.B, top 20)
// Each entry: (D, M, Mp, F, coeff_b) in units of 1e-6 degrees
const TERMS_B: [(f64, f64, f64, f64, f64); 20] = [
    (0.0, 0.0, 0.0, 1.0, 5_128_122.0),
    (0.0, 0.0, 1.0, 1.0, 280_602.0),
    (0.0, 0.0, 1.0, -1.0, 277_693.0),
    (2.0, 0.0, 0.0, -1.0, 173_237.0),
    (2.0, 0.0, -1.0, 1.0, 55_413.0),
    (2.0, 0.0, -1.0, -1.0, 46_271.0),
    (2.0, 0.0, 0.0, 1.0, 32_573.0),
    (0.0, 0.0, 2.0, 1.0, 17_198.0),
    (2.0, 0.0, 1.0, -1.0, 9_266.0),
    (0.0, 0.0, 2.0, -1.0, 8_822.0),
    (2.0, -1.0, 0.0, -1.0, 8_216.0),
    (2.0, 0.0, -2.0, -1.0, 4_324.0),
    (2.0, 0.0, 1.0, 1.0, 4_200.0),
    (2.0, 1.0, 0.0, -1.0, -3_359.0),
    (2.0, -1.0, -1.0, 1.0, 2_463.0),
    (2.0, -1.0, 0.0, 1.0, 2_211.0),
    (2.0, -1.0, -1.0, -1.0, 2_065.0),
    (0.0, 1.0, -1.0, -1.0, -1_870.0),
    (4.0, 0.0, -1.0, -1.0, 1_828.0),
    (0.0, 1.0, 0.0, 1.0, -1_794.0),
];

/// Compiled-in analytic ephemeris (Meeus truncated series).
#[derive(Debug, Clone, Copy, Default)]
pub struct MeeusEphemeris;

/// Validity window: years 1600..2400. The truncated series loses accuracy
/// gradually outside a few centuries of J2000; this range keeps instants
/// within the documented couple-of-minutes tolerance.
const VALID_JD_START: f64 = 2_305_447.5; // 1600-01-01
const VALID_JD_END: f64 = 2_597_641.5; // 2400-01-01

impl MeeusEphemeris {
    pub fn new() -> Self {
        MeeusEphemeris
    }
}

impl LunarEphemeris for MeeusEphemeris {
    fn valid_jd_tt(&self) -> RangeInclusive<f64> {
        VALID_JD_START..=VALID_JD_END
    }

    fn moon_ecliptic(&self, jd_tt: f64) -> EclipticCoord {
        let t = crate::timelib::julian_centuries(jd_tt);
        moon_ecliptic_series(t)
    }

    fn sun_apparent_longitude(&self, jd_tt: f64) -> f64 {
        let t = crate::timelib::julian_centuries(jd_tt);
        sun_apparent_longitude_series(t)
    }
}

/// Normalize an angle in degrees to [0, 360).
pub fn normalize_degrees(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Moon mean longitude (L'), degrees
fn moon_mean_longitude(t: f64) -> f64 {
    normalize_degrees(
        218.3164477 + 481_267.88123421 * t - 0.0015786 * t * t + t * t * t / 538_841.0
            - t * t * t * t / 65_194_000.0,
    )
}

/// Moon mean elongation (D), degrees
fn moon_mean_elongation(t: f64) -> f64 {
    normalize_degrees(
        297.8501921 + 445_267.1114034 * t - 0.0018819 * t * t + t * t * t / 545_868.0
            - t * t * t * t / 113_065_000.0,
    )
}

/// Sun mean anomaly (M), degrees
fn sun_mean_anomaly_ch47(t: f64) -> f64 {
    normalize_degrees(357.5291092 + 35_999.0502909 * t - 0.0001536 * t * t + t * t * t / 24_490_000.0)
}

/// Moon mean anomaly (M'), degrees
fn moon_mean_anomaly(t: f64) -> f64 {
    normalize_degrees(
        134.9633964 + 477_198.8675055 * t + 0.0087414 * t * t + t * t * t / 69_699.0
            - t * t * t * t / 14_712_000.0,
    )
}

/// Moon argument of latitude (F), degrees
fn moon_argument_of_latitude(t: f64) -> f64 {
    normalize_degrees(
        93.2720950 + 483_202.0175233 * t - 0.0036539 * t * t - t * t * t / 3_526_000.0
            + t * t * t * t / 863_310_000.0,
    )
}

/// Evaluate the Ch. 47 series at a TT Julian century.
fn moon_ecliptic_series(t: f64) -> EclipticCoord {
    let lp = moon_mean_longitude(t);
    let d = moon_mean_elongation(t);
    let m = sun_mean_anomaly_ch47(t);
    let mp = moon_mean_anomaly(t);
    let f = moon_argument_of_latitude(t);

    // Earth eccentricity correction for terms involving M
    let e = 1.0 - 0.002516 * t - 0.0000074 * t * t;
    let e2 = e * e;

    let mut sum_l: f64 = 0.0;
    let mut sum_r: f64 = 0.0;
    for &(td, tm, tmp, tf, cl, cr) in &TERMS_LR {
        let arg = (td * d + tm * m + tmp * mp + tf * f) * DEG;
        let e_factor = match tm.abs() as i32 {
            1 => e,
            2 => e2,
            _ => 1.0,
        };
        sum_l += cl * e_factor * arg.sin();
        sum_r += cr * e_factor * arg.cos();
    }

    let mut sum_b: f64 = 0.0;
    for &(td, tm, tmp, tf, cb) in &TERMS_B {
        let arg = (td * d + tm * m + tmp * mp + tf * f) * DEG;
        let e_factor = match tm.abs() as i32 {
            1 => e,
            2 => e2,
            _ => 1.0,
        };
        sum_b += cb * e_factor * arg.sin();
    }

    // Additive corrections (A1: Venus, A2: Jupiter, A3: flattening)
    let a1 = normalize_degrees(119.75 + 131.849 * t);
    let a2 = normalize_degrees(53.09 + 479_264.290 * t);
    let a3 = normalize_degrees(313.45 + 481_266.484 * t);

    sum_l += 3_958.0 * (a1 * DEG).sin();
    sum_l += 1_962.0 * ((lp - f) * DEG).sin();
    sum_l += 318.0 * (a2 * DEG).sin();

    sum_b += -2_235.0 * (lp * DEG).sin();
    sum_b += 382.0 * (a3 * DEG).sin();
    sum_b += 175.0 * ((a1 - f) * DEG).sin();
    sum_b += 175.0 * ((a1 + f) * DEG).sin();
    sum_b += 127.0 * ((lp - mp) * DEG).sin();
    sum_b += -115.0 * ((lp + mp) * DEG).sin();

    EclipticCoord {
        longitude_deg: normalize_degrees(lp + sum_l / 1e6),
        latitude_deg: sum_b / 1e6,
        distance_km: 385_000.56 + sum_r / 1000.0,
    }
}

fn sun_mean_longitude(t: f64) -> f64 {
    normalize_degrees(280.46646 + t * (36_000.76983 + t * 0.0003032))
}

fn sun_mean_anomaly_ch25(t: f64) -> f64 {
    normalize_degrees(357.52911 + t * (35_999.05029 - t * 0.0001537))
}

fn sun_equation_of_center(t: f64) -> f64 {
    let m = sun_mean_anomaly_ch25(t) * DEG;
    m.sin() * (1.914602 - t * (0.004817 + t * 0.000014))
        + (2.0 * m).sin() * (0.019993 - t * 0.000101)
        + (3.0 * m).sin() * 0.000289
}

/// Sun's apparent ecliptic longitude (Meeus Ch. 25), degrees [0, 360).
fn sun_apparent_longitude_series(t: f64) -> f64 {
    let omega = 125.04 - 1934.136 * t;
    normalize_degrees(
        sun_mean_longitude(t) + sun_equation_of_center(t) - 0.00569 - 0.00478 * (omega * DEG).sin(),
    )
}

/// Mean obliquity of the ecliptic (Meeus 22.2), degrees.
fn mean_obliquity(t: f64) -> f64 {
    23.0 + (26.0 + (21.448 - t * (46.815 + t * (0.00059 - t * 0.001813))) / 60.0) / 60.0
}

/// Obliquity corrected for nutation's dominant term, degrees.
fn obliquity_corrected(t: f64) -> f64 {
    let omega = 125.04 - 1934.136 * t;
    mean_obliquity(t) + 0.00256 * (omega * DEG).cos()
}

/// Ecliptic to equatorial coordinate transform.
/// Returns (right_ascension_deg, declination_deg).
fn ecliptic_to_equatorial(lon_deg: f64, lat_deg: f64, obliquity_deg: f64) -> (f64, f64) {
    let lon = lon_deg * DEG;
    let lat = lat_deg * DEG;
    let obl = obliquity_deg * DEG;

    let ra = (lon.sin() * obl.cos() - lat.tan() * obl.sin()).atan2(lon.cos());
    let dec = (lat.sin() * obl.cos() + lat.cos() * obl.sin() * lon.sin()).asin();

    (normalize_degrees(ra / DEG), dec / DEG)
}
