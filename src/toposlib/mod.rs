//! Geographic observer positions on Earth
//!
//! Represents an observer at a geodetic location (a lake) and rotates
//! celestial positions into their local horizon frame. The transformation
//! chain is:
//!
//! ```text
//! Geodetic (lat/lon/elev) → ITRS xyz → horizon (south, east, up) → alt/az
//! ```
//!
//! The Moon's ITRS position is built from its equatorial coordinates and
//! Greenwich sidereal time; subtracting the observer's ITRS vector before
//! the horizon rotation yields a genuinely topocentric altitude, so lunar
//! parallax (up to ~1°) needs no separate correction term.

use nalgebra::Vector3;
use std::f64::consts::PI;
use thiserror::Error;

use crate::constants::{WGS84_INVERSE_FLATTENING, WGS84_RADIUS_KM};

/// Rejected observer coordinates.
///
/// Out-of-range input fails here, before any computation starts; nothing
/// is ever clamped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    /// Latitude outside [-90, 90] degrees
    #[error("latitude {0}° is outside [-90°, 90°]")]
    LatitudeOutOfRange(f64),

    /// Longitude outside [-180, 180] degrees
    #[error("longitude {0}° is outside [-180°, 180°]")]
    LongitudeOutOfRange(f64),
}

/// An Earth ellipsoid model used for geodetic-to-geocentric conversion.
#[derive(Debug, Clone)]
pub struct Geoid {
    /// Name of the geoid model
    pub name: &'static str,
    /// Equatorial radius in kilometers
    pub radius_km: f64,
    /// Inverse flattening (a / (a - b))
    pub inverse_flattening: f64,
    /// (1 - f)^2, precomputed
    one_minus_flattening_squared: f64,
}

impl Geoid {
    /// Create a new geoid model.
    pub const fn new(name: &'static str, radius_km: f64, inverse_flattening: f64) -> Self {
        let f = 1.0 / inverse_flattening;
        let omf = 1.0 - f;
        Geoid {
            name,
            radius_km,
            inverse_flattening,
            one_minus_flattening_squared: omf * omf,
        }
    }

    /// Create a geographic position on this ellipsoid.
    ///
    /// # Arguments
    /// * `latitude_degrees` — Geodetic latitude in degrees (positive north)
    /// * `longitude_degrees` — Geodetic longitude in degrees (positive east)
    /// * `elevation_m` — Height above ellipsoid in meters
    ///
    /// # Errors
    /// [`LocationError`] if latitude or longitude is out of range.
    pub fn latlon(
        &self,
        latitude_degrees: f64,
        longitude_degrees: f64,
        elevation_m: f64,
    ) -> Result<GeographicPosition, LocationError> {
        if !(-90.0..=90.0).contains(&latitude_degrees) {
            return Err(LocationError::LatitudeOutOfRange(latitude_degrees));
        }
        if !(-180.0..=180.0).contains(&longitude_degrees) {
            return Err(LocationError::LongitudeOutOfRange(longitude_degrees));
        }

        let lat = latitude_degrees * PI / 180.0;
        let lon = longitude_degrees * PI / 180.0;

        let sinphi = lat.sin();
        let cosphi = lat.cos();

        // Radius of curvature in the prime vertical
        let c =
            1.0 / (cosphi * cosphi + sinphi * sinphi * self.one_minus_flattening_squared).sqrt();
        let s = self.one_minus_flattening_squared * c;

        let elevation_km = elevation_m / 1000.0;

        // ITRS position
        let xy = (self.radius_km * c + elevation_km) * cosphi;
        let x = xy * lon.cos();
        let y = xy * lon.sin();
        let z = (self.radius_km * s + elevation_km) * sinphi;

        Ok(GeographicPosition {
            latitude: lat,
            longitude: lon,
            elevation_m,
            itrs_xyz: Vector3::new(x, y, z),
        })
    }
}

/// WGS84 ellipsoid (GPS standard)
pub const WGS84: Geoid = Geoid::new("WGS84", WGS84_RADIUS_KM, WGS84_INVERSE_FLATTENING);

/// A geographic position on Earth's surface.
///
/// Holds the geodetic coordinates and precomputed ITRS position vector.
#[derive(Debug, Clone, PartialEq)]
pub struct GeographicPosition {
    /// Geodetic latitude in radians
    pub latitude: f64,
    /// Geodetic longitude in radians
    pub longitude: f64,
    /// Elevation above ellipsoid in meters
    pub elevation_m: f64,
    /// ITRS position in kilometers
    pub itrs_xyz: Vector3<f64>,
}

impl GeographicPosition {
    /// Local sidereal time in hours for a Greenwich sidereal time in hours.
    pub fn lst_hours(&self, gst_hours: f64) -> f64 {
        (gst_hours + self.longitude * 12.0 / PI).rem_euclid(24.0)
    }

    /// Local hour angle of a body in degrees [0, 360), measured westward
    /// from the upper meridian.
    pub fn hour_angle_degrees(&self, ra_degrees: f64, gst_hours: f64) -> f64 {
        (self.lst_hours(gst_hours) * 15.0 - ra_degrees).rem_euclid(360.0)
    }

    /// Topocentric altitude and azimuth of a body from its geocentric
    /// equatorial position.
    ///
    /// Returns `(altitude_degrees, azimuth_degrees)`.
    ///
    /// Altitude: degrees above horizon (negative below).
    /// Azimuth: degrees clockwise from north (0=N, 90=E, 180=S, 270=W).
    pub fn topocentric_altaz(
        &self,
        ra_degrees: f64,
        dec_degrees: f64,
        distance_km: f64,
        gst_hours: f64,
    ) -> (f64, f64) {
        // Body direction in ITRS: rotate the equatorial unit vector by GST
        let body_lon = (ra_degrees - gst_hours * 15.0) * PI / 180.0;
        let dec = dec_degrees * PI / 180.0;
        let unit = Vector3::new(
            dec.cos() * body_lon.cos(),
            dec.cos() * body_lon.sin(),
            dec.sin(),
        );

        // Shift origin from geocenter to observer
        let topocentric = unit * distance_km - self.itrs_xyz;

        let (alt, az) = self.itrs_to_horizon(&topocentric);
        (alt * 180.0 / PI, az * 180.0 / PI)
    }

    /// Rotate an ITRS direction vector into local horizon coordinates.
    ///
    /// Returns (altitude_radians, azimuth_radians).
    pub(crate) fn itrs_to_horizon(&self, itrs_direction: &Vector3<f64>) -> (f64, f64) {
        let slat = self.latitude.sin();
        let clat = self.latitude.cos();
        let slon = self.longitude.sin();
        let clon = self.longitude.cos();

        // Rotation from ITRS to local horizon (south, east, up)
        // R = R_y(90° - lat) × R_z(lon)
        let south = slat * clon * itrs_direction.x + slat * slon * itrs_direction.y
            - clat * itrs_direction.z;
        let east = -slon * itrs_direction.x + clon * itrs_direction.y;
        let up = clat * clon * itrs_direction.x
            + clat * slon * itrs_direction.y
            + slat * itrs_direction.z;

        let r_horiz = (south * south + east * east).sqrt();
        let alt = up.atan2(r_horiz);

        // Azimuth: measured clockwise from north
        let mut az = east.atan2(-south);
        if az < 0.0 {
            az += 2.0 * PI;
        }

        (alt, az)
    }
}

impl std::fmt::Display for GeographicPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lat_d = self.latitude * 180.0 / PI;
        let lon_d = self.longitude * 180.0 / PI;
        let ns = if lat_d >= 0.0 { "N" } else { "S" };
        let ew = if lon_d >= 0.0 { "E" } else { "W" };
        write!(
            f,
            "{:.4}° {}, {:.4}° {}, {:.1} m",
            lat_d.abs(),
            ns,
            lon_d.abs(),
            ew,
            self.elevation_m
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn wgs84_constants() {
        assert_relative_eq!(WGS84.radius_km, 6_378.137);
        assert_relative_eq!(WGS84.inverse_flattening, 298.257_223_563);
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        assert_eq!(
            WGS84.latlon(90.5, 0.0, 0.0),
            Err(LocationError::LatitudeOutOfRange(90.5))
        );
        assert!(WGS84.latlon(f64::NAN, 0.0, 0.0).is_err());
    }

    #[test]
    fn rejects_out_of_range_longitude() {
        assert_eq!(
            WGS84.latlon(0.0, -180.01, 0.0),
            Err(LocationError::LongitudeOutOfRange(-180.01))
        );
    }

    #[test]
    fn accepts_boundary_coordinates() {
        assert!(WGS84.latlon(90.0, 180.0, 0.0).is_ok());
        assert!(WGS84.latlon(-90.0, -180.0, 0.0).is_ok());
    }

    #[test]
    fn latlon_equator_prime_meridian() {
        let pos = WGS84.latlon(0.0, 0.0, 0.0).unwrap();
        assert_relative_eq!(pos.itrs_xyz.x, WGS84.radius_km, epsilon = 1e-9);
        assert_relative_eq!(pos.itrs_xyz.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(pos.itrs_xyz.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn latlon_north_pole_uses_polar_radius() {
        let pos = WGS84.latlon(90.0, 0.0, 0.0).unwrap();
        assert_relative_eq!(pos.itrs_xyz.x, 0.0, epsilon = 1e-9);
        let expected_polar_km = WGS84.radius_km * (1.0 - 1.0 / WGS84.inverse_flattening);
        assert_relative_eq!(pos.itrs_xyz.z, expected_polar_km, epsilon = 0.1);
    }

    #[test]
    fn latlon_elevation_extends_radius() {
        let ground = WGS84.latlon(0.0, 0.0, 0.0).unwrap();
        let high = WGS84.latlon(0.0, 0.0, 1000.0).unwrap();
        assert_relative_eq!(high.itrs_xyz.x - ground.itrs_xyz.x, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn latlon_hemispheres_mirror() {
        let north = WGS84.latlon(45.0, 0.0, 0.0).unwrap();
        let south = WGS84.latlon(-45.0, 0.0, 0.0).unwrap();
        assert_relative_eq!(north.itrs_xyz.x, south.itrs_xyz.x, epsilon = 1e-12);
        assert_relative_eq!(north.itrs_xyz.z, -south.itrs_xyz.z, epsilon = 1e-12);
    }

    #[test]
    fn horizon_rotation_up_at_equator() {
        let pos = WGS84.latlon(0.0, 0.0, 0.0).unwrap();
        let up_itrs = Vector3::new(1.0, 0.0, 0.0);
        let (alt, _az) = pos.itrs_to_horizon(&up_itrs);
        assert_relative_eq!(alt, PI / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn horizon_rotation_north_at_equator() {
        let pos = WGS84.latlon(0.0, 0.0, 0.0).unwrap();
        let north_itrs = Vector3::new(0.0, 0.0, 1.0);
        let (alt, az) = pos.itrs_to_horizon(&north_itrs);
        assert_relative_eq!(alt, 0.0, epsilon = 1e-9);
        assert_relative_eq!(az, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn lst_wraps_and_follows_longitude() {
        let greenwich = WGS84.latlon(51.48, 0.0, 0.0).unwrap();
        let tokyo = WGS84.latlon(35.68, 139.65, 0.0).unwrap();
        let gst = 3.0;
        let diff = (tokyo.lst_hours(gst) - greenwich.lst_hours(gst)).rem_euclid(24.0);
        assert_relative_eq!(diff, 139.65 / 15.0, epsilon = 1e-9);
    }

    #[test]
    fn hour_angle_zero_on_meridian() {
        let pos = WGS84.latlon(50.0, 0.0, 0.0).unwrap();
        // GST 6h = 90°: a body at RA 90° sits on the Greenwich meridian
        let ha = pos.hour_angle_degrees(90.0, 6.0);
        assert_relative_eq!(ha, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn parallax_depresses_the_moon_at_the_horizon() {
        let pos = WGS84.latlon(0.0, 0.0, 0.0).unwrap();
        // Body due east on the geocentric horizon at lunar distance
        let (alt, az) = pos.topocentric_altaz(90.0, 0.0, 384_400.0, 0.0);
        assert_relative_eq!(az, 90.0, epsilon = 1e-6);
        // Horizontal parallax for the mean lunar distance is ~0.95°
        assert_relative_eq!(alt, -0.95, epsilon = 0.02);
    }

    #[test]
    fn zenith_body_unaffected_by_azimuth_degeneracy() {
        let pos = WGS84.latlon(0.0, 0.0, 0.0).unwrap();
        let (alt, _az) = pos.topocentric_altaz(0.0, 0.0, 384_400.0, 0.0);
        assert!(alt > 89.0, "body on the local zenith line, got alt={alt}");
    }

    #[test]
    fn display_formats_hemispheres() {
        let pos = WGS84.latlon(50.67, -120.34, 345.0).unwrap();
        let s = format!("{pos}");
        assert!(s.contains('N'));
        assert!(s.contains('W'));
    }
}
