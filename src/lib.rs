//! Stillwater lake fishing advisor.
//!
//! Ranks stocked lakes, recommends fly patterns and starting depths by
//! species and season, and computes solunar bite windows (major and minor
//! feeding periods derived from lunar transit, underfoot, rise, and set
//! events) for a lake's coordinates on a given local calendar day.
//!
//! The solunar core is a small astronomical pipeline:
//!
//! ```text
//! ephemlib (lunar series) → toposlib (observer geometry) → searchlib
//! (event crossings) → solunar (events + windows) → advisor (display)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use stillwater::ephemlib::MeeusEphemeris;
//! use stillwater::solunar::{compute_solunar_periods, SolunarConfig};
//! use stillwater::toposlib::WGS84;
//!
//! let eph = MeeusEphemeris::new();
//! let lake = WGS84.latlon(50.67, -120.34, 345.0)?;
//! let date = chrono::NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
//! let tz: chrono_tz::Tz = "America/Vancouver".parse()?;
//! let periods = compute_solunar_periods(&eph, &lake, date, tz, &SolunarConfig::default())?;
//! for p in &periods {
//!     println!("{} {} .. {}", p.class.name(), p.start, p.end);
//! }
//! ```

pub mod advisor;
pub mod constants;
pub mod earthlib;
pub mod ephemlib;
pub mod searchlib;
pub mod solunar;
pub mod timelib;
pub mod toposlib;
