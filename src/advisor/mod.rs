//! Lake ranking, fly selection, and advice assembly
//!
//! The advisory layer over the solunar core: static stocking records,
//! a season model for interior stillwater fisheries, and the
//! (species × season) fly and depth rule table. Everything here is a
//! deterministic lookup; the lake table is loaded once and never mutated.
//!
//! Missing solunar data never blocks a recommendation: if the bite-window
//! computation fails for a lake or date, the advice degrades to "no
//! bite-window data" and the fly/depth output still stands.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::ephemlib::{moon_phase_name, LunarEphemeris};
use crate::solunar::{compute_solunar_periods, SolunarConfig, SolunarPeriod};
use crate::timelib::{self, LocalDay};
use crate::toposlib::{LocationError, WGS84};

/// Errors from the advisory layer
#[derive(Error, Debug)]
pub enum AdvisorError {
    /// Lake table could not be read
    #[error("cannot read lake table {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Lake table is not valid TOML
    #[error("cannot parse lake table {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// No lake matched the requested name
    #[error("no lake matching {0:?} in the table")]
    UnknownLake(String),

    /// A lake record carries out-of-range coordinates
    #[error("lake {name:?} has invalid coordinates: {source}")]
    Location {
        name: String,
        source: LocationError,
    },
}

/// Stillwater season, derived from the calendar month.
///
/// Interior lakes fish very differently across these bands: ice-off
/// chironomid season, the early-summer sedge/damsel window, the warm
/// doldrums, and the fall leech bite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    /// December through February
    Winter,
    /// March and April
    Spring,
    /// May and June
    LateSpring,
    /// July and August
    Summer,
    /// September through November
    Fall,
}

impl Season {
    pub fn name(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::LateSpring => "late spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
        }
    }
}

/// Season for a calendar date.
pub fn season_for_date(date: NaiveDate) -> Season {
    match date.month() {
        12 | 1 | 2 => Season::Winter,
        3 | 4 => Season::Spring,
        5 | 6 => Season::LateSpring,
        7 | 8 => Season::Summer,
        _ => Season::Fall,
    }
}

/// A fly pattern with its starting-depth guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlyRecommendation {
    pub pattern: &'static str,
    pub depth: &'static str,
}

const fn fly(pattern: &'static str, depth: &'static str) -> FlyRecommendation {
    FlyRecommendation { pattern, depth }
}

/// Top fly types and starting depths for a stocked species and season.
///
/// Depths are typical stillwater starting points, not gospel. Kokanee
/// behave differently from trout and depth is often very lake-specific,
/// so they get their own conservative guidance regardless of season.
pub fn recommend_flies(species: &str, season: Season) -> Vec<FlyRecommendation> {
    if species.to_lowercase().contains("kokanee") {
        return vec![
            fly(
                "Tiny chironomid (size 14-18)",
                "10-25 ft (start at 15-20 ft; adjust until you mark/find fish)",
            ),
            fly(
                "Small pink/white micro-leech",
                "8-18 ft along drop-offs; slow troll/strip",
            ),
            fly(
                "Small flashy trolling fly",
                "15-35 ft (trolling depth depends on season and lake temp)",
            ),
        ];
    }

    match season {
        Season::Spring | Season::LateSpring => vec![
            fly(
                "Chironomid (black/red) size 12-16",
                "8-20 ft (start 12-15 ft; tune depth in 1-2 ft steps)",
            ),
            fly(
                "Callibaetis nymph",
                "4-12 ft over shoals/weed edges; intermediate line or long leader",
            ),
            fly(
                "Leech (olive/black)",
                "3-10 ft early/late; 6-15 ft if bright mid-day",
            ),
        ],
        Season::Summer => vec![
            fly("Damsel nymph", "2-8 ft along weed edges and cruising lanes"),
            fly(
                "Leech (early/late)",
                "3-10 ft at dawn/dusk; suspend deeper (10-18 ft) mid-day",
            ),
            fly(
                "Small chironomid (deeper)",
                "12-30 ft (start 18-22 ft during bright mid-day)",
            ),
        ],
        Season::Winter => vec![
            fly("Chironomid (small 14-18)", "10-25 ft (mid-day best; very slow)"),
            fly("Leech (black)", "8-18 ft (slow strips/pause)"),
            fly("Scud / shrimp", "6-14 ft near weeds/soft bottom"),
        ],
        Season::Fall => vec![
            fly(
                "Leech (black)",
                "6-18 ft (windward shore or drop-offs; slow/steady)",
            ),
            fly("Chironomid", "10-25 ft (start 14-18 ft; adjust)"),
            fly("Scud / shrimp", "4-12 ft near weeds/soft bottom"),
        ],
    }
}

/// One stocked lake: static record loaded from the lake table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Lake {
    /// Display name
    pub name: String,
    /// Stocking-strength score (effective stocked quantity)
    #[serde(default)]
    pub score: f64,
    /// Stocked or target species
    #[serde(default = "default_species")]
    pub species: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Surface elevation in meters
    #[serde(default)]
    pub elevation_m: f64,
}

fn default_species() -> String {
    "Rainbow Trout".to_string()
}

/// The lake table: an immutable lookup loaded once per session.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LakeFile {
    #[serde(default)]
    pub lakes: Vec<Lake>,
}

impl LakeFile {
    /// Load the table from a TOML file.
    pub fn load(path: &Path) -> Result<Self, AdvisorError> {
        let text = fs::read_to_string(path).map_err(|source| AdvisorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| AdvisorError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Top `n` lakes by descending stocking score. Ties break
    /// alphabetically so the ranking is stable run to run.
    pub fn rank(&self, n: usize) -> Vec<&Lake> {
        let mut ranked: Vec<&Lake> = self.lakes.iter().collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });
        ranked.truncate(n);
        ranked
    }

    /// Find a lake by user-supplied name.
    ///
    /// Matching runs over alphanumeric-normalized keys: exact match
    /// first, then prefix, then substring. "tunkwa", "Tunkwa Lake",
    /// and "tunk" all find Tunkwa.
    pub fn find(&self, name: &str) -> Option<&Lake> {
        let key = normalize(name);
        if key.is_empty() {
            return None;
        }

        if let Some(lake) = self.lakes.iter().find(|l| normalize(&l.name) == key) {
            return Some(lake);
        }
        if let Some(lake) = self
            .lakes
            .iter()
            .find(|l| normalize(&l.name).starts_with(&key))
        {
            return Some(lake);
        }
        self.lakes
            .iter()
            .find(|l| normalize(&l.name).contains(&key) || key.contains(&normalize(&l.name)))
    }
}

/// Lowercase a name and strip everything but letters and digits.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// A complete recommendation for one lake and day.
#[derive(Debug, Clone)]
pub struct Advice {
    pub lake: Lake,
    pub date: NaiveDate,
    pub season: Season,
    pub flies: Vec<FlyRecommendation>,
    /// Name of the nearest moon quarter, when the ephemeris covers the day
    pub moon_phase: Option<&'static str>,
    /// Solunar bite windows; `None` when the computation failed and the
    /// advice degraded
    pub periods: Option<Vec<SolunarPeriod>>,
}

/// Assemble the advice for one lake on one local day.
///
/// Fly and season output always succeeds; solunar output degrades to
/// `None` on ephemeris failure with a logged warning.
pub fn advise<E: LunarEphemeris>(
    eph: &E,
    lake: &Lake,
    date: NaiveDate,
    tz: Tz,
    config: &SolunarConfig,
) -> Result<Advice, AdvisorError> {
    let location = WGS84
        .latlon(lake.latitude, lake.longitude, lake.elevation_m)
        .map_err(|source| AdvisorError::Location {
            name: lake.name.clone(),
            source,
        })?;

    let season = season_for_date(date);
    let flies = recommend_flies(&lake.species, season);

    let periods = match compute_solunar_periods(eph, &location, date, tz, config) {
        Ok(periods) => Some(periods),
        Err(err) => {
            warn!(lake = %lake.name, %date, error = %err, "no bite-window data available");
            None
        }
    };

    let moon_phase = moon_phase_for_day(eph, date, tz);

    Ok(Advice {
        lake: lake.clone(),
        date,
        season,
        flies,
        moon_phase,
        periods,
    })
}

/// Moon phase at the middle of the local day, if the ephemeris covers it.
fn moon_phase_for_day<E: LunarEphemeris>(eph: &E, date: NaiveDate, tz: Tz) -> Option<&'static str> {
    let day = LocalDay::resolve(date, tz);
    let midday = day.start + (day.end - day.start) / 2;
    let jd_tt = timelib::jd_tt(timelib::julian_date(&midday));
    if !eph.valid_jd_tt().contains(&jd_tt) {
        return None;
    }
    Some(moon_phase_name(eph.moon_phase_angle(jd_tt)))
}
