use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

/// Stillwater lake fishing advisor.
#[derive(Parser)]
#[command(
    name = "stillwater",
    version,
    about = "Rank stocked lakes and get fly, depth, and solunar bite-window advice"
)]
pub struct Cli {
    /// Path to the TOML lake table.
    #[arg(short, long, default_value = "lakes.toml")]
    pub lakes: PathBuf,

    /// Date to fish, e.g. 2025-06-15.
    #[arg(short, long)]
    pub date: NaiveDate,

    /// Focus on one lake by (fuzzy) name instead of ranking.
    #[arg(short = 'L', long)]
    pub lake: Option<String>,

    /// IANA timezone the lakes sit in.
    #[arg(long, default_value = "America/Vancouver")]
    pub tz: String,

    /// How many top lakes to show when ranking.
    #[arg(short, long, default_value_t = 3)]
    pub top: usize,

    /// Half-width of major solunar periods, minutes.
    #[arg(long, default_value_t = 90)]
    pub major_minutes: i64,

    /// Half-width of minor solunar periods, minutes.
    #[arg(long, default_value_t = 45)]
    pub minor_minutes: i64,

    /// Report full bite windows even when they spill past midnight.
    #[arg(long)]
    pub allow_spillover: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
