use anyhow::{anyhow, Context, Result};
use chrono::Duration;
use chrono_tz::Tz;
use clap::Parser;

use stillwater::advisor::{advise, Advice, LakeFile};
use stillwater::ephemlib::MeeusEphemeris;
use stillwater::solunar::{ClipPolicy, SolunarConfig};

mod cli;
mod logging;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    logging::init(args.verbose);

    let table = LakeFile::load(&args.lakes)
        .with_context(|| format!("loading lake table {:?}", args.lakes))?;
    let tz: Tz = args
        .tz
        .parse()
        .map_err(|_| anyhow!("unknown timezone {:?}", args.tz))?;

    let config = SolunarConfig {
        major_half_width: Duration::minutes(args.major_minutes),
        minor_half_width: Duration::minutes(args.minor_minutes),
        clip_policy: if args.allow_spillover {
            ClipPolicy::AllowSpillover
        } else {
            ClipPolicy::ClipToDay
        },
        ..SolunarConfig::default()
    };
    let eph = MeeusEphemeris::new();

    if let Some(name) = &args.lake {
        let lake = table
            .find(name)
            .ok_or_else(|| anyhow!("no lake matching {name:?}; check spelling or run without --lake"))?;
        let advice = advise(&eph, lake, args.date, tz, &config)?;
        print_lake_heading(&advice);
        print_advice_body(&advice, tz, "  ");
        return Ok(());
    }

    let top = table.rank(args.top);
    if top.is_empty() {
        return Err(anyhow!("lake table {:?} holds no lakes", args.lakes));
    }

    println!("TOP {} LAKES - {}", top.len(), args.date);
    for (i, lake) in top.iter().enumerate() {
        let advice = advise(&eph, lake, args.date, tz, &config)?;
        println!(
            "{}) {} (stocking score {:.0})",
            i + 1,
            advice.lake.name,
            advice.lake.score
        );
        print_advice_body(&advice, tz, "    ");
        println!();
    }
    println!("Tip: run again with --lake \"<name>\" to focus on one lake.");

    Ok(())
}

fn print_lake_heading(advice: &Advice) {
    println!("LAKE: {}", advice.lake.name);
    println!("DATE: {}", advice.date);
    println!("SEASON: {}", advice.season.name());
    println!("SPECIES: {}", advice.lake.species);
}

fn print_advice_body(advice: &Advice, tz: Tz, indent: &str) {
    if let Some(phase) = advice.moon_phase {
        println!("{indent}Moon: {phase}");
    }

    println!("{indent}Top flies + starting depth:");
    for (i, fly) in advice.flies.iter().enumerate() {
        println!("{indent} {}) {}", i + 1, fly.pattern);
        println!("{indent}    Depth: {}", fly.depth);
    }

    match &advice.periods {
        Some(periods) if !periods.is_empty() => {
            println!("{indent}Bite windows (local time):");
            for p in periods {
                println!(
                    "{indent} {} ({})  {} - {}",
                    p.class.name(),
                    p.kind.name(),
                    p.start.with_timezone(&tz).format("%H:%M"),
                    p.end.with_timezone(&tz).format("%H:%M"),
                );
            }
        }
        Some(_) => println!("{indent}Bite windows: none inside this day"),
        None => println!("{indent}Bite windows: no data available"),
    }
}
