//! furnace-timeline CLI - project a scheduling snapshot onto a day-state timeline.
//!
//! Reads a snapshot JSON document (recipes, processes, calendar events) from a
//! file or stdin and prints the projection as JSON on stdout. Data-quality
//! warnings are logged to stderr; set `RUST_LOG` to adjust verbosity.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use furnace_timeline::{month_buckets, open_slots, project, ProjectionOptions, Snapshot};

#[derive(Parser)]
#[command(
    name = "furnace-timeline",
    version,
    about = "Project furnace processes onto a one-year day-state timeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Project every furnace's per-day states
    Project(ProjectArgs),
    /// Show each furnace's first open day and assignable date
    Slots(SnapshotArgs),
    /// Show the calendar-month header buckets for the horizon
    Months(HorizonArgs),
}

#[derive(Args)]
struct HorizonArgs {
    /// First projected day (YYYY-MM-DD). Defaults to today in --timezone
    #[arg(long)]
    start: Option<NaiveDate>,

    /// IANA timezone used to resolve "today" when --start is omitted
    #[arg(long, default_value = "UTC")]
    timezone: String,

    /// Horizon length in days. Defaults to the days in the start year
    #[arg(long)]
    days: Option<u32>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

impl HorizonArgs {
    fn options(&self) -> Result<ProjectionOptions> {
        let start = match self.start {
            Some(date) => date,
            None => today_in(&self.timezone)?,
        };
        let options = ProjectionOptions::new(start);
        Ok(match self.days {
            Some(days) => options.with_horizon_days(days),
            None => options,
        })
    }
}

#[derive(Args)]
struct SnapshotArgs {
    /// Snapshot JSON file (reads stdin if omitted or "-")
    input: Option<PathBuf>,

    #[command(flatten)]
    horizon: HorizonArgs,
}

#[derive(Args)]
struct ProjectArgs {
    #[command(flatten)]
    snapshot: SnapshotArgs,

    /// Only output the named furnace
    #[arg(long)]
    furnace: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Project(args) => {
            let snapshot = read_snapshot(&args.snapshot.input)?;
            let options = args.snapshot.horizon.options()?;
            let mut projection = project(&snapshot, &options)?;
            if let Some(name) = &args.furnace {
                projection.furnaces.retain(|f| &f.furnace == name);
                if projection.furnaces.is_empty() {
                    bail!("no furnace named '{name}' in snapshot");
                }
            }
            emit(&projection, args.snapshot.horizon.pretty)
        }
        Commands::Slots(args) => {
            let snapshot = read_snapshot(&args.input)?;
            let slots = open_slots(&snapshot, &args.horizon.options()?)?;
            emit(&slots, args.horizon.pretty)
        }
        Commands::Months(args) => {
            let axis = args.options()?.axis()?;
            emit(&month_buckets(&axis), args.pretty)
        }
    }
}

fn today_in(timezone: &str) -> Result<NaiveDate> {
    let tz: Tz = timezone
        .parse()
        .map_err(|e| anyhow!("invalid timezone '{timezone}': {e}"))?;
    Ok(Utc::now().with_timezone(&tz).date_naive())
}

fn read_snapshot(input: &Option<PathBuf>) -> Result<Snapshot> {
    let text = match input {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot from {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read snapshot from stdin")?;
            buf
        }
    };
    let snapshot = Snapshot::from_json(&text)?;
    tracing::debug!(
        recipes = snapshot.recipes.len(),
        processes = snapshot.processes.len(),
        events = snapshot.events.len(),
        "loaded snapshot"
    );
    Ok(snapshot)
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}")?;
    Ok(())
}
