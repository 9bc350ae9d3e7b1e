//! Replay command: run a recorded drive through the tracking engine.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use routetrack::logging::{default_log_dir, default_log_file, init_logging};
use routetrack::replay::{self, ReplayOptions, ReplayReport};

use super::common::{load_config, StrategyArg};
use crate::error::CliError;

/// Output format for replay results.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable summary
    Summary,
    /// Full report with every frame as JSON
    Json,
}

/// Arguments for `routetrack replay`.
#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Scenario JSON file (route, samples, optional server headings)
    pub scenario: PathBuf,

    /// Config file to use instead of ~/.routetrack/config.ini
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Route heading strategy (defaults to the configured one)
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Output format
    #[arg(long, value_enum, default_value = "summary")]
    pub format: OutputFormat,

    /// Stop at the first fix that reaches the destination
    #[arg(long)]
    pub stop_on_arrival: bool,

    /// Directory for the log file (defaults to ~/.routetrack/logs)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

/// Run the replay command.
pub fn run(args: ReplayArgs) -> Result<(), CliError> {
    let log_dir = args.log_dir.clone().unwrap_or_else(default_log_dir);
    let _logging_guard = init_logging(&log_dir, default_log_file())
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    tracing::info!(scenario = %args.scenario.display(), "Replaying scenario");

    let config = load_config(args.config.as_deref())?;
    let scenario = replay::load_scenario(&args.scenario)?;
    let options = ReplayOptions {
        strategy: args.strategy.map(Into::into),
        stop_on_arrival: args.stop_on_arrival,
    };

    let report = replay::run(&scenario, config, options)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let written = match args.format {
        OutputFormat::Json => write_json(&mut out, &report),
        OutputFormat::Summary => write_summary(&mut out, &report),
    };
    written.map_err(|e| CliError::Output(e.to_string()))
}

fn write_json<W: Write>(out: &mut W, report: &ReplayReport) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)
}

fn write_summary<W: Write>(out: &mut W, report: &ReplayReport) -> io::Result<()> {
    let summary = &report.summary;

    writeln!(out, "Replay Summary")?;
    writeln!(out, "==============")?;
    writeln!(out)?;
    writeln!(out, "  Route length:     {:.1} m", summary.route_length_m)?;
    writeln!(
        out,
        "  Fixes processed:  {} of {}",
        summary.samples_processed, summary.samples_total
    )?;
    writeln!(out, "  On route:         {}", summary.on_track)?;
    writeln!(out, "  Off route:        {}", summary.out_of_route)?;
    writeln!(
        out,
        "  Final progress:   {:.1} m ({:.0}%)",
        summary.final_progress_m,
        percent(summary.final_progress_m, summary.route_length_m)
    )?;
    match summary.arrived_at {
        Some(at) => writeln!(out, "  Arrived:          yes, at {}", at.to_rfc3339())?,
        None => writeln!(out, "  Arrived:          no")?,
    }

    if !summary.heading_sources.is_empty() {
        writeln!(out)?;
        writeln!(out, "  Heading sources:")?;
        for (source, count) in &summary.heading_sources {
            writeln!(out, "    {:<14} {}", source, count)?;
        }
    }

    Ok(())
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        100.0
    }
}
