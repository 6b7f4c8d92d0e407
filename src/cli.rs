//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_schedule_adapter::CsvScheduleAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::nyse_calendar_adapter::NyseCalendarAdapter;
use crate::domain::bar::Bar;
use crate::domain::clock::{Clock, ClockConfig};
use crate::domain::config_validation::{
    parse_datetime, validate_calendar_config, validate_clock_config,
};
use crate::domain::error::ClockError;
use crate::domain::interval::{IntervalInput, INTERVALS_ALLOWED};
use crate::ports::config_port::ConfigPort;
use crate::ports::schedule_port::SchedulePort;

#[derive(Parser, Debug)]
#[command(name = "marketclock", about = "Exchange-aware backtest clock")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the bars of a date range, one per line
    Bars(BarsArgs),
    /// List supported intervals
    Intervals,
    /// Validate a clock configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Flags of the `bars` command. Each one overrides the matching config key.
#[derive(Args, Debug, Default, Clone)]
pub struct BarsArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Range start, New York local time
    #[arg(long)]
    pub start: Option<String>,
    /// Range end, New York local time (defaults to now)
    #[arg(long)]
    pub end: Option<String>,
    #[arg(short, long)]
    pub interval: Option<String>,
    /// Use pre/post market session boundaries
    #[arg(long)]
    pub extended: bool,
    /// Read sessions from a CSV file instead of the NYSE rules
    #[arg(long)]
    pub calendar_csv: Option<PathBuf>,
}

/// A [`ConfigPort`] that answers from command-line flags first and falls
/// back to the loaded file.
pub struct FlagOverrides<'a> {
    args: &'a BarsArgs,
    base: &'a dyn ConfigPort,
}

impl<'a> FlagOverrides<'a> {
    pub fn new(args: &'a BarsArgs, base: &'a dyn ConfigPort) -> Self {
        Self { args, base }
    }

    fn flag(&self, section: &str, key: &str) -> Option<String> {
        match (section, key) {
            ("clock", "start") => self.args.start.clone(),
            ("clock", "end") => self.args.end.clone(),
            ("clock", "interval") => self.args.interval.clone(),
            ("clock", "extended") if self.args.extended => Some("true".to_string()),
            ("calendar", "source") => self.args.calendar_csv.as_ref().map(|_| "csv".to_string()),
            ("calendar", "path") => self
                .args
                .calendar_csv
                .as_ref()
                .map(|p| p.display().to_string()),
            _ => None,
        }
    }
}

impl ConfigPort for FlagOverrides<'_> {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.flag(section, key)
            .or_else(|| self.base.get_string(section, key))
    }

    fn get_bool_opt(&self, section: &str, key: &str) -> Option<bool> {
        match self.flag(section, key) {
            Some(_) if section == "clock" && key == "extended" => Some(true),
            _ => self.base.get_bool_opt(section, key),
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Bars(args) => run_bars(&args),
        Command::Intervals => run_intervals(),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

/// Reads the `[clock]` section into a [`ClockConfig`].
///
/// `start` is required. `end` defaults to now, `interval` to `1d` and
/// `extended` to false.
pub fn build_clock_config(config: &dyn ConfigPort) -> Result<ClockConfig, ClockError> {
    let start_str = config
        .get_string("clock", "start")
        .ok_or_else(|| ClockError::ConfigMissing {
            section: "clock".into(),
            key: "start".into(),
        })?;
    let mut clock_config = ClockConfig::new(parse_datetime(&start_str, "clock", "start")?);

    if let Some(end_str) = config.get_string("clock", "end") {
        clock_config = clock_config.with_end(parse_datetime(&end_str, "clock", "end")?);
    }
    if let Some(interval) = config.get_string("clock", "interval") {
        clock_config = clock_config.with_interval(IntervalInput::Text(interval.trim().to_string()));
    }
    if config.get_string("clock", "extended").is_some() {
        let extended =
            config
                .get_bool_opt("clock", "extended")
                .ok_or_else(|| ClockError::ConfigInvalid {
                    section: "clock".into(),
                    key: "extended".into(),
                    reason: "extended must be true or false".into(),
                })?;
        clock_config = clock_config.with_extended(extended);
    }
    Ok(clock_config)
}

/// Picks the schedule source named by `[calendar] source`.
pub fn build_schedule_port(config: &dyn ConfigPort) -> Result<Box<dyn SchedulePort>, ClockError> {
    validate_calendar_config(config)?;
    let source = config
        .get_string("calendar", "source")
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|| "nyse".to_string());

    match source.as_str() {
        "csv" => {
            let path = config
                .get_string("calendar", "path")
                .ok_or_else(|| ClockError::ConfigMissing {
                    section: "calendar".into(),
                    key: "path".into(),
                })?;
            tracing::info!(path = %path, "using CSV schedule");
            Ok(Box::new(CsvScheduleAdapter::new(PathBuf::from(path.trim()))))
        }
        _ => Ok(Box::new(NyseCalendarAdapter::new())),
    }
}

/// Writes one rendered bar per line and returns how many were written.
pub fn write_bars<W: Write>(
    bars: impl IntoIterator<Item = Bar>,
    out: &mut W,
) -> Result<usize, ClockError> {
    let mut count = 0;
    for bar in bars {
        writeln!(out, "{bar}")?;
        count += 1;
    }
    out.flush()?;
    Ok(count)
}

fn run_bars(args: &BarsArgs) -> ExitCode {
    let file_config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(a) => a,
            Err(code) => return code,
        },
        None => match FileConfigAdapter::from_string("") {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        },
    };
    let config = FlagOverrides::new(args, &file_config);

    let result = build_clock_config(&config).and_then(|clock_config| {
        let schedule = build_schedule_port(&config)?;
        let clock = Clock::new(clock_config, schedule.as_ref())?;
        let stdout = io::stdout();
        let mut out = stdout.lock();
        write_bars(clock, &mut out)
    });

    match result {
        Ok(count) => {
            tracing::info!(bars = count, "done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_intervals() -> ExitCode {
    for interval in INTERVALS_ALLOWED {
        println!("{interval}");
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let validated =
        validate_clock_config(&adapter).and_then(|_| validate_calendar_config(&adapter));
    if let Err(e) = validated {
        eprintln!("error: {e}");
        return (&e).into();
    }

    eprintln!("Configuration is valid.");
    ExitCode::SUCCESS
}
