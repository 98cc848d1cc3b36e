use std::time::Duration;

use clap::{Args, Subcommand};
use forkpair_process::{PairConfig, RunReport, DEFAULT_MAX_PAIRS, DEFAULT_VALUES_PER_PAIR};

use crate::exit::{CliError, CliResult, CHILD_FAILED, SUCCESS, USAGE};
use crate::output::OutputFormat;

pub mod doctor;
pub mod multi;
pub mod single;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one producer/consumer pair (values 1..=K).
    Single(SingleArgs),
    /// Run N independent producer/consumer pairs.
    Multi(MultiArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Check that pipes and fork/wait work in this environment.
    Doctor(DoctorArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Single(args) => single::run(args, format),
        Command::Multi(args) => multi::run(args, format),
        Command::Version(args) => version::run(args),
        Command::Doctor(args) => doctor::run(args, format),
    }
}

/// Options shared by `single` and `multi`.
#[derive(Args, Debug)]
pub struct PairArgs {
    /// Values each producer sends.
    #[arg(long, default_value_t = DEFAULT_VALUES_PER_PAIR)]
    pub values: usize,
    /// Pause after each send (e.g. 100ms, 1s; bare numbers are milliseconds).
    #[arg(long, default_value = "100ms")]
    pub delay: String,
    /// Exit nonzero if any child exits nonzero.
    #[arg(long)]
    pub strict: bool,
}

impl PairArgs {
    pub fn to_config(&self) -> CliResult<PairConfig> {
        Ok(PairConfig::default()
            .with_values_per_pair(self.values)
            .with_send_delay(parse_duration(&self.delay)?))
    }
}

#[derive(Args, Debug)]
pub struct SingleArgs {
    #[command(flatten)]
    pub pair: PairArgs,
}

#[derive(Args, Debug)]
pub struct MultiArgs {
    /// Number of producer/consumer pairs.
    pub pairs: usize,
    /// Largest pair count accepted.
    #[arg(long, default_value_t = DEFAULT_MAX_PAIRS)]
    pub max_pairs: usize,
    #[command(flatten)]
    pub pair: PairArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {}

/// Exit code for a completed run.
pub fn finish(report: &RunReport, strict: bool) -> i32 {
    if strict && !report.all_succeeded() {
        CHILD_FAILED
    } else {
        SUCCESS
    }
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else if let Some(num) = input.strip_suffix('m') {
        (num, "m")
    } else {
        (input, "ms")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => value
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| CliError::new(USAGE, format!("duration too large: {input}"))),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}
