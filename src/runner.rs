//! Command line front end for the `riskysir` binary.
//!
//! ```text
//! riskysir probability --r0 3 --hotspot-fraction 0.5 --risk-mean 0.25
//! riskysir curve --hotspot-fraction 0.25,0.5,0.75 --risk-mean 0.125,0.25,0.5
//! riskysir --output-dir out curve --homogeneous
//! ```
//!
//! Results are written as CSV to stdout, or to `<output-dir>/<command>.csv` when an output
//! directory is given. Log messages go to stderr.

use std::io::Write;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::curve::{
    CurveBuilder, CurveGrid, DEFAULT_GRID_END, DEFAULT_GRID_START, DEFAULT_GRID_STEP,
};
use crate::error::ExtinctionError;
use crate::extinction::ExtinctionCalculator;
use crate::log::{info, set_log_level, set_module_filter, LevelFilter};
use crate::offspring::OffspringModel;
use crate::parameters::EpidemicParameters;
use crate::report::{
    create_report_file, write_family_csv, write_homogeneous_csv, write_records_csv,
};
use crate::solver::{FixedPointSolver, DEFAULT_ITERATIONS};

#[derive(Parser, Debug)]
#[command(
    name = "riskysir",
    version,
    about = "Extinction and outbreak probabilities for branching processes with hotspot transmission"
)]
pub struct Cli {
    #[command(flatten)]
    pub base: BaseArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Arguments shared by every command
#[derive(Args, Debug)]
pub struct BaseArgs {
    /// Optional path for an epidemic parameters JSON file. Its values become the defaults for
    /// the parameter flags.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Optional directory for report output. Reports go to stdout otherwise.
    #[arg(short, long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Enable logging. Either a level (`info`) or comma separated `module=level` pairs
    /// (`riskysir::curve=debug,riskysir::solver=off`), or both.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Number of bisection steps per extinction probability
    #[arg(long, default_value_t = DEFAULT_ITERATIONS, global = true)]
    pub iterations: usize,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extinction and outbreak probability for a single parameter set
    Probability(ProbabilityArgs),
    /// Outbreak probability over a grid of R0 values
    Curve(CurveArgs),
}

#[derive(Args, Debug)]
pub struct ProbabilityArgs {
    /// Basic reproduction number
    #[arg(long)]
    pub r0: Option<f64>,

    /// Share of transmission attributable to hotspots, in [0, 1]
    #[arg(long)]
    pub hotspot_fraction: Option<f64>,

    /// Mean of the risk-tolerance distribution
    #[arg(long)]
    pub risk_mean: Option<f64>,

    /// Population size
    #[arg(long)]
    pub population: Option<usize>,

    #[arg(long, value_enum, default_value_t = OffspringModel::Poisson)]
    pub model: OffspringModel,
}

#[derive(Args, Debug)]
pub struct CurveArgs {
    /// Hotspot fractions, one curve per value and risk-tolerance mean
    #[arg(long, value_delimiter = ',', default_values_t = [0.25, 0.5, 0.75])]
    pub hotspot_fraction: Vec<f64>,

    /// Risk-tolerance means, one curve per value and hotspot fraction
    #[arg(long, value_delimiter = ',', default_values_t = [0.125, 0.25, 0.5])]
    pub risk_mean: Vec<f64>,

    /// Population size
    #[arg(long)]
    pub population: Option<usize>,

    #[arg(long, default_value_t = DEFAULT_GRID_START)]
    pub start: f64,

    #[arg(long, default_value_t = DEFAULT_GRID_END)]
    pub end: f64,

    #[arg(long, default_value_t = DEFAULT_GRID_STEP)]
    pub step: f64,

    #[arg(long, value_enum, default_value_t = OffspringModel::Poisson)]
    pub model: OffspringModel,

    /// Only compute the homogeneous (no hotspot) control curve
    #[arg(long)]
    pub homogeneous: bool,
}

/// Parses a `--log-level` value into an optional global level and a list of module filters.
///
/// # Errors
///
/// Returns an error naming the first item that is not a valid level.
pub fn parse_log_level(
    value: &str,
) -> Result<(Option<LevelFilter>, Vec<(String, LevelFilter)>), ExtinctionError> {
    let mut global = None;
    let mut modules = Vec::new();
    for item in value.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        match item.split_once('=') {
            Some((module, level)) => {
                let level: LevelFilter = level
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid log level in `{item}`"))?;
                modules.push((module.trim().to_string(), level));
            }
            None => {
                let level: LevelFilter = item
                    .parse()
                    .map_err(|_| format!("invalid log level `{item}`"))?;
                global = Some(level);
            }
        }
    }
    Ok((global, modules))
}

fn verbosity_level(verbose: u8) -> Option<LevelFilter> {
    match verbose {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    }
}

fn configure_logging(args: &BaseArgs) -> Result<(), ExtinctionError> {
    let (global, modules) = match &args.log_level {
        Some(value) => parse_log_level(value)?,
        None => (None, Vec::new()),
    };
    // With only module filters given, every other module still reports errors.
    let global = global
        .or_else(|| verbosity_level(args.verbose))
        .or_else(|| (!modules.is_empty()).then_some(LevelFilter::Error));
    if let Some(level) = global {
        set_log_level(level);
        info!("Logging enabled at level {}", level);
    }
    for (module, level) in &modules {
        set_module_filter(module, *level);
        info!("Logging enabled for {} at level {}", module, level);
    }
    Ok(())
}

/// Parses the process arguments and runs the selected command, writing to stdout.
///
/// # Errors
///
/// Returns any configuration, domain, numerical or I/O error raised by the command.
pub fn run_with_args() -> Result<(), ExtinctionError> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    run(cli, stdout.lock())
}

/// Runs an already parsed command line. Output goes to `stdout` unless an output directory was
/// given.
///
/// # Errors
///
/// Returns any configuration, domain, numerical or I/O error raised by the command.
pub fn run<W: Write>(cli: Cli, stdout: W) -> Result<(), ExtinctionError> {
    configure_logging(&cli.base)?;

    let defaults = match &cli.base.config {
        Some(path) => {
            info!("Loading epidemic parameters from: {}", path.display());
            EpidemicParameters::from_json_file(path)?
        }
        None => EpidemicParameters::default(),
    };
    let solver = FixedPointSolver::default().with_iterations(cli.base.iterations);

    match cli.command {
        Command::Probability(args) => {
            let parameters = EpidemicParameters {
                r0: args.r0.unwrap_or(defaults.r0),
                hotspot_fraction: args.hotspot_fraction.unwrap_or(defaults.hotspot_fraction),
                risk_tolerance_mean: args.risk_mean.unwrap_or(defaults.risk_tolerance_mean),
                population_size: args.population.unwrap_or(defaults.population_size),
            };
            let record = ExtinctionCalculator::new(solver).evaluate(&parameters, args.model)?;
            info!(
                "{} outbreak probability {} for {:?}",
                args.model,
                record.outbreak_probability,
                parameters
            );
            let writer = output(&cli.base, "probability.csv", stdout)?;
            write_records_csv(writer, &[record])
        }

        Command::Curve(args) => {
            let grid = CurveGrid::new(args.start, args.end, args.step)?;
            let builder = CurveBuilder::new(args.model, grid)?.with_solver(solver);
            if args.homogeneous {
                let points = builder.homogeneous_curve()?;
                let writer = output(&cli.base, "homogeneous_curve.csv", stdout)?;
                return write_homogeneous_csv(writer, &points);
            }
            let template = EpidemicParameters {
                population_size: args.population.unwrap_or(defaults.population_size),
                ..defaults
            };
            let family = builder.family(&template, &args.hotspot_fraction, &args.risk_mean)?;
            let writer = output(&cli.base, "curve.csv", stdout)?;
            write_family_csv(writer, args.model, &family)
        }
    }
}

fn output<'a, W: Write + 'a>(
    args: &BaseArgs,
    file_name: &str,
    stdout: W,
) -> Result<Box<dyn Write + 'a>, ExtinctionError> {
    match &args.output_dir {
        Some(dir) => Ok(Box::new(create_report_file(&dir.join(file_name))?)),
        None => Ok(Box::new(stdout)),
    }
}
