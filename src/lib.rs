//! Bactmeasure: border intensity and foci relations for segmented bacteria.
//!
//! The input is a labeled image (one region per bacterium, produced by an
//! external segmentation step) plus intensity channels, exchanged as JSON.
//! Two analyses run on top of it:
//!
//! - **border**: mean channel intensity inside each bacterium and on its
//!   border shell of fixed physical thickness
//! - **foci**: foci detected in two channels, linked to their bacterium,
//!   then measured against the bacterium pole, against each other, and
//!   tested for overlap
//!
//! # Modules
//!
//! - [`geom`]: voxels, volumes, regions, populations, JSON input
//! - [`morphology`]: border shell / interior decomposition
//! - [`intensity`]: sum and mean over a region
//! - [`linking`]: focus → bacterium assignment
//! - [`relations`]: distances and colocalization
//! - [`detection`]: foci detection behind a swappable filter backend
//! - [`pipeline`]: per-image analyses and result tables
//! - [`config`], [`validation`], [`error`]

pub mod config;
pub mod detection;
pub mod error;
pub mod geom;
pub mod intensity;
pub mod linking;
pub mod morphology;
pub mod pipeline;
pub mod relations;
pub mod validation;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use flexi_logger::{Duplicate, FileSpec, Logger, LoggerHandle};

pub use config::AnalysisConfig;
pub use error::BactError;

use geom::io_json::read_image_json;
use geom::{Calibration, ImageStack};
use pipeline::rows::{BorderRow, ColocRow, DistanceRow, TsvWriter};

/// Border analysis table.
pub const BORDER_RESULTS_FILE: &str = "results.tsv";
/// Foci distance table.
pub const DISTANCES_FILE: &str = "distances.tsv";
/// Foci colocalization table.
pub const COLOCALIZATION_FILE: &str = "colocalization.tsv";

/// The bactmeasure CLI application.
#[derive(Parser)]
#[command(name = "bactmeasure")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Also write logs to files in this directory.
    #[arg(long, global = true, env = "BACTMEASURE_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Measure channel intensity inside bacteria and on their border shell.
    Border(AnalysisArgs),
    /// Detect foci in two channels and report distances and colocalization.
    Foci(AnalysisArgs),
    /// Validate a configuration file without processing any image.
    CheckConfig(CheckConfigArgs),
}

/// Arguments shared by the analysis subcommands.
#[derive(clap::Args)]
struct AnalysisArgs {
    /// Image stack JSON files, processed in the order given.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory receiving the result tables (created if missing).
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Configuration file (.yaml, .yml or .json).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the XY pixel size of every image (pixel depth becomes 1).
    #[arg(long)]
    pixel_size: Option<f64>,
}

/// Arguments for the check-config subcommand.
#[derive(clap::Args)]
struct CheckConfigArgs {
    /// Configuration file; defaults are checked when omitted.
    config: Option<PathBuf>,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,

    /// Print the effective configuration as YAML after the report.
    #[arg(long)]
    dump: bool,
}

/// Run the bactmeasure CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), BactError> {
    let cli = Cli::parse();
    let _logger = init_logging(cli.verbose, cli.log_dir.as_deref())?;

    match cli.command {
        Some(Commands::Border(args)) => run_border(args),
        Some(Commands::Foci(args)) => run_foci(args),
        Some(Commands::CheckConfig(args)) => run_check_config(args),
        None => {
            println!("bactmeasure {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Border intensity and foci relations for segmented bacteria.");
            println!();
            println!("Run 'bactmeasure --help' for usage information.");
            Ok(())
        }
    }
}

/// Installs the logger. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Result<LoggerHandle, BactError> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let logger = Logger::try_with_env_or_str(level)?;
    let handle = match log_dir {
        Some(dir) => logger
            .log_to_file(FileSpec::default().directory(dir))
            .duplicate_to_stderr(Duplicate::All)
            .start()?,
        None => logger.log_to_stderr().start()?,
    };
    Ok(handle)
}

/// Loads the configuration, applies CLI overrides and validates it.
fn load_config(path: Option<&Path>, pixel_size: Option<f64>) -> Result<AnalysisConfig, BactError> {
    let mut config = match path {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    if pixel_size.is_some() {
        config.pixel_size = pixel_size;
    }
    validation::ensure_valid(validation::validate_config(&config))?;
    Ok(config)
}

/// Reads one image and resolves its calibration.
fn load_image(path: &Path, config: &AnalysisConfig) -> Result<(ImageStack, Calibration), BactError> {
    let stack = read_image_json(path)?;
    let cal = config.calibration_for(&stack.calibration);
    validation::ensure_valid(validation::validate_calibration(&cal, config))?;
    log::info!(
        "{}: {} labels, calibration {} x {} x {} {}",
        stack.name,
        stack.labels.shape(),
        cal.pixel_width,
        cal.pixel_height,
        cal.pixel_depth,
        cal.unit
    );
    Ok((stack, cal))
}

type FileWriter = TsvWriter<BufWriter<File>>;

/// Execute the border subcommand.
fn run_border(args: AnalysisArgs) -> Result<(), BactError> {
    let config = load_config(args.config.as_deref(), args.pixel_size)?;
    fs::create_dir_all(&args.output_dir)?;
    let path = args.output_dir.join(BORDER_RESULTS_FILE);

    // the header carries the unit, so it waits for the first image
    let mut writer: Option<FileWriter> = None;
    let mut total = 0usize;
    for input in &args.inputs {
        let (stack, cal) = load_image(input, &config)?;
        let analysis = pipeline::analyze_border(&stack, &config, &cal)?;
        if writer.is_none() {
            writer = Some(TsvWriter::create(
                &path,
                &BorderRow::header(cal.unit_symbol()),
            )?);
        }
        if let Some(w) = writer.as_mut() {
            w.write_rows(&analysis.rows)?;
        }
        total += analysis.rows.len();
    }
    if let Some(w) = writer {
        w.finish()?;
    }

    eprintln!(
        "Measured {} bacteria in {} image(s) -> {}",
        total,
        args.inputs.len(),
        path.display()
    );
    Ok(())
}

/// Execute the foci subcommand.
fn run_foci(args: AnalysisArgs) -> Result<(), BactError> {
    let config = load_config(args.config.as_deref(), args.pixel_size)?;
    fs::create_dir_all(&args.output_dir)?;
    let distances_path = args.output_dir.join(DISTANCES_FILE);
    let coloc_path = args.output_dir.join(COLOCALIZATION_FILE);

    let mut writers: Option<(FileWriter, FileWriter)> = None;
    let (mut distance_rows, mut coloc_rows) = (0usize, 0usize);
    for input in &args.inputs {
        let (stack, cal) = load_image(input, &config)?;
        let analysis = pipeline::analyze_foci(&stack, &config, &cal)?;
        if writers.is_none() {
            let unit = cal.unit_symbol();
            writers = Some((
                TsvWriter::create(
                    &distances_path,
                    &DistanceRow::header(unit, config.foci.max_reported_distances),
                )?,
                TsvWriter::create(&coloc_path, &ColocRow::header(unit))?,
            ));
        }
        if let Some((distances, coloc)) = writers.as_mut() {
            distances.write_rows(&analysis.distances)?;
            coloc.write_rows(&analysis.colocalization)?;
        }
        distance_rows += analysis.distances.len();
        coloc_rows += analysis.colocalization.len();
    }
    if let Some((distances, coloc)) = writers {
        distances.finish()?;
        coloc.finish()?;
    }

    eprintln!(
        "Wrote {} distance row(s) and {} colocalization row(s) from {} image(s) to {}",
        distance_rows,
        coloc_rows,
        args.inputs.len(),
        args.output_dir.display()
    );
    Ok(())
}

/// Execute the check-config subcommand.
fn run_check_config(args: CheckConfigArgs) -> Result<(), BactError> {
    let config = match &args.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    let report = validation::validate_config(&config);
    let (border_area, foci_area) = (config.bacteria.border_area(), config.bacteria.foci_area());

    match args.output.as_str() {
        "json" => {
            let issues: Vec<serde_json::Value> = report
                .issues
                .iter()
                .map(|issue| {
                    serde_json::json!({
                        "severity": format!("{:?}", issue.severity),
                        "code": format!("{:?}", issue.code),
                        "message": issue.message,
                        "context": issue.context.to_string(),
                    })
                })
                .collect();
            let doc = serde_json::json!({
                "error_count": report.error_count(),
                "warning_count": report.warning_count(),
                "issues": issues,
                "bacteria_area": { "border": border_area, "foci": foci_area },
            });
            println!("{:#}", doc);
        }
        _ => {
            print!("{}", report);
            println!(
                "Bacterium area bounds: border [{}, {}], foci [{}, {}]",
                border_area.min, border_area.max, foci_area.min, foci_area.max
            );
        }
    }

    if args.dump {
        let yaml = serde_yaml::to_string(&config)
            .map_err(|e| BactError::UnsupportedFormat(e.to_string()))?;
        print!("{}", yaml);
    }

    let passed = if args.strict {
        report.is_ok_strict()
    } else {
        report.is_ok()
    };
    if !passed {
        Err(BactError::InvalidConfig {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}
