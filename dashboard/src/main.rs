//! CLI entry point for the climate dashboard.

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use climate_dashboard_lib::commands::{self, DEFAULT_PREVIEW_ROWS};
use climate_dashboard_lib::script::{StepOutcome, load_script, run_script};
use climate_dashboard_lib::{AppState, DashboardConfig};
use dotenv::dotenv;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Climate change dashboard: datasets, preprocessing, analysis and prediction",
    long_about = "Loads the configured climate and boundary datasets and runs dashboard \
                  sessions from the command line.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  CLIMATE_DATA_DIR     Directory the dataset paths are relative to\n  \
                  CLIMATE_MODEL_DIR    Directory holding trained_model.json\n\n\
                  EXAMPLES:\n  \
                  # List datasets and load failures\n  \
                  climate-dashboard datasets\n\n  \
                  # Replay a preprocessing and modeling session\n  \
                  climate-dashboard run session.json\n\n  \
                  # Predict with the saved model\n  \
                  climate-dashboard predict -f precip=120 -f elevation=1400"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print results as JSON (disables logging)
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List loaded datasets and load failures
    Datasets,

    /// Show the column summary and first rows of a dataset
    Inspect {
        /// Dataset name as configured
        dataset: String,

        /// Number of rows to show
        #[arg(short, long, default_value_t = DEFAULT_PREVIEW_ROWS)]
        rows: usize,
    },

    /// Run a JSON session script
    Run {
        /// Path to the script
        script: PathBuf,
    },

    /// Predict with the saved model
    Predict {
        /// Feature value as name=value; omitted features are 0
        #[arg(short, long = "feature", value_parser = parse_feature)]
        features: Vec<(String, f64)>,
    },
}

fn parse_feature(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;
    Ok((name.trim().to_string(), value))
}

/// Initialize logging based on CLI arguments
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    // stdout carries only the JSON document in --json mode
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    // Load environment variables from .env file
    dotenv().ok();

    let config = DashboardConfig::load(args.config.as_deref())?;
    info!("Data directory: {}", config.registry.data_dir.display());

    match &args.command {
        Command::Datasets => {
            let state = AppState::new(config);
            let listing = commands::list_datasets(&state);
            if args.json {
                return print_json(&listing);
            }

            println!("{}", "=".repeat(80));
            println!("DATASETS");
            println!("{}", "=".repeat(80));
            for info in &listing.datasets {
                let crs = info.crs.as_deref().unwrap_or("-");
                println!(
                    "  {:<36} {:<11} {:>7} x {:<4} {}",
                    truncate_str(&info.name, 36),
                    info.kind,
                    info.rows,
                    info.columns,
                    crs
                );
            }
            if !listing.failures.is_empty() {
                println!();
                println!("LOAD FAILURES");
                println!("{}", "-".repeat(40));
                for failure in &listing.failures {
                    println!("  [{}] {}", failure.code, failure.message);
                }
            }
        }

        Command::Inspect { dataset, rows } => {
            let state = AppState::new(config);
            let preview = commands::inspect_dataset(&state, dataset, *rows)?;
            if args.json {
                return print_json(&preview);
            }

            println!("{} ({})", preview.name, preview.kind);
            println!("{}", preview.summary.shape_label());
            println!();
            println!("  {:<30} {:<12} {:>8}", "Column", "Type", "Missing");
            println!("  {}", "-".repeat(52));
            for (entry, missing) in preview.summary.types.iter().zip(&preview.summary.missing) {
                println!(
                    "  {:<30} {:<12} {:>8}",
                    truncate_str(&entry.column, 30),
                    entry.dtype,
                    missing.missing
                );
            }
            println!();
            for row in &preview.rows {
                println!("  {}", serde_json::to_string(row)?);
            }
        }

        Command::Run { script } => {
            let actions = load_script(script)?;
            let state = AppState::new(config);
            let report = run_script(&state, &actions);
            if args.json {
                print_json(&report)?;
            } else {
                for step in &report.steps {
                    match &step.outcome {
                        StepOutcome::Ok { .. } => println!("  {:>3}. {:<16} ok", step.index + 1, step.action),
                        StepOutcome::Failed { error } => println!(
                            "  {:>3}. {:<16} FAILED [{}] {}",
                            step.index + 1,
                            step.action,
                            error.error_code(),
                            error
                        ),
                    }
                }
                println!();
                println!(
                    "{} of {} steps succeeded",
                    report.steps.len() - report.failed,
                    report.steps.len()
                );
            }
            if !report.is_success() {
                return Err(anyhow!("{} script step(s) failed", report.failed));
            }
        }

        Command::Predict { features } => {
            let state = AppState::with_registry(config, Default::default());
            let inputs: HashMap<String, f64> = features.iter().cloned().collect();
            let result = commands::predict(&state, &inputs)?;
            if args.json {
                return print_json(&result);
            }

            for (name, value) in &result.inputs {
                println!("  {:<30} {}", truncate_str(name, 30), value);
            }
            println!();
            println!("Predicted {}: {:.4}", result.target, result.prediction);
        }
    }

    Ok(())
}
