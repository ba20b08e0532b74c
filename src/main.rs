use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use engine::InsightPipeline;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

mod render;

/// The main entry point for the sales insights tool.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_dir.as_deref())?;

    match cli.command {
        Commands::Analyze(args) => handle_analyze(args),
        Commands::Validate(args) => handle_validate(args),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Turns a sales ledger into business metrics and rule-based insights.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Also write logs to a `sales-insights.log` file in this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis and print the report.
    Analyze(AnalyzeArgs),
    /// Load and clean a ledger, reporting what had to be imputed.
    Validate(ValidateArgs),
}

#[derive(Parser)]
struct AnalyzeArgs {
    /// Path to the transaction ledger (CSV with a header row).
    #[arg(long)]
    input: PathBuf,

    /// Configuration file. Defaults to `config.toml` in the working directory if present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write the full report as JSON to this path.
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Parser)]
struct ValidateArgs {
    /// Path to the transaction ledger (CSV with a header row).
    #[arg(long)]
    input: PathBuf,

    /// Configuration file. Defaults to `config.toml` in the working directory if present.
    #[arg(long)]
    config: Option<PathBuf>,
}

// ==============================================================================
// Logging
// ==============================================================================

/// Installs the global subscriber: stderr always, plus a log file when asked.
///
/// The returned guard flushes the file writer on drop and must live until exit.
fn init_tracing(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, "sales-insights.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install the tracing subscriber")?;
    Ok(guard)
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn build_pipeline(config_path: Option<&Path>) -> Result<InsightPipeline> {
    let config = configuration::load_config(config_path).context("Failed to load configuration")?;
    InsightPipeline::from_config(&config).context("Invalid analysis parameters")
}

fn handle_analyze(args: AnalyzeArgs) -> Result<()> {
    let pipeline = build_pipeline(args.config.as_deref())?;
    let report = pipeline
        .analyze_file(&args.input)
        .with_context(|| format!("Failed to analyze {}", args.input.display()))?;

    println!("{}", render::render_report(&report)?);

    if let Some(path) = args.json {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write JSON report to {}", path.display()))?;
        tracing::info!(path = %path.display(), "JSON report written.");
    }
    Ok(())
}

fn handle_validate(args: ValidateArgs) -> Result<()> {
    let pipeline = build_pipeline(args.config.as_deref())?;
    let dataset = pipeline
        .load(&args.input)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;

    println!("{} records loaded from {}.", dataset.len(), args.input.display());
    if dataset.warnings.is_empty() {
        println!("No values had to be imputed.");
    } else {
        for warning in &dataset.warnings {
            println!("  - {warning}");
        }
    }
    Ok(())
}
