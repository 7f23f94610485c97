//! CLI for the fin-health ratio and health classification library.
//!
//! Statements are read from a directory of `<SYMBOL>.json` files and the
//! fitted model from a JSON bundle. Both locations come from the environment
//! (optionally via `.env`) unless overridden on the command line.

use clap::{Parser, Subcommand};
use fin_health::{
    HealthPredictor, JsonDirectorySource, Metric, ModelBundle, RatioExtractor, Result, Settings,
    fetch_all,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fin-health")]
#[command(about = "Financial ratios and health classification from company statements", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory of <SYMBOL>.json statement files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the ratio metrics
    Metrics,
    /// Compute the ratio table for one or more symbols
    Ratios {
        /// Stock symbols
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Classify the financial health of a symbol
    Predict {
        /// Stock symbol
        symbol: String,
        /// Symbols whose ratios supply means for missing values
        #[arg(long, required = true, value_delimiter = ',', num_args = 1..)]
        reference: Vec<String>,
        /// Fitted model bundle (JSON)
        #[arg(long)]
        model: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env();
    let source = JsonDirectorySource::new(cli.data_dir.unwrap_or(settings.data_dir));
    tracing::debug!(dir = %source.dir().display(), "reading statements");

    let outcome = match cli.command {
        Commands::Metrics => {
            list_metrics();
            Ok(())
        }
        Commands::Ratios { symbols } => print_ratios(&source, &symbols),
        Commands::Predict {
            symbol,
            reference,
            model,
        } => predict(
            &source,
            &symbol,
            &reference,
            &model.unwrap_or(settings.model_path),
        ),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// List every metric with its formula.
fn list_metrics() {
    println!("Metrics ({} total)\n", Metric::COUNT);
    for metric in Metric::ALL {
        println!("  {:<18} {}", metric.name(), metric.description());
    }
}

/// Fetch and extract ratios for each symbol, printing the resulting table.
fn print_ratios(source: &JsonDirectorySource, symbols: &[String]) -> Result<()> {
    let fetched = fetch_all(source, symbols);
    let table = RatioExtractor::new().extract_many(&fetched);

    tracing::info!(
        requested = symbols.len(),
        extracted = table.len(),
        "ratio table built"
    );
    println!("{}", table.to_dataframe()?);
    Ok(())
}

/// Build a reference table, then classify `symbol`.
fn predict(
    source: &JsonDirectorySource,
    symbol: &str,
    reference: &[String],
    model_path: &Path,
) -> Result<()> {
    let bundle = ModelBundle::load(model_path)?;
    let reference_table = RatioExtractor::new().extract_many(&fetch_all(source, reference));

    let predictor = HealthPredictor::new(
        &bundle.scaler,
        &bundle.classifier,
        &reference_table,
        bundle.features.clone(),
    )?;
    let prediction = predictor.predict(source, symbol)?;

    println!("Prediction for {prediction}");
    Ok(())
}
