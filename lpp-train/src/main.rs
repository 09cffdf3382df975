//! lpp-train - Training pipeline CLI
//!
//! ```bash
//! lpp-train extract --input raw/*.csv --output data/laptops.csv
//! lpp-train fit --table data/laptops.csv --artifacts artifacts
//! lpp-train run --input raw/*.csv
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lpp_common::{load_config, TomlConfig};
use lpp_train::{extract_table, fit_from_table};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_TABLE: &str = "laptops.csv";

#[derive(Parser, Debug)]
#[command(name = "lpp-train")]
#[command(about = "Build the laptop price model from scraped listings")]
#[command(version)]
struct Cli {
    /// Config file (default: LPP_CONFIG, ./lpp.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clean raw listing exports and write the training table
    Extract {
        /// Raw CSV exports, merged in order
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Training table to write
        #[arg(short, long, default_value = DEFAULT_TABLE)]
        output: PathBuf,

        /// Field delimiter of the raw exports
        #[arg(long, default_value_t = ',')]
        delimiter: char,
    },

    /// Fit the model on a training table and save the artifacts
    Fit {
        /// Training table to read
        #[arg(short, long, default_value = DEFAULT_TABLE)]
        table: PathBuf,

        /// Artifacts directory (overrides the config file)
        #[arg(short, long)]
        artifacts: Option<PathBuf>,

        /// Seed of the train/test shuffle (overrides the config file)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Extract, then fit
    Run {
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        #[arg(short, long, default_value = DEFAULT_TABLE)]
        table: PathBuf,

        #[arg(short, long)]
        artifacts: Option<PathBuf>,

        #[arg(long, default_value_t = ',')]
        delimiter: char,

        #[arg(long)]
        seed: Option<u64>,
    },
}

fn delimiter_byte(delimiter: char) -> Result<u8> {
    if !delimiter.is_ascii() {
        bail!("Delimiter must be a single ASCII character, got '{}'", delimiter);
    }
    Ok(delimiter as u8)
}

fn run_extract(
    config: &TomlConfig,
    input: &[PathBuf],
    output: &Path,
    delimiter: char,
) -> Result<()> {
    let summary = extract_table(input, output, &config.cleaning, delimiter_byte(delimiter)?)
        .context("Extraction failed")?;
    info!(
        "Extracted {} training rows from {} listings into {}",
        summary.written,
        summary.ingested,
        output.display()
    );
    Ok(())
}

fn run_fit(
    config: &TomlConfig,
    table: &Path,
    artifacts: Option<PathBuf>,
    seed: Option<u64>,
) -> Result<()> {
    let artifacts_dir = artifacts.unwrap_or_else(|| config.artifacts_dir.clone());
    let mut training = config.training.clone();
    if let Some(seed) = seed {
        training.seed = seed;
    }

    let bundle = fit_from_table(table, &artifacts_dir, &training)
        .with_context(|| format!("Training on {} failed", table.display()))?;
    info!(
        "Model {} saved to {}",
        bundle.model_version(),
        artifacts_dir.display()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| loaded.config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("lpp-train {}", env!("CARGO_PKG_VERSION"));
    loaded.log_source();
    let config = loaded.config;

    match cli.command {
        Commands::Extract {
            input,
            output,
            delimiter,
        } => run_extract(&config, &input, &output, delimiter),
        Commands::Fit { table, artifacts, seed } => run_fit(&config, &table, artifacts, seed),
        Commands::Run {
            input,
            table,
            artifacts,
            delimiter,
            seed,
        } => {
            run_extract(&config, &input, &table, delimiter)?;
            run_fit(&config, &table, artifacts, seed)
        }
    }
}
