mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use imagegate_core::{PipelineConfig, ValidationStatus};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "imagegate=info,imagegate_core=info";

/// imagegate — validate, catalog and sort incoming images
#[derive(Parser)]
#[command(name = "imagegate", version, about)]
struct Cli {
    /// TOML file with paths and validation thresholds
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the metadata database (overrides the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log pipeline activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the metadata database and its schema
    Init,
    /// Validate every file in the source directory and sort it
    Run {
        /// Directory of incoming files
        #[arg(long)]
        source: Option<PathBuf>,
        /// Destination for files that pass validation
        #[arg(long)]
        validated: Option<PathBuf>,
        /// Destination for files that fail validation
        #[arg(long)]
        rejected: Option<PathBuf>,
    },
    /// Print record totals and a per-status breakdown
    Report,
    /// List stored records
    Ls {
        /// Only show records with this status
        #[arg(long, value_enum)]
        status: Option<StatusFilter>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusFilter {
    Passed,
    Failed,
}

impl From<StatusFilter> for ValidationStatus {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::Passed => ValidationStatus::Passed,
            StatusFilter::Failed => ValidationStatus::Failed,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new(DEFAULT_LOG_FILTER)
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.store_path = db.clone();
    }
    tracing::debug!(?config, "resolved configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Init => commands::init::run(&config)?,
        Commands::Run {
            source,
            validated,
            rejected,
        } => {
            if let Some(dir) = source {
                config.source_dir = dir;
            }
            if let Some(dir) = validated {
                config.validated_dir = dir;
            }
            if let Some(dir) = rejected {
                config.rejected_dir = dir;
            }
            commands::run::run(config)?
        }
        Commands::Report => commands::report::run(&config)?,
        Commands::Ls { status } => commands::ls::run(&config, status.map(Into::into))?,
    }

    Ok(())
}
