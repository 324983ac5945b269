use clap::{Parser, Subcommand};
use repricer::cli;
use repricer::config::AppConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "repricer")]
#[command(about = "Reprice store inventory spreadsheets against live market prices.")]
#[command(long_about = "Repricer - Inventory spreadsheet repricing

Extracts product rows from an uploaded inventory sheet, looks up current
market prices through the bulk price-search backend, and has the
reconciliation service patch the original file so that only the touched
price/stock cells differ.

COMMANDS:
  extract  - Parse a spreadsheet and list the product rows found
  search   - One-shot price search, print the deltas (no file written)
  reprice  - Full pipeline: extract, bulk search, reconcile, write file
  sample   - Generate a demo inventory workbook
  watch    - Re-extract whenever the file changes

EXAMPLES:
  repricer extract inventory.xlsx
  repricer reprice inventory.xlsx -o repriced.xlsx
  repricer reprice inventory.xlsx --sync        # backend without job support
  repricer search inventory.xlsx --api http://store.example.com/api

The upload accepts .xlsx, .xls and .csv files. Column layout and the API
base URL can be overridden in repricer.yaml.")]
#[command(version)]
struct Cli {
    /// Path to a YAML config file (default: ./repricer.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true, env = "REPRICER_API")]
    api: Option<String>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a spreadsheet and list the product rows found
    Extract {
        /// Path to the inventory file (.xlsx, .xls, .csv)
        file: PathBuf,
    },

    /// One-shot price search; prints deltas without writing a file
    Search {
        /// Path to the inventory file (.xlsx, .xls, .csv)
        file: PathBuf,
    },

    #[command(long_about = "Run the full repricing pipeline.

Extracts product rows, submits them to the bulk price-search job, polls the
job until it completes (showing live progress), merges the results, and asks
the reconciliation service to patch the original file. Only the price and
stock cells of changed rows differ in the written output; every other byte
of the workbook is preserved by the service.

Manual edits are not possible from the CLI, but results that match no
record and rows the backend could not improve are reported rather than
silently dropped.

EXAMPLES:
  repricer reprice inventory.xlsx
  repricer reprice inventory.xlsx -o out.xlsx
  repricer reprice inventory.xlsx --sync   # single-request degraded mode")]
    /// Extract, bulk price search, reconcile, and write the patched file
    Reprice {
        /// Path to the inventory file (.xlsx, .xls, .csv)
        file: PathBuf,

        /// Output path (default: filename suggested by the service)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Use the synchronous one-shot search instead of the async job
        #[arg(long)]
        sync: bool,
    },

    /// Generate a demo inventory workbook in the expected layout
    Sample {
        /// Output path for the workbook (.xlsx)
        file: PathBuf,
    },

    /// Watch a file and re-extract on changes
    Watch {
        /// Path to the inventory file to watch
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "repricer=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    if let Some(api) = cli.api {
        config.api.base_url = api;
    }

    match cli.command {
        Commands::Extract { file } => cli::extract(file, &config, cli.verbose)?,
        Commands::Search { file } => cli::search(file, &config, cli.verbose).await?,
        Commands::Reprice { file, out, sync } => {
            cli::reprice(file, out, sync, &config, cli.verbose).await?
        }
        Commands::Sample { file } => cli::sample(file, &config)?,
        Commands::Watch { file } => cli::watch(file, &config, cli.verbose)?,
    }

    Ok(())
}
