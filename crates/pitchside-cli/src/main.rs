use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pitchside_core::RawVenueRecord;
use pitchside_reconcile::{merge, SourceRecords};
use pitchside_sync::{BatchPipeline, SyncConfig};
use serde_json::Value as JsonValue;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pitchside-cli")]
#[command(about = "Reconcile cricket venue records from Cricbuzz, ESPNcricinfo and Cricket.com")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape every catalog venue once and rewrite the catalog.
    Sync {
        #[arg(long)]
        catalog: Option<PathBuf>,
        #[arg(long)]
        archive_dir: Option<PathBuf>,
    },
    /// Merge three raw record files and print the canonical record.
    Merge {
        #[arg(long)]
        cricbuzz: Option<PathBuf>,
        #[arg(long)]
        espn: Option<PathBuf>,
        #[arg(long)]
        cricket_dot_com: Option<PathBuf>,
    },
}

/// Missing path or missing file reads as an empty record.
async fn load_raw_record(path: Option<&Path>) -> Result<RawVenueRecord> {
    let Some(path) = path else {
        return Ok(RawVenueRecord::new());
    };
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(RawVenueRecord::new()),
        Err(err) => return Err(err).with_context(|| format!("reading {}", path.display())),
    };
    let value: JsonValue =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    match value {
        JsonValue::Object(map) => Ok(RawVenueRecord::from(map)),
        _ => anyhow::bail!("{} does not hold a JSON object", path.display()),
    }
}

async fn merge_files(cricbuzz: Option<&Path>, espn: Option<&Path>, cricket_dot_com: Option<&Path>) -> Result<String> {
    let records = SourceRecords::new(
        load_raw_record(cricbuzz).await?,
        load_raw_record(espn).await?,
        load_raw_record(cricket_dot_com).await?,
    );
    let venue = merge(&records);
    serde_json::to_string_pretty(&venue).context("serializing canonical venue record")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pitchside=info")))
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Sync {
        catalog: None,
        archive_dir: None,
    }) {
        Commands::Sync { catalog, archive_dir } => {
            let mut config = SyncConfig::from_env();
            if let Some(catalog) = catalog {
                config.catalog_path = catalog;
            }
            if let Some(archive_dir) = archive_dir {
                config.archive_dir = Some(archive_dir);
            }
            info!(catalog = %config.catalog_path.display(), "starting sync");
            let summary = BatchPipeline::new(config)?.run_once().await?;
            println!(
                "sync complete: run_id={} venues={} scraped={} fallback={} passed_through={} adapter_failures={} catalog={}",
                summary.run_id,
                summary.total_venues,
                summary.scraped,
                summary.fallback,
                summary.passed_through,
                summary.adapter_failures,
                summary.catalog_path
            );
        }
        Commands::Merge {
            cricbuzz,
            espn,
            cricket_dot_com,
        } => {
            let output = merge_files(cricbuzz.as_deref(), espn.as_deref(), cricket_dot_com.as_deref()).await?;
            println!("{output}");
        }
    }

    Ok(())
}
