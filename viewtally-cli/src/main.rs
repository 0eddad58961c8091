//! viewtally CLI: download a Kaggle YouTube dataset version and report total
//! views per category as a bar chart and a JSON file.

mod json_log;

use clap::Parser;
use json_log::JsonLines;
use std::path::Path;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};
use viewtally_core::dataset::{DEFAULT_DATASET_SLUG, DEFAULT_DATASET_VERSION, DEFAULT_OWNER_SLUG};
use viewtally_core::{DatasetRef, Pipeline, RunOutcome, TracingLog};

/// viewtally: YouTube views per category from a Kaggle dataset
#[derive(Parser, Debug)]
#[command(name = "viewtally", version, about, long_about = None)]
struct Cli {
    /// Owner slug for dataset
    #[arg(default_value = DEFAULT_OWNER_SLUG)]
    owner_slug: String,

    /// Slug for dataset
    #[arg(default_value = DEFAULT_DATASET_SLUG)]
    dataset_slug: String,

    /// Dataset version
    #[arg(default_value = DEFAULT_DATASET_VERSION)]
    dataset_version: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = viewtally_core::load_config(None)?;
    // Fail before touching the filesystem when the download base is missing.
    config.require_tmp_save_directory()?;

    std::fs::create_dir_all(&config.log_dir)?;
    let _guard = init_tracing(&config.log_dir, &config.log_file);

    let dataset = DatasetRef::new(cli.owner_slug, cli.dataset_slug, cli.dataset_version);
    let pipeline = Pipeline::from_config(config, TracingLog::shared("viewtally"));

    match pipeline.run(&dataset).await? {
        RunOutcome::Completed(summary) => {
            tracing::debug!(rows = summary.len(), "Reports written");
        }
        RunOutcome::RetrievalFailed => {
            tracing::debug!(dataset = %dataset, "No reports written");
        }
    }

    Ok(())
}

/// Human-readable stderr output plus a JSON-lines file in `log_dir`, one
/// [`JsonLines`] object per event.
///
/// The returned guard flushes the file writer on drop.
fn init_tracing(log_dir: &Path, log_file: &str) -> tracing_appender::non_blocking::WorkerGuard {
    let stderr_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(stderr_filter);

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .event_format(JsonLines)
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    guard
}
