use archive_index_core::{
    ArchiveIndexer, FailurePolicy, IndexerConfig, MeilisearchStore, Readiness, DEFAULT_DATA_DIR,
    DEFAULT_SERVICE_URL,
};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "archive-indexer", version)]
struct Cli {
    /// Meilisearch base URL
    #[arg(long, env = "MEILI_URL", default_value = DEFAULT_SERVICE_URL)]
    meili_url: String,

    /// Meilisearch master key
    #[arg(long, env = "MEILI_MASTER_KEY", hide_env_values = true)]
    master_key: Option<String>,

    /// Archive root holding one directory per PDF category and `mirrored_sites/`
    #[arg(long, env = "ARCHIVE_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: String,

    /// PDF category directories to index
    #[arg(
        long,
        env = "ARCHIVE_PDF_CATEGORIES",
        value_delimiter = ',',
        default_value = "survival,medical,gardening"
    )]
    categories: Vec<String>,

    /// Documents per add-documents request
    #[arg(long, env = "ARCHIVE_BATCH_SIZE", default_value = "100")]
    batch_size: usize,

    /// How to wait for Meilisearch before the first request
    #[arg(long, env = "ARCHIVE_READINESS", value_enum, default_value_t = ReadinessMode::Delay)]
    readiness: ReadinessMode,

    /// Seconds to sleep in `delay` mode
    #[arg(long, env = "ARCHIVE_WARMUP_SECS", default_value = "10")]
    warmup_secs: u64,

    /// Health checks before giving up in `probe` mode
    #[arg(long, env = "ARCHIVE_PROBE_ATTEMPTS", default_value = "8")]
    probe_attempts: u32,

    /// What to do after a rejected batch
    #[arg(long, env = "ARCHIVE_FAILURE_POLICY", value_enum, default_value_t = PolicyMode::Continue)]
    failure_policy: PolicyMode,

    /// Seconds to wait for each Meilisearch task to finish
    #[arg(long, env = "ARCHIVE_TASK_TIMEOUT_SECS", default_value = "120")]
    task_timeout_secs: u64,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReadinessMode {
    Delay,
    Probe,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyMode {
    Continue,
    Abort,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<IndexerConfig> {
        let readiness = match self.readiness {
            ReadinessMode::Delay => Readiness::Delay(Duration::from_secs(self.warmup_secs)),
            ReadinessMode::Probe => Readiness::Probe {
                max_attempts: self.probe_attempts.max(1),
                initial_backoff: Duration::from_millis(500),
            },
        };
        let failure_policy = match self.failure_policy {
            PolicyMode::Continue => FailurePolicy::Continue,
            PolicyMode::Abort => FailurePolicy::Abort,
        };

        Ok(IndexerConfig::new(&self.meili_url, self.master_key)?
            .with_data_dir(self.data_dir)
            .with_pdf_categories(self.categories)?
            .with_batch_size(self.batch_size)?
            .with_failure_policy(failure_policy)
            .with_readiness(readiness)
            .with_task_timeout(Duration::from_secs(self.task_timeout_secs)))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let config = Cli::parse().into_config()?;

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        service_url = %config.service_url,
        "archive-indexer boot"
    );

    let store = MeilisearchStore::from_config(&config);
    let mut indexer = ArchiveIndexer::new(config, store);
    let summary = indexer.run().await?;

    if summary.has_failures() {
        warn!("indexing finished with skipped files or failed batches");
    }
    for schema in [&summary.documents, &summary.websites] {
        for skipped in &schema.skipped_files {
            println!("skipped {}: {}", skipped.path.display(), skipped.reason);
        }
    }
    println!("{summary}");
    println!("indexing completed at {}", Utc::now().to_rfc3339());

    Ok(())
}
