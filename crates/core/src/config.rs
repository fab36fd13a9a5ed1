use crate::error::ConfigError;
use crate::models::DEFAULT_BATCH_SIZE;
use crate::submitter::FailurePolicy;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_SERVICE_URL: &str = "http://meilisearch:7700";
pub const DEFAULT_DATA_DIR: &str = "/data";
pub const DEFAULT_CATEGORIES: [&str; 3] = ["survival", "medical", "gardening"];
pub const DEFAULT_WARMUP: Duration = Duration::from_secs(10);
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(120);
pub const CREDENTIAL_ENV: &str = "MEILI_MASTER_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Delay(Duration),
    Probe {
        max_attempts: u32,
        initial_backoff: Duration,
    },
}

impl Default for Readiness {
    fn default() -> Self {
        Readiness::Delay(DEFAULT_WARMUP)
    }
}

#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub service_url: Url,
    pub api_key: String,
    pub data_dir: PathBuf,
    pub pdf_categories: Vec<String>,
    pub batch_size: usize,
    pub failure_policy: FailurePolicy,
    pub readiness: Readiness,
    pub task_timeout: Duration,
}

impl IndexerConfig {
    pub fn new(service_url: &str, api_key: Option<String>) -> Result<Self, ConfigError> {
        let api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingCredential(CREDENTIAL_ENV))?;

        Ok(Self {
            service_url: directory_url(Url::parse(service_url.trim())?),
            api_key,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            pdf_categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            batch_size: DEFAULT_BATCH_SIZE,
            failure_policy: FailurePolicy::default(),
            readiness: Readiness::default(),
            task_timeout: DEFAULT_TASK_TIMEOUT,
        })
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_pdf_categories<I, C>(mut self, categories: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let categories = categories
            .into_iter()
            .map(|category| category.into().trim().to_string())
            .filter(|category| !category.is_empty())
            .collect::<Vec<_>>();

        if let Some(bad) = categories
            .iter()
            .find(|category| category.contains(['/', '\\']) || category.as_str() == "..")
        {
            return Err(ConfigError::InvalidArgument(format!(
                "category must be a plain directory name: {bad}"
            )));
        }

        self.pdf_categories = categories;
        Ok(self)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self, ConfigError> {
        if batch_size == 0 {
            return Err(ConfigError::InvalidArgument(
                "batch size must be at least 1".to_string(),
            ));
        }
        self.batch_size = batch_size;
        Ok(self)
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_readiness(mut self, readiness: Readiness) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn mirror_root(&self) -> PathBuf {
        self.data_dir.join(crate::ingest::MIRRORED_SITES_DIR)
    }
}

// Relative joins replace the last path segment unless the base ends in `/`.
pub(crate) fn directory_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
