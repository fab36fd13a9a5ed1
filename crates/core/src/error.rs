use crate::orchestrator::RunStage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("html parse error: {0}")]
    HtmlParse(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("path {path} is not under {root}")]
    OutsideRoot { path: String, root: String },
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("search request failed: {0}")]
    Request(String),

    #[error("store not available yet: {0}")]
    NotReady(String),

    #[error("task {task_uid} failed ({code}): {message}")]
    TaskFailed {
        task_uid: u64,
        code: String,
        message: String,
    },

    #[error("task {0} did not finish in time")]
    TaskTimeout(u64),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable required")]
    MissingCredential(&'static str),

    #[error("invalid index service url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("index service never became ready: {0}")]
    NotReady(#[source] SearchError),

    #[error("failed to set up index {index}: {source}")]
    SchemaSetup {
        index: String,
        #[source]
        source: SearchError,
    },

    #[error("submission to index {index} aborted at batch {batch}: {source}")]
    Submission {
        index: String,
        batch: usize,
        #[source]
        source: SearchError,
    },

    #[error("run already finished in stage {0:?}")]
    AlreadyRun(RunStage),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
