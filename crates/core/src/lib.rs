pub mod config;
pub mod document;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod stores;
pub mod submitter;
pub mod traits;

pub use config::{IndexerConfig, Readiness, DEFAULT_DATA_DIR, DEFAULT_SERVICE_URL};
pub use document::{build_index_document, build_web_document, humanize_stem, relative_url};
pub use error::{ConfigError, IndexerError, IngestError, SearchError};
pub use extractor::{ContentExtractor, HtmlExtractor, LopdfExtractor};
pub use ingest::{
    discover_files, ingest_source_best_effort, pdf_sources, site_sources, ContentSource,
    IngestionReport, SkippedFile,
};
pub use models::{
    ExtractedContent, IndexDocument, IndexSchema, IndexSettings, SourceKind, WebDocument,
};
pub use orchestrator::{ArchiveIndexer, RunStage, RunSummary, SchemaSummary};
pub use stores::MeilisearchStore;
pub use submitter::{BatchSubmitter, FailedBatch, FailurePolicy, SubmissionReport};
pub use traits::{IndexCreation, IndexService};
