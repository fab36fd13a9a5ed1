use crate::config::{IndexerConfig, Readiness};
use crate::error::IndexerError;
use crate::extractor::{ContentExtractor, HtmlExtractor, LopdfExtractor};
use crate::ingest::{
    ingest_pdf_category, ingest_site, pdf_sources, site_sources, IngestionReport, SkippedFile,
};
use crate::models::{IndexSchema, SourceKind, SourceLabel};
use crate::submitter::{accepted_per_label, BatchSubmitter, FailedBatch};
use crate::traits::{IndexCreation, IndexService};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tokio::time::sleep;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Init,
    SchemasCreated,
    PdfsIndexed,
    WebsitesIndexed,
    Done,
    Failed,
}

#[derive(Debug, Clone)]
pub struct SchemaSummary {
    pub index: &'static str,
    pub collected: usize,
    pub indexed: usize,
    pub per_source: BTreeMap<String, usize>,
    pub skipped_files: Vec<SkippedFile>,
    pub failed_batches: Vec<FailedBatch>,
}

impl SchemaSummary {
    pub fn has_failures(&self) -> bool {
        !self.skipped_files.is_empty() || !self.failed_batches.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub documents: SchemaSummary,
    pub websites: SchemaSummary,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.documents.has_failures() || self.websites.has_failures()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for schema in [&self.documents, &self.websites] {
            writeln!(
                f,
                "{}: {} of {} collected documents indexed",
                schema.index, schema.indexed, schema.collected
            )?;
            for (label, count) in &schema.per_source {
                writeln!(f, "  {label}: {count}")?;
            }
            if !schema.skipped_files.is_empty() {
                writeln!(f, "  skipped files: {}", schema.skipped_files.len())?;
            }
            for failed in &schema.failed_batches {
                writeln!(
                    f,
                    "  failed batch {} ({} documents): {}",
                    failed.batch,
                    failed.range.len(),
                    failed.reason
                )?;
            }
        }
        write!(
            f,
            "finished in {}s",
            (self.finished_at - self.started_at).num_seconds()
        )
    }
}

type BoxedExtractor = Box<dyn ContentExtractor + Send + Sync>;

pub struct ArchiveIndexer<S> {
    config: IndexerConfig,
    service: S,
    pdf_extractor: BoxedExtractor,
    html_extractor: BoxedExtractor,
    stage: RunStage,
}

impl<S> ArchiveIndexer<S>
where
    S: IndexService + Send + Sync,
{
    pub fn new(config: IndexerConfig, service: S) -> Self {
        Self {
            config,
            service,
            pdf_extractor: Box::new(LopdfExtractor::default()),
            html_extractor: Box::new(HtmlExtractor),
            stage: RunStage::Init,
        }
    }

    pub fn with_extractor(mut self, extractor: BoxedExtractor) -> Self {
        match extractor.kind() {
            SourceKind::Pdf => self.pdf_extractor = extractor,
            SourceKind::Html => self.html_extractor = extractor,
        }
        self
    }

    pub fn stage(&self) -> RunStage {
        self.stage
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub async fn run(&mut self) -> Result<RunSummary, IndexerError> {
        if self.stage != RunStage::Init {
            return Err(IndexerError::AlreadyRun(self.stage));
        }

        info!(data_dir = %self.config.data_dir.display(), "starting archive indexing");
        let started_at = Utc::now();

        match self.execute(started_at).await {
            Ok(summary) => {
                self.advance(RunStage::Done);
                Ok(summary)
            }
            Err(failure) => {
                error!(stage = ?self.stage, error = %failure, "indexing failed");
                self.stage = RunStage::Failed;
                Err(failure)
            }
        }
    }

    async fn execute(&mut self, started_at: DateTime<Utc>) -> Result<RunSummary, IndexerError> {
        self.wait_until_ready().await?;

        self.create_schemas().await?;
        self.advance(RunStage::SchemasCreated);

        let documents = self.index_pdfs().await?;
        self.advance(RunStage::PdfsIndexed);

        let websites = self.index_websites().await?;
        self.advance(RunStage::WebsitesIndexed);

        Ok(RunSummary {
            started_at,
            finished_at: Utc::now(),
            documents,
            websites,
        })
    }

    fn advance(&mut self, next: RunStage) {
        info!(from = ?self.stage, to = ?next, "stage complete");
        self.stage = next;
    }

    async fn wait_until_ready(&self) -> Result<(), IndexerError> {
        match self.config.readiness {
            Readiness::Delay(delay) => {
                if !delay.is_zero() {
                    info!(delay_secs = delay.as_secs_f32(), "waiting for index service");
                    sleep(delay).await;
                }
                Ok(())
            }
            Readiness::Probe {
                max_attempts,
                initial_backoff,
            } => {
                let mut backoff = initial_backoff;
                let mut attempt = 1;
                loop {
                    match self.service.health().await {
                        Ok(()) => return Ok(()),
                        Err(failure) if attempt >= max_attempts => {
                            return Err(IndexerError::NotReady(failure));
                        }
                        Err(failure) => {
                            warn!(
                                attempt,
                                max_attempts,
                                error = %failure,
                                "index service not ready"
                            );
                            sleep(backoff).await;
                            backoff = backoff.saturating_mul(2);
                            attempt += 1;
                        }
                    }
                }
            }
        }
    }

    async fn create_schemas(&self) -> Result<(), IndexerError> {
        for schema in [IndexSchema::Documents, IndexSchema::Websites] {
            let index = schema.index_name();
            let creation = self
                .service
                .create_index(index, &schema.settings())
                .await
                .map_err(|source| IndexerError::SchemaSetup {
                    index: index.to_string(),
                    source,
                })?;

            match creation {
                IndexCreation::Created => info!(index, "created index"),
                IndexCreation::AlreadyExists => info!(index, "index already exists"),
            }
        }
        Ok(())
    }

    async fn index_pdfs(&self) -> Result<SchemaSummary, IndexerError> {
        let sources = pdf_sources(&self.config.data_dir, &self.config.pdf_categories);
        let mut collected = IngestionReport::default();

        for source in &sources {
            let report = ingest_pdf_category(source, self.pdf_extractor.as_ref());
            info!(
                category = %source.label,
                documents = report.documents.len(),
                skipped = report.skipped_files.len(),
                "collected pdf category"
            );
            collected.documents.extend(report.documents);
            collected.skipped_files.extend(report.skipped_files);
        }

        let labels = sources.into_iter().map(|source| source.label).collect();
        self.submit_schema(IndexSchema::Documents, collected, labels).await
    }

    async fn index_websites(&self) -> Result<SchemaSummary, IndexerError> {
        let sources = site_sources(&self.config.mirror_root());
        let mut collected = IngestionReport::default();

        for source in &sources {
            let report = ingest_site(source, self.html_extractor.as_ref());
            info!(
                site = %source.label,
                pages = report.documents.len(),
                skipped = report.skipped_files.len(),
                "collected website"
            );
            collected.documents.extend(report.documents);
            collected.skipped_files.extend(report.skipped_files);
        }

        let labels = sources.into_iter().map(|source| source.label).collect();
        self.submit_schema(IndexSchema::Websites, collected, labels).await
    }

    async fn submit_schema<D>(
        &self,
        schema: IndexSchema,
        collected: IngestionReport<D>,
        labels: Vec<String>,
    ) -> Result<SchemaSummary, IndexerError>
    where
        D: Serialize + Sync + SourceLabel,
    {
        let index = schema.index_name();
        let submitter = BatchSubmitter::new(
            &self.service,
            self.config.batch_size,
            self.config.failure_policy,
        );

        let report = submitter
            .submit(index, &collected.documents)
            .await
            .map_err(|aborted| IndexerError::Submission {
                index: index.to_string(),
                batch: aborted.batch,
                source: aborted.source,
            })?;

        let mut per_source = accepted_per_label(&collected.documents, &report);
        for label in labels {
            per_source.entry(label).or_insert(0);
        }

        info!(
            index,
            indexed = report.documents_accepted,
            collected = collected.documents.len(),
            failed_batches = report.failed_batches.len(),
            "index submission finished"
        );

        Ok(SchemaSummary {
            index,
            collected: collected.documents.len(),
            indexed: report.documents_accepted,
            per_source,
            skipped_files: collected.skipped_files,
            failed_batches: report.failed_batches,
        })
    }
}
