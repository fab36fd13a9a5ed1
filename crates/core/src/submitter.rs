use crate::models::SourceLabel;
use crate::traits::IndexService;
use crate::SearchError;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::Range;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    Continue,
    Abort,
}

#[derive(Debug, Clone)]
pub struct FailedBatch {
    /// 1-based, as printed in logs.
    pub batch: usize,
    pub range: Range<usize>,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct SubmissionReport {
    pub batches_total: usize,
    pub batches_submitted: usize,
    pub documents_submitted: usize,
    pub documents_accepted: usize,
    pub failed_batches: Vec<FailedBatch>,
}

impl SubmissionReport {
    pub fn is_accepted(&self, position: usize) -> bool {
        position < self.documents_submitted
            && !self
                .failed_batches
                .iter()
                .any(|failed| failed.range.contains(&position))
    }
}

#[derive(Debug)]
pub struct SubmitAborted {
    pub batch: usize,
    pub source: SearchError,
    pub report: SubmissionReport,
}

pub struct BatchSubmitter<'a, S: ?Sized> {
    service: &'a S,
    batch_size: usize,
    policy: FailurePolicy,
}

impl<'a, S> BatchSubmitter<'a, S>
where
    S: IndexService + Send + Sync + ?Sized,
{
    pub fn new(service: &'a S, batch_size: usize, policy: FailurePolicy) -> Self {
        Self {
            service,
            batch_size: batch_size.max(1),
            policy,
        }
    }

    pub async fn submit<D>(
        &self,
        index: &str,
        documents: &[D],
    ) -> Result<SubmissionReport, SubmitAborted>
    where
        D: Serialize + Sync,
    {
        let mut report = SubmissionReport {
            batches_total: documents.len().div_ceil(self.batch_size),
            ..SubmissionReport::default()
        };

        for (position, chunk) in documents.chunks(self.batch_size).enumerate() {
            let batch = position + 1;
            let start = position * self.batch_size;
            let range = start..start + chunk.len();

            let outcome = match serialize_batch(chunk) {
                Ok(values) => self.service.add_documents(index, &values).await,
                Err(error) => Err(error),
            };
            report.batches_submitted += 1;
            report.documents_submitted += chunk.len();

            match outcome {
                Ok(()) => {
                    report.documents_accepted += chunk.len();
                    info!(
                        index,
                        batch,
                        batches = report.batches_total,
                        size = chunk.len(),
                        "indexed batch"
                    );
                }
                Err(error) => {
                    warn!(index, batch, batches = report.batches_total, %error, "batch rejected");
                    report.failed_batches.push(FailedBatch {
                        batch,
                        range,
                        reason: error.to_string(),
                    });

                    if self.policy == FailurePolicy::Abort {
                        return Err(SubmitAborted {
                            batch,
                            source: error,
                            report,
                        });
                    }
                }
            }
        }

        Ok(report)
    }
}

fn serialize_batch<D: Serialize>(chunk: &[D]) -> Result<Vec<Value>, SearchError> {
    chunk
        .iter()
        .map(|document| serde_json::to_value(document).map_err(SearchError::from))
        .collect()
}

pub fn accepted_per_label<D: SourceLabel>(
    documents: &[D],
    report: &SubmissionReport,
) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for (position, document) in documents.iter().enumerate() {
        if report.is_accepted(position) {
            *counts.entry(document.source_label().to_string()).or_insert(0) += 1;
        }
    }
    counts
}
