use crate::config::{directory_url, IndexerConfig, DEFAULT_TASK_TIMEOUT};
use crate::traits::{IndexCreation, IndexService};
use crate::{IndexSettings, SearchError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;
use url::Url;

const BACKEND: &str = "meilisearch";
const TASK_POLL_INTERVAL: Duration = Duration::from_millis(250);
const INDEX_ALREADY_EXISTS: &str = "index_already_exists";

pub struct MeilisearchStore {
    client: Client,
    endpoint: Url,
    api_key: String,
    task_timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnqueuedTask {
    task_uid: u64,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
enum TaskStatus {
    Enqueued,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

#[derive(Debug, Deserialize)]
struct TaskView {
    status: TaskStatus,
    #[serde(default)]
    error: Option<TaskErrorView>,
}

#[derive(Debug, Deserialize)]
struct TaskErrorView {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl MeilisearchStore {
    pub fn new(endpoint: Url, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: directory_url(endpoint),
            api_key: api_key.into(),
            task_timeout: DEFAULT_TASK_TIMEOUT,
        }
    }

    pub fn from_config(config: &IndexerConfig) -> Self {
        Self::new(config.service_url.clone(), config.api_key.clone())
            .with_task_timeout(config.task_timeout)
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> Result<Url, SearchError> {
        Ok(self.endpoint.join(path)?)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.api_key)
    }

    async fn index_exists(&self, name: &str) -> Result<bool, SearchError> {
        let response = self
            .authorized(self.client.get(self.url(&format!("indexes/{name}"))?))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(backend_error(status, response).await),
        }
    }

    async fn enqueue(&self, request: RequestBuilder) -> Result<u64, SearchError> {
        let response = self.authorized(request).send().await?;
        if !response.status().is_success() {
            return Err(backend_error(response.status(), response).await);
        }
        let task: EnqueuedTask = response.json().await?;
        Ok(task.task_uid)
    }

    async fn wait_for_task(&self, task_uid: u64) -> Result<(), SearchError> {
        let deadline = Instant::now() + self.task_timeout;

        loop {
            let response = self
                .authorized(self.client.get(self.url(&format!("tasks/{task_uid}"))?))
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(backend_error(response.status(), response).await);
            }

            let task: TaskView = response.json().await?;
            if let Some(outcome) = task_outcome(task_uid, task) {
                return outcome;
            }

            if Instant::now() >= deadline {
                return Err(SearchError::TaskTimeout(task_uid));
            }
            sleep(TASK_POLL_INTERVAL).await;
        }
    }
}

fn task_outcome(task_uid: u64, task: TaskView) -> Option<Result<(), SearchError>> {
    match task.status {
        TaskStatus::Enqueued | TaskStatus::Processing => None,
        TaskStatus::Succeeded => Some(Ok(())),
        TaskStatus::Failed | TaskStatus::Canceled => {
            let error = task.error.unwrap_or(TaskErrorView {
                code: format!("{:?}", task.status).to_lowercase(),
                message: String::new(),
            });
            Some(Err(SearchError::TaskFailed {
                task_uid,
                code: error.code,
                message: error.message,
            }))
        }
    }
}

fn settings_payload(settings: &IndexSettings) -> Value {
    json!({
        "searchableAttributes": settings.searchable_attributes,
        "filterableAttributes": settings.filterable_attributes,
        "sortableAttributes": settings.sortable_attributes,
    })
}

async fn backend_error(status: StatusCode, response: Response) -> SearchError {
    let body = response.text().await.unwrap_or_default();
    SearchError::BackendResponse {
        backend: BACKEND.to_string(),
        details: format!("{status}: {body}"),
    }
}

#[async_trait]
impl IndexService for MeilisearchStore {
    async fn create_index(
        &self,
        name: &str,
        settings: &IndexSettings,
    ) -> Result<IndexCreation, SearchError> {
        let mut creation = IndexCreation::AlreadyExists;

        if !self.index_exists(name).await? {
            let task_uid = self
                .enqueue(self.client.post(self.url("indexes")?).json(&json!({
                    "uid": name,
                    "primaryKey": settings.primary_key,
                })))
                .await?;

            creation = match self.wait_for_task(task_uid).await {
                Ok(()) => IndexCreation::Created,
                Err(SearchError::TaskFailed { code, .. }) if code == INDEX_ALREADY_EXISTS => {
                    IndexCreation::AlreadyExists
                }
                Err(error) => return Err(error),
            };
        }

        let task_uid = self
            .enqueue(
                self.client
                    .patch(self.url(&format!("indexes/{name}/settings"))?)
                    .json(&settings_payload(settings)),
            )
            .await?;
        self.wait_for_task(task_uid).await?;

        debug!(index = name, ?creation, "index settings applied");
        Ok(creation)
    }

    async fn add_documents(&self, name: &str, documents: &[Value]) -> Result<(), SearchError> {
        if documents.is_empty() {
            return Ok(());
        }

        let mut url = self.url(&format!("indexes/{name}/documents"))?;
        url.query_pairs_mut().append_pair("primaryKey", "id");

        let task_uid = self.enqueue(self.client.post(url).json(documents)).await?;
        self.wait_for_task(task_uid).await
    }

    async fn health(&self) -> Result<(), SearchError> {
        let response = self.client.get(self.url("health")?).send().await?;
        if !response.status().is_success() {
            return Err(SearchError::NotReady(response.status().to_string()));
        }

        let body: Value = response.json().await?;
        match body.pointer("/status").and_then(Value::as_str) {
            Some("available") => Ok(()),
            other => Err(SearchError::NotReady(format!(
                "health status {}",
                other.unwrap_or("missing")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(body: Value) -> TaskView {
        serde_json::from_value(body).expect("task view should parse")
    }

    #[test]
    fn finished_tasks_resolve() {
        let done = task_outcome(3, task(json!({"uid": 3, "status": "succeeded"})));
        assert!(matches!(done, Some(Ok(()))));

        let pending = task_outcome(4, task(json!({"uid": 4, "status": "processing"})));
        assert!(pending.is_none());
    }

    #[test]
    fn failed_task_carries_service_error_code() {
        let failed = task_outcome(
            7,
            task(json!({
                "uid": 7,
                "status": "failed",
                "error": {
                    "message": "Index `documents` already exists.",
                    "code": "index_already_exists",
                    "type": "invalid_request",
                    "link": "https://docs.meilisearch.com/errors#index_already_exists"
                }
            })),
        );

        match failed {
            Some(Err(SearchError::TaskFailed { task_uid, code, .. })) => {
                assert_eq!(task_uid, 7);
                assert_eq!(code, INDEX_ALREADY_EXISTS);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn settings_payload_lists_all_attribute_groups() {
        let payload = settings_payload(&crate::IndexSchema::Documents.settings());

        assert_eq!(
            payload,
            json!({
                "searchableAttributes": ["title", "content", "category"],
                "filterableAttributes": ["category", "source"],
                "sortableAttributes": ["title"],
            })
        );
    }

    #[test]
    fn endpoint_paths_join_onto_base_url() -> Result<(), SearchError> {
        let store = MeilisearchStore::new(Url::parse("http://meilisearch:7700")?, "key");
        assert_eq!(
            store.url("indexes/websites/documents")?.as_str(),
            "http://meilisearch:7700/indexes/websites/documents"
        );
        Ok(())
    }

    #[test]
    fn endpoint_path_prefix_survives_join() -> Result<(), SearchError> {
        let store = MeilisearchStore::new(Url::parse("http://host/meili")?, "key");
        assert_eq!(store.url("indexes")?.as_str(), "http://host/meili/indexes");
        assert_eq!(store.url("tasks/9")?.as_str(), "http://host/meili/tasks/9");
        Ok(())
    }
}
