use crate::{IndexSettings, SearchError};
use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexCreation {
    Created,
    AlreadyExists,
}

#[async_trait]
pub trait IndexService {
    async fn create_index(
        &self,
        name: &str,
        settings: &IndexSettings,
    ) -> Result<IndexCreation, SearchError>;

    async fn add_documents(&self, name: &str, documents: &[Value]) -> Result<(), SearchError>;

    async fn health(&self) -> Result<(), SearchError>;
}
