use serde::{Deserialize, Serialize};

pub const DOCUMENTS_INDEX: &str = "documents";
pub const WEBSITES_INDEX: &str = "websites";

pub const PDF_PAGE_LIMIT: usize = 10;
pub const DOCUMENT_CONTENT_LIMIT: usize = 5_000;
pub const WEBSITE_CONTENT_LIMIT: usize = 3_000;
pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Pdf,
    Html,
}

impl SourceKind {
    pub fn extension(self) -> &'static str {
        match self {
            SourceKind::Pdf => "pdf",
            SourceKind::Html => "html",
        }
    }

    pub fn schema(self) -> IndexSchema {
        match self {
            SourceKind::Pdf => IndexSchema::Documents,
            SourceKind::Html => IndexSchema::Websites,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexSchema {
    Documents,
    Websites,
}

impl IndexSchema {
    pub fn index_name(self) -> &'static str {
        match self {
            IndexSchema::Documents => DOCUMENTS_INDEX,
            IndexSchema::Websites => WEBSITES_INDEX,
        }
    }

    pub fn content_limit(self) -> usize {
        match self {
            IndexSchema::Documents => DOCUMENT_CONTENT_LIMIT,
            IndexSchema::Websites => WEBSITE_CONTENT_LIMIT,
        }
    }

    pub fn settings(self) -> IndexSettings {
        match self {
            IndexSchema::Documents => IndexSettings {
                primary_key: "id".to_string(),
                searchable_attributes: strings(&["title", "content", "category"]),
                filterable_attributes: strings(&["category", "source"]),
                sortable_attributes: strings(&["title"]),
            },
            IndexSchema::Websites => IndexSettings {
                primary_key: "id".to_string(),
                searchable_attributes: strings(&["title", "content", "url", "site_name"]),
                filterable_attributes: strings(&["site_name"]),
                sortable_attributes: strings(&["title"]),
            },
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IndexSettings {
    pub primary_key: String,
    pub searchable_attributes: Vec<String>,
    pub filterable_attributes: Vec<String>,
    pub sortable_attributes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedContent {
    pub text: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexDocument {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub source: String,
    pub file_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebDocument {
    pub id: String,
    pub title: String,
    pub content: String,
    pub url: String,
    pub site_name: String,
    pub file_path: String,
}

pub trait SourceLabel {
    fn source_label(&self) -> &str;
}

impl SourceLabel for IndexDocument {
    fn source_label(&self) -> &str {
        &self.category
    }
}

impl SourceLabel for WebDocument {
    fn source_label(&self) -> &str {
        &self.site_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn settings_serialize_with_service_field_names() {
        let value = serde_json::to_value(IndexSchema::Websites.settings())
            .expect("settings should serialize");

        assert_eq!(value["primaryKey"], json!("id"));
        assert_eq!(
            value["searchableAttributes"],
            json!(["title", "content", "url", "site_name"])
        );
        assert_eq!(value["filterableAttributes"], json!(["site_name"]));
        assert_eq!(value["sortableAttributes"], json!(["title"]));
    }

    #[test]
    fn source_kinds_map_to_their_schema() {
        assert_eq!(SourceKind::Pdf.schema(), IndexSchema::Documents);
        assert_eq!(SourceKind::Html.schema().index_name(), "websites");
        assert_eq!(IndexSchema::Documents.content_limit(), 5_000);
        assert_eq!(IndexSchema::Websites.content_limit(), 3_000);
    }

    #[test]
    fn empty_content_is_serialized_not_omitted() {
        let document = IndexDocument {
            id: "medical_x".to_string(),
            title: "X".to_string(),
            content: String::new(),
            category: "medical".to_string(),
            source: "x.pdf".to_string(),
            file_path: "/data/medical/x.pdf".to_string(),
        };

        let value = serde_json::to_value(&document).expect("document should serialize");
        assert_eq!(value["content"], json!(""));
    }
}
