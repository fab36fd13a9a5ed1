use crate::error::IngestError;
use crate::models::{ExtractedContent, SourceKind, PDF_PAGE_LIMIT};
use lopdf::Document;
use scraper::{Html, Node, Selector};
use std::path::Path;
use tracing::debug;

pub trait ContentExtractor {
    fn kind(&self) -> SourceKind;

    fn extract(&self, path: &Path) -> Result<ExtractedContent, IngestError>;
}

#[derive(Debug, Clone, Copy)]
pub struct LopdfExtractor {
    pub page_limit: usize,
}

impl Default for LopdfExtractor {
    fn default() -> Self {
        Self {
            page_limit: PDF_PAGE_LIMIT,
        }
    }
}

impl ContentExtractor for LopdfExtractor {
    fn kind(&self) -> SourceKind {
        SourceKind::Pdf
    }

    fn extract(&self, path: &Path) -> Result<ExtractedContent, IngestError> {
        let document =
            Document::load(path).map_err(|error| IngestError::PdfParse(error.to_string()))?;

        let text = join_leading_pages(document.get_pages().into_keys(), self.page_limit, |page_no| {
            document.extract_text(&[page_no]).unwrap_or_else(|error| {
                debug!(
                    path = %path.display(),
                    page = page_no,
                    %error,
                    "page has no extractable text"
                );
                String::new()
            })
        });

        Ok(ExtractedContent { text, title: None })
    }
}

pub fn join_leading_pages<I, F>(pages: I, limit: usize, mut page_text: F) -> String
where
    I: IntoIterator<Item = u32>,
    F: FnMut(u32) -> String,
{
    pages
        .into_iter()
        .take(limit)
        .map(|page_no| page_text(page_no))
        .collect()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlExtractor;

impl ContentExtractor for HtmlExtractor {
    fn kind(&self) -> SourceKind {
        SourceKind::Html
    }

    fn extract(&self, path: &Path) -> Result<ExtractedContent, IngestError> {
        let bytes = std::fs::read(path)?;
        extract_html(&decode_discarding_invalid(&bytes))
    }
}

const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "template", "noscript"];

pub fn extract_html(markup: &str) -> Result<ExtractedContent, IngestError> {
    let document = Html::parse_document(markup);
    let title_selector = selector("title")?;
    let body_selector = selector("body")?;

    let title = document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|title| !title.is_empty());

    let mut fragments = Vec::new();
    if let Some(body) = document.select(&body_selector).next() {
        for node in body.descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
                Node::Element(element) => HIDDEN_ELEMENTS.contains(&element.name()),
                _ => false,
            });
            if !hidden {
                fragments.push(&**text);
            }
        }
    }

    Ok(ExtractedContent {
        text: collapse_whitespace(&fragments.join(" ")),
        title,
    })
}

fn selector(css: &str) -> Result<Selector, IngestError> {
    Selector::parse(css).map_err(|error| IngestError::HtmlParse(error.to_string()))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn decode_discarding_invalid(mut bytes: &[u8]) -> String {
    let mut decoded = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                decoded.push_str(valid);
                return decoded;
            }
            Err(error) => {
                let (valid, rest) = bytes.split_at(error.valid_up_to());
                decoded.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match error.error_len() {
                    Some(invalid) => bytes = &rest[invalid..],
                    None => return decoded,
                }
            }
        }
    }
}
