use crate::document::{build_index_document, build_web_document};
use crate::extractor::ContentExtractor;
use crate::models::{IndexDocument, IndexSchema, SourceKind, WebDocument};
use crate::IngestError;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const MIRRORED_SITES_DIR: &str = "mirrored_sites";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSource {
    pub label: String,
    pub root: PathBuf,
    pub kind: SourceKind,
}

impl ContentSource {
    pub fn pdf_category(data_dir: &Path, category: &str) -> Self {
        Self {
            label: category.to_string(),
            root: data_dir.join(category),
            kind: SourceKind::Pdf,
        }
    }

    pub fn site(root: PathBuf, site_name: &str) -> Self {
        Self {
            label: site_name.to_string(),
            root,
            kind: SourceKind::Html,
        }
    }

    pub fn schema(&self) -> IndexSchema {
        self.kind.schema()
    }

    pub fn is_recursive(&self) -> bool {
        self.kind == SourceKind::Html
    }

    pub fn discover_files(&self) -> Vec<PathBuf> {
        discover_files(&self.root, self.kind.extension(), self.is_recursive())
    }
}

pub fn discover_files(folder: &Path, extension: &str, recursive: bool) -> Vec<PathBuf> {
    if !folder.is_dir() {
        debug!(folder = %folder.display(), "source directory absent; skipping");
        return Vec::new();
    }

    let mut walker = WalkDir::new(folder).min_depth(1).follow_links(true);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker.into_iter().filter_map(|item| item.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }

        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));

        if matches {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn pdf_sources(data_dir: &Path, categories: &[String]) -> Vec<ContentSource> {
    categories
        .iter()
        .map(|category| ContentSource::pdf_category(data_dir, category))
        .collect()
}

pub fn site_sources(mirror_root: &Path) -> Vec<ContentSource> {
    if !mirror_root.is_dir() {
        info!(root = %mirror_root.display(), "no mirrored websites found");
        return Vec::new();
    }

    let mut sites = WalkDir::new(mirror_root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|item| item.ok())
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            ContentSource::site(entry.into_path(), &name)
        })
        .collect::<Vec<_>>();

    sites.sort_by(|left, right| left.root.cmp(&right.root));
    sites
}

#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

pub struct IngestionReport<D> {
    pub documents: Vec<D>,
    pub skipped_files: Vec<SkippedFile>,
}

impl<D> Default for IngestionReport<D> {
    fn default() -> Self {
        Self {
            documents: Vec::new(),
            skipped_files: Vec::new(),
        }
    }
}

pub fn ingest_source_best_effort<D, B>(
    source: &ContentSource,
    extractor: &dyn ContentExtractor,
    build: B,
) -> IngestionReport<D>
where
    B: Fn(&Path, crate::ExtractedContent) -> Result<D, IngestError>,
{
    let mut report = IngestionReport::default();

    for path in source.discover_files() {
        let built = extractor
            .extract(&path)
            .and_then(|extracted| build(&path, extracted));

        match built {
            Ok(document) => {
                debug!(source = %source.label, path = %path.display(), "extracted");
                report.documents.push(document);
            }
            Err(error) => {
                warn!(source = %source.label, path = %path.display(), %error, "skipping file");
                report.skipped_files.push(SkippedFile {
                    path,
                    reason: error.to_string(),
                });
            }
        }
    }

    report
}

pub fn ingest_pdf_category(
    source: &ContentSource,
    extractor: &dyn ContentExtractor,
) -> IngestionReport<IndexDocument> {
    ingest_source_best_effort(source, extractor, |path, extracted| {
        build_index_document(path, &source.label, extracted)
    })
}

pub fn ingest_site(
    source: &ContentSource,
    extractor: &dyn ContentExtractor,
) -> IngestionReport<WebDocument> {
    ingest_source_best_effort(source, extractor, |path, extracted| {
        build_web_document(path, &source.root, &source.label, extracted)
    })
}
