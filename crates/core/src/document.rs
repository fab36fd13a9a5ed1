use crate::error::IngestError;
use crate::models::{ExtractedContent, IndexDocument, IndexSchema, WebDocument};
use std::path::{Component, Path, PathBuf};

pub fn build_index_document(
    path: &Path,
    category: &str,
    extracted: ExtractedContent,
) -> Result<IndexDocument, IngestError> {
    let stem = file_stem(path)?;
    let source = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))?;

    Ok(IndexDocument {
        id: format!("{}_{}", slugify(category), slugify(&stem)),
        title: resolve_title(extracted.title, &stem),
        content: truncate_chars(&extracted.text, IndexSchema::Documents.content_limit()),
        category: category.to_string(),
        source,
        file_path: absolute_path(path).to_string_lossy().to_string(),
    })
}

/// `site_root` is the site's own directory, i.e. `mirrored_sites/<site_name>`.
pub fn build_web_document(
    path: &Path,
    site_root: &Path,
    site_name: &str,
    extracted: ExtractedContent,
) -> Result<WebDocument, IngestError> {
    let stem = file_stem(path)?;

    Ok(WebDocument {
        id: format!("site_{}_{}", slugify(site_name), slugify(&stem)),
        title: resolve_title(extracted.title, &stem),
        content: truncate_chars(&extracted.text, IndexSchema::Websites.content_limit()),
        url: relative_url(site_root, path)?,
        site_name: site_name.to_string(),
        file_path: absolute_path(path).to_string_lossy().to_string(),
    })
}

fn file_stem(path: &Path) -> Result<String, IngestError> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))
}

pub fn slugify(stem: &str) -> String {
    stem.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

fn resolve_title(extracted: Option<String>, stem: &str) -> String {
    extracted
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| humanize_stem(stem))
}

pub fn humanize_stem(stem: &str) -> String {
    let mut title = String::with_capacity(stem.len());
    let mut at_word_start = true;

    for ch in stem.chars() {
        let ch = if ch == '_' || ch == '-' { ' ' } else { ch };
        if ch.is_alphabetic() {
            if at_word_start {
                title.extend(ch.to_uppercase());
            } else {
                title.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            title.push(ch);
            at_word_start = true;
        }
    }

    title
}

pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

pub fn relative_url(root: &Path, path: &Path) -> Result<String, IngestError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| IngestError::OutsideRoot {
            path: path.display().to_string(),
            root: root.display().to_string(),
        })?;

    let segments = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().to_string()),
            _ => None,
        })
        .collect::<Vec<_>>();

    Ok(format!("/{}", segments.join("/")))
}

fn absolute_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_scenario_builds_expected_document() -> Result<(), IngestError> {
        let path = Path::new("/data/medical/first_aid_basics.pdf");
        let extracted = ExtractedContent {
            text: "Apply pressure to the wound immediately.".to_string(),
            title: None,
        };

        let document = build_index_document(path, "medical", extracted)?;

        assert_eq!(document.id, "medical_first_aid_basics");
        assert_eq!(document.title, "First Aid Basics");
        assert_eq!(document.content, "Apply pressure to the wound immediately.");
        assert_eq!(document.category, "medical");
        assert_eq!(document.source, "first_aid_basics.pdf");
        assert_eq!(document.file_path, "/data/medical/first_aid_basics.pdf");
        Ok(())
    }

    #[test]
    fn web_scenario_builds_expected_document() -> Result<(), IngestError> {
        let site_root = Path::new("/data/mirrored_sites/wiki");
        let path = site_root.join("a").join("b").join("page.html");
        let extracted = ExtractedContent {
            text: "Welcome".to_string(),
            title: Some("Intro".to_string()),
        };

        let document = build_web_document(&path, site_root, "wiki", extracted)?;

        assert_eq!(document.id, "site_wiki_page");
        assert_eq!(document.title, "Intro");
        assert_eq!(document.url, "/a/b/page.html");
        assert_eq!(document.site_name, "wiki");
        assert_eq!(document.file_path, "/data/mirrored_sites/wiki/a/b/page.html");
        Ok(())
    }

    #[test]
    fn missing_title_falls_back_to_capitalized_stem() -> Result<(), IngestError> {
        let site_root = Path::new("/data/mirrored_sites/wiki");
        let path = site_root.join("water_STORAGE-tips.html");

        let document =
            build_web_document(&path, site_root, "wiki", ExtractedContent::default())?;

        assert_eq!(document.title, "Water Storage Tips");
        assert_eq!(document.content, "");
        Ok(())
    }

    #[test]
    fn humanize_matches_title_case_rules() {
        assert_eq!(humanize_stem("first_aid_basics"), "First Aid Basics");
        assert_eq!(humanize_stem("FAQ"), "Faq");
        assert_eq!(humanize_stem("vol2part"), "Vol2Part");
        assert_eq!(humanize_stem(""), "");
    }

    #[test]
    fn content_is_cut_to_schema_limits() -> Result<(), IngestError> {
        let long = "é".repeat(6_000);
        let document = build_index_document(
            Path::new("/data/survival/long.pdf"),
            "survival",
            ExtractedContent {
                text: long.clone(),
                title: None,
            },
        )?;
        assert_eq!(document.content.chars().count(), 5_000);

        let site_root = Path::new("/data/mirrored_sites/s");
        let page = build_web_document(
            &site_root.join("long.html"),
            site_root,
            "s",
            ExtractedContent {
                text: long,
                title: None,
            },
        )?;
        assert_eq!(page.content.chars().count(), 3_000);
        Ok(())
    }

    #[test]
    fn truncation_is_a_plain_prefix() {
        assert_eq!(truncate_chars("hello world", 7), "hello w");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn ids_are_stable_across_builds() -> Result<(), IngestError> {
        let path = Path::new("/data/gardening/seed saving.v2.pdf");
        let first = build_index_document(path, "gardening", ExtractedContent::default())?;
        let second = build_index_document(path, "gardening", ExtractedContent::default())?;

        assert_eq!(first.id, second.id);
        assert_eq!(first.id, "gardening_seed_saving_v2");
        Ok(())
    }

    #[test]
    fn relative_urls_use_forward_slashes() -> Result<(), IngestError> {
        let root = Path::new("/mirror/site");
        let url = relative_url(root, &root.join("docs").join("index.html"))?;
        assert_eq!(url, "/docs/index.html");
        assert!(url.starts_with('/'));
        assert!(!url.contains('\\'));

        assert!(relative_url(root, Path::new("/elsewhere/page.html")).is_err());
        Ok(())
    }
}
