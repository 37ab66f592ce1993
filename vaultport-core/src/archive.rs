//! Output-archive assembly and existing-archive import.
//!
//! Archives are treated as ordered `(path, bytes)` entry lists; the
//! containing zip format is the caller's concern. The merge here is purely
//! path-keyed; no content-level merging is attempted.

use crate::config::ConvertConfig;
use crate::models::DocumentReport;
use crate::site;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Site metadata pattern-matched out of an uploaded site configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteMeta {
    pub base_url: String,
    pub title: String,
    pub description: String,
    pub author: String,
}

/// A previously generated site archive, normalized for merging.
#[derive(Debug, Clone, Default)]
pub struct SiteArchive {
    /// Single wrapping top-level folder that was stripped, if any
    /// (with trailing slash)
    pub root_prefix: String,

    /// Entries keyed by normalized path
    pub files: BTreeMap<String, Vec<u8>>,

    /// Raw text of the site-configuration file, when present
    pub site_config_raw: Option<String>,

    /// Metadata extracted from the site configuration
    pub site_meta: Option<SiteMeta>,

    /// Documents under the content root, excluding index-only files
    pub existing_posts: Vec<String>,

    /// Content subdirectories derived from existing document paths;
    /// always includes "posts" first
    pub content_dirs: Vec<String>,
}

impl SiteArchive {
    /// Apply the import contract to a set of raw archive entries.
    ///
    /// Strips a single wrapping folder when and only when every entry
    /// shares an identical first path segment, locates and parses the
    /// site configuration, and enumerates existing posts and content
    /// directories.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        let raw: Vec<(String, Vec<u8>)> = entries
            .into_iter()
            .filter(|(path, _)| !path.ends_with('/'))
            .collect();

        let root_prefix = detect_root_prefix(raw.iter().map(|(p, _)| p.as_str()));

        let mut archive = SiteArchive {
            root_prefix: root_prefix.clone(),
            ..Default::default()
        };

        let mut dir_set: Vec<String> = Vec::new();

        for (path, data) in raw {
            let normal = path
                .strip_prefix(root_prefix.as_str())
                .unwrap_or(&path)
                .to_string();

            if normal == site::SITE_CONFIG_PATH {
                if let Ok(text) = String::from_utf8(data.clone()) {
                    archive.site_meta = Some(parse_site_config(&text));
                    archive.site_config_raw = Some(text);
                }
            }

            if let Some(rel) = normal.strip_prefix("content/") {
                if rel.ends_with(".md") {
                    let file_name = rel.rsplit('/').next().unwrap_or(rel);
                    if file_name != "_index.md" {
                        archive.existing_posts.push(normal.clone());
                    }
                    // Record every parent directory chain under content/
                    let parts: Vec<&str> = rel.split('/').collect();
                    for depth in 1..parts.len() {
                        let dir = parts[..depth].join("/");
                        if !dir_set.contains(&dir) {
                            dir_set.push(dir);
                        }
                    }
                }
            }

            archive.files.insert(normal, data);
        }

        dir_set.sort();
        if !dir_set.iter().any(|d| d == "posts") {
            dir_set.insert(0, "posts".to_string());
        }
        archive.content_dirs = dir_set;

        tracing::debug!(
            posts = archive.existing_posts.len(),
            dirs = archive.content_dirs.len(),
            "Imported existing site archive"
        );
        archive
    }

    /// Whether a generated document path collides with an existing entry.
    pub fn has_post(&self, path: &str) -> bool {
        self.existing_posts.iter().any(|p| p == path)
    }
}

/// Shared first path segment across every entry, or empty.
fn detect_root_prefix<'a, I>(paths: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut candidate: Option<String> = None;
    for path in paths {
        let Some(slash) = path.find('/') else {
            return String::new();
        };
        let prefix = &path[..slash + 1];
        match &candidate {
            None => candidate = Some(prefix.to_string()),
            Some(existing) if existing == prefix => {}
            Some(_) => return String::new(),
        }
    }
    candidate.unwrap_or_default()
}

static CONFIG_FIELD_REGEXES: OnceLock<[Regex; 4]> = OnceLock::new();

fn config_field_regexes() -> &'static [Regex; 4] {
    CONFIG_FIELD_REGEXES.get_or_init(|| {
        let field = |name: &str| {
            Regex::new(&format!(r#"{name}\s*=\s*["']([^"']+)["']"#)).unwrap()
        };
        [
            field("baseURL"),
            field("title"),
            field("description"),
            field("author"),
        ]
    })
}

/// Extract site metadata from configuration text by pattern match. This is
/// not a TOML parser; the first occurrence of each field wins.
pub fn parse_site_config(text: &str) -> SiteMeta {
    let [base_url_re, title_re, description_re, author_re] = config_field_regexes();
    let first = |re: &Regex| {
        re.captures(text)
            .map(|c| c[1].to_string())
            .unwrap_or_default()
    };
    SiteMeta {
        base_url: first(base_url_re),
        title: first(title_re),
        description: first(description_re),
        author: first(author_re),
    }
}

/// Merge pipeline outputs with an optional existing archive into the final
/// entry list (paths relative to the site root, input order preserved).
///
/// Policy: existing entries are copied verbatim except (a) paths a
/// generated document will occupy (generated always wins), (b) the site
/// configuration when it is not preserved, and (c) the infrastructure
/// paths, which are always regenerated.
pub fn assemble_site(
    reports: &[DocumentReport],
    config: &ConvertConfig,
    existing: Option<&SiteArchive>,
    preserve_site_config: bool,
) -> Vec<(String, Vec<u8>)> {
    let generated_paths: Vec<String> = reports
        .iter()
        .filter(|r| r.succeeded())
        .map(|r| r.content_path())
        .collect();

    let mut entries: Vec<(String, Vec<u8>)> = Vec::new();

    if let Some(existing) = existing {
        for (path, data) in &existing.files {
            if generated_paths.iter().any(|p| p == path) {
                continue;
            }
            if path == site::SITE_CONFIG_PATH && !preserve_site_config {
                continue;
            }
            if path == site::GO_MOD_PATH
                || path == site::GO_SUM_PATH
                || path == site::WORKFLOW_PATH
            {
                continue;
            }
            entries.push((path.clone(), data.clone()));
        }
    }

    // Site configuration: preserved above, or freshly generated
    let config_preserved = preserve_site_config
        && existing.is_some_and(|e| e.files.contains_key(site::SITE_CONFIG_PATH));
    if !config_preserved {
        entries.push((
            site::SITE_CONFIG_PATH.to_string(),
            site::hugo_config(config).into_bytes(),
        ));
    }

    entries.push((site::GO_MOD_PATH.to_string(), site::go_mod(config).into_bytes()));
    entries.push((site::GO_SUM_PATH.to_string(), site::GO_SUM.as_bytes().to_vec()));
    entries.push((
        site::WORKFLOW_PATH.to_string(),
        site::deploy_workflow().into_bytes(),
    ));

    for report in reports {
        if let Some(result) = &report.result {
            entries.push((report.content_path(), result.output_text.clone().into_bytes()));
        }
    }

    entries.push((
        site::IMAGES_README_PATH.to_string(),
        site::IMAGES_README.as_bytes().to_vec(),
    ));

    entries
}

/// Flat posts-only export: each transformed document at `<slug>.md`.
pub fn assemble_posts(reports: &[DocumentReport]) -> Vec<(String, Vec<u8>)> {
    reports
        .iter()
        .filter_map(|report| {
            report.result.as_ref().map(|result| {
                (
                    format!("{}.md", report.slug),
                    result.output_text.clone().into_bytes(),
                )
            })
        })
        .collect()
}
