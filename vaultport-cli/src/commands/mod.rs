//! CLI command implementations.

pub mod convert;
pub mod inspect;
pub mod preview;

pub use convert::{convert_vault, ConvertOptions};
pub use inspect::inspect_archive;
pub use preview::preview_note;

use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use vaultport_core::{ConvertConfig, SiteArchive, SourceDocument, Warning, WarningLevel};
use walkdir::WalkDir;
use zip::ZipArchive;

/// Load the configuration file, falling back to defaults when it is absent.
pub(crate) fn load_config(path: &Path) -> Result<ConvertConfig> {
    if path.exists() {
        tracing::info!("Loading config from {:?}", path);
        ConvertConfig::from_file(path).context("Failed to load configuration")
    } else {
        tracing::debug!("No config file at {:?}, using defaults", path);
        Ok(ConvertConfig::default())
    }
}

/// Collect markdown documents under a vault directory in sorted order.
/// Hidden directories (like `.obsidian`) are skipped.
pub(crate) fn collect_documents(vault: &Path, section: &str) -> Result<Vec<SourceDocument>> {
    let mut documents = Vec::new();

    let walker = WalkDir::new(vault)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.starts_with('.'))
        });

    for entry in walker {
        let entry = entry.context("Failed to walk vault directory")?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = match entry.file_name().to_str() {
            Some(name) if is_markdown_name(name) => name.to_string(),
            _ => continue,
        };

        let raw_text = std::fs::read_to_string(entry.path())
            .with_context(|| format!("Failed to read {:?}", entry.path()))?;

        let mut doc = SourceDocument::new(name, raw_text);
        doc.target_dir = section.to_string();
        documents.push(doc);
    }

    Ok(documents)
}

fn is_markdown_name(name: &str) -> bool {
    let n = name.len();
    n >= 3 && name.is_char_boundary(n - 3) && name[n - 3..].eq_ignore_ascii_case(".md")
}

/// Read every entry of a zip archive into memory as a [`SiteArchive`].
pub(crate) fn read_site_archive(path: &Path) -> Result<SiteArchive> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let mut zip = ZipArchive::new(file).context("Failed to read zip archive")?;

    let mut entries = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).context("Failed to read zip entry")?;
        let name = entry.name().to_string();
        let mut data = Vec::with_capacity(entry.size() as usize);
        std::io::copy(&mut entry, &mut data)
            .with_context(|| format!("Failed to read zip entry {name}"))?;
        entries.push((name, data));
    }

    Ok(SiteArchive::from_entries(entries))
}

/// Route an advisory through the matching tracing level.
pub(crate) fn log_warning(document: &str, warning: &Warning) {
    match warning.level {
        WarningLevel::Error => tracing::error!("{}: {}", document, warning.message),
        WarningLevel::Warning => tracing::warn!("{}: {}", document, warning.message),
        WarningLevel::Info | WarningLevel::Notice => {
            tracing::info!("{}: {}", document, warning.message)
        }
    }
}
