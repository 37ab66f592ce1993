//! Convert command implementation.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use vaultport_core::{
    archive, site, transform_batch, BatchOutput, ConvertConfig,
};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub struct ConvertOptions {
    pub output: Option<PathBuf>,
    pub existing: Option<PathBuf>,
    pub posts_only: bool,
    pub section: String,
    pub site_name: Option<String>,
    pub github_username: Option<String>,
    pub repo: Option<String>,
    pub alt_delimiters: bool,
    pub alt_line_breaks: bool,
    pub regenerate_config: bool,
    pub json: bool,
}

/// Convert a vault directory into a Hugo site archive (or a flat posts
/// archive with `--posts-only`).
pub fn convert_vault(config_path: &Path, vault: &Path, opts: ConvertOptions) -> Result<()> {
    let mut config = super::load_config(config_path)?;
    apply_overrides(&mut config, &opts);

    let documents = super::collect_documents(vault, &opts.section)?;
    if documents.is_empty() {
        bail!("No markdown files found under {:?}", vault);
    }
    tracing::info!("Found {} markdown files", documents.len());

    let existing = opts
        .existing
        .as_deref()
        .map(super::read_site_archive)
        .transpose()?;
    if let Some(existing) = &existing {
        tracing::info!(
            "Merging into existing site with {} posts",
            existing.existing_posts.len()
        );
    }

    let output = transform_batch(&documents, &config, existing.as_ref());

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for report in &output.documents {
            for warning in &report.warnings {
                super::log_warning(&report.name, warning);
            }
        }
    }

    let entries = if opts.posts_only {
        archive::assemble_posts(&output.documents)
    } else {
        let root = site::site_archive_root(&config);
        archive::assemble_site(
            &output.documents,
            &config,
            existing.as_ref(),
            config.preserve_site_config,
        )
        .into_iter()
        .map(|(path, data)| (format!("{root}/{path}"), data))
        .collect()
    };

    let output_path = opts.output.unwrap_or_else(|| {
        if opts.posts_only {
            PathBuf::from("posts.zip")
        } else {
            PathBuf::from(format!("{}.zip", site::site_archive_root(&config)))
        }
    });
    write_zip(&output_path, &entries)?;

    let converted = output.documents.iter().filter(|d| d.succeeded()).count();
    tracing::info!(
        "Wrote {:?}: {} of {} documents converted, {} problems",
        output_path,
        converted,
        output.documents.len(),
        output.problem_count()
    );

    if failed_documents(&output) > 0 {
        bail!("{} documents failed to convert", failed_documents(&output));
    }
    Ok(())
}

fn apply_overrides(config: &mut ConvertConfig, opts: &ConvertOptions) {
    if let Some(site_name) = &opts.site_name {
        config.site_name = site_name.clone();
    }
    if let Some(username) = &opts.github_username {
        config.github_username = username.clone();
    }
    if let Some(repo) = &opts.repo {
        config.repo_name = repo.clone();
    }
    if opts.alt_delimiters {
        config.math_alt_delimiters = true;
    }
    if opts.alt_line_breaks {
        config.math_alt_line_breaks = true;
    }
    if opts.regenerate_config {
        config.preserve_site_config = false;
    }
}

fn failed_documents(output: &BatchOutput) -> usize {
    output.documents.iter().filter(|d| !d.succeeded()).count()
}

fn write_zip(path: &Path, entries: &[(String, Vec<u8>)]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create archive {:?}", path))?;
    let mut zip = ZipWriter::new(file);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, data) in entries {
        zip.start_file(name, deflated)
            .with_context(|| format!("Failed to add {name} to archive"))?;
        zip.write_all(data)
            .with_context(|| format!("Failed to write {name} to archive"))?;
    }

    zip.finish().context("Failed to finalize archive")?;
    Ok(())
}
