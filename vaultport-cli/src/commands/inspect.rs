//! Inspect command implementation.

use anyhow::Result;
use std::path::Path;

/// Summarize an existing site archive: detected root folder, site
/// metadata, content directories, and posts.
pub fn inspect_archive(path: &Path, json: bool) -> Result<()> {
    let archive = super::read_site_archive(path)?;

    if json {
        let summary = serde_json::json!({
            "root_prefix": archive.root_prefix,
            "site_meta": archive.site_meta,
            "content_dirs": archive.content_dirs,
            "existing_posts": archive.existing_posts,
            "entry_count": archive.files.len(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if archive.root_prefix.is_empty() {
        println!("Root folder: (none)");
    } else {
        println!("Root folder: {}", archive.root_prefix);
    }

    match &archive.site_meta {
        Some(meta) => {
            println!("Site title: {}", meta.title);
            if !meta.base_url.is_empty() {
                println!("Base URL: {}", meta.base_url);
            }
            if !meta.author.is_empty() {
                println!("Author: {}", meta.author);
            }
        }
        None => println!("Site configuration: not found"),
    }

    println!("Entries: {}", archive.files.len());
    println!("Content directories: {}", archive.content_dirs.join(", "));
    println!("Posts: {}", archive.existing_posts.len());
    for post in &archive.existing_posts {
        println!("  {post}");
    }
    Ok(())
}
