//! Preview command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;
use vaultport_core::{
    line_diff, transform_document, LineMark, ResolverIndex, SourceDocument,
};

/// Transform a single note and print the result, a diff, or JSON.
///
/// Sibling markdown files in the same directory are indexed so wikilinks
/// among them resolve the same way a full conversion would resolve them.
pub fn preview_note(config_path: &Path, file: &Path, diff: bool, json: bool) -> Result<()> {
    let config = super::load_config(config_path)?;

    let name = match file.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.to_string(),
        None => bail!("Not a markdown file path: {:?}", file),
    };
    let raw_text =
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {:?}", file))?;

    let parent = file.parent().unwrap_or_else(|| Path::new("."));
    let siblings = super::collect_documents(parent, "posts")?;
    let index = ResolverIndex::build(&siblings);

    let doc = SourceDocument::new(name, raw_text.clone());
    let result = transform_document(&doc, &index, &config);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    for warning in &result.warnings {
        super::log_warning(&doc.name, warning);
    }

    if diff {
        print_diff(&raw_text, &result.output_text);
    } else {
        println!("{}", result.output_text);
    }
    Ok(())
}

/// Merged diff view: removed original lines first, then added lines, with
/// unchanged lines printed once.
fn print_diff(original: &str, transformed: &str) {
    let orig_lines: Vec<&str> = original.split('\n').collect();
    let trans_lines: Vec<&str> = transformed.split('\n').collect();
    let (orig_marks, trans_marks) = line_diff(original, transformed);

    let mut i = 0;
    let mut j = 0;
    while i < orig_lines.len() || j < trans_lines.len() {
        if i < orig_lines.len() && orig_marks[i] == LineMark::Removed {
            println!("- {}", orig_lines[i]);
            i += 1;
        } else if j < trans_lines.len() && trans_marks[j] == LineMark::Added {
            println!("+ {}", trans_lines[j]);
            j += 1;
        } else {
            println!("  {}", orig_lines[i]);
            i += 1;
            j += 1;
        }
    }
}
