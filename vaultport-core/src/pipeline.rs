//! Per-document transformation pipeline and the batch driver.
//!
//! Flow per document: frontmatter split, code protection, embed rewrite,
//! link rewrite, code restoration, math transform, tag extraction,
//! metadata merge, serialization.
//!
//! The ordering is a correctness invariant: code is protected before the
//! link passes so link-like text inside code survives untouched, restored
//! once rewriting is done, and shielded again around the math and tag
//! passes so dollar signs and hashtags inside code are never rewritten or
//! harvested.
//!
//! Every step is a pure function of `(document, index, config)`; the
//! index is built once per batch and frozen before any transform starts,
//! which is what lets the batch phase run documents in parallel.

use crate::archive::SiteArchive;
use crate::config::ConvertConfig;
use crate::frontmatter::{self, FrontMatter, Value};
use crate::markdown::{extract_inline_tags, transform_math, CodeGuard, MathOptions};
use crate::models::{
    BatchOutput, DocumentReport, SourceDocument, TransformResult, Warning,
};
use crate::resolver::{self, ResolverIndex};
use crate::slug::{slugify, title_from_filename};
use chrono::NaiveDate;
use rayon::prelude::*;
use regex::Regex;
use std::sync::OnceLock;

static H1_REGEX: OnceLock<Regex> = OnceLock::new();

fn h1_regex() -> &'static Regex {
    H1_REGEX.get_or_init(|| Regex::new(r"(?m)^#\s+(.+)$").unwrap())
}

/// Run the full pipeline for one document against a frozen batch index.
///
/// Infallible by design: malformed input degrades gracefully and is
/// reported through the result's advisory list.
pub fn transform_document(
    doc: &SourceDocument,
    index: &ResolverIndex,
    config: &ConvertConfig,
) -> TransformResult {
    transform_document_at(doc, index, config, chrono::Local::now().date_naive())
}

/// Pipeline body with an explicit date stamp, for deterministic tests.
pub fn transform_document_at(
    doc: &SourceDocument,
    index: &ResolverIndex,
    config: &ConvertConfig,
    today: NaiveDate,
) -> TransformResult {
    fault_check(doc);

    let mut warnings: Vec<Warning> = Vec::new();

    // 1. Split existing front matter from the body
    let (existing_fm, body) = frontmatter::parse(&doc.raw_text);
    let mut fm = existing_fm.unwrap_or_default();

    // 2. Protect code regions before any rewriting
    let mut guard = CodeGuard::new();
    let mut text = guard.protect(&body);

    // 3. Embeds first, then generic links
    text = resolver::rewrite_embeds(&text);
    let (linked, link_warnings) = resolver::rewrite_links(&text, index);
    text = linked;
    warnings.extend(link_warnings);

    // 4. Restore code so the final body carries real regions again
    text = guard.restore(&text);

    // 5. Math transform, with code shielded a second time so dollar
    //    signs inside code regions are never read as delimiters
    let mut math_guard = CodeGuard::new();
    let math_outcome = transform_math(
        &math_guard.protect(&text),
        MathOptions {
            alt_delimiters: config.math_alt_delimiters,
            alt_line_breaks: config.math_alt_line_breaks,
        },
    );
    text = math_guard.restore(&math_outcome.text);
    warnings.extend(math_outcome.advisory.clone());

    // 6. Harvest inline tags from the finalized body, with code regions
    //    shielded again so tags inside code are never collected
    let mut tag_guard = CodeGuard::new();
    let inline_tags = extract_inline_tags(&tag_guard.protect(&text));

    // 7. Merge metadata
    merge_metadata(
        &mut fm,
        &doc.name,
        &text,
        &inline_tags,
        math_outcome.has_math,
        today,
        &mut warnings,
    );

    // 8. Serialize and reassemble
    let output_text = format!("---\n{}\n---\n\n{}", fm.serialize(), text);

    TransformResult {
        output_text,
        front_matter: fm,
        warnings,
        has_math: math_outcome.has_math,
    }
}

fn merge_metadata(
    fm: &mut FrontMatter,
    name: &str,
    body: &str,
    inline_tags: &[String],
    has_math: bool,
    today: NaiveDate,
    warnings: &mut Vec<Warning>,
) {
    // Title: existing wins, then first H1, then the cleaned file name
    if !matches!(fm.get("title"), Some(v) if !matches!(v, Value::Null)) {
        let title = h1_regex()
            .captures(body)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_else(|| title_from_filename(name));
        fm.set("title", title);
    }

    // Date: existing date or created field wins, else stamp today
    let has_date = |key: &str| matches!(fm.get(key), Some(v) if !matches!(v, Value::Null));
    if !has_date("date") && !has_date("created") {
        fm.set("date", today.format("%Y-%m-%d").to_string());
    }

    // Draft: default false when unset
    if fm.get("draft").is_none() {
        fm.set("draft", false);
    }

    // Tags: deduplicated union, existing order preserved, new appended
    let existing_tags = fm.tags();
    if !inline_tags.is_empty() {
        let new_tags: Vec<&String> = inline_tags
            .iter()
            .filter(|t| !existing_tags.contains(t))
            .collect();

        if !existing_tags.is_empty() && !new_tags.is_empty() {
            let plural = if new_tags.len() > 1 { "s" } else { "" };
            warnings.push(Warning::info(format!(
                "Tags exist both in the article body and front matter. All tags have \
                 been merged ({} new tag{plural} added).",
                new_tags.len()
            )));
        }

        let merged: Vec<Value> = existing_tags
            .iter()
            .chain(new_tags.into_iter())
            .map(|t| Value::String(t.clone()))
            .collect();
        fm.set("tags", Value::List(merged));
    }

    if has_math {
        fm.set("math", true);
    }
}

/// Transform a whole batch: build the index once, freeze it, then run
/// every document through the pipeline in parallel.
///
/// A panicking transform is isolated to its document and surfaces as an
/// `error` advisory; every other document still produces a result.
pub fn transform_batch(
    documents: &[SourceDocument],
    config: &ConvertConfig,
    existing: Option<&SiteArchive>,
) -> BatchOutput {
    let index = ResolverIndex::build(documents);
    tracing::info!(
        documents = documents.len(),
        duplicates = index.duplicates.len(),
        "Transforming batch"
    );

    let documents_out: Vec<DocumentReport> = documents
        .par_iter()
        .map(|doc| {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                transform_document(doc, &index, config)
            }));

            let slug = index
                .get(doc.base_name())
                .map(|e| e.slug.clone())
                .unwrap_or_else(|| slugify(doc.base_name()));

            let mut report = match outcome {
                Ok(result) => {
                    let warnings = result.warnings.clone();
                    DocumentReport {
                        name: doc.name.clone(),
                        slug,
                        target_dir: doc.target_dir.clone(),
                        result: Some(result),
                        warnings,
                    }
                }
                Err(panic) => {
                    let detail = panic_message(&panic);
                    tracing::error!("Transformation of {} failed: {}", doc.name, detail);
                    DocumentReport {
                        name: doc.name.clone(),
                        slug,
                        target_dir: doc.target_dir.clone(),
                        result: None,
                        warnings: vec![Warning::error(format!(
                            "Transformation failed: {detail}"
                        ))],
                    }
                }
            };

            if index.duplicates.iter().any(|d| d == doc.base_name()) {
                report.warnings.push(Warning::warning(format!(
                    "Duplicate filename \"{}\" detected. Wikilink resolution may be \
                     ambiguous.",
                    doc.name
                )));
            }

            if let Some(existing) = existing {
                let target_path = report.content_path();
                if existing.has_post(&target_path) {
                    report.warnings.push(Warning::warning(format!(
                        "\"{target_path}\" already exists in the uploaded site. It will \
                         be overwritten."
                    )));
                }
            }

            report
        })
        .collect();

    BatchOutput {
        documents: documents_out,
        duplicates: index.duplicates,
    }
}

/// Sentinel that makes a transform panic, so batch tests can drive the
/// isolation path end to end.
#[cfg(test)]
pub(crate) const FAULT_MARKER: &str = "<<transform-fault>>";

#[cfg(test)]
fn fault_check(doc: &SourceDocument) {
    if doc.raw_text.contains(FAULT_MARKER) {
        panic!("injected transform failure");
    }
}

#[cfg(not(test))]
fn fault_check(_doc: &SourceDocument) {}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WarningLevel;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn run(doc: &SourceDocument, index: &ResolverIndex) -> TransformResult {
        transform_document_at(doc, index, &ConvertConfig::default(), date())
    }

    #[test]
    fn test_title_from_existing_frontmatter() {
        let doc = SourceDocument::new("note.md", "---\ntitle: Existing\n---\n# Heading\nBody");
        let result = run(&doc, &ResolverIndex::default());
        assert_eq!(
            result.front_matter.get("title"),
            Some(&Value::String("Existing".into()))
        );
    }

    #[test]
    fn test_title_from_first_h1() {
        let doc = SourceDocument::new("note.md", "intro\n# The Heading\nBody");
        let result = run(&doc, &ResolverIndex::default());
        assert_eq!(
            result.front_matter.get("title"),
            Some(&Value::String("The Heading".into()))
        );
    }

    #[test]
    fn test_title_from_filename_fallback() {
        let doc = SourceDocument::new("my-great_note.md", "no headings here");
        let result = run(&doc, &ResolverIndex::default());
        assert_eq!(
            result.front_matter.get("title"),
            Some(&Value::String("my great note".into()))
        );
    }

    #[test]
    fn test_date_stamped_when_missing() {
        let doc = SourceDocument::new("note.md", "Body");
        let result = run(&doc, &ResolverIndex::default());
        assert_eq!(
            result.front_matter.get("date"),
            Some(&Value::String("2025-03-01".into()))
        );
    }

    #[test]
    fn test_created_field_suppresses_date_stamp() {
        let doc = SourceDocument::new("note.md", "---\ncreated: 2020-01-01\n---\nBody");
        let result = run(&doc, &ResolverIndex::default());
        assert!(result.front_matter.get("date").is_none());
    }

    #[test]
    fn test_draft_defaults_false_but_existing_kept() {
        let plain = SourceDocument::new("a.md", "Body");
        let result = run(&plain, &ResolverIndex::default());
        assert_eq!(result.front_matter.get("draft"), Some(&Value::Bool(false)));

        let drafted = SourceDocument::new("b.md", "---\ndraft: true\n---\nBody");
        let result = run(&drafted, &ResolverIndex::default());
        assert_eq!(result.front_matter.get("draft"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_tag_merge_with_advisory() {
        let doc = SourceDocument::new(
            "note.md",
            "---\ntags:\n  - existing\n---\nBody with #existing and #fresh",
        );
        let result = run(&doc, &ResolverIndex::default());
        assert_eq!(result.front_matter.tags(), vec!["existing", "fresh"]);

        let infos: Vec<&Warning> = result
            .warnings
            .iter()
            .filter(|w| w.level == WarningLevel::Info)
            .collect();
        assert_eq!(infos.len(), 1);
        assert!(infos[0].message.contains("1 new tag"));
    }

    #[test]
    fn test_no_tag_advisory_without_overlap_sources() {
        // Only inline tags, no existing ones: merged silently
        let doc = SourceDocument::new("note.md", "Body with #solo");
        let result = run(&doc, &ResolverIndex::default());
        assert_eq!(result.front_matter.tags(), vec!["solo"]);
        assert!(result
            .warnings
            .iter()
            .all(|w| w.level != WarningLevel::Info));
    }

    #[test]
    fn test_code_protection_ordering() {
        let doc = SourceDocument::new(
            "note.md",
            "A [[Real Link]] and `[[not a link]]`\n```\n![[fake.png]]\n```\n",
        );
        let result = run(&doc, &ResolverIndex::default());
        let body = &result.output_text;
        assert!(body.contains("[Real Link](/posts/real-link/)"));
        assert!(body.contains("`[[not a link]]`"));
        assert!(body.contains("![[fake.png]]"));
        assert!(!result.has_math);
    }

    #[test]
    fn test_tags_inside_code_not_harvested() {
        let doc = SourceDocument::new("note.md", "Real #tag but `#fake` and\n```\n#alsofake\n```\n");
        let result = run(&doc, &ResolverIndex::default());
        assert_eq!(result.front_matter.tags(), vec!["tag"]);
    }

    #[test]
    fn test_math_inside_code_untouched() {
        let doc = SourceDocument::new(
            "note.md",
            "use `$a * b$` and\n```\n$$x * y$$\n```\n",
        );
        let result = run(&doc, &ResolverIndex::default());
        assert!(result.output_text.contains("`$a * b$`"));
        assert!(result.output_text.contains("$$x * y$$"));
        assert!(!result.has_math);
        assert!(result.front_matter.get("math").is_none());
    }

    #[test]
    fn test_math_next_to_code_still_transformed() {
        let doc = SourceDocument::new("note.md", "real $u * v$ next to `$w$`");
        let result = run(&doc, &ResolverIndex::default());
        assert!(result.output_text.contains("$u \\* v$"));
        assert!(result.output_text.contains("`$w$`"));
        assert!(result.has_math);
    }

    #[test]
    fn test_math_flag_set() {
        let doc = SourceDocument::new("note.md", "inline $x+y$ math");
        let result = run(&doc, &ResolverIndex::default());
        assert!(result.has_math);
        assert_eq!(result.front_matter.get("math"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_output_layout() {
        let doc = SourceDocument::new("note.md", "Body text");
        let result = run(&doc, &ResolverIndex::default());
        assert!(result.output_text.starts_with("---\n"));
        assert!(result.output_text.contains("\n---\n\nBody text"));
    }

    #[test]
    fn test_batch_duplicate_warnings() {
        let docs = vec![
            SourceDocument::new("Note.md", "one"),
            SourceDocument::new("Note.md", "two"),
            SourceDocument::new("Other.md", "three"),
        ];
        let output = transform_batch(&docs, &ConvertConfig::default(), None);

        assert_eq!(output.duplicates, vec!["Note"]);
        let dup_warned = output
            .documents
            .iter()
            .filter(|d| d.warnings.iter().any(|w| w.message.contains("Duplicate")))
            .count();
        assert_eq!(dup_warned, 2);
        assert!(output.documents[2].warnings.is_empty());
    }

    #[test]
    fn test_batch_collision_warning_with_existing_site() {
        let existing = SiteArchive::from_entries(vec![(
            "content/posts/note.md".to_string(),
            b"old".to_vec(),
        )]);
        let docs = vec![SourceDocument::new("Note.md", "new")];
        let output = transform_batch(&docs, &ConvertConfig::default(), Some(&existing));

        assert!(output.documents[0]
            .warnings
            .iter()
            .any(|w| w.message.contains("already exists")));
    }

    #[test]
    fn test_batch_isolates_failing_document() {
        let docs = vec![
            SourceDocument::new("good.md", "fine"),
            SourceDocument::new("bad.md", format!("text {FAULT_MARKER}")),
            SourceDocument::new("also good.md", "also fine"),
        ];
        let output = transform_batch(&docs, &ConvertConfig::default(), None);

        assert!(output.documents[0].succeeded());
        assert!(!output.documents[1].succeeded());
        assert!(output.documents[2].succeeded());

        let errors: Vec<&Warning> = output.documents[1]
            .warnings
            .iter()
            .filter(|w| w.level == WarningLevel::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("injected transform failure"));
    }

    #[test]
    fn test_batch_results_in_input_order() {
        let docs: Vec<SourceDocument> = (0..8)
            .map(|i| SourceDocument::new(format!("doc{i}.md"), format!("body {i}")))
            .collect();
        let output = transform_batch(&docs, &ConvertConfig::default(), None);
        let names: Vec<&str> = output.documents.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["doc0.md", "doc1.md", "doc2.md", "doc3.md", "doc4.md", "doc5.md", "doc6.md", "doc7.md"]
        );
    }
}
