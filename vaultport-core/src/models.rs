//! Content model structs for documents, advisories, and batch results.

use crate::frontmatter::FrontMatter;
use serde::{Deserialize, Serialize};

/// A markdown note handed to the pipeline by the caller.
///
/// Immutable once constructed; the batch driver never mutates documents in
/// place, which is what makes per-document processing parallel-safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    /// File name as uploaded (e.g. "My Note.md")
    pub name: String,

    /// Raw UTF-8 contents, frontmatter included if present
    pub raw_text: String,

    /// Slug override chosen by the user; derived from the name when absent
    #[serde(default)]
    pub declared_slug: Option<String>,

    /// Output content subdirectory (defaults to "posts")
    #[serde(default = "default_target_dir")]
    pub target_dir: String,
}

pub(crate) fn default_target_dir() -> String {
    String::from("posts")
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_text: raw_text.into(),
            declared_slug: None,
            target_dir: default_target_dir(),
        }
    }

    /// Document name with a trailing `.md` extension stripped
    /// (case-insensitive). This is the cross-reference lookup key.
    pub fn base_name(&self) -> &str {
        strip_md_extension(&self.name)
    }
}

/// Strip a trailing `.md` (any case) from a file name.
pub fn strip_md_extension(name: &str) -> &str {
    let n = name.len();
    if n >= 3 && name.is_char_boundary(n - 3) && name[n - 3..].eq_ignore_ascii_case(".md") {
        &name[..n - 3]
    } else {
        name
    }
}

/// Severity of a per-document or batch advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
    Error,
    Warning,
    Info,
    Notice,
}

/// An advisory attached to a transform result. Advisories never alter
/// document content; they exist for display and reporting only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub level: WarningLevel,
    pub message: String,
}

impl Warning {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: WarningLevel::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: WarningLevel::Warning,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: WarningLevel::Info,
            message: message.into(),
        }
    }

    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            level: WarningLevel::Notice,
            message: message.into(),
        }
    }
}

/// Output of one document's trip through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformResult {
    /// Regenerated frontmatter block plus transformed body
    pub output_text: String,

    /// Merged metadata, post-transform
    pub front_matter: FrontMatter,

    /// Ordered advisories accumulated during the transform
    pub warnings: Vec<Warning>,

    /// Whether any math region was detected in the body
    pub has_math: bool,
}

/// A transform result bound to its output identity within the site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    /// Original file name
    pub name: String,

    /// Resolved URL slug
    pub slug: String,

    /// Output content subdirectory
    pub target_dir: String,

    /// `None` when the transform failed; the failure is recorded in
    /// `warnings` instead
    pub result: Option<TransformResult>,

    /// Advisories, including any batch-level ones attached to this document
    pub warnings: Vec<Warning>,
}

impl DocumentReport {
    /// Archive path this document is written to.
    pub fn content_path(&self) -> String {
        format!("content/{}/{}.md", self.target_dir, self.slug)
    }

    pub fn succeeded(&self) -> bool {
        self.result.is_some()
    }
}

/// Result of transforming a whole batch of documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput {
    /// One report per input document, in input order
    pub documents: Vec<DocumentReport>,

    /// Base names that appeared more than once in the batch
    pub duplicates: Vec<String>,
}

impl BatchOutput {
    /// Count advisories at warning level or above across the batch.
    pub fn problem_count(&self) -> usize {
        self.documents
            .iter()
            .flat_map(|d| &d.warnings)
            .filter(|w| matches!(w.level, WarningLevel::Error | WarningLevel::Warning))
            .count()
    }
}
