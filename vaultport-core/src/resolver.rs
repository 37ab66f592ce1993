//! Cross-document link resolution for [[target]] and ![[asset]] syntax.

use crate::models::{SourceDocument, Warning};
use crate::slug::slugify;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

const IMAGE_EXTENSIONS: [&str; 8] = ["png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "tiff"];

/// Where a base name resolves to within the generated site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverEntry {
    pub slug: String,
    pub target_dir: String,
}

/// Immutable base-name → (slug, directory) index, built once per batch.
///
/// Built before any document transform begins and never mutated after;
/// per-document transforms only read it, so they can run in parallel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverIndex {
    entries: HashMap<String, ResolverEntry>,

    /// Base names seen more than once, in encounter order. The first
    /// document under a repeated name keeps the index entry.
    pub duplicates: Vec<String>,
}

impl ResolverIndex {
    /// One pass over the batch. First write wins; later documents under
    /// the same base name are flagged as duplicates.
    pub fn build(documents: &[SourceDocument]) -> Self {
        let mut entries: HashMap<String, ResolverEntry> = HashMap::new();
        let mut duplicates = Vec::new();

        for doc in documents {
            let base_name = doc.base_name().to_string();
            if entries.contains_key(&base_name) {
                if !duplicates.contains(&base_name) {
                    duplicates.push(base_name.clone());
                }
                tracing::warn!("Duplicate base name in batch: {}", base_name);
                continue;
            }
            let slug = doc
                .declared_slug
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| slugify(&base_name));
            entries.insert(
                base_name,
                ResolverEntry {
                    slug,
                    target_dir: doc.target_dir.clone(),
                },
            );
        }

        Self {
            entries,
            duplicates,
        }
    }

    pub fn get(&self, base_name: &str) -> Option<&ResolverEntry> {
        self.entries.get(base_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn has_image_extension(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) => {
            !stem.is_empty() && IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e))
        }
        None => false,
    }
}

/// Rewrite media embeds `![[name.ext]]` to `![](name.ext)` for image
/// extensions. Must run before link rewriting: the generic `[[...]]` pass
/// would otherwise see the inner brackets of an un-rewritten embed.
pub fn rewrite_embeds(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("![[") {
        let (before, candidate) = rest.split_at(start);
        out.push_str(before);

        let inner_start = &candidate[3..];
        match inner_start.find("]]") {
            Some(end) => {
                let inner = &inner_start[..end];
                if !inner.contains(']') && has_image_extension(inner) {
                    out.push_str("![](");
                    out.push_str(inner);
                    out.push(')');
                    rest = &inner_start[end + 2..];
                } else {
                    // Not an image embed; emit the "!" and let the link
                    // pass look at the "[[...]]" that follows.
                    out.push('!');
                    rest = &candidate[1..];
                }
            }
            None => {
                out.push_str(candidate);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Rewrite generic wikilinks `[[target]]` / `[[target|display]]` against
/// the batch index.
///
/// Resolved targets link to `/<dir>/<slug>/<fragment>`; unresolved targets
/// get a best-effort slug under `/posts/` and one warning per distinct
/// base name.
pub fn rewrite_links(text: &str, index: &ResolverIndex) -> (String, Vec<Warning>) {
    let mut out = String::with_capacity(text.len());
    let mut warnings = Vec::new();
    let mut warned: HashSet<String> = HashSet::new();
    let mut rest = text;

    while let Some(start) = rest.find("[[") {
        let (before, candidate) = rest.split_at(start);
        out.push_str(before);

        let inner_start = &candidate[2..];
        let Some(end) = inner_start.find("]]") else {
            out.push_str(candidate);
            rest = "";
            break;
        };
        let inner = &inner_start[..end];
        rest = &inner_start[end + 2..];

        // An embed the embed pass didn't catch (e.g. the inner text still
        // carries an image extension) stays an image, never a page link.
        if has_image_extension(inner) {
            out.push_str("![](");
            out.push_str(inner);
            out.push(')');
            continue;
        }

        let (target, display) = match inner.split_once('|') {
            Some((t, d)) => (t.trim(), d.trim()),
            None => (inner.trim(), inner.trim()),
        };

        let (target_base, section) = match target.split_once('#') {
            Some((base, frag)) => (base.trim(), format!("#{frag}")),
            None => (target, String::new()),
        };

        match index.get(target_base) {
            Some(entry) => {
                out.push_str(&format!(
                    "[{display}](/{}/{}/{section})",
                    entry.target_dir, entry.slug
                ));
            }
            None => {
                let fallback_slug = slugify(target_base);
                if warned.insert(target_base.to_string()) {
                    warnings.push(Warning::warning(format!(
                        "Wikilink target \"{target_base}\" not found in uploaded files. \
                         Link generated as best-effort."
                    )));
                }
                out.push_str(&format!("[{display}](/posts/{fallback_slug}/{section})"));
            }
        }
    }
    out.push_str(rest);
    (out, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str) -> SourceDocument {
        SourceDocument::new(name, "")
    }

    fn index_for(names: &[&str]) -> ResolverIndex {
        let docs: Vec<SourceDocument> = names.iter().map(|n| doc(n)).collect();
        ResolverIndex::build(&docs)
    }

    #[test]
    fn test_build_index() {
        let index = index_for(&["My Note.md", "Other.md"]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("My Note").unwrap().slug, "my-note");
        assert_eq!(index.get("My Note").unwrap().target_dir, "posts");
        assert!(index.duplicates.is_empty());
    }

    #[test]
    fn test_duplicate_base_name_first_wins() {
        let mut first = doc("Note.md");
        first.declared_slug = Some("first".into());
        let mut second = doc("Note.md");
        second.declared_slug = Some("second".into());

        let index = ResolverIndex::build(&[first, second]);
        assert_eq!(index.duplicates, vec!["Note"]);
        assert_eq!(index.get("Note").unwrap().slug, "first");
    }

    #[test]
    fn test_declared_slug_wins_over_derived() {
        let mut d = doc("Some Name.md");
        d.declared_slug = Some("custom-slug".into());
        let index = ResolverIndex::build(&[d]);
        assert_eq!(index.get("Some Name").unwrap().slug, "custom-slug");
    }

    #[test]
    fn test_rewrite_embeds() {
        assert_eq!(rewrite_embeds("see ![[pic.png]] here"), "see ![](pic.png) here");
        assert_eq!(rewrite_embeds("![[photo.JPEG]]"), "![](photo.JPEG)");
        // Non-image embeds are left for the link pass
        assert_eq!(rewrite_embeds("![[note]]"), "![[note]]");
        // Unclosed syntax is untouched
        assert_eq!(rewrite_embeds("broken ![[pic.png"), "broken ![[pic.png");
    }

    #[test]
    fn test_embed_precedence_over_links() {
        let index = index_for(&[]);
        let text = rewrite_embeds("![[pic.png]]");
        let (out, warnings) = rewrite_links(&text, &index);
        assert_eq!(out, "![](pic.png)");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_missed_embed_in_link_pass() {
        // Malformed embed the embed pass skipped still rewrites as image
        let index = index_for(&[]);
        let (out, warnings) = rewrite_links("[[pic.png]]", &index);
        assert_eq!(out, "![](pic.png)");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_resolved_link() {
        let index = index_for(&["Target Note.md"]);
        let (out, warnings) = rewrite_links("go to [[Target Note]]", &index);
        assert_eq!(out, "go to [Target Note](/posts/target-note/)");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_link_determinism_with_display() {
        let index = index_for(&["A.md"]);
        let (plain, _) = rewrite_links("[[A]]", &index);
        let (display, _) = rewrite_links("[[A|Shown]]", &index);
        assert_eq!(plain, "[A](/posts/a/)");
        assert_eq!(display, "[Shown](/posts/a/)");
    }

    #[test]
    fn test_section_fragment() {
        let index = index_for(&["Note.md"]);
        let (out, _) = rewrite_links("[[Note#Section Two]]", &index);
        assert_eq!(out, "[Note#Section Two](/posts/note/#Section Two)");
    }

    #[test]
    fn test_unresolved_link_warns_once() {
        let index = index_for(&[]);
        let (out, warnings) = rewrite_links("[[Missing]] and again [[Missing]]", &index);
        assert_eq!(out, "[Missing](/posts/missing/) and again [Missing](/posts/missing/)");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("Missing"));
        assert_eq!(warnings[0].level, crate::models::WarningLevel::Warning);
    }

    #[test]
    fn test_distinct_unresolved_targets_warn_separately() {
        let index = index_for(&[]);
        let (_, warnings) = rewrite_links("[[One]] [[Two]] [[One]]", &index);
        assert_eq!(warnings.len(), 2);
    }
}
