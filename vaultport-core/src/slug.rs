//! Slug generation and title derivation.

use unicode_segmentation::UnicodeSegmentation;

/// Convert a string to a URL-safe slug
///
/// Rules:
/// - Lowercase
/// - Replace whitespace with hyphens
/// - Keep ASCII word characters, Latin Extended (U+00C0–U+024F) and
///   CJK (U+4E00–U+9FFF); drop everything else
/// - Collapse multiple hyphens
/// - Trim leading/trailing hyphens
///
/// # Examples
///
/// ```
/// use vaultport_core::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("Rust & Safety"), "rust-safety");
/// assert_eq!(slugify("C++ Programming"), "c-programming");
/// ```
pub fn slugify(input: &str) -> String {
    let lowercased = input.trim().to_lowercase();

    let mut out = String::with_capacity(lowercased.len());
    for g in lowercased.graphemes(true) {
        let Some(c) = g.chars().next() else { continue };
        if c.is_whitespace() {
            out.push('-');
        } else if is_slug_char(c) {
            out.push_str(g);
        }
    }

    // Collapse hyphen runs and trim the edges
    let mut collapsed = String::with_capacity(out.len());
    let mut prev_hyphen = false;
    for c in out.chars() {
        if c == '-' {
            if !prev_hyphen {
                collapsed.push('-');
            }
            prev_hyphen = true;
        } else {
            collapsed.push(c);
            prev_hyphen = false;
        }
    }
    collapsed.trim_matches('-').to_string()
}

fn is_slug_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c == '_'
        || c == '-'
        || ('\u{00C0}'..='\u{024F}').contains(&c)
        || ('\u{4E00}'..='\u{9FFF}').contains(&c)
}

/// Derive a human-readable title from a file name: strip the `.md`
/// extension, turn hyphens and underscores into spaces, trim.
pub fn title_from_filename(name: &str) -> String {
    crate::models::strip_md_extension(name)
        .replace(['-', '_'], " ")
        .trim()
        .to_string()
}
