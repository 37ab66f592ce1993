//! Inline hashtag extraction from body text.

use regex::Regex;
use std::sync::OnceLock;

static TAG_REGEX: OnceLock<Regex> = OnceLock::new();

fn tag_regex() -> &'static Regex {
    // A '#' preceded by line start, whitespace, or a small punctuation
    // set; the tag starts with a letter/underscore/Latin-ext/CJK char and
    // continues with word/Latin-ext/CJK/hyphen/slash chars.
    TAG_REGEX.get_or_init(|| {
        Regex::new(
            r"(?m)(?:^|[\s,;(])#([A-Za-z_À-ɏ一-鿿][0-9A-Za-z_À-ɏ一-鿿/-]*)",
        )
        .unwrap()
    })
}

/// Extract distinct inline tags in first-seen order.
///
/// Runs after code restoration in the pipeline, but the caller passes the
/// code-protected body so tags inside code regions are never harvested.
/// Extraction is read-only; tags stay in the body. Tokens that are pure
/// hex strings of length 3–8 are excluded as color-code false positives.
pub fn extract_inline_tags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();

    for captures in tag_regex().captures_iter(text) {
        let tag = &captures[1];
        if is_hex_color(tag) {
            continue;
        }
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

fn is_hex_color(s: &str) -> bool {
    (3..=8).contains(&s.len()) && s.chars().all(|c| c.is_ascii_hexdigit())
}
