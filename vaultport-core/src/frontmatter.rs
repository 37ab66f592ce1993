//! Frontmatter parsing and serialization.
//!
//! This is a deliberate subset codec, not a general YAML implementation: it
//! supports exactly the scalar and flat-list shapes the pipeline produces.
//! Unsupported constructs (nested maps, block scalars) degrade to raw
//! strings when they happen to look like `key: value` lines, and are
//! otherwise skipped.

use serde::{Deserialize, Serialize};

/// A frontmatter value: scalar or flat list of scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Render a scalar the way it appears in the body of a list item or
    /// after a key. Lists and nulls have no scalar rendering.
    fn render_scalar(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(format_number(*n)),
            Value::String(s) => Some(quote_if_needed(s)),
            Value::Null | Value::List(_) => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

/// Ordered key → value map for a document's metadata block.
///
/// Keys keep first-insertion order; reassigning an existing key updates it
/// in place. Case-sensitive keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    entries: Vec<(String, Value)>,
}

impl FrontMatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or update, preserving the key's original position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Existing tags as strings, in order. Non-list or non-string values
    /// are stringified the way the body of a list item would render them.
    pub fn tags(&self) -> Vec<String> {
        match self.get("tags") {
            Some(Value::List(items)) => items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    Value::Bool(b) => b.to_string(),
                    Value::Number(n) => format_number(*n),
                    _ => String::new(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Serialize to the metadata-block body (no `---` markers).
    ///
    /// Preferred keys come first in a fixed order, the rest in first-seen
    /// order. Null values and empty lists are omitted.
    pub fn serialize(&self) -> String {
        const PREFERRED: [&str; 6] = ["title", "date", "draft", "tags", "math", "description"];

        let mut keys: Vec<&str> = PREFERRED
            .iter()
            .copied()
            .filter(|k| self.contains_key(k))
            .collect();
        for (k, _) in &self.entries {
            if !PREFERRED.contains(&k.as_str()) {
                keys.push(k);
            }
        }

        let mut lines = Vec::new();
        for key in keys {
            let value = self.get(key).unwrap_or(&Value::Null);
            match value {
                Value::Null => continue,
                Value::List(items) => {
                    if items.is_empty() {
                        continue;
                    }
                    lines.push(format!("{key}:"));
                    for item in items {
                        let rendered = item.render_scalar().unwrap_or_default();
                        lines.push(format!("  - {rendered}"));
                    }
                }
                scalar => {
                    let rendered = scalar.render_scalar().unwrap_or_default();
                    lines.push(format!("{key}: {rendered}"));
                }
            }
        }
        lines.join("\n")
    }
}

impl FromIterator<(String, Value)> for FrontMatter {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut fm = FrontMatter::new();
        for (k, v) in iter {
            fm.set(k, v);
        }
        fm
    }
}

/// Parse a metadata block off the front of a document.
///
/// Recognizes a `---` marker line at the very start, a block body, and a
/// closing `---` line. Returns `(None, full_text)` when no block is
/// present. The body has a single leading blank line stripped.
pub fn parse(raw: &str) -> (Option<FrontMatter>, String) {
    let Some((block, body)) = split_block(raw) else {
        return (None, raw.to_string());
    };

    let mut fm = FrontMatter::new();
    let mut current_key: Option<String> = None;

    for line in block.lines() {
        if line.trim().is_empty() {
            continue;
        }

        // List item continuing the most recent key: "  - value"
        if let Some(item) = parse_list_item(line) {
            if let Some(key) = &current_key {
                let value = coerce_scalar(item);
                match fm.get(key) {
                    Some(Value::List(items)) => {
                        let mut items = items.clone();
                        items.push(value);
                        fm.set(key.clone(), Value::List(items));
                    }
                    _ => fm.set(key.clone(), Value::List(vec![value])),
                }
                continue;
            }
        }

        // Key-value pair: "key: value"
        if let Some((key, raw_value)) = parse_key_value(line) {
            let raw_value = raw_value.trim();
            if raw_value.is_empty() {
                // Open a list; items follow on indented dash lines
                fm.set(key.clone(), Value::List(Vec::new()));
            } else if raw_value.starts_with('[') && raw_value.ends_with(']') {
                let inner = &raw_value[1..raw_value.len() - 1];
                let items = if inner.trim().is_empty() {
                    Vec::new()
                } else {
                    inner
                        .split(',')
                        .map(|s| coerce_scalar(s.trim()))
                        .collect()
                };
                fm.set(key.clone(), Value::List(items));
            } else {
                fm.set(key.clone(), coerce_scalar(raw_value));
            }
            current_key = Some(key);
        }
        // Anything else is an unsupported construct; skip it.
    }

    (Some(fm), body)
}

/// Split `raw` into the metadata-block body and the document body.
fn split_block(raw: &str) -> Option<(&str, String)> {
    let rest = raw.strip_prefix("---")?;
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;

    // Find a line that is exactly "---" (allowing a trailing \r)
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed == "---" {
            let block = rest[..offset].trim_end_matches(['\r', '\n']);
            let mut body = &rest[offset + line.len()..];
            body = body
                .strip_prefix("\r\n")
                .or_else(|| body.strip_prefix('\n'))
                .unwrap_or(body);
            return Some((block, body.to_string()));
        }
        offset += line.len();
    }
    None
}

fn parse_list_item(line: &str) -> Option<&str> {
    let stripped = line.strip_prefix(' ').or_else(|| line.strip_prefix('\t'))?;
    let stripped = stripped.trim_start();
    let rest = stripped.strip_prefix('-')?;
    let rest = rest.strip_prefix(' ')?;
    Some(rest.trim())
}

fn parse_key_value(line: &str) -> Option<(String, &str)> {
    // Key: word char first, then word chars, dots, hyphens
    let mut chars = line.char_indices();
    let (_, first) = chars.next()?;
    if !(first.is_ascii_alphanumeric() || first == '_') {
        return None;
    }
    let mut key_end = first.len_utf8();
    for (i, c) in chars {
        if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-' {
            key_end = i + c.len_utf8();
        } else {
            break;
        }
    }
    let key = &line[..key_end];
    let rest = line[key_end..].trim_start();
    let value = rest.strip_prefix(':')?;
    Some((key.to_string(), value))
}

/// Coerce a raw scalar string per the fixed ladder: null forms, booleans,
/// numbers, quoted strings, then raw trimmed string.
pub fn coerce_scalar(raw: &str) -> Value {
    let trimmed = raw.trim();
    match trimmed {
        "" | "~" | "null" => return Value::Null,
        "true" | "yes" => return Value::Bool(true),
        "false" | "no" => return Value::Bool(false),
        _ => {}
    }

    if is_number_literal(trimmed) {
        if let Ok(n) = trimmed.parse::<f64>() {
            return Value::Number(n);
        }
    }

    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        return Value::String(unescape_double_quoted(&trimmed[1..trimmed.len() - 1]));
    }
    if trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'') {
        return Value::String(trimmed[1..trimmed.len() - 1].to_string());
    }

    Value::String(trimmed.to_string())
}

/// Integer-or-decimal pattern: optional minus, no leading zeros, optional
/// fractional part.
fn is_number_literal(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };
    let int_ok = int_part == "0"
        || (!int_part.is_empty()
            && !int_part.starts_with('0')
            && int_part.chars().all(|c| c.is_ascii_digit()));
    let frac_ok = match frac_part {
        Some(f) => !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()),
        None => true,
    };
    int_ok && frac_ok
}

fn unescape_double_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Quote a string scalar when leaving it bare would change its meaning on
/// the next parse: structurally significant characters, reserved literals,
/// or purely numeric text.
fn quote_if_needed(s: &str) -> String {
    let needs_quoting = s.chars().any(|c| {
        matches!(
            c,
            ':' | '#' | '[' | ']' | '{' | '}' | '&' | '*' | '!' | '|' | '>' | '\'' | '"' | '%'
                | '@' | '`' | ',' | '\n'
        )
    }) || is_reserved_literal(s)
        || is_plain_numeric(s);

    if needs_quoting {
        let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    } else {
        s.to_string()
    }
}

fn is_reserved_literal(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "true" | "false" | "yes" | "no" | "null" | "~" | ""
    )
}

fn is_plain_numeric(s: &str) -> bool {
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };
    let int_ok = !int_part.is_empty() && int_part.chars().all(|c| c.is_ascii_digit());
    let frac_ok = match frac_part {
        Some(f) => !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()),
        None => true,
    };
    int_ok && frac_ok
}

fn format_number(n: f64) -> String {
    if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_no_block() {
        let (fm, body) = parse("# Just Content\n\nNo metadata here.");
        assert!(fm.is_none());
        assert_eq!(body, "# Just Content\n\nNo metadata here.");
    }

    #[test]
    fn test_parse_scalars() {
        let content = "---\ntitle: My Post\ndraft: false\nweight: 3\nnothing: ~\n---\n\nBody.";
        let (fm, body) = parse(content);
        let fm = fm.unwrap();
        assert_eq!(fm.get("title"), Some(&Value::String("My Post".into())));
        assert_eq!(fm.get("draft"), Some(&Value::Bool(false)));
        assert_eq!(fm.get("weight"), Some(&Value::Number(3.0)));
        assert_eq!(fm.get("nothing"), Some(&Value::Null));
        assert_eq!(body, "Body.");
    }

    #[test]
    fn test_parse_dashed_list() {
        let content = "---\ntags:\n  - rust\n  - notes\n---\nBody.";
        let (fm, _) = parse(content);
        let fm = fm.unwrap();
        assert_eq!(fm.tags(), vec!["rust", "notes"]);
    }

    #[test]
    fn test_parse_inline_list() {
        let content = "---\ntags: [a, b, 3]\nempty: []\n---\nBody.";
        let (fm, _) = parse(content);
        let fm = fm.unwrap();
        assert_eq!(
            fm.get("tags"),
            Some(&Value::List(vec![
                Value::String("a".into()),
                Value::String("b".into()),
                Value::Number(3.0),
            ]))
        );
        assert_eq!(fm.get("empty"), Some(&Value::List(vec![])));
    }

    #[test]
    fn test_parse_quoted_strings() {
        let content = "---\na: \"true\"\nb: '42'\n---\n";
        let (fm, _) = parse(content);
        let fm = fm.unwrap();
        assert_eq!(fm.get("a"), Some(&Value::String("true".into())));
        assert_eq!(fm.get("b"), Some(&Value::String("42".into())));
    }

    #[test]
    fn test_parse_crlf() {
        let content = "---\r\ntitle: Windows\r\n---\r\nBody.";
        let (fm, body) = parse(content);
        assert_eq!(
            fm.unwrap().get("title"),
            Some(&Value::String("Windows".into()))
        );
        assert_eq!(body, "Body.");
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let content = "---\ntitle: ok\n???not a pair\n- orphan item\n---\n";
        let (fm, _) = parse(content);
        let fm = fm.unwrap();
        assert_eq!(fm.get("title"), Some(&Value::String("ok".into())));
        assert!(fm.iter().count() == 1);
    }

    #[test]
    fn test_serialize_preferred_order() {
        let mut fm = FrontMatter::new();
        fm.set("custom", "later");
        fm.set("description", "desc");
        fm.set("title", "T");
        fm.set("draft", false);

        let out = fm.serialize();
        let keys: Vec<&str> = out
            .lines()
            .filter(|l| !l.starts_with(' '))
            .map(|l| l.split(':').next().unwrap())
            .collect();
        assert_eq!(keys, vec!["title", "draft", "description", "custom"]);
    }

    #[test]
    fn test_serialize_omits_null_and_empty_list() {
        let mut fm = FrontMatter::new();
        fm.set("title", "T");
        fm.set("gone", Value::Null);
        fm.set("tags", Value::List(vec![]));
        let out = fm.serialize();
        assert_eq!(out, "title: T");
    }

    #[test]
    fn test_serialize_quotes_ambiguous_strings() {
        let mut fm = FrontMatter::new();
        fm.set("a", "true");
        fm.set("b", "42");
        fm.set("c", "has: colon");
        let out = fm.serialize();
        assert!(out.contains("a: \"true\""));
        assert!(out.contains("b: \"42\""));
        assert!(out.contains("c: \"has: colon\""));
    }

    #[test]
    fn test_round_trip_supported_shapes() {
        let mut fm = FrontMatter::new();
        fm.set("title", "A Plain Title");
        fm.set("date", "2025-03-01");
        fm.set("draft", false);
        fm.set(
            "tags",
            Value::List(vec![
                Value::String("rust".into()),
                Value::String("true".into()),
                Value::Number(7.0),
            ]),
        );
        fm.set("math", true);
        fm.set("weight", 2.5);
        fm.set("quoted", "he said \"hi\"");

        let serialized = format!("---\n{}\n---\n", fm.serialize());
        let (reparsed, _) = parse(&serialized);
        assert_eq!(reparsed.unwrap(), fm);
    }

    #[test]
    fn test_set_updates_in_place() {
        let mut fm = FrontMatter::new();
        fm.set("a", "1");
        fm.set("b", "2");
        fm.set("a", "3");
        let keys: Vec<&str> = fm.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(fm.get("a"), Some(&Value::String("3".into())));
    }
}
