//! Code-region protection with indexed placeholders.

/// Replaces fenced and inline code regions with opaque placeholders and
/// restores them after the rewriting passes have run.
#[derive(Debug, Default)]
pub struct CodeGuard {
    regions: Vec<String>,
}

impl CodeGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every fenced (```…```) or inline (`…`) code region with
    /// `%%CODEBLOCK_<i>%%`. Fenced regions may span lines; inline regions
    /// must close on the same line and be non-empty. Unclosed backticks
    /// are left alone.
    pub fn protect(&mut self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find('`') {
            let (before, candidate) = rest.split_at(start);
            out.push_str(before);

            if let Some(fence_body) = candidate.strip_prefix("```") {
                match fence_body.find("```") {
                    Some(end) => {
                        let region = &candidate[..end + 6];
                        out.push_str(&self.stash(region));
                        rest = &fence_body[end + 3..];
                        continue;
                    }
                    None => {
                        // Unclosed fence; emit the backticks literally
                        out.push_str("```");
                        rest = fence_body;
                        continue;
                    }
                }
            }

            // Inline span: closing backtick on the same line, at least one
            // character inside
            let body = &candidate[1..];
            let line_end = body.find('\n').unwrap_or(body.len());
            match body[..line_end].find('`') {
                Some(end) if end > 0 => {
                    let region = &candidate[..end + 2];
                    out.push_str(&self.stash(region));
                    rest = &body[end + 1..];
                }
                _ => {
                    out.push('`');
                    rest = body;
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// Substitute the original code regions back for their placeholders.
    pub fn restore(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find("%%CODEBLOCK_") {
            let (before, candidate) = rest.split_at(start);
            out.push_str(before);

            let digits_start = &candidate["%%CODEBLOCK_".len()..];
            let digits_len = digits_start
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(digits_start.len());
            let after_digits = &digits_start[digits_len..];

            if digits_len > 0 && after_digits.starts_with("%%") {
                let idx: usize = digits_start[..digits_len].parse().unwrap_or(usize::MAX);
                if let Some(region) = self.regions.get(idx) {
                    out.push_str(region);
                    rest = &after_digits[2..];
                    continue;
                }
            }
            // Not one of ours; emit the marker prefix and move on
            out.push_str("%%CODEBLOCK_");
            rest = digits_start;
        }
        out.push_str(rest);
        out
    }

    fn stash(&mut self, region: &str) -> String {
        self.regions.push(region.to_string());
        format!("%%CODEBLOCK_{}%%", self.regions.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protect_restore_round_trip() {
        let text = "before `inline` and\n```\nfenced [[link]]\n```\nafter";
        let mut guard = CodeGuard::new();
        let protected = guard.protect(text);
        assert!(!protected.contains("[[link]]"));
        assert!(protected.contains("%%CODEBLOCK_0%%"));
        assert_eq!(guard.restore(&protected), text);
    }

    #[test]
    fn test_fenced_takes_precedence_over_inline() {
        let text = "```rust\nlet x = `1`;\n```";
        let mut guard = CodeGuard::new();
        let protected = guard.protect(text);
        assert_eq!(protected, "%%CODEBLOCK_0%%");
        assert_eq!(guard.restore(&protected), text);
    }

    #[test]
    fn test_unclosed_backtick_left_alone() {
        let text = "an odd ` backtick\nand more";
        let mut guard = CodeGuard::new();
        assert_eq!(guard.protect(text), text);
    }

    #[test]
    fn test_inline_must_close_on_same_line() {
        let text = "a `spans\nlines` b";
        let mut guard = CodeGuard::new();
        // First backtick never closes on its line; second pairs with nothing
        assert_eq!(guard.protect(text), text);
    }

    #[test]
    fn test_empty_inline_span_ignored() {
        let text = "a `` b";
        let mut guard = CodeGuard::new();
        assert_eq!(guard.protect(text), text);
    }

    #[test]
    fn test_restore_ignores_foreign_markers() {
        let guard = CodeGuard::new();
        let text = "%%CODEBLOCK_99%% and %%CODEBLOCK_x%%";
        assert_eq!(guard.restore(text), text);
    }
}
