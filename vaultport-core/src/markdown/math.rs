//! Math-delimiter normalization for renderer compatibility.
//!
//! The pipeline passes code-protected text: placeholders carry no
//! delimiter characters, so dollar signs inside code regions are never
//! seen here. Display math (`$$…$$`, may span lines) is handled first,
//! then inline math (single `$`, same line, not adjacent to another `$`).
//!
//! Inline content that begins with a digit is treated as a currency
//! literal, not math. This inherited heuristic misclassifies genuine
//! numeric-leading formulas like `$2x+1$`; changing it needs product
//! guidance, not a bug fix.

use crate::models::Warning;

/// Renderer-compatibility toggles for math handling.
#[derive(Debug, Clone, Copy, Default)]
pub struct MathOptions {
    /// Wrap display math in `$$$$` instead of `$$`
    pub alt_delimiters: bool,

    /// Double standalone `\\` line breaks inside display math
    pub alt_line_breaks: bool,
}

/// Result of the math pass over one document body.
#[derive(Debug, Clone)]
pub struct MathOutcome {
    pub text: String,
    pub has_math: bool,

    /// Exactly one advisory describing the applied mode, present when any
    /// math was detected
    pub advisory: Option<Warning>,
}

/// Normalize math regions in `text` per `options`.
pub fn transform_math(text: &str, options: MathOptions) -> MathOutcome {
    let mut has_math = false;

    let after_display = transform_display_math(text, options, &mut has_math);
    let after_inline = transform_inline_math(&after_display, &mut has_math);

    let advisory = if has_math {
        Some(mode_advisory(options))
    } else {
        None
    };

    MathOutcome {
        text: after_inline,
        has_math,
        advisory,
    }
}

/// Display pass: `$$…$$`, shortest span first, newlines allowed inside.
fn transform_display_math(text: &str, options: MathOptions, has_math: &mut bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("$$") {
        let (before, candidate) = rest.split_at(start);
        out.push_str(before);

        let inner_start = &candidate[2..];
        let Some(end) = inner_start.find("$$") else {
            out.push_str(candidate);
            rest = "";
            break;
        };
        let inner = &inner_start[..end];
        rest = &inner_start[end + 2..];

        *has_math = true;
        let mut processed = escape_asterisks(inner);
        if options.alt_line_breaks {
            processed = double_line_breaks(&processed);
        }

        if options.alt_delimiters {
            out.push_str("$$$$");
            out.push_str(&processed);
            out.push_str("$$$$");
        } else {
            out.push_str("$$");
            out.push_str(&processed);
            out.push_str("$$");
        }
    }
    out.push_str(rest);
    out
}

/// Inline pass: a `$` not adjacent to another `$`, closing on the same
/// line, non-empty content. Digit-leading content is currency and is left
/// untouched.
fn transform_inline_math(text: &str, has_math: &mut bool) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '$' {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let opens = (i == 0 || chars[i - 1] != '$') && matches!(chars.get(i + 1), Some(c) if *c != '$' && *c != '\n');
        if !opens {
            out.push('$');
            i += 1;
            continue;
        }

        // Find the closing dollar on the same line
        let mut j = i + 1;
        let mut close = None;
        while j < chars.len() && chars[j] != '\n' {
            if chars[j] == '$' {
                close = Some(j);
                break;
            }
            j += 1;
        }

        let Some(close) = close else {
            out.push('$');
            i += 1;
            continue;
        };

        // Closing dollar must not be adjacent to another dollar
        if matches!(chars.get(close + 1), Some('$')) {
            out.push('$');
            i += 1;
            continue;
        }

        let inner: String = chars[i + 1..close].iter().collect();
        if inner.trim().chars().next().is_some_and(|c| c.is_ascii_digit()) {
            // Currency literal, e.g. "$5.00"; copy verbatim
            out.push('$');
            out.push_str(&inner);
            out.push('$');
        } else {
            *has_math = true;
            out.push('$');
            out.push_str(&escape_asterisks(&inner));
            out.push('$');
        }
        i = close + 1;
    }
    out
}

/// Escape every asterisk not already preceded by a backslash, keeping the
/// target renderer's emphasis syntax out of math regions.
fn escape_asterisks(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev: Option<char> = None;
    for c in s.chars() {
        if c == '*' && prev != Some('\\') {
            out.push('\\');
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// Double standalone line-break markers: a run of exactly two backslashes
/// becomes four. Longer runs are already escaped forms and stay as-is.
fn double_line_breaks(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let mut run = 1;
        while chars.peek() == Some(&'\\') {
            chars.next();
            run += 1;
        }
        if run == 2 {
            out.push_str("\\\\\\\\");
        } else {
            out.extend(std::iter::repeat('\\').take(run));
        }
    }
    out
}

fn mode_advisory(options: MathOptions) -> Warning {
    match (options.alt_delimiters, options.alt_line_breaks) {
        (false, false) => Warning::notice(
            "LaTeX detected. Standard delimiters are used. If math does not render \
             correctly, try enabling alternative $$$$ delimiters or \\\\ line breaks \
             in the conversion settings.",
        ),
        (true, false) => {
            Warning::info("Alternative delimiter mode: display math uses $$$$ delimiters.")
        }
        (false, true) => Warning::info(
            "Alternative line break mode: \\\\ in display math is converted to \\\\\\\\.",
        ),
        (true, true) => Warning::info(
            "Alternative math mode: display math uses $$$$ delimiters and \\\\ line \
             breaks are doubled.",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WarningLevel;

    #[test]
    fn test_display_math_escapes_asterisks() {
        let outcome = transform_math("$$a * b$$", MathOptions::default());
        assert_eq!(outcome.text, "$$a \\* b$$");
        assert!(outcome.has_math);
    }

    #[test]
    fn test_already_escaped_asterisk_untouched() {
        let outcome = transform_math("$$a \\* b$$", MathOptions::default());
        assert_eq!(outcome.text, "$$a \\* b$$");
    }

    #[test]
    fn test_currency_left_alone() {
        let outcome = transform_math("$5.00 and $10", MathOptions::default());
        assert_eq!(outcome.text, "$5.00 and $10");
        assert!(!outcome.has_math);
        assert!(outcome.advisory.is_none());
    }

    #[test]
    fn test_inline_math() {
        let outcome = transform_math("where $x * y$ holds", MathOptions::default());
        assert_eq!(outcome.text, "where $x \\* y$ holds");
        assert!(outcome.has_math);
    }

    #[test]
    fn test_inline_must_stay_on_one_line() {
        let text = "a $x\ny$ b";
        let outcome = transform_math(text, MathOptions::default());
        assert_eq!(outcome.text, text);
        assert!(!outcome.has_math);
    }

    #[test]
    fn test_display_spans_lines() {
        let outcome = transform_math("$$\nx * y\n$$", MathOptions::default());
        assert_eq!(outcome.text, "$$\nx \\* y\n$$");
    }

    #[test]
    fn test_alt_delimiters() {
        let options = MathOptions {
            alt_delimiters: true,
            alt_line_breaks: false,
        };
        let outcome = transform_math("$$x$$", options);
        assert_eq!(outcome.text, "$$$$x$$$$");
        assert_eq!(outcome.advisory.unwrap().level, WarningLevel::Info);
    }

    #[test]
    fn test_alt_line_breaks() {
        let options = MathOptions {
            alt_delimiters: false,
            alt_line_breaks: true,
        };
        let outcome = transform_math("$$a \\\\ b$$", options);
        assert_eq!(outcome.text, "$$a \\\\\\\\ b$$");
    }

    #[test]
    fn test_line_breaks_only_doubled_inside_display() {
        let options = MathOptions {
            alt_delimiters: false,
            alt_line_breaks: true,
        };
        let outcome = transform_math("text \\\\ outside $$m$$", options);
        assert_eq!(outcome.text, "text \\\\ outside $$m$$");
    }

    #[test]
    fn test_single_advisory_when_math_found() {
        let outcome = transform_math("$$a$$ and $b$", MathOptions::default());
        let advisory = outcome.advisory.unwrap();
        assert_eq!(advisory.level, WarningLevel::Notice);
    }

    #[test]
    fn test_no_advisory_without_math() {
        let outcome = transform_math("plain text", MathOptions::default());
        assert!(outcome.advisory.is_none());
        assert!(!outcome.has_math);
    }

    #[test]
    fn test_unclosed_display_left_alone() {
        let outcome = transform_math("$$never closes", MathOptions::default());
        assert_eq!(outcome.text, "$$never closes");
        assert!(!outcome.has_math);
    }
}
