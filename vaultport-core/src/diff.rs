//! Line-level diff between original and transformed text.
//!
//! Classic LCS alignment over line sequences, used only for side-by-side
//! display of what a transform changed. Never part of the batch pipeline.

use serde::{Deserialize, Serialize};

/// Per-line marker for side-by-side rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineMark {
    Same,
    Removed,
    Added,
}

/// Maximum m*n line-pair combinations before the exact alignment is
/// skipped in favor of an all-`Same` result.
const MAX_CELLS: usize = 4_000_000;

/// Compute per-line markers for `original` and `transformed`.
///
/// Returns one marker per original line and one per transformed line.
/// When the line-pair product exceeds the guard, both sides come back
/// all-`Same`; callers must not read that as textual equality. It is a
/// latency trade-off for very large documents.
///
/// Ties between equal-length alternative alignments break toward `Added`.
/// The choice is arbitrary but deterministic, and only affects which of
/// two equivalent alignments is displayed.
pub fn line_diff(original: &str, transformed: &str) -> (Vec<LineMark>, Vec<LineMark>) {
    let orig_lines: Vec<&str> = original.split('\n').collect();
    let trans_lines: Vec<&str> = transformed.split('\n').collect();

    let m = orig_lines.len();
    let n = trans_lines.len();

    if m.saturating_mul(n) > MAX_CELLS {
        return (vec![LineMark::Same; m], vec![LineMark::Same; n]);
    }

    // (m+1) x (n+1) LCS-length table, row-major
    let width = n + 1;
    let mut table = vec![0u32; (m + 1) * width];
    for i in 1..=m {
        for j in 1..=n {
            table[i * width + j] = if orig_lines[i - 1] == trans_lines[j - 1] {
                table[(i - 1) * width + (j - 1)] + 1
            } else {
                table[(i - 1) * width + j].max(table[i * width + (j - 1)])
            };
        }
    }

    // Backtrack from (m, n)
    let mut orig_marks = vec![LineMark::Same; m];
    let mut trans_marks = vec![LineMark::Same; n];
    let mut i = m;
    let mut j = n;
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && orig_lines[i - 1] == trans_lines[j - 1] {
            orig_marks[i - 1] = LineMark::Same;
            trans_marks[j - 1] = LineMark::Same;
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || table[i * width + (j - 1)] >= table[(i - 1) * width + j]) {
            trans_marks[j - 1] = LineMark::Added;
            j -= 1;
        } else {
            orig_marks[i - 1] = LineMark::Removed;
            i -= 1;
        }
    }

    (orig_marks, trans_marks)
}
