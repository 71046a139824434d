//! Text normalization passes applied after extraction.
//!
//! [`clean`] is a pure function running a fixed sequence of passes:
//! line-ending normalization, blank-line collapsing, horizontal-whitespace
//! collapsing, and trimming. It is idempotent.

use std::sync::LazyLock;

use regex::Regex;

static MULTI_NEWLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

static HSPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid regex"));

/// Normalize extracted text for chunking.
///
/// Passes, in fixed order:
/// 1. `\r\n` and bare `\r` become `\n`
/// 2. runs of 3+ newlines collapse to exactly 2 (paragraph breaks survive)
/// 3. runs of spaces/tabs collapse to a single space, newlines untouched
/// 4. leading/trailing whitespace is trimmed
pub fn clean(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = MULTI_NEWLINE_RE.replace_all(&text, "\n\n");
    let text = HSPACE_RE.replace_all(&text, " ");

    text.trim().to_string()
}
