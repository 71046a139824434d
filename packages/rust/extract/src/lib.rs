//! Main-content extraction from raw HTML.
//!
//! The extractor locates the page's main content container via a selector
//! cascade (`main`, `article`, `[role="main"]`, `.content`, then `body`),
//! skips navigation chrome, and collects block-level text with paragraph
//! boundaries. Pages with no usable text are reported as `None` — a skip
//! signal, never an error.

pub mod cleaner;

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use sitechat_shared::MIN_CONTENT_CHARS;

pub use cleaner::clean;

/// Title and text pulled out of one HTML page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Page title (first `h1`, else `<title>`, else "Untitled").
    pub title: String,
    /// Main content text with paragraph breaks.
    pub text: String,
}

/// Content containers tried in priority order.
const CONTENT_SELECTORS: [&str; 4] = ["main", "article", r#"[role="main"]"#, ".content"];

/// Block-level elements whose text forms one paragraph each.
const BLOCK_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, li, pre, blockquote";

/// Elements whose subtree is navigation chrome, not content.
const CHROME_TAGS: [&str; 7] = [
    "nav", "header", "footer", "aside", "script", "style", "noscript",
];

/// Block tags used to detect nested blocks (a `p` inside an `li` is
/// already covered by the `li`'s text).
const BLOCK_TAGS: [&str; 10] = [
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "li", "pre", "blockquote",
];

static MULTI_NEWLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Extract the main content and title from raw HTML.
///
/// Returns `None` when the input is empty, no text could be pulled out,
/// or the resulting text is shorter than [`MIN_CONTENT_CHARS`]. Internal
/// extraction failures never propagate past this boundary.
pub fn extract(html: &str) -> Option<Extraction> {
    if html.trim().is_empty() {
        debug!("empty HTML content provided for extraction");
        return None;
    }

    let doc = Html::parse_document(html);
    let container = find_content_container(&doc)?;
    let text = collect_text(&container);

    // Normalize non-breaking spaces, then collapse excess blank lines.
    let text = text.replace('\u{a0}', " ");
    let text = MULTI_NEWLINE_RE.replace_all(&text, "\n\n");
    let text = text.trim().to_string();

    if text.is_empty() {
        debug!("extraction returned no text");
        return None;
    }
    if text.chars().count() < MIN_CONTENT_CHARS {
        debug!(chars = text.chars().count(), "extracted content too short, skipping");
        return None;
    }

    let title = extract_title(&doc);
    debug!(chars = text.chars().count(), title = %title, "extraction successful");

    Some(Extraction { title, text })
}

/// Find the main content element via the selector cascade, falling back
/// to `<body>`.
fn find_content_container(doc: &Html) -> Option<ElementRef<'_>> {
    for sel_str in CONTENT_SELECTORS {
        if let Ok(sel) = Selector::parse(sel_str) {
            if let Some(el) = doc.select(&sel).next() {
                return Some(el);
            }
        }
    }

    let body_sel = Selector::parse("body").expect("valid selector");
    doc.select(&body_sel).next()
}

/// Collect block-level text from the container, one paragraph per block,
/// skipping chrome subtrees and blocks nested inside other blocks.
fn collect_text(container: &ElementRef<'_>) -> String {
    let block_sel = Selector::parse(BLOCK_SELECTOR).expect("valid selector");

    let mut paragraphs: Vec<String> = Vec::new();
    for el in container.select(&block_sel) {
        if in_chrome(&el) || has_block_ancestor(&el, container) {
            continue;
        }

        let text = block_text(&el);
        if !text.is_empty() {
            paragraphs.push(text);
        }
    }

    if !paragraphs.is_empty() {
        return paragraphs.join("\n\n");
    }

    // No block structure at all — take the container's raw text.
    container
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of one block element. Prose blocks get their internal whitespace
/// collapsed; `pre` blocks keep their formatting.
fn block_text(el: &ElementRef<'_>) -> String {
    let raw: String = el.text().collect();
    if el.value().name() == "pre" {
        return raw.trim_matches('\n').to_string();
    }
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether any ancestor of `el` is a chrome element.
fn in_chrome(el: &ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| CHROME_TAGS.contains(&a.value().name()))
}

/// Whether `el` sits inside another block element below the container
/// (its text is already captured by the outer block).
fn has_block_ancestor(el: &ElementRef<'_>, container: &ElementRef<'_>) -> bool {
    for ancestor in el.ancestors().filter_map(ElementRef::wrap) {
        if ancestor.id() == container.id() {
            break;
        }
        if BLOCK_TAGS.contains(&ancestor.value().name()) {
            return true;
        }
    }
    false
}

/// Page title: first `h1`, else `<title>`, else "Untitled".
fn extract_title(doc: &Html) -> String {
    let h1_sel = Selector::parse("h1").expect("valid selector");
    if let Some(el) = doc.select(&h1_sel).next() {
        let title = el.text().collect::<String>().trim().to_string();
        if !title.is_empty() {
            return title;
        }
    }

    let title_sel = Selector::parse("title").expect("valid selector");
    if let Some(el) = doc.select(&title_sel).next() {
        let title = el.text().collect::<String>().trim().to_string();
        if !title.is_empty() {
            return title;
        }
    }

    "Untitled".to_string()
}
