//! Recursive character splitting of cleaned page text into retrieval chunks.
//!
//! Text is split on a separator hierarchy — paragraph breaks, then line
//! breaks, then spaces, then individual characters — so a chunk boundary
//! never lands mid-paragraph when a paragraph break was available. Adjacent
//! chunks overlap by a configured number of characters, so a concept that
//! straddles a boundary reappears whole in at least one chunk.

use std::collections::VecDeque;

use tracing::debug;

use sitechat_shared::{Chunk, ChunkConfig, ChunkMetadata};

/// Separator hierarchy, highest priority first. The empty string is the
/// character-level last resort.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Split `text` into overlapping chunks stamped with `{source, title}`.
///
/// Empty input yields an empty vector (a logged no-op, not an error).
/// Whitespace-only pieces are discarded. For a fixed input and
/// configuration the output sequence is stable and reproducible.
pub fn chunk(text: &str, source_url: &str, title: &str, config: &ChunkConfig) -> Vec<Chunk> {
    if text.trim().is_empty() {
        debug!(source = source_url, "attempted to chunk empty text");
        return Vec::new();
    }

    let pieces = split_text(text, &SEPARATORS, config.chunk_size, config.chunk_overlap);

    let chunks: Vec<Chunk> = pieces
        .into_iter()
        .filter(|piece| !piece.trim().is_empty())
        .map(|content| Chunk {
            content,
            metadata: ChunkMetadata {
                source: source_url.to_string(),
                title: title.to_string(),
            },
        })
        .collect();

    debug!(source = source_url, count = chunks.len(), "split text into chunks");
    chunks
}

/// Recursively split `text` with the given separator hierarchy.
///
/// The first separator present in the text is used; any piece that still
/// exceeds `chunk_size` is re-split with the remaining separators. Pieces
/// within bounds are merged back together up to `chunk_size`, carrying
/// `overlap` trailing characters into the next chunk.
fn split_text(text: &str, separators: &[&str], chunk_size: usize, overlap: usize) -> Vec<String> {
    let (separator, remaining) = pick_separator(text, separators);

    let splits: Vec<String> = if separator.is_empty() {
        text.chars().map(String::from).collect()
    } else {
        text.split(separator).map(str::to_string).collect()
    };

    let mut final_chunks: Vec<String> = Vec::new();
    let mut good_splits: Vec<String> = Vec::new();

    for piece in splits {
        if piece.chars().count() < chunk_size {
            good_splits.push(piece);
            continue;
        }

        if !good_splits.is_empty() {
            final_chunks.extend(merge_splits(&good_splits, separator, chunk_size, overlap));
            good_splits.clear();
        }

        if remaining.is_empty() {
            // No finer separator left; keep the oversized piece whole.
            final_chunks.push(piece);
        } else {
            final_chunks.extend(split_text(&piece, remaining, chunk_size, overlap));
        }
    }

    if !good_splits.is_empty() {
        final_chunks.extend(merge_splits(&good_splits, separator, chunk_size, overlap));
    }

    final_chunks
}

/// Choose the first separator that occurs in `text` (the empty string
/// always matches), returning it plus the lower-priority remainder.
fn pick_separator<'a>(text: &str, separators: &'a [&'a str]) -> (&'a str, &'a [&'a str]) {
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() || text.contains(sep) {
            return (sep, &separators[i + 1..]);
        }
    }
    ("", &[])
}

/// Merge small splits into chunks of at most `chunk_size` characters.
///
/// When a chunk fills up it is emitted, and splits are dropped from the
/// front of the window until at most `overlap` characters remain — those
/// become the start of the next chunk.
fn merge_splits(splits: &[String], separator: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let sep_len = separator.chars().count();

    let mut docs: Vec<String> = Vec::new();
    let mut window: VecDeque<String> = VecDeque::new();
    let mut total = 0usize;

    for piece in splits {
        let piece_len = piece.chars().count();
        let joined_len = total + piece_len + if window.is_empty() { 0 } else { sep_len };

        if joined_len > chunk_size && !window.is_empty() {
            if let Some(doc) = join_window(&window, separator) {
                docs.push(doc);
            }

            // Shrink the window to the overlap budget, and further if the
            // incoming piece still would not fit.
            while total > overlap
                || (total + piece_len + if window.is_empty() { 0 } else { sep_len } > chunk_size
                    && total > 0)
            {
                if let Some(first) = window.pop_front() {
                    total -= first.chars().count() + if window.is_empty() { 0 } else { sep_len };
                } else {
                    break;
                }
            }
        }

        total += piece_len + if window.is_empty() { 0 } else { sep_len };
        window.push_back(piece.clone());
    }

    if let Some(doc) = join_window(&window, separator) {
        docs.push(doc);
    }

    docs
}

/// Join the current window with the separator; `None` when the result is
/// empty after trimming.
fn join_window(window: &VecDeque<String>, separator: &str) -> Option<String> {
    let joined = window
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(chunk_size: usize, chunk_overlap: usize) -> ChunkConfig {
        ChunkConfig {
            chunk_size,
            chunk_overlap,
        }
    }

    fn meta_of(chunks: &[Chunk]) -> Vec<(&str, &str)> {
        chunks
            .iter()
            .map(|c| (c.metadata.source.as_str(), c.metadata.title.as_str()))
            .collect()
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunks = chunk("", "https://x.example/", "X", &config(1000, 150));
        assert!(chunks.is_empty());

        let chunks = chunk("   \n\n  ", "https://x.example/", "X", &config(1000, 150));
        assert!(chunks.is_empty());
    }

    #[test]
    fn short_text_yields_single_equal_chunk() {
        let text = "Rust is a memory-safe systems programming language.";
        let chunks = chunk(text, "https://x.example/about", "About", &config(1000, 150));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, text);
    }

    #[test]
    fn every_chunk_carries_source_metadata() {
        let text = "First paragraph about the crawler.\n\nSecond paragraph about the index.";
        let chunks = chunk(text, "https://x.example/docs", "Docs", &config(40, 0));

        assert!(chunks.len() > 1);
        for (source, title) in meta_of(&chunks) {
            assert_eq!(source, "https://x.example/docs");
            assert_eq!(title, "Docs");
        }
    }

    #[test]
    fn splits_on_paragraphs_before_lines() {
        let text = "alpha one\n\nbeta two\n\ngamma three";
        let chunks = chunk(text, "https://x.example/", "X", &config(12, 0));

        // Each paragraph fits in a chunk on its own; none is split mid-line.
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["alpha one", "beta two", "gamma three"]);
    }

    #[test]
    fn recurses_to_finer_separators_for_long_paragraphs() {
        // One paragraph longer than the chunk size forces word-level splits.
        let text = "one two three four five six seven eight nine ten";
        let chunks = chunk(text, "https://x.example/", "X", &config(20, 0));

        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(
                c.content.chars().count() <= 20,
                "chunk too large: {:?}",
                c.content
            );
        }
        // All words survive, in order.
        let rejoined = chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        for word in ["one", "five", "ten"] {
            assert!(rejoined.contains(word));
        }
    }

    #[test]
    fn adjacent_chunks_share_overlap_text() {
        let words: Vec<String> = (0..40).map(|i| format!("word{i:02}")).collect();
        let text = words.join(" ");
        let chunks = chunk(&text, "https://x.example/", "X", &config(60, 20));

        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let prev = &pair[0].content;
            let next = &pair[1].content;

            // The longest suffix of `prev` that prefixes `next` is the
            // carried-over overlap; it must be non-empty.
            let shared = (1..=prev.len())
                .rev()
                .map(|n| &prev[prev.len() - n..])
                .find(|suffix| next.starts_with(suffix))
                .unwrap_or("");
            assert!(
                !shared.is_empty(),
                "no overlap between {prev:?} and {next:?}"
            );
        }
    }

    #[test]
    fn character_level_last_resort_for_unbroken_text() {
        // No paragraph, line, or space separators at all.
        let text = "a".repeat(50);
        let chunks = chunk(&text, "https://x.example/", "X", &config(10, 0));

        assert!(chunks.len() >= 5);
        for c in &chunks {
            assert!(c.content.chars().count() <= 10);
        }
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "First paragraph of prose.\n\nSecond paragraph of prose.\n\nThird one.";
        let a = chunk(text, "https://x.example/", "X", &config(30, 10));
        let b = chunk(text, "https://x.example/", "X", &config(30, 10));
        assert_eq!(a, b);
    }

    #[test]
    fn whitespace_only_pieces_are_discarded() {
        let text = "real words here\n\n   \n\nmore real words";
        let chunks = chunk(text, "https://x.example/", "X", &config(18, 0));
        for c in &chunks {
            assert!(!c.content.trim().is_empty());
        }
    }
}
