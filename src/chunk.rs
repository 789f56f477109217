//! Topic-boundary text chunker.
//!
//! Splits a document's normalized text into [`Chunk`]s. Splitting happens on
//! sentence boundaries, and a new chunk starts at a heading-like sentence
//! once enough text has accumulated, so each chunk tends to cover one topic.
//!
//! Each chunk receives a random UUID, a SHA-256 hash of its text, and up to
//! `max_keywords` extracted keywords.
//!
//! # Algorithm
//!
//! 1. Split the text into sentences at `.`, `!`, `?` followed by whitespace.
//! 2. Drop sentences with fewer than 3 words.
//! 3. A sentence is a heading if it is all upper-case, shorter than 50
//!    characters, a `Capitalized Words:` label, or starts with `N. `.
//! 4. At a heading, flush the buffer as a chunk if it holds at least
//!    `min_heading_flush_words` words.
//! 5. Append the sentence; flush when the buffer reaches `target_words`.
//! 6. Flush the trailing buffer only if it holds `min_trailing_words` words.
//! 7. If any chunk was produced, synthesize a summary chunk from the first
//!    three chunks (capped at `summary_chars`) and insert it at index 0.
//!
//! # Example
//!
//! ```rust
//! use ragchat::chunk::chunk_document;
//! use ragchat::config::ChunkingConfig;
//!
//! let text = "word ".repeat(600) + "end.";
//! let chunks = chunk_document("guide.txt", &text, &ChunkingConfig::default());
//! assert_eq!(chunks.len(), 2);
//! assert!(chunks[0].is_summary);
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::ChunkingConfig;
use crate::models::Chunk;
use crate::text::{
    alpha_tokens, char_len, is_all_upper, is_stopword, split_sentences, take_chars, word_count,
};

/// Sentences with fewer words than this are never indexed.
const MIN_SENTENCE_WORDS: usize = 3;

/// Sentences shorter than this (in characters) count as headings.
const HEADING_MAX_CHARS: usize = 50;

/// Number of leading topical chunks folded into the summary chunk.
const SUMMARY_SOURCE_CHUNKS: usize = 3;

const ELLIPSIS: &str = "...";

static CAPITALIZED_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][a-z]*(?:\s+[A-Z][a-z]*)*:$").expect("valid label regex")
});

static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.\s").expect("valid numbered regex"));

/// Split a document into topical chunks plus a leading summary chunk.
///
/// `text` is expected to be whitespace-normalized already (see
/// [`normalize_whitespace`](crate::text::normalize_whitespace)); the chunker
/// joins sentences with single spaces.
///
/// Returns an empty list when the document holds too little text to form a
/// single chunk.
pub fn chunk_document(filename: &str, text: &str, config: &ChunkingConfig) -> Vec<Chunk> {
    let mut topical: Vec<String> = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut buffer_words = 0usize;

    for sentence in split_sentences(text) {
        let words = word_count(sentence);
        if words < MIN_SENTENCE_WORDS {
            continue;
        }

        // A heading closes the open buffer; one too small to stand alone is discarded.
        if is_heading(sentence) && !buffer.is_empty() {
            if buffer_words >= config.min_heading_flush_words {
                topical.push(buffer.join(" "));
            }
            buffer.clear();
            buffer_words = 0;
        }

        buffer.push(sentence);
        buffer_words += words;

        if buffer_words >= config.target_words {
            topical.push(buffer.join(" "));
            buffer.clear();
            buffer_words = 0;
        }
    }

    // Short trailing content is dropped, not merged into the previous chunk.
    if !buffer.is_empty() && buffer_words >= config.min_trailing_words {
        topical.push(buffer.join(" "));
    }

    if topical.is_empty() {
        return Vec::new();
    }

    let summary = summary_text(&topical, config.summary_chars);

    let mut chunks = Vec::with_capacity(topical.len() + 1);
    chunks.push(make_chunk(filename, 0, &summary, true, config.max_keywords));
    for (i, text) in topical.iter().enumerate() {
        chunks.push(make_chunk(filename, i + 1, text, false, config.max_keywords));
    }
    chunks
}

/// Whether a sentence looks like a section heading.
pub fn is_heading(sentence: &str) -> bool {
    is_all_upper(sentence)
        || char_len(sentence) < HEADING_MAX_CHARS
        || CAPITALIZED_LABEL.is_match(sentence)
        || NUMBERED_ITEM.is_match(sentence)
}

/// First `max` unique non-stopword tokens (lowercase, alphabetic, ≥3 letters),
/// in encounter order.
pub fn extract_keywords(text: &str, max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();
    for token in alpha_tokens(text) {
        if keywords.len() >= max {
            break;
        }
        if is_stopword(&token) || !seen.insert(token.clone()) {
            continue;
        }
        keywords.push(token);
    }
    keywords
}

fn summary_text(topical: &[String], max_chars: usize) -> String {
    let joined = topical
        .iter()
        .take(SUMMARY_SOURCE_CHUNKS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    if char_len(&joined) <= max_chars {
        return joined;
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    format!("{}{}", take_chars(&joined, keep), ELLIPSIS)
}

/// Create a single [`Chunk`] with a UUID, SHA-256 content hash, and keywords.
fn make_chunk(filename: &str, index: usize, text: &str, is_summary: bool, max_keywords: usize) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        filename: filename.to_string(),
        index,
        text: text.to_string(),
        word_count: word_count(text),
        keywords: extract_keywords(text, max_keywords),
        is_summary,
        hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ChunkingConfig {
        ChunkingConfig::default()
    }

    /// A sentence of `n` words, long enough never to be a heading.
    fn sentence(n: usize, seed: &str) -> String {
        let mut words: Vec<String> = (0..n).map(|i| format!("{}{}", seed, i)).collect();
        if let Some(last) = words.last_mut() {
            last.push('.');
        }
        words.join(" ")
    }

    #[test]
    fn test_single_run_on_document_gives_topical_plus_summary() {
        let text = sentence(600, "savanna");
        let chunks = chunk_document("doc.txt", &text, &config());
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].is_summary);
        assert!(!chunks[1].is_summary);
        assert_eq!(chunks[1].text, text);
        assert_eq!(chunks[1].word_count, 600);
    }

    #[test]
    fn test_summary_is_first_and_bounded() {
        let text = (0..12)
            .map(|i| sentence(40, &format!("topic{}x", i)))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = chunk_document("doc.txt", &text, &config());
        assert!(chunks.len() >= 2);
        assert!(chunks[0].is_summary);
        assert!(char_len(&chunks[0].text) <= 500);
        assert!(chunks[0].text.ends_with("..."));
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i);
            assert_eq!(c.is_summary, i == 0);
        }
    }

    #[test]
    fn test_target_size_flush() {
        // Sentences of 60 words: the buffer reaches 300 after five of them.
        let text = (0..10)
            .map(|i| sentence(60, &format!("s{}w", i)))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = chunk_document("doc.txt", &text, &config());
        let topical: Vec<_> = chunks.iter().filter(|c| !c.is_summary).collect();
        assert_eq!(topical.len(), 2);
        assert!(topical.iter().all(|c| c.word_count == 300));
    }

    #[test]
    fn test_heading_flushes_large_buffer() {
        let body_a = sentence(70, "alpha");
        let body_b = sentence(70, "beta");
        let text = format!("{} WILDLIFE OF THE NORTH. {}", body_a, body_b);
        let chunks = chunk_document("doc.txt", &text, &config());
        let topical: Vec<_> = chunks.iter().filter(|c| !c.is_summary).collect();
        assert_eq!(topical.len(), 2);
        assert_eq!(topical[0].text, body_a);
        assert!(topical[1].text.starts_with("WILDLIFE OF THE NORTH."));
        assert!(topical[0].word_count >= 50);
    }

    #[test]
    fn test_heading_discards_small_buffer() {
        let small = sentence(20, "gamma");
        let rest = sentence(40, "delta");
        let text = format!("{} Short heading line here. {}", small, rest);
        let chunks = chunk_document("doc.txt", &text, &config());
        let topical: Vec<_> = chunks.iter().filter(|c| !c.is_summary).collect();
        assert_eq!(topical.len(), 1);
        assert!(topical[0].text.starts_with("Short heading line here."));
        assert!(topical[0].text.ends_with(&rest));
        assert!(!topical[0].text.contains("gamma0"));
        assert_eq!(topical[0].word_count, 44);
    }

    #[test]
    fn test_short_trailing_content_dropped() {
        let first = sentence(300, "main");
        let trailing = sentence(10, "tail");
        let text = format!("{} {}", first, trailing);
        let chunks = chunk_document("doc.txt", &text, &config());
        assert_eq!(chunks.len(), 2);
        assert!(!chunks.iter().any(|c| c.text.contains("tail0")));
    }

    #[test]
    fn test_tiny_document_has_no_chunks() {
        let chunks = chunk_document("doc.txt", "Too short to index.", &config());
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_short_sentences_dropped() {
        let text = format!("Hi there. {}", sentence(40, "kept"));
        let chunks = chunk_document("doc.txt", &text, &config());
        assert!(!chunks[1].text.contains("Hi there."));
    }

    #[test]
    fn test_is_heading_patterns() {
        assert!(is_heading("TRAVEL TIPS FOR THE DRY SEASON AND ITS WONDERFUL WILDLIFE."));
        assert!(is_heading("A short line."));
        assert!(is_heading("12. The dunes of Sossusvlei rise over three hundred metres high."));
        assert!(!is_heading(
            "Etosha National Park is one of the largest wildlife reserves in Africa."
        ));
    }

    #[test]
    fn test_extract_keywords_unique_ordered_capped() {
        let kw = extract_keywords("The lions and the Lions of Etosha hunt at dusk near the waterhole", 3);
        assert_eq!(kw, vec!["lions", "etosha", "hunt"]);
    }

    #[test]
    fn test_keywords_capped_at_fifteen() {
        let text = sentence(80, "kw");
        let chunks = chunk_document("doc.txt", &text, &config());
        assert!(chunks.iter().all(|c| c.keywords.len() <= 15));
    }

    #[test]
    fn test_chunk_hash_deterministic() {
        let text = sentence(100, "hash");
        let a = chunk_document("doc.txt", &text, &config());
        let b = chunk_document("doc.txt", &text, &config());
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.hash, y.hash);
            assert_eq!(x.text, y.text);
        }
    }
}
