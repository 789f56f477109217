//! Shared text primitives: whitespace normalization, sentence splitting,
//! alphabetic tokenization, and the stopword lists used by the chunker,
//! ranker, and summarizer.
//!
//! Everything here is pure and allocation-light so it can be called from any
//! number of concurrent search or ingestion tasks.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Generic English function words plus conversational filler
/// (`tell`, `me`, `about`, `know`, `please`).
///
/// Used for keyword extraction and for query-term filtering in the
/// summarizer.
pub const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "is", "are", "was", "were", "be", "been", "have", "has", "had", "do", "does", "did",
    "will", "would", "could", "should", "may", "might", "can", "this", "that", "these", "those",
    "what", "where", "when", "why", "how", "who", "which", "tell", "me", "about", "know",
    "please",
];

/// Greeting and courtesy tokens that never carry retrieval signal.
///
/// Added on top of [`STOPWORDS`] when normalizing search queries. Bot and
/// topic names are configured separately (`retrieval.ignored_terms`).
pub const GREETING_STOPWORDS: &[&str] = &["thank", "thanks", "hello", "hi", "hey"];

/// Question words recognized by the ranker and the intent analyzer.
pub const WH_WORDS: &[&str] = &["who", "what", "where", "when", "why", "how", "which"];

static ALPHA_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-z]{3,}\b").expect("valid token regex"));

static STOPWORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOPWORDS.iter().copied().collect());

/// Returns true if `word` (already lowercase) is in [`STOPWORDS`].
pub fn is_stopword(word: &str) -> bool {
    STOPWORD_SET.contains(word)
}

/// Collapse every run of whitespace (including newlines) to a single space
/// and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Number of Unicode scalar values. All length budgets in this crate are
/// measured in characters, never bytes.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Lowercase alphabetic tokens of at least three letters, in encounter order,
/// duplicates included.
pub fn alpha_tokens(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    ALPHA_TOKEN
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Split text into sentences at whitespace that follows `.`, `!` or `?`.
///
/// The terminating punctuation stays attached to its sentence. Empty pieces
/// are dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    let mut iter = text.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        if c.is_whitespace() && matches!(prev, Some('.' | '!' | '?')) {
            let piece = text[start..i].trim();
            if !piece.is_empty() {
                sentences.push(piece);
            }
            // Swallow the rest of the whitespace run.
            let mut next_start = i + c.len_utf8();
            while let Some(&(j, w)) = iter.peek() {
                if !w.is_whitespace() {
                    break;
                }
                next_start = j + w.len_utf8();
                iter.next();
            }
            start = next_start;
            prev = None;
            continue;
        }
        prev = Some(c);
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// True if the text has at least one cased letter and no lowercase letters.
pub fn is_all_upper(text: &str) -> bool {
    let mut has_cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

/// Words of `text` with leading/trailing punctuation removed.
///
/// Apostrophes inside a word are kept (`don't`, `what's`). The input is
/// expected to be lowercase already.
pub fn bare_words(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .collect()
}

/// Take at most `max_chars` characters from the front of `text`.
pub fn take_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
