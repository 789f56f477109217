//! Heuristic relevance ranking over the chunk index.
//!
//! Every chunk is scored independently against the normalized query with a
//! set of additive integer signals; there is no cross-chunk normalization.
//! The ranker only reads an index [`snapshot`](crate::index::KnowledgeBase::snapshot),
//! so any number of searches can run alongside ingestion.
//!
//! # Scoring
//!
//! | Signal | Points |
//! |--------|--------|
//! | Whole query is a substring of the chunk | +1000 |
//! | Every query token occurs in the chunk | +500 |
//! | Per matching token, plus `floor(200 × matched / total)` | +100 each |
//! | Some window of `n` consecutive words holds all `n` tokens | +300 |
//! | Chunk is its document's summary chunk | +150 |
//! | Fewer than 100 words / more than 300 words | +50 / −30 |
//! | Each question word found in both query and chunk | +50 |
//! | Chunk starts with "welcome to" or is all upper-case | −100 |
//!
//! Chunks scoring `<= 0` are dropped. The rest are sorted by score
//! (descending) with a stable sort, so ties keep index order: documents in
//! ingestion order, chunks in document order.

use std::collections::HashSet;

use serde::Serialize;

use crate::index::KnowledgeBase;
use crate::models::{Chunk, ScoreBreakdown, ScoredChunk};
use crate::summarize::{clean_excerpt, summarize};
use crate::text::{alpha_tokens, bare_words, is_all_upper, is_stopword, GREETING_STOPWORDS, WH_WORDS};

const PHRASE_BONUS: i64 = 1000;
const ALL_TOKENS_BONUS: i64 = 500;
const PER_TOKEN_BONUS: i64 = 100;
const MATCH_FRACTION_BONUS: f64 = 200.0;
const PROXIMITY_BONUS: i64 = 300;
const SUMMARY_BONUS: i64 = 150;
const SHORT_CHUNK_BONUS: i64 = 50;
const LONG_CHUNK_PENALTY: i64 = -30;
const SHORT_CHUNK_WORDS: usize = 100;
const LONG_CHUNK_WORDS: usize = 300;
const QUESTION_WORD_BONUS: i64 = 50;
const HEADING_PENALTY: i64 = -100;

/// A normalized search query.
#[derive(Debug, Clone, Serialize)]
pub struct Query {
    pub raw: String,
    /// Trimmed, lowercase form of `raw`, used for the phrase signal.
    pub phrase: String,
    /// Unique meaningful tokens in encounter order.
    pub tokens: Vec<String>,
    /// Question words present in the query.
    pub question_words: Vec<&'static str>,
}

impl Query {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Bundles all inputs for a single search invocation.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    pub limit: usize,
    /// Character budget for each returned excerpt.
    pub excerpt_budget: usize,
    /// Maximum sentences kept by the excerpt summarizer.
    pub max_sentences: usize,
    /// If true, populate [`ScoreBreakdown`] on each result.
    pub explain: bool,
}

/// Query normalizer and chunk scorer.
#[derive(Debug, Clone)]
pub struct Ranker {
    stopwords: HashSet<String>,
}

impl Ranker {
    /// Build a ranker whose query stopwords are the generic list, greeting
    /// tokens, and the given bot/topic names.
    pub fn new(ignored_terms: &[String]) -> Self {
        let mut stopwords: HashSet<String> = crate::text::STOPWORDS
            .iter()
            .chain(GREETING_STOPWORDS.iter())
            .map(|s| s.to_string())
            .collect();
        stopwords.extend(ignored_terms.iter().map(|t| t.to_lowercase()));
        Self { stopwords }
    }

    pub fn normalize_query(&self, raw: &str) -> Query {
        let phrase = raw.trim().to_lowercase();
        let mut seen = HashSet::new();
        let tokens = alpha_tokens(&phrase)
            .into_iter()
            .filter(|t| !self.stopwords.contains(t) && !is_stopword(t))
            .filter(|t| seen.insert(t.clone()))
            .collect();
        let words = bare_words(&phrase);
        let question_words = WH_WORDS
            .iter()
            .copied()
            .filter(|w| words.contains(w))
            .collect();
        Query {
            raw: raw.to_string(),
            phrase,
            tokens,
            question_words,
        }
    }

    /// Score one chunk. Returns the per-signal breakdown and the number of
    /// query tokens found in the chunk.
    pub fn score_chunk(&self, query: &Query, chunk: &Chunk) -> (ScoreBreakdown, usize) {
        let mut b = ScoreBreakdown::default();
        if query.is_empty() {
            return (b, 0);
        }

        let text = chunk.text.to_lowercase();

        if !query.phrase.is_empty() && text.contains(&query.phrase) {
            b.phrase = PHRASE_BONUS;
        }

        let matched = query
            .tokens
            .iter()
            .filter(|t| text.contains(t.as_str()))
            .count();
        if matched == query.tokens.len() {
            b.all_tokens = ALL_TOKENS_BONUS;
        }
        if matched > 0 {
            let fraction = matched as f64 / query.tokens.len() as f64;
            b.token_matches = matched as i64 * PER_TOKEN_BONUS
                + (fraction * MATCH_FRACTION_BONUS).floor() as i64;
        }

        let words = bare_words(&text);
        if has_proximity_window(&words, &query.tokens) {
            b.proximity = PROXIMITY_BONUS;
        }

        if chunk.is_summary {
            b.summary = SUMMARY_BONUS;
        }

        let chunk_words = text.split_whitespace().count();
        if chunk_words < SHORT_CHUNK_WORDS {
            b.length = SHORT_CHUNK_BONUS;
        } else if chunk_words > LONG_CHUNK_WORDS {
            b.length = LONG_CHUNK_PENALTY;
        }

        let shared_question_words = query
            .question_words
            .iter()
            .filter(|w| words.contains(*w))
            .count();
        b.question_words = shared_question_words as i64 * QUESTION_WORD_BONUS;

        if text.starts_with("welcome to") || is_all_upper(&chunk.text) {
            b.heading_penalty = HEADING_PENALTY;
        }

        (b, matched)
    }

    /// Score every chunk in the index and return the positive ones, best
    /// first, without excerpts.
    pub fn rank(&self, kb: &KnowledgeBase, query: &Query) -> Vec<ScoredChunk> {
        if query.is_empty() {
            return Vec::new();
        }

        let snapshot = kb.snapshot();
        let mut scored: Vec<ScoredChunk> = snapshot
            .iter()
            .flat_map(|doc| doc.chunks.iter())
            .filter_map(|chunk| {
                let (breakdown, matching_tokens) = self.score_chunk(query, chunk);
                let score = breakdown.total();
                (score > 0).then(|| ScoredChunk {
                    chunk: chunk.clone(),
                    score,
                    matching_tokens,
                    excerpt: String::new(),
                    explain: Some(breakdown),
                })
            })
            .collect();

        // Stable: equal scores keep snapshot order.
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored
    }

    /// Run a search: rank, keep the top `limit`, and attach excerpts.
    pub fn search(&self, kb: &KnowledgeBase, req: &SearchRequest<'_>) -> Vec<ScoredChunk> {
        let query = self.normalize_query(req.query);
        if query.is_empty() {
            tracing::debug!(query = req.query, "no meaningful query tokens");
            return Vec::new();
        }

        let mut results = self.rank(kb, &query);
        results.truncate(req.limit);

        for hit in &mut results {
            let excerpt = summarize(
                &hit.chunk.text,
                Some(req.query),
                req.excerpt_budget,
                req.max_sentences,
            );
            hit.excerpt = clean_excerpt(&excerpt);
            if !req.explain {
                hit.explain = None;
            }
        }
        results.retain(|hit| !hit.excerpt.is_empty());

        tracing::debug!(
            query = req.query,
            tokens = query.tokens.len(),
            hits = results.len(),
            "search complete"
        );
        results
    }
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new(&[])
    }
}

/// True if some run of `tokens.len()` consecutive words contains every token.
fn has_proximity_window(words: &[&str], tokens: &[String]) -> bool {
    let n = tokens.len();
    if n == 0 || words.len() < n {
        return false;
    }
    words
        .windows(n)
        .any(|window| tokens.iter().all(|t| window.contains(&t.as_str())))
}
