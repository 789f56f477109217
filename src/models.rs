//! Core data models used throughout ragchat.
//!
//! These types represent the documents, chunks, and scored results that flow
//! through the ingestion and retrieval pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Raw item produced by an ingestion connector: a filename and its text,
/// already converted from the source format.
#[derive(Debug, Clone)]
pub struct SourceItem {
    pub filename: String,
    pub text: String,
}

/// An ingested document, keyed by filename.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub filename: String,
    /// Whitespace-normalized body text.
    pub text: String,
    /// SHA-256 of the raw text as received from the connector.
    pub hash: String,
    pub word_count: usize,
    pub char_count: usize,
    pub ingested_at: DateTime<Utc>,
}

/// A retrievable span of a document's text.
#[derive(Debug, Clone, Serialize)]
pub struct Chunk {
    pub id: String,
    /// Filename of the owning document. Lookup only.
    pub filename: String,
    /// Position within the document's chunk list. The summary chunk is 0.
    pub index: usize,
    pub text: String,
    pub word_count: usize,
    pub keywords: Vec<String>,
    pub is_summary: bool,
    /// SHA-256 of `text`.
    pub hash: String,
}

/// A chunk ranked against a query, with its query-focused excerpt.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: i64,
    /// Number of query tokens found in the chunk text.
    pub matching_tokens: usize,
    /// Bounded, cleaned excerpt of the chunk.
    pub excerpt: String,
    /// Per-signal breakdown (populated when explanation is requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain: Option<ScoreBreakdown>,
}

/// Contribution of each ranking signal to a chunk's score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub phrase: i64,
    pub all_tokens: i64,
    pub token_matches: i64,
    pub proximity: i64,
    pub summary: i64,
    pub length: i64,
    pub question_words: i64,
    pub heading_penalty: i64,
}

impl ScoreBreakdown {
    /// Sum of every signal.
    pub fn total(&self) -> i64 {
        self.phrase
            + self.all_tokens
            + self.token_matches
            + self.proximity
            + self.summary
            + self.length
            + self.question_words
            + self.heading_penalty
    }
}
