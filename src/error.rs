//! Error kinds for the retrieval core.
//!
//! "No data" outcomes (an empty query, no matching chunks, an unchanged
//! document) are never errors; they come back as empty results or as
//! [`IngestOutcome::Unchanged`](crate::index::IngestOutcome::Unchanged).
//! The variants here mean an operation actually failed and the caller
//! should log or surface it.

/// Failures while ingesting or re-indexing a document.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("document filename must not be empty")]
    EmptyFilename,

    #[error("document '{filename}' has no text after normalization")]
    EmptyDocument { filename: String },

    #[error("document not found: {filename}")]
    NotFound { filename: String },

    #[error("connector failed: {0}")]
    Connector(String),
}
