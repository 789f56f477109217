//! Document store and chunk index.
//!
//! Documents and their chunk sets live in a [`DashMap`] keyed by filename, so
//! reads and writes for one document are serialized by that key's shard lock
//! while different documents proceed independently.
//!
//! A document and its chunks are stored together as one immutable
//! [`IndexedDocument`] behind an `Arc`. Re-ingestion builds the replacement
//! entirely outside the map and swaps it in with a single insert, so a reader
//! holding a [`snapshot`](KnowledgeBase::snapshot) sees either the complete
//! old chunk set or the complete new one.
//!
//! Chunking runs before any lock is taken; a long ingestion never blocks
//! searches over documents that are already indexed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::chunk::chunk_document;
use crate::config::ChunkingConfig;
use crate::error::IngestError;
use crate::models::{Chunk, Document};
use crate::text::{char_len, normalize_whitespace, take_chars, word_count};

/// Characters shown in a document preview.
const PREVIEW_CHARS: usize = 300;

/// A document together with its current chunk set.
#[derive(Debug)]
pub struct IndexedDocument {
    /// Insertion sequence; orders documents for stable tie-breaking.
    pub seq: u64,
    pub document: Document,
    pub chunks: Vec<Chunk>,
}

/// Result of a successful [`KnowledgeBase::ingest`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestOutcome {
    /// First time this filename was seen.
    Created { chunks: usize },
    /// Content hash changed; the chunk set was replaced.
    Updated { chunks: usize },
    /// Content hash unchanged; nothing was touched.
    Unchanged,
}

/// Aggregate counts over the whole index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub total_documents: usize,
    pub total_chunks: usize,
    pub last_sync: Option<DateTime<Utc>>,
}

/// One row of [`KnowledgeBase::list_documents`].
#[derive(Debug, Clone, Serialize)]
pub struct DocumentListing {
    pub filename: String,
    pub word_count: usize,
    pub ingested_at: DateTime<Utc>,
}

/// Overview of a single document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub filename: String,
    pub word_count: usize,
    pub char_count: usize,
    pub chunk_count: usize,
    pub preview: String,
    pub ingested_at: DateTime<Utc>,
}

/// Thread-safe document store and chunk index.
pub struct KnowledgeBase {
    entries: DashMap<String, Arc<IndexedDocument>>,
    next_seq: AtomicU64,
    last_sync: RwLock<Option<DateTime<Utc>>>,
    chunking: ChunkingConfig,
}

impl KnowledgeBase {
    pub fn new(chunking: ChunkingConfig) -> Self {
        Self {
            entries: DashMap::new(),
            next_seq: AtomicU64::new(0),
            last_sync: RwLock::new(None),
            chunking,
        }
    }

    /// Ingest (or re-ingest) a document.
    ///
    /// Re-ingesting a filename whose raw text hashes the same is a no-op.
    /// A changed hash replaces the document and its entire chunk set in one
    /// atomic swap.
    pub fn ingest(&self, filename: &str, raw_text: &str) -> Result<IngestOutcome, IngestError> {
        if filename.trim().is_empty() {
            return Err(IngestError::EmptyFilename);
        }

        let hash = content_hash(raw_text);
        if let Some(existing) = self.entries.get(filename) {
            if existing.document.hash == hash {
                return Ok(IngestOutcome::Unchanged);
            }
        }

        let text = normalize_whitespace(raw_text);
        if text.is_empty() {
            return Err(IngestError::EmptyDocument {
                filename: filename.to_string(),
            });
        }

        let chunks = chunk_document(filename, &text, &self.chunking);
        let chunk_count = chunks.len();
        let document = Document {
            filename: filename.to_string(),
            word_count: word_count(&text),
            char_count: char_len(&text),
            text,
            hash,
            ingested_at: Utc::now(),
        };

        // The hash is re-checked under the key lock: a concurrent ingest of
        // the same content may have landed while we were chunking.
        match self.entries.entry(filename.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().document.hash == document.hash {
                    return Ok(IngestOutcome::Unchanged);
                }
                occupied.insert(self.wrap(document, chunks));
                Ok(IngestOutcome::Updated {
                    chunks: chunk_count,
                })
            }
            Entry::Vacant(vacant) => {
                vacant.insert(self.wrap(document, chunks));
                Ok(IngestOutcome::Created {
                    chunks: chunk_count,
                })
            }
        }
    }

    /// Rebuild a document's chunk set from its stored text.
    ///
    /// Returns the new chunk count.
    pub fn reindex(&self, filename: &str) -> Result<usize, IngestError> {
        let current = self
            .entries
            .get(filename)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| IngestError::NotFound {
                filename: filename.to_string(),
            })?;

        let chunks = chunk_document(filename, &current.document.text, &self.chunking);
        let chunk_count = chunks.len();

        match self.entries.entry(filename.to_string()) {
            Entry::Occupied(mut occupied) => {
                // Only swap if nobody replaced the document meanwhile.
                if occupied.get().document.hash == current.document.hash {
                    let document = current.document.clone();
                    occupied.insert(Arc::new(IndexedDocument {
                        seq: current.seq,
                        document,
                        chunks,
                    }));
                }
                Ok(chunk_count)
            }
            Entry::Vacant(_) => Err(IngestError::NotFound {
                filename: filename.to_string(),
            }),
        }
    }

    /// Consistent view of every indexed document, in ingestion order.
    ///
    /// Each entry is an `Arc` clone, so the snapshot stays valid (and
    /// unchanged) while later ingestions replace documents in the map.
    pub fn snapshot(&self) -> Vec<Arc<IndexedDocument>> {
        let mut docs: Vec<Arc<IndexedDocument>> =
            self.entries.iter().map(|e| Arc::clone(e.value())).collect();
        docs.sort_by_key(|d| d.seq);
        docs
    }

    /// Current chunk set of one document.
    pub fn chunks_for(&self, filename: &str) -> Option<Vec<Chunk>> {
        self.entries.get(filename).map(|e| e.chunks.clone())
    }

    pub fn get_document(&self, filename: &str) -> Option<Document> {
        self.entries.get(filename).map(|e| e.document.clone())
    }

    pub fn list_documents(&self) -> Vec<DocumentListing> {
        self.snapshot()
            .iter()
            .map(|d| DocumentListing {
                filename: d.document.filename.clone(),
                word_count: d.document.word_count,
                ingested_at: d.document.ingested_at,
            })
            .collect()
    }

    pub fn document_summary(&self, filename: &str) -> Option<DocumentSummary> {
        let entry = self.entries.get(filename)?;
        let doc = &entry.document;
        let preview = if doc.char_count > PREVIEW_CHARS {
            format!("{}...", take_chars(&doc.text, PREVIEW_CHARS))
        } else {
            doc.text.clone()
        };
        Some(DocumentSummary {
            filename: doc.filename.clone(),
            word_count: doc.word_count,
            char_count: doc.char_count,
            chunk_count: entry.chunks.len(),
            preview,
            ingested_at: doc.ingested_at,
        })
    }

    pub fn stats(&self) -> IndexStats {
        let snapshot = self.snapshot();
        IndexStats {
            total_documents: snapshot.len(),
            total_chunks: snapshot.iter().map(|d| d.chunks.len()).sum(),
            last_sync: self.last_sync(),
        }
    }

    pub fn mark_synced(&self, at: DateTime<Utc>) {
        let mut guard = self.last_sync.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(at);
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        *self.last_sync.read().unwrap_or_else(|e| e.into_inner())
    }

    fn wrap(&self, document: Document, chunks: Vec<Chunk>) -> Arc<IndexedDocument> {
        Arc::new(IndexedDocument {
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            document,
            chunks,
        })
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new(ChunkingConfig::default())
    }
}

fn content_hash(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}
