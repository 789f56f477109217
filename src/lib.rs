//! # ragchat
//!
//! Retrieval-augmented dialogue over a small corpus of plain-text documents.
//!
//! Documents are split into topical chunks, ranked against user questions
//! with additive lexical signals, condensed into bounded excerpts, and
//! wrapped in a reply whose framing depends on the user's intent, tone,
//! emotion, and engagement.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Connectors  │──▶│   Chunker    │──▶│ KnowledgeBase │
//! │ (FS/custom) │   │ + summary    │   │  (DashMap)    │
//! └─────────────┘   └──────────────┘   └──────┬───────┘
//!                                             │ snapshot
//!        message ──▶ IntentAnalyzer           ▼
//!                        │              Ranker + Summarizer
//!                        └────────┬───────────┘
//!                                 ▼
//!                          ResponseCrafter ──▶ reply
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use ragchat::engine::Engine;
//! use ragchat::respond::Category;
//!
//! let engine = Engine::default();
//! engine
//!     .ingest(
//!         "etosha.txt",
//!         "Etosha National Park is in northern Namibia and surrounds a huge salt pan. \
//!          Lions, elephants and rhinos gather at its waterholes in the dry season. \
//!          Rest camps inside the park offer floodlit waterholes for night viewing.",
//!     )
//!     .unwrap();
//!
//! let hits = engine.search("where is etosha", None);
//! assert!(hits[0].score >= 1000);
//!
//! let reply = engine.respond("ok", "user-1", Category::Search);
//! assert!(!reply.is_empty());
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`text`] | Tokenizing and sentence helpers |
//! | [`chunk`] | Topic-boundary chunking |
//! | [`index`] | Concurrent document and chunk store |
//! | [`search`] | Query normalization and ranking |
//! | [`summarize`] | Query-focused excerpts |
//! | [`intent`] | Intent, tone, emotion, engagement, repeats |
//! | [`respond`] | Response strategies and templates |
//! | [`engine`] | Operations facade |
//! | [`traits`] | Connector extension point |
//! | [`connector_fs`] | Filesystem connector |
//! | [`ingest`] | Sync orchestration |
//! | [`stats`] | CLI rendering of stats and reports |

pub mod chunk;
pub mod config;
pub mod connector_fs;
pub mod engine;
pub mod error;
pub mod index;
pub mod ingest;
pub mod intent;
pub mod models;
pub mod respond;
pub mod search;
pub mod stats;
pub mod summarize;
pub mod text;
pub mod traits;
