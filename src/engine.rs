//! The dialogue engine: one value wiring the index, ranker, analyzer, and
//! crafter together behind the operations a transport calls.
//!
//! `Engine` is `Send + Sync`; share it behind an `Arc` and call it from as
//! many tasks as there are inbound messages.
//!
//! Search, summarization, intent analysis, and crafting never unwind out of
//! the engine. A panic inside one of them is logged and replaced by an empty
//! or neutral result.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::config::Config;
use crate::error::IngestError;
use crate::index::{IngestOutcome, KnowledgeBase};
use crate::intent::{IntentAnalysis, IntentAnalyzer};
use crate::models::ScoredChunk;
use crate::respond::{Category, ResponseCrafter};
use crate::search::{Ranker, SearchRequest};
use crate::summarize::{clean_excerpt, summarize};
use crate::text::take_chars;

/// Reply used when a fault escapes analysis, search, or crafting.
pub const FALLBACK_RESPONSE: &str =
    "Sorry, something went wrong while answering that. Could you try asking again? 🙏";

pub struct Engine {
    config: Config,
    kb: KnowledgeBase,
    ranker: Ranker,
    analyzer: IntentAnalyzer,
    crafter: ResponseCrafter,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        Self {
            kb: KnowledgeBase::new(config.chunking.clone()),
            ranker: Ranker::new(&config.retrieval.ignored_terms),
            analyzer: IntentAnalyzer::new(&config.dialogue),
            crafter: ResponseCrafter::new(&config.dialogue),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn ingest(&self, filename: &str, text: &str) -> Result<IngestOutcome, IngestError> {
        self.kb.ingest(filename, text)
    }

    /// Re-chunk a stored document. Returns the new chunk count.
    pub fn reindex(&self, filename: &str) -> Result<usize, IngestError> {
        self.kb.reindex(filename)
    }

    /// Ranked results with excerpts. `None` uses `retrieval.default_limit`.
    pub fn search(&self, query: &str, limit: Option<usize>) -> Vec<ScoredChunk> {
        self.run_search(query, limit, false)
    }

    /// Like [`search`](Self::search), with a per-signal score breakdown on
    /// every result.
    pub fn search_explained(&self, query: &str, limit: Option<usize>) -> Vec<ScoredChunk> {
        self.run_search(query, limit, true)
    }

    fn run_search(&self, query: &str, limit: Option<usize>, explain: bool) -> Vec<ScoredChunk> {
        let req = SearchRequest {
            query,
            limit: limit.unwrap_or(self.config.retrieval.default_limit),
            excerpt_budget: self.config.summarizer.search_budget,
            max_sentences: self.config.summarizer.max_sentences,
            explain,
        };
        guarded("search", Vec::new, || self.ranker.search(&self.kb, &req))
    }

    /// Standalone summarization with the standalone character budget.
    pub fn summarize(&self, text: &str, query: Option<&str>) -> String {
        let summarizer = &self.config.summarizer;
        guarded(
            "summarize",
            || take_chars(text.trim(), summarizer.standalone_budget).to_string(),
            || {
                let excerpt = summarize(
                    text,
                    query,
                    summarizer.standalone_budget,
                    summarizer.max_sentences,
                );
                clean_excerpt(&excerpt)
            },
        )
    }

    pub fn analyze_intent(&self, message: &str, user_id: &str) -> IntentAnalysis {
        guarded("analyze_intent", IntentAnalysis::unknown, || {
            self.analyzer.analyze(message, user_id)
        })
    }

    pub fn craft_response(
        &self,
        message: &str,
        analysis: &IntentAnalysis,
        results: &[ScoredChunk],
        category: Category,
    ) -> String {
        guarded(
            "craft_response",
            || FALLBACK_RESPONSE.to_string(),
            || self.crafter.craft(message, analysis, results, category),
        )
    }

    /// Search, analyze, and craft in one call. Never panics: a fault in any
    /// stage is logged and answered with [`FALLBACK_RESPONSE`].
    pub fn respond(&self, message: &str, user_id: &str, category: Category) -> String {
        guarded(
            "respond",
            || FALLBACK_RESPONSE.to_string(),
            || {
                let results = self.search(message, None);
                let analysis = self.analyze_intent(message, user_id);
                self.craft_response(message, &analysis, &results, category)
            },
        )
    }
}

/// Run `op`, replacing a panic with `fallback()`.
fn guarded<T>(operation: &str, fallback: impl FnOnce() -> T, op: impl FnOnce() -> T) -> T {
    match catch_unwind(AssertUnwindSafe(op)) {
        Ok(value) => value,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown".to_string());
            tracing::error!(operation, reason = %reason, "engine operation failed");
            fallback()
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ETOSHA: &str = "Etosha National Park is in northern Namibia and covers a vast salt pan. \
        Lions, elephants and rhinos gather at its waterholes during the dry season. \
        Visitors can drive themselves on gravel roads between the rest camps.";

    fn engine() -> Engine {
        let mut config = Config::default();
        config.dialogue.seed = Some(1);
        Engine::new(config)
    }

    #[test]
    fn test_search_uses_default_limit() {
        let e = engine();
        for i in 0..4 {
            e.ingest(&format!("etosha{}.txt", i), &format!("{} Copy {} of the guide describes the same park in the same words.", ETOSHA, i))
                .unwrap();
        }
        assert_eq!(e.search("etosha lions", None).len(), 2);
        assert_eq!(e.search("etosha lions", Some(5)).len(), 5);
    }

    #[test]
    fn test_search_explained_carries_breakdown() {
        let e = engine();
        e.ingest("etosha.txt", ETOSHA).unwrap();
        let hits = e.search_explained("etosha", None);
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|h| h.explain.is_some()));
        assert!(e.search("etosha", None).iter().all(|h| h.explain.is_none()));
    }

    #[test]
    fn test_summarize_standalone_budget() {
        let e = engine();
        let long = ETOSHA.repeat(5);
        assert!(crate::text::char_len(&e.summarize(&long, Some("lions"))) <= 400);
    }

    #[test]
    fn test_guarded_replaces_panic_with_fallback() {
        let value = guarded("search", Vec::<ScoredChunk>::new, || panic!("index poisoned"));
        assert!(value.is_empty());

        let reply = guarded(
            "respond",
            || FALLBACK_RESPONSE.to_string(),
            || -> String { panic!("{}", String::from("template missing")) },
        );
        assert_eq!(reply, FALLBACK_RESPONSE);

        assert_eq!(guarded("summarize", String::new, || "ok".to_string()), "ok");
    }

    #[test]
    fn test_unknown_analysis_asks_for_clarification() {
        let e = engine();
        let reply = e.craft_response("???", &IntentAnalysis::unknown(), &[], Category::Search);
        assert!(reply.contains('?'));
        assert_ne!(reply, FALLBACK_RESPONSE);
    }

    #[test]
    fn test_respond_low_engagement() {
        let e = engine();
        e.ingest("etosha.txt", ETOSHA).unwrap();
        let reply = e.respond("ok", "u1", Category::Search);
        assert!(reply.starts_with("👍"));
    }

    #[test]
    fn test_respond_answers_from_index() {
        let e = engine();
        e.ingest("etosha_park.txt", ETOSHA).unwrap();
        let reply = e.respond("Which animals live in Etosha?", "u1", Category::Search);
        assert!(reply.contains("*Etosha Park*"));
        assert!(reply.contains("Etosha"));
    }
}
