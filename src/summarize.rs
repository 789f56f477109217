//! Query-focused excerpting with a hard character budget.
//!
//! [`summarize`] picks the sentences of a chunk that mention the query terms,
//! keeps them in document order, and guarantees the result never exceeds the
//! budget. [`clean_excerpt`] strips heading-like lines from any excerpt
//! before it is shown.
//!
//! Budgets count characters, not bytes.

use crate::text::{bare_words, char_len, is_all_upper, is_stopword, split_sentences, take_chars};

/// Chunks shorter than this are never condensed, only length-capped.
const CONDENSE_MIN_CHARS: usize = 200;

const ELLIPSIS: &str = "...";

/// A sentence with its position in the source and its query score.
#[derive(Debug, Clone, Copy)]
struct Scored<'a> {
    pos: usize,
    score: usize,
    text: &'a str,
}

/// Produce an excerpt of `text` relevant to `query`, at most `budget`
/// characters long.
///
/// 1. Without a query, or for text under 200 characters, the whole text is
///    the candidate.
/// 2. Otherwise the `max_sentences` best-scoring sentences are kept, in
///    their original order. If none mentions a query term, the first
///    `max_sentences` sentences are used.
/// 3. An over-budget candidate is rebuilt from whole sentences, best first,
///    and ends with `...`. Only when no sentence fits is it cut mid-sentence.
pub fn summarize(text: &str, query: Option<&str>, budget: usize, max_sentences: usize) -> String {
    let terms = query.map(query_terms).unwrap_or_default();
    let has_query = query.is_some_and(|q| !q.trim().is_empty());

    let candidate = if !has_query || char_len(text) < CONDENSE_MIN_CHARS {
        text.trim().to_string()
    } else {
        select_sentences(text, &terms, max_sentences)
    };

    enforce_budget(&candidate, &terms, budget)
}

/// Strip blank lines, lines starting with `WELCOME`, and all-caps lines;
/// then drop a leading "Welcome to …" or "Introduction …" line when more
/// lines follow it.
///
/// Returns the trimmed input unchanged if cleaning would leave nothing.
pub fn clean_excerpt(text: &str) -> String {
    let kept: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("WELCOME") && !is_all_upper(line))
        .collect();

    let mut lines = kept.as_slice();
    if lines.len() > 1 {
        let first = lines[0].to_lowercase();
        if first.starts_with("welcome to") || first.starts_with("introduction") {
            lines = &lines[1..];
        }
    }

    let cleaned = lines.join("\n").trim().to_string();
    if cleaned.is_empty() {
        text.trim().to_string()
    } else {
        cleaned
    }
}

/// Lowercase query words with punctuation and stopwords removed.
fn query_terms(query: &str) -> Vec<String> {
    let lower = query.to_lowercase();
    bare_words(&lower)
        .into_iter()
        .filter(|w| !is_stopword(w))
        .map(str::to_string)
        .collect()
}

/// Number of query terms occurring in the sentence.
fn sentence_score(sentence: &str, terms: &[String]) -> usize {
    let lower = sentence.to_lowercase();
    terms.iter().filter(|t| lower.contains(t.as_str())).count()
}

fn score_sentences<'a>(text: &'a str, terms: &[String]) -> Vec<Scored<'a>> {
    split_sentences(text)
        .into_iter()
        .enumerate()
        .map(|(pos, text)| Scored {
            pos,
            score: sentence_score(text, terms),
            text,
        })
        .collect()
}

/// Best-scoring first; ties keep document order.
fn by_relevance<'a>(sentences: &[Scored<'a>]) -> Vec<Scored<'a>> {
    let mut ranked = sentences.to_vec();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

fn join_in_order(mut picked: Vec<Scored<'_>>) -> String {
    picked.sort_by_key(|s| s.pos);
    picked.iter().map(|s| s.text).collect::<Vec<_>>().join(" ")
}

fn select_sentences(text: &str, terms: &[String], max_sentences: usize) -> String {
    let sentences = score_sentences(text, terms);
    let relevant: Vec<Scored<'_>> = by_relevance(&sentences)
        .into_iter()
        .filter(|s| s.score > 0)
        .take(max_sentences)
        .collect();

    if relevant.is_empty() {
        return sentences
            .iter()
            .take(max_sentences)
            .map(|s| s.text)
            .collect::<Vec<_>>()
            .join(" ");
    }
    join_in_order(relevant)
}

fn enforce_budget(candidate: &str, terms: &[String], budget: usize) -> String {
    if char_len(candidate) <= budget {
        return candidate.to_string();
    }
    if budget <= ELLIPSIS.len() {
        return take_chars(candidate, budget).to_string();
    }
    let room = budget - ELLIPSIS.len();

    let sentences = score_sentences(candidate, terms);
    let any_relevant = sentences.iter().any(|s| s.score > 0);
    let pool: Vec<Scored<'_>> = by_relevance(&sentences)
        .into_iter()
        .filter(|s| !any_relevant || s.score > 0)
        .collect();

    let mut picked = Vec::new();
    let mut used = 0usize;
    for sentence in pool {
        let len = char_len(sentence.text);
        let needed = if picked.is_empty() { len } else { used + 1 + len };
        if needed <= room {
            used = needed;
            picked.push(sentence);
        }
    }

    if picked.is_empty() {
        return format!("{}{}", take_chars(candidate, room).trim_end(), ELLIPSIS);
    }
    format!("{}{}", join_in_order(picked), ELLIPSIS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PARK_TEXT: &str = "Namibia has many parks. The desert is vast and dry. \
        Etosha is home to lions and elephants. Tourists visit in winter. \
        The salt pan of Etosha shines white. Roads are mostly gravel.";

    #[test]
    fn test_short_text_returned_whole() {
        let text = "Etosha is a salt pan. It is large.";
        assert_eq!(summarize(text, Some("etosha"), 400, 3), text);
    }

    #[test]
    fn test_no_query_uses_full_text() {
        assert_eq!(summarize(PARK_TEXT, None, 400, 3), PARK_TEXT);
    }

    #[test]
    fn test_relevant_sentences_in_document_order() {
        let out = summarize(PARK_TEXT, Some("Where is Etosha?"), 400, 3);
        assert_eq!(
            out,
            "Etosha is home to lions and elephants. The salt pan of Etosha shines white."
        );
    }

    #[test]
    fn test_order_not_driven_by_score() {
        // The second relevant sentence scores higher but must stay second.
        let text = "Lions hunt at dusk near the river banks. Nothing else happens. \
            Nothing else happens here at all either. Lions and elephants drink together at the waterhole.";
        let out = summarize(text, Some("lions elephants"), 400, 3);
        assert!(out.starts_with("Lions hunt at dusk"));
        assert!(out.ends_with("drink together at the waterhole."));
    }

    #[test]
    fn test_fallback_to_leading_sentences() {
        let out = summarize(PARK_TEXT, Some("submarine"), 400, 3);
        assert_eq!(
            out,
            "Namibia has many parks. The desert is vast and dry. Etosha is home to lions and elephants."
        );
    }

    #[test]
    fn test_budget_packs_whole_sentences() {
        let text = (0..20)
            .map(|i| format!("Sentence number {} talks about the dunes of the desert.", i))
            .collect::<Vec<_>>()
            .join(" ");
        let out = summarize(&text, None, 120, 3);
        assert!(char_len(&out) <= 120);
        assert!(out.ends_with("desert...."));
        assert!(out.starts_with("Sentence number 0 "));
    }

    #[test]
    fn test_budget_prefix_cut_as_last_resort() {
        let text = "word ".repeat(200);
        let out = summarize(text.trim(), None, 50, 3);
        assert!(char_len(&out) <= 50);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_clean_excerpt_strips_headings() {
        let raw = "WELCOME TO NAMIBIA\n\nWELCOME aboard\nIntroduction to parks\nEtosha is big.\nLIONS\nRoads are gravel.";
        assert_eq!(clean_excerpt(raw), "Etosha is big.\nRoads are gravel.");
    }

    #[test]
    fn test_clean_excerpt_keeps_single_line() {
        assert_eq!(clean_excerpt("Introduction to Etosha."), "Introduction to Etosha.");
    }

    #[test]
    fn test_clean_excerpt_keeps_mixed_case_welcome_sentence() {
        let raw = "Welcome to the Etosha travel guide for families. Lions gather at the waterholes.";
        assert_eq!(clean_excerpt(raw), raw);
    }

    #[test]
    fn test_clean_excerpt_never_empties_text() {
        assert_eq!(clean_excerpt("ETOSHA NATIONAL PARK"), "ETOSHA NATIONAL PARK");
        assert_eq!(clean_excerpt("WELCOME TO NAMIBIA\nLIONS"), "WELCOME TO NAMIBIA\nLIONS");
    }

    proptest! {
        #[test]
        fn prop_summarize_respects_budget(
            text in "[A-Za-z .!?]{0,900}",
            query in proptest::option::of("[a-z ]{0,30}"),
            budget in 20usize..600,
        ) {
            let out = summarize(&text, query.as_deref(), budget, 3);
            prop_assert!(char_len(&out) <= budget);
        }
    }
}
