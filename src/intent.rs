//! Message classification: intent, tone, emotion, engagement, and
//! per-user repeat detection.
//!
//! Each classification is an ordered table of `(outcome, predicate)` pairs;
//! the first predicate that matches decides the outcome. Marker lists are
//! matched against the lowercase message. A single-word marker must match a
//! whole word ("hi" does not fire on "this"), while multi-word or punctuation
//! markers ("can't wait", "...") match as substrings.
//!
//! The analyzer keeps a short message history per user in a [`DashMap`], so
//! analyses for different users never contend on the same lock.

use std::collections::{HashSet, VecDeque};

use dashmap::DashMap;
use serde::Serialize;

use crate::config::DialogueConfig;
use crate::text::{bare_words, is_all_upper, WH_WORDS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    InformationSeeking,
    Comparison,
    Recommendation,
    ProblemSolving,
    Social,
    Feedback,
    GeneralQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    VeryEnthusiastic,
    Enthusiastic,
    Casual,
    Frustrated,
    Uncertain,
    Formal,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Excited,
    Frustrated,
    Confused,
    Curious,
    Satisfied,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Engagement {
    Low,
    Medium,
    High,
}

/// Everything the response crafter needs to know about a message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentAnalysis {
    pub intent: Intent,
    pub tone: Tone,
    pub emotion: Emotion,
    /// How well the message is understood, in `[0, 1]`.
    pub confidence: f64,
    pub is_vague: bool,
    pub needs_clarification: bool,
    pub is_repeat: bool,
    pub engagement: Engagement,
}

impl IntentAnalysis {
    /// Neutral analysis with zero confidence, used when a message could not
    /// be analyzed. It steers the crafter toward asking for clarification.
    pub fn unknown() -> Self {
        Self {
            intent: Intent::GeneralQuery,
            tone: Tone::Neutral,
            emotion: Emotion::Neutral,
            confidence: 0.0,
            is_vague: false,
            needs_clarification: true,
            is_repeat: false,
            engagement: Engagement::Medium,
        }
    }
}

const ENTHUSIASM_MARKERS: &[&str] = &["!", "wow", "amazing", "awesome", "love"];
const CASUAL_MARKERS: &[&str] = &["lol", "haha", "hey", "sup", "cool", "nice"];
const IMPATIENCE_MARKERS: &[&str] = &["why not", "still", "again", "ugh", "seriously"];
const HEDGING_MARKERS: &[&str] = &["maybe", "hmm", "idk", "not sure", "..."];
const POLITENESS_MARKERS: &[&str] = &["please", "could you", "would you", "kindly"];

const EXCITEMENT_MARKERS: &[&str] = &["excited", "can't wait", "amazing", "wonderful"];
const FRUSTRATION_MARKERS: &[&str] = &["frustrated", "annoying", "disappointed", "tired of"];
const CONFUSION_MARKERS: &[&str] = &["confused", "don't understand", "what do you mean", "huh"];
const SATISFACTION_MARKERS: &[&str] = &["thanks", "thank you", "perfect", "great", "helped"];

const COMPARISON_MARKERS: &[&str] = &[
    "vs",
    "versus",
    "compared to",
    "better than",
    "difference between",
];
const RECOMMENDATION_MARKERS: &[&str] = &["recommend", "suggest", "best", "should i", "which one"];
const PROBLEM_MARKERS: &[&str] = &["problem", "issue", "doesn't work", "not working", "help"];
const GREETING_MARKERS: &[&str] = &["hi", "hello", "hey", "what's up", "how are you"];
const ACKNOWLEDGMENT_MARKERS: &[&str] = &["lol", "hmm", "ok", "i see", "alright", "got it"];

const VAGUE_REFERENTS: &[&str] = &["stuff", "things", "something", "anything", "whatever"];
const AMBIGUOUS_REFERENTS: &[&str] = &["stuff", "things", "something", "it", "there", "that"];

/// Whole-message acknowledgments that signal low effort.
pub const LOW_EFFORT_REPLIES: &[&str] = &["ok", "k", "okay", "alright", "hmm", "hm", "umm", "whatever"];

const BASE_CONFIDENCE: f64 = 0.8;
const CLEAR_QUESTION_BOOST: f64 = 0.1;
const VAGUE_REFERENT_PENALTY: f64 = 0.3;
const SHORT_MESSAGE_PENALTY: f64 = 0.2;
const DOMAIN_TERM_BOOST: f64 = 0.1;
const SHORT_MESSAGE_WORDS: usize = 2;
const HIGH_ENGAGEMENT_WORDS: usize = 10;

/// Pre-computed forms of one message shared by all predicates.
struct MessageView<'a> {
    original: &'a str,
    lower: String,
    /// Lowercase words with surrounding punctuation trimmed.
    words: Vec<String>,
    word_count: usize,
}

impl<'a> MessageView<'a> {
    fn new(message: &'a str) -> Self {
        let lower = message.trim().to_lowercase();
        let words = bare_words(&lower).into_iter().map(str::to_string).collect();
        Self {
            original: message,
            word_count: message.split_whitespace().count(),
            lower,
            words,
        }
    }

    fn has(&self, marker: &str) -> bool {
        let single_word = marker
            .chars()
            .all(|c| c.is_alphanumeric() || c == '\'');
        if single_word {
            self.words.iter().any(|w| w == marker)
        } else {
            self.lower.contains(marker)
        }
    }

    fn has_any(&self, markers: &[&str]) -> bool {
        markers.iter().any(|m| self.has(m))
    }

    fn has_question_mark(&self) -> bool {
        self.lower.contains('?')
    }

    fn has_wh_word(&self) -> bool {
        self.words.iter().any(|w| WH_WORDS.contains(&w.as_str()))
    }
}

type Rule<T> = (T, fn(&MessageView<'_>) -> bool);

const TONE_RULES: &[Rule<Tone>] = &[
    (Tone::VeryEnthusiastic, very_enthusiastic),
    (Tone::Enthusiastic, |m| m.has_any(ENTHUSIASM_MARKERS)),
    (Tone::Casual, |m| m.has_any(CASUAL_MARKERS)),
    (Tone::Frustrated, |m| m.has_any(IMPATIENCE_MARKERS)),
    (Tone::Uncertain, |m| m.has_any(HEDGING_MARKERS)),
    (Tone::Formal, |m| m.has_any(POLITENESS_MARKERS)),
];

const EMOTION_RULES: &[Rule<Emotion>] = &[
    (Emotion::Excited, |m| m.has_any(EXCITEMENT_MARKERS)),
    (Emotion::Frustrated, |m| m.has_any(FRUSTRATION_MARKERS)),
    (Emotion::Confused, |m| m.has_any(CONFUSION_MARKERS)),
    (Emotion::Curious, |m| m.has_question_mark() && m.has_wh_word()),
    (Emotion::Satisfied, |m| m.has_any(SATISFACTION_MARKERS)),
];

const INTENT_RULES: &[Rule<Intent>] = &[
    (Intent::InformationSeeking, information_seeking),
    (Intent::Comparison, |m| m.has_any(COMPARISON_MARKERS)),
    (Intent::Recommendation, |m| m.has_any(RECOMMENDATION_MARKERS)),
    (Intent::ProblemSolving, |m| m.has_any(PROBLEM_MARKERS)),
    (Intent::Social, |m| m.has_any(GREETING_MARKERS)),
    (Intent::Feedback, |m| m.has_any(ACKNOWLEDGMENT_MARKERS)),
];

fn very_enthusiastic(m: &MessageView<'_>) -> bool {
    m.has_any(ENTHUSIASM_MARKERS)
        && (m.original.matches('!').count() >= 2 || is_all_upper(m.original))
}

fn information_seeking(m: &MessageView<'_>) -> bool {
    m.has_question_mark()
        || m.words
            .first()
            .is_some_and(|w| WH_WORDS.contains(&w.as_str()))
}

fn first_match<T: Copy>(rules: &[Rule<T>], message: &MessageView<'_>, fallback: T) -> T {
    rules
        .iter()
        .find(|(_, matches)| matches(message))
        .map(|(outcome, _)| *outcome)
        .unwrap_or(fallback)
}

/// Lowercase whitespace-split token set.
fn token_set(message: &str) -> HashSet<String> {
    message.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// Shared tokens over total distinct tokens; 0 when either side is empty.
pub fn jaccard(a: &str, b: &str) -> f64 {
    let a = token_set(a);
    let b = token_set(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(&b).count();
    let total = a.union(&b).count();
    shared as f64 / total as f64
}

/// Stateful analyzer: classification is pure, repeat detection reads and
/// extends the caller's history.
#[derive(Debug)]
pub struct IntentAnalyzer {
    history: DashMap<String, VecDeque<String>>,
    domain_terms: Vec<String>,
    vague_phrases: Vec<String>,
    history_size: usize,
    repeat_window: usize,
    repeat_threshold: f64,
}

impl IntentAnalyzer {
    pub fn new(config: &DialogueConfig) -> Self {
        Self {
            history: DashMap::new(),
            domain_terms: config.domain_terms.iter().map(|t| t.to_lowercase()).collect(),
            vague_phrases: config.expanded_vague_phrases(),
            history_size: config.history_size,
            repeat_window: config.repeat_window,
            repeat_threshold: config.repeat_threshold,
        }
    }

    /// Classify `message` and record it in `user_id`'s history.
    pub fn analyze(&self, message: &str, user_id: &str) -> IntentAnalysis {
        let view = MessageView::new(message);
        let intent = first_match(INTENT_RULES, &view, Intent::GeneralQuery);

        let analysis = IntentAnalysis {
            intent,
            tone: first_match(TONE_RULES, &view, Tone::Neutral),
            emotion: first_match(EMOTION_RULES, &view, Emotion::Neutral),
            confidence: self.confidence(&view, intent),
            is_vague: self.is_vague(&view),
            needs_clarification: needs_clarification(&view),
            is_repeat: self.check_and_record(user_id, message),
            engagement: engagement(&view),
        };

        tracing::debug!(
            user = user_id,
            intent = ?analysis.intent,
            tone = ?analysis.tone,
            emotion = ?analysis.emotion,
            confidence = analysis.confidence,
            repeat = analysis.is_repeat,
            "message analyzed"
        );
        analysis
    }

    /// Stored messages for a user, oldest first.
    #[cfg(test)]
    fn history(&self, user_id: &str) -> Vec<String> {
        self.history
            .get(user_id)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn confidence(&self, m: &MessageView<'_>, intent: Intent) -> f64 {
        let mut confidence = BASE_CONFIDENCE;
        if m.has_question_mark() && intent == Intent::InformationSeeking {
            confidence += CLEAR_QUESTION_BOOST;
        }
        if m.has_any(VAGUE_REFERENTS) {
            confidence -= VAGUE_REFERENT_PENALTY;
        }
        if m.word_count <= SHORT_MESSAGE_WORDS {
            confidence -= SHORT_MESSAGE_PENALTY;
        }
        if self.domain_terms.iter().any(|t| m.lower.contains(t.as_str())) {
            confidence += DOMAIN_TERM_BOOST;
        }
        confidence.clamp(0.0, 1.0)
    }

    fn is_vague(&self, m: &MessageView<'_>) -> bool {
        (m.word_count <= SHORT_MESSAGE_WORDS && m.has_question_mark())
            || self.vague_phrases.iter().any(|p| m.lower.contains(p.as_str()))
    }

    /// Compare against the last few messages, then append. The entry guard
    /// is held across both steps so concurrent messages from one user
    /// serialize.
    fn check_and_record(&self, user_id: &str, message: &str) -> bool {
        let mut history = self.history.entry(user_id.to_string()).or_default();
        let is_repeat = history
            .iter()
            .rev()
            .take(self.repeat_window)
            .any(|prev| jaccard(prev, message) > self.repeat_threshold);

        history.push_back(message.to_string());
        while history.len() > self.history_size {
            history.pop_front();
        }
        is_repeat
    }
}

fn needs_clarification(m: &MessageView<'_>) -> bool {
    m.words
        .iter()
        .any(|w| AMBIGUOUS_REFERENTS.contains(&w.as_str()))
        || m.lower.matches('?').count() > 1
}

fn engagement(m: &MessageView<'_>) -> Engagement {
    let reply = m.lower.trim_matches(|c: char| !c.is_alphanumeric());
    if LOW_EFFORT_REPLIES.contains(&reply) {
        Engagement::Low
    } else if m.word_count > HIGH_ENGAGEMENT_WORDS || m.lower.contains('!') {
        Engagement::High
    } else {
        Engagement::Medium
    }
}
