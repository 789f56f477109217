use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub dialogue: DialogueConfig,
    #[serde(default)]
    pub connectors: ConnectorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_target_words")]
    pub target_words: usize,
    #[serde(default = "default_min_heading_flush_words")]
    pub min_heading_flush_words: usize,
    #[serde(default = "default_min_trailing_words")]
    pub min_trailing_words: usize,
    #[serde(default = "default_summary_chars")]
    pub summary_chars: usize,
    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_words: default_target_words(),
            min_heading_flush_words: default_min_heading_flush_words(),
            min_trailing_words: default_min_trailing_words(),
            summary_chars: default_summary_chars(),
            max_keywords: default_max_keywords(),
        }
    }
}

fn default_target_words() -> usize {
    300
}
fn default_min_heading_flush_words() -> usize {
    50
}
fn default_min_trailing_words() -> usize {
    30
}
fn default_summary_chars() -> usize {
    500
}
fn default_max_keywords() -> usize {
    15
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Bot and topic names stripped from queries before scoring.
    #[serde(default = "default_ignored_terms")]
    pub ignored_terms: Vec<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            ignored_terms: default_ignored_terms(),
        }
    }
}

fn default_limit() -> usize {
    2
}
fn default_ignored_terms() -> Vec<String> {
    ["eva", "bot", "namibia", "namibian"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummarizerConfig {
    /// Excerpt budget (chars) for search results.
    #[serde(default = "default_search_budget")]
    pub search_budget: usize,
    /// Excerpt budget (chars) for standalone summarization.
    #[serde(default = "default_standalone_budget")]
    pub standalone_budget: usize,
    #[serde(default = "default_max_sentences")]
    pub max_sentences: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            search_budget: default_search_budget(),
            standalone_budget: default_standalone_budget(),
            max_sentences: default_max_sentences(),
        }
    }
}

fn default_search_budget() -> usize {
    500
}
fn default_standalone_budget() -> usize {
    400
}
fn default_max_sentences() -> usize {
    3
}

/// Smallest excerpt budget accepted by validation.
pub const MIN_BUDGET: usize = 20;

#[derive(Debug, Deserialize, Clone)]
pub struct DialogueConfig {
    /// Subject the assistant talks about; substituted into templates.
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Place and topic names that raise confidence when mentioned.
    #[serde(default = "default_domain_terms")]
    pub domain_terms: Vec<String>,
    /// Generic-query phrases that mark a message as vague. `{topic}` is
    /// replaced with the lowercase topic.
    #[serde(default = "default_vague_phrases")]
    pub vague_phrases: Vec<String>,
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    #[serde(default = "default_repeat_window")]
    pub repeat_window: usize,
    #[serde(default = "default_repeat_threshold")]
    pub repeat_threshold: f64,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// Fixed seed for template selection. Unset means OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            domain_terms: default_domain_terms(),
            vague_phrases: default_vague_phrases(),
            history_size: default_history_size(),
            repeat_window: default_repeat_window(),
            repeat_threshold: default_repeat_threshold(),
            confidence_threshold: default_confidence_threshold(),
            seed: None,
        }
    }
}

fn default_topic() -> String {
    "Namibia".to_string()
}
fn default_domain_terms() -> Vec<String> {
    [
        "namibia",
        "etosha",
        "windhoek",
        "sossusvlei",
        "swakopmund",
        "himba",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_vague_phrases() -> Vec<String> {
    [
        "tell me about {topic}",
        "what about {topic}",
        "anything about",
        "everything about",
        "info about",
        "stuff about",
        "things about",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_history_size() -> usize {
    5
}
fn default_repeat_window() -> usize {
    3
}
fn default_repeat_threshold() -> f64 {
    0.6
}
fn default_confidence_threshold() -> f64 {
    0.7
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConnectorsConfig {
    pub filesystem: Option<FilesystemConnectorConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilesystemConnectorConfig {
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.md".to_string(), "**/*.txt".to_string()]
}

impl DialogueConfig {
    /// Vague phrases with `{topic}` expanded, all lowercase.
    pub fn expanded_vague_phrases(&self) -> Vec<String> {
        let topic = self.topic.to_lowercase();
        self.vague_phrases
            .iter()
            .map(|p| p.replace("{topic}", &topic).to_lowercase())
            .collect()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load the config at `path` if it exists, otherwise fall back to defaults.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate chunking
    let chunking = &config.chunking;
    if chunking.target_words == 0 {
        anyhow::bail!("chunking.target_words must be > 0");
    }
    if chunking.min_heading_flush_words == 0 {
        anyhow::bail!("chunking.min_heading_flush_words must be > 0");
    }
    if chunking.min_trailing_words == 0 {
        anyhow::bail!("chunking.min_trailing_words must be > 0");
    }
    if chunking.min_heading_flush_words > chunking.target_words {
        anyhow::bail!("chunking.min_heading_flush_words must be <= chunking.target_words");
    }
    if chunking.summary_chars < MIN_BUDGET {
        anyhow::bail!("chunking.summary_chars must be >= {}", MIN_BUDGET);
    }
    if chunking.max_keywords == 0 {
        anyhow::bail!("chunking.max_keywords must be > 0");
    }

    // Validate retrieval
    if config.retrieval.default_limit < 1 {
        anyhow::bail!("retrieval.default_limit must be >= 1");
    }

    // Validate summarizer
    let summarizer = &config.summarizer;
    if summarizer.search_budget < MIN_BUDGET || summarizer.standalone_budget < MIN_BUDGET {
        anyhow::bail!("summarizer budgets must be >= {}", MIN_BUDGET);
    }
    if summarizer.max_sentences == 0 {
        anyhow::bail!("summarizer.max_sentences must be > 0");
    }

    // Validate dialogue
    let dialogue = &config.dialogue;
    if dialogue.history_size == 0 {
        anyhow::bail!("dialogue.history_size must be > 0");
    }
    if dialogue.repeat_window > dialogue.history_size {
        anyhow::bail!("dialogue.repeat_window must be <= dialogue.history_size");
    }
    if !(0.0..=1.0).contains(&dialogue.repeat_threshold) {
        anyhow::bail!("dialogue.repeat_threshold must be in [0.0, 1.0]");
    }
    if !(0.0..=1.0).contains(&dialogue.confidence_threshold) {
        anyhow::bail!("dialogue.confidence_threshold must be in [0.0, 1.0]");
    }

    Ok(())
}
