//! # ragchat CLI
//!
//! Index a directory of text documents and talk to it.
//!
//! ## Usage
//!
//! ```bash
//! ragchat --config ./config/ragchat.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ragchat sync [connector]` | Scan connectors (`all`, or one by label or name) and report what changed |
//! | `ragchat search "<query>"` | Ranked excerpts for a query |
//! | `ragchat summarize <file>` | Standalone summary of a text file |
//! | `ragchat analyze "<message>"` | Intent/tone/emotion analysis as JSON |
//! | `ragchat chat` | Answer messages read line by line from stdin |
//! | `ragchat stats` | Document and chunk counts |
//! | `ragchat list` | Indexed documents |
//! | `ragchat show <filename>` | One document's overview |
//!
//! The index lives in memory, so every command that reads it syncs first.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use ragchat::config::{self, Config};
use ragchat::engine::Engine;
use ragchat::ingest::{run_sync, SyncReport};
use ragchat::models::ScoredChunk;
use ragchat::respond::Category;
use ragchat::stats;
use ragchat::traits::{Connector, ConnectorRegistry};

/// ragchat: retrieval-augmented answers over a folder of documents.
#[derive(Parser)]
#[command(name = "ragchat", version, about)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply when it is missing.
    #[arg(long, global = true, default_value = "./config/ragchat.toml")]
    config: PathBuf,

    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan configured connectors and ingest their documents.
    Sync {
        /// `all`, or a connector label (`filesystem:docs`) or name (`docs`).
        #[arg(default_value = "all")]
        connector: String,
    },

    /// Search the indexed documents.
    Search {
        query: String,

        /// Maximum results (defaults to `retrieval.default_limit`).
        #[arg(long)]
        limit: Option<usize>,

        /// Show the per-signal score breakdown.
        #[arg(long)]
        explain: bool,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Summarize a text file, optionally focused on a query.
    Summarize {
        file: PathBuf,

        #[arg(long)]
        query: Option<String>,
    },

    /// Analyze a single message and print the result as JSON.
    Analyze {
        message: String,

        #[arg(long, default_value = "cli")]
        user: String,
    },

    /// Read messages from stdin, one per line, and print replies.
    Chat {
        #[arg(long, default_value = "cli")]
        user: String,

        /// Result category: search, document, or knowledge.
        #[arg(long, default_value = "search")]
        category: Category,
    },

    /// Print index statistics.
    Stats,

    /// List indexed documents.
    List,

    /// Show one document's overview.
    Show { filename: String },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Sync { connector } => {
            let engine = Arc::new(Engine::new(cfg));
            for report in sync_connectors(&engine, &connector).await? {
                print!("{}", stats::render_sync_report(&report));
            }
        }
        Commands::Search {
            query,
            limit,
            explain,
            json,
        } => {
            let engine = synced_engine(cfg).await?;
            let results = if explain {
                engine.search_explained(&query, limit)
            } else {
                engine.search(&query, limit)
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print_results(&query, &results);
            }
        }
        Commands::Summarize { file, query } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let engine = Engine::new(cfg);
            println!("{}", engine.summarize(&text, query.as_deref()));
        }
        Commands::Analyze { message, user } => {
            let engine = Engine::new(cfg);
            let analysis = engine.analyze_intent(&message, &user);
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        Commands::Chat { user, category } => {
            let engine = synced_engine(cfg).await?;
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                let message = line.trim();
                if message.is_empty() {
                    continue;
                }
                println!("{}\n", engine.respond(message, &user, category));
            }
        }
        Commands::Stats => {
            let engine = synced_engine(cfg).await?;
            print!("{}", stats::render_stats(&engine.knowledge_base().stats()));
        }
        Commands::List => {
            let engine = synced_engine(cfg).await?;
            print!(
                "{}",
                stats::render_listing(&engine.knowledge_base().list_documents())
            );
        }
        Commands::Show { filename } => {
            let engine = synced_engine(cfg).await?;
            match engine.knowledge_base().document_summary(&filename) {
                Some(summary) => print!("{}", stats::render_document(&summary)),
                None => bail!("Document not found: {}", filename),
            }
        }
    }

    Ok(())
}

async fn sync_connectors(engine: &Arc<Engine>, spec: &str) -> Result<Vec<SyncReport>> {
    let registry = ConnectorRegistry::from_config(engine.config());
    if registry.is_empty() {
        bail!("No connectors configured. Add a [connectors.filesystem] section to the config.");
    }

    let selected: Vec<&dyn Connector> = if spec == "all" {
        registry.connectors().iter().map(|c| c.as_ref()).collect()
    } else {
        match registry.find(spec) {
            Some(connector) => vec![connector],
            None => bail!("Unknown connector: {}", spec),
        }
    };

    let mut reports = Vec::new();
    for connector in selected {
        reports.push(run_sync(engine, connector).await?);
    }
    Ok(reports)
}

async fn synced_engine(cfg: Config) -> Result<Arc<Engine>> {
    let engine = Arc::new(Engine::new(cfg));
    sync_connectors(&engine, "all").await?;
    Ok(engine)
}

fn print_results(query: &str, results: &[ScoredChunk]) {
    if results.is_empty() {
        println!("No results for \"{}\".", query);
        return;
    }
    for (rank, hit) in results.iter().enumerate() {
        let kind = if hit.chunk.is_summary { "summary" } else { "chunk" };
        println!(
            "{}. [{}] {} ({} {}, {} matching)",
            rank + 1,
            hit.score,
            hit.chunk.filename,
            kind,
            hit.chunk.index,
            hit.matching_tokens
        );
        for line in hit.excerpt.lines() {
            println!("   {}", line);
        }
        if let Some(b) = &hit.explain {
            println!(
                "   phrase={} all={} tokens={} proximity={} summary={} length={} question={} heading={}",
                b.phrase,
                b.all_tokens,
                b.token_matches,
                b.proximity,
                b.summary,
                b.length,
                b.question_words,
                b.heading_penalty
            );
        }
        println!();
    }
}
