//! Index statistics, document listings, and sync reports for the CLI.
//!
//! Everything here renders to a `String` so the `ragchat` binary can print
//! it and tests can inspect it.

use chrono::{DateTime, Utc};

use crate::index::{DocumentListing, DocumentSummary, IndexStats};
use crate::ingest::SyncReport;

/// Summary block printed by `ragchat stats`.
pub fn render_stats(stats: &IndexStats) -> String {
    let now = Utc::now();
    let last_sync = stats
        .last_sync
        .map(|at| format_relative(at, now))
        .unwrap_or_else(|| "never".to_string());

    let mut out = String::new();
    out.push_str("ragchat index stats\n");
    out.push_str("===================\n\n");
    out.push_str(&format!("  Documents:   {}\n", stats.total_documents));
    out.push_str(&format!("  Chunks:      {}\n", stats.total_chunks));
    out.push_str(&format!("  Last sync:   {}\n", last_sync));
    out
}

/// Table printed by `ragchat list`.
pub fn render_listing(docs: &[DocumentListing]) -> String {
    if docs.is_empty() {
        return "No documents indexed.\n".to_string();
    }
    let mut out = format!("  {:<40} {:>8}   {}\n", "FILENAME", "WORDS", "INGESTED");
    out.push_str(&format!("  {}\n", "-".repeat(68)));
    for doc in docs {
        out.push_str(&format!(
            "  {:<40} {:>8}   {}\n",
            doc.filename,
            doc.word_count,
            doc.ingested_at.format("%Y-%m-%d %H:%M")
        ));
    }
    out
}

/// Detail block printed by `ragchat show`.
pub fn render_document(summary: &DocumentSummary) -> String {
    format!(
        "{}\n  words: {}  chars: {}  chunks: {}\n  ingested: {}\n\n{}\n",
        summary.filename,
        summary.word_count,
        summary.char_count,
        summary.chunk_count,
        summary.ingested_at.format("%Y-%m-%d %H:%M"),
        summary.preview
    )
}

/// Report printed after `ragchat sync`.
pub fn render_sync_report(report: &SyncReport) -> String {
    let mut out = format!("sync {}\n", report.connector);
    out.push_str(&format!("  fetched: {} items\n", report.fetched));
    out.push_str(&format!("  new: {}\n", report.created));
    out.push_str(&format!("  updated: {}\n", report.updated));
    out.push_str(&format!("  unchanged: {}\n", report.unchanged));
    out.push_str(&format!("  skipped: {}\n", report.skipped));
    out.push_str(&format!("  chunks written: {}\n", report.chunks_written));
    out.push_str("ok\n");
    out
}

/// "just now", "5 mins ago", "3 hours ago", "2 days ago", or a date.
pub fn format_relative(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = (now - at).num_seconds();
    if delta < 0 {
        return at.format("%Y-%m-%d %H:%M").to_string();
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        at.format("%Y-%m-%d %H:%M").to_string()
    }
}
