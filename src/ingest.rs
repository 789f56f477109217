//! Sync orchestration: connector → engine.
//!
//! [`run_sync`] scans one connector and ingests every item it returns. A
//! connector failure aborts before anything is ingested, so the index keeps
//! its previous state. A single bad document is logged and counted as
//! skipped; it never stops the rest of the sync.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::Engine;
use crate::error::IngestError;
use crate::index::IngestOutcome;
use crate::traits::Connector;

/// Per-sync counts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub connector: String,
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub chunks_written: usize,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Scan `connector` and ingest its items into `engine`.
///
/// Chunking is CPU-bound, so each ingest runs on the blocking pool while
/// other tasks keep searching the index.
pub async fn run_sync(engine: &Arc<Engine>, connector: &dyn Connector) -> Result<SyncReport> {
    let label = connector.label();
    let items = match connector.scan().await {
        Ok(items) => items,
        Err(err) => {
            tracing::error!(connector = %label, error = %err, "sync failed; index left unchanged");
            return Err(IngestError::Connector(format!("{:#}", err)))
                .with_context(|| format!("connector {} failed to scan", label));
        }
    };

    let mut report = SyncReport {
        connector: label.clone(),
        fetched: items.len(),
        ..SyncReport::default()
    };

    for item in items {
        let engine = Arc::clone(engine);
        let filename = item.filename.clone();
        let outcome =
            tokio::task::spawn_blocking(move || engine.ingest(&item.filename, &item.text)).await;

        match outcome {
            Ok(Ok(IngestOutcome::Created { chunks })) => {
                tracing::info!(file = %filename, chunks, "document added");
                report.created += 1;
                report.chunks_written += chunks;
            }
            Ok(Ok(IngestOutcome::Updated { chunks })) => {
                tracing::info!(file = %filename, chunks, "document updated");
                report.updated += 1;
                report.chunks_written += chunks;
            }
            Ok(Ok(IngestOutcome::Unchanged)) => {
                tracing::debug!(file = %filename, "document unchanged");
                report.unchanged += 1;
            }
            Ok(Err(err)) => {
                tracing::warn!(file = %filename, error = %err, "document skipped");
                report.skipped += 1;
            }
            Err(err) => {
                tracing::warn!(file = %filename, error = %err, "ingest task failed; document skipped");
                report.skipped += 1;
            }
        }
    }

    let now = Utc::now();
    engine.knowledge_base().mark_synced(now);
    report.finished_at = Some(now);

    tracing::info!(
        connector = %label,
        fetched = report.fetched,
        created = report.created,
        updated = report.updated,
        unchanged = report.unchanged,
        skipped = report.skipped,
        "sync complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceItem;
    use async_trait::async_trait;

    struct Items(Vec<(&'static str, &'static str)>);

    #[async_trait]
    impl Connector for Items {
        fn name(&self) -> &str {
            "items"
        }
        fn description(&self) -> &str {
            "in-memory items"
        }
        async fn scan(&self) -> Result<Vec<SourceItem>> {
            Ok(self
                .0
                .iter()
                .map(|(f, t)| SourceItem {
                    filename: f.to_string(),
                    text: t.to_string(),
                })
                .collect())
        }
    }

    struct Broken;

    #[async_trait]
    impl Connector for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        fn description(&self) -> &str {
            "always fails"
        }
        async fn scan(&self) -> Result<Vec<SourceItem>> {
            anyhow::bail!("source unavailable")
        }
    }

    const GUIDE: &str = "The Skeleton Coast stretches along the Atlantic shore for hundreds of kilometres. \
        Shipwrecks and seal colonies line the foggy beaches where the desert meets the ocean. \
        Travellers need a sturdy vehicle and plenty of water to explore the remote northern stretches safely.";

    #[tokio::test]
    async fn test_sync_classifies_items() {
        let engine = Arc::new(Engine::default());
        let first = Items(vec![("coast.txt", GUIDE), ("empty.txt", "   ")]);
        let report = run_sync(&engine, &first).await.unwrap();
        assert_eq!(report.fetched, 2);
        assert_eq!(report.created, 1);
        assert_eq!(report.skipped, 1);
        assert!(report.chunks_written >= 2);
        assert!(engine.knowledge_base().last_sync().is_some());

        let again = run_sync(&engine, &first).await.unwrap();
        assert_eq!(again.unchanged, 1);
        assert_eq!(again.created, 0);
    }

    #[tokio::test]
    async fn test_connector_failure_leaves_index_untouched() {
        let engine = Arc::new(Engine::default());
        run_sync(&engine, &Items(vec![("coast.txt", GUIDE)]))
            .await
            .unwrap();
        let synced_at = engine.knowledge_base().last_sync();

        let err = run_sync(&engine, &Broken).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IngestError>(),
            Some(IngestError::Connector(msg)) if msg.contains("source unavailable")
        ));
        assert_eq!(engine.knowledge_base().stats().total_documents, 1);
        assert_eq!(engine.knowledge_base().last_sync(), synced_at);
    }
}
