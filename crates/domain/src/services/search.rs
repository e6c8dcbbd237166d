//! Search index rebuild.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::models::search::SearchEvent;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Request(String),

    #[error("search backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("failed to read pages: {0}")]
    Source(String),
}

/// Full-text index over wiki pages.
#[async_trait]
pub trait SearchIndexer: Send + Sync {
    async fn delete_index(&self) -> Result<(), SearchError>;

    async fn build_index(&self) -> Result<(), SearchError>;

    /// Indexes every page, publishing progress on `events`.
    async fn add_all_pages(
        &self,
        events: &broadcast::Sender<SearchEvent>,
    ) -> Result<(), SearchError>;
}

/// Recreates the index and starts adding pages in the background.
///
/// A failing delete is tolerated since the index may not exist yet. A failing
/// build is returned. Page indexing runs on a spawned task; its outcome is
/// only logged.
pub async fn rebuild_index(
    indexer: Arc<dyn SearchIndexer>,
    events: broadcast::Sender<SearchEvent>,
) -> Result<(), SearchError> {
    if let Err(e) = indexer.delete_index().await {
        tracing::warn!(error = %e, "Failed to delete search index, continuing with build");
    }

    indexer.build_index().await?;

    tokio::spawn(async move {
        match indexer.add_all_pages(&events).await {
            Ok(()) => tracing::info!("Search index rebuilt"),
            Err(e) => tracing::error!(error = %e, "Failed to add pages to search index"),
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::search::SearchProgress;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeIndexer {
        fail_delete: bool,
        fail_build: bool,
        built: AtomicBool,
        added: AtomicUsize,
    }

    #[async_trait]
    impl SearchIndexer for FakeIndexer {
        async fn delete_index(&self) -> Result<(), SearchError> {
            if self.fail_delete {
                return Err(SearchError::Backend {
                    status: 404,
                    body: "index_not_found_exception".to_string(),
                });
            }
            Ok(())
        }

        async fn build_index(&self) -> Result<(), SearchError> {
            if self.fail_build {
                return Err(SearchError::Request("connection refused".to_string()));
            }
            self.built.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn add_all_pages(
            &self,
            events: &broadcast::Sender<SearchEvent>,
        ) -> Result<(), SearchError> {
            let total = 3;
            for current in 1..=total {
                self.added.fetch_add(1, Ordering::SeqCst);
                let _ = events.send(SearchEvent::AddPageProgress(SearchProgress {
                    total,
                    current,
                    skip: 0,
                }));
            }
            let _ = events.send(SearchEvent::FinishAddPage(SearchProgress {
                total,
                current: total,
                skip: 0,
            }));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_rebuild_tolerates_delete_failure_and_streams_progress() {
        let indexer = Arc::new(FakeIndexer {
            fail_delete: true,
            ..Default::default()
        });
        let (tx, mut rx) = broadcast::channel(16);

        rebuild_index(indexer.clone(), tx).await.unwrap();
        assert!(indexer.built.load(Ordering::SeqCst));

        let mut names = Vec::new();
        loop {
            let event = rx.recv().await.unwrap();
            names.push(event.event_name());
            if let SearchEvent::FinishAddPage(progress) = event {
                assert_eq!(progress.current, 3);
                break;
            }
        }
        assert_eq!(names.len(), 4);
        assert_eq!(indexer.added.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rebuild_returns_build_failure() {
        let indexer = Arc::new(FakeIndexer {
            fail_build: true,
            ..Default::default()
        });
        let (tx, _rx) = broadcast::channel(16);

        let result = rebuild_index(indexer.clone(), tx).await;
        assert!(matches!(result, Err(SearchError::Request(_))));
        assert_eq!(indexer.added.load(Ordering::SeqCst), 0);
    }
}
