//! Elasticsearch-backed page index.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::SearchConfig;
use domain::models::{Page, SearchEvent, SearchProgress};
use domain::services::{SearchError, SearchIndexer};
use persistence::repositories::PageRepository;

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl BulkResponse {
    /// Items the backend refused to index.
    fn failed_items(&self) -> u64 {
        if !self.errors {
            return 0;
        }
        self.items
            .iter()
            .filter_map(|item| item.values().next())
            .filter(|result| result.get("error").is_some())
            .count() as u64
    }
}

pub struct ElasticsearchIndexer {
    client: Client,
    base_url: String,
    index_name: String,
    bulk_size: u32,
    pages: PageRepository,
}

impl ElasticsearchIndexer {
    pub fn new(config: &SearchConfig, pages: PageRepository) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| SearchError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            index_name: config.index_name.clone(),
            bulk_size: config.bulk_size.max(1),
            pages,
        })
    }

    fn index_url(&self) -> String {
        format!("{}/{}", self.base_url, self.index_name)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, SearchError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SearchError::Backend {
            status: status.as_u16(),
            body,
        })
    }

    async fn bulk_index(&self, pages: &[Page]) -> Result<u64, SearchError> {
        let body = bulk_body(&self.index_name, pages);
        let response = self
            .client
            .post(format!("{}/_bulk", self.base_url))
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;
        let response: BulkResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;
        Ok(response.failed_items())
    }
}

/// NDJSON body of a bulk index request.
fn bulk_body(index_name: &str, pages: &[Page]) -> String {
    let mut body = String::new();
    for page in pages {
        let action = json!({ "index": { "_index": index_name, "_id": page.id } });
        let document = json!({
            "path": page.path,
            "body": page.body,
            "created_at": page.created_at,
            "updated_at": page.updated_at,
        });
        body.push_str(&action.to_string());
        body.push('\n');
        body.push_str(&document.to_string());
        body.push('\n');
    }
    body
}

#[async_trait]
impl SearchIndexer for ElasticsearchIndexer {
    async fn delete_index(&self) -> Result<(), SearchError> {
        let response = self
            .client
            .delete(self.index_url())
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(index = %self.index_name, "Search index did not exist");
            return Ok(());
        }
        Self::check(response).await?;
        info!(index = %self.index_name, "Search index deleted");
        Ok(())
    }

    async fn build_index(&self) -> Result<(), SearchError> {
        let mappings = json!({
            "mappings": {
                "properties": {
                    "path": { "type": "keyword" },
                    "body": { "type": "text" },
                    "created_at": { "type": "date" },
                    "updated_at": { "type": "date" }
                }
            }
        });
        let response = self
            .client
            .put(self.index_url())
            .json(&mappings)
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;
        Self::check(response).await?;
        info!(index = %self.index_name, "Search index created");
        Ok(())
    }

    async fn add_all_pages(
        &self,
        events: &broadcast::Sender<SearchEvent>,
    ) -> Result<(), SearchError> {
        let total = self
            .pages
            .count_all()
            .await
            .map_err(|e| SearchError::Source(e.to_string()))?
            .max(0) as u64;

        let mut progress = SearchProgress {
            total,
            current: 0,
            skip: 0,
        };
        let mut after = None;

        loop {
            let batch: Vec<Page> = self
                .pages
                .list_batch(after, i64::from(self.bulk_size))
                .await
                .map_err(|e| SearchError::Source(e.to_string()))?
                .into_iter()
                .map(Page::from)
                .collect();
            let Some(last) = batch.last() else {
                break;
            };
            after = Some(last.id);

            let failed = self.bulk_index(&batch).await?;
            progress.current += batch.len() as u64;
            progress.skip += failed;
            // Errors only when no client is listening.
            let _ = events.send(SearchEvent::AddPageProgress(progress));
            debug!(current = progress.current, total = progress.total, "Indexed page batch");
        }

        let _ = events.send(SearchEvent::FinishAddPage(progress));
        info!(
            total = progress.total,
            indexed = progress.current,
            skipped = progress.skip,
            "Pages added to search index"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn page(path: &str) -> Page {
        Page {
            id: Uuid::new_v4(),
            path: path.to_string(),
            body: "# hello".to_string(),
            creator_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_bulk_body_is_ndjson() {
        let pages = vec![page("/a"), page("/b")];
        let body = bulk_body("wiki", &pages);
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 4);

        let action: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(action["index"]["_index"], "wiki");
        assert_eq!(action["index"]["_id"], pages[0].id.to_string());

        let document: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(document["path"], "/a");
        assert!(body.ends_with('\n'));
    }

    #[test]
    fn test_bulk_response_failed_items() {
        let response: BulkResponse = serde_json::from_value(json!({
            "errors": true,
            "items": [
                { "index": { "status": 201 } },
                { "index": { "status": 400, "error": { "type": "mapper_parsing_exception" } } }
            ]
        }))
        .unwrap();
        assert_eq!(response.failed_items(), 1);

        let response: BulkResponse =
            serde_json::from_value(json!({ "errors": false, "items": [] })).unwrap();
        assert_eq!(response.failed_items(), 0);
    }
}
