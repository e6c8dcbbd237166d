//! Importing posts from third-party services as wiki pages.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::store::StoreError;
use crate::models::importer::{ImportSource, ImportedPost};
use crate::models::page::{page_path_from_title, NewPage, Page};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("{0} importer is not configured")]
    NotConfigured(ImportSource),

    #[error("request to {service} failed: {message}")]
    Request { service: ImportSource, message: String },

    #[error("{service} API returned {status}")]
    Api { service: ImportSource, status: u16 },
}

/// Client of an import source.
#[async_trait]
pub trait ImportSourceClient: Send + Sync {
    fn source(&self) -> ImportSource;

    /// Verifies that the configured credentials are accepted.
    async fn test_connection(&self) -> Result<(), ImportError>;

    /// Fetches one page of posts (1-based). Returns the posts and the next
    /// page number, if any.
    async fn fetch_posts(&self, page: u32) -> Result<(Vec<ImportedPost>, Option<u32>), ImportError>;
}

/// Write side of the page store used by importers.
#[async_trait]
pub trait PageWriter: Send + Sync {
    async fn exists(&self, path: &str) -> Result<bool, StoreError>;

    async fn create(&self, page: NewPage) -> Result<Page, StoreError>;
}

/// Imports every post of `client` as a page created by `creator_id`.
///
/// Per-post failures are collected and returned; fetching failures abort the
/// import.
pub async fn import_posts(
    client: &dyn ImportSourceClient,
    writer: &dyn PageWriter,
    creator_id: Uuid,
) -> Result<Vec<String>, ImportError> {
    let source = client.source();
    let mut errors = Vec::new();
    let mut imported = 0usize;
    let mut next = Some(1);

    while let Some(page) = next {
        let (posts, following) = client.fetch_posts(page).await?;
        for post in posts {
            let path = page_path_from_title(&post.category, &post.title);
            match writer.exists(&path).await {
                Ok(true) => {
                    errors.push(format!("{} already exists", path));
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    errors.push(format!("{}: {}", path, e));
                    continue;
                }
            }

            let new_page = NewPage {
                path: path.clone(),
                body: post.body,
                creator_id,
            };
            match writer.create(new_page).await {
                Ok(_) => imported += 1,
                Err(e) => errors.push(format!("{}: {}", path, e)),
            }
        }
        next = following;
    }

    tracing::info!(
        source = %source,
        imported = imported,
        failed = errors.len(),
        "Import finished"
    );
    Ok(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    struct FakeClient {
        pages: Vec<Vec<ImportedPost>>,
        fail_on: Option<u32>,
    }

    #[async_trait]
    impl ImportSourceClient for FakeClient {
        fn source(&self) -> ImportSource {
            ImportSource::Esa
        }

        async fn test_connection(&self) -> Result<(), ImportError> {
            Ok(())
        }

        async fn fetch_posts(
            &self,
            page: u32,
        ) -> Result<(Vec<ImportedPost>, Option<u32>), ImportError> {
            if self.fail_on == Some(page) {
                return Err(ImportError::Api {
                    service: ImportSource::Esa,
                    status: 401,
                });
            }
            let index = (page - 1) as usize;
            let posts = self.pages.get(index).cloned().unwrap_or_default();
            let next = (index + 1 < self.pages.len()).then_some(page + 1);
            Ok((posts, next))
        }
    }

    #[derive(Default)]
    struct FakeWriter {
        existing: Vec<String>,
        created: Mutex<Vec<NewPage>>,
    }

    #[async_trait]
    impl PageWriter for FakeWriter {
        async fn exists(&self, path: &str) -> Result<bool, StoreError> {
            Ok(self.existing.iter().any(|p| p == path))
        }

        async fn create(&self, page: NewPage) -> Result<Page, StoreError> {
            self.created.lock().unwrap().push(page.clone());
            Ok(Page {
                id: Uuid::new_v4(),
                path: page.path,
                body: page.body,
                creator_id: Some(page.creator_id),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
        }
    }

    fn post(category: &str, title: &str) -> ImportedPost {
        ImportedPost {
            category: category.to_string(),
            title: title.to_string(),
            body: format!("# {}", title),
        }
    }

    #[tokio::test]
    async fn test_imports_all_pages_and_collects_conflicts() {
        let client = FakeClient {
            pages: vec![
                vec![post("dev", "Setup"), post("", "Welcome")],
                vec![post("dev", "Deploy")],
            ],
            fail_on: None,
        };
        let writer = FakeWriter {
            existing: vec!["/Welcome".to_string()],
            ..Default::default()
        };

        let errors = import_posts(&client, &writer, Uuid::new_v4()).await.unwrap();

        assert_eq!(errors, vec!["/Welcome already exists"]);
        let created: Vec<_> = writer
            .created
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.path.clone())
            .collect();
        assert_eq!(created, vec!["/dev/Setup", "/dev/Deploy"]);
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts() {
        let client = FakeClient {
            pages: vec![vec![post("", "A")], vec![post("", "B")]],
            fail_on: Some(2),
        };
        let writer = FakeWriter::default();

        let result = import_posts(&client, &writer, Uuid::new_v4()).await;
        assert!(matches!(result, Err(ImportError::Api { status: 401, .. })));
        assert_eq!(writer.created.lock().unwrap().len(), 1);
    }
}
