//! Page repository for database operations.

use async_trait::async_trait;
use domain::models::{NewPage, Page};
use domain::services::{PageWriter, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::PageEntity;
use crate::error::to_store_error;
use crate::metrics::QueryTimer;

/// Repository for wiki pages.
#[derive(Clone)]
pub struct PageRepository {
    pool: PgPool,
}

impl PageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn exists_by_path(&self, path: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("page_exists_by_path");
        let result =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM pages WHERE path = $1)")
                .bind(path)
                .fetch_one(&self.pool)
                .await;
        timer.record();
        result
    }

    pub async fn insert(
        &self,
        path: &str,
        body: &str,
        creator_id: Uuid,
    ) -> Result<PageEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_page");
        let result = sqlx::query_as::<_, PageEntity>(
            r#"
            INSERT INTO pages (path, body, creator_id)
            VALUES ($1, $2, $3)
            RETURNING id, path, body, creator_id, created_at, updated_at
            "#,
        )
        .bind(path)
        .bind(body)
        .bind(creator_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Removes `path` and every page below it.
    pub async fn delete_tree(&self, path: &str) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_page_tree");
        let prefix = format!("{}/%", escape_like(path.trim_end_matches('/')));
        let result = sqlx::query(
            r#"
            DELETE FROM pages
            WHERE path = $1 OR path LIKE $2 ESCAPE '\'
            "#,
        )
        .bind(path)
        .bind(prefix)
        .execute(&self.pool)
        .await
        .map(|r| r.rows_affected());
        timer.record();
        result
    }

    pub async fn count_all(&self) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_pages");
        let result = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM pages")
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Keyset batch of pages ordered by id, starting after `after`.
    pub async fn list_batch(
        &self,
        after: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<PageEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_pages_batch");
        let result = sqlx::query_as::<_, PageEntity>(
            r#"
            SELECT id, path, body, creator_id, created_at, updated_at
            FROM pages
            WHERE ($1::UUID IS NULL OR id > $1)
            ORDER BY id
            LIMIT $2
            "#,
        )
        .bind(after)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}

fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl PageWriter for PageRepository {
    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        self.exists_by_path(path).await.map_err(to_store_error)
    }

    async fn create(&self, page: NewPage) -> Result<Page, StoreError> {
        self.insert(&page.path, &page.body, page.creator_id)
            .await
            .map(Into::into)
            .map_err(to_store_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_for_tree_prefix() {
        assert_eq!(escape_like("/user/a_b"), "/user/a\\_b");
        assert_eq!(escape_like("/100%"), "/100\\%");
    }
}
