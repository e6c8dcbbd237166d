//! Slack update-post rule repository.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::UpdatePostEntity;
use crate::metrics::QueryTimer;

/// Repository for path-to-channel posting rules.
#[derive(Clone)]
pub struct UpdatePostRepository {
    pool: PgPool,
}

impl UpdatePostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self) -> Result<Vec<UpdatePostEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_update_posts");
        let result = sqlx::query_as::<_, UpdatePostEntity>(
            r#"
            SELECT id, path_pattern, channel, creator_id, created_at
            FROM update_posts
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(
        &self,
        path_pattern: &str,
        channel: &str,
        creator_id: Uuid,
    ) -> Result<UpdatePostEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_update_post");
        let result = sqlx::query_as::<_, UpdatePostEntity>(
            r#"
            INSERT INTO update_posts (path_pattern, channel, creator_id)
            VALUES ($1, $2, $3)
            RETURNING id, path_pattern, channel, creator_id, created_at
            "#,
        )
        .bind(path_pattern)
        .bind(channel)
        .bind(creator_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_update_post");
        let result = sqlx::query("DELETE FROM update_posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        timer.record();
        result
    }
}
