//! User group repository for database operations.

use async_trait::async_trait;
use domain::models::UserGroup;
use domain::services::{StoreError, UserGroupStore};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::UserGroupEntity;
use crate::error::to_store_error;
use crate::metrics::QueryTimer;

/// Repository for user groups.
#[derive(Clone)]
pub struct UserGroupRepository {
    pool: PgPool,
}

impl UserGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserGroupEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_group_by_id");
        let result = sqlx::query_as::<_, UserGroupEntity>(
            r#"
            SELECT id, name, image, created_at
            FROM user_groups
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lists groups, newest first.
    pub async fn list_paginated(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserGroupEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_user_groups_paginated");
        let result = sqlx::query_as::<_, UserGroupEntity>(
            r#"
            SELECT id, name, image, created_at
            FROM user_groups
            ORDER BY created_at DESC, id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn count_all(&self) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_user_groups");
        let result = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_groups")
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn exists_by_name(&self, name: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("user_group_name_exists");
        let result = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM user_groups WHERE name = $1)",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn insert(&self, name: &str) -> Result<UserGroupEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_user_group");
        let result = sqlx::query_as::<_, UserGroupEntity>(
            r#"
            INSERT INTO user_groups (name)
            VALUES ($1)
            RETURNING id, name, image, created_at
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn update_name(
        &self,
        id: Uuid,
        name: &str,
    ) -> Result<Option<UserGroupEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_user_group_name");
        let result = sqlx::query_as::<_, UserGroupEntity>(
            r#"
            UPDATE user_groups SET name = $2
            WHERE id = $1
            RETURNING id, name, image, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Sets or clears the group picture URL.
    pub async fn update_image(
        &self,
        id: Uuid,
        image: Option<&str>,
    ) -> Result<Option<UserGroupEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_user_group_image");
        let result = sqlx::query_as::<_, UserGroupEntity>(
            r#"
            UPDATE user_groups SET image = $2
            WHERE id = $1
            RETURNING id, name, image, created_at
            "#,
        )
        .bind(id)
        .bind(image)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes a group together with its user and page relations.
    ///
    /// Returns the removed group so callers can see its picture URL. The
    /// picture file itself is not deleted.
    pub async fn delete_completely(
        &self,
        id: Uuid,
    ) -> Result<Option<UserGroupEntity>, sqlx::Error> {
        let timer = QueryTimer::new("delete_user_group_completely");
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM page_group_relations WHERE group_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM user_group_relations WHERE group_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let removed = sqlx::query_as::<_, UserGroupEntity>(
            r#"
            DELETE FROM user_groups WHERE id = $1
            RETURNING id, name, image, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(removed)
    }
}

#[async_trait]
impl UserGroupStore for UserGroupRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserGroup>, StoreError> {
        UserGroupRepository::find_by_id(self, id)
            .await
            .map(|group| group.map(Into::into))
            .map_err(to_store_error)
    }

    async fn is_registerable_name(&self, name: &str) -> Result<bool, StoreError> {
        self.exists_by_name(name)
            .await
            .map(|exists| !exists)
            .map_err(to_store_error)
    }

    async fn create(&self, name: &str) -> Result<UserGroup, StoreError> {
        self.insert(name)
            .await
            .map(Into::into)
            .map_err(to_store_error)
    }

    async fn update_name(&self, id: Uuid, name: &str) -> Result<UserGroup, StoreError> {
        UserGroupRepository::update_name(self, id, name)
            .await
            .map_err(to_store_error)?
            .map(Into::into)
            .ok_or(StoreError::NotFound)
    }
}
