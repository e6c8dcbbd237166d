//! User and page group relation repositories.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{GroupMemberEntity, PageGroupRelationEntity, UserGroupRelationEntity};
use crate::metrics::QueryTimer;

/// Repository for group memberships.
#[derive(Clone)]
pub struct UserGroupRelationRepository {
    pool: PgPool,
}

impl UserGroupRelationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Members of a group with their user rows.
    pub async fn find_members(
        &self,
        group_id: Uuid,
    ) -> Result<Vec<GroupMemberEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_group_members");
        let result = sqlx::query_as::<_, GroupMemberEntity>(
            r#"
            SELECT r.id AS relation_id, r.group_id, r.created_at,
                   u.id AS user_id, u.username, u.name, u.email, u.admin, u.status,
                   u.created_at AS user_created_at
            FROM user_group_relations r
            JOIN users u ON u.id = r.user_id
            WHERE r.group_id = $1
            ORDER BY r.created_at
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<UserGroupRelationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_user_group_relation");
        let result = sqlx::query_as::<_, UserGroupRelationEntity>(
            r#"
            INSERT INTO user_group_relations (group_id, user_id)
            VALUES ($1, $2)
            RETURNING id, group_id, user_id, created_at
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Removes a membership of the given group.
    pub async fn delete(&self, group_id: Uuid, relation_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_user_group_relation");
        let result = sqlx::query("DELETE FROM user_group_relations WHERE id = $1 AND group_id = $2")
            .bind(relation_id)
            .bind(group_id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        timer.record();
        result
    }
}

/// Repository for page grants.
#[derive(Clone)]
pub struct PageGroupRelationRepository {
    pool: PgPool,
}

impl PageGroupRelationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_for_group(
        &self,
        group_id: Uuid,
    ) -> Result<Vec<PageGroupRelationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_page_group_relations");
        let result = sqlx::query_as::<_, PageGroupRelationEntity>(
            r#"
            SELECT r.id, r.group_id, r.page_id, p.path AS page_path, r.created_at
            FROM page_group_relations r
            JOIN pages p ON p.id = r.page_id
            WHERE r.group_id = $1
            ORDER BY p.path
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
