//! External account repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{ExternalAccountEntity, ExternalAccountWithUserEntity};
use crate::metrics::QueryTimer;

/// Repository for linked third-party accounts.
#[derive(Clone)]
pub struct ExternalAccountRepository {
    pool: PgPool,
}

impl ExternalAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists accounts with their owners, newest first.
    pub async fn list_paginated(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ExternalAccountWithUserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_external_accounts_paginated");
        let result = sqlx::query_as::<_, ExternalAccountWithUserEntity>(
            r#"
            SELECT a.id, a.provider_type, a.account_id, a.user_id, a.created_at,
                   u.username, u.name, u.email, u.admin, u.status,
                   u.created_at AS user_created_at
            FROM external_accounts a
            LEFT JOIN users u ON u.id = a.user_id
            ORDER BY a.created_at DESC, a.id
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
        let timer = QueryTimer::new("count_external_accounts");
        let result = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM external_accounts")
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Deletes one account and returns it.
    pub async fn delete(&self, id: Uuid) -> Result<Option<ExternalAccountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("delete_external_account");
        let result = sqlx::query_as::<_, ExternalAccountEntity>(
            r#"
            DELETE FROM external_accounts WHERE id = $1
            RETURNING id, provider_type, account_id, user_id, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn delete_by_user(&self, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_external_accounts_by_user");
        let result = sqlx::query("DELETE FROM external_accounts WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        timer.record();
        result
    }
}
