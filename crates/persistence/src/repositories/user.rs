//! User repository for database operations.

use domain::models::UserStatus;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

const USER_COLUMNS: &str =
    "id, username, name, email, password_hash, admin, status, created_at, updated_at";

/// Repository for user accounts.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a user by username.
    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_username");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lists users, newest first.
    pub async fn list_paginated(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_users_paginated");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC, id LIMIT $1 OFFSET $2",
            USER_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn count_all(&self) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_users");
        let result = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn count_by_status(&self, status: UserStatus) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_users_by_status");
        let result = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE status = $1")
            .bind(status.code())
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Creates an invited user. Returns `None` when the email is taken.
    pub async fn create_invited(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("create_invited_user");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            INSERT INTO users (email, password_hash, status)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(email)
        .bind(password_hash)
        .bind(UserStatus::Invited.code())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn set_admin(
        &self,
        id: Uuid,
        admin: bool,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_user_admin");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            "UPDATE users SET admin = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(admin)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn set_status(
        &self,
        id: Uuid,
        status: UserStatus,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_user_status");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            "UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(status.code())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Soft-deletes a user: status deleted, credentials cleared.
    pub async fn mark_deleted(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("mark_user_deleted");
        let result = sqlx::query(
            r#"
            UPDATE users
            SET status = $2, password_hash = NULL, admin = false, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(UserStatus::Deleted.code())
        .execute(&self.pool)
        .await
        .map(|r| r.rows_affected());
        timer.record();
        result
    }

    /// Physically deletes a user. Relations and linked accounts cascade.
    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_user");
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        timer.record();
        result
    }

    pub async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_user_password");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Users whose email contains `part`, case-insensitively.
    pub async fn search_by_email(
        &self,
        part: &str,
        limit: i64,
    ) -> Result<Vec<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("search_users_by_email");
        let pattern = format!("%{}%", escape_like(part));
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            SELECT {} FROM users
            WHERE email ILIKE $1 ESCAPE '\'
            ORDER BY email
            LIMIT $2
            "#,
            USER_COLUMNS
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Active users that are not members of the group.
    pub async fn find_not_in_group(&self, group_id: Uuid) -> Result<Vec<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_users_not_in_group");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            SELECT {} FROM users u
            WHERE u.status = $2
              AND NOT EXISTS (
                SELECT 1 FROM user_group_relations r
                WHERE r.user_id = u.id AND r.group_id = $1
              )
            ORDER BY u.username
            "#,
            USER_COLUMNS
        ))
        .bind(group_id)
        .bind(UserStatus::Active.code())
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}

/// Escapes LIKE wildcards in user input.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("a_b%c\\d"), "a\\_b\\%c\\\\d");
        assert_eq!(escape_like("example.com"), "example.com");
    }
}
