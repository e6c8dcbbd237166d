//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{User, UserStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: String,
    pub password_hash: Option<String>,
    pub admin: bool,
    pub status: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserEntity> for User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            username: entity.username,
            name: entity.name,
            email: entity.email,
            password_hash: entity.password_hash,
            admin: entity.admin,
            // The column is constrained to known codes.
            status: UserStatus::from_code(entity.status).unwrap_or(UserStatus::Registered),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
