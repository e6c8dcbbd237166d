//! External account entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{ExternalAccount, ExternalAccountWithUser, PublicUser, UserStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the external_accounts table.
#[derive(Debug, Clone, FromRow)]
pub struct ExternalAccountEntity {
    pub id: Uuid,
    pub provider_type: String,
    pub account_id: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<ExternalAccountEntity> for ExternalAccount {
    fn from(entity: ExternalAccountEntity) -> Self {
        Self {
            id: entity.id,
            provider_type: entity.provider_type,
            account_id: entity.account_id,
            user_id: entity.user_id,
            created_at: entity.created_at,
        }
    }
}

/// Account joined with its owner; owner columns are null when the user row
/// is gone.
#[derive(Debug, Clone, FromRow)]
pub struct ExternalAccountWithUserEntity {
    pub id: Uuid,
    pub provider_type: String,
    pub account_id: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub admin: Option<bool>,
    pub status: Option<i16>,
    pub user_created_at: Option<DateTime<Utc>>,
}

impl From<ExternalAccountWithUserEntity> for ExternalAccountWithUser {
    fn from(entity: ExternalAccountWithUserEntity) -> Self {
        let user = match (entity.email, entity.user_created_at) {
            (Some(email), Some(created_at)) => Some(PublicUser {
                id: entity.user_id,
                username: entity.username,
                name: entity.name,
                email,
                admin: entity.admin.unwrap_or(false),
                status: entity
                    .status
                    .and_then(UserStatus::from_code)
                    .unwrap_or(UserStatus::Registered),
                created_at,
            }),
            _ => None,
        };

        Self {
            account: ExternalAccount {
                id: entity.id,
                provider_type: entity.provider_type,
                account_id: entity.account_id,
                user_id: entity.user_id,
                created_at: entity.created_at,
            },
            user,
        }
    }
}
