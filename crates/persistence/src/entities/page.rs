//! Page entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::Page;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the pages table.
#[derive(Debug, Clone, FromRow)]
pub struct PageEntity {
    pub id: Uuid,
    pub path: String,
    pub body: String,
    pub creator_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PageEntity> for Page {
    fn from(entity: PageEntity) -> Self {
        Self {
            id: entity.id,
            path: entity.path,
            body: entity.body,
            creator_id: entity.creator_id,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
