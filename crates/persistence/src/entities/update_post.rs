//! Update post entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::UpdatePost;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the update_posts table.
#[derive(Debug, Clone, FromRow)]
pub struct UpdatePostEntity {
    pub id: Uuid,
    pub path_pattern: String,
    pub channel: String,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<UpdatePostEntity> for UpdatePost {
    fn from(entity: UpdatePostEntity) -> Self {
        Self {
            id: entity.id,
            path_pattern: entity.path_pattern,
            channel: entity.channel,
            creator_id: entity.creator_id,
            created_at: entity.created_at,
        }
    }
}
