//! User group entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{
    GroupMember, PageGroupRelation, PublicUser, UserGroup, UserGroupRelation, UserStatus,
};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the user_groups table.
#[derive(Debug, Clone, FromRow)]
pub struct UserGroupEntity {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserGroupEntity> for UserGroup {
    fn from(entity: UserGroupEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            image: entity.image,
            created_at: entity.created_at,
        }
    }
}

/// Database row mapping for the user_group_relations table.
#[derive(Debug, Clone, FromRow)]
pub struct UserGroupRelationEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<UserGroupRelationEntity> for UserGroupRelation {
    fn from(entity: UserGroupRelationEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            user_id: entity.user_id,
            created_at: entity.created_at,
        }
    }
}

/// Relation joined with the member's user row.
#[derive(Debug, Clone, FromRow)]
pub struct GroupMemberEntity {
    pub relation_id: Uuid,
    pub group_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: String,
    pub admin: bool,
    pub status: i16,
    pub user_created_at: DateTime<Utc>,
}

impl From<GroupMemberEntity> for GroupMember {
    fn from(entity: GroupMemberEntity) -> Self {
        Self {
            relation_id: entity.relation_id,
            group_id: entity.group_id,
            user: PublicUser {
                id: entity.user_id,
                username: entity.username,
                name: entity.name,
                email: entity.email,
                admin: entity.admin,
                status: UserStatus::from_code(entity.status).unwrap_or(UserStatus::Registered),
                created_at: entity.user_created_at,
            },
            created_at: entity.created_at,
        }
    }
}

/// Page grant joined with the page path.
#[derive(Debug, Clone, FromRow)]
pub struct PageGroupRelationEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub page_id: Uuid,
    pub page_path: String,
    pub created_at: DateTime<Utc>,
}

impl From<PageGroupRelationEntity> for PageGroupRelation {
    fn from(entity: PageGroupRelationEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            page_id: entity.page_id,
            page_path: entity.page_path,
            created_at: entity.created_at,
        }
    }
}
