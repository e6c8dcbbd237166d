//! User group naming rules.

use async_trait::async_trait;
use shared::validation::strip_html_tags;
use thiserror::Error;
use uuid::Uuid;

use super::store::StoreError;
use crate::models::user_group::UserGroup;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GroupError {
    #[error("The same group name already exists")]
    DuplicateName,

    #[error("The group name already exists")]
    NameTaken,

    #[error("Group name must not be empty")]
    EmptyName,

    #[error("Group not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Persistence seam for user groups.
#[async_trait]
pub trait UserGroupStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserGroup>, StoreError>;

    /// True when no group uses `name`.
    async fn is_registerable_name(&self, name: &str) -> Result<bool, StoreError>;

    async fn create(&self, name: &str) -> Result<UserGroup, StoreError>;

    async fn update_name(&self, id: Uuid, name: &str) -> Result<UserGroup, StoreError>;
}

fn sanitize_name(raw: &str) -> Result<String, GroupError> {
    let name = strip_html_tags(raw);
    if name.is_empty() {
        return Err(GroupError::EmptyName);
    }
    Ok(name)
}

/// Creates a group after stripping markup from the name and checking that it
/// is unused.
pub async fn create_group(
    store: &dyn UserGroupStore,
    raw_name: &str,
) -> Result<UserGroup, GroupError> {
    let name = sanitize_name(raw_name)?;
    if !store.is_registerable_name(&name).await? {
        return Err(GroupError::DuplicateName);
    }

    match store.create(&name).await {
        Ok(group) => {
            tracing::info!(group_id = %group.id, name = %group.name, "User group created");
            Ok(group)
        }
        // Lost a race against a concurrent create.
        Err(StoreError::Conflict) => Err(GroupError::DuplicateName),
        Err(e) => Err(e.into()),
    }
}

/// Renames a group. The new name must not be used by any group, including
/// this one.
pub async fn rename_group(
    store: &dyn UserGroupStore,
    id: Uuid,
    raw_name: &str,
) -> Result<UserGroup, GroupError> {
    let name = sanitize_name(raw_name)?;
    if store.find_by_id(id).await?.is_none() {
        return Err(GroupError::NotFound);
    }
    if !store.is_registerable_name(&name).await? {
        return Err(GroupError::NameTaken);
    }

    match store.update_name(id, &name).await {
        Ok(group) => Ok(group),
        Err(StoreError::Conflict) => Err(GroupError::NameTaken),
        Err(StoreError::NotFound) => Err(GroupError::NotFound),
        Err(e) => Err(e.into()),
    }
}
