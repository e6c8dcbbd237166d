//! User groups, their members and pictures.

use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::future::try_join_all;
use serde::Serialize;
use shared::pagination::{page_offset, Pager};
use shared::validation::is_image_mime;
use uuid::Uuid;
use validator::Validate;

use super::{pager, PageQuery};
use crate::app::AppState;
use crate::error::ApiError;
use crate::responses::{FlashRedirect, StatusResponse};
use crate::services::storage::extension_for;
use domain::models::user_group::{
    CreateGroupRelationRequest, CreateUserGroupRequest, RemoveUserGroupRequest,
    RenameUserGroupRequest, UserGroupWithMembers,
};
use domain::models::{GroupMember, PageGroupRelation, PublicUser, User, UserGroup};
use domain::services::settings_pipeline::validation_messages;
use domain::services::{create_group, rename_group, GroupError};
use persistence::repositories::{
    PageGroupRelationRepository, UserGroupRelationRepository, UserGroupRepository, UserRepository,
};

const USER_GROUPS_VIEW: &str = "/admin/user-groups";
const PICTURE_FIELD: &str = "userGroupPicture";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/user-groups", get(user_groups_view))
        .route("/admin/user-group-detail/:id", get(user_group_detail_view))
        .route("/admin/user-group/create", post(create_user_group))
        .route("/admin/user-group/:id/update", post(rename_user_group))
        .route(
            "/admin/user-group/:id/picture/delete",
            post(delete_group_picture),
        )
        .route("/admin/user-group.remove", post(remove_user_group))
        .route(
            "/_api/admin/user-group/:id/picture/upload",
            post(upload_group_picture),
        )
        .route("/admin/user-group-relation/create", post(create_relation))
        .route(
            "/admin/user-group-relation/:id/remove-relation/:relation_id",
            post(remove_relation),
        )
}

fn detail_path(group_id: Uuid) -> String {
    format!("/admin/user-group-detail/{}", group_id)
}

/// Message shown for a failed group operation.
fn group_error_message(error: &GroupError, fallback: &str) -> String {
    match error {
        GroupError::Store(e) => {
            tracing::error!(error = %e, "User group store failure");
            fallback.to_string()
        }
        other => other.to_string(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGroupsView {
    pub user_groups: Vec<UserGroupWithMembers>,
    pub pager: Pager,
    pub is_acl_enabled: bool,
}

/// GET /admin/user-groups?page=
async fn user_groups_view(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<UserGroupsView>, ApiError> {
    let page = query.page();
    let limit = state.config.limits.user_groups_per_page;
    let groups_repo = UserGroupRepository::new(state.pool.clone());
    let relations_repo = UserGroupRelationRepository::new(state.pool.clone());

    let (groups, total) = tokio::try_join!(
        groups_repo.list_paginated(i64::from(limit), page_offset(page, limit)),
        groups_repo.count_all(),
    )?;

    let members = try_join_all(
        groups
            .iter()
            .map(|group| relations_repo.find_members(group.id)),
    )
    .await?;

    let user_groups = groups
        .into_iter()
        .zip(members)
        .map(|(group, members)| UserGroupWithMembers {
            group: group.into(),
            members: members.into_iter().map(Into::into).collect(),
        })
        .collect();

    Ok(Json(UserGroupsView {
        user_groups,
        pager: pager(total, limit, page),
        is_acl_enabled: state.is_acl_enabled(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGroupDetailView {
    pub user_group: UserGroup,
    pub user_group_relations: Vec<GroupMember>,
    pub page_group_relations: Vec<PageGroupRelation>,
    pub not_related_users: Vec<PublicUser>,
    pub is_acl_enabled: bool,
}

/// GET /admin/user-group-detail/:id
async fn user_group_detail_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let Some(group) = UserGroupRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
    else {
        return Ok(FlashRedirect::to(USER_GROUPS_VIEW)
            .error("Group not found")
            .into_response());
    };

    let relations_repo = UserGroupRelationRepository::new(state.pool.clone());
    let page_relations_repo = PageGroupRelationRepository::new(state.pool.clone());
    let users_repo = UserRepository::new(state.pool.clone());

    let (members, page_relations, not_related) = tokio::try_join!(
        relations_repo.find_members(id),
        page_relations_repo.find_for_group(id),
        users_repo.find_not_in_group(id),
    )?;

    Ok(Json(UserGroupDetailView {
        user_group: group.into(),
        user_group_relations: members.into_iter().map(Into::into).collect(),
        page_group_relations: page_relations.into_iter().map(Into::into).collect(),
        not_related_users: not_related
            .into_iter()
            .map(|entity| User::from(entity).to_public())
            .collect(),
        is_acl_enabled: state.is_acl_enabled(),
    })
    .into_response())
}

/// POST /admin/user-group/create
async fn create_user_group(
    State(state): State<AppState>,
    Json(request): Json<CreateUserGroupRequest>,
) -> FlashRedirect {
    let redirect = FlashRedirect::to(USER_GROUPS_VIEW);
    if let Err(e) = request.validate() {
        return redirect.errors(validation_messages(&e));
    }

    let repo = UserGroupRepository::new(state.pool.clone());
    match create_group(&repo, &request.user_group_name).await {
        Ok(group) => redirect.success(group.name.clone()).with_data(&group),
        Err(e) => redirect.error(group_error_message(&e, "Failed to create the group.")),
    }
}

/// POST /admin/user-group/:id/update
async fn rename_user_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RenameUserGroupRequest>,
) -> FlashRedirect {
    let redirect = FlashRedirect::to(detail_path(id));
    if let Err(e) = request.validate() {
        return redirect.errors(validation_messages(&e));
    }

    let repo = UserGroupRepository::new(state.pool.clone());
    match rename_group(&repo, id, &request.name).await {
        Ok(group) => {
            tracing::info!(group_id = %group.id, name = %group.name, "User group renamed");
            redirect.success("Updated the group name.")
        }
        Err(GroupError::NotFound) => FlashRedirect::to(USER_GROUPS_VIEW).error("Group not found"),
        Err(e) => redirect.error(group_error_message(&e, "Failed to update the group name.")),
    }
}

/// An uploaded picture read from the multipart body.
struct UploadedPicture {
    content_type: String,
    file_name: Option<String>,
    bytes: Vec<u8>,
}

async fn read_picture(multipart: &mut Multipart) -> Option<UploadedPicture> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Malformed multipart body");
                return None;
            }
        };
        if field.name() != Some(PICTURE_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        return match field.bytes().await {
            Ok(bytes) => Some(UploadedPicture {
                content_type,
                file_name,
                bytes: bytes.to_vec(),
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read uploaded picture");
                None
            }
        };
    }
}

/// POST /_api/admin/user-group/:id/picture/upload
async fn upload_group_picture(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> StatusResponse {
    let Some(picture) = read_picture(&mut multipart).await else {
        return StatusResponse::failed("File type error.");
    };

    let repo = UserGroupRepository::new(state.pool.clone());
    let group: UserGroup = match repo.find_by_id(id).await {
        Ok(Some(group)) => group.into(),
        Ok(None) => return StatusResponse::failed("UserGroup error."),
        Err(e) => {
            tracing::error!(error = %e, group_id = %id, "Failed to load user group");
            return StatusResponse::failed("UserGroup error.");
        }
    };

    if !is_image_mime(&picture.content_type) {
        return StatusResponse::failed(
            "File type error. Only image files is allowed to set as user picture.",
        );
    }

    let extension = extension_for(&picture.content_type, picture.file_name.as_deref());
    let path = group.picture_path(&extension);
    let url = match state.storage.save(&path, &picture.bytes).await {
        Ok(url) => url,
        Err(e) => {
            tracing::error!(error = %e, group_id = %id, "Failed to store group picture");
            return StatusResponse::failed(format!("Error while uploading to {}", e));
        }
    };

    if let Err(e) = repo.update_image(id, Some(&url)).await {
        tracing::error!(error = %e, group_id = %id, "Failed to save group picture URL");
        return StatusResponse::failed(format!("Error while uploading to {}", e));
    }

    // A picture with another extension is no longer referenced.
    if let Some(previous) = group
        .image
        .as_deref()
        .filter(|previous| *previous != url)
        .and_then(|previous| state.storage.path_for_url(previous))
    {
        if let Err(e) = state.storage.delete(previous).await {
            tracing::warn!(error = %e, group_id = %id, "Failed to delete previous group picture");
        }
    }

    tracing::info!(group_id = %id, size = picture.bytes.len(), "Group picture uploaded");
    StatusResponse {
        status: true,
        message: Some(String::new()),
        url: Some(url),
    }
}

/// POST /admin/user-group/:id/picture/delete
async fn delete_group_picture(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> FlashRedirect {
    let redirect = FlashRedirect::to(detail_path(id));
    let repo = UserGroupRepository::new(state.pool.clone());

    let group: UserGroup = match repo.find_by_id(id).await {
        Ok(Some(group)) => group.into(),
        Ok(None) => return FlashRedirect::to(USER_GROUPS_VIEW).error("Group not found"),
        Err(e) => {
            tracing::error!(error = %e, group_id = %id, "Failed to load user group");
            return redirect.error("Error while deleting group picture");
        }
    };

    if let Some(path) = group
        .image
        .as_deref()
        .and_then(|url| state.storage.path_for_url(url))
    {
        if let Err(e) = state.storage.delete(path).await {
            tracing::error!(error = %e, group_id = %id, "Failed to delete group picture file");
            return redirect.error("Error while deleting group picture");
        }
    }

    match repo.update_image(id, None).await {
        Ok(_) => {
            tracing::info!(group_id = %id, "Group picture deleted");
            redirect.success("Deleted group picture")
        }
        Err(e) => {
            tracing::error!(error = %e, group_id = %id, "Failed to clear group picture");
            redirect.error("Error while deleting group picture")
        }
    }
}

/// POST /admin/user-group.remove
///
/// Removes the group with all of its user and page relations. The group
/// picture file is left in storage.
async fn remove_user_group(
    State(state): State<AppState>,
    Json(request): Json<RemoveUserGroupRequest>,
) -> FlashRedirect {
    let redirect = FlashRedirect::to(USER_GROUPS_VIEW);
    let id = request.user_group_id;
    match UserGroupRepository::new(state.pool.clone())
        .delete_completely(id)
        .await
    {
        Ok(Some(group)) => {
            tracing::info!(group_id = %id, name = %group.name, "User group removed");
            redirect.success(format!("Deleted the group {}", group.name))
        }
        Ok(None) => redirect.error("Group not found"),
        Err(e) => {
            tracing::error!(error = %e, group_id = %id, "Failed to remove user group");
            redirect.error("Failed to delete the group.")
        }
    }
}

/// POST /admin/user-group-relation/create
async fn create_relation(
    State(state): State<AppState>,
    Json(request): Json<CreateGroupRelationRequest>,
) -> FlashRedirect {
    const FAILED: &str = "Error on create user-group relation";
    let redirect = FlashRedirect::to(detail_path(request.user_group_id));
    if let Err(e) = request.validate() {
        return redirect.errors(validation_messages(&e));
    }

    let groups_repo = UserGroupRepository::new(state.pool.clone());
    let users_repo = UserRepository::new(state.pool.clone());
    let lookup = tokio::try_join!(
        groups_repo.find_by_id(request.user_group_id),
        users_repo.find_by_username(&request.user_name),
    );

    let (group, user) = match lookup {
        Ok((Some(group), Some(user))) => (group, user),
        Ok(_) => return redirect.error(FAILED),
        Err(e) => {
            tracing::error!(error = %e, "Failed to look up group relation parties");
            return redirect.error(FAILED);
        }
    };

    match UserGroupRelationRepository::new(state.pool.clone())
        .create(group.id, user.id)
        .await
    {
        Ok(relation) => {
            tracing::info!(
                relation_id = %relation.id,
                group_id = %group.id,
                user_id = %user.id,
                "User added to group"
            );
            redirect
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                group_id = %group.id,
                user_id = %user.id,
                "Failed to add user to group"
            );
            redirect.error(FAILED)
        }
    }
}

/// POST /admin/user-group-relation/:id/remove-relation/:relation_id
async fn remove_relation(
    State(state): State<AppState>,
    Path((group_id, relation_id)): Path<(Uuid, Uuid)>,
) -> FlashRedirect {
    let redirect = FlashRedirect::to(detail_path(group_id));
    match UserGroupRelationRepository::new(state.pool.clone())
        .delete(group_id, relation_id)
        .await
    {
        Ok(removed) if removed > 0 => {
            tracing::info!(
                group_id = %group_id,
                relation_id = %relation_id,
                "User removed from group"
            );
            redirect
        }
        Ok(_) => redirect.error("Failed to remove the user from the group."),
        Err(e) => {
            tracing::error!(error = %e, group_id = %group_id, "Failed to remove user from group");
            redirect.error("Failed to remove the user from the group.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::services::StoreError;

    #[test]
    fn test_detail_path() {
        let id = Uuid::nil();
        assert_eq!(
            detail_path(id),
            "/admin/user-group-detail/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_group_error_messages() {
        assert_eq!(
            group_error_message(&GroupError::DuplicateName, "fallback"),
            "The same group name already exists"
        );
        assert_eq!(
            group_error_message(&GroupError::Store(StoreError::Backend("down".into())), "fallback"),
            "fallback"
        );
    }
}
