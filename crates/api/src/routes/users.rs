//! User administration.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shared::pagination::{page_offset, Pager};
use shared::password::generate_hashed_password;
use shared::validation::parse_email_lines;
use uuid::Uuid;
use validator::Validate;

use super::{pager, PageQuery};
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_users_invited;
use crate::responses::{ApiResponse, FlashRedirect};
use crate::services::mailer::invitation_body;
use domain::models::user::{
    InviteUsersRequest, InvitedUser, ResetPasswordRequest, ResetPasswordResult,
};
use domain::models::{ConfigNamespace, PublicUser, SnapshotExt, User, UserStatus};
use domain::services::remove_user;
use domain::services::settings_pipeline::validation_messages;
use persistence::entities::UserEntity;
use persistence::repositories::{UserRemovalRepository, UserRepository};

const USERS_VIEW: &str = "/admin/users";
const SEARCH_LIMIT: i64 = 20;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(users_view))
        .route("/admin/users/invite", post(invite_users))
        .route("/admin/user/:id/makeAdmin", post(make_admin))
        .route("/admin/user/:id/removeFromAdmin", post(remove_from_admin))
        .route("/admin/user/:id/activate", post(activate_user))
        .route("/admin/user/:id/suspend", post(suspend_user))
        .route("/admin/user/:id/remove", post(remove))
        .route("/admin/user/:id/removeCompletely", post(remove_completely))
        .route("/_api/admin/users.resetPassword", post(reset_password))
        .route("/_api/admin/users.search", get(search_users))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersView {
    pub users: Vec<PublicUser>,
    pub pager: Pager,
    pub active_users: i64,
    pub user_upper_limit: u32,
    pub is_user_count_exceeds_upper_limit: bool,
}

/// GET /admin/users?page=
async fn users_view(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<UsersView>, ApiError> {
    let limits = &state.config.limits;
    let page = query.page();
    let limit = limits.users_per_page;
    let repo = UserRepository::new(state.pool.clone());

    let (users, total, active_users) = tokio::try_join!(
        repo.list_paginated(i64::from(limit), page_offset(page, limit)),
        repo.count_all(),
        repo.count_by_status(UserStatus::Active),
    )?;

    Ok(Json(UsersView {
        users: users
            .into_iter()
            .map(|entity| User::from(entity).to_public())
            .collect(),
        pager: pager(total, limit, page),
        active_users,
        user_upper_limit: limits.user_upper_limit,
        is_user_count_exceeds_upper_limit: limits.is_user_count_exceeded(active_users),
    }))
}

/// Creates one invited user. `password` is `None` when the address is
/// already registered or the insert failed.
async fn invite_one(repo: &UserRepository, email: String) -> InvitedUser {
    let generated = match generate_hashed_password() {
        Ok(generated) => generated,
        Err(e) => {
            tracing::error!(error = %e, "Failed to generate an initial password");
            return InvitedUser {
                email,
                password: None,
            };
        }
    };

    let password = match repo.create_invited(&email, &generated.hash).await {
        Ok(Some(user)) => {
            tracing::info!(user_id = %user.id, "User invited");
            Some(generated.plain)
        }
        Ok(None) => None,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create invited user");
            None
        }
    };
    InvitedUser { email, password }
}

/// POST /admin/users/invite
async fn invite_users(
    State(state): State<AppState>,
    Json(request): Json<InviteUsersRequest>,
) -> FlashRedirect {
    let redirect = FlashRedirect::to(USERS_VIEW);
    if let Err(e) = request.validate() {
        return redirect.error(validation_messages(&e).join("\n"));
    }

    let repo = UserRepository::new(state.pool.clone());
    let mut invited = Vec::new();
    for email in parse_email_lines(&request.email_list) {
        invited.push(invite_one(&repo, email).await);
    }
    let created = invited.iter().filter(|user| user.password.is_some()).count();
    record_users_invited(created);

    if request.send_email && created > 0 {
        send_invitations(&state, &invited).await;
    }

    redirect.with_data(&invited)
}

async fn send_invitations(state: &AppState, invited: &[InvitedUser]) {
    let config = match state.settings.get(ConfigNamespace::Crowi).await {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load settings for invitation mail");
            return;
        }
    };
    let app_title = config.non_empty_str("app:title").unwrap_or("Wiki");
    let site_url = config.non_empty_str("app:siteUrl").unwrap_or_default();
    let subject = format!("Invitation to {}", app_title);

    for user in invited {
        let Some(password) = &user.password else {
            continue;
        };
        let body = invitation_body(app_title, site_url, &user.email, password);
        if let Err(e) = state.mailer.send(&user.email, &subject, body).await {
            tracing::warn!(error = %e, "Failed to send invitation mail");
        }
    }
}

/// Reports a single-user update on the users view.
fn user_update_result(
    result: Result<Option<UserEntity>, sqlx::Error>,
    user_id: Uuid,
    success: impl FnOnce(&User) -> String,
) -> FlashRedirect {
    let redirect = FlashRedirect::to(USERS_VIEW);
    match result {
        Ok(Some(entity)) => {
            let user = User::from(entity);
            redirect.success(success(&user))
        }
        Ok(None) => redirect.error("User not found."),
        Err(e) => {
            tracing::error!(error = %e, user_id = %user_id, "Failed to update user");
            redirect.error("Failed to update the user.")
        }
    }
}

/// POST /admin/user/:id/makeAdmin
async fn make_admin(State(state): State<AppState>, Path(id): Path<Uuid>) -> FlashRedirect {
    let result = UserRepository::new(state.pool.clone()).set_admin(id, true).await;
    user_update_result(result, id, |user| {
        tracing::info!(user_id = %user.id, "User promoted to admin");
        format!("{} is now an administrator.", user.display_name())
    })
}

/// POST /admin/user/:id/removeFromAdmin
async fn remove_from_admin(State(state): State<AppState>, Path(id): Path<Uuid>) -> FlashRedirect {
    let result = UserRepository::new(state.pool.clone()).set_admin(id, false).await;
    user_update_result(result, id, |user| {
        tracing::info!(user_id = %user.id, "User removed from admins");
        format!("{} is no longer an administrator.", user.display_name())
    })
}

/// POST /admin/user/:id/activate
///
/// Refused once the active user count has reached the upper limit.
async fn activate_user(State(state): State<AppState>, Path(id): Path<Uuid>) -> FlashRedirect {
    let repo = UserRepository::new(state.pool.clone());
    match repo.count_by_status(UserStatus::Active).await {
        Ok(active) if state.config.limits.is_user_count_exceeded(active) => {
            return FlashRedirect::to(USERS_VIEW).error(
                "The number of active users has reached the upper limit. Please suspend a user first.",
            );
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!(error = %e, "Failed to count active users");
            return FlashRedirect::to(USERS_VIEW).error("Failed to update the user.");
        }
    }

    let result = repo.set_status(id, UserStatus::Active).await;
    user_update_result(result, id, |user| {
        tracing::info!(user_id = %user.id, "User activated");
        format!("{} has been activated.", user.display_name())
    })
}

/// POST /admin/user/:id/suspend
async fn suspend_user(State(state): State<AppState>, Path(id): Path<Uuid>) -> FlashRedirect {
    let result = UserRepository::new(state.pool.clone())
        .set_status(id, UserStatus::Suspended)
        .await;
    user_update_result(result, id, |user| {
        tracing::info!(user_id = %user.id, "User suspended");
        format!("{} has been suspended.", user.display_name())
    })
}

/// POST /admin/user/:id/remove
///
/// Soft-deletes the user, then removes linked accounts and the user's pages.
async fn remove(State(state): State<AppState>, Path(id): Path<Uuid>) -> FlashRedirect {
    let steps = UserRemovalRepository::new(state.pool.clone());
    let report = remove_user(&steps, id).await;
    let redirect = FlashRedirect::to(USERS_VIEW);

    if report.is_success() {
        tracing::info!(user_id = %id, steps = report.completed.len(), "User removed");
        let name = report.username.as_deref().unwrap_or("The user");
        redirect.success(format!("{}'s account has been deleted", name))
    } else {
        redirect.error("Failed to delete.")
    }
}

/// POST /admin/user/:id/removeCompletely
async fn remove_completely(State(state): State<AppState>, Path(id): Path<Uuid>) -> FlashRedirect {
    let redirect = FlashRedirect::to(USERS_VIEW);
    match UserRepository::new(state.pool.clone()).delete(id).await {
        Ok(removed) if removed > 0 => {
            tracing::info!(user_id = %id, "User deleted completely");
            redirect.success("Deleted")
        }
        Ok(_) => redirect.error("Failed to delete completely."),
        Err(e) => {
            tracing::error!(error = %e, user_id = %id, "Failed to delete user completely");
            redirect.error("Failed to delete completely.")
        }
    }
}

/// POST /_api/admin/users.resetPassword
async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> ApiResponse {
    let generated = match generate_hashed_password() {
        Ok(generated) => generated,
        Err(e) => {
            tracing::error!(error = %e, "Failed to generate password");
            return ApiResponse::error("Error");
        }
    };

    match UserRepository::new(state.pool.clone())
        .update_password(request.user_id, &generated.hash)
        .await
    {
        Ok(Some(entity)) => {
            tracing::info!(user_id = %request.user_id, "Password reset");
            ApiResponse::success_with(&ResetPasswordResult {
                user: User::from(entity).to_public(),
                password: generated.plain,
            })
        }
        Ok(None) => ApiResponse::error("Error"),
        Err(e) => {
            tracing::error!(error = %e, user_id = %request.user_id, "Failed to reset password");
            ApiResponse::error("Error")
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserSearchQuery {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
struct UserSearchResult {
    data: Vec<PublicUser>,
}

/// GET /_api/admin/users.search?email=
async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<UserSearchQuery>,
) -> ApiResponse {
    let part = query.email.trim();
    if part.is_empty() {
        return ApiResponse::success_with(&UserSearchResult { data: Vec::new() });
    }

    match UserRepository::new(state.pool.clone())
        .search_by_email(part, SEARCH_LIMIT)
        .await
    {
        Ok(users) => ApiResponse::success_with(&UserSearchResult {
            data: users
                .into_iter()
                .map(|entity| User::from(entity).to_public())
                .collect(),
        }),
        Err(e) => {
            tracing::error!(error = %e, "User search failed");
            ApiResponse::error("Failed to search users.")
        }
    }
}
