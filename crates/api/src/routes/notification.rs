//! Slack notification settings and per-path update posts.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

use super::{save_settings, SettingFormBody};
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminAuth;
use crate::responses::{ApiResponse, FlashRedirect};
use crate::services::slack::{is_app_configured, INCOMING_WEBHOOK_URL_KEY, TOKEN_KEY};
use domain::models::settings::{SlackAppSettingForm, SlackIwhSettingForm};
use domain::models::update_post::{AddUpdatePostRequest, RemoveUpdatePostRequest};
use domain::models::{ConfigNamespace, ConfigSnapshot, GlobalNotification, SnapshotExt, UpdatePost};
use domain::services::settings_pipeline::validation_messages;
use persistence::repositories::{GlobalNotificationRepository, UpdatePostRepository};

const NOTIFICATION_VIEW: &str = "/admin/notification";
const INCOMING_WEBHOOK_SECTION: &str = "/admin/notification#slack-incoming-webhooks";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/notification", get(notification_view))
        .route("/admin/notification/slackSetting", post(slack_setting))
        .route("/admin/notification/slackIwhSetting", post(slack_iwh_setting))
        .route("/admin/notification/slackAuth", get(slack_auth))
        .route(
            "/admin/notification/slackSetting/disconnect",
            post(disconnect_slack),
        )
        .route("/_api/admin/notification.add", post(add_update_post))
        .route("/_api/admin/notification.remove", post(remove_update_post))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub slack_setting: ConfigSnapshot,
    pub has_slack_iwh_url: bool,
    pub has_slack_token: bool,
    pub global_notifications: Vec<GlobalNotification>,
    pub user_notifications: Vec<UpdatePost>,
}

/// Slack settings as shown on the view. The webhook URL is always present.
fn slack_setting_view(mut config: ConfigSnapshot) -> ConfigSnapshot {
    if config.str_value(INCOMING_WEBHOOK_URL_KEY).is_none() {
        config.insert(INCOMING_WEBHOOK_URL_KEY.to_string(), Value::String(String::new()));
    }
    config
}

/// GET /admin/notification
async fn notification_view(
    State(state): State<AppState>,
) -> Result<Json<NotificationView>, ApiError> {
    let config = state.settings.get(ConfigNamespace::Notification).await?;
    let global_repo = GlobalNotificationRepository::new(state.pool.clone());
    let update_post_repo = UpdatePostRepository::new(state.pool.clone());

    let (global_notifications, user_notifications) =
        tokio::try_join!(global_repo.list_all(), update_post_repo.list_all())?;

    Ok(Json(NotificationView {
        has_slack_iwh_url: config.non_empty_str(INCOMING_WEBHOOK_URL_KEY).is_some(),
        has_slack_token: config.non_empty_str(TOKEN_KEY).is_some(),
        slack_setting: slack_setting_view(config),
        global_notifications: global_notifications.into_iter().map(Into::into).collect(),
        user_notifications: user_notifications.into_iter().map(Into::into).collect(),
    }))
}

/// POST /admin/notification/slackSetting
async fn slack_setting(
    State(state): State<AppState>,
    Json(body): Json<SettingFormBody>,
) -> FlashRedirect {
    match save_settings::<SlackAppSettingForm, _>(&state, "slack_app", body.setting_form, |_| {
        Vec::new()
    })
    .await
    {
        Ok(snapshot) => {
            state.slack.reinitialize(&snapshot).await;
            FlashRedirect::to(NOTIFICATION_VIEW).success("Successfully Updated!")
        }
        Err(rejection) => FlashRedirect::to(NOTIFICATION_VIEW)
            .errors(rejection.errors)
            .with_form(rejection.form),
    }
}

/// POST /admin/notification/slackIwhSetting
async fn slack_iwh_setting(
    State(state): State<AppState>,
    Json(body): Json<SettingFormBody>,
) -> FlashRedirect {
    match save_settings::<SlackIwhSettingForm, _>(&state, "slack_iwh", body.setting_form, |_| {
        Vec::new()
    })
    .await
    {
        Ok(snapshot) => {
            state.slack.reinitialize(&snapshot).await;
            FlashRedirect::to(INCOMING_WEBHOOK_SECTION).success("Successfully Updated!")
        }
        Err(rejection) => FlashRedirect::to(INCOMING_WEBHOOK_SECTION)
            .errors(rejection.errors)
            .with_form(rejection.form),
    }
}

#[derive(Debug, Deserialize)]
pub struct SlackAuthQuery {
    pub code: Option<String>,
}

/// Stores the Slack token and rebuilds the transport.
async fn store_slack_token(state: &AppState, token: String) -> Result<(), ApiError> {
    let changes: ConfigSnapshot = [(TOKEN_KEY.to_string(), Value::String(token))]
        .into_iter()
        .collect();
    let snapshot = state
        .settings
        .commit(ConfigNamespace::Notification, changes)
        .await?;
    state.slack.reinitialize(&snapshot).await;
    Ok(())
}

/// GET /admin/notification/slackAuth?code=
///
/// OAuth callback of the Slack app.
async fn slack_auth(
    State(state): State<AppState>,
    Query(query): Query<SlackAuthQuery>,
) -> FlashRedirect {
    let redirect = FlashRedirect::to(NOTIFICATION_VIEW);

    let config = match state.settings.get(ConfigNamespace::Notification).await {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load notification settings");
            return redirect.error("Failed to fetch access_token. Please do connect again.");
        }
    };

    let code = match query.code.as_deref().filter(|code| !code.is_empty()) {
        Some(code) if is_app_configured(&config) => code,
        _ => return redirect,
    };

    match state.slack.exchange_code(&config, code).await {
        Ok(token) => match store_slack_token(&state, token).await {
            Ok(()) => {
                tracing::info!("Slack app connected");
                redirect.success("Successfully Connected!")
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to save Slack access token");
                redirect.error("Failed to save access_token. Please try again.")
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "Slack OAuth exchange failed");
            redirect.error("Failed to fetch access_token. Please do connect again.")
        }
    }
}

/// POST /admin/notification/slackSetting/disconnect
async fn disconnect_slack(State(state): State<AppState>) -> FlashRedirect {
    let redirect = FlashRedirect::to(NOTIFICATION_VIEW);
    match store_slack_token(&state, String::new()).await {
        Ok(()) => {
            tracing::info!("Slack app disconnected");
            redirect.success("Successfully Disconnected!")
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to clear Slack access token");
            redirect.error("Failed to disconnect. Please try again.")
        }
    }
}

/// POST /_api/admin/notification.add
async fn add_update_post(
    State(state): State<AppState>,
    admin: AdminAuth,
    Json(request): Json<AddUpdatePostRequest>,
) -> ApiResponse {
    if let Err(e) = request.validate() {
        return ApiResponse::error(validation_messages(&e).join("\n"));
    }

    let repo = UpdatePostRepository::new(state.pool.clone());
    match repo
        .create(
            &request.path_pattern,
            &request.normalized_channel(),
            admin.user.id,
        )
        .await
    {
        Ok(entity) => {
            let update_post = UpdatePost::from(entity);
            tracing::info!(
                update_post_id = %update_post.id,
                channel = %update_post.channel,
                "Update post created"
            );
            ApiResponse::success_with(&json!({ "updatePost": update_post }))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create update post");
            ApiResponse::error("Failed to create the notification setting.")
        }
    }
}

/// POST /_api/admin/notification.remove
async fn remove_update_post(
    State(state): State<AppState>,
    Json(request): Json<RemoveUpdatePostRequest>,
) -> ApiResponse {
    let repo = UpdatePostRepository::new(state.pool.clone());
    match repo.delete(request.id).await {
        Ok(0) => ApiResponse::error("Notification setting not found."),
        Ok(_) => ApiResponse::success(),
        Err(e) => {
            tracing::error!(
                error = %e,
                update_post_id = %request.id,
                "Failed to remove update post"
            );
            ApiResponse::error("Failed to remove the notification setting.")
        }
    }
}
