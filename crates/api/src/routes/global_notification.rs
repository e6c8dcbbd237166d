//! Global notification rules.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::responses::{ApiResponse, FlashRedirect};
use domain::models::global_notification::ToggleGlobalNotificationQuery;
use domain::models::{GlobalNotification, GlobalNotificationForm, GlobalNotificationInput};
use domain::services::settings_pipeline::validation_messages;
use persistence::repositories::GlobalNotificationRepository;

const GLOBAL_NOTIFICATION_SECTION: &str = "/admin/notification#global-notification";
const CREATE_FAILED: &str = "Error occurred in creating a new global notification setting";
const UPDATE_FAILED: &str = "Error occurred in updating the global notification setting";

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/admin/global-notification/new",
            get(new_notification_view).post(create_notification),
        )
        .route("/admin/global-notification/:id", get(notification_view))
        .route(
            "/admin/global-notification/:id/update",
            post(update_notification),
        )
        .route(
            "/admin/global-notification/:id/remove",
            post(remove_notification),
        )
        .route(
            "/_api/admin/global-notification/toggleIsEnabled",
            post(toggle_notification),
        )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalNotificationView {
    pub global_notification: Option<GlobalNotification>,
}

/// Validates a submitted form and resolves it into repository input. Errors
/// are the messages to show, prefixed with `context`.
fn form_input(
    form: GlobalNotificationForm,
    context: &str,
) -> Result<GlobalNotificationInput, Vec<String>> {
    if let Err(e) = form.validate() {
        return Err(validation_messages(&e));
    }
    form.into_input()
        .map_err(|e| vec![format!("{}: {}", context, e)])
}

/// GET /admin/global-notification/new
async fn new_notification_view() -> Json<GlobalNotificationView> {
    Json(GlobalNotificationView {
        global_notification: None,
    })
}

/// GET /admin/global-notification/:id
async fn notification_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GlobalNotificationView>, ApiError> {
    let global_notification = GlobalNotificationRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .map(GlobalNotification::from);
    Ok(Json(GlobalNotificationView {
        global_notification,
    }))
}

/// POST /admin/global-notification/new
async fn create_notification(
    State(state): State<AppState>,
    Json(form): Json<GlobalNotificationForm>,
) -> FlashRedirect {
    let redirect = FlashRedirect::to(GLOBAL_NOTIFICATION_SECTION);
    let input = match form_input(form, CREATE_FAILED) {
        Ok(input) => input,
        Err(errors) => return redirect.errors(errors),
    };

    match GlobalNotificationRepository::new(state.pool.clone())
        .create(&input)
        .await
    {
        Ok(entity) => {
            tracing::info!(
                notification_id = %entity.id,
                trigger_path = %entity.trigger_path,
                "Global notification created"
            );
            redirect
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create global notification");
            redirect.error(CREATE_FAILED)
        }
    }
}

/// POST /admin/global-notification/:id/update
async fn update_notification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<GlobalNotificationForm>,
) -> FlashRedirect {
    let redirect = FlashRedirect::to(GLOBAL_NOTIFICATION_SECTION);
    let input = match form_input(form, UPDATE_FAILED) {
        Ok(input) => input,
        Err(errors) => return redirect.errors(errors),
    };

    match GlobalNotificationRepository::new(state.pool.clone())
        .update(id, &input)
        .await
    {
        Ok(Some(_)) => {
            tracing::info!(notification_id = %id, "Global notification updated");
            redirect
        }
        Ok(None) => redirect.error(format!("{}: not found", UPDATE_FAILED)),
        Err(e) => {
            tracing::error!(
                error = %e,
                notification_id = %id,
                "Failed to update global notification"
            );
            redirect.error(UPDATE_FAILED)
        }
    }
}

/// POST /admin/global-notification/:id/remove
async fn remove_notification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> FlashRedirect {
    let redirect = FlashRedirect::to(GLOBAL_NOTIFICATION_SECTION);
    match GlobalNotificationRepository::new(state.pool.clone())
        .delete(id)
        .await
    {
        Ok(removed) if removed > 0 => {
            tracing::info!(notification_id = %id, "Global notification removed");
            redirect
        }
        Ok(_) => redirect.error("Error in deleting global notification setting"),
        Err(e) => {
            tracing::error!(
                error = %e,
                notification_id = %id,
                "Failed to remove global notification"
            );
            redirect.error("Error in deleting global notification setting")
        }
    }
}

/// POST /_api/admin/global-notification/toggleIsEnabled?id=&isEnabled=
async fn toggle_notification(
    State(state): State<AppState>,
    Query(query): Query<ToggleGlobalNotificationQuery>,
) -> ApiResponse {
    match GlobalNotificationRepository::new(state.pool.clone())
        .set_enabled(query.id, query.enable())
        .await
    {
        Ok(Some(entity)) => {
            tracing::info!(
                notification_id = %entity.id,
                enabled = entity.is_enabled,
                "Global notification toggled"
            );
            ApiResponse::success()
        }
        Ok(None) => ApiResponse::error("Global notification setting not found"),
        Err(e) => {
            tracing::error!(
                error = %e,
                notification_id = %query.id,
                "Failed to toggle global notification"
            );
            ApiResponse::error("Failed to update the global notification setting")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::NotificationTarget;
    use serde_json::json;

    fn form(value: serde_json::Value) -> GlobalNotificationForm {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_mail_form_resolves_to_input() {
        let input = form_input(
            form(json!({
                "notifyToType": "mail",
                "toEmail": "ops@example.com",
                "triggerPath": "/projects/*",
                "triggerEvent:pageCreate": "pageCreate",
                "triggerEvent:pageEdit": ""
            })),
            CREATE_FAILED,
        )
        .unwrap();

        assert_eq!(input.trigger_path, "/projects/*");
        assert_eq!(input.trigger_events, vec!["pageCreate".to_string()]);
        assert_eq!(
            input.target,
            NotificationTarget::Mail {
                to_email: "ops@example.com".into()
            }
        );
    }

    #[test]
    fn test_slack_form_is_undefined_type() {
        let errors = form_input(
            form(json!({
                "notifyToType": "slack",
                "slackChannels": "general",
                "triggerPath": "/"
            })),
            CREATE_FAILED,
        )
        .unwrap_err();

        assert_eq!(
            errors,
            vec![
                "Error occurred in creating a new global notification setting: undefined notification type"
                    .to_string()
            ]
        );
    }
}
