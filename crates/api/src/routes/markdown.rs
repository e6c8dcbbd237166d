//! Markdown settings view and forms.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use super::{save_settings, SettingFormBody};
use crate::app::AppState;
use crate::error::ApiError;
use crate::responses::FlashRedirect;
use domain::models::presets::{XssWhiteList, RECOMMENDED_XSS_WHITELIST};
use domain::models::settings::{LineBreaksSettingForm, PresentationSettingForm, XssSettingForm};
use domain::models::{ConfigNamespace, ConfigSnapshot, SettingsForm};

const MARKDOWN_VIEW: &str = "/admin/markdown";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/markdown", get(markdown_view))
        .route("/admin/markdown/lineBreaksSetting", post(line_breaks_setting))
        .route("/admin/markdown/presentationSetting", post(presentation_setting))
        .route("/admin/markdown/xss", post(xss_setting))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkdownView {
    pub markdown_setting: ConfigSnapshot,
    pub recommended_xss_white_list: XssWhiteList,
}

/// GET /admin/markdown
async fn markdown_view(State(state): State<AppState>) -> Result<Json<MarkdownView>, ApiError> {
    let markdown_setting = state.settings.get(ConfigNamespace::Markdown).await?;
    Ok(Json(MarkdownView {
        markdown_setting,
        recommended_xss_white_list: RECOMMENDED_XSS_WHITELIST,
    }))
}

async fn save_markdown<F: SettingsForm>(
    state: &AppState,
    label: &'static str,
    raw: Value,
) -> FlashRedirect {
    match save_settings::<F, _>(state, label, raw, |_| Vec::new()).await {
        Ok(_) => FlashRedirect::to(MARKDOWN_VIEW).success("Successfully updated!"),
        Err(rejection) => FlashRedirect::to(MARKDOWN_VIEW)
            .errors(rejection.errors)
            .with_form(rejection.form),
    }
}

/// POST /admin/markdown/lineBreaksSetting
async fn line_breaks_setting(
    State(state): State<AppState>,
    Json(body): Json<SettingFormBody>,
) -> FlashRedirect {
    save_markdown::<LineBreaksSettingForm>(&state, "markdown_line_breaks", body.setting_form).await
}

/// POST /admin/markdown/presentationSetting
async fn presentation_setting(
    State(state): State<AppState>,
    Json(body): Json<SettingFormBody>,
) -> FlashRedirect {
    save_markdown::<PresentationSettingForm>(&state, "markdown_presentation", body.setting_form)
        .await
}

/// POST /admin/markdown/xss
async fn xss_setting(
    State(state): State<AppState>,
    Json(body): Json<SettingFormBody>,
) -> FlashRedirect {
    save_markdown::<XssSettingForm>(&state, "markdown_xss", body.setting_form).await
}
