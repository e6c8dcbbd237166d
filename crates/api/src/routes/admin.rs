//! Admin settings views.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::presets::{HighlightJsStyle, HIGHLIGHT_JS_STYLES};
use domain::models::{ConfigNamespace, ConfigSnapshot, SnapshotExt};
use domain::services::ProviderState;

/// Configuration key listing the installed plugin packages.
const INSTALLED_PLUGINS_KEY: &str = "plugin:installed";
const PLUGINS_ENABLED_KEY: &str = "plugin:isEnabledPlugins";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(index))
        .route("/admin/app", get(app_view))
        .route("/admin/security", get(security_view))
        .route("/admin/customize", get(customize_view))
        .route("/admin/importer", get(importer_view))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexView {
    pub plugins: Vec<Value>,
    pub is_enabled_plugins: bool,
}

impl IndexView {
    fn from_config(config: &ConfigSnapshot) -> Self {
        let plugins = match config.get(INSTALLED_PLUGINS_KEY) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        Self {
            plugins,
            is_enabled_plugins: config.flag(PLUGINS_ENABLED_KEY),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub setting_form: ConfigSnapshot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityView {
    pub setting_form: ConfigSnapshot,
    pub is_acl_enabled: bool,
    pub providers: BTreeMap<&'static str, ProviderState>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizeView {
    pub setting_form: ConfigSnapshot,
    pub highlight_js_css_selector_options: &'static [HighlightJsStyle],
}

/// GET /admin
async fn index(State(state): State<AppState>) -> Result<Json<IndexView>, ApiError> {
    let config = state.settings.get(ConfigNamespace::Crowi).await?;
    Ok(Json(IndexView::from_config(&config)))
}

/// GET /admin/app
async fn app_view(State(state): State<AppState>) -> Result<Json<SettingsView>, ApiError> {
    let setting_form = state.settings.get(ConfigNamespace::Crowi).await?;
    Ok(Json(SettingsView { setting_form }))
}

/// GET /admin/security
async fn security_view(State(state): State<AppState>) -> Result<Json<SecurityView>, ApiError> {
    let setting_form = state.settings.get(ConfigNamespace::Crowi).await?;
    let providers = state
        .providers
        .states()
        .await
        .into_iter()
        .map(|(provider, provider_state)| (provider.as_str(), provider_state))
        .collect();

    Ok(Json(SecurityView {
        setting_form,
        is_acl_enabled: state.is_acl_enabled(),
        providers,
    }))
}

/// GET /admin/customize
async fn customize_view(State(state): State<AppState>) -> Result<Json<CustomizeView>, ApiError> {
    let setting_form = state.settings.get(ConfigNamespace::Crowi).await?;
    Ok(Json(CustomizeView {
        setting_form,
        highlight_js_css_selector_options: &HIGHLIGHT_JS_STYLES,
    }))
}

/// GET /admin/importer
async fn importer_view(State(state): State<AppState>) -> Result<Json<SettingsView>, ApiError> {
    let setting_form = state.settings.get(ConfigNamespace::Crowi).await?;
    Ok(Json(SettingsView { setting_form }))
}
