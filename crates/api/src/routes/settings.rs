//! Settings endpoints of the app, security and customize pages.
//!
//! Every endpoint takes `{settingForm: {...}}` and answers
//! `{status: true}` or `{status: false, message}`.

use axum::{extract::State, routing::post, Json, Router};
use serde_json::Value;

use super::{save_settings, SettingFormBody};
use crate::app::AppState;
use crate::extractors::AdminAuth;
use crate::middleware::metrics::{record_provider_reinit, record_settings_update};
use crate::responses::StatusResponse;
use domain::models::settings::{
    AppSettingForm, AwsSettingForm, CustomizeSettingForm, GitHubSettingForm, GoogleSettingForm,
    LdapSettingForm, MailSettingForm, PluginSettingForm, SamlSettingForm, SecuritySettingForm,
    SiteUrlSettingForm, SlackPassportSettingForm, TwitterSettingForm,
};
use domain::models::SettingsForm;
use domain::services::{bind_form, persist_form, AuthProvider, ProviderState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/_api/admin/settings/app", post(app_setting))
        .route("/_api/admin/settings/siteUrl", post(site_url_setting))
        .route("/_api/admin/settings/mail", post(mail_setting))
        .route("/_api/admin/settings/aws", post(aws_setting))
        .route("/_api/admin/settings/plugin", post(plugin_setting))
        .route("/_api/admin/security/general", post(security_setting))
        .route("/_api/admin/security/passport-ldap", post(passport_ldap))
        .route("/_api/admin/security/passport-saml", post(passport_saml))
        .route("/_api/admin/security/passport-google", post(passport_google))
        .route("/_api/admin/security/passport-github", post(passport_github))
        .route("/_api/admin/security/passport-twitter", post(passport_twitter))
        .route("/_api/admin/security/passport-slack", post(passport_slack))
        .route("/_api/admin/customize", post(customize_setting))
}

/// Saves a form that needs no follow-up work.
async fn save_plain<F: SettingsForm>(
    state: &AppState,
    label: &'static str,
    raw: Value,
) -> StatusResponse {
    match save_settings::<F, _>(state, label, raw, |_| Vec::new()).await {
        Ok(_) => StatusResponse::ok(),
        Err(rejection) => StatusResponse::failed(rejection.message()),
    }
}

fn provider_state_label(state: &ProviderState) -> &'static str {
    match state {
        ProviderState::Disabled => "disabled",
        ProviderState::Enabling => "enabling",
        ProviderState::Enabled => "enabled",
        ProviderState::Error(_) => "error",
    }
}

/// Saves a passport form, then rebuilds the provider's strategy from the
/// committed settings.
async fn save_passport<F: SettingsForm>(
    state: &AppState,
    provider: AuthProvider,
    raw: Value,
) -> StatusResponse {
    let snapshot = match save_settings::<F, _>(state, provider.as_str(), raw, |_| Vec::new()).await
    {
        Ok(snapshot) => snapshot,
        Err(rejection) => return StatusResponse::failed(rejection.message()),
    };

    let provider_state = state.providers.reinitialize(provider, &snapshot).await;
    record_provider_reinit(provider.as_str(), provider_state_label(&provider_state));

    match provider_state {
        ProviderState::Error(reason) => StatusResponse::failed(reason),
        _ => StatusResponse::ok(),
    }
}

/// POST /_api/admin/settings/app
async fn app_setting(
    State(state): State<AppState>,
    Json(body): Json<SettingFormBody>,
) -> StatusResponse {
    save_plain::<AppSettingForm>(&state, "app", body.setting_form).await
}

/// POST /_api/admin/settings/siteUrl
async fn site_url_setting(
    State(state): State<AppState>,
    Json(body): Json<SettingFormBody>,
) -> StatusResponse {
    save_plain::<SiteUrlSettingForm>(&state, "site_url", body.setting_form).await
}

/// POST /_api/admin/settings/mail
///
/// A test mail is sent to the acting admin with the submitted settings
/// before anything is saved.
async fn mail_setting(
    State(state): State<AppState>,
    admin: AdminAuth,
    Json(body): Json<SettingFormBody>,
) -> StatusResponse {
    let form = match bind_form::<MailSettingForm>(body.setting_form) {
        Ok(form) => form,
        Err(rejection) => {
            record_settings_update("mail", "rejected");
            return StatusResponse::failed(rejection.message());
        }
    };

    if let Err(e) = state.mailer.send_test(&form, &admin.user.email).await {
        tracing::warn!(error = %e, host = %form.smtp_host, "SMTP test mail failed");
        record_settings_update("mail", "rejected");
        return StatusResponse::failed(
            "Failed to send a test mail via SMTP. Please check the settings.",
        );
    }

    match persist_form(&state.settings, &form).await {
        Ok(snapshot) => {
            record_settings_update("mail", "done");
            state.mailer.reinitialize(&snapshot).await;
            StatusResponse::ok()
        }
        Err(e) => {
            record_settings_update("mail", "error");
            tracing::error!(error = %e, "Failed to save mail settings");
            StatusResponse::failed("Failed to save settings. Please try again.")
        }
    }
}

/// POST /_api/admin/settings/aws
async fn aws_setting(
    State(state): State<AppState>,
    Json(body): Json<SettingFormBody>,
) -> StatusResponse {
    save_plain::<AwsSettingForm>(&state, "aws", body.setting_form).await
}

/// POST /_api/admin/settings/plugin
async fn plugin_setting(
    State(state): State<AppState>,
    Json(body): Json<SettingFormBody>,
) -> StatusResponse {
    save_plain::<PluginSettingForm>(&state, "plugin", body.setting_form).await
}

/// POST /_api/admin/security/general
async fn security_setting(
    State(state): State<AppState>,
    Json(body): Json<SettingFormBody>,
) -> StatusResponse {
    let public_wiki_only = state.config.security.public_wiki_only;
    let result = save_settings::<SecuritySettingForm, _>(
        &state,
        "security",
        body.setting_form,
        |form| {
            if public_wiki_only {
                form.public_wiki_violations()
            } else {
                Vec::new()
            }
        },
    )
    .await;

    match result {
        Ok(_) => StatusResponse::ok(),
        Err(rejection) => StatusResponse::failed(rejection.message()),
    }
}

/// POST /_api/admin/security/passport-ldap
async fn passport_ldap(
    State(state): State<AppState>,
    Json(body): Json<SettingFormBody>,
) -> StatusResponse {
    save_passport::<LdapSettingForm>(&state, AuthProvider::Ldap, body.setting_form).await
}

/// POST /_api/admin/security/passport-saml
async fn passport_saml(
    State(state): State<AppState>,
    Json(body): Json<SettingFormBody>,
) -> StatusResponse {
    save_passport::<SamlSettingForm>(&state, AuthProvider::Saml, body.setting_form).await
}

/// POST /_api/admin/security/passport-google
async fn passport_google(
    State(state): State<AppState>,
    Json(body): Json<SettingFormBody>,
) -> StatusResponse {
    save_passport::<GoogleSettingForm>(&state, AuthProvider::Google, body.setting_form).await
}

/// POST /_api/admin/security/passport-github
async fn passport_github(
    State(state): State<AppState>,
    Json(body): Json<SettingFormBody>,
) -> StatusResponse {
    save_passport::<GitHubSettingForm>(&state, AuthProvider::GitHub, body.setting_form).await
}

/// POST /_api/admin/security/passport-twitter
async fn passport_twitter(
    State(state): State<AppState>,
    Json(body): Json<SettingFormBody>,
) -> StatusResponse {
    save_passport::<TwitterSettingForm>(&state, AuthProvider::Twitter, body.setting_form).await
}

/// POST /_api/admin/security/passport-slack
async fn passport_slack(
    State(state): State<AppState>,
    Json(body): Json<SettingFormBody>,
) -> StatusResponse {
    save_passport::<SlackPassportSettingForm>(&state, AuthProvider::Slack, body.setting_form)
        .await
}

/// POST /_api/admin/customize
async fn customize_setting(
    State(state): State<AppState>,
    Json(body): Json<SettingFormBody>,
) -> StatusResponse {
    save_plain::<CustomizeSettingForm>(&state, "customize", body.setting_form).await
}
