//! esa.io and Qiita:Team importer settings and import runs.

use axum::{extract::State, routing::post, Json, Router};
use serde_json::Value;

use super::{save_settings, SettingFormBody};
use crate::app::AppState;
use crate::extractors::AdminAuth;
use crate::middleware::metrics::record_import;
use crate::responses::StatusResponse;
use domain::models::importer::join_import_errors;
use domain::models::settings::{EsaImporterSettingForm, QiitaImporterSettingForm};
use domain::models::{ImportSource, SettingsForm};
use domain::services::import_posts;
use persistence::repositories::PageRepository;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/_api/admin/settings/importerEsa", post(esa_setting))
        .route("/_api/admin/settings/importerQiita", post(qiita_setting))
        .route("/_api/admin/import/esa", post(import_esa))
        .route("/_api/admin/import/qiita", post(import_qiita))
        .route("/_api/admin/import/testEsaAPI", post(test_esa_api))
        .route("/_api/admin/import/testQiitaAPI", post(test_qiita_api))
}

/// Saves the importer settings of `source` and rebuilds its client.
async fn save_importer<F: SettingsForm>(
    state: &AppState,
    source: ImportSource,
    raw: Value,
) -> StatusResponse {
    match save_settings::<F, _>(state, source.as_str(), raw, |_| Vec::new()).await {
        Ok(snapshot) => {
            state.importers.reinitialize(source, &snapshot).await;
            StatusResponse::ok()
        }
        Err(rejection) => StatusResponse::failed(rejection.message()),
    }
}

/// POST /_api/admin/settings/importerEsa
async fn esa_setting(
    State(state): State<AppState>,
    Json(body): Json<SettingFormBody>,
) -> StatusResponse {
    save_importer::<EsaImporterSettingForm>(&state, ImportSource::Esa, body.setting_form).await
}

/// POST /_api/admin/settings/importerQiita
async fn qiita_setting(
    State(state): State<AppState>,
    Json(body): Json<SettingFormBody>,
) -> StatusResponse {
    save_importer::<QiitaImporterSettingForm>(&state, ImportSource::Qiita, body.setting_form).await
}

/// Imports every post of `source` as pages owned by the acting admin.
async fn run_import(state: &AppState, admin: &AdminAuth, source: ImportSource) -> StatusResponse {
    let client = match state.importers.client(source).await {
        Ok(client) => client,
        Err(e) => return StatusResponse::failed(e.to_string()),
    };

    let writer = PageRepository::new(state.pool.clone());
    match import_posts(client.as_ref(), &writer, admin.user.id).await {
        Ok(errors) => {
            record_import(source.as_str(), errors.len());
            if errors.is_empty() {
                StatusResponse::ok()
            } else {
                tracing::warn!(
                    source = %source,
                    failed = errors.len(),
                    "Import finished with errors"
                );
                StatusResponse::failed(join_import_errors(&errors))
            }
        }
        Err(e) => {
            tracing::error!(error = %e, source = %source, "Import aborted");
            StatusResponse::failed(e.to_string())
        }
    }
}

/// POST /_api/admin/import/esa
async fn import_esa(State(state): State<AppState>, admin: AdminAuth) -> StatusResponse {
    run_import(&state, &admin, ImportSource::Esa).await
}

/// POST /_api/admin/import/qiita
async fn import_qiita(State(state): State<AppState>, admin: AdminAuth) -> StatusResponse {
    run_import(&state, &admin, ImportSource::Qiita).await
}

async fn test_connection(state: &AppState, source: ImportSource) -> StatusResponse {
    let client = match state.importers.client(source).await {
        Ok(client) => client,
        Err(e) => return StatusResponse::failed(e.to_string()),
    };

    match client.test_connection().await {
        Ok(()) => StatusResponse::ok(),
        Err(e) => {
            tracing::warn!(error = %e, source = %source, "Importer connection test failed");
            StatusResponse::failed(e.to_string())
        }
    }
}

/// POST /_api/admin/import/testEsaAPI
async fn test_esa_api(State(state): State<AppState>) -> StatusResponse {
    test_connection(&state, ImportSource::Esa).await
}

/// POST /_api/admin/import/testQiitaAPI
async fn test_qiita_api(State(state): State<AppState>) -> StatusResponse {
    test_connection(&state, ImportSource::Qiita).await
}
