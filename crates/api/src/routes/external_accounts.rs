//! Linked third-party accounts.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use shared::pagination::{page_offset, Pager};
use uuid::Uuid;

use super::{pager, PageQuery};
use crate::app::AppState;
use crate::error::ApiError;
use crate::responses::FlashRedirect;
use domain::models::{ExternalAccount, ExternalAccountWithUser};
use persistence::repositories::ExternalAccountRepository;

const EXTERNAL_ACCOUNTS_VIEW: &str = "/admin/users/external-accounts";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/users/external-accounts", get(external_accounts_view))
        .route(
            "/admin/users/external-accounts/:id/remove",
            post(remove_external_account),
        )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalAccountsView {
    pub external_accounts: Vec<ExternalAccountWithUser>,
    pub pager: Pager,
}

/// GET /admin/users/external-accounts?page=
async fn external_accounts_view(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ExternalAccountsView>, ApiError> {
    let page = query.page();
    let limit = state.config.limits.external_accounts_per_page;
    let repo = ExternalAccountRepository::new(state.pool.clone());

    let (accounts, total) = tokio::try_join!(
        repo.list_paginated(i64::from(limit), page_offset(page, limit)),
        repo.count_all(),
    )?;

    Ok(Json(ExternalAccountsView {
        external_accounts: accounts.into_iter().map(Into::into).collect(),
        pager: pager(total, limit, page),
    }))
}

/// POST /admin/users/external-accounts/:id/remove
async fn remove_external_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> FlashRedirect {
    let redirect = FlashRedirect::to(EXTERNAL_ACCOUNTS_VIEW);
    match ExternalAccountRepository::new(state.pool.clone())
        .delete(id)
        .await
    {
        Ok(Some(entity)) => {
            let account = ExternalAccount::from(entity);
            tracing::info!(
                account_id = %account.id,
                user_id = %account.user_id,
                provider = %account.provider_type,
                "External account removed"
            );
            redirect.success(format!(
                "External account '{}' has been deleted",
                account.label()
            ))
        }
        Ok(None) => redirect.error("Failed to delete."),
        Err(e) => {
            tracing::error!(error = %e, account_id = %id, "Failed to remove external account");
            redirect.error("Failed to delete.")
        }
    }
}
