//! Search index administration and the admin event stream.

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::Stream;
use serde::Serialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};

use crate::app::AppState;
use crate::middleware::metrics::record_search_rebuild;
use crate::responses::{ApiResponse, FlashRedirect};
use domain::models::SearchEvent;
use domain::services::rebuild_index;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/search", get(search_view))
        .route("/_api/admin/search/build", post(build_index))
        .route("/_api/admin/events", get(admin_events))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchView {
    pub index_name: String,
}

/// GET /admin/search
async fn search_view(State(state): State<AppState>) -> Response {
    if state.searcher.is_none() {
        return FlashRedirect::to("/admin").into_response();
    }
    Json(SearchView {
        index_name: state.config.search.index_name.clone(),
    })
    .into_response()
}

/// POST /_api/admin/search/build
///
/// Answers once the index is recreated; pages are added in the background
/// and progress is published on the event stream.
async fn build_index(State(state): State<AppState>) -> ApiResponse {
    let Some(searcher) = state.searcher.clone() else {
        return ApiResponse::error("ElasticSearch Integration is not set up.");
    };

    match rebuild_index(searcher, state.events.clone()).await {
        Ok(()) => {
            record_search_rebuild("started");
            ApiResponse::success()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to build search index");
            record_search_rebuild("failed");
            ApiResponse::error(e.to_string())
        }
    }
}

fn to_sse_event(event: &SearchEvent) -> Option<Event> {
    match Event::default()
        .event(event.event_name())
        .json_data(event.progress())
    {
        Ok(sse) => Some(sse),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to serialize search event");
            None
        }
    }
}

/// GET /_api/admin/events
///
/// Server-sent search progress. Events missed by a lagging client are
/// dropped.
async fn admin_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.events.subscribe()).filter_map(|message| match message {
        Ok(event) => to_sse_event(&event).map(Ok),
        Err(e) => {
            tracing::debug!(error = %e, "Admin event stream lagged");
            None
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keepalive"),
    )
}
