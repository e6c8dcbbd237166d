//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: DatabaseHealth,
    pub subsystems: SubsystemHealth,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// Which optional subsystems are currently configured.
#[derive(Debug, Serialize)]
pub struct SubsystemHealth {
    pub search: bool,
    pub mail: bool,
    pub slack: bool,
}

/// Liveness/readiness probe body.
#[derive(Debug, Serialize)]
pub struct ProbeResponse {
    pub status: String,
}

async fn database_latency(state: &AppState) -> Option<u64> {
    persistence::metrics::record_pool_metrics(&state.pool);
    let start = std::time::Instant::now();
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => Some(start.elapsed().as_millis() as u64),
        Err(e) => {
            tracing::warn!(error = %e, "Database health probe failed");
            None
        }
    }
}

/// Full health check: database probe plus subsystem configuration.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let latency_ms = database_latency(&state).await;
    let connected = latency_ms.is_some();

    let response = HealthResponse {
        status: if connected { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: DatabaseHealth {
            connected,
            latency_ms,
        },
        subsystems: SubsystemHealth {
            search: state.searcher.is_some(),
            mail: state.mailer.is_configured().await,
            slack: state.slack.transport().await.is_some(),
        },
    };

    if connected {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

/// Returns 200 while the process is running.
pub async fn live() -> Json<ProbeResponse> {
    Json(ProbeResponse {
        status: "alive".to_string(),
    })
}

/// Returns 200 once the database is reachable.
pub async fn ready(State(state): State<AppState>) -> Result<Json<ProbeResponse>, StatusCode> {
    if database_latency(&state).await.is_some() {
        Ok(Json(ProbeResponse {
            status: "ready".to_string(),
        }))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
