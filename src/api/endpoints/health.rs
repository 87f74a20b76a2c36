//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub dataset_rows: usize,
    pub database: &'static str,
}

/// `GET /api/health` — unauthenticated liveness and dependency check.
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    let accounts = ctx.accounts.clone();
    let database_ok = tokio::task::spawn_blocking(move || accounts.ping()).await?;

    let database = match database_ok {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database unavailable");
            "unavailable"
        }
    };

    Ok(Json(HealthResponse {
        status: if database == "ok" { "ok" } else { "degraded" },
        version: crate::config::APP_VERSION,
        dataset_rows: ctx.datasets.latest_rows(),
        database,
    }))
}
