//! Health Routes
//!
//! Health check endpoints for monitoring.
//!
//! - GET /health/live - Liveness check (process is alive)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health
///
/// The server is degraded while the latest list fetch has failed.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let view = state.view.lock().await;
    let last_fetch_error = view.last_fetch_error().map(str::to_string);

    Json(HealthResponse {
        status: if last_fetch_error.is_none() { "healthy" } else { "degraded" }.to_string(),
        session: if view.session().is_some() { "signed_in" } else { "signed_out" }.to_string(),
        loads: view.loads().len(),
        last_fetch_error,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        let status = liveness().await;
        assert_eq!(status, StatusCode::OK);
    }
}
