//! RateCon HTTP Dashboard
//!
//! Server-rendered dashboard over the loads table, built with Axum.
//!
//! # Endpoints
//!
//! ## Pages
//! - `GET /` - Dashboard, or the sign-in form when signed out
//! - `POST /login` - Password sign-in
//! - `POST /logout` - Sign out
//! - `POST /refresh` - Reload the list
//!
//! ## Editing
//! - `GET /loads/:id/edit` - Open the edit modal
//! - `POST /loads/:id` - Submit reference, rate and commodity
//! - `POST /edit/close` - Close the modal
//!
//! ## JSON
//! - `GET /api/v1/dashboard` - Snapshot of the view
//!
//! ## Health
//! - `GET /health/live` - Liveness check
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use ratecon::api::{serve, ApiConfig, AppState};
//! use ratecon::store::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::demo());
//!     let config = ApiConfig::default().demo(true);
//!
//!     let state = AppState::mount(store.clone(), store, "loads", config.clone()).await?;
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod html;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new().route("/dashboard", get(routes::loads::dashboard_json));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .route("/", get(routes::session::index))
        .route("/login", post(routes::session::login))
        .route("/logout", post(routes::session::logout))
        .route("/refresh", post(routes::loads::refresh))
        .route("/loads/:id/edit", get(routes::loads::open_editor))
        .route("/loads/:id", post(routes::loads::update_load))
        .route("/edit/close", post(routes::loads::close_editor))
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the dashboard server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("RateCon dashboard listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("RateCon dashboard shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
