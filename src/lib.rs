//! # RateCon
//!
//! RateCon Ripper - a freight load dashboard over a hosted Supabase table.
//!
//! Loads are parsed from rate confirmations elsewhere and land in the `loads`
//! table. This crate signs a dispatcher in, lists their loads newest first,
//! summarizes pending revenue and lets them correct the reference, rate and
//! commodity of a load in place.
//!
//! ## Modules
//!
//! - [`loads`]: Load data model, route and money formatting, stats
//! - [`store`]: Record store and auth traits, Supabase REST client
//! - [`dashboard`]: The session-gated dashboard view and edit form
//! - [`api`]: Server-rendered HTTP dashboard with Axum
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ratecon::dashboard::{render_dashboard, DashboardView};
//! use ratecon::store::{AuthClient, SupabaseClient, SupabaseConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(SupabaseClient::new(SupabaseConfig::new(
//!         "https://project.supabase.co",
//!         "anon-key",
//!     ))?);
//!
//!     client.sign_in_with_password("ops@carrier.com", "secret").await?;
//!
//!     let mut view = DashboardView::new(client.clone(), client);
//!     view.mount().await?;
//!
//!     print!("{}", render_dashboard(&view.snapshot()));
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod dashboard;
pub mod loads;
pub mod store;

// Re-export top-level types for convenience
pub use loads::{DashboardStats, Load, LoadPatch, LoadStatus, Stop};

pub use store::{
    AuthClient, MemoryStore, OrderBy, RecordStore, Session, SessionStore, StoreError,
    StoreResult, SupabaseClient, SupabaseConfig,
};

pub use dashboard::{
    DashboardError, DashboardPhase, DashboardSnapshot, DashboardView, EditError, EditForm,
};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{Config, ConfigError, LoggingConfig};
