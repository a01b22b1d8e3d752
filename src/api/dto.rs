//! Data Transfer Objects
//!
//! Form bodies posted by the dashboard pages and JSON response types.

use serde::{Deserialize, Serialize};

/// Sign-in form
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Edit modal form
///
/// The rate arrives as typed; parsing happens in the edit form so invalid
/// input is reported the same way everywhere.
#[derive(Debug, Deserialize)]
pub struct EditLoadForm {
    pub load_reference: String,
    #[serde(default)]
    pub rate_amount: String,
    #[serde(default)]
    pub commodity: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "degraded"
    pub status: String,
    /// "signed_in" or "signed_out"
    pub session: String,
    /// Loads currently mirrored
    pub loads: usize,
    /// Last list failure, if the latest fetch failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_fetch_error: Option<String>,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// API version
    pub version: String,
}
