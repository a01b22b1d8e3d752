//! Supabase REST Client
//!
//! HTTP client for the hosted project's PostgREST (`/rest/v1`) and GoTrue
//! (`/auth/v1`) APIs. One instance is built at startup and shared.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::error::{StoreError, StoreResult};
use super::session::{Session, SessionStore, SessionUser};
use super::{AuthClient, OrderBy, RecordStore};
use crate::loads::{Load, LoadPatch};

/// Supabase REST API client
pub struct SupabaseClient {
    client: Client,
    config: SupabaseConfig,
    session_tx: watch::Sender<Option<Session>>,
    session_store: Option<SessionStore>,
}

/// Configuration for the Supabase client
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL (e.g., "https://xyzcompany.supabase.co")
    pub url: String,
    /// Public anonymous API key
    pub anon_key: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            request_timeout_ms: 30_000,
        }
    }

    fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

impl SupabaseClient {
    /// Create a new client with the given configuration
    pub fn new(config: SupabaseConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .user_agent(concat!("ratecon/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let (session_tx, _) = watch::channel(None);

        Ok(Self {
            client,
            config,
            session_tx,
            session_store: None,
        })
    }

    /// Persist sessions in `store` and resume the one saved there
    pub fn with_session_store(mut self, store: SessionStore) -> Self {
        match store.load() {
            Ok(Some(session)) => {
                tracing::debug!(user = %session.display_name(), "Resumed stored session");
                self.session_tx.send_replace(Some(session));
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Ignoring unreadable session file"),
        }
        self.session_store = Some(store);
        self
    }

    /// Get the current configuration
    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    fn rest_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url(),
            urlencoding::encode(table)
        )
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.base_url(), path)
    }

    /// Attach the API key and the bearer token row-level security sees.
    ///
    /// An expired session is refreshed first, so the token sent is never
    /// one the server already rejects. Without a session the anon key is sent.
    async fn authorize(&self, request: RequestBuilder) -> StoreResult<RequestBuilder> {
        let token = match self.current_session().await? {
            Some(session) => session.access_token,
            None => self.config.anon_key.clone(),
        };

        Ok(request
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token))
    }

    /// Publish a session change and mirror it to disk
    fn set_session(&self, session: Option<Session>) {
        if let Some(store) = &self.session_store {
            let persisted = match &session {
                Some(s) => store.save(s),
                None => store.clear(),
            };
            if let Err(e) = persisted {
                tracing::warn!(error = %e, "Failed to persist session");
            }
        }
        self.session_tx.send_replace(session);
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = request.send().await.map_err(StoreError::from_transport)?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn token_request<T: Serialize>(&self, grant_type: &str, body: &T) -> StoreResult<Session> {
        let request = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.config.anon_key)
            .json(body);

        let response = self.send(request).await?;
        let token: TokenResponse = response.json().await.map_err(StoreError::from_transport)?;

        Ok(token.into_session(Utc::now().timestamp()))
    }

    async fn refresh_session(&self, refresh_token: &str) -> StoreResult<Session> {
        self.token_request(
            "refresh_token",
            &RefreshRequest {
                refresh_token: refresh_token.to_string(),
            },
        )
        .await
    }
}

#[async_trait]
impl RecordStore for SupabaseClient {
    async fn list(&self, table: &str, order: &OrderBy) -> StoreResult<Vec<Load>> {
        let request = self
            .client
            .get(self.rest_url(table))
            .query(&[("select", "*".to_string()), ("order", order.to_param())]);

        let request = self.authorize(request).await?;
        let response = self.send(request).await?;
        let rows: Vec<Load> = response.json().await.map_err(StoreError::from_transport)?;

        tracing::debug!(table, rows = rows.len(), "Listed records");
        Ok(rows)
    }

    async fn update(&self, table: &str, id: &str, patch: &LoadPatch) -> StoreResult<()> {
        let request = self
            .client
            .patch(self.rest_url(table))
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=minimal")
            .json(patch);

        let request = self.authorize(request).await?;
        self.send(request).await?;

        tracing::debug!(table, id, "Updated record");
        Ok(())
    }
}

#[async_trait]
impl AuthClient for SupabaseClient {
    async fn current_session(&self) -> StoreResult<Option<Session>> {
        let current = self.session_tx.borrow().clone();

        let session = match current {
            Some(s) if s.is_expired() => s,
            other => return Ok(other),
        };

        let Some(refresh_token) = session.refresh_token.as_deref() else {
            tracing::info!("Session expired without a refresh token");
            self.set_session(None);
            return Ok(None);
        };

        match self.refresh_session(refresh_token).await {
            Ok(refreshed) => {
                tracing::info!(user = %refreshed.display_name(), "Refreshed session");
                self.set_session(Some(refreshed.clone()));
                Ok(Some(refreshed))
            }
            Err(e @ StoreError::Api { .. }) => {
                tracing::warn!(error = %e, "Session refresh rejected, signing out");
                self.set_session(None);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.session_tx.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> StoreResult<Session> {
        let session = self
            .token_request(
                "password",
                &PasswordRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                },
            )
            .await?;

        tracing::info!(user = %session.display_name(), "Signed in");
        self.set_session(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> StoreResult<()> {
        if self.session_tx.borrow().is_none() {
            return Ok(());
        }

        let request = self.authorize(self.client.post(self.auth_url("logout"))).await?;
        match self.send(request).await {
            Ok(_) => {}
            // The token is already invalid server-side
            Err(StoreError::Api { status, .. }) if matches!(status, 401 | 403 | 404) => {}
            Err(e) => return Err(e),
        }

        tracing::info!("Signed out");
        self.set_session(None);
        Ok(())
    }
}

/// Turn an error response into the store's message
///
/// PostgREST reports `message`; GoTrue uses `msg`, `error_description`
/// or `error` depending on the endpoint.
async fn error_from_response(response: Response) -> StoreError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();

    StoreError::Api {
        status,
        message: extract_error_message(&text),
    }
}

fn extract_error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();

    parsed
        .as_ref()
        .and_then(|v| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(|m| m.as_str()))
        })
        .map(|m| m.to_string())
        .unwrap_or_else(|| body.trim().to_string())
}

// ============================================
// Request/Response DTOs
// ============================================

#[derive(Debug, Serialize)]
struct PasswordRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct RefreshRequest {
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    user: SessionUser,
}

impl TokenResponse {
    fn into_session(self, now: i64) -> Session {
        Session {
            access_token: self.access_token,
            token_type: self.token_type.unwrap_or_else(|| "bearer".to_string()),
            expires_at: self.expires_at.or(self.expires_in.map(|secs| now + secs)),
            refresh_token: self.refresh_token,
            user: self.user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SupabaseClient {
        SupabaseClient::new(SupabaseConfig::new("https://demo.supabase.co/", "anon-key")).unwrap()
    }

    #[test]
    fn test_urls() {
        let client = client();
        assert_eq!(client.rest_url("loads"), "https://demo.supabase.co/rest/v1/loads");
        assert_eq!(client.auth_url("token"), "https://demo.supabase.co/auth/v1/token");
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(
            extract_error_message(r#"{"code":"42501","message":"permission denied"}"#),
            "permission denied"
        );
        assert_eq!(
            extract_error_message(
                r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#
            ),
            "Invalid login credentials"
        );
        assert_eq!(extract_error_message(r#"{"msg":"Token expired"}"#), "Token expired");
        assert_eq!(extract_error_message("Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn test_token_expiry_from_expires_in() {
        let token: TokenResponse = serde_json::from_str(
            r#"{"access_token":"a","expires_in":3600,"refresh_token":"r","user":{"id":"u"}}"#,
        )
        .unwrap();

        let session = token.into_session(1_000);
        assert_eq!(session.expires_at, Some(4_600));
        assert_eq!(session.token_type, "bearer");
        assert_eq!(session.refresh_token.as_deref(), Some("r"));
    }

    #[tokio::test]
    async fn test_no_session_means_none() {
        let client = client();
        assert_eq!(client.current_session().await.unwrap(), None);
        assert!(client.subscribe().borrow().is_none());
        client.sign_out().await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_session_without_refresh_is_dropped() {
        let client = client();
        let mut expired = Session::new(
            "old",
            SessionUser {
                id: "u".into(),
                email: None,
            },
        );
        expired.expires_at = Some(0);
        client.set_session(Some(expired));

        assert_eq!(client.current_session().await.unwrap(), None);
        assert!(client.subscribe().borrow().is_none());
    }
}
