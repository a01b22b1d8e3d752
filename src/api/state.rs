//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::config::ServerConfig;
use crate::dashboard::{DashboardError, DashboardView};
use crate::store::{AuthClient, RecordStore, Session};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// The one dashboard view this server renders
    pub view: Arc<Mutex<DashboardView>>,
    /// Auth service used by the login form
    pub auth: Arc<dyn AuthClient>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create state around an unmounted view
    pub fn new(view: DashboardView, auth: Arc<dyn AuthClient>, config: ApiConfig) -> Self {
        Self {
            view: Arc::new(Mutex::new(view)),
            auth,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Mount a fresh view over `store` and follow session changes
    ///
    /// The watcher task runs until the auth client is dropped.
    pub async fn mount(
        store: Arc<dyn RecordStore>,
        auth: Arc<dyn AuthClient>,
        table: &str,
        config: ApiConfig,
    ) -> Result<Self, DashboardError> {
        let mut view = DashboardView::new(store, Arc::clone(&auth)).with_table(table);
        let changes = view.mount().await?;

        let state = Self::new(view, auth, config);
        state.watch_sessions(changes);
        Ok(state)
    }

    /// Apply every session change to the view
    pub fn watch_sessions(&self, mut changes: watch::Receiver<Option<Session>>) -> JoinHandle<()> {
        let view = Arc::clone(&self.view);

        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let session = changes.borrow_and_update().clone();
                apply_session(&view, session).await;
            }
            tracing::debug!("Session watcher stopped");
        })
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Apply a session to the shared view, reloading without holding the lock
///
/// A session the view already holds is skipped, so a login handled by a
/// request and then seen again by the watcher loads the list once.
pub async fn apply_session(view: &Mutex<DashboardView>, session: Option<Session>) {
    let ticket = {
        let mut view = view.lock().await;
        let unchanged = view.session().map(|s| &s.access_token)
            == session.as_ref().map(|s| &s.access_token);
        if unchanged {
            return;
        }
        view.set_session(session)
    };

    if let Some(ticket) = ticket {
        let result = ticket.run().await;
        if let Err(e) = view.lock().await.finish_fetch(result) {
            tracing::debug!(error = %e, "Reload after session change did not complete");
        }
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Serving the in-memory sample store
    pub demo: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let server = ServerConfig::default();
        Self {
            host: server.host,
            port: server.port,
            demo: false,
        }
    }
}

impl From<&ServerConfig> for ApiConfig {
    fn from(server: &ServerConfig) -> Self {
        Self::new(server.host.clone(), server.port)
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Builder method: mark the server as a demo
    pub fn demo(mut self, demo: bool) -> Self {
        self.demo = demo;
        self
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::DashboardPhase;
    use crate::loads::{Load, LOADS_TABLE};
    use crate::store::{MemoryStore, SessionUser};
    use std::time::Duration;

    fn session(token: &str) -> Session {
        Session::new(
            token,
            SessionUser {
                id: "u1".into(),
                email: Some("ops@carrier.com".into()),
            },
        )
    }

    #[tokio::test]
    async fn test_watcher_follows_session_changes() {
        let store = Arc::new(MemoryStore::with_loads(vec![Load::new("1"), Load::new("2")]));
        let state = AppState::mount(store.clone(), store.clone(), LOADS_TABLE, ApiConfig::default())
            .await
            .unwrap();
        assert_eq!(state.view.lock().await.phase(), DashboardPhase::Unauthenticated);

        store.set_session(Some(session("t1")));
        for _ in 0..50 {
            if state.view.lock().await.loads().len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(state.view.lock().await.phase(), DashboardPhase::Idle);
        assert_eq!(state.view.lock().await.loads().len(), 2);

        store.set_session(None);
        for _ in 0..50 {
            if state.view.lock().await.session().is_none() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(state.view.lock().await.phase(), DashboardPhase::Unauthenticated);
        assert!(state.view.lock().await.loads().is_empty());
    }

    #[tokio::test]
    async fn test_apply_same_session_skips_reload() {
        let store = Arc::new(MemoryStore::new());
        let view = Mutex::new(DashboardView::new(store.clone(), store.clone()));

        apply_session(&view, Some(session("t1"))).await;
        apply_session(&view, Some(session("t1"))).await;
        assert_eq!(store.list_calls(), 1);

        apply_session(&view, Some(session("t2"))).await;
        assert_eq!(store.list_calls(), 2);
    }

    #[test]
    fn test_api_config_addr() {
        let config = ApiConfig::new("0.0.0.0", 9000).demo(true);
        assert_eq!(config.addr(), "0.0.0.0:9000");
        assert!(config.demo);
    }
}
