//! In-process record store
//!
//! Holds rows in memory and behaves like the hosted store from the
//! dashboard's point of view: ordered listing, partial updates, password
//! sign-in. Failures can be injected and calls are recorded.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{watch, Mutex};

use super::error::{StoreError, StoreResult};
use super::session::{Session, SessionUser};
use super::{AuthClient, OrderBy, RecordStore};
use crate::loads::{Load, LoadPatch, LoadStatus, Stop, LOADS_TABLE};

/// In-memory record store and auth service
pub struct MemoryStore {
    rows: Mutex<Vec<Load>>,
    users: Mutex<HashMap<String, String>>,
    list_failure: Mutex<Option<String>>,
    update_failure: Mutex<Option<String>>,
    updates: Mutex<Vec<(String, LoadPatch)>>,
    list_calls: AtomicUsize,
    session_tx: watch::Sender<Option<Session>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_loads(Vec::new())
    }

    pub fn with_loads(loads: Vec<Load>) -> Self {
        let (session_tx, _) = watch::channel(None);

        Self {
            rows: Mutex::new(loads),
            users: Mutex::new(HashMap::new()),
            list_failure: Mutex::new(None),
            update_failure: Mutex::new(None),
            updates: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
            session_tx,
        }
    }

    /// Sample loads and a `demo@ratecon.dev` / `demo` account
    pub fn demo() -> Self {
        let loads = vec![
            Load::new("c1f0a7e2")
                .created_at("2024-05-14T15:02:11+00:00")
                .reference("RC-88213")
                .rate(2450.0)
                .commodity("Frozen poultry")
                .stops(vec![
                    Stop::new("Gainesville", "GA", "2024-05-16"),
                    Stop::new("Columbus", "OH", "2024-05-18"),
                ]),
            Load::new("9b7d33c4")
                .created_at("2024-05-13T09:47:30+00:00")
                .reference("RC-88107")
                .rate(1875.5)
                .commodity("")
                .status(LoadStatus::PushedToTms)
                .stops(vec![
                    Stop::new("Laredo", "TX", "2024-05-14"),
                    Stop::new("Dallas", "TX", "2024-05-14"),
                    Stop::new("Little Rock", "AR", "2024-05-15"),
                ]),
            Load::new("4e2a9d10")
                .created_at("2024-05-12T18:20:05+00:00")
                .reference("RC-87990")
                .commodity("Lumber"),
        ];

        let users = HashMap::from([("demo@ratecon.dev".to_string(), "demo".to_string())]);

        Self {
            users: Mutex::new(users),
            ..Self::with_loads(loads)
        }
    }

    /// Register an account for password sign-in
    pub async fn add_user(&self, email: impl Into<String>, password: impl Into<String>) {
        self.users.lock().await.insert(email.into(), password.into());
    }

    /// Make every list call fail with `message` (or succeed again with `None`)
    pub async fn set_list_failure(&self, message: Option<&str>) {
        *self.list_failure.lock().await = message.map(str::to_string);
    }

    /// Make every update call fail with `message` (or succeed again with `None`)
    pub async fn set_update_failure(&self, message: Option<&str>) {
        *self.update_failure.lock().await = message.map(str::to_string);
    }

    /// Replace the rows, as the ingest pipeline would
    pub async fn set_rows(&self, loads: Vec<Load>) {
        *self.rows.lock().await = loads;
    }

    pub async fn rows(&self) -> Vec<Load> {
        self.rows.lock().await.clone()
    }

    /// Every update received, in order
    pub async fn recorded_updates(&self) -> Vec<(String, LoadPatch)> {
        self.updates.lock().await.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Change the session from outside, like another tab signing in or out
    pub fn set_session(&self, session: Option<Session>) {
        self.session_tx.send_replace(session);
    }

    fn check_table(table: &str) -> StoreResult<()> {
        if table == LOADS_TABLE {
            Ok(())
        } else {
            Err(StoreError::Api {
                status: 404,
                message: format!("relation \"public.{}\" does not exist", table),
            })
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self, table: &str, order: &OrderBy) -> StoreResult<Vec<Load>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Self::check_table(table)?;

        if let Some(message) = self.list_failure.lock().await.clone() {
            return Err(StoreError::Api {
                status: 500,
                message,
            });
        }

        let mut rows = self.rows.lock().await.clone();
        if order.column == "created_at" {
            rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            if order.descending {
                rows.reverse();
            }
        }
        Ok(rows)
    }

    async fn update(&self, table: &str, id: &str, patch: &LoadPatch) -> StoreResult<()> {
        Self::check_table(table)?;
        self.updates
            .lock()
            .await
            .push((id.to_string(), patch.clone()));

        if let Some(message) = self.update_failure.lock().await.clone() {
            return Err(StoreError::Api {
                status: 400,
                message,
            });
        }

        let mut rows = self.rows.lock().await;
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.rate_amount = patch.rate_amount;
            row.load_reference = patch.load_reference.clone();
            row.commodity = patch.commodity.clone();
        }
        Ok(())
    }
}

#[async_trait]
impl AuthClient for MemoryStore {
    async fn current_session(&self) -> StoreResult<Option<Session>> {
        Ok(self.session_tx.borrow().clone())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.session_tx.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> StoreResult<Session> {
        let valid = self
            .users
            .lock()
            .await
            .get(email)
            .map(|p| p == password)
            .unwrap_or(false);

        if !valid {
            return Err(StoreError::Api {
                status: 400,
                message: "Invalid login credentials".to_string(),
            });
        }

        let session = Session::new(
            uuid::Uuid::new_v4().to_string(),
            SessionUser {
                id: uuid::Uuid::new_v4().to_string(),
                email: Some(email.to_string()),
            },
        )
        .expires_in(3600);

        self.session_tx.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> StoreResult<()> {
        self.session_tx.send_replace(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_orders_newest_first() {
        let store = MemoryStore::with_loads(vec![
            Load::new("old").created_at("2024-01-01T00:00:00Z"),
            Load::new("new").created_at("2024-03-01T00:00:00Z"),
            Load::new("mid").created_at("2024-02-01T00:00:00Z"),
        ]);

        let rows = store.list("loads", &OrderBy::newest_first()).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let store = MemoryStore::new();
        let err = store.list("trucks", &OrderBy::newest_first()).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_update_patches_fields_only() {
        let store = MemoryStore::with_loads(vec![Load::new("1")
            .reference("A")
            .status(LoadStatus::PushedToTms)]);

        let patch = LoadPatch {
            rate_amount: Some(10.0),
            load_reference: "B".into(),
            commodity: "Hay".into(),
        };
        store.update("loads", "1", &patch).await.unwrap();

        let row = &store.rows().await[0];
        assert_eq!(row.load_reference, "B");
        assert_eq!(row.rate_amount, Some(10.0));
        assert_eq!(row.status, LoadStatus::PushedToTms);
        assert_eq!(store.recorded_updates().await.len(), 1);
    }

    #[tokio::test]
    async fn test_sign_in() {
        let store = MemoryStore::new();
        store.add_user("a@b.c", "pw").await;
        let rx = store.subscribe();

        let err = store.sign_in_with_password("a@b.c", "nope").await.unwrap_err();
        assert_eq!(err.message(), "Invalid login credentials");

        let session = store.sign_in_with_password("a@b.c", "pw").await.unwrap();
        assert_eq!(session.display_name(), "a@b.c");
        assert_eq!(rx.borrow().as_ref(), Some(&session));

        store.sign_out().await.unwrap();
        assert!(store.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_demo_account() {
        let store = MemoryStore::demo();
        assert!(store.sign_in_with_password("demo@ratecon.dev", "demo").await.is_ok());
        assert_eq!(store.rows().await.len(), 3);
    }
}
