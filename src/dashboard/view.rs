//! Load Dashboard View
//!
//! Owns the session, the mirrored load list and the editing slot, and
//! drives the list/edit/update cycle against the injected collaborators.
//!
//! ## Phases
//!
//! - no session → `Unauthenticated`
//! - session appears → `Loading` until the list resolves, then `Idle`
//! - load selected → `Editing` until the modal closes or the update succeeds
//! - sign-out → `Unauthenticated`

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

use super::edit::{EditError, EditForm};
use super::render::LoadCard;
use crate::loads::{DashboardStats, Load, LOADS_TABLE};
use crate::store::{AuthClient, OrderBy, RecordStore, Session, StoreError, StoreResult};

/// Errors returned by dashboard operations
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Load not found: {0}")]
    LoadNotFound(String),

    #[error("No load is being edited")]
    NotEditing,

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Observable state of the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardPhase {
    Unauthenticated,
    Loading,
    Idle,
    Editing,
}

impl std::fmt::Display for DashboardPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashboardPhase::Unauthenticated => write!(f, "unauthenticated"),
            DashboardPhase::Loading => write!(f, "loading"),
            DashboardPhase::Idle => write!(f, "idle"),
            DashboardPhase::Editing => write!(f, "editing"),
        }
    }
}

/// A list query handed out by [`DashboardView::begin_fetch`]
///
/// Running it needs no access to the view, so a host can release its lock
/// while the request is in flight.
pub struct FetchTicket {
    store: Arc<dyn RecordStore>,
    table: String,
}

impl FetchTicket {
    pub async fn run(self) -> StoreResult<Vec<Load>> {
        self.store.list(&self.table, &OrderBy::newest_first()).await
    }
}

/// The dashboard view model
pub struct DashboardView {
    store: Arc<dyn RecordStore>,
    auth: Arc<dyn AuthClient>,
    table: String,
    session: Option<Session>,
    loads: Vec<Load>,
    fetches_in_flight: usize,
    editing: Option<EditForm>,
    alert: Option<String>,
    last_fetch_error: Option<String>,
}

impl DashboardView {
    pub fn new(store: Arc<dyn RecordStore>, auth: Arc<dyn AuthClient>) -> Self {
        Self {
            store,
            auth,
            table: LOADS_TABLE.to_string(),
            session: None,
            loads: Vec::new(),
            fetches_in_flight: 0,
            editing: None,
            alert: None,
            last_fetch_error: None,
        }
    }

    /// Builder method: read a different table
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Resolve the initial session and load the list if signed in
    ///
    /// Returns the session-change receiver; the caller keeps it for as long
    /// as the view lives and feeds changes to [`apply_session`].
    ///
    /// [`apply_session`]: DashboardView::apply_session
    pub async fn mount(&mut self) -> Result<watch::Receiver<Option<Session>>, DashboardError> {
        let mut changes = self.auth.subscribe();
        let session = self.auth.current_session().await?;
        let _ = changes.borrow_and_update();

        if let Err(e) = self.apply_session(session).await {
            tracing::debug!(error = %e, "Initial load did not complete");
        }
        Ok(changes)
    }

    /// Apply a session change without waiting for the reload
    ///
    /// Returns a ticket when a session is present; the list must then be
    /// loaded by running it and passing the result to `finish_fetch`.
    pub fn set_session(&mut self, session: Option<Session>) -> Option<FetchTicket> {
        match session {
            Some(session) => {
                let switched = self
                    .session
                    .as_ref()
                    .is_some_and(|held| held.user.id != session.user.id);
                if switched {
                    tracing::info!(user = %session.display_name(), "Signed-in user changed");
                    self.clear_user_state();
                }

                tracing::info!(user = %session.display_name(), "Session active");
                self.session = Some(session);
                self.begin_fetch().ok()
            }
            None => {
                if self.session.take().is_some() {
                    tracing::info!("Session ended");
                }
                self.clear_user_state();
                None
            }
        }
    }

    /// Drop everything read or typed under the previous user
    fn clear_user_state(&mut self) {
        self.loads.clear();
        self.editing = None;
        self.alert = None;
        self.last_fetch_error = None;
    }

    /// Apply a session change and reload the list when signed in
    pub async fn apply_session(&mut self, session: Option<Session>) -> Result<(), DashboardError> {
        if let Some(ticket) = self.set_session(session) {
            let result = ticket.run().await;
            self.finish_fetch(result)?;
        }
        Ok(())
    }

    /// Start a list fetch
    pub fn begin_fetch(&mut self) -> Result<FetchTicket, DashboardError> {
        if self.session.is_none() {
            return Err(DashboardError::NotAuthenticated);
        }

        self.fetches_in_flight += 1;
        Ok(FetchTicket {
            store: Arc::clone(&self.store),
            table: self.table.clone(),
        })
    }

    /// Complete a list fetch
    ///
    /// Success replaces the whole list. Failure is logged, kept in
    /// `last_fetch_error` and returned; the previous list stays as it was.
    /// Results arriving after sign-out are dropped.
    pub fn finish_fetch(&mut self, result: StoreResult<Vec<Load>>) -> Result<usize, DashboardError> {
        self.fetches_in_flight = self.fetches_in_flight.saturating_sub(1);

        if self.session.is_none() {
            return Err(DashboardError::NotAuthenticated);
        }

        match result {
            Ok(loads) => {
                tracing::debug!(count = loads.len(), "Loads fetched");
                self.loads = loads;
                self.last_fetch_error = None;
                Ok(self.loads.len())
            }
            Err(e) => {
                tracing::error!(error = %e, table = %self.table, "Error fetching loads");
                self.last_fetch_error = Some(e.message());
                Err(e.into())
            }
        }
    }

    /// Reload the list and wait for it
    pub async fn refresh(&mut self) -> Result<usize, DashboardError> {
        let ticket = self.begin_fetch()?;
        let result = ticket.run().await;
        self.finish_fetch(result)
    }

    /// Open the editor on the load with this id
    pub fn select(&mut self, id: &str) -> Result<&mut EditForm, DashboardError> {
        if self.session.is_none() {
            return Err(DashboardError::NotAuthenticated);
        }

        let load = self
            .loads
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or_else(|| DashboardError::LoadNotFound(id.to_string()))?;

        self.alert = None;
        Ok(self.editing.insert(EditForm::new(load)))
    }

    /// Mutable access to the open form
    pub fn editing_mut(&mut self) -> Option<&mut EditForm> {
        self.editing.as_mut()
    }

    /// Close the editor without saving
    pub fn close_editor(&mut self) {
        self.editing = None;
        self.alert = None;
    }

    /// Write the open form through to the store
    ///
    /// On failure the alert is set, the list is untouched and the editor
    /// stays open so the user can retry. On success the list entry is
    /// replaced by the edited load and the editor closes.
    pub async fn submit_update(&mut self) -> Result<(), DashboardError> {
        let form = self.editing.as_ref().ok_or(DashboardError::NotEditing)?;

        let edited = match form.validate() {
            Ok(load) => load,
            Err(e) => {
                self.alert = Some(e.to_string());
                return Err(e.into());
            }
        };

        if let Err(e) = self
            .store
            .update(&self.table, &edited.id, &edited.patch())
            .await
        {
            tracing::warn!(error = %e, id = %edited.id, "Load update failed");
            self.alert = Some(format!("Failed: {}", e.message()));
            return Err(e.into());
        }

        tracing::info!(id = %edited.id, reference = %edited.load_reference, "Load updated");
        for load in self.loads.iter_mut().filter(|l| l.id == edited.id) {
            *load = edited.clone();
        }
        self.editing = None;
        self.alert = None;
        Ok(())
    }

    /// Sign out through the auth collaborator
    pub async fn sign_out(&mut self) -> Result<(), DashboardError> {
        self.auth.sign_out().await?;
        self.set_session(None);
        Ok(())
    }

    pub fn phase(&self) -> DashboardPhase {
        if self.session.is_none() {
            DashboardPhase::Unauthenticated
        } else if self.fetches_in_flight > 0 {
            DashboardPhase::Loading
        } else if self.editing.is_some() {
            DashboardPhase::Editing
        } else {
            DashboardPhase::Idle
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn loads(&self) -> &[Load] {
        &self.loads
    }

    pub fn is_loading(&self) -> bool {
        self.fetches_in_flight > 0
    }

    pub fn editing(&self) -> Option<&EditForm> {
        self.editing.as_ref()
    }

    /// Blocking message for the user (failed update or invalid form)
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    /// Message of the last failed fetch, cleared by the next success
    pub fn last_fetch_error(&self) -> Option<&str> {
        self.last_fetch_error.as_deref()
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats::from_loads(&self.loads)
    }

    /// Serializable copy of everything a renderer needs
    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            phase: self.phase(),
            user: self.session.as_ref().map(|s| s.display_name().to_string()),
            stats: self.stats(),
            revenue_display: self.stats().revenue_display(),
            loading: self.is_loading(),
            cards: self.loads.iter().map(LoadCard::from_load).collect(),
            editing: self.editing.clone(),
            alert: self.alert.clone(),
            last_fetch_error: self.last_fetch_error.clone(),
        }
    }
}

/// Point-in-time view state for rendering and the JSON endpoint
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub phase: DashboardPhase,
    pub user: Option<String>,
    pub stats: DashboardStats,
    pub revenue_display: String,
    pub loading: bool,
    pub cards: Vec<LoadCard>,
    pub editing: Option<EditForm>,
    pub alert: Option<String>,
    pub last_fetch_error: Option<String>,
}
