//! Record Store and Auth Collaborators
//!
//! The dashboard delegates persistence, querying, row-level security and
//! authentication to a hosted Supabase project. This module defines the
//! two seams the dashboard depends on and their implementations.
//!
//! ## Architecture
//!
//! - **RecordStore**: list rows ordered by a column, patch a row by id
//! - **AuthClient**: current session, change notifications, sign-in/out
//! - **SupabaseClient**: both traits over the PostgREST and GoTrue APIs
//! - **SessionStore**: keeps a signed-in session across restarts
//! - **MemoryStore**: in-process store for tests and demo mode

mod client;
mod error;
mod memory;
mod session;

pub use client::{SupabaseClient, SupabaseConfig};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use session::{Session, SessionStore, SessionUser};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::loads::{Load, LoadPatch};

/// Sort order for list queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    /// PostgREST `order` parameter value
    pub fn to_param(&self) -> String {
        let dir = if self.descending { "desc" } else { "asc" };
        format!("{}.{}", self.column, dir)
    }

    /// Most recent first
    pub fn newest_first() -> Self {
        Self::desc("created_at")
    }
}

/// Query and update access to the loads table
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All rows visible to the current session, in the requested order
    async fn list(&self, table: &str, order: &OrderBy) -> StoreResult<Vec<Load>>;

    /// Patch the row with this id
    async fn update(&self, table: &str, id: &str, patch: &LoadPatch) -> StoreResult<()>;
}

/// Session lifecycle of the hosted auth service
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// The active session, if any
    async fn current_session(&self) -> StoreResult<Option<Session>>;

    /// Receiver notified on every sign-in, refresh and sign-out
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;

    /// Email/password sign-in
    async fn sign_in_with_password(&self, email: &str, password: &str) -> StoreResult<Session>;

    async fn sign_out(&self) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_param() {
        assert_eq!(OrderBy::newest_first().to_param(), "created_at.desc");
        assert_eq!(OrderBy::asc("load_reference").to_param(), "load_reference.asc");
    }
}
