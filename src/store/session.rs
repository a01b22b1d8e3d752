//! Auth sessions and their on-disk persistence

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::{StoreError, StoreResult};

/// Seconds before expiry at which a session is treated as expired
const EXPIRY_MARGIN_SECS: i64 = 10;

/// An authenticated user context granted by the auth service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Unix timestamp (seconds) at which the access token expires
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: SessionUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Session {
    pub fn new(access_token: impl Into<String>, user: SessionUser) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: default_token_type(),
            expires_at: None,
            refresh_token: None,
            user,
        }
    }

    /// Builder method: expire `secs` seconds from now
    pub fn expires_in(mut self, secs: i64) -> Self {
        self.expires_at = Some(Utc::now().timestamp() + secs);
        self
    }

    /// Builder method: set the refresh token
    pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    /// Whether the access token is expired (or about to be) at `now`
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at
            .map(|at| at - EXPIRY_MARGIN_SECS <= now)
            .unwrap_or(false)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    /// Email if known, else the user id
    pub fn display_name(&self) -> &str {
        self.user.email.as_deref().unwrap_or(&self.user.id)
    }
}

/// JSON file holding the last signed-in session
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/ratecon/session.json`
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .map(|p| p.join("ratecon").join("session.json"))
            .unwrap_or_else(|| PathBuf::from("./ratecon_session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored session; a missing file means signed out
    pub fn load(&self) -> StoreResult<Option<Session>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::SessionFile(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let session = serde_json::from_str(&content).map_err(|e| {
            StoreError::SessionFile(format!("{}: {}", self.path.display(), e))
        })?;

        Ok(Some(session))
    }

    pub fn save(&self, session: &Session) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::SessionFile(format!("{}: {}", parent.display(), e)))?;
        }

        let content = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, content)
            .map_err(|e| StoreError::SessionFile(format!("{}: {}", self.path.display(), e)))
    }

    pub fn clear(&self) -> StoreResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::SessionFile(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn session() -> Session {
        Session::new(
            "token-abc",
            SessionUser {
                id: "user-1".to_string(),
                email: Some("dispatch@example.com".to_string()),
            },
        )
    }

    #[test]
    fn test_expiry() {
        let mut s = session();
        assert!(!s.is_expired_at(0));

        s.expires_at = Some(1_000);
        assert!(!s.is_expired_at(900));
        assert!(s.is_expired_at(995));
        assert!(s.is_expired_at(2_000));
    }

    #[test]
    fn test_display_name() {
        let mut s = session();
        assert_eq!(s.display_name(), "dispatch@example.com");
        s.user.email = None;
        assert_eq!(s.display_name(), "user-1");
    }

    #[test]
    fn test_save_load_clear() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session.json"));

        assert_eq!(store.load().unwrap(), None);

        let s = session().refresh_token("refresh-1");
        store.save(&s).unwrap();
        assert_eq!(store.load().unwrap(), Some(s));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let err = SessionStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::SessionFile(_)));
    }
}
