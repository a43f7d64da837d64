//! SessionStore collaborator
//!
//! Holds the serialized session and preference flags across restarts. Read
//! once at startup, written on every preference change and on login/logout.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use carelink_core::Session;

use crate::error::{Result, StoreError};

/// Persisted user preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_auto_refresh")]
    pub auto_refresh: bool,

    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
}

fn default_auto_refresh() -> bool { true }
fn default_refresh_interval_ms() -> u64 { 30_000 }

impl Default for Preferences {
    fn default() -> Self {
        Self {
            auto_refresh: default_auto_refresh(),
            refresh_interval_ms: default_refresh_interval_ms(),
        }
    }
}

impl Preferences {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

/// Everything the SessionStore keeps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub session: Option<Session>,

    /// `None` until the user changes a preference
    #[serde(default)]
    pub preferences: Option<Preferences>,
}

/// Persistent storage for session and preferences
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<PersistedState>;

    async fn save(&self, state: &PersistedState) -> Result<()>;
}

/// In-memory SessionStore
#[derive(Default)]
pub struct MemorySessionStore {
    state: RwLock<PersistedState>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Last saved state
    pub async fn snapshot(&self) -> PersistedState {
        self.state.read().await.clone()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<PersistedState> {
        Ok(self.state.read().await.clone())
    }

    async fn save(&self, state: &PersistedState) -> Result<()> {
        *self.state.write().await = state.clone();
        Ok(())
    }
}

/// SessionStore backed by a JSON file
///
/// A missing file reads as the empty state. Writes go to a sibling
/// temporary file which is then renamed over the target.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<PersistedState> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No session file at {}", self.path.display());
                return Ok(PersistedState::default());
            }
            Err(e) => return Err(persistence(&self.path, e)),
        };

        serde_json::from_str(&raw).map_err(|e| persistence(&self.path, e))
    }

    async fn save(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| persistence(parent, e))?;
        }

        let json = serde_json::to_vec_pretty(state).map_err(|e| persistence(&self.path, e))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| persistence(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| persistence(&self.path, e))?;

        debug!("Session state written to {}", self.path.display());
        Ok(())
    }
}

fn persistence(path: &Path, err: impl std::fmt::Display) -> StoreError {
    StoreError::Persistence(format!("{}: {}", path.display(), err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use carelink_core::{Role, UserProfile};
    use chrono::{TimeZone, Utc};

    fn sample_state() -> PersistedState {
        let issued = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        PersistedState {
            session: Some(Session::new(
                "tok-1",
                UserProfile::new("user:ana", Role::Nurse).with_shift("day_shift"),
                issued,
            )),
            preferences: Some(Preferences {
                auto_refresh: false,
                refresh_interval_ms: 60_000,
            }),
        }
    }

    #[tokio::test]
    async fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));

        assert_eq!(store.load().await.unwrap(), PersistedState::default());
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));

        store.save(&sample_state()).await.unwrap();
        let loaded = FileSessionStore::new(store.path()).load().await.unwrap();

        assert_eq!(loaded, sample_state());
    }

    #[tokio::test]
    async fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let err = FileSessionStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
    }

    #[test]
    fn test_preferences_defaults_fill_missing_fields() {
        let prefs: Preferences = serde_json::from_str(r#"{"auto_refresh": false}"#).unwrap();
        assert!(!prefs.auto_refresh);
        assert_eq!(prefs.refresh_interval(), Duration::from_secs(30));
    }
}
