//! Persistence of the Matrix login between restarts.
//!
//! The data directory holds two entries:
//! - `sqlite/` - the matrix-sdk state store
//! - `session.json` - the access token of the bot device and the last sync token

use anyhow::Context;
use log::{debug, trace};
use matrix_sdk::authentication::matrix::MatrixSession;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::utils::get_path;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSession {
    user_session: MatrixSession,

    #[serde(skip_serializing_if = "Option::is_none")]
    sync_token: Option<String>,
}

/// Reads and writes the persisted login of the bot.
#[derive(Debug, Clone)]
pub struct SessionStore {
    persisted: Option<PersistedSession>,
    sqlite_path: String,
    session_path: String,
}

impl SessionStore {
    /// Opens the store in `dir_path`, reading the previous login if there is one.
    ///
    /// # Errors
    ///
    /// Fails if `dir_path` does not exist and cannot be created.
    pub async fn open(dir_path: &str) -> anyhow::Result<SessionStore> {
        fs::create_dir_all(dir_path)
            .await
            .with_context(|| format!("cannot create {}", dir_path))?;

        let sqlite_path = get_path(dir_path, "sqlite");
        let session_path = get_path(dir_path, "session.json");

        let persisted = match fs::read_to_string(&session_path).await {
            Ok(serialized) => match serde_json::from_str::<PersistedSession>(&serialized) {
                Ok(persisted) => Some(persisted),
                Err(e) => {
                    debug!("ignoring unreadable session at {}: {}", session_path, e);
                    None
                }
            },
            Err(_) => None,
        };
        debug!("previous session found: {}", persisted.is_some());

        Ok(SessionStore {
            persisted,
            sqlite_path,
            session_path,
        })
    }

    pub fn sqlite_path(&self) -> &str {
        &self.sqlite_path
    }

    pub fn user_session(&self) -> Option<&MatrixSession> {
        self.persisted.as_ref().map(|p| &p.user_session)
    }

    pub fn sync_token(&self) -> Option<String> {
        self.persisted.as_ref().and_then(|p| p.sync_token.clone())
    }

    /// Writes a fresh login, dropping any previous sync token.
    pub async fn persist_user_session(&self, user_session: &MatrixSession) -> anyhow::Result<()> {
        let persisted = PersistedSession {
            user_session: user_session.clone(),
            sync_token: None,
        };

        let serialized = serde_json::to_string(&persisted)?;
        fs::write(&self.session_path, serialized)
            .await
            .with_context(|| format!("cannot write {}", self.session_path))?;

        trace!("user session persisted");
        Ok(())
    }

    /// Records the sync token of the last successful sync.
    pub async fn persist_sync_token(&self, sync_token: String) -> anyhow::Result<()> {
        let serialized = fs::read_to_string(&self.session_path).await?;
        let mut persisted: PersistedSession = serde_json::from_str(&serialized)?;

        persisted.sync_token = Some(sync_token);
        fs::write(&self.session_path, serde_json::to_string(&persisted)?).await?;

        trace!("sync token persisted");
        Ok(())
    }
}
