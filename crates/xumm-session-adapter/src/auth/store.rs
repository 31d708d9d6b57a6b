/*
[INPUT]:  Signed-in user and session storage directory
[OUTPUT]: Persisted session that survives restarts
[POS]:    Auth layer - persistent storage for the signed-in user
[UPDATE]: When session file format or location changes
*/

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::User;

const SESSION_FILE: &str = "session.json";
const APP_DIR: &str = "xumm-session";

/// Session record written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub user: User,
    pub stored_at: DateTime<Utc>,
}

/// Manages persistence of the signed-in user
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Create a store rooted at the given directory
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Platform data directory, e.g. `~/.local/share/xumm-session`
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join(APP_DIR))
    }

    /// Path of the session file
    pub fn session_file_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    /// Load the stored session, if any
    pub fn load(&self) -> Option<StoredSession> {
        let path = self.session_file_path();
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable session file");
                None
            }
        }
    }

    /// Persist the user as the current session
    pub fn save(&self, user: &User) -> io::Result<StoredSession> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }

        let session = StoredSession {
            user: user.clone(),
            stored_at: Utc::now(),
        };
        let path = self.session_file_path();
        let encoded = serde_json::to_string_pretty(&session)?;
        fs::write(&path, encoded)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mut perms = fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms)?;
        }

        Ok(session)
    }

    /// Remove the stored session
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(self.session_file_path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}
