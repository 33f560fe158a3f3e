use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use portal_core::{PortalError, PortalResult};
use tracing::{debug, warn};

use crate::session::persistence::SessionPersistence;
use crate::session::state::PersistedSession;

/// Persists the session as a JSON file, e.g. `~/.config/university-portal/session.json`
#[derive(Debug, Clone)]
pub struct FileSessionPersistence {
    path: PathBuf,
}

impl FileSessionPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionPersistence for FileSessionPersistence {
    fn load(&self) -> PortalResult<Option<PersistedSession>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PortalError::Persistence(format!(
                    "Failed to read session file {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        match serde_json::from_str(&content) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                // A corrupt file is treated as no session at all.
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    fn save(&self, session: &PersistedSession) -> PortalResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PortalError::Persistence(format!("Failed to create session directory: {}", e))
            })?;
        }

        let content = serde_json::to_string_pretty(session)?;
        let write_failed = |e: std::io::Error| {
            PortalError::Persistence(format!(
                "Failed to write session file {}: {}",
                self.path.display(),
                e
            ))
        };

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).map_err(write_failed)?;

        // The mode above only applies to new files
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(write_failed)?;
        }
        file.write_all(content.as_bytes()).map_err(write_failed)?;

        debug!(path = %self.path.display(), "Saved session file");
        Ok(())
    }

    fn clear(&self) -> PortalResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Removed session file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortalError::Persistence(format!(
                "Failed to remove session file {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::CredentialToken;
    use chrono::Utc;
    use portal_core::{Principal, Role};
    use tempfile::tempdir;

    fn persisted() -> PersistedSession {
        PersistedSession {
            token: CredentialToken::new("tok"),
            principal: Principal {
                id: "9".into(),
                name: "Admin".into(),
                email: "admin@u.edu".into(),
                role: Role::Administrator,
            },
            saved_at: Utc::now(),
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = FileSessionPersistence::new(dir.path().join("session.json"));
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = FileSessionPersistence::new(dir.path().join("state").join("session.json"));
        let session = persisted();

        store.save(&session).unwrap();
        assert_eq!(store.load().unwrap(), Some(session));

        store.clear().unwrap();
        assert!(!store.path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = FileSessionPersistence::new(dir.path().join("session.json"));
        store.save(&persisted()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_existing_readable_file_is_tightened() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileSessionPersistence::new(&path);
        let session = persisted();
        store.save(&session).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load().unwrap(), Some(session));
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileSessionPersistence::new(path);
        assert!(store.load().unwrap().is_none());
    }
}
