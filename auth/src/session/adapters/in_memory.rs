use std::sync::{Arc, RwLock};

use portal_core::{PortalError, PortalResult};
use tracing::debug;

use crate::session::persistence::SessionPersistence;
use crate::session::state::PersistedSession;

/// In-memory implementation of SessionPersistence
#[derive(Debug, Default, Clone)]
pub struct InMemorySessionPersistence {
    /// Thread-safe storage of the persisted session
    slot: Arc<RwLock<Option<PersistedSession>>>,
}

impl InMemorySessionPersistence {
    /// Create a new, empty InMemorySessionPersistence
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a session, as if saved by an earlier process
    pub fn with_session(session: PersistedSession) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(session))),
        }
    }
}

impl SessionPersistence for InMemorySessionPersistence {
    fn load(&self) -> PortalResult<Option<PersistedSession>> {
        let slot = self.slot.read().map_err(|e| {
            PortalError::Persistence(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(slot.clone())
    }

    fn save(&self, session: &PersistedSession) -> PortalResult<()> {
        let mut slot = self.slot.write().map_err(|e| {
            PortalError::Persistence(format!("Failed to acquire write lock: {}", e))
        })?;
        *slot = Some(session.clone());
        debug!(user_id = %session.principal.id, "Stored session in memory");
        Ok(())
    }

    fn clear(&self) -> PortalResult<()> {
        let mut slot = self.slot.write().map_err(|e| {
            PortalError::Persistence(format!("Failed to acquire write lock: {}", e))
        })?;
        if slot.take().is_some() {
            debug!("Cleared in-memory session");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::CredentialToken;
    use chrono::Utc;
    use portal_core::{Principal, Role};

    fn persisted() -> PersistedSession {
        PersistedSession {
            token: CredentialToken::new("tok"),
            principal: Principal {
                id: "3".into(),
                name: "Stu".into(),
                email: "stu@u.edu".into(),
                role: Role::Student,
            },
            saved_at: Utc::now(),
        }
    }

    #[test]
    fn test_save_load_clear() {
        let store = InMemorySessionPersistence::new();
        assert!(store.load().unwrap().is_none());

        store.save(&persisted()).unwrap();
        assert_eq!(store.load().unwrap().unwrap().principal.id, "3");

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_clones_share_storage() {
        let store = InMemorySessionPersistence::with_session(persisted());
        let other = store.clone();
        other.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
