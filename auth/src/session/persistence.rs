use std::fmt::Debug;
use std::sync::Arc;

use portal_core::PortalResult;

use super::state::PersistedSession;

/// Trait defining the interface for persisted-session backends.
///
/// Operations are synchronous so that `logout` stays synchronous.
pub trait SessionPersistence: Send + Sync + Debug {
    /// Load the persisted session, `None` when nothing is stored
    fn load(&self) -> PortalResult<Option<PersistedSession>>;

    /// Replace the persisted session
    fn save(&self, session: &PersistedSession) -> PortalResult<()>;

    /// Remove the persisted session; removing nothing is not an error
    fn clear(&self) -> PortalResult<()>;
}

/// Type alias for Arc-wrapped SessionPersistence trait objects
pub type SessionPersistenceRef = Arc<dyn SessionPersistence>;
