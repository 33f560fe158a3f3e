// Session and authorization model of the portal client:
// - Session store (login, logout, restore, forced invalidation)
// - Access guard deciding every navigation from the current session
// - Persistence backends and bearer token inspection

pub mod authenticator;
pub use authenticator::{Authenticator, CredentialRejection};

pub mod guard;
pub use guard::{
    evaluate, AccessGuard, Decision, DenyReason, Navigation, RouteMatch, RoutePolicy, RouteTable,
    View,
};

pub mod session;
pub use session::{
    CredentialChannel, CredentialToken, Credentials, Grant, PersistedSession, Session,
    SessionStore,
};

pub mod token;
