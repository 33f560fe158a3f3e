//! Session management for the portal client
//!
//! This module holds the authentication state of one client process. It
//! defines a `SessionPersistence` trait that can be implemented by different
//! storage backends so a session can survive restarts.

pub mod adapters;
mod channel;
pub mod persistence;
mod state;
mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use adapters::{FileSessionPersistence, InMemorySessionPersistence};
pub use channel::CredentialChannel;
pub use persistence::{SessionPersistence, SessionPersistenceRef};
pub use state::{CredentialToken, Credentials, Grant, PersistedSession, Session};
pub use store::SessionStore;
