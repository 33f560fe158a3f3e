use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockWriteGuard};

use chrono::Utc;
use portal_core::{PortalError, PortalResult};
use tracing::{debug, info, warn};

use crate::authenticator::{Authenticator, CredentialRejection};
use crate::session::channel::CredentialChannel;
use crate::session::persistence::SessionPersistenceRef;
use crate::session::state::{CredentialToken, Credentials, Grant, PersistedSession, Session};
use crate::token;

/// Single source of truth for who is logged in, and as what role.
///
/// Construct one per client process and share it by reference (or `Arc`)
/// with the access guard and the resource layer.
///
/// Every login, restore and logout takes a ticket from a monotonic
/// generation counter. A pending exchange only applies its result if no newer
/// ticket was issued in the meantime, and the check, the channel attach and
/// the session swap happen under one write lock.
#[derive(Debug)]
pub struct SessionStore<A> {
    authenticator: A,
    state: RwLock<Session>,
    channel: CredentialChannel,
    generation: AtomicU64,
    persistence: Option<SessionPersistenceRef>,
}

impl<A> SessionStore<A> {
    pub fn new(authenticator: A) -> Self {
        Self {
            authenticator,
            state: RwLock::new(Session::Uninitialized),
            channel: CredentialChannel::new(),
            generation: AtomicU64::new(0),
            persistence: None,
        }
    }

    /// Persist successful logins and allow `restore` across restarts
    pub fn with_persistence(mut self, persistence: SessionPersistenceRef) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn authenticator(&self) -> &A {
        &self.authenticator
    }

    /// Read handle on the channel carrying the bearer token
    pub fn channel(&self) -> CredentialChannel {
        self.channel.clone()
    }

    /// Snapshot of the current session
    pub fn current_session(&self) -> Session {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Clear the session regardless of its current state
    pub fn logout(&self) {
        let mut state = self.write_state();
        self.generation.fetch_add(1, Ordering::SeqCst);
        let was_authenticated = state.is_authenticated();
        self.clear_locked(&mut state);
        if was_authenticated {
            info!("Logged out");
        }
    }

    /// Forced logout after the API refused `rejected`.
    ///
    /// Returns false, leaving the session alone, when `rejected` is no longer
    /// the attached token.
    pub fn invalidate(&self, rejected: &CredentialToken) -> bool {
        let mut state = self.write_state();
        if state.token() != Some(rejected) {
            debug!("Ignoring rejection of a credential that is no longer attached");
            return false;
        }

        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(principal) = state.principal() {
            warn!(user_id = %principal.id, "Credential rejected by the API, forcing logout");
        }
        self.clear_locked(&mut state);
        true
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, Session> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Ticket for a restore, only while no other session change has started
    fn begin_restore(&self) -> Option<u64> {
        self.generation
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| 1)
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    fn clear_locked(&self, state: &mut Session) {
        self.channel.detach();
        *state = Session::Unauthenticated;
        self.forget();
    }

    fn forget(&self) {
        if let Some(persistence) = &self.persistence {
            if let Err(e) = persistence.clear() {
                warn!(error = %e, "Failed to clear persisted session");
            }
        }
    }

    /// Apply a grant obtained under `ticket`, unless something newer happened
    fn apply(&self, ticket: u64, grant: Grant) -> PortalResult<Session> {
        let mut state = self.write_state();
        if !self.is_current(ticket) {
            info!(ticket, "Discarding superseded session change");
            return Err(PortalError::Superseded);
        }

        if let Some(persistence) = &self.persistence {
            if let Err(e) = persistence.save(&PersistedSession::from_grant(&grant)) {
                warn!(error = %e, "Failed to persist session");
            }
        }

        info!(
            user_id = %grant.principal.id,
            role = %grant.principal.role,
            "Session authenticated"
        );
        self.channel.attach(grant.token.clone());
        *state = Session::from(grant);
        Ok(state.clone())
    }

    /// Resolve an unsuccessful restore under `ticket`
    fn settle(&self, ticket: u64, discard: bool) {
        let mut state = self.write_state();
        if !self.is_current(ticket) {
            return;
        }
        if discard {
            self.forget();
        }
        if *state == Session::Uninitialized {
            *state = Session::Unauthenticated;
        }
    }
}

impl<A: Authenticator> SessionStore<A> {
    /// Authenticate and, on success, replace the session atomically.
    ///
    /// On failure the session is left exactly as it was.
    pub async fn login(&self, credentials: &Credentials) -> PortalResult<Session> {
        let ticket = self.begin();
        info!(ticket, email = %credentials.email, "Login attempt");

        let grant = match self.authenticator.authenticate(credentials).await {
            Ok(grant) => grant,
            Err(e) => {
                warn!(ticket, error = %e, "Login failed");
                return Err(e);
            }
        };

        self.apply(ticket, grant)
    }

    /// Rehydrate a persisted session.
    ///
    /// The record is trusted only after the authenticator confirms its token
    /// and the principal's role is unchanged. Until then the session stays
    /// uninitialized, and it ends up unauthenticated if confirmation fails.
    ///
    /// Restore only acts on a store nothing else has touched yet. Once a
    /// login, logout or earlier restore has started, it returns the current
    /// session unchanged and leaves the persisted record alone.
    pub async fn restore(&self) -> Session {
        let Some(ticket) = self.begin_restore() else {
            debug!("Session already in use, skipping restore");
            return self.current_session();
        };

        let record = match self.persistence.as_ref().map(|p| p.load()) {
            Some(Ok(Some(record))) => record,
            Some(Ok(None)) | None => {
                debug!("No persisted session to restore");
                self.settle(ticket, false);
                return self.current_session();
            }
            Some(Err(e)) => {
                warn!(error = %e, "Failed to load persisted session");
                self.settle(ticket, false);
                return self.current_session();
            }
        };

        if token::is_expired(&record.token, Utc::now()) {
            info!(user_id = %record.principal.id, "Persisted session has expired");
            self.settle(ticket, true);
            return self.current_session();
        }

        match self
            .authenticator
            .confirm(&record.token, &record.principal)
            .await
        {
            Ok(principal)
                if principal.id == record.principal.id
                    && principal.role == record.principal.role =>
            {
                let grant = Grant {
                    token: record.token,
                    principal,
                };
                if let Err(e) = self.apply(ticket, grant) {
                    debug!(error = %e, "Restored session not applied");
                }
            }
            Ok(principal) => {
                warn!(
                    user_id = %record.principal.id,
                    was = %record.principal.role,
                    now = %principal.role,
                    "Principal changed since the session was saved, re-authentication required"
                );
                self.settle(ticket, true);
            }
            Err(e) if e.is_unauthorized() => {
                info!(user_id = %record.principal.id, "Persisted credential no longer accepted");
                self.settle(ticket, true);
            }
            Err(e) => {
                warn!(error = %e, "Could not confirm persisted session");
                self.settle(ticket, false);
            }
        }

        self.current_session()
    }
}

impl<A: Send + Sync> CredentialRejection for SessionStore<A> {
    fn credential_rejected(&self, token: &CredentialToken) {
        self.invalidate(token);
    }
}
