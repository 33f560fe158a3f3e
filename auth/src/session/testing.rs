//! Scripted authenticator for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use portal_core::{PortalError, PortalResult, Principal, Role};
use tokio::sync::Notify;

use crate::authenticator::Authenticator;
use crate::session::{CredentialToken, Credentials, Grant};

pub(crate) fn professor() -> Principal {
    Principal {
        id: "2".into(),
        name: "Prof. Turing".into(),
        email: "prof@u.edu".into(),
        role: Role::Professor,
    }
}

pub(crate) fn student() -> Principal {
    Principal {
        id: "3".into(),
        name: "Stu Dent".into(),
        email: "stu@u.edu".into(),
        role: Role::Student,
    }
}

pub(crate) enum Confirm {
    /// Echo the stored principal back
    Accept,
    /// Report a different principal for the token
    As(Principal),
    Reject,
    Offline,
}

pub(crate) struct FakeAuthenticator {
    users: HashMap<String, (String, Principal)>,
    gates: HashMap<String, Arc<Notify>>,
    confirm: Confirm,
    pub(crate) confirm_calls: AtomicUsize,
}

impl FakeAuthenticator {
    pub(crate) fn new() -> Self {
        Self {
            users: HashMap::new(),
            gates: HashMap::new(),
            confirm: Confirm::Accept,
            confirm_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_user(mut self, email: &str, password: &str, principal: Principal) -> Self {
        let principal = Principal {
            email: email.to_string(),
            ..principal
        };
        self.users
            .insert(email.to_string(), (password.to_string(), principal));
        self
    }

    pub(crate) fn confirming(mut self, confirm: Confirm) -> Self {
        self.confirm = confirm;
        self
    }

    /// Hold logins for `email` until the returned gate is notified
    pub(crate) fn gate(&self, email: &str) -> Arc<Notify> {
        self.gates
            .get(email)
            .cloned()
            .unwrap_or_else(|| panic!("gate for {} must be set up with gated()", email))
    }

    pub(crate) fn gated(mut self, email: &str) -> Self {
        self.gates.insert(email.to_string(), Arc::new(Notify::new()));
        self
    }
}

#[async_trait]
impl Authenticator for FakeAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> PortalResult<Grant> {
        if let Some(gate) = self.gates.get(&credentials.email) {
            gate.notified().await;
        }

        match self.users.get(&credentials.email) {
            Some((password, principal)) if *password == credentials.password => Ok(Grant {
                token: CredentialToken::new(format!("token-{}", principal.id)),
                principal: principal.clone(),
            }),
            _ => Err(PortalError::InvalidCredentials),
        }
    }

    async fn confirm(
        &self,
        _token: &CredentialToken,
        principal: &Principal,
    ) -> PortalResult<Principal> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        match &self.confirm {
            Confirm::Accept => Ok(principal.clone()),
            Confirm::As(other) => Ok(other.clone()),
            Confirm::Reject => Err(PortalError::Unauthorized("Token has expired.".into())),
            Confirm::Offline => Err(PortalError::Http {
                status_code: 503,
                message: "unavailable".into(),
            }),
        }
    }
}
