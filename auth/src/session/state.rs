use chrono::{DateTime, Utc};
use portal_core::{Principal, Role};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque bearer credential proving an authenticated session to the resource API
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialToken(String);

impl CredentialToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Authorization` header only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CredentialToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialToken(<redacted>)")
    }
}

/// Email/password pair submitted to the authentication collaborator
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Result of a successful login exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub token: CredentialToken,
    pub principal: Principal,
}

/// The authentication envelope held by the client.
///
/// A principal and a token exist only together, inside `Authenticated`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    /// No login attempted and no persisted session confirmed yet
    #[default]
    Uninitialized,
    Unauthenticated,
    Authenticated {
        principal: Principal,
        token: CredentialToken,
    },
}

impl Session {
    /// Tri-state view: `None` while uninitialized
    pub fn authenticated(&self) -> Option<bool> {
        match self {
            Session::Uninitialized => None,
            Session::Unauthenticated => Some(false),
            Session::Authenticated { .. } => Some(true),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Session::Authenticated { principal, .. } => Some(principal),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<&CredentialToken> {
        match self {
            Session::Authenticated { token, .. } => Some(token),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.principal().map(|p| p.role)
    }
}

impl From<Grant> for Session {
    fn from(grant: Grant) -> Self {
        Session::Authenticated {
            principal: grant.principal,
            token: grant.token,
        }
    }
}

/// What survives a process restart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub token: CredentialToken,
    pub principal: Principal,
    pub saved_at: DateTime<Utc>,
}

impl PersistedSession {
    pub fn from_grant(grant: &Grant) -> Self {
        Self {
            token: grant.token.clone(),
            principal: grant.principal.clone(),
            saved_at: Utc::now(),
        }
    }
}
