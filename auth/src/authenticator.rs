use async_trait::async_trait;
use portal_core::{Principal, PortalResult};

use crate::session::{CredentialToken, Credentials, Grant};

/// The external authentication collaborator
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Exchange credentials for a token and principal.
    /// Rejected credentials fail with `PortalError::InvalidCredentials`.
    async fn authenticate(&self, credentials: &Credentials) -> PortalResult<Grant>;

    /// Check that a previously issued token is still accepted and return the
    /// principal the API currently associates with it.
    /// A rejected token fails with `PortalError::Unauthorized`.
    async fn confirm(&self, token: &CredentialToken, principal: &Principal)
        -> PortalResult<Principal>;
}

/// Hook for resource clients whose request was refused with the attached token
pub trait CredentialRejection: Send + Sync {
    fn credential_rejected(&self, token: &CredentialToken);
}
