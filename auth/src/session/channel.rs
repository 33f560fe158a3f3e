use std::sync::{Arc, PoisonError, RwLock};

use super::state::CredentialToken;

/// Shared slot for the bearer token attached to outbound resource requests.
///
/// Any holder can read it; only the session store attaches or detaches.
#[derive(Debug, Clone, Default)]
pub struct CredentialChannel {
    slot: Arc<RwLock<Option<CredentialToken>>>,
}

impl CredentialChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently attached token, if any
    pub fn current(&self) -> Option<CredentialToken> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_attached(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// `Authorization` header value for the attached token
    pub fn bearer(&self) -> Option<String> {
        self.current()
            .map(|token| format!("Bearer {}", token.expose()))
    }

    pub(crate) fn attach(&self, token: CredentialToken) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    pub(crate) fn detach(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
