use std::collections::BTreeSet;
use std::fmt;

use portal_core::{PortalError, PortalResult, Role};

use crate::session::Session;

/// Which roles may reach a protected view, and where everyone else is sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    allowed_roles: BTreeSet<Role>,
    redirect_target: String,
}

impl RoutePolicy {
    /// Fails with a configuration error on an empty role set: a protected
    /// view must name who may see it.
    pub fn new(
        allowed_roles: impl IntoIterator<Item = Role>,
        redirect_target: impl Into<String>,
    ) -> PortalResult<Self> {
        let allowed_roles: BTreeSet<Role> = allowed_roles.into_iter().collect();
        let redirect_target = redirect_target.into();

        if allowed_roles.is_empty() {
            return Err(PortalError::Configuration(
                "protected route declared with an empty set of allowed roles".to_string(),
            ));
        }
        if !redirect_target.starts_with('/') {
            return Err(PortalError::Configuration(format!(
                "redirect target must be an absolute path, got '{}'",
                redirect_target
            )));
        }

        Ok(Self {
            allowed_roles,
            redirect_target,
        })
    }

    /// Every authenticated principal, whatever the role
    pub fn any_role(redirect_target: impl Into<String>) -> PortalResult<Self> {
        Self::new(Role::ALL, redirect_target)
    }

    pub fn allowed_roles(&self) -> &BTreeSet<Role> {
        &self.allowed_roles
    }

    pub fn redirect_target(&self) -> &str {
        &self.redirect_target
    }

    pub fn permits(&self, role: Role) -> bool {
        self.allowed_roles.contains(&role)
    }
}

impl fmt::Display for RoutePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roles: Vec<&str> = self.allowed_roles.iter().map(Role::as_str).collect();
        write!(f, "{} (else {})", roles.join(", "), self.redirect_target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No confirmed session, including a store that was never initialized
    Unauthenticated,
    RoleNotPermitted(Role),
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::Unauthenticated => f.write_str("not logged in"),
            DenyReason::RoleNotPermitted(role) => write!(f, "role {} is not permitted", role),
        }
    }
}

/// Outcome of a guard decision. Denial is an ordinary value, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny {
        redirect_to: String,
        reason: DenyReason,
    },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Decide reachability of a view protected by `policy` for `session`
pub fn evaluate(policy: &RoutePolicy, session: &Session) -> Decision {
    let deny = |reason| Decision::Deny {
        redirect_to: policy.redirect_target.clone(),
        reason,
    };

    match session {
        Session::Authenticated { principal, .. } if policy.permits(principal.role) => {
            Decision::Allow
        }
        Session::Authenticated { principal, .. } => {
            deny(DenyReason::RoleNotPermitted(principal.role))
        }
        Session::Uninitialized | Session::Unauthenticated => deny(DenyReason::Unauthenticated),
    }
}
