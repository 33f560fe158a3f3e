//! Access guard for portal navigation
//!
//! Every navigation is decided from the session snapshot taken at that
//! moment; nothing is cached between navigations, so a login, logout or
//! forced logout takes effect on the very next one. The guard only returns
//! a value, performing the redirect is left to the view layer.

mod policy;
mod routes;

pub use policy::{evaluate, Decision, DenyReason, RoutePolicy};
pub use routes::{RouteMatch, RouteTable, RouteTableBuilder, View};

use tracing::debug;

use crate::session::Session;

/// Where a navigation ends up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Render(RouteMatch),
    Redirect { to: String, reason: DenyReason },
    NotFound { path: String },
}

#[derive(Debug, Clone)]
pub struct AccessGuard {
    routes: RouteTable,
}

impl AccessGuard {
    pub fn new(routes: RouteTable) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Decide a navigation to `path` for `session`
    pub fn navigate(&self, path: &str, session: &Session) -> Navigation {
        let Some((matched, policy)) = self.routes.resolve(path) else {
            debug!(path, "No route matches");
            return Navigation::NotFound {
                path: path.to_string(),
            };
        };

        let Some(policy) = policy else {
            debug!(path, view = %matched.view, "Public route");
            return Navigation::Render(matched);
        };

        match evaluate(policy, session) {
            Decision::Allow => {
                debug!(path, view = %matched.view, "Access granted");
                Navigation::Render(matched)
            }
            Decision::Deny {
                redirect_to,
                reason,
            } => {
                debug!(path, %reason, redirect_to = %redirect_to, "Access denied");
                Navigation::Redirect {
                    to: redirect_to,
                    reason,
                }
            }
        }
    }
}
