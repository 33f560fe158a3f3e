use std::collections::{BTreeMap, HashSet};
use std::fmt;

use portal_core::{PortalError, PortalResult, Role, RouteOverride};

use super::policy::RoutePolicy;

/// The views of the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Home,
    Login,
    Profile,
    Dashboard,
    UsersList,
    UserDetails,
    CoursesList,
    CourseDetails,
    GradesManagement,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            View::Home => "Home",
            View::Login => "Login",
            View::Profile => "Profile",
            View::Dashboard => "Dashboard",
            View::UsersList => "Users",
            View::UserDetails => "User details",
            View::CoursesList => "Courses",
            View::CourseDetails => "Course details",
            View::GradesManagement => "Grades",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// `/courses/:id/grades` style pattern
#[derive(Debug, Clone)]
struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    fn parse(raw: &str) -> PortalResult<Self> {
        if !raw.starts_with('/') {
            return Err(PortalError::Configuration(format!(
                "route pattern must start with '/': '{}'",
                raw
            )));
        }

        let mut segments = Vec::new();
        for part in split_path(raw) {
            match part.strip_prefix(':') {
                Some("") => {
                    return Err(PortalError::Configuration(format!(
                        "unnamed parameter in route pattern '{}'",
                        raw
                    )))
                }
                Some(name) => segments.push(Segment::Param(name.to_string())),
                None => segments.push(Segment::Literal(part.to_string())),
            }
        }

        Ok(Self {
            raw: canonical(raw),
            segments,
        })
    }

    fn matches(&self, parts: &[&str]) -> Option<BTreeMap<String, String>> {
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal.as_str() == *part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), (*part).to_string());
                }
            }
        }
        Some(params)
    }
}

/// Drops query string, fragment and empty segments
fn split_path(path: &str) -> impl Iterator<Item = &str> {
    let end = path.find(|c: char| c == '?' || c == '#').unwrap_or(path.len());
    path[..end].split('/').filter(|part| !part.is_empty())
}

fn canonical(path: &str) -> String {
    let parts: Vec<&str> = split_path(path).collect();
    format!("/{}", parts.join("/"))
}

/// A resolved navigation target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub path: String,
    pub pattern: String,
    pub view: View,
    pub params: BTreeMap<String, String>,
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
struct Route {
    pattern: RoutePattern,
    view: View,
    policy: Option<RoutePolicy>,
}

/// Ordered route declarations; the first matching pattern wins and a route
/// without a policy is public.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn builder(login_route: impl Into<String>) -> RouteTableBuilder {
        RouteTableBuilder {
            login_route: login_route.into(),
            entries: Vec::new(),
        }
    }

    /// The portal's routes, redirecting denied navigations to `login_route`
    pub fn portal(login_route: &str) -> PortalResult<Self> {
        let everyone = Role::ALL;

        Self::builder(login_route)
            .public("/", View::Home)
            .public(login_route, View::Login)
            .protected("/profile", View::Profile, everyone)
            .protected("/users", View::UsersList, [Role::Administrator])
            .protected("/users/:id", View::UserDetails, [Role::Administrator])
            .protected("/dashboard", View::Dashboard, everyone)
            .protected("/courses", View::CoursesList, everyone)
            .protected("/courses/:id", View::CourseDetails, everyone)
            .protected("/courses/:id/grades", View::GradesManagement, everyone)
            .build()
    }

    /// Replace the policies of existing routes; the result is validated again
    pub fn with_overrides(mut self, overrides: &[RouteOverride]) -> PortalResult<Self> {
        for entry in overrides {
            let wanted = canonical(&entry.path);
            let route = self
                .routes
                .iter_mut()
                .find(|route| route.pattern.raw == wanted)
                .ok_or_else(|| {
                    PortalError::Configuration(format!(
                        "policy override for unknown route '{}'",
                        entry.path
                    ))
                })?;

            let redirect = match (&entry.redirect, &route.policy) {
                (Some(redirect), _) => redirect.clone(),
                (None, Some(existing)) => existing.redirect_target().to_string(),
                (None, None) => {
                    return Err(PortalError::Configuration(format!(
                        "override for public route '{}' needs a redirect target",
                        entry.path
                    )))
                }
            };

            let policy = RoutePolicy::new(entry.allowed_roles.iter().copied(), redirect)
                .map_err(|e| {
                    PortalError::Configuration(format!("route '{}': {}", entry.path, e))
                })?;
            route.policy = Some(policy);
        }

        self.validate()?;
        Ok(self)
    }

    /// Find the route for `path`
    pub fn resolve(&self, path: &str) -> Option<(RouteMatch, Option<&RoutePolicy>)> {
        let parts: Vec<&str> = split_path(path).collect();

        self.routes.iter().find_map(|route| {
            route.pattern.matches(&parts).map(|params| {
                let matched = RouteMatch {
                    path: canonical(path),
                    pattern: route.pattern.raw.clone(),
                    view: route.view,
                    params,
                };
                (matched, route.policy.as_ref())
            })
        })
    }

    /// `(pattern, view, policy)` in declaration order
    pub fn entries(&self) -> impl Iterator<Item = (&str, View, Option<&RoutePolicy>)> {
        self.routes
            .iter()
            .map(|route| (route.pattern.raw.as_str(), route.view, route.policy.as_ref()))
    }

    fn validate(&self) -> PortalResult<()> {
        let mut seen = HashSet::new();
        for route in &self.routes {
            if !seen.insert(route.pattern.raw.as_str()) {
                return Err(PortalError::Configuration(format!(
                    "route '{}' declared twice",
                    route.pattern.raw
                )));
            }
        }

        // A redirect must land somewhere reachable without a session.
        for route in &self.routes {
            let Some(policy) = &route.policy else {
                continue;
            };
            match self.resolve(policy.redirect_target()) {
                Some((_, None)) => {}
                Some((_, Some(_))) => {
                    return Err(PortalError::Configuration(format!(
                        "route '{}' redirects to protected route '{}'",
                        route.pattern.raw,
                        policy.redirect_target()
                    )))
                }
                None => {
                    return Err(PortalError::Configuration(format!(
                        "route '{}' redirects to unknown route '{}'",
                        route.pattern.raw,
                        policy.redirect_target()
                    )))
                }
            }
        }

        Ok(())
    }
}

enum Access {
    Public,
    Roles(Vec<Role>),
}

pub struct RouteTableBuilder {
    login_route: String,
    entries: Vec<(String, View, Access)>,
}

impl RouteTableBuilder {
    pub fn public(mut self, pattern: &str, view: View) -> Self {
        self.entries.push((pattern.to_string(), view, Access::Public));
        self
    }

    pub fn protected(
        mut self,
        pattern: &str,
        view: View,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        self.entries.push((
            pattern.to_string(),
            view,
            Access::Roles(roles.into_iter().collect()),
        ));
        self
    }

    /// Fails on malformed patterns, empty role sets, duplicate routes and
    /// redirects that do not land on a public route.
    pub fn build(self) -> PortalResult<RouteTable> {
        let mut routes = Vec::with_capacity(self.entries.len());
        for (pattern, view, access) in self.entries {
            let policy = match access {
                Access::Public => None,
                Access::Roles(roles) => Some(RoutePolicy::new(roles, self.login_route.clone()).map_err(
                    |e| PortalError::Configuration(format!("route '{}': {}", pattern, e)),
                )?),
            };
            routes.push(Route {
                pattern: RoutePattern::parse(&pattern)?,
                view,
                policy,
            });
        }

        let table = RouteTable { routes };
        table.validate()?;
        Ok(table)
    }
}
