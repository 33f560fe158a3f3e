use std::sync::Arc;

use tracing::info;

use portal_auth::session::{FileSessionPersistence, SessionPersistenceRef};
use portal_auth::{AccessGuard, Credentials, Navigation, RouteTable, Session, SessionStore};
use portal_core::{PortalConfig, PortalResult};

use crate::auth_api::HttpAuthenticator;
use crate::http::ApiClient;
use crate::resources::ResourceClient;

/// Everything a portal front end needs, wired around one session store
#[derive(Debug)]
pub struct Portal {
    store: Arc<SessionStore<HttpAuthenticator>>,
    guard: AccessGuard,
    resources: ResourceClient,
}

impl Portal {
    /// Build from configuration, persisting the session to the configured
    /// file unless persistence is switched off.
    pub fn new(config: &PortalConfig) -> PortalResult<Self> {
        let persistence: Option<SessionPersistenceRef> = if config.persist_session() {
            Some(Arc::new(FileSessionPersistence::new(config.session_file()?)))
        } else {
            None
        };
        Self::with_persistence(config, persistence)
    }

    /// Route policies are validated here; a bad override is a configuration error.
    pub fn with_persistence(
        config: &PortalConfig,
        persistence: Option<SessionPersistenceRef>,
    ) -> PortalResult<Self> {
        let routes = RouteTable::portal(config.login_route())?.with_overrides(&config.routes)?;
        let api = ApiClient::new(config)?;

        let mut store = SessionStore::new(HttpAuthenticator::new(api.clone()));
        if let Some(persistence) = persistence {
            store = store.with_persistence(persistence);
        }
        let store = Arc::new(store);
        let resources = ResourceClient::new(api, store.channel(), store.clone());

        info!(api = %config.api_base_url(), "Portal client ready");
        Ok(Self {
            store,
            guard: AccessGuard::new(routes),
            resources,
        })
    }

    pub async fn restore(&self) -> Session {
        self.store.restore().await
    }

    pub async fn login(&self, email: &str, password: &str) -> PortalResult<Session> {
        self.store.login(&Credentials::new(email, password)).await
    }

    pub fn logout(&self) {
        self.store.logout();
    }

    pub fn session(&self) -> Session {
        self.store.current_session()
    }

    /// Guarded navigation against the session as it is right now
    pub fn navigate(&self, path: &str) -> Navigation {
        self.guard.navigate(path, &self.store.current_session())
    }

    pub fn api(&self) -> &ResourceClient {
        &self.resources
    }

    pub fn guard(&self) -> &AccessGuard {
        &self.guard
    }

    pub fn store(&self) -> &Arc<SessionStore<HttpAuthenticator>> {
        &self.store
    }
}
