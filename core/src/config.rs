use crate::errors::{PortalError, PortalResult};
use crate::types::Role;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "university-portal";
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000/api/v1";
pub const DEFAULT_LOGIN_ROUTE: &str = "/auth/login";

/// Configuration for the portal client
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PortalConfig {
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub login_route: Option<String>,
    pub persist_session: Option<bool>,
    pub session_file: Option<PathBuf>,
    pub log_level: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<RouteOverride>,
}

/// Replaces the access policy of one built-in route
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RouteOverride {
    pub path: String,
    pub allowed_roles: Vec<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl PortalConfig {
    /// Loads configuration from a file if it exists, otherwise returns the default config
    pub fn load_from_file(path: &Path) -> PortalResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            PortalError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            PortalError::Configuration(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Saves configuration to a file
    pub fn save_to_file(&self, path: &Path) -> PortalResult<()> {
        let content = toml::to_string(self).map_err(|e| {
            PortalError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PortalError::Configuration(format!("Failed to create config directory: {}", e))
            })?;
        }

        fs::write(path, content).map_err(|e| {
            PortalError::Configuration(format!("Failed to write config file: {}", e))
        })
    }

    /// Merges this config with another config, preferring values from the other config if present.
    /// Route overrides are appended, later entries win for the same path.
    pub fn merge(&self, other: &Self) -> Self {
        let mut routes = self.routes.clone();
        routes.extend(other.routes.iter().cloned());

        Self {
            api_base_url: other
                .api_base_url
                .clone()
                .or_else(|| self.api_base_url.clone()),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
            login_route: other.login_route.clone().or_else(|| self.login_route.clone()),
            persist_session: other.persist_session.or(self.persist_session),
            session_file: other
                .session_file
                .clone()
                .or_else(|| self.session_file.clone()),
            log_level: other.log_level.clone().or_else(|| self.log_level.clone()),
            routes,
        }
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(30))
    }

    pub fn login_route(&self) -> &str {
        self.login_route.as_deref().unwrap_or(DEFAULT_LOGIN_ROUTE)
    }

    pub fn persist_session(&self) -> bool {
        self.persist_session.unwrap_or(true)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("warn")
    }

    /// Location of the persisted session, `<config dir>/session.json` unless overridden
    pub fn session_file(&self) -> PortalResult<PathBuf> {
        match &self.session_file {
            Some(path) => Ok(path.clone()),
            None => Ok(get_default_config_dir(APP_NAME)?.join("session.json")),
        }
    }
}

/// Helper function to get default config directory
pub fn get_default_config_dir(app_name: &str) -> PortalResult<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        PortalError::Configuration("Could not determine config directory".to_string())
    })?;

    Ok(config_dir.join(app_name))
}

/// Helper function to get default config file path
pub fn get_default_config_file(app_name: &str) -> PortalResult<PathBuf> {
    let config_dir = get_default_config_dir(app_name)?;
    Ok(config_dir.join("config.toml"))
}
