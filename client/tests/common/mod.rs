#![allow(dead_code)]

pub mod mock_api;

use std::path::Path;

use portal_core::PortalConfig;

/// Configuration pointing at `base_url`, persisting to `session_file` when given
pub fn config(base_url: String, session_file: Option<&Path>) -> PortalConfig {
    PortalConfig {
        api_base_url: Some(base_url),
        request_timeout_secs: Some(5),
        persist_session: Some(session_file.is_some()),
        session_file: session_file.map(Path::to_path_buf),
        ..Default::default()
    }
}
