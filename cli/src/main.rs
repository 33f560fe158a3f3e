use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};

use portal_client::Portal;
use portal_core::config::{get_default_config_file, APP_NAME};
use portal_core::{PortalConfig, PortalError};

mod app;
mod cli;
mod logging;
mod output;
mod views;

use crate::cli::{Args, Command};
use crate::output::{print_error, print_forced_logout_hint};

/// Exit status after the API refused the stored session
const EXIT_SESSION_ENDED: u8 = 3;

/// Configuration file merged with command-line overrides
fn load_config(args: &Args) -> Result<(PortalConfig, PathBuf)> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => get_default_config_file(APP_NAME)?,
    };

    let from_file = PortalConfig::load_from_file(&path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    let overrides = PortalConfig {
        api_base_url: args.api_url.clone(),
        log_level: args.log_level.clone(),
        ..Default::default()
    };

    Ok((from_file.merge(&overrides), path))
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let (config, config_path) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            print_error(&format!("{:#}", e));
            return ExitCode::FAILURE;
        }
    };
    logging::init(config.log_level());
    debug!(config = %config_path.display(), "Configuration loaded");

    if let Command::Config(command) = args.command {
        return match app::run_config(command, &config, &config_path) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                print_error(&format!("{:#}", e));
                ExitCode::FAILURE
            }
        };
    }

    let portal = match Portal::new(&config) {
        Ok(portal) => portal,
        Err(e) => {
            print_error(&format!("Invalid configuration: {}", e));
            return ExitCode::FAILURE;
        }
    };

    let restored = portal.restore().await;
    info!(authenticated = restored.is_authenticated(), "Session restored");

    match app::run(&portal, args.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let refused = e
                .downcast_ref::<PortalError>()
                .is_some_and(PortalError::is_unauthorized);

            if refused && restored.is_authenticated() && !portal.session().is_authenticated() {
                print_forced_logout_hint();
                return ExitCode::from(EXIT_SESSION_ENDED);
            }
            print_error(&format!("{:#}", e));
            if refused {
                eprintln!("  Log in with `portal login` first.");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_command_line_overrides_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "api_base_url = \"http://portal.example/api/v1\"\nlog_level = \"debug\"\npersist_session = false\n",
        )
        .unwrap();

        let args = Args::try_parse_from([
            "portal",
            "--config",
            path.to_str().unwrap(),
            "--api-url",
            "http://127.0.0.1:9000/api/v1",
            "whoami",
        ])
        .unwrap();
        let (config, loaded_from) = load_config(&args).unwrap();

        assert_eq!(loaded_from, path);
        assert_eq!(config.api_base_url(), "http://127.0.0.1:9000/api/v1");
        assert!(!config.persist_session());
        if std::env::var_os("PORTAL_LOG").is_none() {
            assert_eq!(config.log_level(), "debug");
        }
    }

    #[test]
    fn test_broken_config_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_base_url = [").unwrap();

        let args =
            Args::try_parse_from(["portal", "--config", path.to_str().unwrap(), "whoami"]).unwrap();
        assert!(load_config(&args).is_err());
    }
}
