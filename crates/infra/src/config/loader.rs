//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `TRAILSYNC_CLIENT_ID`: OAuth client id (required)
//! - `TRAILSYNC_CLIENT_SECRET`: OAuth client secret (required)
//! - `TRAILSYNC_REFRESH_TOKEN`: refresh token for headless runs (optional)
//! - `TRAILSYNC_FOLDER_NAME`: source folder name (optional)
//! - `TRAILSYNC_CALENDAR_NAME`: target calendar summary (optional)
//! - `TRAILSYNC_BIND_ADDR`: front-end listen address (optional)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml`
//! 2. `./trailsync.json` or `./trailsync.toml`
//! 3. The same names in the parent directory

use std::path::{Path, PathBuf};

use trailsync_domain::{Config, GoogleConfig, Result, ServerConfig, SyncConfig, TrailSyncError};

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `TrailSyncError::Config` if configuration can be loaded from
/// neither source.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// The OAuth client variables are required; everything else falls back to
/// its default.
pub fn load_from_env() -> Result<Config> {
    let client_id = env_var("TRAILSYNC_CLIENT_ID")?;
    let client_secret = env_var("TRAILSYNC_CLIENT_SECRET")?;
    let refresh_token = std::env::var("TRAILSYNC_REFRESH_TOKEN").ok();

    let mut sync = SyncConfig::default();
    if let Ok(folder_name) = std::env::var("TRAILSYNC_FOLDER_NAME") {
        sync.folder_name = folder_name;
    }
    if let Ok(calendar_name) = std::env::var("TRAILSYNC_CALENDAR_NAME") {
        sync.calendar_name = calendar_name;
    }

    let mut server = ServerConfig::default();
    if let Ok(bind_addr) = std::env::var("TRAILSYNC_BIND_ADDR") {
        server.bind_addr = bind_addr;
    }

    Ok(Config {
        google: GoogleConfig { client_id, client_secret, refresh_token },
        sync,
        server,
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the default locations. The format is
/// detected by file extension.
pub fn load_from_file(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => probe_config_paths().into_iter().find(|p| p.exists()).ok_or_else(|| {
            TrailSyncError::Config(
                "no config file found; create config.json or set TRAILSYNC_* variables"
                    .to_string(),
            )
        })?,
    };

    let contents = std::fs::read_to_string(&path).map_err(|e| {
        TrailSyncError::Config(format!("failed to read {}: {e}", path.display()))
    })?;

    let config = parse_config(&path, &contents)?;
    tracing::info!(path = %path.display(), "Configuration loaded from file");
    Ok(config)
}

fn parse_config(path: &Path, contents: &str) -> Result<Config> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(contents).map_err(|e| {
            TrailSyncError::Config(format!("invalid JSON in {}: {e}", path.display()))
        }),
        Some("toml") => toml::from_str(contents).map_err(|e| {
            TrailSyncError::Config(format!("invalid TOML in {}: {e}", path.display()))
        }),
        other => Err(TrailSyncError::Config(format!(
            "unsupported config format {:?} for {}",
            other,
            path.display()
        ))),
    }
}

fn probe_config_paths() -> Vec<PathBuf> {
    let names = ["config.json", "config.toml", "trailsync.json", "trailsync.toml"];
    let mut paths = Vec::new();

    for base in [".", ".."] {
        for name in names {
            paths.push(Path::new(base).join(name));
        }
    }

    paths
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| TrailSyncError::Config(format!("missing environment variable {name}")))
}
