//! Configuration structures
//!
//! Deserialized from environment variables or a config file by the infra
//! loader; consumed by the binary when wiring up a run.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BIND_ADDR, DEFAULT_CALENDAR_NAME, DEFAULT_FOLDER_NAME};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub google: GoogleConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// OAuth client credentials for the Google APIs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Long-lived refresh token for headless runs; the web front-end
    /// obtains tokens interactively instead.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Source folder and target calendar for one sync pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_folder_name")]
    pub folder_name: String,
    #[serde(default = "default_calendar_name")]
    pub calendar_name: String,
}

/// HTTP front-end settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { folder_name: default_folder_name(), calendar_name: default_calendar_name() }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: default_bind_addr() }
    }
}

fn default_folder_name() -> String {
    DEFAULT_FOLDER_NAME.to_string()
}

fn default_calendar_name() -> String {
    DEFAULT_CALENDAR_NAME.to_string()
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}
