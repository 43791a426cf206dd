//! Server configuration, read once from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use finanzas_core::sync::{DEFAULT_REMOTE_TIMEOUT_MS, DEFAULT_SYNC_INTERVAL_MS};
use thiserror::Error;

pub const LISTEN_ADDR_KEY: &str = "FINANZAS_LISTEN_ADDR";
pub const DB_PATH_KEY: &str = "FINANZAS_DB_PATH";
pub const REMOTE_URL_KEY: &str = "FINANZAS_REMOTE_URL";
pub const REMOTE_API_KEY_KEY: &str = "FINANZAS_REMOTE_API_KEY";
pub const SYNC_INTERVAL_KEY: &str = "FINANZAS_SYNC_INTERVAL_MS";
pub const REQUEST_TIMEOUT_KEY: &str = "FINANZAS_REQUEST_TIMEOUT_MS";
pub const AUTOSTART_SYNC_KEY: &str = "FINANZAS_AUTOSTART_SYNC";

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8088";
const DEFAULT_DB_PATH: &str = "data/finanzas.db";
const DEFAULT_REMOTE_URL: &str = "http://127.0.0.1:54321";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub db_path: PathBuf,
    pub remote_url: String,
    pub remote_api_key: String,
    pub sync_interval: Duration,
    pub request_timeout: Duration,
    pub autostart_sync: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from `lookup`. Blank values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let listen_addr = parse(
            LISTEN_ADDR_KEY,
            read(LISTEN_ADDR_KEY).unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
        )?;
        let sync_interval_ms = match read(SYNC_INTERVAL_KEY) {
            Some(raw) => parse(SYNC_INTERVAL_KEY, raw)?,
            None => DEFAULT_SYNC_INTERVAL_MS,
        };
        let request_timeout_ms = match read(REQUEST_TIMEOUT_KEY) {
            Some(raw) => parse(REQUEST_TIMEOUT_KEY, raw)?,
            None => DEFAULT_REMOTE_TIMEOUT_MS,
        };
        let autostart_sync = match read(AUTOSTART_SYNC_KEY) {
            Some(raw) => parse_bool(AUTOSTART_SYNC_KEY, raw)?,
            None => true,
        };

        Ok(Self {
            listen_addr,
            db_path: PathBuf::from(
                read(DB_PATH_KEY).unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            ),
            remote_url: read(REMOTE_URL_KEY)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_REMOTE_URL.to_string()),
            remote_api_key: read(REMOTE_API_KEY_KEY).unwrap_or_default(),
            sync_interval: Duration::from_millis(sync_interval_ms),
            request_timeout: Duration::from_millis(request_timeout_ms),
            autostart_sync,
        })
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.parse()
        .map_err(|_| ConfigError::Invalid { key, value: raw })
}

fn parse_bool(key: &'static str, raw: String) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { key, value: raw }),
    }
}
