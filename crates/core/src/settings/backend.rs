use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::SettingsStore;
use crate::errors::Result;

/// Settings key holding the remote-mode flag (`"true"` / `"false"`).
pub const BACKEND_MODE_KEY: &str = "useSupabase";

/// Which data source is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    Remote,
    Local,
}

impl BackendMode {
    pub fn from_flag(use_remote: bool) -> Self {
        if use_remote {
            Self::Remote
        } else {
            Self::Local
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote)
    }
}

/// Persisted choice between the remote backend and the local store.
///
/// The flag is read on every call so that a change made through one handle is
/// seen by every component sharing the store. First read defaults to remote.
pub struct BackendSelector {
    store: Arc<dyn SettingsStore>,
}

impl BackendSelector {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    pub fn is_using_remote(&self) -> Result<bool> {
        if let Some(use_remote) = self.stored_flag()? {
            return Ok(use_remote);
        }
        self.store.set_setting(BACKEND_MODE_KEY, flag_value(true))?;
        debug!("[Backend] No stored mode, defaulting to remote");
        Ok(true)
    }

    pub fn mode(&self) -> Result<BackendMode> {
        self.is_using_remote().map(BackendMode::from_flag)
    }

    pub fn enable_remote(&self) -> Result<()> {
        self.write(true)
    }

    pub fn disable_remote(&self) -> Result<()> {
        self.write(false)
    }

    fn stored_flag(&self) -> Result<Option<bool>> {
        Ok(self
            .store
            .get_setting(BACKEND_MODE_KEY)?
            .as_deref()
            .and_then(parse_flag))
    }

    fn write(&self, use_remote: bool) -> Result<()> {
        let previous = self.stored_flag()?;
        self.store
            .set_setting(BACKEND_MODE_KEY, flag_value(use_remote))?;
        info!(
            "[Backend] Mode {} -> {}",
            previous.map_or("unset", mode_name),
            mode_name(use_remote)
        );
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn flag_value(use_remote: bool) -> &'static str {
    if use_remote {
        "true"
    } else {
        "false"
    }
}

fn mode_name(use_remote: bool) -> &'static str {
    if use_remote {
        "remote"
    } else {
        "local"
    }
}
