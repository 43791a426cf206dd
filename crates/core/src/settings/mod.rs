//! Durable key-value settings and the backend selector built on them.

mod backend;

pub use backend::*;

use crate::errors::Result;

/// Durable key-value storage that survives restarts.
pub trait SettingsStore: Send + Sync {
    fn get_setting(&self, key: &str) -> Result<Option<String>>;
    fn set_setting(&self, key: &str, value: &str) -> Result<()>;
}
