use std::sync::Arc;

use rusqlite::{params, OptionalExtension};

use finanzas_core::settings::SettingsStore;
use finanzas_core::Result;

use crate::db::Database;

/// Key/value settings in the `app_settings` table.
pub struct SqliteSettingsStore {
    db: Arc<Database>,
}

impl SqliteSettingsStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl SettingsStore for SqliteSettingsStore {
    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value = self.db.with_connection(|conn| {
            let value = conn
                .query_row(
                    "SELECT setting_value FROM app_settings WHERE setting_key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value)
        })?;
        Ok(value)
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO app_settings (setting_key, setting_value) VALUES (?1, ?2)
                 ON CONFLICT(setting_key) DO UPDATE SET setting_value = excluded.setting_value",
                params![key, value],
            )?;
            Ok(())
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finanzas_core::settings::{BackendMode, BackendSelector, BACKEND_MODE_KEY};

    #[test]
    fn missing_key_reads_as_none_then_upserts() {
        let store = SqliteSettingsStore::new(Arc::new(Database::open_in_memory().unwrap()));
        assert_eq!(store.get_setting("theme").unwrap(), None);

        store.set_setting("theme", "dark").unwrap();
        store.set_setting("theme", "light").unwrap();
        assert_eq!(store.get_setting("theme").unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn backend_mode_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        {
            let store = Arc::new(SqliteSettingsStore::new(Arc::new(
                Database::open(&path).unwrap(),
            )));
            let selector = BackendSelector::new(store);
            assert_eq!(selector.mode().unwrap(), BackendMode::Remote);
            selector.disable_remote().unwrap();
        }

        let store = SqliteSettingsStore::new(Arc::new(Database::open(&path).unwrap()));
        assert_eq!(
            store.get_setting(BACKEND_MODE_KEY).unwrap().as_deref(),
            Some("false")
        );
    }
}
