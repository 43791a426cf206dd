mod repository;

pub use repository::SqliteSettingsStore;
