//! SQLite persistence for the backend-mode flag and the local ledger.

pub mod db;
pub mod errors;
pub mod ledger;
pub mod settings;

pub use db::Database;
pub use errors::StorageError;
pub use ledger::SqliteLedgerStore;
pub use settings::SqliteSettingsStore;
