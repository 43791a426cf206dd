use finanzas_core::Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Could not prepare database location: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value no longer parses into its domain type.
    #[error("Corrupt value in {table}.{column}: {value}")]
    Corrupt {
        table: &'static str,
        column: &'static str,
        value: String,
    },
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Error::persistence(err.to_string())
    }
}
