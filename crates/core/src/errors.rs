//! Error types for the ledger core.

use thiserror::Error;

use crate::remote::RemoteQueryError;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the ledger core.
#[derive(Debug, Error)]
pub enum Error {
    /// Remote data access attempted without a session user.
    #[error("No authenticated user in the current session")]
    Unauthenticated,

    /// The remote backend rejected or failed a query.
    #[error("Remote query failed: {0}")]
    RemoteQuery(#[from] RemoteQueryError),

    /// Durable storage (settings flag, local ledger) could not be read or written.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Export requested with no records.
    #[error("There are no transactions to export")]
    EmptyExportInput,

    /// Delimited-text writer failure.
    #[error("Export error: {0}")]
    Export(String),

    /// Rejected user input (negative amounts, malformed payloads, ...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// True for failures the user can fix by signing in again.
    pub fn is_auth_error(&self) -> bool {
        match self {
            Self::Unauthenticated => true,
            Self::RemoteQuery(err) => matches!(err.status, Some(401 | 403)),
            _ => false,
        }
    }
}
