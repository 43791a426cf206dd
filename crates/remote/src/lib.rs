//! PostgREST-compatible implementation of the ledger's remote backend.

mod client;
mod error;
mod types;

pub use client::PostgrestClient;
pub use error::{RemoteError, Result};
pub use types::ApiErrorResponse;
