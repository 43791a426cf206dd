//! Core domain for the Finanzas ledger.
//!
//! Holds the record models, the field mapping between the local and remote
//! naming conventions, the backend selector, the data fetcher and sync
//! scheduler, the remote health checker and the delimited-text exporter.
//! Storage and transport live behind the traits declared here.

pub mod errors;
pub mod export;
pub mod health;
pub mod ledger;
pub mod notifications;
pub mod remote;
pub mod service;
pub mod session;
pub mod settings;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
pub use service::{LedgerService, SignIn};
