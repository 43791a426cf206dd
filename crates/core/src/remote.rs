//! Port for the remote relational backend.
//!
//! The core only needs a generic row select/insert capability plus the
//! authenticated user lookup. `finanzas-remote` implements it over PostgREST.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::deserialize_id;

pub const TRANSACTIONS_TABLE: &str = "transactions";
pub const SAVINGS_TABLE: &str = "savings";
pub const SAVINGS_HISTORY_TABLE: &str = "savings_history";
pub const HEALTH_CHECK_TABLE: &str = "health_check";

/// Tables the remote schema must provide.
pub const REQUIRED_TABLES: [&str; 4] = [
    TRANSACTIONS_TABLE,
    SAVINGS_TABLE,
    SAVINGS_HISTORY_TABLE,
    HEALTH_CHECK_TABLE,
];

/// Postgres `undefined_table`.
const UNDEFINED_TABLE_CODE: &str = "42P01";
/// PostgREST schema-cache miss for an unknown table.
const SCHEMA_CACHE_MISS_CODE: &str = "PGRST205";

/// Error reported by a remote backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteQueryError {
    /// HTTP status when the backend answered; `None` for transport failures.
    pub status: Option<u16>,
    /// Backend error code (`42P01`, `PGRST301`, ...).
    pub code: Option<String>,
    pub message: String,
}

impl RemoteQueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn timeout(limit: Duration) -> Self {
        Self::new(format!(
            "Remote request timed out after {} ms",
            limit.as_millis()
        ))
    }

    /// Whether the backend reported the queried relation as missing.
    pub fn is_missing_relation(&self) -> bool {
        matches!(
            self.code.as_deref(),
            Some(UNDEFINED_TABLE_CODE) | Some(SCHEMA_CACHE_MISS_CODE)
        ) || self.message.contains("does not exist")
    }

    /// Whether the backend answered at all (as opposed to a transport failure).
    pub fn is_backend_response(&self) -> bool {
        self.status.is_some()
    }
}

/// Sort order for a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

/// Row filter for [`RemoteBackend::select`]: equality predicates, optional
/// ordering and row limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    pub eq: Vec<(String, String)>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.eq.push((column.into(), value.into()));
        self
    }

    pub fn order_asc(mut self, column: impl Into<String>) -> Self {
        self.order_by = Some(OrderBy {
            column: column.into(),
            ascending: true,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Authenticated user as reported by the backend auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUser {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Generic remote backend capability.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Select rows of `table` matching `filter`, in backend order.
    async fn select(
        &self,
        table: &str,
        filter: &QueryFilter,
    ) -> Result<Vec<serde_json::Value>, RemoteQueryError>;

    /// Insert one row and return the stored representation.
    async fn insert(
        &self,
        table: &str,
        row: serde_json::Value,
    ) -> Result<Vec<serde_json::Value>, RemoteQueryError>;

    /// The user owning the current access token, `None` when signed out.
    async fn current_user(&self) -> Result<Option<RemoteUser>, RemoteQueryError>;

    /// Replace the access token used for subsequent calls.
    fn set_access_token(&self, token: Option<String>);
}

/// Bound a remote call so a hung request cannot starve later cycles.
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, RemoteQueryError>
where
    F: Future<Output = Result<T, RemoteQueryError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(RemoteQueryError::timeout(limit)),
    }
}
