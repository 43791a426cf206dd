//! Sync cycle models.

use serde::{Deserialize, Serialize};

/// Trigger source for sync cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncCycleTrigger {
    Startup,
    Periodic,
    Manual,
    BackendToggle,
    LocalMutation,
}

/// Outcome class of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncCycleStatus {
    Ok,
    Partial,
    Failed,
}

impl SyncCycleStatus {
    pub fn from_outcomes(transactions_ok: bool, savings_ok: bool) -> Self {
        match (transactions_ok, savings_ok) {
            (true, true) => Self::Ok,
            (false, false) => Self::Failed,
            _ => Self::Partial,
        }
    }
}

/// Result of one fetch cycle over transactions and savings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCycleReport {
    pub trigger: SyncCycleTrigger,
    pub status: SyncCycleStatus,
    /// Transactions now in the cache, when that fetch succeeded.
    pub transactions: Option<usize>,
    /// Savings history entries now in the cache, when that fetch succeeded.
    pub savings_entries: Option<usize>,
    pub errors: Vec<String>,
    pub duration_ms: i64,
}

/// Result of a manual refresh request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "report")]
pub enum RefreshOutcome {
    Completed(SyncCycleReport),
    /// A cycle was already in flight; the request was folded into it.
    Coalesced,
}
