//! Remote schema readiness probes.
//!
//! A probe error that does not look like "table missing" is read as "the
//! table exists but something else failed". Known imprecision: such a result
//! cannot tell a missing table from an unreachable backend.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, error, info, warn};

use crate::remote::{bounded, QueryFilter, RemoteBackend, HEALTH_CHECK_TABLE, REQUIRED_TABLES};

#[derive(Clone)]
pub struct HealthChecker {
    remote: Arc<dyn RemoteBackend>,
    probe_timeout: Duration,
}

impl HealthChecker {
    pub fn new(remote: Arc<dyn RemoteBackend>, probe_timeout: Duration) -> Self {
        Self {
            remote,
            probe_timeout,
        }
    }

    /// Select at most one row from `table`.
    pub async fn check_table_exists(&self, table: &str) -> bool {
        let probe = QueryFilter::new().limit(1);
        match bounded(self.probe_timeout, self.remote.select(table, &probe)).await {
            Ok(_) => {
                debug!("[Health] Table '{}' is reachable", table);
                true
            }
            Err(err) if err.is_missing_relation() => {
                warn!("[Health] Table '{}' does not exist", table);
                false
            }
            Err(err) => {
                warn!(
                    "[Health] Probe on '{}' failed ({}); assuming the table exists",
                    table, err
                );
                true
            }
        }
    }

    /// Probe every required table concurrently. A probe that panics counts as
    /// missing for its own table only.
    pub async fn check_required_tables(&self) -> BTreeMap<String, bool> {
        let probes = REQUIRED_TABLES.iter().map(|table| {
            let checker = self.clone();
            let table = table.to_string();
            tokio::spawn(async move { checker.check_table_exists(&table).await })
        });
        let outcomes = join_all(probes).await;

        REQUIRED_TABLES
            .iter()
            .zip(outcomes)
            .map(|(table, outcome)| {
                let exists = outcome.unwrap_or_else(|err| {
                    error!("[Health] Probe task for '{}' failed: {}", table, err);
                    false
                });
                (table.to_string(), exists)
            })
            .collect()
    }

    /// `true` when every required table exists. Never creates tables.
    pub async fn ensure_tables_exist(&self) -> bool {
        let tables = self.check_required_tables().await;
        let missing: Vec<&str> = tables
            .iter()
            .filter(|(_, exists)| !**exists)
            .map(|(table, _)| table.as_str())
            .collect();
        if missing.is_empty() {
            info!("[Health] All required tables are present");
            return true;
        }
        warn!(
            "[Health] Missing tables: {}. They must be created from the backend administration console.",
            missing.join(", ")
        );
        false
    }

    /// Whether the backend answers at all. A "table missing" answer still
    /// proves the backend is reachable.
    pub async fn check_connection(&self) -> bool {
        let probe = QueryFilter::new().limit(1);
        match bounded(
            self.probe_timeout,
            self.remote.select(HEALTH_CHECK_TABLE, &probe),
        )
        .await
        {
            Ok(_) => true,
            Err(err) if err.is_backend_response() => {
                debug!("[Health] Backend reachable but probe failed: {}", err);
                true
            }
            Err(err) => {
                warn!("[Health] Backend unreachable: {}", err);
                false
            }
        }
    }
}
