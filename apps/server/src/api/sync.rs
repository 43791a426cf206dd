//! Sync scheduler endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use finanzas_core::sync::{RefreshOutcome, SyncSchedulerStatus};

use crate::events::{ServerEvent, SYNC_CYCLE_COMPLETE};
use crate::main_lib::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSyncQuery {
    pub interval_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerResponse {
    /// Whether the call changed the scheduler state.
    pub changed: bool,
    pub status: SyncSchedulerStatus,
}

async fn start_sync(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StartSyncQuery>,
) -> Json<SchedulerResponse> {
    let changed = state
        .ledger
        .start_sync(query.interval_ms.map(Duration::from_millis));
    Json(SchedulerResponse {
        changed,
        status: state.ledger.sync_status(),
    })
}

async fn stop_sync(State(state): State<Arc<AppState>>) -> Json<SchedulerResponse> {
    let changed = state.ledger.stop_sync();
    Json(SchedulerResponse {
        changed,
        status: state.ledger.sync_status(),
    })
}

async fn refresh(State(state): State<Arc<AppState>>) -> Json<RefreshOutcome> {
    let outcome = state.ledger.refresh().await;
    if let RefreshOutcome::Completed(report) = &outcome {
        match serde_json::to_value(report) {
            Ok(payload) => state
                .event_bus
                .publish(ServerEvent::with_payload(SYNC_CYCLE_COMPLETE, payload)),
            Err(err) => {
                debug!("Unserializable cycle report: {}", err);
                state.event_bus.publish(ServerEvent::new(SYNC_CYCLE_COMPLETE));
            }
        }
    }
    Json(outcome)
}

async fn sync_status(State(state): State<Arc<AppState>>) -> Json<SyncSchedulerStatus> {
    Json(state.ledger.sync_status())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sync/start", post(start_sync))
        .route("/sync/stop", post(stop_sync))
        .route("/sync/refresh", post(refresh))
        .route("/sync/status", get(sync_status))
}
