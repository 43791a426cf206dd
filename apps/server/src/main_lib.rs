use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use finanzas_core::service::SyncOptions;
use finanzas_core::LedgerService;
use finanzas_remote::PostgrestClient;
use finanzas_storage_sqlite::{Database, SqliteLedgerStore, SqliteSettingsStore};

use crate::api::{self, RelayClient};
use crate::config::AppConfig;
use crate::events::EventBus;

pub struct AppState {
    pub config: Arc<AppConfig>,
    pub ledger: Arc<LedgerService>,
    pub event_bus: EventBus,
    pub relay: RelayClient,
}

impl AppState {
    /// Wire the ledger service over `db` and the configured remote backend.
    pub fn new(config: AppConfig, db: Arc<Database>) -> anyhow::Result<Self> {
        let remote = PostgrestClient::new(
            &config.remote_url,
            &config.remote_api_key,
            config.request_timeout,
        )?;
        let event_bus = EventBus::new();
        let ledger = LedgerService::new(
            Arc::new(SqliteSettingsStore::new(Arc::clone(&db))),
            Arc::new(remote),
            Arc::new(SqliteLedgerStore::new(db)),
            Arc::new(event_bus.clone()),
            SyncOptions {
                sync_interval: config.sync_interval,
                request_timeout: config.request_timeout,
            },
        );
        let relay = RelayClient::new(config.request_timeout)?;

        Ok(Self {
            config: Arc::new(config),
            ledger: Arc::new(ledger),
            event_bus,
            relay,
        })
    }
}

/// Open storage, seed the cache and start the scheduler when configured.
pub async fn build_state(config: AppConfig) -> anyhow::Result<Arc<AppState>> {
    let db = Arc::new(Database::open(&config.db_path)?);
    let state = AppState::new(config, db)?;

    let mode = state.ledger.initialize().await?;
    info!(
        "Ledger ready in {:?} mode, remote backend {}",
        mode, state.config.remote_url
    );
    if state.config.autostart_sync {
        state.ledger.start_sync(None);
    }
    Ok(Arc::new(state))
}

pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    pub fn test_config(remote_url: &str) -> AppConfig {
        AppConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            db_path: "unused.db".into(),
            remote_url: remote_url.to_string(),
            remote_api_key: "anon-key".to_string(),
            sync_interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(5),
            autostart_sync: false,
        }
    }

    pub fn test_state(remote_url: &str) -> Arc<AppState> {
        let db = Arc::new(Database::open_in_memory().unwrap());
        Arc::new(AppState::new(test_config(remote_url), db).unwrap())
    }

    /// Run one request through `app`; non-JSON bodies read as `Value::Null`.
    pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }
}
