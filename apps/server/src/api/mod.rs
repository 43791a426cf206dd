//! REST endpoints under `/api`.

mod events;
mod health;
mod ledger;
mod relay;
mod session;
mod sync;

use std::sync::Arc;

use axum::Router;

use crate::main_lib::AppState;

pub use relay::RelayClient;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(session::router())
        .merge(ledger::router())
        .merge(health::router())
        .merge(sync::router())
        .merge(events::router())
        .merge(relay::router())
}
