use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::main_lib::AppState;

#[derive(Debug, Serialize)]
pub struct TablesResponse {
    pub ready: bool,
    pub tables: BTreeMap<String, bool>,
}

#[derive(Debug, Serialize)]
pub struct ConnectionResponse {
    pub connected: bool,
}

async fn check_tables(State(state): State<Arc<AppState>>) -> Json<TablesResponse> {
    let tables = state.ledger.check_tables().await;
    Json(TablesResponse {
        ready: tables.values().all(|exists| *exists),
        tables,
    })
}

async fn check_connection(State(state): State<Arc<AppState>>) -> Json<ConnectionResponse> {
    Json(ConnectionResponse {
        connected: state.ledger.check_connection().await,
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health/tables", get(check_tables))
        .route("/health/connection", get(check_connection))
}

#[cfg(test)]
mod tests {
    use crate::main_lib::app_router;
    use crate::main_lib::test_support::{get, send, test_state};
    use axum::http::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn missing_table_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/savings_history"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": "42P01",
                "message": "relation \"public.savings_history\" does not exist"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let app = app_router(test_state(&server.uri()));
        let (status, body) = send(app, get("/api/health/tables")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ready"], false);
        assert_eq!(body["tables"]["savings_history"], false);
        assert_eq!(body["tables"]["transactions"], true);
    }

    #[tokio::test]
    async fn unreachable_backend_is_not_connected() {
        let (_, body) = send(
            app_router(test_state("http://127.0.0.1:9")),
            get("/api/health/connection"),
        )
        .await;
        assert_eq!(body, json!({"connected": false}));
    }
}
