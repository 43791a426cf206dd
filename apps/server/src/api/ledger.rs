//! Backend mode, transactions, savings and export endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};

use finanzas_core::export::export_file_name;
use finanzas_core::ledger::{NewTransaction, SavingsRecord, Transaction};
use finanzas_core::settings::BackendMode;

use crate::error::ApiResult;
use crate::main_lib::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendResponse {
    pub mode: BackendMode,
    pub use_remote: bool,
}

impl From<BackendMode> for BackendResponse {
    fn from(mode: BackendMode) -> Self {
        Self {
            mode,
            use_remote: mode.is_remote(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBackendRequest {
    pub use_remote: bool,
}

async fn get_backend(State(state): State<Arc<AppState>>) -> ApiResult<Json<BackendResponse>> {
    Ok(Json(state.ledger.backend_mode()?.into()))
}

async fn set_backend(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetBackendRequest>,
) -> ApiResult<Json<BackendResponse>> {
    let mode = state.ledger.set_remote_enabled(body.use_remote).await?;
    Ok(Json(mode.into()))
}

async fn list_transactions(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Transaction>>> {
    Ok(Json(state.ledger.transactions().await?))
}

async fn add_transaction(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewTransaction>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let created = state.ledger.add_transaction(body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_savings(State(state): State<Arc<AppState>>) -> ApiResult<Json<SavingsRecord>> {
    Ok(Json(state.ledger.savings().await?))
}

async fn export_transactions(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let text = state.ledger.export().await?;
    let file_name = export_file_name(Local::now().date_naive());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        text,
    )
        .into_response())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/backend", get(get_backend).put(set_backend))
        .route("/transactions", get(list_transactions).post(add_transaction))
        .route("/savings", get(get_savings))
        .route("/export", get(export_transactions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::main_lib::app_router;
    use crate::main_lib::test_support::{get, post_json, send, test_state};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn put_json(uri: &str, body: Value) -> Request<Body> {
        Request::put(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn local_session(state: &Arc<AppState>) {
        let (status, _) = send(
            app_router(state.clone()),
            put_json("/api/backend", json!({"useRemote": false})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(
            app_router(state.clone()),
            post_json("/api/session", json!({"userId": "42"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn backend_defaults_to_remote() {
        let (status, body) = send(
            app_router(test_state("http://127.0.0.1:9")),
            get("/api/backend"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"mode": "remote", "useRemote": true}));
    }

    #[tokio::test]
    async fn remote_listing_without_session_is_unauthorized() {
        let (status, body) = send(
            app_router(test_state("http://127.0.0.1:9")),
            get("/api/transactions"),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Inicia sesión para continuar");
    }

    #[tokio::test]
    async fn local_add_list_and_export() {
        let state = test_state("http://127.0.0.1:9");
        local_session(&state).await;

        let (status, created) = send(
            app_router(state.clone()),
            post_json(
                "/api/transactions",
                json!({
                    "type": "entrada",
                    "amount": 1500,
                    "category": "Salario",
                    "date": "2024-01-05",
                    "description": "Pago"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["userId"], "42");
        assert_eq!(created["costType"], "");

        let (_, listed) = send(app_router(state.clone()), get("/api/transactions")).await;
        assert_eq!(listed.as_array().map(Vec::len), Some(1));

        let response = app_router(state).oneshot(get("/api/export")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"transacciones_"));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(
            text.lines().nth(1),
            Some("2024-01-05;Ingreso;Salario;Pago;1500.00;")
        );
    }

    #[tokio::test]
    async fn negative_amount_is_rejected() {
        let state = test_state("http://127.0.0.1:9");
        local_session(&state).await;

        let (status, body) = send(
            app_router(state),
            post_json(
                "/api/transactions",
                json!({"type": "salida", "amount": -3, "category": "Comida", "date": "2024-01-05"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "amount must not be negative");
    }

    #[tokio::test]
    async fn empty_export_is_a_bad_request() {
        let state = test_state("http://127.0.0.1:9");
        local_session(&state).await;

        let (status, body) = send(app_router(state), get("/api/export")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No hay transacciones para exportar");
    }

    #[tokio::test]
    async fn local_savings_default_to_zero() {
        let state = test_state("http://127.0.0.1:9");
        local_session(&state).await;

        let (status, body) = send(app_router(state), get("/api/savings")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["history"], json!([]));
    }
}
