//! Message relay: forwards a text message to a third-party messaging API.
//!
//! The caller supplies the upstream connection (`apiUrl`, `instance`,
//! `apiKey`); nothing is stored.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{FromRef, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::main_lib::AppState;

const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
const ALLOW_METHODS: &str = "POST, OPTIONS";

/// HTTP client used to reach the messaging API.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
}

impl RelayClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }
}

impl FromRef<Arc<AppState>> for RelayClient {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.relay.clone()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayRequest {
    phone_number: Option<String>,
    message: Option<String>,
    api_url: Option<String>,
    instance: Option<String>,
    api_key: Option<String>,
}

/// Drop any `@…` suffix (chat ids such as `549111@s.whatsapp.net`) and a
/// leading `+`.
fn normalize_phone_number(raw: &str) -> String {
    let number = raw.split('@').next().unwrap_or_default().trim();
    number.strip_prefix('+').unwrap_or(number).to_string()
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    response
}

fn json_response(status: StatusCode, body: Value) -> Response {
    with_cors((status, Json(body)).into_response())
}

async fn send_message(State(relay): State<RelayClient>, body: Bytes) -> Response {
    let request: RelayRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => return relay_failure(err),
    };

    let Some(phone_number) = present(request.phone_number) else {
        return json_response(
            StatusCode::BAD_REQUEST,
            json!({ "error": "phoneNumber is required" }),
        );
    };
    let (Some(api_url), Some(instance), Some(api_key)) = (
        present(request.api_url),
        present(request.instance),
        present(request.api_key),
    ) else {
        return json_response(
            StatusCode::BAD_REQUEST,
            json!({ "error": "apiUrl, instance and apiKey are required" }),
        );
    };

    let number = normalize_phone_number(&phone_number);
    let url = format!(
        "{}/message/sendText/{}",
        api_url.trim_end_matches('/'),
        instance
    );
    info!("Relaying message to {}", url);

    let api_key = match HeaderValue::from_str(&api_key) {
        Ok(value) => value,
        Err(err) => return relay_failure(err),
    };
    let upstream = relay
        .http
        .post(&url)
        .header(HeaderName::from_static("apikey"), api_key)
        .json(&json!({
            "number": number,
            "text": request.message.unwrap_or_default(),
        }))
        .send()
        .await;

    let response = match upstream {
        Ok(response) => response,
        Err(err) => return relay_failure(err),
    };
    let status = StatusCode::from_u16(response.status().as_u16())
        .unwrap_or(StatusCode::BAD_GATEWAY);
    let raw = match response.text().await {
        Ok(raw) => raw,
        Err(err) => return relay_failure(err),
    };
    debug!("Relay upstream answered {}", status);

    let body = serde_json::from_str::<Value>(&raw).unwrap_or_else(|_| json!({ "text": raw }));
    json_response(status, body)
}

/// Anything past field validation that goes wrong answers `500`.
fn relay_failure(err: impl std::fmt::Display) -> Response {
    error!("Relay request failed: {}", err);
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": "Failed to relay message", "details": err.to_string() }),
    )
}

async fn preflight() -> Response {
    with_cors(StatusCode::OK.into_response())
}

async fn method_not_allowed() -> Response {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        json!({ "error": "Method not allowed" }),
    )
}

pub fn router<S>() -> Router<S>
where
    RelayClient: FromRef<S>,
    S: Clone + Send + Sync + 'static,
{
    Router::new().route(
        "/relay/send-message",
        post(send_message)
            .options(preflight)
            .fallback(method_not_allowed),
    )
}
