use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use finanzas_core::SignIn;

use crate::error::{ApiError, ApiResult};
use crate::main_lib::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub access_token: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user_id: Option<String>,
    pub authenticated: bool,
}

impl SessionResponse {
    fn from_user(user_id: Option<String>) -> Self {
        Self {
            authenticated: user_id.is_some(),
            user_id,
        }
    }
}

async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignInRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let token = body.access_token.filter(|token| !token.trim().is_empty());
    let credentials = match (token, body.user_id) {
        (Some(token), _) => SignIn::AccessToken(token),
        (None, Some(user_id)) => SignIn::LocalUser(user_id),
        (None, None) => {
            return Err(ApiError::BadRequest(
                "Se requiere accessToken o userId".to_string(),
            ))
        }
    };
    let user_id = state.ledger.sign_in(credentials).await?;
    Ok(Json(SessionResponse::from_user(Some(user_id))))
}

async fn sign_out(State(state): State<Arc<AppState>>) -> StatusCode {
    state.ledger.sign_out();
    StatusCode::NO_CONTENT
}

async fn current_session(State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    Json(SessionResponse::from_user(state.ledger.current_user()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/session",
        post(sign_in).delete(sign_out).get(current_session),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::main_lib::app_router;
    use crate::main_lib::test_support::{get, post_json, send, test_state};
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn token_sign_in_then_sign_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer jwt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "uuid-42"})))
            .mount(&server)
            .await;
        let state = test_state(&server.uri());

        let (status, body) = send(
            app_router(state.clone()),
            post_json("/api/session", json!({"accessToken": "jwt"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"userId": "uuid-42", "authenticated": true}));

        let request = Request::delete("/api/session").body(Body::empty()).unwrap();
        let (status, _) = send(app_router(state.clone()), request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = send(app_router(state), get("/api/session")).await;
        assert_eq!(body["authenticated"], false);
    }

    #[tokio::test]
    async fn rejected_token_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"msg": "invalid JWT"})))
            .mount(&server)
            .await;

        let (status, body) = send(
            app_router(test_state(&server.uri())),
            post_json("/api/session", json!({"accessToken": "bad"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn empty_credentials_are_a_bad_request() {
        let (status, _) = send(
            app_router(test_state("http://127.0.0.1:9")),
            post_json("/api/session", json!({"accessToken": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
