use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use finanzas_core::Error as CoreError;

pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP-facing error. Messages are shown to end users as-is.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    BadGateway(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        if err.is_auth_error() {
            warn!("Request rejected: {}", err);
            return Self::Unauthorized("Inicia sesión para continuar".to_string());
        }
        match err {
            CoreError::InvalidInput(message) => Self::BadRequest(message),
            CoreError::EmptyExportInput => {
                Self::BadRequest("No hay transacciones para exportar".to_string())
            }
            CoreError::RemoteQuery(err) => {
                warn!("Remote backend call failed: {}", err);
                Self::BadGateway("El servidor remoto no respondió correctamente".to_string())
            }
            other => {
                error!("Request failed: {}", other);
                Self::Internal("Error interno del servidor".to_string())
            }
        }
    }
}
