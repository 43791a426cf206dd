//! HTTP client for a PostgREST data API with a GoTrue-style auth service.
//!
//! Rows are read with `GET /rest/v1/{table}` and written with
//! `POST /rest/v1/{table}`; the signed-in user comes from `GET /auth/v1/user`.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;

use finanzas_core::remote::{QueryFilter, RemoteBackend, RemoteQueryError, RemoteUser};

use crate::error::{RemoteError, Result};
use crate::types::ApiErrorResponse;

const MAX_LOG_BODY_CHARS: usize = 512;
const REST_PATH: &str = "rest/v1";
const AUTH_USER_PATH: &str = "auth/v1/user";

/// Client for the remote ledger tables.
///
/// Requests carry the project API key in `apikey`. `Authorization` carries
/// the user's access token when signed in, and the API key otherwise.
#[derive(Debug)]
pub struct PostgrestClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    access_token: RwLock<Option<String>>,
}

impl PostgrestClient {
    fn log_response(status: StatusCode, body: &str) {
        if status.is_success() {
            debug!("API response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("API response error ({}): {}", status, preview);
    }

    /// Create a client for the project at `base_url`.
    ///
    /// `timeout` bounds each HTTP request, including connect.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(RemoteError::invalid_request("Remote base URL is empty"));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            access_token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn bearer(&self) -> String {
        self.access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(|| self.api_key.clone())
    }

    fn headers(&self, bearer: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let api_key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| RemoteError::auth("Invalid API key format"))?;
        headers.insert("apikey", api_key);

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", bearer))
            .map_err(|_| RemoteError::auth("Invalid access token format"))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    fn table_url(&self, table: &str) -> Result<String> {
        let valid = !table.is_empty()
            && table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(RemoteError::invalid_request(format!(
                "Invalid table name '{}'",
                table
            )));
        }
        Ok(format!("{}/{}/{}", self.base_url, REST_PATH, table))
    }

    /// PostgREST query string for `filter`.
    fn query_string(filter: &QueryFilter) -> String {
        let mut params = vec!["select=*".to_string()];
        for (column, value) in &filter.eq {
            params.push(format!(
                "{}=eq.{}",
                urlencoding::encode(column),
                urlencoding::encode(value)
            ));
        }
        if let Some(order) = &filter.order_by {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(format!(
                "order={}.{}",
                urlencoding::encode(&order.column),
                direction
            ));
        }
        if let Some(limit) = filter.limit {
            params.push(format!("limit={}", limit));
        }
        params.join("&")
    }

    /// Parse a JSON response body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                if let Some(message) = error.message() {
                    return Err(RemoteError::api(status.as_u16(), error.code(), message));
                }
            }
            return Err(RemoteError::api(
                status.as_u16(),
                None,
                format!("Request failed: {}", body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            error!(
                "Failed to deserialize response. Body: {}, Error: {}",
                body, e
            );
            RemoteError::api(
                status.as_u16(),
                None,
                format!("Failed to parse response: {}", e),
            )
        })
    }

    /// Rows of `table` matching `filter`.
    pub async fn select_rows(&self, table: &str, filter: &QueryFilter) -> Result<Vec<Value>> {
        let url = format!("{}?{}", self.table_url(table)?, Self::query_string(filter));
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .headers(self.headers(&self.bearer())?)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Insert one row and return the stored representation.
    pub async fn insert_row(&self, table: &str, row: &Value) -> Result<Vec<Value>> {
        let url = self.table_url(table)?;
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .headers(self.headers(&self.bearer())?)
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// The user owning the current access token.
    ///
    /// `None` without a token, or when the auth service rejects it.
    pub async fn fetch_user(&self) -> Result<Option<RemoteUser>> {
        let token = self
            .access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(token) = token else {
            return Ok(None);
        };

        let url = format!("{}/{}", self.base_url, AUTH_USER_PATH);
        let response = self
            .client
            .get(&url)
            .headers(self.headers(&token)?)
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            debug!("Access token rejected ({})", response.status());
            return Ok(None);
        }
        Self::parse_response(response).await.map(Some)
    }
}

#[async_trait]
impl RemoteBackend for PostgrestClient {
    async fn select(
        &self,
        table: &str,
        filter: &QueryFilter,
    ) -> std::result::Result<Vec<Value>, RemoteQueryError> {
        self.select_rows(table, filter).await.map_err(Into::into)
    }

    async fn insert(
        &self,
        table: &str,
        row: Value,
    ) -> std::result::Result<Vec<Value>, RemoteQueryError> {
        self.insert_row(table, &row).await.map_err(Into::into)
    }

    async fn current_user(&self) -> std::result::Result<Option<RemoteUser>, RemoteQueryError> {
        self.fetch_user().await.map_err(Into::into)
    }

    fn set_access_token(&self, token: Option<String>) {
        let token = token.filter(|token| !token.trim().is_empty());
        *self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }
}
