use serde::Deserialize;

/// Error body returned by PostgREST and the auth service.
///
/// PostgREST uses `code`/`message`/`details`/`hint`; the auth service answers
/// with `error`/`error_description` or `msg`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
}

impl ApiErrorResponse {
    /// Backend error code as text. Auth errors report numeric codes.
    pub fn code(&self) -> Option<String> {
        match self.code.as_ref()? {
            serde_json::Value::String(code) => Some(code.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn message(&self) -> Option<String> {
        self.message
            .clone()
            .or_else(|| self.error_description.clone())
            .or_else(|| self.msg.clone())
            .or_else(|| self.error.clone())
    }
}
