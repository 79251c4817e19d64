//! Error taxonomy shared by every store and API call.

use serde::Deserialize;
use serde_json::Value;

/// Errors produced while talking to the game API.
///
/// Every error is non-fatal: stores record the last one and the user may
/// retry the action that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not have the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// A start or collect request is already in flight.
    #[error("another mining request is already in progress")]
    Busy,

    /// The call needs a signed-in user.
    #[error("no authenticated user")]
    NotAuthenticated,
}

impl ApiError {
    /// Build an [`ApiError::Http`] from a raw error body.
    ///
    /// Laravel-style bodies carry `message`, `error` or an `errors` map of
    /// field messages; `fallback` is used when none of them is present.
    pub fn from_body(status: u16, body: &str, fallback: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| fallback.to_string());

        ApiError::Http { status, message }
    }

    /// Human readable message for display.
    pub fn message(&self) -> String {
        match self {
            ApiError::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<Value>,
    errors: Option<Value>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        if let Some(message) = self.message.filter(|m| !m.is_empty()) {
            return Some(message);
        }

        if let Some(error) = self.error.as_ref().and_then(first_string) {
            return Some(error);
        }

        self.errors.as_ref().and_then(first_string)
    }
}

/// First string found in a value, descending into arrays and objects.
fn first_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_string),
        Value::Object(map) => map.values().find_map(first_string),
        _ => None,
    }
}
