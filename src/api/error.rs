//! Error type shared by every API wrapper, plus extraction of the server's
//! human-readable `detail` from error bodies.

use serde_json::Value;

/// Maximum number of error body characters surfaced to the UI.
const MAX_DETAIL_CHARS: usize = 200;

/// Errors produced while talking to the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },

    /// The server answered 2xx but reported `success: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Response error: {0}")]
    Parse(String),

    #[error("Request error: {0}")]
    Serialization(String),
}

impl ApiError {
    /// A 2xx answer that reported `success: false`.
    pub fn rejected(message: Option<String>) -> Self {
        ApiError::Rejected(message.map(|m| m.trim().to_string()).unwrap_or_default())
    }

    /// Server-provided message, when the server sent one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Http { message, .. } | ApiError::Rejected(message) if !message.is_empty() => Some(message),
            _ => None,
        }
    }

    /// Message to show the user: the server detail, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail().unwrap_or(fallback).to_string()
    }

    /// HTTP status for responses that made it to the server.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for 4xx responses, i.e. the server understood and refused the request.
    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(status) if (400..500).contains(&status))
    }
}

/// Pulls a displayable message out of an error body.
///
/// Accepts `{"detail": "..."}`, FastAPI validation arrays
/// (`{"detail": [{"msg": "..."}]}`), `{"detail": {"message": "..."}}` and a
/// top-level `{"message": "..."}`. Anything else yields `None` so callers fall
/// back to a generic message.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body.trim()).ok()?;

    let message = match value.get("detail") {
        Some(Value::String(detail)) => Some(detail.clone()),
        Some(Value::Array(items)) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(text) => Some(text.clone()),
                    other => other.get("msg").and_then(Value::as_str).map(str::to_string),
                })
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        Some(Value::Object(object)) => object.get("message").and_then(Value::as_str).map(str::to_string),
        _ => value.get("message").and_then(Value::as_str).map(str::to_string),
    }?;

    sanitize(&message)
}

fn sanitize(message: &str) -> Option<String> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(MAX_DETAIL_CHARS).collect())
    }
}
