//! API error taxonomy and server error-envelope normalization.
//!
//! Non-2xx responses become [`ApiError::Http`] regardless of body shape, so
//! callers match on one variant instead of inspecting raw responses.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use serde_json::Value;

/// Errors produced by API client operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Http { status: u16, message: String, details: Option<Value> },

    /// The request never completed (refused, reset, timed out).
    #[error("network error: {0}")]
    Network(String),

    /// A request body could not be serialized.
    #[error("request body encode failed: {0}")]
    Encode(String),

    /// A success body could not be decoded as the expected type.
    #[error("response parse failed: {0}")]
    Decode(String),

    /// A caller-supplied or derived header value was not valid.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Http { status: 401, .. } => "E_UNAUTHORIZED",
            Self::Http { status: 403, .. } => "E_FORBIDDEN",
            Self::Http { .. } => "E_HTTP",
            Self::Network(_) => "E_NETWORK",
            Self::Encode(_) => "E_ENCODE",
            Self::Decode(_) => "E_DECODE",
            Self::InvalidHeader(_) => "E_INVALID_HEADER",
            Self::ClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Http { status: 429 | 500..=599, .. })
    }
}

/// Build the [`ApiError::Http`] for a non-success response.
///
/// JSON bodies contribute `error.message` and `error.details`; a JSON body
/// without a string message, or one that fails to parse, falls back to the
/// status text. Non-JSON bodies become the message verbatim unless empty.
#[must_use]
pub fn http_error(status: u16, status_text: &str, content_type: &str, body: &str) -> ApiError {
    if content_type.contains("application/json") {
        let Ok(json) = serde_json::from_str::<Value>(body) else {
            return ApiError::Http { status, message: status_text.to_owned(), details: None };
        };
        let envelope = json.get("error");
        let message = envelope
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
            .unwrap_or(status_text)
            .to_owned();
        let details = envelope
            .and_then(|e| e.get("details"))
            .filter(|d| !d.is_null())
            .cloned();
        return ApiError::Http { status, message, details };
    }

    let message = if body.is_empty() { status_text } else { body };
    ApiError::Http { status, message: message.to_owned(), details: None }
}
