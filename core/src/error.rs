//! Error types for the auto-api client.
//!
//! # Design
//! The remote API distinguishes authentication failures (401/403) from every
//! other failure, and callers that handle "any API error" must also see auth
//! failures. Both live in one enum: `Auth` and `Api` carry the same payload,
//! the shared accessors answer for both, and `is_auth` singles out the
//! specialised kind. Failures that never produced a status code get their
//! own variants.

use serde_json::Value;

/// Errors returned by `AutoApiClient` and `BlockingClient`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server rejected the credentials (401 or 403).
    #[error("API error {status}: {message}")]
    Auth {
        status: u16,
        message: String,
        body: String,
    },

    /// Any other non-2xx status, or a 2xx body that is not usable JSON.
    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        message: String,
        body: String,
    },

    /// The request never completed (connect failure, timeout, broken body).
    #[error("request failed: {0}")]
    Transport(#[from] ureq::Error),

    /// The configured base URL cannot carry the endpoint path.
    #[error("invalid base url: {0}")]
    InvalidUrl(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Missing or malformed client configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Map a non-2xx status and its raw body to `Auth` or `Api`.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = error_message(status, &body);
        if status == 401 || status == 403 {
            ApiError::Auth {
                status,
                message,
                body,
            }
        } else {
            ApiError::Api {
                status,
                message,
                body,
            }
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth { .. })
    }

    /// HTTP status for errors reported by the server.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Auth { status, .. } | ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ApiError::Auth { message, .. } | ApiError::Api { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Raw response body for errors reported by the server.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            ApiError::Auth { body, .. } | ApiError::Api { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Pull `message` out of a JSON error body, falling back to a generic text.
fn error_message(status: u16, body: &str) -> String {
    let fallback = || format!("API error {status}");
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("message") {
            Some(Value::String(message)) => message.clone(),
            None | Some(Value::Null) | Some(Value::Bool(false)) => fallback(),
            Some(other) => other.to_string(),
        },
        _ => fallback(),
    }
}
