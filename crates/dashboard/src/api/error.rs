//! Errors returned by the backend API client.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Fallback text when a failed response carries nothing readable.
const GENERIC_FAILURE: &str = "An error occurred while fetching the data.";

/// Errors that can occur when talking to the analytics backend.
///
/// Every non-2xx response becomes [`ApiError::Http`], carrying the readable
/// message, the parsed JSON body (if any), and the status.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The backend answered with a non-success status.
    #[error("{message}")]
    Http {
        /// HTTP status of the response.
        status: StatusCode,
        /// Human-readable message extracted from the body or status.
        message: String,
        /// Parsed error body, when it was JSON.
        body: Option<Value>,
    },

    /// No response was received (connect failure, timeout, reset).
    #[error("Network error: {0}")]
    Network(String),

    /// A success response could not be decoded.
    #[error("Unexpected response from backend: {0}")]
    Decode(String),

    /// The call was cancelled because the dashboard is shutting down.
    #[error("Request cancelled")]
    Cancelled,

    /// The configured backend URL cannot be used as a base URL.
    #[error("Invalid backend URL: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    /// Build an [`ApiError::Http`] from a failed response's status and body.
    ///
    /// The message is the body's `message` field, then its `error` field,
    /// then the status reason phrase, then a generic fallback.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        let body: Option<Value> = serde_json::from_slice(body).ok();

        let message = body
            .as_ref()
            .and_then(|b| text_field(b, "message").or_else(|| text_field(b, "error")))
            .or_else(|| status.canonical_reason().map(str::to_owned))
            .unwrap_or_else(|| GENERIC_FAILURE.to_owned());

        Self::Http {
            status,
            message,
            body,
        }
    }

    /// HTTP status, for errors that came with a response.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend rejected the credentials.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        )
    }

    /// Message suitable for showing next to the widget that failed.
    ///
    /// Backend messages are shown as-is; transport failures collapse into a
    /// generic retry hint.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { message, .. } => message.clone(),
            Self::Network(_) | Self::Cancelled => {
                "Could not reach the analytics service. Please try again.".to_owned()
            }
            Self::Decode(_) | Self::InvalidBaseUrl(_) => GENERIC_FAILURE.to_owned(),
        }
    }

    pub(crate) fn network(err: &reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

fn text_field(body: &Value, name: &str) -> Option<String> {
    body.get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_field_wins() {
        let err = ApiError::from_response(
            StatusCode::BAD_REQUEST,
            br#"{"message":"shop_domain is required","error":"validation"}"#,
        );
        assert_eq!(err.to_string(), "shop_domain is required");
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_error_field_used_without_message() {
        let err = ApiError::from_response(StatusCode::CONFLICT, br#"{"error":"tenant exists"}"#);
        assert_eq!(err.user_message(), "tenant exists");
        match err {
            ApiError::Http { body, .. } => assert!(body.is_some()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_json_body_falls_back_to_status_text() {
        let err = ApiError::from_response(StatusCode::BAD_GATEWAY, b"<html>upstream</html>");
        assert_eq!(err.to_string(), "Bad Gateway");
        match err {
            ApiError::Http { body, .. } => assert!(body.is_none()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_blank_message_is_skipped() {
        let err = ApiError::from_response(
            StatusCode::UNAUTHORIZED,
            br#"{"message":"  ","error":"invalid credentials"}"#,
        );
        assert_eq!(err.to_string(), "invalid credentials");
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_unknown_status_uses_generic_text() {
        let status = StatusCode::from_u16(599).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let err = ApiError::from_response(status, b"");
        assert_eq!(err.to_string(), GENERIC_FAILURE);
    }

    #[test]
    fn test_network_errors_are_generic_for_users() {
        let err = ApiError::Network("connection refused".to_owned());
        assert_eq!(
            err.user_message(),
            "Could not reach the analytics service. Please try again."
        );
        assert_eq!(err.status(), None);
    }
}
