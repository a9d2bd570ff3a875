//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Most backend failures are
//! rendered inline next to the widget that failed; `AppError` covers the
//! ones that abort the whole page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::ApiError;

/// Application-level error type for the dashboard.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend call failed.
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Api(err) => match err {
                ApiError::Http { status, .. } => match status.as_u16() {
                    401 => StatusCode::UNAUTHORIZED,
                    403 => StatusCode::FORBIDDEN,
                    404 => StatusCode::NOT_FOUND,
                    400..=499 => StatusCode::BAD_REQUEST,
                    _ => StatusCode::BAD_GATEWAY,
                },
                ApiError::Network(_) | ApiError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                ApiError::Decode(_) => StatusCode::BAD_GATEWAY,
                ApiError::InvalidBaseUrl(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Dashboard request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Session(_) => "Internal server error".to_string(),
            Self::Api(err) if status.is_server_error() => err.user_message(),
            Self::Api(err) => err.to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the signed-in principal.
pub fn set_sentry_user(id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("tenant t-9".to_string());
        assert_eq!(err.to_string(), "Not found: tenant t-9");
    }

    #[test]
    fn test_backend_statuses_are_mapped() {
        let http = |code: u16| {
            AppError::Api(ApiError::from_response(
                StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                b"",
            ))
        };
        assert_eq!(get_status(http(401)), StatusCode::UNAUTHORIZED);
        assert_eq!(get_status(http(404)), StatusCode::NOT_FOUND);
        assert_eq!(get_status(http(422)), StatusCode::BAD_REQUEST);
        assert_eq!(get_status(http(500)), StatusCode::BAD_GATEWAY);
        assert_eq!(
            get_status(AppError::Api(ApiError::Network("refused".to_string()))),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_local_statuses() {
        assert_eq!(
            get_status(AppError::NotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
    }
}
