//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`aula_core::Error`] so that route handlers
//! can return `Result<T, AppError>` directly. The JSON body carries a
//! machine-readable `code` so clients can distinguish an actionable
//! enrollment denial (`not_enrolled`, `enrollment_pending`) from a generic
//! failure, and an expired signed reference (`session_expired`) from an
//! invalid one.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
pub struct AppError {
    inner: aula_core::Error,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: aula_core::Error) -> Self {
        Self {
            inner,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: String) -> Self {
        self.request_id = Some(id);
        self
    }
}

impl From<aula_core::Error> for AppError {
    fn from(e: aula_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in API handler"
            );
        }

        let body = json!({
            "error": self.inner.to_string(),
            "code": self.inner.code(),
            "request_id": self.request_id,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_core::{DenyReason, Error};

    #[test]
    fn not_found_produces_404() {
        let err = AppError::new(Error::not_found("lecture", "abc"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unauthorized_produces_401() {
        let err = AppError::new(Error::Unauthorized("bad token".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn enrollment_denial_produces_403() {
        let err = AppError::new(Error::denied(DenyReason::EnrollmentPending));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn session_expired_produces_401() {
        let err = AppError::new(Error::SessionExpired);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn with_request_id() {
        let err = AppError::new(Error::Internal("oops".into())).with_request_id("req-123".into());
        assert_eq!(err.request_id.as_deref(), Some("req-123"));
    }
}
