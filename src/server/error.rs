//! Error-to-HTTP response conversion.
//!
//! Wraps [`yuzu_common::Error`] so route handlers can return
//! `Result<T, AppError>` and use `?` on engine and registry calls.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use yuzu_common::Error;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: Error,
}

impl AppError {
    pub fn new(inner: Error) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Error {
        &self.inner
    }

    fn code(&self) -> &'static str {
        match &self.inner {
            Error::NotFound { .. } => "not_found",
            Error::Definition { .. } => "invalid_definition",
            Error::Validation(_) => "validation_error",
            Error::Url { .. } => "invalid_url",
            Error::Header { .. } => "invalid_header",
            Error::Transport { .. } => "upstream_unreachable",
            Error::Status { .. } => "upstream_status",
            Error::Decode { .. } => "upstream_decode",
            Error::Extraction { .. } => "extraction_failed",
            Error::UnsupportedValue { .. } => "unsupported_value",
            Error::UnsupportedOutput(_) => "unsupported_output",
            Error::ElementName(_) => "invalid_output_field",
            Error::UnresolvedPlaceholder { .. } => "unresolved_placeholder",
            Error::Io { .. } => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }
}

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
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
        } else if self.inner.is_execution() {
            tracing::warn!(status = %status, error = %self.inner, "Provider execution failed");
        }

        let body = json!({
            "error": self.inner.to_string(),
            "code": self.code(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_produces_404() {
        let err = AppError::new(Error::not_found("provider", "kitsu"));
        assert_eq!(err.code(), "not_found");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn upstream_status_produces_502() {
        let err = AppError::new(Error::Status {
            url: "http://upstream.test/manga".into(),
            status: 404,
            body: "{}".into(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn unsupported_output_produces_500() {
        let response = AppError::new(Error::UnsupportedOutput("csv".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
