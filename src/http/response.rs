//! Error responses.
//!
//! Every failure is rendered as `{"error": message}` with a status derived
//! from the error kind.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::orders::OrderError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Status code for each order error kind.
pub fn status_for(err: &OrderError) -> StatusCode {
    match err {
        OrderError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        OrderError::NotFound(_) => StatusCode::NOT_FOUND,
        OrderError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
        OrderError::OperationFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
        OrderError::Store(_) | OrderError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        }
        error_response(status, self.to_string())
    }
}

/// Malformed JSON bodies (including negative or non-numeric quantities).
pub fn rejection_response(rejection: JsonRejection) -> Response {
    tracing::debug!(error = %rejection.body_text(), "Rejected request body");
    error_response(StatusCode::BAD_REQUEST, rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&OrderError::InvalidArgument("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&OrderError::NotFound("a".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&OrderError::DeadlineExceeded(Duration::from_secs(1))),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&OrderError::OperationFailed("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&OrderError::Store("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
