//! Error types for uwrite-review
//!
//! `ReviewError` is what the review service returns to callers;
//! `ApiError` turns it (and everything else a handler can hit) into an
//! HTTP response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Review service errors
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Submission could not be queued
    #[error("Queue error: {0}")]
    Queue(String),

    /// Report requested for a check that failed; carries the stored message
    #[error("{0}")]
    Report(String),

    /// No record exists for the content id
    #[error("Review item with id {0} doesn't exist")]
    NotFound(String),

    /// Remote-side failure that could succeed on resubmission
    #[error("Transient submission error: {0}")]
    TransientSubmission(String),

    /// Result store failure
    #[error("Store error: {0}")]
    Store(#[from] uwrite_common::Error),
}

/// Result type for review service operations
pub type ReviewResult<T> = Result<T, ReviewError>;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Review service error (status depends on kind)
    #[error(transparent)]
    Review(#[from] ReviewError),

    /// uwrite-common error
    #[error("Common error: {0}")]
    Common(#[from] uwrite_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Review(ReviewError::NotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Review(ReviewError::Report(_)) => (StatusCode::CONFLICT, "REPORT_ERROR"),
            ApiError::Review(ReviewError::Queue(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "QUEUE_ERROR")
            }
            ApiError::Review(ReviewError::TransientSubmission(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "TRANSIENT_SUBMISSION_ERROR")
            }
            ApiError::Review(ReviewError::Store(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR")
            }
            ApiError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR"),
        };

        // Report errors surface the stored remote message as-is
        let message = match self {
            ApiError::BadRequest(msg) => msg,
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_error_message_is_stored_text() {
        let err = ReviewError::Report("File is encrypted".to_string());
        assert_eq!(err.to_string(), "File is encrypted");
    }

    #[test]
    fn test_status_mapping() {
        let not_found = ApiError::from(ReviewError::NotFound("c1".into())).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let report = ApiError::from(ReviewError::Report("boom".into())).into_response();
        assert_eq!(report.status(), StatusCode::CONFLICT);

        let queue = ApiError::from(ReviewError::Queue("shutting down".into())).into_response();
        assert_eq!(queue.status(), StatusCode::SERVICE_UNAVAILABLE);

        let bad = ApiError::BadRequest("empty path".into()).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let store = ApiError::from(ReviewError::Store(uwrite_common::Error::Config("x".into())))
            .into_response();
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
