use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::boards::SubmissionError;
use crate::crypto::CipherError;
use crate::documents::ConversionError;
use crate::llm_client::ProviderError;
use crate::workflow::TransitionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid status transition: {0}")]
    Transition(#[from] TransitionError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("AI provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Document conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Credential error: {0}")]
    Cipher(#[from] CipherError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code, also used when recording failures on rows.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Transition(_) => "INVALID_TRANSITION",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Provider(_) => "PROVIDER_ERROR",
            AppError::Conversion(_) => "CONVERSION_ERROR",
            AppError::Submission(_) => "SUBMISSION_ERROR",
            AppError::Cipher(_) => "CREDENTIAL_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Internal(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Transition(e) => (StatusCode::CONFLICT, e.to_string()),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            // Provider, conversion and submission failures are retryable by the user,
            // so the cause is passed through verbatim.
            AppError::Provider(e) => {
                tracing::warn!("AI provider error: {e}");
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            AppError::Conversion(e) => {
                tracing::warn!("Document conversion error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            AppError::Submission(e @ SubmissionError::NotABoardJob) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            AppError::Submission(e) => {
                tracing::warn!("Submission error: {e}");
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            AppError::Cipher(e) => {
                tracing::error!("Credential error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Stored credential could not be read; save it again".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{JobEvent, JobStatus};

    #[test]
    fn test_transition_error_maps_to_conflict() {
        let err: AppError = JobStatus::New
            .apply(JobEvent::MarkedApplied {
                documents_ready: true,
            })
            .unwrap_err()
            .into();
        assert_eq!(err.code(), "INVALID_TRANSITION");
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_provider_error_is_bad_gateway() {
        let err = AppError::Provider(ProviderError::Quota("slow down".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_not_found_status() {
        let err = AppError::NotFound("Job 9 not found".to_string());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
