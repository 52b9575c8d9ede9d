use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pii::AnalyzerError;
use crate::report::ReportError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to initialize engine: {0}")]
    InitializationError(String),

    #[error("Failed to decode image: {0}")]
    DecodeFailure(String),

    #[error("Failed to fetch image: {0}")]
    FetchFailure(String),

    #[error("Text recognition failed: {0}")]
    RecognitionFailure(String),

    #[error("Entity recognition failed: {0}")]
    Analysis(#[from] AnalyzerError),

    #[error("Image processing timed out after {0}ms")]
    Timeout(u64),

    #[error("Report generation failed: {0}")]
    ReportGeneration(#[from] ReportError),

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Report not found: {0}")]
    ReportNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Per-image failure categories reported alongside successful records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    DecodeFailure,
    FetchFailure,
    RecognitionFailure,
    Timeout,
}

impl PipelineError {
    /// Classify an error raised while processing a single image.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            PipelineError::DecodeFailure(_) | PipelineError::ImageTooLarge { .. } => {
                FailureKind::DecodeFailure
            }
            PipelineError::FetchFailure(_) => FailureKind::FetchFailure,
            PipelineError::Timeout(_) => FailureKind::Timeout,
            _ => FailureKind::RecognitionFailure,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            PipelineError::InitializationError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INIT_ERROR")
            }
            PipelineError::DecodeFailure(_) => (StatusCode::UNPROCESSABLE_ENTITY, "DECODE_ERROR"),
            PipelineError::FetchFailure(_) => (StatusCode::BAD_GATEWAY, "FETCH_ERROR"),
            PipelineError::RecognitionFailure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "RECOGNITION_ERROR")
            }
            PipelineError::Analysis(AnalyzerError::UnsupportedLanguage(_)) => {
                (StatusCode::BAD_REQUEST, "UNSUPPORTED_LANGUAGE")
            }
            PipelineError::Analysis(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ANALYSIS_ERROR"),
            PipelineError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
            PipelineError::ReportGeneration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "REPORT_ERROR")
            }
            PipelineError::ImageTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "IMAGE_TOO_LARGE")
            }
            PipelineError::MissingFile => (StatusCode::BAD_REQUEST, "MISSING_FILE"),
            PipelineError::ReportNotFound(_) => (StatusCode::NOT_FOUND, "REPORT_NOT_FOUND"),
            PipelineError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            PipelineError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_classification() {
        assert_eq!(
            PipelineError::DecodeFailure("bad".into()).failure_kind(),
            FailureKind::DecodeFailure
        );
        assert_eq!(
            PipelineError::FetchFailure("404".into()).failure_kind(),
            FailureKind::FetchFailure
        );
        assert_eq!(PipelineError::Timeout(5).failure_kind(), FailureKind::Timeout);
        assert_eq!(
            PipelineError::RecognitionFailure("model".into()).failure_kind(),
            FailureKind::RecognitionFailure
        );
    }

    #[test]
    fn test_report_failure_maps_to_report_code() {
        let err = PipelineError::ReportGeneration(ReportError::InvalidFilename("../x".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
