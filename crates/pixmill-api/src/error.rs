//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`; anything that
//! converts into [`AppError`] renders as the same JSON body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pixmill_core::{AppError, ErrorMetadata, LogLevel};
use pixmill_processing::ProcessingError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Query parameter that failed validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Pipeline stage that failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Whether retrying the same request may succeed
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl ErrorResponse {
    fn from_app_error(error: &AppError, with_details: bool) -> Self {
        Self {
            error: error.client_message(),
            code: error.error_code().to_string(),
            field: error.field().map(String::from),
            stage: error.stage().map(String::from),
            details: with_details.then(|| error.detailed_message()),
            error_type: with_details.then(|| error.error_type().to_string()),
            recoverable: error.is_recoverable(),
            suggested_action: error.suggested_action().map(String::from),
        }
    }
}

/// Local wrapper so `IntoResponse` can be implemented for the core error type
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<ProcessingError> for HttpAppError {
    fn from(err: ProcessingError) -> Self {
        HttpAppError(err.into())
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Request failed");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| matches!(env.to_lowercase().as_str(), "production" | "prod"))
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;
        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::BAD_REQUEST);

        log_error(app_error);

        let with_details = !is_production_env() && !app_error.is_sensitive();
        let body = ErrorResponse::from_app_error(app_error, with_details);

        (status, Json(body)).into_response()
    }
}
