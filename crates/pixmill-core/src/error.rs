//! Error types module
//!
//! All failures on the transform path are unified under [`AppError`]. Every
//! variant describes its own HTTP presentation through [`ErrorMetadata`]; the
//! API crate only renders what the error reports about itself.
//!
//! The transform endpoint answers every failure with `400`, including internal
//! faults, so callers never receive a partial image or a fallback.

use crate::transform_spec::{ValidationError, ValidationReason};

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for upstream or input-content problems
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "INVALID_COLOR")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same request may succeed
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to fetch image: {0}")]
    Fetch(String),

    #[error("Content is not an image: {0}")]
    NotAnImage(String),

    #[error("Invalid fit dimensions: {width}x{height}")]
    DegenerateDimensions { width: f64, height: f64 },

    #[error("{stage} failed: {message}")]
    Operation { stage: &'static str, message: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Validation(e) => (
            400,
            validation_error_code(&e.reason),
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::Fetch(_) => (
            400,
            "FETCH_ERROR",
            true,
            Some("Verify the source URL is reachable and returns 2xx"),
            false,
            LogLevel::Warn,
        ),
        AppError::NotAnImage(_) => (
            400,
            "NOT_AN_IMAGE",
            false,
            Some("Point url at a png, jpeg or webp image"),
            false,
            LogLevel::Debug,
        ),
        AppError::DegenerateDimensions { .. } => (
            400,
            "DEGENERATE_DIMENSIONS",
            false,
            Some("Choose a width and height that keep the image at least 1px"),
            false,
            LogLevel::Debug,
        ),
        AppError::Operation { .. } => (
            400,
            "OPERATION_ERROR",
            false,
            Some("Check transform parameters against the image dimensions"),
            false,
            LogLevel::Warn,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            400,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

fn validation_error_code(reason: &ValidationReason) -> &'static str {
    match reason {
        ValidationReason::InvalidColor(_) => "INVALID_COLOR",
        ValidationReason::InvalidCrop(_) => "INVALID_CROP",
        ValidationReason::InvalidFitPolicy(_) => "INVALID_FIT_POLICY",
        _ => "VALIDATION_ERROR",
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            AppError::Fetch(_) => "Failed to fetch image".to_string(),
            AppError::NotAnImage(_) => "Content is not an image".to_string(),
            AppError::DegenerateDimensions { .. } => "Invalid dimensions".to_string(),
            AppError::Operation { stage, message } => format!("{} failed: {}", stage, message),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "An internal error occurred".to_string()
            }
        }
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }
}

impl AppError {
    /// Name of the query parameter that caused the failure, when there is one
    pub fn field(&self) -> Option<&'static str> {
        match self {
            AppError::Validation(e) => Some(e.field),
            _ => None,
        }
    }

    /// Pipeline stage that failed, when the failure came from an image operation
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            AppError::Operation { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// Get error type as string for logging
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "Validation",
            AppError::Fetch(_) => "Fetch",
            AppError::NotAnImage(_) => "NotAnImage",
            AppError::DegenerateDimensions { .. } => "DegenerateDimensions",
            AppError::Operation { .. } => "Operation",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "InternalWithSource",
        }
    }

    /// Get detailed error message including source chain
    pub fn detailed_message(&self) -> String {
        let mut msg = self.to_string();
        let mut current_error: &dyn std::error::Error = self;

        while let Some(source) = current_error.source() {
            msg.push_str(&format!("\n  Caused by: {}", source));
            current_error = source;
        }

        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorError;

    #[test]
    fn test_every_variant_is_bad_request() {
        let errors = vec![
            AppError::Fetch("timeout".into()),
            AppError::NotAnImage("text/html".into()),
            AppError::DegenerateDimensions {
                width: 0.0,
                height: 10.0,
            },
            AppError::Operation {
                stage: "crop",
                message: "out of bounds".into(),
            },
            AppError::Internal("boom".into()),
            AppError::from(anyhow::anyhow!("wrapped")),
        ];
        for err in errors {
            assert_eq!(err.http_status_code(), 400, "{}", err.error_type());
        }
    }

    #[test]
    fn test_validation_codes_follow_reason() {
        let color = AppError::from(ValidationError::new(
            "tint",
            ValidationReason::InvalidColor(ColorError::Unrecognized("notacolor".into())),
        ));
        assert_eq!(color.error_code(), "INVALID_COLOR");
        assert_eq!(color.field(), Some("tint"));
        assert_eq!(color.log_level(), LogLevel::Debug);

        let crop = AppError::from(ValidationError::new(
            "crop",
            ValidationReason::InvalidCrop("expected 4 values, got 3".into()),
        ));
        assert_eq!(crop.error_code(), "INVALID_CROP");
    }

    #[test]
    fn test_internal_errors_are_sensitive() {
        let err = AppError::Internal("secret path".into());
        assert!(err.is_sensitive());
        assert!(!err.client_message().contains("secret"));
    }

    #[test]
    fn test_detailed_message_walks_sources() {
        let source = anyhow::anyhow!("root cause").context("outer");
        let err = AppError::from(source);
        let detailed = err.detailed_message();
        assert!(detailed.contains("Caused by"));
    }
}
