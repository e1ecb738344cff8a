use crate::engine::EngineError;
use crate::fit::FitError;
use crate::pipeline::Stage;
use pixmill_core::{AppError, ValidationError, ValidationReason};

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("{stage} failed: {source}")]
    Engine {
        stage: &'static str,
        #[source]
        source: EngineError,
    },

    #[error(transparent)]
    Fit(#[from] FitError),
}

impl ProcessingError {
    pub fn engine(stage: &'static str, source: EngineError) -> Self {
        Self::Engine { stage, source }
    }
}

impl From<ProcessingError> for AppError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::Engine { stage, source } => AppError::Operation {
                stage,
                message: source.to_string(),
            },
            ProcessingError::Fit(FitError::DegenerateDimensions { width, height }) => {
                AppError::DegenerateDimensions { width, height }
            }
            ProcessingError::Fit(FitError::InvalidFitPolicy(value)) => AppError::Validation(
                ValidationError::new("fit", ValidationReason::InvalidFitPolicy(value)),
            ),
            ProcessingError::Fit(err @ FitError::TooLarge { .. }) => AppError::Operation {
                stage: Stage::Resize.name(),
                message: err.to_string(),
            },
        }
    }
}
