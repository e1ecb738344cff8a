//! Core types shared by the pixmill crates: configuration, the error taxonomy,
//! color parsing and the validated transform request model.

pub mod color;
pub mod config;
pub mod error;
pub mod transform_spec;
pub mod transform_url;

pub use color::{parse_color, ColorError, Rgba};
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use transform_spec::{
    BlurKind, CropRect, FitPolicy, OutputFormat, Padding, TransformSpec, ValidationError,
    ValidationReason,
};
pub use transform_url::TransformUrlBuilder;
