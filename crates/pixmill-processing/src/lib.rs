//! Image processing for pixmill
//!
//! Fit geometry, the ordered transform pipeline, and the raster engine that
//! does the pixel work.

pub mod encoder;
pub mod engine;
pub mod error;
pub mod fit;
pub mod pipeline;
pub mod raster;
pub mod transformer;

pub use encoder::{resolve_output_format, EncodedImage, DEFAULT_JPEG_QUALITY};
pub use engine::{Dimensions, EngineError, ImageEngine, Side};
pub use error::ProcessingError;
pub use fit::{compute_fit, compute_fit_named, plan_resize, FitError, FitSize, ResizePlan};
pub use pipeline::{Stage, TransformPipeline, PIPELINE_STAGES};
pub use raster::RasterEngine;
pub use transformer::ImageTransformer;
