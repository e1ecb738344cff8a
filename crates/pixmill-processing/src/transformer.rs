//! Decode, run the pipeline, encode.

use crate::encoder::{self, resolve_output_format, EncodedImage};
use crate::engine::ImageEngine;
use crate::error::ProcessingError;
use crate::pipeline::TransformPipeline;
use crate::raster::RasterEngine;
use pixmill_core::TransformSpec;

#[derive(Debug, Clone, Default)]
pub struct ImageTransformer<E = RasterEngine> {
    engine: E,
}

impl ImageTransformer<RasterEngine> {
    pub fn new() -> Self {
        Self::with_engine(RasterEngine::new())
    }
}

impl<E: ImageEngine> ImageTransformer<E> {
    pub fn with_engine(engine: E) -> Self {
        Self { engine }
    }

    /// Apply `spec` to the encoded source image.
    ///
    /// `source_content_type` picks the output format when `spec` names none.
    /// This is CPU bound; call it from a blocking task.
    pub fn transform(
        &self,
        data: &[u8],
        spec: &TransformSpec,
        source_content_type: Option<&str>,
    ) -> Result<EncodedImage, ProcessingError> {
        let image = self
            .engine
            .decode(data)
            .map_err(|e| ProcessingError::engine("decode", e))?;

        let source = self.engine.dimensions(&image);
        tracing::debug!(
            width = source.width,
            height = source.height,
            "Decoded source image"
        );

        let image = TransformPipeline::new(&self.engine).execute(image, spec)?;

        let format = resolve_output_format(spec.output_format, source_content_type);
        encoder::encode(&self.engine, &image, format, spec.jpeg_quality)
    }
}
