use crate::engine::ImageEngine;
use crate::error::ProcessingError;
use bytes::Bytes;
use pixmill_core::OutputFormat;

pub const DEFAULT_JPEG_QUALITY: u8 = 100;

/// Encoded output plus the final pixel size
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Bytes,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

/// Requested format, else the source subtype when we can write it, else JPEG.
pub fn resolve_output_format(
    requested: Option<OutputFormat>,
    source_content_type: Option<&str>,
) -> OutputFormat {
    requested
        .or_else(|| source_content_type.and_then(OutputFormat::from_content_type))
        .unwrap_or(OutputFormat::Jpeg)
}

pub fn encode<E: ImageEngine>(
    engine: &E,
    image: &E::Handle,
    format: OutputFormat,
    jpeg_quality: Option<u8>,
) -> Result<EncodedImage, ProcessingError> {
    let quality = match format {
        OutputFormat::Jpeg => jpeg_quality.unwrap_or(DEFAULT_JPEG_QUALITY),
        OutputFormat::WebP | OutputFormat::Png => 100,
    };
    let size = engine.dimensions(image);
    let data = engine
        .encode(image, format, quality)
        .map_err(|e| ProcessingError::engine("encode", e))?;

    tracing::debug!(
        format = %format,
        width = size.width,
        height = size.height,
        bytes = data.len(),
        "Encoded image"
    );

    Ok(EncodedImage {
        data: Bytes::from(data),
        format,
        width: size.width,
        height: size.height,
    })
}
