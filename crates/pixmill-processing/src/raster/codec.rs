use crate::engine::EngineError;
use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};
use pixmill_core::OutputFormat;
use std::io::Cursor;

pub fn decode(data: &[u8]) -> Result<RgbaImage, EngineError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| EngineError::Decode(e.to_string()))?;
    let img = reader
        .decode()
        .map_err(|e| EngineError::Decode(e.to_string()))?;
    Ok(img.to_rgba8())
}

pub fn encode(img: &RgbaImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>, EngineError> {
    let encode_err = |message: String| EngineError::Encode { format, message };
    match format {
        OutputFormat::Jpeg => encode_jpeg(img, quality).map_err(|e| encode_err(e.to_string())),
        OutputFormat::Png => encode_png(img).map_err(encode_err),
        OutputFormat::WebP => Ok(encode_webp(img)),
    }
}

/// JPEG via mozjpeg; alpha is dropped
fn encode_jpeg(img: &RgbaImage, quality: u8) -> std::io::Result<Vec<u8>> {
    let rgb_img = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
    let (width, height) = rgb_img.dimensions();

    let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
    comp.set_size(width as usize, height as usize);
    comp.set_quality(quality.clamp(1, 100) as f32);
    comp.set_progressive_mode();
    comp.set_optimize_coding(true);

    let mut comp = comp.start_compress(Vec::new())?;
    comp.write_scanlines(&rgb_img)?;
    comp.finish()
}

fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, String> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| e.to_string())?;
    Ok(buffer)
}

/// Lossless WebP
fn encode_webp(img: &RgbaImage) -> Vec<u8> {
    let (width, height) = img.dimensions();
    let encoder = webp::Encoder::from_rgba(img, width, height);
    encoder.encode_lossless().to_vec()
}
