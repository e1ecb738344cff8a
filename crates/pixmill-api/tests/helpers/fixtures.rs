//! Test fixtures: generated source images.

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Solid-color PNG of the given size.
pub fn solid_png(width: u32, height: u32) -> Vec<u8> {
    encode(
        &RgbaImage::from_pixel(width, height, Rgba([200, 60, 20, 255])),
        ImageFormat::Png,
    )
}

/// PNG with a horizontal gradient, so flips and crops change the output.
pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, _| {
        let v = (x * 255 / width.max(1)) as u8;
        Rgba([v, 255 - v, 128, 255])
    });
    encode(&img, ImageFormat::Png)
}

fn encode(img: &RgbaImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), format)
        .expect("encode fixture");
    buffer
}

/// Decoded size of an encoded image.
pub fn dimensions_of(data: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(data).expect("decode response body");
    (img.width(), img.height())
}
