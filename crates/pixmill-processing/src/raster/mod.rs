//! [`ImageEngine`] backed by `image`, `imageproc` and Photon, working on RGBA8 buffers.

pub mod codec;
pub mod filters;
pub mod geometry;

use crate::engine::{Dimensions, EngineError, ImageEngine, Side};
use image::{imageops, RgbaImage};
use pixmill_core::{OutputFormat, Rgba};

#[derive(Debug, Clone, Copy, Default)]
pub struct RasterEngine;

impl RasterEngine {
    pub fn new() -> Self {
        Self
    }
}

impl ImageEngine for RasterEngine {
    type Handle = RgbaImage;

    fn decode(&self, data: &[u8]) -> Result<RgbaImage, EngineError> {
        codec::decode(data)
    }

    fn dimensions(&self, image: &RgbaImage) -> Dimensions {
        Dimensions::new(image.width(), image.height())
    }

    fn resize(&self, image: RgbaImage, width: u32, height: u32) -> Result<RgbaImage, EngineError> {
        if image.dimensions() == (width, height) {
            return Ok(image);
        }
        geometry::resize(&image, width, height)
    }

    fn flip_horizontal(&self, image: &mut RgbaImage) {
        imageops::flip_horizontal_in_place(image);
    }

    fn flip_vertical(&self, image: &mut RgbaImage) {
        imageops::flip_vertical_in_place(image);
    }

    fn pad_uniform(
        &self,
        image: RgbaImage,
        amount: u32,
        color: Rgba,
    ) -> Result<RgbaImage, EngineError> {
        geometry::pad(&image, amount, amount, amount, amount, color)
    }

    fn pad_side(
        &self,
        image: RgbaImage,
        side: Side,
        amount: u32,
        color: Rgba,
    ) -> Result<RgbaImage, EngineError> {
        geometry::pad_side(&image, side, amount, color)
    }

    fn rotate(&self, image: RgbaImage, degrees: f32) -> Result<RgbaImage, EngineError> {
        geometry::rotate(&image, degrees)
    }

    fn crop(
        &self,
        image: RgbaImage,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, EngineError> {
        geometry::crop(&image, x, y, width, height)
    }

    fn gaussian_blur(&self, image: &mut RgbaImage, radius: f32) {
        filters::gaussian_blur(image, radius);
    }

    fn box_blur(&self, image: &mut RgbaImage) {
        filters::box_blur(image);
    }

    fn sharpen(&self, image: &mut RgbaImage) {
        filters::sharpen(image);
    }

    fn noise_reduction(&self, image: &mut RgbaImage) {
        filters::noise_reduction(image);
    }

    fn inc_brightness(&self, image: &mut RgbaImage, amount: u8) {
        filters::inc_brightness(image, amount);
    }

    fn darken_hsl(&self, image: &mut RgbaImage, level: f32) {
        filters::darken_hsl(image, level);
    }

    fn hue_rotate_hsl(&self, image: &mut RgbaImage, turns: f32) {
        filters::hue_rotate_hsl(image, turns);
    }

    fn saturate_hsl(&self, image: &mut RgbaImage, level: f32) {
        filters::saturate_hsl(image, level);
    }

    fn desaturate_hsl(&self, image: &mut RgbaImage, level: f32) {
        filters::desaturate_hsl(image, level);
    }

    fn tint(&self, image: &mut RgbaImage, r: u8, g: u8, b: u8) {
        filters::tint(image, r, g, b);
    }

    fn grayscale_shades(&self, image: &mut RgbaImage, shades: u8) {
        filters::grayscale_shades(image, shades);
    }

    fn encode(
        &self,
        image: &RgbaImage,
        format: OutputFormat,
        quality: u8,
    ) -> Result<Vec<u8>, EngineError> {
        codec::encode(image, format, quality)
    }
}
