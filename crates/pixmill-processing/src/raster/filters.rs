//! Filters and color adjustments on RGBA buffers
//!
//! The 3x3 kernels and the color adjustments leave alpha untouched; gaussian
//! blur and the median filter smooth it along with the color channels. Color
//! adjustments run through Photon so they match its HSL and shading math.

use image::{imageops, RgbaImage};
use imageproc::filter::filter3x3;
use photon_rs::{colour_spaces, effects, monochrome, PhotonImage};

pub fn gaussian_blur(img: &mut RgbaImage, radius: f32) {
    if radius <= 0.0 {
        return;
    }
    *img = imageops::blur(img, radius);
}

pub fn box_blur(img: &mut RgbaImage) {
    const KERNEL: [f32; 9] = [1.0 / 9.0; 9];
    filter_color_channels(img, &KERNEL);
}

pub fn sharpen(img: &mut RgbaImage) {
    const KERNEL: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];
    filter_color_channels(img, &KERNEL);
}

// 3x3 kernels clamp at the edges
fn filter_color_channels(img: &mut RgbaImage, kernel: &[f32; 9]) {
    let filtered = filter3x3::<_, f32, u8>(img, kernel);
    for (pixel, result) in img.pixels_mut().zip(filtered.pixels()) {
        pixel.0[..3].copy_from_slice(&result.0[..3]);
    }
}

/// 3x3 median
pub fn noise_reduction(img: &mut RgbaImage) {
    *img = imageproc::filter::median_filter(img, 1, 1);
}

pub fn inc_brightness(img: &mut RgbaImage, amount: u8) {
    with_photon(img, |photon| effects::inc_brightness(photon, amount));
}

pub fn tint(img: &mut RgbaImage, r: u8, g: u8, b: u8) {
    with_photon(img, |photon| effects::tint(photon, r as u32, g as u32, b as u32));
}

/// Quantize to `shades` gray levels (at least 2).
pub fn grayscale_shades(img: &mut RgbaImage, shades: u8) {
    with_photon(img, |photon| monochrome::grayscale_shades(photon, shades.max(2)));
}

/// Lower HSL lightness by `level` relative to its current value.
pub fn darken_hsl(img: &mut RgbaImage, level: f32) {
    with_photon(img, |photon| colour_spaces::darken_hsl(photon, level));
}

pub fn saturate_hsl(img: &mut RgbaImage, level: f32) {
    with_photon(img, |photon| colour_spaces::saturate_hsl(photon, level));
}

pub fn desaturate_hsl(img: &mut RgbaImage, level: f32) {
    with_photon(img, |photon| colour_spaces::desaturate_hsl(photon, level));
}

pub fn hue_rotate_hsl(img: &mut RgbaImage, turns: f32) {
    with_photon(img, |photon| colour_spaces::hue_rotate_hsl(photon, turns));
}

/// Run a Photon operation over a copy of the pixels and write the result back.
fn with_photon(img: &mut RgbaImage, op: impl FnOnce(&mut PhotonImage)) {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    let mut photon = PhotonImage::new(img.as_raw().clone(), width, height);
    op(&mut photon);

    let pixels = photon.get_raw_pixels();
    if pixels.len() == img.as_raw().len() {
        img.copy_from_slice(&pixels);
    }
}
