//! Image engine seam
//!
//! The pipeline drives pixel work through [`ImageEngine`] and never touches
//! pixels itself. Geometry operations take the handle by value and return a
//! new one; in-place adjustments borrow it mutably.

use pixmill_core::{OutputFormat, Rgba};

/// Largest side an image may be resized, padded or rotated to
pub const MAX_DIMENSION: u32 = 16_383;
/// Largest pixel count an image may be resized, padded or rotated to
pub const MAX_PIXELS: u64 = 50_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether an image of this size stays within [`MAX_DIMENSION`] and [`MAX_PIXELS`].
    pub fn within_limits(&self) -> bool {
        self.width <= MAX_DIMENSION
            && self.height <= MAX_DIMENSION
            && self.pixel_count() <= MAX_PIXELS
    }
}

/// One side of an image, for single-sided padding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("could not decode image: {0}")]
    Decode(String),

    #[error("could not encode {format}: {message}")]
    Encode {
        format: OutputFormat,
        message: String,
    },

    #[error(
        "rectangle {x},{y} {width}x{height} is outside the {image_width}x{image_height} image"
    )]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// Pixel operations the transform pipeline relies on.
pub trait ImageEngine {
    type Handle;

    fn decode(&self, data: &[u8]) -> Result<Self::Handle, EngineError>;

    fn dimensions(&self, image: &Self::Handle) -> Dimensions;

    /// Resize to exactly `width` x `height`.
    fn resize(
        &self,
        image: Self::Handle,
        width: u32,
        height: u32,
    ) -> Result<Self::Handle, EngineError>;

    fn flip_horizontal(&self, image: &mut Self::Handle);

    fn flip_vertical(&self, image: &mut Self::Handle);

    fn pad_uniform(
        &self,
        image: Self::Handle,
        amount: u32,
        color: Rgba,
    ) -> Result<Self::Handle, EngineError>;

    fn pad_side(
        &self,
        image: Self::Handle,
        side: Side,
        amount: u32,
        color: Rgba,
    ) -> Result<Self::Handle, EngineError>;

    /// Rotate clockwise by `degrees`; the canvas grows to fit the rotated image.
    fn rotate(&self, image: Self::Handle, degrees: f32) -> Result<Self::Handle, EngineError>;

    /// Cut out an absolute rectangle. Fails if it leaves the image bounds.
    fn crop(
        &self,
        image: Self::Handle,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<Self::Handle, EngineError>;

    fn gaussian_blur(&self, image: &mut Self::Handle, radius: f32);

    fn box_blur(&self, image: &mut Self::Handle);

    fn sharpen(&self, image: &mut Self::Handle);

    fn noise_reduction(&self, image: &mut Self::Handle);

    /// Add `amount` to every color channel.
    fn inc_brightness(&self, image: &mut Self::Handle, amount: u8);

    /// Scale HSL lightness down by `level` (0..=1) of its current value.
    fn darken_hsl(&self, image: &mut Self::Handle, level: f32);

    /// Rotate hue by `turns` of a full circle.
    fn hue_rotate_hsl(&self, image: &mut Self::Handle, turns: f32);

    fn saturate_hsl(&self, image: &mut Self::Handle, level: f32);

    fn desaturate_hsl(&self, image: &mut Self::Handle, level: f32);

    /// Add per-channel offsets.
    fn tint(&self, image: &mut Self::Handle, r: u8, g: u8, b: u8);

    /// Quantize to `shades` gray levels.
    fn grayscale_shades(&self, image: &mut Self::Handle, shades: u8);

    fn encode(
        &self,
        image: &Self::Handle,
        format: OutputFormat,
        quality: u8,
    ) -> Result<Vec<u8>, EngineError>;
}
