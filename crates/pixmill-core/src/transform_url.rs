//! Transform URL builder
//!
//! Fluent API for building `/api/image?...` URLs on the client side. Parameters
//! are emitted in validation order and percent-encoded as query components.
//!
//! # Example
//!
//! ```rust
//! use pixmill_core::transform_url::TransformUrlBuilder;
//! use pixmill_core::{FitPolicy, OutputFormat};
//!
//! let url = TransformUrlBuilder::new("/photos/cat.png")
//!     .dimensions(500, 300)
//!     .fit(FitPolicy::Contain)
//!     .format(OutputFormat::WebP)
//!     .build();
//! assert_eq!(
//!     url,
//!     "/api/image?url=%2Fphotos%2Fcat.png&format=webp&width=500&height=300&fit=contain"
//! );
//! ```

use crate::transform_spec::{FitPolicy, OutputFormat, FIELD_ORDER};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Path of the transform endpoint
pub const TRANSFORM_PATH: &str = "/api/image";

/// Characters left as-is in a query component (same set as `encodeURIComponent`)
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone)]
pub struct TransformUrlBuilder {
    params: Vec<(&'static str, String)>,
}

impl TransformUrlBuilder {
    /// Start a builder for the given source image URL (absolute or site-relative)
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            params: vec![("url", source_url.into())],
        }
    }

    fn set(mut self, key: &'static str, value: impl ToString) -> Self {
        let value = value.to_string();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.params.push((key, value)),
        }
        self
    }

    pub fn format(self, format: OutputFormat) -> Self {
        self.set("format", format)
    }

    pub fn jpeg_quality(self, quality: u8) -> Self {
        self.set("jpeg_quality", quality)
    }

    pub fn width(self, width: u32) -> Self {
        self.set("width", width)
    }

    pub fn height(self, height: u32) -> Self {
        self.set("height", height)
    }

    pub fn dimensions(self, width: u32, height: u32) -> Self {
        self.width(width).height(height)
    }

    pub fn fit(self, fit: FitPolicy) -> Self {
        self.set("fit", fit)
    }

    /// Letterbox color used with `fit=contain`; any color expression
    pub fn letterbox_color(self, color: &str) -> Self {
        self.set("fit_cover_letterbox_color", color)
    }

    pub fn flip_horizontal(self) -> Self {
        self.set("fliph", true)
    }

    pub fn flip_vertical(self) -> Self {
        self.set("flipv", true)
    }

    pub fn padding(self, top: f64, right: f64, bottom: f64, left: f64) -> Self {
        self.set("padding", format!("{},{},{},{}", top, right, bottom, left))
    }

    pub fn padding_color(self, color: &str) -> Self {
        self.set("padding_color", color)
    }

    pub fn rotate(self, degrees: u16) -> Self {
        self.set("rotate", degrees)
    }

    pub fn crop(self, x: u32, y: u32, width: u32, height: u32) -> Self {
        self.set("crop", format!("{},{},{},{}", x, y, width, height))
    }

    pub fn gaussian_blur(self, radius: f32) -> Self {
        self.set("blur", "gaussian").set("blur_radius", radius)
    }

    pub fn box_blur(self) -> Self {
        self.set("blur", "box")
    }

    pub fn sharpen(self) -> Self {
        self.set("sharpen", true)
    }

    pub fn noise_reduction(self) -> Self {
        self.set("noise_reduction", true)
    }

    pub fn brightness(self, value: i32) -> Self {
        self.set("brightness", value)
    }

    pub fn hue(self, value: i32) -> Self {
        self.set("hue", value)
    }

    pub fn saturation(self, value: i32) -> Self {
        self.set("saturation", value)
    }

    pub fn tint(self, color: &str) -> Self {
        self.set("tint", color)
    }

    pub fn grayscale(self, shades: u8) -> Self {
        self.set("grayscale", shades)
    }

    /// Query string without the leading `?`
    pub fn build_query(&self) -> String {
        let mut params: Vec<&(&'static str, String)> = self.params.iter().collect();
        params.sort_by_key(|(key, _)| FIELD_ORDER.iter().position(|k| k == key));

        params
            .iter()
            .map(|(key, value)| {
                format!("{}={}", key, utf8_percent_encode(value, QUERY_COMPONENT))
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Site-relative URL: `/api/image?...`
    pub fn build(&self) -> String {
        format!("{}?{}", TRANSFORM_PATH, self.build_query())
    }

    /// Absolute URL against `base` (e.g. `https://img.example.com`)
    pub fn build_with_base(&self, base: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), self.build())
    }
}
