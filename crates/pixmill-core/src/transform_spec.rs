//! Transform parameter schema
//!
//! Turns the untyped query parameters of a transform request into a
//! [`TransformSpec`]. Every field is parsed and bound-checked here, so the
//! pipeline can trust whatever it is handed.
//!
//! Validation is fail-fast: fields are checked in the fixed order of
//! [`FIELD_ORDER`] and the first failure is returned, carrying exactly one
//! field name and one reason.

use crate::color::{parse_color, ColorError, Rgba};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Largest accepted width/height, also the largest crop width and padding
pub const MAX_DIMENSION: u32 = 5000;
/// Largest accepted crop height
pub const MAX_CROP_HEIGHT: u32 = 1000;
/// Gaussian blur radius used when `blur=gaussian` comes without `blur_radius`
pub const DEFAULT_BLUR_RADIUS: f32 = 1.0;

/// Query keys in the order they are validated
pub const FIELD_ORDER: [&str; 22] = [
    "url",
    "format",
    "jpeg_quality",
    "width",
    "height",
    "fit",
    "fit_cover_letterbox_color",
    "fliph",
    "flipv",
    "padding",
    "padding_color",
    "rotate",
    "crop",
    "blur",
    "blur_radius",
    "sharpen",
    "noise_reduction",
    "brightness",
    "hue",
    "saturation",
    "tint",
    "grayscale",
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid `{field}`: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: ValidationReason,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: ValidationReason) -> Self {
        Self { field, reason }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationReason {
    #[error("parameter is required")]
    Missing,

    #[error("`{0}` is not a number")]
    NotANumber(String),

    #[error("{value} is outside {min}..={max}")]
    OutOfRange { value: String, min: f64, max: f64 },

    #[error("unsupported value `{value}`, expected one of: {expected}")]
    UnsupportedValue {
        value: String,
        expected: &'static str,
    },

    #[error(transparent)]
    InvalidColor(#[from] ColorError),

    #[error("{0}")]
    InvalidPadding(String),

    #[error("{0}")]
    InvalidCrop(String),

    #[error("unknown fit policy `{0}`")]
    InvalidFitPolicy(String),
}

/// Output container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[serde(rename = "webp")]
    WebP,
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
        }
    }

    pub fn to_mime_type(self) -> &'static str {
        match self {
            OutputFormat::WebP => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    /// Map a `Content-Type` such as `image/png; charset=binary` to a format.
    /// Only the three encodable subtypes are recognized.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
        let subtype = essence.strip_prefix("image/")?;
        match subtype {
            "webp" => Some(OutputFormat::WebP),
            "jpeg" | "jpg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            _ => None,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ValidationReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "webp" => Ok(OutputFormat::WebP),
            "jpeg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            _ => Err(ValidationReason::UnsupportedValue {
                value: s.to_string(),
                expected: "webp, jpeg, png",
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a resized image relates to the requested box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum FitPolicy {
    /// Scale to fit inside the box, preserving aspect ratio
    Contain,
    /// Scale to cover the box, preserving aspect ratio, then center-crop
    #[default]
    Cover,
    /// Stretch to the box exactly
    Fill,
    /// Keep the current size
    None,
    /// Like `contain`, but never upscale
    ScaleDown,
}

impl FitPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            FitPolicy::Contain => "contain",
            FitPolicy::Cover => "cover",
            FitPolicy::Fill => "fill",
            FitPolicy::None => "none",
            FitPolicy::ScaleDown => "scale-down",
        }
    }
}

impl FromStr for FitPolicy {
    type Err = ValidationReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "contain" => Ok(FitPolicy::Contain),
            "cover" => Ok(FitPolicy::Cover),
            "fill" => Ok(FitPolicy::Fill),
            "none" => Ok(FitPolicy::None),
            "scale-down" => Ok(FitPolicy::ScaleDown),
            _ => Err(ValidationReason::InvalidFitPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for FitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BlurKind {
    Gaussian,
    Box,
}

impl FromStr for BlurKind {
    type Err = ValidationReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gaussian" => Ok(BlurKind::Gaussian),
            "box" => Ok(BlurKind::Box),
            _ => Err(ValidationReason::UnsupportedValue {
                value: s.to_string(),
                expected: "gaussian, box",
            }),
        }
    }
}

/// Padding in pixels, always normalized to four sides
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Padding {
    pub fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0 && self.left == 0.0
    }

    pub fn is_uniform(&self) -> bool {
        self.top == self.right && self.right == self.bottom && self.bottom == self.left
    }
}

impl FromStr for Padding {
    type Err = ValidationReason;

    /// `"t"`, `"t,r"`, `"t,r,b"` or `"t,r,b,l"`; missing sides are zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = parse_float_list(s).map_err(ValidationReason::InvalidPadding)?;
        if values.len() > 4 {
            return Err(ValidationReason::InvalidPadding(format!(
                "expected at most 4 values, got {}",
                values.len()
            )));
        }
        if let Some(v) = values.iter().find(|v| **v < 0.0) {
            return Err(ValidationReason::InvalidPadding(format!(
                "{} is negative",
                v
            )));
        }
        if let Some(v) = values.iter().find(|v| **v > MAX_DIMENSION as f64) {
            return Err(ValidationReason::InvalidPadding(format!(
                "{} exceeds {}",
                v, MAX_DIMENSION
            )));
        }

        let mut sides = [0.0; 4];
        sides[..values.len()].copy_from_slice(&values);
        Ok(Padding {
            top: sides[0],
            right: sides[1],
            bottom: sides[2],
            left: sides[3],
        })
    }
}

/// Absolute crop rectangle, applied after rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FromStr for CropRect {
    type Err = ValidationReason;

    /// Exactly four values: `x,y,width,height`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = parse_float_list(s).map_err(ValidationReason::InvalidCrop)?;
        let &[x, y, width, height] = values.as_slice() else {
            return Err(ValidationReason::InvalidCrop(format!(
                "expected 4 values (x,y,width,height), got {}",
                values.len()
            )));
        };

        if x < 0.0 || y < 0.0 {
            return Err(ValidationReason::InvalidCrop(
                "x and y must be non-negative".to_string(),
            ));
        }
        if !(1.0..=MAX_DIMENSION as f64).contains(&width) {
            return Err(ValidationReason::InvalidCrop(format!(
                "width {} is outside 1..={}",
                width, MAX_DIMENSION
            )));
        }
        if !(1.0..=MAX_CROP_HEIGHT as f64).contains(&height) {
            return Err(ValidationReason::InvalidCrop(format!(
                "height {} is outside 1..={}",
                height, MAX_CROP_HEIGHT
            )));
        }

        Ok(CropRect {
            x,
            y,
            width,
            height,
        })
    }
}

fn parse_float_list(s: &str) -> Result<Vec<f64>, String> {
    s.split(',')
        .map(|part| {
            let part = part.trim();
            part.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("`{}` is not a number", part))
        })
        .collect()
}

/// Validated, immutable plan for one transform request.
///
/// `None` (or `false`) means the operation is not applied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransformSpec {
    pub source_url: String,
    pub output_format: Option<OutputFormat>,
    pub jpeg_quality: Option<u8>,
    pub target_width: Option<u32>,
    pub target_height: Option<u32>,
    pub fit_policy: FitPolicy,
    pub letterbox_color: Option<Rgba>,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    pub padding: Option<Padding>,
    pub padding_color: Rgba,
    pub rotation_degrees: Option<u16>,
    pub crop_rect: Option<CropRect>,
    pub blur_kind: Option<BlurKind>,
    pub blur_radius: f32,
    pub sharpen: bool,
    pub noise_reduction: bool,
    pub brightness: Option<i32>,
    pub hue_shift: Option<i32>,
    pub saturation: Option<i32>,
    pub tint_color: Option<Rgba>,
    pub grayscale_shades: Option<u8>,
    explicit_params: bool,
}

impl TransformSpec {
    /// A spec that fetches `url` and applies nothing.
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            source_url: url.into(),
            blur_radius: DEFAULT_BLUR_RADIUS,
            ..Default::default()
        }
    }

    /// Validate raw query parameters. Unknown keys are ignored.
    pub fn from_query(raw: &HashMap<String, String>) -> Result<Self, ValidationError> {
        let get = |key: &str| raw.get(key).map(String::as_str);

        let source_url = match get("url").map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => return Err(ValidationError::new("url", ValidationReason::Missing)),
        };

        let mut spec = TransformSpec::for_url(source_url);
        spec.explicit_params = FIELD_ORDER[1..].iter().any(|key| raw.contains_key(*key));

        if let Some(v) = get("format") {
            spec.output_format = Some(parse_enum("format", v)?);
        }
        if let Some(v) = get("jpeg_quality") {
            spec.jpeg_quality = Some(parse_int("jpeg_quality", v, 1, 100)? as u8);
        }
        if let Some(v) = get("width") {
            spec.target_width = Some(parse_int("width", v, 1, MAX_DIMENSION as i64)? as u32);
        }
        if let Some(v) = get("height") {
            spec.target_height = Some(parse_int("height", v, 1, MAX_DIMENSION as i64)? as u32);
        }
        if let Some(v) = get("fit") {
            spec.fit_policy = parse_enum("fit", v)?;
        }
        if let Some(v) = get("fit_cover_letterbox_color") {
            spec.letterbox_color = Some(parse_color_field("fit_cover_letterbox_color", v)?);
        }
        spec.flip_horizontal = get("fliph").is_some_and(parse_bool);
        spec.flip_vertical = get("flipv").is_some_and(parse_bool);
        if let Some(v) = get("padding") {
            spec.padding = Some(parse_enum("padding", v)?);
        }
        if let Some(v) = get("padding_color") {
            spec.padding_color = parse_color_field("padding_color", v)?;
        }
        if let Some(v) = get("rotate") {
            spec.rotation_degrees = Some(parse_int("rotate", v, 0, 360)? as u16);
        }
        if let Some(v) = get("crop") {
            spec.crop_rect = Some(parse_enum("crop", v)?);
        }
        if let Some(v) = get("blur") {
            spec.blur_kind = Some(parse_enum("blur", v)?);
        }
        if let Some(v) = get("blur_radius") {
            spec.blur_radius = parse_number("blur_radius", v, 0.0, 100.0)? as f32;
        }
        spec.sharpen = get("sharpen").is_some_and(parse_bool);
        spec.noise_reduction = get("noise_reduction").is_some_and(parse_bool);
        if let Some(v) = get("brightness") {
            spec.brightness = Some(parse_int("brightness", v, -100, 100)? as i32);
        }
        if let Some(v) = get("hue") {
            spec.hue_shift = Some(parse_int("hue", v, 0, 100)? as i32);
        }
        if let Some(v) = get("saturation") {
            spec.saturation = Some(parse_int("saturation", v, -100, 100)? as i32);
        }
        if let Some(v) = get("tint") {
            spec.tint_color = Some(parse_color_field("tint", v)?);
        }
        if let Some(v) = get("grayscale") {
            spec.grayscale_shades = Some(parse_int("grayscale", v, 0, 100)? as u8);
        }

        Ok(spec)
    }

    /// Whether anything beyond `url` was requested. When false the source
    /// bytes are served untouched.
    pub fn has_transformations(&self) -> bool {
        self.explicit_params
            || self.output_format.is_some()
            || self.jpeg_quality.is_some()
            || self.target_width.is_some()
            || self.target_height.is_some()
            || self.letterbox_color.is_some()
            || self.flip_horizontal
            || self.flip_vertical
            || self.padding.is_some()
            || self.rotation_degrees.is_some()
            || self.crop_rect.is_some()
            || self.blur_kind.is_some()
            || self.sharpen
            || self.noise_reduction
            || self.brightness.is_some()
            || self.hue_shift.is_some()
            || self.saturation.is_some()
            || self.tint_color.is_some()
            || self.grayscale_shades.is_some()
    }
}

/// Case-insensitive `"true"`; anything else is false.
pub fn parse_bool(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

fn parse_int(field: &'static str, raw: &str, min: i64, max: i64) -> Result<i64, ValidationError> {
    let value = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::new(field, ValidationReason::NotANumber(raw.to_string())))?;
    if !(min..=max).contains(&value) {
        return Err(ValidationError::new(
            field,
            ValidationReason::OutOfRange {
                value: value.to_string(),
                min: min as f64,
                max: max as f64,
            },
        ));
    }
    Ok(value)
}

fn parse_number(field: &'static str, raw: &str, min: f64, max: f64) -> Result<f64, ValidationError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::new(field, ValidationReason::NotANumber(raw.to_string())))?;
    if !(min..=max).contains(&value) {
        return Err(ValidationError::new(
            field,
            ValidationReason::OutOfRange {
                value: value.to_string(),
                min,
                max,
            },
        ));
    }
    Ok(value)
}

fn parse_enum<T>(field: &'static str, raw: &str) -> Result<T, ValidationError>
where
    T: FromStr<Err = ValidationReason>,
{
    raw.trim()
        .parse::<T>()
        .map_err(|reason| ValidationError::new(field, reason))
}

fn parse_color_field(field: &'static str, raw: &str) -> Result<Rgba, ValidationError> {
    parse_color(raw).map_err(|e| ValidationError::new(field, ValidationReason::InvalidColor(e)))
}
