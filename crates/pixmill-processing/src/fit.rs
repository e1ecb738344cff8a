//! Fit-resize geometry
//!
//! Pure functions that turn a current size, a requested box and a
//! [`FitPolicy`] into the size to resize to, plus the letterbox padding or
//! center-crop that brings the result back to the requested box.

use crate::engine::{Dimensions, MAX_DIMENSION, MAX_PIXELS};
use pixmill_core::FitPolicy;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    #[error("Invalid object fit value: {0}")]
    InvalidFitPolicy(String),

    #[error("Invalid dimensions: {width}x{height}")]
    DegenerateDimensions { width: f64, height: f64 },

    #[error("{width}x{height} exceeds the {max_side}px / {max_pixels} pixel limit")]
    TooLarge {
        width: u32,
        height: u32,
        max_side: u32,
        max_pixels: u64,
    },
}

/// Fit result rounded to two decimal places
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitSize {
    pub width: f64,
    pub height: f64,
}

impl FitSize {
    /// Whole-pixel size for the resize call. Rounds half-up and never goes
    /// below 1; `cover` never lands under the target and `contain` never over it.
    pub fn to_pixels(self, policy: FitPolicy, target_width: u32, target_height: u32) -> Dimensions {
        let width = round_half_up(self.width).max(1.0) as u32;
        let height = round_half_up(self.height).max(1.0) as u32;

        match policy {
            FitPolicy::Cover => Dimensions::new(width.max(target_width), height.max(target_height)),
            FitPolicy::Contain => {
                Dimensions::new(width.min(target_width), height.min(target_height))
            }
            FitPolicy::Fill => Dimensions::new(target_width, target_height),
            FitPolicy::None | FitPolicy::ScaleDown => Dimensions::new(width, height),
        }
    }
}

fn round_half_up(n: f64) -> f64 {
    (n + 0.5).floor()
}

fn round_2dp(n: f64) -> f64 {
    ((n + f64::EPSILON) * 100.0 + 0.5).floor() / 100.0
}

/// Compute the resized size for `policy`.
pub fn compute_fit(
    policy: FitPolicy,
    current_width: u32,
    current_height: u32,
    target_width: u32,
    target_height: u32,
) -> Result<FitSize, FitError> {
    let (cw, ch) = (current_width as f64, current_height as f64);
    let (tw, th) = (target_width as f64, target_height as f64);
    let width_ratio = tw / cw;
    let height_ratio = th / ch;

    let (width, height) = match policy {
        FitPolicy::Contain => {
            let scale = width_ratio.min(height_ratio);
            (cw * scale, ch * scale)
        }
        FitPolicy::Cover => {
            let scale = width_ratio.max(height_ratio);
            (cw * scale, ch * scale)
        }
        FitPolicy::Fill => (tw, th),
        FitPolicy::None => (cw, ch),
        FitPolicy::ScaleDown => {
            let scale = width_ratio.min(height_ratio).min(1.0);
            (cw * scale, ch * scale)
        }
    };

    let (width, height) = (round_2dp(width), round_2dp(height));
    if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
        return Err(FitError::DegenerateDimensions { width, height });
    }

    Ok(FitSize { width, height })
}

/// [`compute_fit`] with the policy given by name.
pub fn compute_fit_named(
    policy: &str,
    current_width: u32,
    current_height: u32,
    target_width: u32,
    target_height: u32,
) -> Result<FitSize, FitError> {
    let policy = policy
        .parse::<FitPolicy>()
        .map_err(|_| FitError::InvalidFitPolicy(policy.to_string()))?;
    compute_fit(
        policy,
        current_width,
        current_height,
        target_width,
        target_height,
    )
}

/// What the resize stage has to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizePlan {
    /// Requested box equals the current size
    Keep,
    /// Only one side was requested; resize straight to the derived box
    Exact(Dimensions),
    /// Both sides were requested; resize per policy then adjust to `target`
    Fit {
        policy: FitPolicy,
        resized: Dimensions,
        target: Dimensions,
    },
}

/// Decide the resize for a requested width and/or height.
///
/// A missing side is derived from the current aspect ratio (rounded down,
/// at least 1px). Fails with [`FitError::TooLarge`] when the image would
/// have to grow past the engine limits.
pub fn plan_resize(
    policy: FitPolicy,
    current: Dimensions,
    target_width: Option<u32>,
    target_height: Option<u32>,
) -> Result<ResizePlan, FitError> {
    let derive = |known: u32, from: u32, to: u32| -> u32 {
        ((known as f64 / from as f64) * to as f64).floor().max(1.0) as u32
    };

    match (target_width, target_height) {
        (None, None) => Ok(ResizePlan::Keep),
        (Some(w), Some(h)) if w == current.width && h == current.height => Ok(ResizePlan::Keep),
        (Some(w), Some(h)) => {
            let size = compute_fit(policy, current.width, current.height, w, h)?;
            let resized = size.to_pixels(policy, w, h);
            if resized != current {
                check_limits(resized)?;
            }
            Ok(ResizePlan::Fit {
                policy,
                resized,
                target: Dimensions::new(w, h),
            })
        }
        (Some(w), None) => {
            let h = derive(w, current.width, current.height);
            exact_or_keep(current, Dimensions::new(w, h))
        }
        (None, Some(h)) => {
            let w = derive(h, current.height, current.width);
            exact_or_keep(current, Dimensions::new(w, h))
        }
    }
}

fn exact_or_keep(current: Dimensions, target: Dimensions) -> Result<ResizePlan, FitError> {
    if current == target {
        return Ok(ResizePlan::Keep);
    }
    check_limits(target)?;
    Ok(ResizePlan::Exact(target))
}

fn check_limits(size: Dimensions) -> Result<(), FitError> {
    if size.within_limits() {
        Ok(())
    } else {
        Err(FitError::TooLarge {
            width: size.width,
            height: size.height,
            max_side: MAX_DIMENSION,
            max_pixels: MAX_PIXELS,
        })
    }
}

/// Padding (top, right, bottom, left) that grows `resized` to exactly `target`.
/// The short side's gap is split with the odd pixel on the bottom/right.
pub fn letterbox_padding(resized: Dimensions, target: Dimensions) -> [u32; 4] {
    let gap_x = target.width.saturating_sub(resized.width);
    let gap_y = target.height.saturating_sub(resized.height);
    let top = gap_y / 2;
    let left = gap_x / 2;
    [top, gap_x - left, gap_y - top, left]
}

/// Top-left offset of a centered `target` box inside `resized`.
pub fn center_crop_offset(resized: Dimensions, target: Dimensions) -> (u32, u32) {
    (
        resized.width.saturating_sub(target.width) / 2,
        resized.height.saturating_sub(target.height) / 2,
    )
}
