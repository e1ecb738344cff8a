use crate::engine::{Dimensions, EngineError, Side};
use image::{imageops, Rgba, RgbaImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use pixmill_core::Rgba as Color;

fn pixel(color: Color) -> Rgba<u8> {
    Rgba(color.to_array())
}

fn ensure_within_limits(width: u32, height: u32) -> Result<(), EngineError> {
    if Dimensions::new(width, height).within_limits() {
        Ok(())
    } else {
        Err(EngineError::InvalidGeometry(format!(
            "{}x{} exceeds the size limit",
            width, height
        )))
    }
}

/// Select resampling filter based on resize ratio
pub fn select_filter(
    orig_width: u32,
    orig_height: u32,
    new_width: u32,
    new_height: u32,
) -> imageops::FilterType {
    let width_ratio = orig_width as f32 / new_width as f32;
    let height_ratio = orig_height as f32 / new_height as f32;
    let max_ratio = width_ratio.max(height_ratio);

    if max_ratio > 2.0 {
        imageops::FilterType::Triangle
    } else if max_ratio > 1.5 {
        imageops::FilterType::CatmullRom
    } else {
        imageops::FilterType::Lanczos3
    }
}

pub fn resize(img: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage, EngineError> {
    if width == 0 || height == 0 {
        return Err(EngineError::InvalidGeometry(format!(
            "cannot resize to {}x{}",
            width, height
        )));
    }
    let filter = select_filter(img.width(), img.height(), width, height);
    Ok(imageops::resize(img, width, height, filter))
}

/// Grow the canvas by the given amounts and place the image inside.
pub fn pad(
    img: &RgbaImage,
    top: u32,
    right: u32,
    bottom: u32,
    left: u32,
    color: Color,
) -> Result<RgbaImage, EngineError> {
    let width = img
        .width()
        .checked_add(left)
        .and_then(|w| w.checked_add(right));
    let height = img
        .height()
        .checked_add(top)
        .and_then(|h| h.checked_add(bottom));
    let (Some(width), Some(height)) = (width, height) else {
        return Err(EngineError::InvalidGeometry(
            "padded size overflows".to_string(),
        ));
    };
    ensure_within_limits(width, height)?;

    let mut canvas = RgbaImage::from_pixel(width, height, pixel(color));
    imageops::replace(&mut canvas, img, left as i64, top as i64);
    Ok(canvas)
}

pub fn pad_side(
    img: &RgbaImage,
    side: Side,
    amount: u32,
    color: Color,
) -> Result<RgbaImage, EngineError> {
    match side {
        Side::Top => pad(img, amount, 0, 0, 0, color),
        Side::Right => pad(img, 0, amount, 0, 0, color),
        Side::Bottom => pad(img, 0, 0, amount, 0, color),
        Side::Left => pad(img, 0, 0, 0, amount, color),
    }
}

/// Rotate clockwise. Quarter turns are exact; any other angle expands the
/// output to the rotated bounding box and fills the corners with transparency.
pub fn rotate(img: &RgbaImage, degrees: f32) -> Result<RgbaImage, EngineError> {
    let normalized = degrees.rem_euclid(360.0);
    if normalized == 0.0 {
        return Ok(img.clone());
    }
    if normalized == 90.0 {
        return Ok(imageops::rotate90(img));
    }
    if normalized == 180.0 {
        return Ok(imageops::rotate180(img));
    }
    if normalized == 270.0 {
        return Ok(imageops::rotate270(img));
    }

    let theta = normalized.to_radians();
    let (w, h) = (img.width() as f32, img.height() as f32);
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let bound_width = (w * cos + h * sin).ceil().max(1.0) as u32;
    let bound_height = (w * sin + h * cos).ceil().max(1.0) as u32;

    // the working canvas must hold both the source and its rotated bounds
    let canvas_width = bound_width.max(img.width());
    let canvas_height = bound_height.max(img.height());
    ensure_within_limits(canvas_width, canvas_height)?;

    let transparent = Rgba([0, 0, 0, 0]);
    let mut canvas = RgbaImage::from_pixel(canvas_width, canvas_height, transparent);
    let offset_x = (canvas_width as i64 - img.width() as i64) / 2;
    let offset_y = (canvas_height as i64 - img.height() as i64) / 2;
    imageops::replace(&mut canvas, img, offset_x, offset_y);

    let rotated = rotate_about_center(&canvas, theta, Interpolation::Bilinear, transparent);
    let crop_x = (canvas_width - bound_width) / 2;
    let crop_y = (canvas_height - bound_height) / 2;
    Ok(imageops::crop_imm(&rotated, crop_x, crop_y, bound_width, bound_height).to_image())
}

pub fn crop(
    img: &RgbaImage,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Result<RgbaImage, EngineError> {
    let fits = width > 0
        && height > 0
        && x.checked_add(width).is_some_and(|right| right <= img.width())
        && y.checked_add(height).is_some_and(|bottom| bottom <= img.height());
    if !fits {
        return Err(EngineError::OutOfBounds {
            x,
            y,
            width,
            height,
            image_width: img.width(),
            image_height: img.height(),
        });
    }
    Ok(imageops::crop_imm(img, x, y, width, height).to_image())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([200, 10, 10, 255]))
    }

    // bilinear sampling may land a unit off
    fn is_source_color(p: &Rgba<u8>) -> bool {
        (p[0] as i16 - 200).abs() <= 1 && (p[1] as i16 - 10).abs() <= 1 && p[3] >= 254
    }

    #[test]
    fn test_pad_places_image_and_fills_color() {
        let padded = pad(&solid(4, 2), 1, 2, 3, 4, Color::opaque(0, 0, 255)).unwrap();
        assert_eq!(padded.dimensions(), (10, 6));
        assert_eq!(padded.get_pixel(0, 0), &Rgba([0, 0, 255, 255]));
        assert_eq!(padded.get_pixel(4, 1), &Rgba([200, 10, 10, 255]));
        assert_eq!(padded.get_pixel(7, 2), &Rgba([200, 10, 10, 255]));
        assert_eq!(padded.get_pixel(8, 2), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_pad_side() {
        let padded = pad_side(&solid(4, 2), Side::Bottom, 5, Color::BLACK).unwrap();
        assert_eq!(padded.dimensions(), (4, 7));
        assert_eq!(padded.get_pixel(0, 6), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_rotate_quarter_turns_swap_dimensions() {
        let img = solid(4, 2);
        assert_eq!(rotate(&img, 90.0).unwrap().dimensions(), (2, 4));
        assert_eq!(rotate(&img, 180.0).unwrap().dimensions(), (4, 2));
        assert_eq!(rotate(&img, 270.0).unwrap().dimensions(), (2, 4));
        assert_eq!(rotate(&img, 360.0).unwrap().dimensions(), (4, 2));
    }

    #[test]
    fn test_rotate_arbitrary_angle_expands_canvas() {
        let rotated = rotate(&solid(100, 50), 45.0).unwrap();
        // 100*cos45 + 50*sin45 = 106.07
        assert_eq!(rotated.dimensions(), (107, 107));
        assert_eq!(rotated.get_pixel(0, 0)[3], 0);
        assert!(is_source_color(rotated.get_pixel(53, 53)));
    }

    #[test]
    fn test_rotate_wide_image_keeps_content() {
        // the 45 degree bounding box of a 1000x300 image is narrower than the source
        let rotated = rotate(&solid(1000, 300), 45.0).unwrap();
        assert_eq!(rotated.dimensions(), (920, 920));
        assert!(is_source_color(rotated.get_pixel(460, 460)));
        assert_eq!(rotated.get_pixel(0, 0)[3], 0);
        let opaque = rotated.pixels().filter(|p| is_source_color(p)).count();
        // about 1000*300 pixels survive the rotation
        assert!(opaque > 250_000, "only {} opaque pixels", opaque);
    }

    #[test]
    fn test_rotate_tall_image_keeps_content() {
        let rotated = rotate(&solid(30, 200), 30.0).unwrap();
        let (w, h) = rotated.dimensions();
        assert!(is_source_color(rotated.get_pixel(w / 2, h / 2)));
    }

    #[test]
    fn test_pad_rejects_oversized_canvas() {
        let err = pad(&solid(4, 4), 0, 20_000, 0, 0, Color::BLACK).unwrap_err();
        assert!(matches!(err, EngineError::InvalidGeometry(_)));
        let err = pad(&solid(4, 4), 8000, 8000, 8000, 8000, Color::BLACK).unwrap_err();
        assert!(matches!(err, EngineError::InvalidGeometry(_)));
    }

    #[test]
    fn test_crop_inside_bounds() {
        let cropped = crop(&solid(20, 10), 5, 2, 10, 8).unwrap();
        assert_eq!(cropped.dimensions(), (10, 8));
    }

    #[test]
    fn test_crop_outside_bounds_fails() {
        let err = crop(&solid(20, 10), 15, 0, 10, 5).unwrap_err();
        assert!(matches!(err, EngineError::OutOfBounds { image_width: 20, .. }));
        assert!(crop(&solid(20, 10), 0, 0, 20, 11).is_err());
    }

    #[test]
    fn test_resize_rejects_zero() {
        assert!(resize(&solid(10, 10), 0, 5).is_err());
        assert_eq!(resize(&solid(10, 10), 4, 6).unwrap().dimensions(), (4, 6));
    }
}
