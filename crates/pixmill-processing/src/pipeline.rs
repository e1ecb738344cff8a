//! Transform pipeline
//!
//! Applies a validated [`TransformSpec`] to a decoded image in a fixed order
//! ([`PIPELINE_STAGES`]). Each stage is a no-op unless the `TransformSpec` asks for it.

use crate::engine::{Dimensions, ImageEngine, Side};
use crate::error::ProcessingError;
use crate::fit::{center_crop_offset, letterbox_padding, plan_resize, ResizePlan};
use pixmill_core::{BlurKind, FitPolicy, TransformSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resize,
    FlipHorizontal,
    FlipVertical,
    Padding,
    Rotate,
    Crop,
    Blur,
    Sharpen,
    NoiseReduction,
    Brightness,
    Hue,
    Saturation,
    Tint,
    Grayscale,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Resize => "resize",
            Stage::FlipHorizontal => "fliph",
            Stage::FlipVertical => "flipv",
            Stage::Padding => "padding",
            Stage::Rotate => "rotate",
            Stage::Crop => "crop",
            Stage::Blur => "blur",
            Stage::Sharpen => "sharpen",
            Stage::NoiseReduction => "noise_reduction",
            Stage::Brightness => "brightness",
            Stage::Hue => "hue",
            Stage::Saturation => "saturation",
            Stage::Tint => "tint",
            Stage::Grayscale => "grayscale",
        }
    }
}

/// Execution order of the pipeline
pub const PIPELINE_STAGES: [Stage; 14] = [
    Stage::Resize,
    Stage::FlipHorizontal,
    Stage::FlipVertical,
    Stage::Padding,
    Stage::Rotate,
    Stage::Crop,
    Stage::Blur,
    Stage::Sharpen,
    Stage::NoiseReduction,
    Stage::Brightness,
    Stage::Hue,
    Stage::Saturation,
    Stage::Tint,
    Stage::Grayscale,
];

pub struct TransformPipeline<'a, E: ImageEngine> {
    engine: &'a E,
}

impl<'a, E: ImageEngine> TransformPipeline<'a, E> {
    pub fn new(engine: &'a E) -> Self {
        Self { engine }
    }

    /// Run every stage in order. Stops at the first failing stage.
    pub fn execute(
        &self,
        mut image: E::Handle,
        spec: &TransformSpec,
    ) -> Result<E::Handle, ProcessingError> {
        for stage in PIPELINE_STAGES {
            image = self.apply(stage, image, spec)?;
        }
        Ok(image)
    }

    fn apply(
        &self,
        stage: Stage,
        mut image: E::Handle,
        spec: &TransformSpec,
    ) -> Result<E::Handle, ProcessingError> {
        let engine = self.engine;
        let fail = |source| ProcessingError::engine(stage.name(), source);

        match stage {
            Stage::Resize => return self.resize(image, spec),
            Stage::FlipHorizontal if spec.flip_horizontal => {
                tracing::debug!("Applying horizontal flip");
                engine.flip_horizontal(&mut image);
            }
            Stage::FlipVertical if spec.flip_vertical => {
                tracing::debug!("Applying vertical flip");
                engine.flip_vertical(&mut image);
            }
            Stage::Padding => {
                if let Some(padding) = spec.padding.filter(|p| !p.is_zero()) {
                    tracing::debug!(?padding, "Applying padding");
                    let color = spec.padding_color;
                    if padding.is_uniform() {
                        return engine
                            .pad_uniform(image, to_px(padding.top), color)
                            .map_err(fail);
                    }
                    let sides = [
                        (Side::Top, padding.top),
                        (Side::Right, padding.right),
                        (Side::Bottom, padding.bottom),
                        (Side::Left, padding.left),
                    ];
                    for (side, amount) in sides {
                        let amount = to_px(amount);
                        if amount > 0 {
                            image = engine.pad_side(image, side, amount, color).map_err(fail)?;
                        }
                    }
                }
            }
            Stage::Rotate => {
                if let Some(degrees) = spec.rotation_degrees.filter(|d| *d != 0) {
                    tracing::debug!(degrees, "Applying rotation");
                    return engine.rotate(image, degrees as f32).map_err(fail);
                }
            }
            Stage::Crop => {
                if let Some(rect) = spec.crop_rect {
                    tracing::debug!(?rect, "Applying crop");
                    return engine
                        .crop(
                            image,
                            to_px(rect.x),
                            to_px(rect.y),
                            to_px(rect.width),
                            to_px(rect.height),
                        )
                        .map_err(fail);
                }
            }
            Stage::Blur => match spec.blur_kind {
                Some(BlurKind::Gaussian) => {
                    tracing::debug!(radius = spec.blur_radius, "Applying gaussian blur");
                    engine.gaussian_blur(&mut image, spec.blur_radius);
                }
                Some(BlurKind::Box) => {
                    tracing::debug!("Applying box blur");
                    engine.box_blur(&mut image);
                }
                None => {}
            },
            Stage::Sharpen if spec.sharpen => {
                tracing::debug!("Applying sharpen");
                engine.sharpen(&mut image);
            }
            Stage::NoiseReduction if spec.noise_reduction => {
                tracing::debug!("Applying noise reduction");
                engine.noise_reduction(&mut image);
            }
            Stage::Brightness => match spec.brightness {
                Some(v) if v < 0 => {
                    tracing::debug!(value = v, "Darkening");
                    engine.darken_hsl(&mut image, v.unsigned_abs() as f32 / 100.0);
                }
                Some(v) if v > 0 => {
                    tracing::debug!(value = v, "Brightening");
                    engine.inc_brightness(&mut image, v.min(u8::MAX as i32) as u8);
                }
                _ => {}
            },
            Stage::Hue => {
                if let Some(v) = spec.hue_shift.filter(|v| *v != 0) {
                    tracing::debug!(value = v, "Rotating hue");
                    engine.hue_rotate_hsl(&mut image, v as f32 / 100.0);
                }
            }
            Stage::Saturation => match spec.saturation {
                Some(v) if v < 0 => {
                    tracing::debug!(value = v, "Desaturating");
                    engine.desaturate_hsl(&mut image, v.unsigned_abs() as f32 / 100.0);
                }
                Some(v) if v > 0 => {
                    tracing::debug!(value = v, "Saturating");
                    engine.saturate_hsl(&mut image, v as f32 / 100.0);
                }
                _ => {}
            },
            Stage::Tint => {
                if let Some(color) = spec.tint_color {
                    tracing::debug!(?color, "Applying tint");
                    engine.tint(&mut image, color.r, color.g, color.b);
                }
            }
            Stage::Grayscale => {
                if let Some(shades) = spec.grayscale_shades.filter(|n| *n != 0) {
                    tracing::debug!(shades, "Applying grayscale");
                    engine.grayscale_shades(&mut image, shades);
                }
            }
            _ => {}
        }

        Ok(image)
    }

    fn resize(&self, image: E::Handle, spec: &TransformSpec) -> Result<E::Handle, ProcessingError> {
        let engine = self.engine;
        let fail = |source| ProcessingError::engine(Stage::Resize.name(), source);
        let current = engine.dimensions(&image);

        match plan_resize(spec.fit_policy, current, spec.target_width, spec.target_height)? {
            ResizePlan::Keep => Ok(image),
            ResizePlan::Exact(size) => {
                tracing::debug!(width = size.width, height = size.height, "Resizing");
                engine.resize(image, size.width, size.height).map_err(fail)
            }
            ResizePlan::Fit {
                policy,
                resized,
                target,
            } => {
                tracing::debug!(
                    fit = %policy,
                    width = resized.width,
                    height = resized.height,
                    "Resizing to fit"
                );
                let image = if resized == current {
                    image
                } else {
                    engine.resize(image, resized.width, resized.height).map_err(fail)?
                };
                self.fit_to_target(image, spec, policy, resized, target)
            }
        }
    }

    /// Letterbox (`contain` with a color) or center-crop (`cover`) to the exact box.
    fn fit_to_target(
        &self,
        mut image: E::Handle,
        spec: &TransformSpec,
        policy: FitPolicy,
        resized: Dimensions,
        target: Dimensions,
    ) -> Result<E::Handle, ProcessingError> {
        let engine = self.engine;
        let fail = |source| ProcessingError::engine(Stage::Resize.name(), source);

        match (policy, spec.letterbox_color) {
            (FitPolicy::Contain, Some(color)) => {
                let [top, right, bottom, left] = letterbox_padding(resized, target);
                let sides = [
                    (Side::Top, top),
                    (Side::Right, right),
                    (Side::Bottom, bottom),
                    (Side::Left, left),
                ];
                for (side, amount) in sides.into_iter().filter(|(_, amount)| *amount > 0) {
                    image = engine.pad_side(image, side, amount, color).map_err(fail)?;
                }
                Ok(image)
            }
            (FitPolicy::Cover, _) if resized != target => {
                let (x, y) = center_crop_offset(resized, target);
                engine
                    .crop(image, x, y, target.width, target.height)
                    .map_err(fail)
            }
            _ => Ok(image),
        }
    }
}

fn to_px(value: f64) -> u32 {
    value.max(0.0).floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineError;
    use pixmill_core::{CropRect, OutputFormat, Padding, Rgba};
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Resize(u32, u32),
        FlipH,
        FlipV,
        PadUniform(u32),
        PadSide(Side, u32),
        Rotate(f32),
        Crop(u32, u32, u32, u32),
        GaussianBlur(f32),
        BoxBlur,
        Sharpen,
        NoiseReduction,
        IncBrightness(u8),
        Darken(f32),
        HueRotate(f32),
        Saturate(f32),
        Desaturate(f32),
        Tint(u8, u8, u8),
        Grayscale(u8),
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct StubImage {
        width: u32,
        height: u32,
    }

    #[derive(Default)]
    struct RecordingEngine {
        calls: RefCell<Vec<Call>>,
    }

    impl RecordingEngine {
        fn record(&self, call: Call) {
            self.calls.borrow_mut().push(call);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }
    }

    impl ImageEngine for RecordingEngine {
        type Handle = StubImage;

        fn decode(&self, _data: &[u8]) -> Result<StubImage, EngineError> {
            Ok(StubImage { width: 1, height: 1 })
        }

        fn dimensions(&self, image: &StubImage) -> Dimensions {
            Dimensions::new(image.width, image.height)
        }

        fn resize(&self, _image: StubImage, width: u32, height: u32) -> Result<StubImage, EngineError> {
            self.record(Call::Resize(width, height));
            Ok(StubImage { width, height })
        }

        fn flip_horizontal(&self, _image: &mut StubImage) {
            self.record(Call::FlipH);
        }

        fn flip_vertical(&self, _image: &mut StubImage) {
            self.record(Call::FlipV);
        }

        fn pad_uniform(&self, image: StubImage, amount: u32, _color: Rgba) -> Result<StubImage, EngineError> {
            self.record(Call::PadUniform(amount));
            Ok(StubImage {
                width: image.width + 2 * amount,
                height: image.height + 2 * amount,
            })
        }

        fn pad_side(
            &self,
            mut image: StubImage,
            side: Side,
            amount: u32,
            _color: Rgba,
        ) -> Result<StubImage, EngineError> {
            self.record(Call::PadSide(side, amount));
            match side {
                Side::Top | Side::Bottom => image.height += amount,
                Side::Left | Side::Right => image.width += amount,
            }
            Ok(image)
        }

        fn rotate(&self, image: StubImage, degrees: f32) -> Result<StubImage, EngineError> {
            self.record(Call::Rotate(degrees));
            if degrees == 90.0 || degrees == 270.0 {
                return Ok(StubImage {
                    width: image.height,
                    height: image.width,
                });
            }
            Ok(image)
        }

        fn crop(
            &self,
            image: StubImage,
            x: u32,
            y: u32,
            width: u32,
            height: u32,
        ) -> Result<StubImage, EngineError> {
            self.record(Call::Crop(x, y, width, height));
            if x + width > image.width || y + height > image.height {
                return Err(EngineError::OutOfBounds {
                    x,
                    y,
                    width,
                    height,
                    image_width: image.width,
                    image_height: image.height,
                });
            }
            Ok(StubImage { width, height })
        }

        fn gaussian_blur(&self, _image: &mut StubImage, radius: f32) {
            self.record(Call::GaussianBlur(radius));
        }

        fn box_blur(&self, _image: &mut StubImage) {
            self.record(Call::BoxBlur);
        }

        fn sharpen(&self, _image: &mut StubImage) {
            self.record(Call::Sharpen);
        }

        fn noise_reduction(&self, _image: &mut StubImage) {
            self.record(Call::NoiseReduction);
        }

        fn inc_brightness(&self, _image: &mut StubImage, amount: u8) {
            self.record(Call::IncBrightness(amount));
        }

        fn darken_hsl(&self, _image: &mut StubImage, level: f32) {
            self.record(Call::Darken(level));
        }

        fn hue_rotate_hsl(&self, _image: &mut StubImage, turns: f32) {
            self.record(Call::HueRotate(turns));
        }

        fn saturate_hsl(&self, _image: &mut StubImage, level: f32) {
            self.record(Call::Saturate(level));
        }

        fn desaturate_hsl(&self, _image: &mut StubImage, level: f32) {
            self.record(Call::Desaturate(level));
        }

        fn tint(&self, _image: &mut StubImage, r: u8, g: u8, b: u8) {
            self.record(Call::Tint(r, g, b));
        }

        fn grayscale_shades(&self, _image: &mut StubImage, shades: u8) {
            self.record(Call::Grayscale(shades));
        }

        fn encode(
            &self,
            _image: &StubImage,
            _format: OutputFormat,
            _quality: u8,
        ) -> Result<Vec<u8>, EngineError> {
            Ok(Vec::new())
        }
    }

    fn run(spec: &TransformSpec, width: u32, height: u32) -> (Result<StubImage, ProcessingError>, Vec<Call>) {
        let engine = RecordingEngine::default();
        let result = TransformPipeline::new(&engine).execute(StubImage { width, height }, spec);
        (result, engine.calls())
    }

    fn spec() -> TransformSpec {
        TransformSpec::for_url("/a.png")
    }

    #[test]
    fn test_stage_names_are_unique() {
        let mut names: Vec<_> = PIPELINE_STAGES.iter().map(|s| s.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), PIPELINE_STAGES.len());
    }

    #[test]
    fn test_empty_spec_makes_no_calls() {
        let (result, calls) = run(&spec(), 100, 100);
        assert_eq!(result.unwrap(), StubImage { width: 100, height: 100 });
        assert!(calls.is_empty());
    }

    #[test]
    fn test_stages_run_in_fixed_order() {
        let mut spec = spec();
        spec.grayscale_shades = Some(4);
        spec.tint_color = Some(Rgba::opaque(1, 2, 3));
        spec.saturation = Some(-20);
        spec.hue_shift = Some(50);
        spec.brightness = Some(10);
        spec.noise_reduction = true;
        spec.sharpen = true;
        spec.blur_kind = Some(BlurKind::Box);
        spec.crop_rect = Some(CropRect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        });
        spec.rotation_degrees = Some(90);
        spec.padding = Some(Padding::uniform(2.0));
        spec.flip_vertical = true;
        spec.flip_horizontal = true;
        spec.target_width = Some(50);

        let (result, calls) = run(&spec, 100, 80);
        assert_eq!(result.unwrap(), StubImage { width: 10, height: 10 });
        assert_eq!(
            calls,
            vec![
                Call::Resize(50, 40),
                Call::FlipH,
                Call::FlipV,
                Call::PadUniform(2),
                Call::Rotate(90.0),
                Call::Crop(0, 0, 10, 10),
                Call::BoxBlur,
                Call::Sharpen,
                Call::NoiseReduction,
                Call::IncBrightness(10),
                Call::HueRotate(0.5),
                Call::Desaturate(0.2),
                Call::Tint(1, 2, 3),
                Call::Grayscale(4),
            ]
        );
    }

    #[test]
    fn test_brightness_sign_picks_operation() {
        let mut spec = spec();
        spec.brightness = Some(50);
        assert_eq!(run(&spec, 10, 10).1, vec![Call::IncBrightness(50)]);

        spec.brightness = Some(-50);
        assert_eq!(run(&spec, 10, 10).1, vec![Call::Darken(0.5)]);
    }

    #[test]
    fn test_saturation_sign_picks_operation() {
        let mut spec = spec();
        spec.saturation = Some(30);
        assert_eq!(run(&spec, 10, 10).1, vec![Call::Saturate(0.3)]);
    }

    #[test]
    fn test_neutral_values_are_skipped() {
        let mut spec = spec();
        spec.rotation_degrees = Some(0);
        spec.brightness = Some(0);
        spec.hue_shift = Some(0);
        spec.saturation = Some(0);
        spec.grayscale_shades = Some(0);
        spec.padding = Some(Padding::uniform(0.0));
        assert!(run(&spec, 10, 10).1.is_empty());
    }

    #[test]
    fn test_gaussian_blur_uses_radius() {
        let mut spec = spec();
        spec.blur_kind = Some(BlurKind::Gaussian);
        assert_eq!(run(&spec, 10, 10).1, vec![Call::GaussianBlur(1.0)]);

        spec.blur_radius = 3.5;
        assert_eq!(run(&spec, 10, 10).1, vec![Call::GaussianBlur(3.5)]);
    }

    #[test]
    fn test_uneven_padding_pads_each_nonzero_side() {
        let mut spec = spec();
        spec.padding = Some(Padding {
            top: 1.0,
            right: 0.0,
            bottom: 3.7,
            left: 4.0,
        });
        let (result, calls) = run(&spec, 10, 10);
        assert_eq!(
            calls,
            vec![
                Call::PadSide(Side::Top, 1),
                Call::PadSide(Side::Bottom, 3),
                Call::PadSide(Side::Left, 4),
            ]
        );
        assert_eq!(result.unwrap(), StubImage { width: 14, height: 14 });
    }

    #[test]
    fn test_contain_with_letterbox_reaches_target() {
        let mut spec = spec();
        spec.target_width = Some(500);
        spec.target_height = Some(500);
        spec.fit_policy = FitPolicy::Contain;
        spec.letterbox_color = Some(Rgba::BLACK);

        let (result, calls) = run(&spec, 1000, 500);
        assert_eq!(
            calls,
            vec![
                Call::Resize(500, 250),
                Call::PadSide(Side::Top, 125),
                Call::PadSide(Side::Bottom, 125),
            ]
        );
        assert_eq!(result.unwrap(), StubImage { width: 500, height: 500 });
    }

    #[test]
    fn test_contain_without_letterbox_keeps_aspect() {
        let mut spec = spec();
        spec.target_width = Some(500);
        spec.target_height = Some(500);
        spec.fit_policy = FitPolicy::Contain;

        let (result, calls) = run(&spec, 1000, 500);
        assert_eq!(calls, vec![Call::Resize(500, 250)]);
        assert_eq!(result.unwrap(), StubImage { width: 500, height: 250 });
    }

    #[test]
    fn test_cover_center_crops() {
        let mut spec = spec();
        spec.target_width = Some(500);
        spec.target_height = Some(500);

        let (result, calls) = run(&spec, 1000, 500);
        assert_eq!(calls, vec![Call::Crop(250, 0, 500, 500)]);
        assert_eq!(result.unwrap(), StubImage { width: 500, height: 500 });

        let (_, calls) = run(&spec, 2000, 1000);
        assert_eq!(calls, vec![Call::Resize(1000, 500), Call::Crop(250, 0, 500, 500)]);
    }

    #[test]
    fn test_crop_outside_bounds_names_stage() {
        let mut spec = spec();
        spec.crop_rect = Some(CropRect {
            x: 50.0,
            y: 0.0,
            width: 100.0,
            height: 10.0,
        });
        let (result, _) = run(&spec, 100, 100);
        match result.unwrap_err() {
            ProcessingError::Engine { stage, source } => {
                assert_eq!(stage, "crop");
                assert!(matches!(source, EngineError::OutOfBounds { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_crop_runs_after_rotation() {
        let mut spec = spec();
        spec.rotation_degrees = Some(90);
        spec.crop_rect = Some(CropRect {
            x: 0.0,
            y: 0.0,
            width: 20.0,
            height: 90.0,
        });
        // 100x30 rotated is 30x100, so a 90px tall crop fits
        let (result, _) = run(&spec, 100, 30);
        assert_eq!(result.unwrap(), StubImage { width: 20, height: 90 });
    }
}
