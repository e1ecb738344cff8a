use crate::error::{ErrorResponse, HttpAppError};
use crate::fetch::{is_image, resolve_source_url};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use pixmill_core::{AppError, TransformSpec};
use std::collections::HashMap;
use std::sync::Arc;

const PASSTHROUGH_CONTENT_TYPE: &str = "image/jpeg";

#[utoipa::path(
    get,
    path = "/api/image",
    tag = "images",
    params(
        ("url" = String, Query, description = "Source image URL, absolute or site-relative"),
        ("format" = Option<String>, Query, description = "Output format: webp, jpeg or png"),
        ("jpeg_quality" = Option<u8>, Query, description = "JPEG quality 1-100 (default 100)"),
        ("width" = Option<u32>, Query, description = "Target width 1-5000"),
        ("height" = Option<u32>, Query, description = "Target height 1-5000"),
        ("fit" = Option<String>, Query, description = "contain, cover (default), fill, none or scale-down"),
        ("fit_cover_letterbox_color" = Option<String>, Query, description = "Letterbox color for fit=contain"),
        ("fliph" = Option<bool>, Query, description = "Flip horizontally"),
        ("flipv" = Option<bool>, Query, description = "Flip vertically"),
        ("padding" = Option<String>, Query, description = "1 to 4 comma-separated amounts (top,right,bottom,left)"),
        ("padding_color" = Option<String>, Query, description = "Padding color (default black)"),
        ("rotate" = Option<u16>, Query, description = "Clockwise rotation in degrees, 0-360"),
        ("crop" = Option<String>, Query, description = "x,y,width,height"),
        ("blur" = Option<String>, Query, description = "gaussian or box"),
        ("blur_radius" = Option<f32>, Query, description = "Gaussian blur radius 0-100 (default 1)"),
        ("sharpen" = Option<bool>, Query, description = "Sharpen"),
        ("noise_reduction" = Option<bool>, Query, description = "3x3 median filter"),
        ("brightness" = Option<i32>, Query, description = "-100 to 100"),
        ("hue" = Option<i32>, Query, description = "0-100, share of a full hue turn"),
        ("saturation" = Option<i32>, Query, description = "-100 to 100"),
        ("tint" = Option<String>, Query, description = "Tint color; its RGB channels are added"),
        ("grayscale" = Option<u8>, Query, description = "Number of gray shades 0-100")
    ),
    responses(
        (status = 200, description = "Transformed image", content_type = "image/*"),
        (status = 400, description = "Invalid parameters, unreachable source or failed operation", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip_all,
    fields(url = %params.get("url").map(String::as_str).unwrap_or_default())
)]
pub async fn transform_image(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, HttpAppError> {
    let spec = TransformSpec::from_query(&params).map_err(AppError::from)?;

    let request_host = headers.get(header::HOST).and_then(|h| h.to_str().ok());
    let url = resolve_source_url(&spec.source_url, state.config.public_origin(), request_host)?;

    let source = state.fetcher.fetch(&url).await?;
    if !is_image(source.content_type.as_deref(), &url) {
        return Err(AppError::NotAnImage(
            source
                .content_type
                .unwrap_or_else(|| "unknown content type".to_string()),
        )
        .into());
    }

    let cache_control = state.config.cache_control_header();

    if !spec.has_transformations() {
        tracing::debug!("No transformations requested, passing source through");
        let content_type = source
            .content_type
            .unwrap_or_else(|| PASSTHROUGH_CONTENT_TYPE.to_string());
        return build_response(
            Response::builder()
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CACHE_CONTROL, cache_control)
                .header(header::CONTENT_LENGTH, source.bytes.len()),
            Body::from(source.bytes),
        );
    }

    let transformer = state.transformer.clone();
    let source_content_type = source.content_type;
    let source_bytes = source.bytes;
    let output = tokio::task::spawn_blocking(move || {
        transformer.transform(&source_bytes, &spec, source_content_type.as_deref())
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Transform task failed to complete");
        AppError::Internal(e.to_string())
    })??;

    tracing::info!(
        format = %output.format,
        width = output.width,
        height = output.height,
        bytes = output.data.len(),
        "Image transformed"
    );

    build_response(
        Response::builder()
            .header(header::CONTENT_TYPE, output.content_type())
            .header(header::CACHE_CONTROL, cache_control)
            .header(header::CONTENT_LENGTH, output.data.len())
            .header("x-image-width", output.width)
            .header("x-image-height", output.height),
        Body::from(output.data),
    )
}

fn build_response(
    builder: axum::http::response::Builder,
    body: Body,
) -> Result<Response, HttpAppError> {
    builder.status(StatusCode::OK).body(body).map_err(|e| {
        tracing::error!(error = %e, "Failed to build response");
        AppError::Internal(e.to_string()).into()
    })
}
