//! OpenAPI documentation

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers;
use pixmill_core::{BlurKind, FitPolicy, OutputFormat};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pixmill API",
        version = "0.1.0",
        description = "On-the-fly image transformation. GET /api/image fetches the image at `url`, applies the requested resize, geometry, filter and color operations in a fixed order, and returns it as webp, jpeg or png."
    ),
    paths(
        handlers::image::transform_image,
        handlers::health::health_check,
    ),
    components(schemas(
        ErrorResponse,
        handlers::health::HealthResponse,
        OutputFormat,
        FitPolicy,
        BlurKind,
    )),
    tags(
        (name = "images", description = "Image transformation"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;
