//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use pixmill_core::transform_url::TRANSFORM_PATH;
use pixmill_core::Config;
use std::sync::Arc;
use std::time::Duration;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    tracing::info!(
        http_concurrency_limit = config.http_concurrency_limit(),
        request_timeout_secs = config.request_timeout_secs(),
        "HTTP layers configured"
    );

    let app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(TRANSFORM_PATH, get(handlers::image::transform_image))
        .with_state(state)
        .merge(RapiDoc::with_openapi(OPENAPI_PATH, ApiDoc::openapi()).path("/docs"))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(ConcurrencyLimitLayer::new(config.http_concurrency_limit()))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.request_timeout_secs(),
                ))),
        );

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        if config.is_production() {
            return Err(anyhow::anyhow!("CORS_ORIGINS cannot be '*' in production"));
        }
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}
