//! Test helpers: build the router around an in-memory source fetcher.
//!
//! Run from workspace root: `cargo test -p pixmill-api`.

#![allow(dead_code)]

pub mod fixtures;

use async_trait::async_trait;
use axum_test::TestServer;
use bytes::Bytes;
use pixmill_api::setup::routes;
use pixmill_api::{AppState, FetchedSource, SourceFetcher};
use pixmill_core::config::TransformServiceConfig;
use pixmill_core::{AppError, Config};
use reqwest::Url;
use std::collections::HashMap;
use std::sync::Arc;

pub const PUBLIC_ORIGIN: &str = "http://assets.test";

/// Serves registered sources by URL path; anything else fails like a 404.
#[derive(Default)]
pub struct StubFetcher {
    sources: HashMap<String, FetchedSource>,
}

impl StubFetcher {
    pub fn with_source(mut self, path: &str, data: Vec<u8>, content_type: Option<&str>) -> Self {
        self.sources.insert(
            path.to_string(),
            FetchedSource {
                bytes: Bytes::from(data),
                content_type: content_type.map(String::from),
            },
        );
        self
    }
}

#[async_trait]
impl SourceFetcher for StubFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedSource, AppError> {
        self.sources
            .get(url.path())
            .cloned()
            .ok_or_else(|| AppError::Fetch(format!("{} returned status 404", url)))
    }
}

pub fn test_config() -> Config {
    let mut inner = TransformServiceConfig::default();
    inner.source.public_origin = Some(PUBLIC_ORIGIN.to_string());
    Config(Box::new(inner))
}

/// Sources available to every test
pub fn default_fetcher() -> StubFetcher {
    StubFetcher::default()
        .with_source("/photos/wide.png", fixtures::gradient_png(1000, 500), Some("image/png"))
        .with_source("/photos/small.png", fixtures::solid_png(40, 20), Some("image/png"))
        .with_source("/photos/untyped.png", fixtures::solid_png(8, 8), None)
        .with_source("/photos/strip.png", fixtures::solid_png(1, 5000), Some("image/png"))
        .with_source("/page.html", b"<html></html>".to_vec(), Some("text/html"))
}

pub fn setup_test_server() -> TestServer {
    setup_test_server_with(default_fetcher())
}

pub fn setup_test_server_with(fetcher: StubFetcher) -> TestServer {
    let config = test_config();
    let state = Arc::new(AppState::new(config.clone(), Arc::new(fetcher)));
    let router = routes::setup_routes(&config, state).expect("build router");
    TestServer::new(router).expect("start test server")
}
