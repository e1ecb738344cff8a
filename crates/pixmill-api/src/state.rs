//! Shared application state

use crate::fetch::SourceFetcher;
use pixmill_core::Config;
use pixmill_processing::ImageTransformer;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub fetcher: Arc<dyn SourceFetcher>,
    pub transformer: ImageTransformer,
}

impl AppState {
    pub fn new(config: Config, fetcher: Arc<dyn SourceFetcher>) -> Self {
        Self {
            config,
            fetcher,
            transformer: ImageTransformer::new(),
        }
    }
}
