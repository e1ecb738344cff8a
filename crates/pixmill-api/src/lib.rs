//! Pixmill HTTP API
//!
//! Handlers, source fetching and application setup for the image transform
//! service.

mod api_doc;
mod handlers;
mod telemetry;
mod utils;

pub mod error;
pub mod fetch;
pub mod setup;
pub mod state;

pub use api_doc::ApiDoc;
pub use error::{ErrorResponse, HttpAppError};
pub use fetch::{FetchedSource, HttpSourceFetcher, SourceFetcher};
pub use state::AppState;
