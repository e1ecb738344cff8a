//! Source image fetching

use crate::utils::url_guard::{check_literal, check_url, SourcePolicy};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use pixmill_core::{AppError, Config};
use reqwest::{header, redirect, Url};
use std::time::Duration;

const MAX_REDIRECTS: usize = 5;
const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

#[derive(Debug, Clone)]
pub struct FetchedSource {
    pub bytes: Bytes,
    /// `Content-Type` without parameters, when the source sent one
    pub content_type: Option<String>,
}

#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedSource, AppError>;
}

/// Fetches sources over HTTP(S) with a timeout, a size cap and URL safety checks.
pub struct HttpSourceFetcher {
    client: reqwest::Client,
    policy: SourcePolicy,
    max_bytes: usize,
}

impl HttpSourceFetcher {
    pub fn from_config(config: &Config) -> Result<Self, anyhow::Error> {
        let policy = SourcePolicy {
            allow_private: config.allow_private_sources(),
            allowlist: config.source_allowlist().map(<[String]>::to_vec),
        };

        let redirect_policy = policy.clone();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs()))
            .redirect(redirect::Policy::custom(move |attempt| {
                if attempt.previous().len() >= MAX_REDIRECTS {
                    attempt.error("too many redirects")
                } else if let Err(e) = check_literal(attempt.url(), &redirect_policy) {
                    attempt.error(e)
                } else {
                    attempt.follow()
                }
            }))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            policy,
            max_bytes: config.max_source_bytes(),
        })
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedSource, AppError> {
        check_url(url, &self.policy).await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "Source URL rejected");
            AppError::Fetch(e.to_string())
        })?;

        let mut response = self.client.get(url.clone()).send().await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "Failed to fetch source");
            AppError::Fetch(e.to_string())
        })?;

        if !response.status().is_success() {
            return Err(AppError::Fetch(format!(
                "source returned status {}",
                response.status()
            )));
        }

        if let Some(length) = response.content_length() {
            if length as usize > self.max_bytes {
                return Err(AppError::Fetch(format!(
                    "source is {} bytes, limit is {}",
                    length, self.max_bytes
                )));
            }
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_string())
            .filter(|ct| !ct.is_empty());

        let bytes = read_body(&mut response, self.max_bytes).await?;

        tracing::debug!(
            url = %url,
            bytes = bytes.len(),
            content_type = content_type.as_deref().unwrap_or("-"),
            "Fetched source image"
        );

        Ok(FetchedSource {
            bytes,
            content_type,
        })
    }
}

/// Read the body chunk by chunk, failing as soon as it passes `max_bytes`.
/// Covers chunked responses that announce no `Content-Length`.
async fn read_body(response: &mut reqwest::Response, max_bytes: usize) -> Result<Bytes, AppError> {
    let mut body = BytesMut::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| AppError::Fetch(format!("failed to read body: {}", e)))?
    {
        if body.len() + chunk.len() > max_bytes {
            return Err(AppError::Fetch(format!(
                "source exceeds the {} byte limit",
                max_bytes
            )));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body.freeze())
}

/// Turn the `url` parameter into an absolute URL.
///
/// Absolute URLs are used as-is. Anything else is resolved against
/// `public_origin`, or against `http://{host}` from the request.
pub fn resolve_source_url(
    raw: &str,
    public_origin: Option<&str>,
    request_host: Option<&str>,
) -> Result<Url, AppError> {
    if let Ok(url) = Url::parse(raw) {
        return Ok(url);
    }

    let base = match (public_origin, request_host) {
        (Some(origin), _) => origin.to_string(),
        (None, Some(host)) => format!("http://{}", host),
        (None, None) => {
            return Err(AppError::Fetch(format!(
                "cannot resolve relative url '{}' without an origin",
                raw
            )))
        }
    };

    Url::parse(&base)
        .and_then(|base| base.join(raw))
        .map_err(|e| AppError::Fetch(format!("invalid url '{}': {}", raw, e)))
}

/// An image by content type, or by file extension when the type says otherwise.
pub fn is_image(content_type: Option<&str>, url: &Url) -> bool {
    if content_type.is_some_and(|ct| ct.to_ascii_lowercase().starts_with("image")) {
        return true;
    }
    url.path()
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}
