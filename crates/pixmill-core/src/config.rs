//! Configuration module
//!
//! Settings are read from the environment (a `.env` file is loaded first when
//! present). Every value has a default so the service starts with no
//! configuration at all.

use std::env;

const SERVER_PORT: u16 = 3000;
const FETCH_TIMEOUT_SECS: u64 = 30;
const REQUEST_TIMEOUT_SECS: u64 = 60;
const HTTP_CONCURRENCY_LIMIT: usize = 1024;
const MAX_SOURCE_SIZE_MB: usize = 25;
/// 30 days, matching `s-maxage=2592000`
const CACHE_MAX_AGE_SECS: u64 = 2_592_000;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub http_concurrency_limit: usize,
    pub cache_max_age_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SourceConfig {
    /// Origin used to resolve site-relative `url` values (e.g. `https://example.com`).
    /// When unset, the request's `Host` header is used.
    pub public_origin: Option<String>,
    pub fetch_timeout_secs: u64,
    pub max_source_bytes: usize,
    /// If set, only these hosts (and their subdomains) may be fetched
    pub source_allowlist: Option<Vec<String>>,
    pub allow_private_sources: bool,
}

#[derive(Clone, Debug)]
pub struct TransformServiceConfig {
    pub server: ServerConfig,
    pub source: SourceConfig,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<TransformServiceConfig>);

impl Config {
    fn inner(&self) -> &TransformServiceConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = TransformServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.inner().server.environment)
    }

    pub fn server_port(&self) -> u16 {
        self.inner().server.server_port
    }

    pub fn environment(&self) -> &str {
        &self.inner().server.environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().server.cors_origins
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.inner().server.request_timeout_secs
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.inner().server.http_concurrency_limit
    }

    pub fn cache_max_age_secs(&self) -> u64 {
        self.inner().server.cache_max_age_secs
    }

    pub fn public_origin(&self) -> Option<&str> {
        self.inner().source.public_origin.as_deref()
    }

    pub fn fetch_timeout_secs(&self) -> u64 {
        self.inner().source.fetch_timeout_secs
    }

    pub fn max_source_bytes(&self) -> usize {
        self.inner().source.max_source_bytes
    }

    pub fn source_allowlist(&self) -> Option<&[String]> {
        self.inner().source.source_allowlist.as_deref()
    }

    pub fn allow_private_sources(&self) -> bool {
        self.inner().source.allow_private_sources
    }

    /// `Cache-Control` value for transformed and passed-through images
    pub fn cache_control_header(&self) -> String {
        format!("public, s-maxage={}", self.cache_max_age_secs())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config(Box::new(TransformServiceConfig::default()))
    }
}

impl Default for TransformServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                server_port: SERVER_PORT,
                environment: "development".to_string(),
                cors_origins: vec!["*".to_string()],
                request_timeout_secs: REQUEST_TIMEOUT_SECS,
                http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
                cache_max_age_secs: CACHE_MAX_AGE_SECS,
            },
            source: SourceConfig {
                public_origin: None,
                fetch_timeout_secs: FETCH_TIMEOUT_SECS,
                max_source_bytes: MAX_SOURCE_SIZE_MB * 1024 * 1024,
                source_allowlist: None,
                allow_private_sources: false,
            },
        }
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl TransformServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let server = ServerConfig {
            server_port: env::var("PORT")
                .or_else(|_| env::var("SERVER_PORT"))
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .unwrap_or(SERVER_PORT),
            cors_origins: parse_list(&cors_origins_str),
            environment,
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| REQUEST_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(REQUEST_TIMEOUT_SECS),
            http_concurrency_limit: env::var("HTTP_CONCURRENCY_LIMIT")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(HTTP_CONCURRENCY_LIMIT)
                .max(1),
            cache_max_age_secs: env::var("CACHE_MAX_AGE_SECS")
                .unwrap_or_else(|_| CACHE_MAX_AGE_SECS.to_string())
                .parse()
                .unwrap_or(CACHE_MAX_AGE_SECS),
        };

        let max_source_size_mb = env::var("MAX_SOURCE_SIZE_MB")
            .unwrap_or_else(|_| MAX_SOURCE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_SOURCE_SIZE_MB);

        let source = SourceConfig {
            public_origin: env::var("PUBLIC_ORIGIN")
                .ok()
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty()),
            fetch_timeout_secs: env::var("FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| FETCH_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(FETCH_TIMEOUT_SECS),
            max_source_bytes: max_source_size_mb * 1024 * 1024,
            source_allowlist: env::var("SOURCE_ALLOWLIST")
                .ok()
                .map(|s| parse_list(&s))
                .filter(|list| !list.is_empty()),
            allow_private_sources: env::var("ALLOW_PRIVATE_SOURCES")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
        };

        let config = Self { server, source };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server.server_port == 0 {
            return Err(anyhow::anyhow!("SERVER_PORT must be greater than 0"));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("REQUEST_TIMEOUT_SECS must be greater than 0"));
        }
        if self.source.fetch_timeout_secs == 0 {
            return Err(anyhow::anyhow!("FETCH_TIMEOUT_SECS must be greater than 0"));
        }
        if self.source.max_source_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_SOURCE_SIZE_MB must be greater than 0"));
        }
        if let Some(origin) = &self.source.public_origin {
            if !origin.starts_with("http://") && !origin.starts_with("https://") {
                return Err(anyhow::anyhow!(
                    "PUBLIC_ORIGIN must start with http:// or https://, got '{}'",
                    origin
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server_port(), 3000);
        assert_eq!(config.cache_control_header(), "public, s-maxage=2592000");
        assert_eq!(config.max_source_bytes(), 25 * 1024 * 1024);
        assert!(!config.allow_private_sources());
        assert!(config.source_allowlist().is_none());
        assert!(!config.is_production());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_origin() {
        let mut inner = TransformServiceConfig::default();
        inner.source.public_origin = Some("example.com".to_string());
        assert!(Config(Box::new(inner)).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut inner = TransformServiceConfig::default();
        inner.source.fetch_timeout_secs = 0;
        assert!(inner.validate().is_err());
    }

    #[test]
    fn test_parse_list_trims_and_drops_empty() {
        assert_eq!(
            parse_list(" a.com, ,b.com ,"),
            vec!["a.com".to_string(), "b.com".to_string()]
        );
    }
}
