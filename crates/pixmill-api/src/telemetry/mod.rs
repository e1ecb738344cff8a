//! Tracing setup

use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

const DEFAULT_FILTER: &str = "pixmill=debug,tower_http=debug";

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the default filter. With `LOG_FORMAT=json` events are
/// written as JSON lines, otherwise in the compact console format.
pub fn init_telemetry(environment: &str) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()?;
    } else {
        let console_fmt = tracing_subscriber::fmt::layer().event_format(
            Format::default()
                .compact()
                .with_target(false)
                .without_time(),
        );
        tracing_subscriber::registry()
            .with(filter)
            .with(console_fmt)
            .try_init()?;
    }

    tracing::info!(environment, json, "Tracing initialized");
    Ok(())
}
