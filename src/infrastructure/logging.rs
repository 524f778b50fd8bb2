use anyhow::Context;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::{LogFormat, LoggingConfig};

/// Install the global subscriber
///
/// Output goes to stderr; stdout carries the command's JSON result.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(&config.level, env_directives.as_deref())?;

    let json_layer = (config.format == LogFormat::Json).then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(false)
            .with_span_events(FmtSpan::CLOSE)
    });
    let pretty_layer = (config.format == LogFormat::Pretty).then(|| {
        fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()
        .context("Failed to install the tracing subscriber")?;

    tracing::debug!(level = %config.level, format = ?config.format, "Logging initialized");
    Ok(())
}

/// `RUST_LOG` directives win over the configured level when set
fn build_filter(level: &str, env_directives: Option<&str>) -> anyhow::Result<EnvFilter> {
    match env_directives.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("Invalid {} directives '{}'", EnvFilter::DEFAULT_ENV, directives)),
        None => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid logging.level '{}'", level)),
    }
}
