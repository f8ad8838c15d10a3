//! Structured logging with tracing
//!
//! Text or JSON output, filtered by `RUST_LOG` when set and by the configured
//! level otherwise.

use crate::config::{LogFormat, LogLevel, LoggingSettings};
use anyhow::Result;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

/// Filter directives for our crates at `level`
pub fn default_directives(level: LogLevel) -> String {
    let level = level.as_str();
    format!("boatyard_server={level},boatyard_core={level},tower_http={level}")
}

/// Initialize the global subscriber
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(settings: &LoggingSettings) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(settings.level)));

    let subscriber = Registry::default().with(env_filter);

    match settings.format {
        LogFormat::Json => {
            let json_layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_current_span(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true);

            subscriber.with(json_layer).try_init()?;
        }
        LogFormat::Text => {
            let fmt_layer = fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact();

            subscriber.with(fmt_layer).try_init()?;
        }
    }

    tracing::info!(
        "Logging initialized: level={}, format={:?}",
        settings.level.as_str(),
        settings.format
    );

    Ok(())
}
