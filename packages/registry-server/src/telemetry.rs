//! `tracing-subscriber` initialization.

use serde::Deserialize;
use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Output format of the log sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over `default_level` when set.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(format: LogFormat, default_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    build_subscriber(format, env_filter).try_init()?;

    tracing::debug!(?format, "tracing initialized");
    Ok(())
}

/// Builds the subscriber `init_tracing` installs, without installing it.
#[must_use]
pub fn build_subscriber(
    format: LogFormat,
    env_filter: EnvFilter,
) -> Box<dyn Subscriber + Send + Sync> {
    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Json => Box::new(
            registry.with(fmt::layer().json().with_current_span(true)),
        ),
        LogFormat::Text => Box::new(registry.with(fmt::layer())),
    }
}
