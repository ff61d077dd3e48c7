//! Subscriber construction from an explicit [`LogConfig`].
//!
//! Building and installing are separate so tests can run a subscriber with
//! `tracing::subscriber::with_default` instead of process-wide state.

use pricecache_core::LogConfig;
use tracing::Subscriber;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Build a formatting subscriber for `config` without installing it.
pub fn subscriber(config: &LogConfig) -> Result<impl Subscriber + Send + Sync + 'static, ParseError> {
    let filter = EnvFilter::try_new(&config.filter)?;
    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .with_ansi(config.ansi)
        .finish())
}

/// Build and install the process-wide subscriber.
pub fn init(config: &LogConfig) -> anyhow::Result<()> {
    tracing::subscriber::set_global_default(subscriber(config)?)?;
    Ok(())
}
