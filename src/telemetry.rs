//! Logging setup
//!
//! Installs a global `tracing` subscriber writing to stderr. `RUST_LOG` takes
//! precedence over the configured level; `--verbose` forces `debug`.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

/// Filter directive for the configured level, applied to this crate and the
/// HTTP tracing layer; dependencies stay at `warn`
#[must_use]
pub fn filter_directive(level: &str, verbose: bool) -> String {
    let level = if verbose { "debug" } else { level };
    format!("warn,travel_advisor={level},tower_http={level}")
}

pub fn init(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(&config.level, verbose)))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    Ok(())
}
