//! Tracing subscriber setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins over the configured level; `verbose` raises the crate's
/// own events to `debug`. Calling this twice is harmless: the second
/// install is ignored.
pub fn init_logging(config: &LoggingConfig, verbose: bool) {
    let level = if verbose {
        format!("{},nanobanana=debug", config.level)
    } else {
        config.level.clone()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.format == "json" {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true).with_writer(std::io::stderr)).try_init()
    };

    if installed.is_ok() {
        tracing::debug!(level = %level, format = %config.format, "logging initialized");
    }
}
