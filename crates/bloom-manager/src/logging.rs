//! Tracing subscriber setup.

use bloom_core::config::ManagerConfig;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Install a global subscriber filtered by `RUST_LOG`, falling back to
/// `level`. `format` is "json" or anything else for text.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_logging(level: &str, format: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let result = if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true))
            .try_init()
    };
    result.is_ok()
}

/// [`init_logging`] with the level and format from `config`.
pub fn init_from_config(config: &ManagerConfig) -> bool {
    init_logging(&config.log_level, &config.log_format)
}
