//! Tracing subscriber setup.
//!
//! Binaries call [`init_tracing`] once, early in `main()`. Library crates only
//! emit `tracing` events and never install a subscriber themselves.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, LoggingConfig};

/// Builds the `EnvFilter`, preferring `RUST_LOG` over the configured directive.
#[must_use]
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter))
}

/// Installs the global tracing subscriber.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let registry = tracing_subscriber::registry().with(env_filter(config));

    let installed = match config.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init()
            .is_ok(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true))
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::debug!(format = ?config.format, "tracing initialized");
    }
    installed
}
