//! Logging setup for test suites driving the library

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::SessionConfig;
use crate::{Error, Result};

/// Install a global fmt subscriber.
///
/// `RUST_LOG` wins over `config.log_level`. Fails if the level does not parse
/// or a global subscriber is already installed.
pub fn init_tracing(config: &SessionConfig) -> Result<()> {
    let level: Level = config
        .log_level
        .parse()
        .map_err(|_| Error::configuration(format!("Invalid log level '{}'", config.log_level)))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string())))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| Error::configuration(format!("Failed to install tracing subscriber: {}", e)))
}
