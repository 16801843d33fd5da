//! Tracing and structured logging

use tracing_subscriber::EnvFilter;

use crate::{config::Config, error::Result};

/// Initialize JSON-formatted tracing using the configured log level
///
/// `RUST_LOG` is not consulted; the filter comes from `service.log_level`,
/// which itself can be overridden through `USERS_SERVICE__LOG_LEVEL`.
pub fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(&config.service.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| crate::error::Error::Internal(format!("Failed to install tracing subscriber: {}", e)))?;

    tracing::info!(
        service = %config.service.name,
        environment = %config.service.environment,
        "Tracing initialized"
    );

    Ok(())
}

/// Flush and shut down tracing
pub fn shutdown_tracing() {
    tracing::info!("Tracing shutdown complete");
}
