pub mod config;
pub mod error;

pub use config::{
    Config, DefaultLocationConfig, DeviceLocationConfig, EndpointsConfig, InsightsConfig,
    TemperatureUnit, ValidationResult, WeatherConfig,
};
pub use error::{AppError, ConfigError, GenerativeError, WeatherError};

use anyhow::Result;

/// Initialize logging for the dashboard host
pub fn init() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    tracing::info!("WeatherCatch core initialized");
    Ok(())
}
