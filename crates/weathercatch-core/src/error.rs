//! Centralized error types for the WeatherCatch dashboard.
//!
//! The weather path is surfaced in the error banner through [`AppError`];
//! the generative path is always absorbed into a fallback and only logged.

use thiserror::Error;

/// Errors surfaced to the dashboard.
///
/// Use `user_message()` to get a UI-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Weather(e) => e.user_message(),
        }
    }

    /// Banner text: the user message followed by the technical detail.
    pub fn banner_message(&self) -> String {
        format!("{} ({})", self.user_message(), self)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

/// Weather path errors. These are the only errors that reach the banner.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Connection timed out")]
    TransportTimeout,

    #[error("Transport/proxy error: {0}")]
    Transport(String),

    #[error("Relay envelope error: {0}")]
    Envelope(String),

    #[error("Malformed weather data: {0}")]
    DataFormat(String),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::TransportTimeout => "The weather service timed out. Please reconnect.",
            WeatherError::Transport(_) => {
                "Unable to reach the weather service. Check your connection and reconnect."
            }
            WeatherError::Envelope(_) => {
                "The weather relay returned an unreadable response. Please reconnect."
            }
            WeatherError::DataFormat(_) => "Received malformed weather data. Please reconnect.",
        }
    }
}

/// Generative backend errors. Logged for diagnostics, never shown as an error state.
#[derive(Debug, Error)]
pub enum GenerativeError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("Backend request failed: {0}")]
    Backend(String),

    #[error("Unparseable backend response: {0}")]
    InvalidResponse(String),
}
