//! Maps service errors to weathercatch_core::AppError for consistent banner text.

use weathercatch_core::{AppError, WeatherError};
use weathercatch_weather::FetchError;

pub fn weather_error(e: FetchError) -> WeatherError {
    match e {
        FetchError::Timeout => WeatherError::TransportTimeout,
        FetchError::Transport(s) => WeatherError::Transport(s),
        FetchError::Envelope(s) => WeatherError::Envelope(s),
        FetchError::DataFormat(s) => WeatherError::DataFormat(s),
    }
}

pub fn app_error(e: FetchError) -> AppError {
    AppError::Weather(weather_error(e))
}

/// Banner text for a failed weather fetch
pub fn banner_message(e: FetchError) -> String {
    app_error(e).banner_message()
}
