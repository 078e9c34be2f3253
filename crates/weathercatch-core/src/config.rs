use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variables checked (in order) for the generative backend key
pub const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote endpoints
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// Weather, geocoding and search settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Generative backend settings
    #[serde(default)]
    pub insights: InsightsConfig,

    /// Point used when device location is unavailable
    #[serde(default)]
    pub default_location: DefaultLocationConfig,

    /// Coordinates reported by the configured location source
    #[serde(default)]
    pub location: DeviceLocationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// CORS relay wrapping responses in a `{ contents }` envelope
    pub relay_url: String,

    /// Timeseries weather API
    pub weather_api_url: String,

    /// Nominatim-compatible place search base URL
    pub geocode_url: String,

    /// Generative backend base URL
    pub generative_url: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            relay_url: "https://api.allorigins.win/get".to_string(),
            weather_api_url: "https://sweatherapi.vercel.app/timeseries".to_string(),
            geocode_url: "https://nominatim.openstreetmap.org".to_string(),
            generative_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }
}

/// Temperature unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Initial display unit
    #[serde(default)]
    pub unit: TemperatureUnit,

    /// Timeout for the weather fetch, in seconds
    #[serde(default = "default_weather_timeout_secs")]
    pub weather_timeout_secs: u64,

    /// Timeout for geocoding and search lookups, in seconds
    #[serde(default = "default_geocode_timeout_secs")]
    pub geocode_timeout_secs: u64,

    /// Idle period before a search lookup fires
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Minimum query length (characters) for a lookup
    #[serde(default = "default_min_query_len")]
    pub min_query_len: usize,

    /// Maximum number of suggestions requested
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: u32,

    /// Clock tick interval
    #[serde(default = "default_clock_interval_ms")]
    pub clock_interval_ms: u64,
}

fn default_weather_timeout_secs() -> u64 {
    20
}

fn default_geocode_timeout_secs() -> u64 {
    10
}

fn default_search_debounce_ms() -> u64 {
    300
}

fn default_min_query_len() -> usize {
    3
}

fn default_suggestion_limit() -> u32 {
    5
}

fn default_clock_interval_ms() -> u64 {
    1000
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            unit: TemperatureUnit::Celsius,
            weather_timeout_secs: default_weather_timeout_secs(),
            geocode_timeout_secs: default_geocode_timeout_secs(),
            search_debounce_ms: default_search_debounce_ms(),
            min_query_len: default_min_query_len(),
            suggestion_limit: default_suggestion_limit(),
            clock_interval_ms: default_clock_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsConfig {
    /// Model name passed to the backend
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_insights_timeout_secs")]
    pub timeout_secs: u64,

    /// API key (environment variables take precedence)
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_insights_timeout_secs() -> u64 {
    30
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            timeout_secs: default_insights_timeout_secs(),
            api_key: None,
        }
    }
}

impl InsightsConfig {
    /// Resolve the API key: environment first, then the config file.
    pub fn resolve_api_key(&self) -> Option<String> {
        API_KEY_ENV_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultLocationConfig {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for DefaultLocationConfig {
    fn default() -> Self {
        Self {
            name: "India".to_string(),
            latitude: 20.5937,
            longitude: 78.9629,
        }
    }
}

/// Device coordinates. Both must be set for the location source to report a fix.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceLocationConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Config {
    /// Load configuration from the default path, falling back to defaults if absent.
    ///
    /// Nothing is ever written back; the dashboard keeps no state across sessions.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, falling back to defaults if absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.endpoints.relay_url, "endpoints.relay_url", &mut result);
        self.validate_url(
            &self.endpoints.weather_api_url,
            "endpoints.weather_api_url",
            &mut result,
        );
        self.validate_url(&self.endpoints.geocode_url, "endpoints.geocode_url", &mut result);
        self.validate_url(
            &self.endpoints.generative_url,
            "endpoints.generative_url",
            &mut result,
        );

        if self.weather.weather_timeout_secs == 0 {
            result.add_error("weather.weather_timeout_secs", "Timeout must be greater than 0");
        }
        if self.weather.geocode_timeout_secs == 0 {
            result.add_error("weather.geocode_timeout_secs", "Timeout must be greater than 0");
        }
        if self.weather.clock_interval_ms == 0 {
            result.add_error("weather.clock_interval_ms", "Clock interval must be greater than 0");
        }
        if self.weather.min_query_len == 0 {
            result.add_warning(
                "weather.min_query_len",
                "Every keystroke will trigger a search lookup",
            );
        }
        if self.insights.timeout_secs == 0 {
            result.add_error("insights.timeout_secs", "Timeout must be greater than 0");
        }

        Self::validate_coordinates(
            self.default_location.latitude,
            self.default_location.longitude,
            "default_location",
            &mut result,
        );

        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lon)) => {
                Self::validate_coordinates(lat, lon, "location", &mut result);
            }
            (None, None) => {}
            _ => result.add_warning(
                "location",
                "Only one coordinate configured - device location will be unavailable",
            ),
        }

        if self.insights.resolve_api_key().is_none() {
            result.add_warning(
                "insights.api_key",
                "No API key configured - insights and movie picks will use fallbacks",
            );
        }

        result
    }

    fn validate_coordinates(lat: f64, lon: f64, field: &str, result: &mut ValidationResult) {
        if !(-90.0..=90.0).contains(&lat) {
            result.add_error(
                format!("{}.latitude", field),
                format!("Latitude out of range: {}", lat),
            );
        }
        if !(-180.0..=180.0).contains(&lon) {
            result.add_error(
                format!("{}.longitude", field),
                format!("Longitude out of range: {}", lon),
            );
        }
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("weathercatch");

        Ok(config_dir.join("config.toml"))
    }
}
