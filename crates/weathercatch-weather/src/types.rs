use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const KELVIN_OFFSET: f64 = 273.15;

/// Temperature unit used for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl DisplayUnit {
    /// Convert an absolute temperature to this unit.
    pub fn from_kelvin(self, kelvin: f64) -> f64 {
        let celsius = kelvin_to_celsius(kelvin);
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius_to_fahrenheit(celsius),
        }
    }

    /// Single-letter symbol shown after the degree sign
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Celsius => "Celsius",
            Self::Fahrenheit => "Fahrenheit",
        }
    }
}

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// A bare coordinate pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Label used whenever no place name can be resolved, e.g. "20.5937, 78.9629"
    pub fn label(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Geographic location with a human-readable name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, display_name: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            display_name: display_name.into(),
        }
    }
}

/// One timeseries entry as delivered by the weather API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub time: DateTime<Utc>,
    #[serde(rename = "temperature")]
    pub temperature_kelvin: f64,
    #[serde(rename = "rainfall")]
    pub rainfall_mm: f64,
}

impl Observation {
    pub fn is_raining(&self) -> bool {
        self.rainfall_mm > 0.0
    }
}

/// Observations for one location, ordered by time. Index 0 is "current".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    observations: Vec<Observation>,
}

impl WeatherSnapshot {
    /// Build a snapshot, sorting by time. An empty sequence is malformed data.
    pub fn new(mut observations: Vec<Observation>) -> Result<Self, FetchError> {
        if observations.is_empty() {
            return Err(FetchError::DataFormat(
                "timeseries contains no observations".to_string(),
            ));
        }
        observations.sort_by_key(|o| o.time);
        Ok(Self { observations })
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn current(&self) -> Option<&Observation> {
        self.observations.first()
    }

    /// The observation `steps` entries ahead, or the last one if the series is shorter
    pub fn ahead(&self, steps: usize) -> Option<&Observation> {
        self.observations
            .get(steps)
            .or_else(|| self.observations.last())
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Autocomplete candidate from the place search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSuggestion {
    pub display_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

/// Relay and weather fetch errors
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Connection timed out")]
    Timeout,
    #[error("Transport/proxy error: {0}")]
    Transport(String),
    #[error("Relay envelope error: {0}")]
    Envelope(String),
    #[error("Malformed data: {0}")]
    DataFormat(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn observation(hour: u32, kelvin: f64, rain: f64) -> Observation {
        Observation {
            time: Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap(),
            temperature_kelvin: kelvin,
            rainfall_mm: rain,
        }
    }

    #[test]
    fn test_kelvin_to_celsius() {
        assert!((DisplayUnit::Celsius.from_kelvin(300.0) - 26.85).abs() < 1e-9);
        assert!((DisplayUnit::Celsius.from_kelvin(273.15)).abs() < 1e-12);
    }

    #[test]
    fn test_kelvin_to_fahrenheit() {
        assert!((DisplayUnit::Fahrenheit.from_kelvin(300.0) - 80.33).abs() < 1e-9);
        assert!((DisplayUnit::Fahrenheit.from_kelvin(273.15) - 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_conversion_is_monotonic() {
        for unit in [DisplayUnit::Celsius, DisplayUnit::Fahrenheit] {
            let mut previous = f64::NEG_INFINITY;
            for step in 0..=4000 {
                let kelvin = step as f64 * 0.25;
                let value = unit.from_kelvin(kelvin);
                assert!(value > previous, "{:?} not monotonic at {}K", unit, kelvin);
                previous = value;
            }
        }
    }

    #[test]
    fn test_fahrenheit_agrees_with_celsius() {
        for step in 0..=2000 {
            let kelvin = step as f64 * 0.5;
            let via_celsius = celsius_to_fahrenheit(DisplayUnit::Celsius.from_kelvin(kelvin));
            let direct = DisplayUnit::Fahrenheit.from_kelvin(kelvin);
            assert!(
                (via_celsius - direct).abs() < 1e-6,
                "mismatch at {}K: {} vs {}",
                kelvin,
                via_celsius,
                direct
            );
        }
    }

    #[test]
    fn test_unit_default_and_symbols() {
        assert_eq!(DisplayUnit::default(), DisplayUnit::Celsius);
        assert_eq!(DisplayUnit::Fahrenheit.symbol(), "F");
        assert_eq!(DisplayUnit::Celsius.name(), "Celsius");
    }

    #[test]
    fn test_coordinate_label() {
        assert_eq!(Coordinates::new(20.5937, 78.9629).label(), "20.5937, 78.9629");
        assert_eq!(Coordinates::new(-33.86785, 151.20732).label(), "-33.8679, 151.2073");
    }

    #[test]
    fn test_snapshot_sorts_by_time() {
        let snapshot = WeatherSnapshot::new(vec![
            observation(3, 290.0, 0.0),
            observation(1, 280.0, 0.5),
            observation(2, 285.0, 0.0),
        ])
        .unwrap();

        let hours: Vec<f64> = snapshot
            .observations()
            .iter()
            .map(|o| o.temperature_kelvin)
            .collect();
        assert_eq!(hours, vec![280.0, 285.0, 290.0]);
        assert!(snapshot.current().unwrap().is_raining());
    }

    #[test]
    fn test_empty_snapshot_is_data_format_error() {
        let err = WeatherSnapshot::new(Vec::new()).unwrap_err();
        assert!(matches!(err, FetchError::DataFormat(_)));
    }

    #[test]
    fn test_ahead_falls_back_to_last() {
        let snapshot =
            WeatherSnapshot::new(vec![observation(0, 280.0, 0.0), observation(1, 281.0, 0.0)])
                .unwrap();
        assert_eq!(snapshot.ahead(12).unwrap().temperature_kelvin, 281.0);
        assert_eq!(snapshot.ahead(1).unwrap().temperature_kelvin, 281.0);
        assert_eq!(snapshot.ahead(0).unwrap().temperature_kelvin, 280.0);
    }

    #[test]
    fn test_observation_wire_format() {
        let json = r#"{"time":"2024-01-01T00:00:00Z","temperature":300.0,"rainfall":0.0}"#;
        let parsed: Observation = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.temperature_kelvin, 300.0);
        assert_eq!(parsed.rainfall_mm, 0.0);
        assert!(!parsed.is_raining());
    }
}
