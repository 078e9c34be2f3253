//! Dashboard state as seen by renderers.

use chrono::{DateTime, Local, Utc};
use weathercatch_insights::MovieSuggestion;
use weathercatch_weather::{DisplayUnit, Location, PlaceSuggestion, WeatherSnapshot};

/// Coordinates a retry re-issues, with the name if one was supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryTarget {
    pub latitude: f64,
    pub longitude: f64,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorBanner {
    pub message: String,
    pub retry: RetryTarget,
}

/// One observation converted for display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub time: DateTime<Utc>,
    pub temperature: f64,
    pub rainfall_mm: f64,
    pub unit: DisplayUnit,
}

impl Reading {
    pub fn temperature_label(&self) -> String {
        format!("{:.1}°{}", self.temperature, self.unit.symbol())
    }

    pub fn rainfall_label(&self) -> String {
        format!("{:.1} mm", self.rainfall_mm)
    }
}

/// Change notifications published alongside the state snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    LoadingChanged(bool),
    LocationChanged(Location),
    WeatherUpdated,
    UnitChanged(DisplayUnit),
    ErrorRaised(String),
    ErrorCleared,
    InsightUpdated,
    MoviesUpdated,
    SuggestionsUpdated,
    Tick(DateTime<Local>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub location: Option<Location>,
    pub unit: DisplayUnit,
    pub snapshot: Option<WeatherSnapshot>,
    pub loading: bool,
    pub error: Option<ErrorBanner>,
    /// `None` while pending or stale
    pub insight: Option<String>,
    /// `None` while pending or stale
    pub movies: Option<Vec<MovieSuggestion>>,
    pub search_query: String,
    pub suggestions: Vec<PlaceSuggestion>,
    pub now: Option<DateTime<Local>>,
}

impl DashboardState {
    pub fn current_reading(&self) -> Option<Reading> {
        let observation = self.snapshot.as_ref()?.current()?;
        Some(Reading {
            time: observation.time,
            temperature: self.unit.from_kelvin(observation.temperature_kelvin),
            rainfall_mm: observation.rainfall_mm,
            unit: self.unit,
        })
    }

    /// Current temperature in the active unit
    pub fn display_temperature(&self) -> Option<f64> {
        self.current_reading().map(|r| r.temperature)
    }

    /// Every observation in the active unit, oldest first
    pub fn readings(&self) -> Vec<Reading> {
        let Some(snapshot) = &self.snapshot else {
            return Vec::new();
        };
        snapshot
            .observations()
            .iter()
            .map(|o| Reading {
                time: o.time,
                temperature: self.unit.from_kelvin(o.temperature_kelvin),
                rainfall_mm: o.rainfall_mm,
                unit: self.unit,
            })
            .collect()
    }

    pub fn location_name(&self) -> Option<&str> {
        self.location.as_ref().map(|l| l.display_name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use weathercatch_weather::Observation;

    fn state_with(kelvin: &[f64]) -> DashboardState {
        let observations = kelvin
            .iter()
            .enumerate()
            .map(|(i, k)| Observation {
                time: Utc.with_ymd_and_hms(2024, 1, 1, i as u32, 0, 0).unwrap(),
                temperature_kelvin: *k,
                rainfall_mm: 0.0,
            })
            .collect();
        DashboardState {
            snapshot: Some(WeatherSnapshot::new(observations).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_display_follows_unit() {
        let mut state = state_with(&[300.0]);
        assert!((state.display_temperature().unwrap() - 26.85).abs() < 1e-9);
        assert_eq!(state.current_reading().unwrap().temperature_label(), "26.9°C");

        state.unit = DisplayUnit::Fahrenheit;
        assert!((state.display_temperature().unwrap() - 80.33).abs() < 1e-9);
        assert_eq!(state.current_reading().unwrap().rainfall_label(), "0.0 mm");
    }

    #[test]
    fn test_empty_state_has_no_readings() {
        let state = DashboardState::default();
        assert!(state.current_reading().is_none());
        assert!(state.readings().is_empty());
        assert!(state.location_name().is_none());
    }

    #[test]
    fn test_readings_cover_series() {
        let state = state_with(&[280.0, 290.0, 300.0]);
        let readings = state.readings();
        assert_eq!(readings.len(), 3);
        assert!(readings[0].temperature < readings[2].temperature);
    }
}
