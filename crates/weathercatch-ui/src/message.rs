//! Messages processed by the controller loop.

use chrono::{DateTime, Local};
use weathercatch_insights::MovieSuggestion;
use weathercatch_weather::{
    Coordinates, DisplayUnit, FetchError, LocationError, PlaceSuggestion, WeatherSnapshot,
};

/// User intents, sent through a [`crate::ControllerHandle`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    InitialLoad,
    SetLocation {
        latitude: f64,
        longitude: f64,
        name: Option<String>,
    },
    SetUnit(DisplayUnit),
    Retry,
    SetSearchQuery(String),
    SelectSuggestion(usize),
    Shutdown,
}

/// Everything the controller reacts to. Task results carry the tag they were
/// issued under so stale completions can be recognised and dropped.
#[derive(Debug)]
pub enum ControllerMessage {
    Command(Command),
    DeviceLocation(Result<Coordinates, LocationError>),
    WeatherFetched {
        generation: u64,
        result: Result<WeatherSnapshot, FetchError>,
    },
    PlaceNameResolved {
        generation: u64,
        name: String,
    },
    InsightReady {
        generation: u64,
        request: u64,
        unit: DisplayUnit,
        text: String,
    },
    MoviesReady {
        generation: u64,
        movies: Vec<MovieSuggestion>,
    },
    SearchTimerFired {
        seq: u64,
        query: String,
    },
    SuggestionsReady {
        seq: u64,
        suggestions: Vec<PlaceSuggestion>,
    },
    Tick(DateTime<Local>),
}

impl ControllerMessage {
    /// True for completions of tasks the controller counts as in flight.
    pub fn completes_task(&self) -> bool {
        matches!(
            self,
            Self::DeviceLocation(_)
                | Self::WeatherFetched { .. }
                | Self::PlaceNameResolved { .. }
                | Self::InsightReady { .. }
                | Self::MoviesReady { .. }
                | Self::SuggestionsReady { .. }
        )
    }
}
