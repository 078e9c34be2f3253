//! In-process doubles for the controller's services. Each one records its
//! calls so tests can assert on request counts and arguments.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use weathercatch_insights::{InsightProvider, MovieProvider, MovieSuggestion};
use weathercatch_ui::{AppController, ControllerServices, ControllerSettings, DashboardEvent};
use weathercatch_weather::{
    Coordinates, DisplayUnit, FetchError, LocationError, LocationSource, Observation, PlaceLookup,
    PlaceSuggestion, WeatherSnapshot, WeatherSource,
};

pub fn snapshot(kelvin: f64, rain: f64) -> WeatherSnapshot {
    WeatherSnapshot::new(vec![Observation {
        time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        temperature_kelvin: kelvin,
        rainfall_mm: rain,
    }])
    .unwrap()
}

type WeatherScript =
    dyn Fn(usize, f64, f64) -> (Duration, Result<WeatherSnapshot, FetchError>) + Send + Sync;

pub struct MockWeather {
    script: Box<WeatherScript>,
    calls: Mutex<Vec<(f64, f64)>>,
}

impl MockWeather {
    /// `script` receives the zero-based call index and the coordinates.
    pub fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(usize, f64, f64) -> (Duration, Result<WeatherSnapshot, FetchError>)
            + Send
            + Sync
            + 'static,
    {
        Arc::new(Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn fixed(kelvin: f64, rain: f64) -> Arc<Self> {
        Self::new(move |_, _, _| (Duration::ZERO, Ok(snapshot(kelvin, rain))))
    }

    pub fn calls(&self) -> Vec<(f64, f64)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl WeatherSource for MockWeather {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot, FetchError> {
        let index = {
            let mut calls = self.calls.lock();
            calls.push((latitude, longitude));
            calls.len() - 1
        };
        let (delay, result) = (self.script)(index, latitude, longitude);
        tokio::time::sleep(delay).await;
        result
    }
}

type ReverseScript = dyn Fn(f64, f64) -> (Duration, String) + Send + Sync;

pub struct MockPlaces {
    reverse: Box<ReverseScript>,
    suggest_delay: Duration,
    reverse_calls: Mutex<Vec<(f64, f64)>>,
    queries: Mutex<Vec<String>>,
}

impl MockPlaces {
    pub fn new<F>(reverse: F, suggest_delay: Duration) -> Arc<Self>
    where
        F: Fn(f64, f64) -> (Duration, String) + Send + Sync + 'static,
    {
        Arc::new(Self {
            reverse: Box::new(reverse),
            suggest_delay,
            reverse_calls: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        })
    }

    /// Reverse geocoding always answers `name` immediately.
    pub fn named(name: &str) -> Arc<Self> {
        let name = name.to_string();
        Self::new(move |_, _| (Duration::ZERO, name.clone()), Duration::ZERO)
    }

    pub fn reverse_calls(&self) -> Vec<(f64, f64)> {
        self.reverse_calls.lock().clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl PlaceLookup for MockPlaces {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> String {
        self.reverse_calls.lock().push((latitude, longitude));
        let (delay, name) = (self.reverse)(latitude, longitude);
        tokio::time::sleep(delay).await;
        name
    }

    async fn suggest(&self, query: &str) -> Vec<PlaceSuggestion> {
        self.queries.lock().push(query.to_string());
        tokio::time::sleep(self.suggest_delay).await;
        vec![
            PlaceSuggestion {
                display_name: format!("{}, Ontario, Canada", query),
                latitude: 42.9849,
                longitude: -81.2453,
            },
            PlaceSuggestion {
                display_name: format!("{}, England, United Kingdom", query),
                latitude: 51.5074,
                longitude: -0.1278,
            },
        ]
    }
}

type LocationScript = dyn Fn() -> Result<Coordinates, LocationError> + Send + Sync;

pub struct MockLocation {
    delay: Duration,
    result: Box<LocationScript>,
    calls: AtomicUsize,
}

impl MockLocation {
    pub fn new<F>(delay: Duration, result: F) -> Arc<Self>
    where
        F: Fn() -> Result<Coordinates, LocationError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            delay,
            result: Box::new(result),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn at(latitude: f64, longitude: f64) -> Arc<Self> {
        Self::new(Duration::ZERO, move || {
            Ok(Coordinates::new(latitude, longitude))
        })
    }

    pub fn denied() -> Arc<Self> {
        Self::new(Duration::ZERO, || Err(LocationError::PermissionDenied))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationSource for MockLocation {
    async fn current_location(&self) -> Result<Coordinates, LocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        (self.result)()
    }
}

/// Answers `"{name} in {unit}"` so tests can tell which request produced the text.
pub struct MockInsights {
    delay: Duration,
    calls: Mutex<Vec<(String, DisplayUnit)>>,
}

impl MockInsights {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(String, DisplayUnit)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl InsightProvider for MockInsights {
    async fn insight(
        &self,
        _snapshot: &WeatherSnapshot,
        location_name: &str,
        unit: DisplayUnit,
    ) -> String {
        self.calls.lock().push((location_name.to_string(), unit));
        tokio::time::sleep(self.delay).await;
        format!("{} in {}", location_name, unit.name())
    }
}

pub struct MockMovies {
    calls: AtomicUsize,
}

impl MockMovies {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MovieProvider for MockMovies {
    async fn suggest_movies(&self, snapshot: &WeatherSnapshot) -> Vec<MovieSuggestion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let kelvin = snapshot
            .current()
            .map(|o| o.temperature_kelvin)
            .unwrap_or_default();
        vec![MovieSuggestion {
            title: format!("Movie for {:.0}K", kelvin),
            genre: "DRAMA".to_string(),
            mood: "Calm".to_string(),
            description: "Fits the weather.".to_string(),
        }]
    }
}

pub struct Harness {
    pub weather: Arc<MockWeather>,
    pub places: Arc<MockPlaces>,
    pub location: Arc<MockLocation>,
    pub insights: Arc<MockInsights>,
    pub movies: Arc<MockMovies>,
}

impl Harness {
    pub fn new(weather: Arc<MockWeather>, places: Arc<MockPlaces>) -> Self {
        Self {
            weather,
            places,
            location: MockLocation::denied(),
            insights: MockInsights::new(Duration::ZERO),
            movies: MockMovies::new(),
        }
    }

    pub fn services(&self) -> ControllerServices {
        ControllerServices {
            weather: self.weather.clone(),
            places: self.places.clone(),
            location: self.location.clone(),
            insights: self.insights.clone(),
            movies: self.movies.clone(),
        }
    }

    pub fn controller(&self) -> AppController {
        AppController::new(self.services(), ControllerSettings::default())
    }
}

/// Everything published so far on an event receiver.
pub fn drain(rx: &mut broadcast::Receiver<DashboardEvent>) -> Vec<DashboardEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn loading_transitions(events: &[DashboardEvent]) -> Vec<bool> {
    events
        .iter()
        .filter_map(|e| match e {
            DashboardEvent::LoadingChanged(loading) => Some(*loading),
            _ => None,
        })
        .collect()
}
