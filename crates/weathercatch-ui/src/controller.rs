//! The dashboard controller.
//!
//! `AppController` is the only owner and mutator of [`DashboardState`]. It
//! processes one [`ControllerMessage`] at a time: user commands, timer
//! firings and completions of the background tasks it spawned. Every task is
//! tagged with the location generation (or search sequence) it was issued
//! for; completions carrying an older tag are dropped, so a slow response
//! for a superseded location never overwrites the current one.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use weathercatch_core::{AppError, Config, TemperatureUnit};
use weathercatch_insights::{
    GeminiClient, GenerativeBackend, InsightProvider, InsightService, MovieProvider,
    MovieService, MovieSuggestion,
};
use weathercatch_weather::{
    ConfiguredLocation, Coordinates, DisplayUnit, FetchError, Geocoder, Location, LocationError,
    LocationSource, PlaceLookup, PlaceSuggestion, RelayClient, WeatherProvider, WeatherSnapshot,
    WeatherSource,
};

use crate::clock::spawn_clock;
use crate::debounce::SearchDebouncer;
use crate::error_mapping;
use crate::message::{Command, ControllerMessage};
use crate::services::{insight_service, search_service, weather_service, MessageSender};
use crate::state::{DashboardEvent, DashboardState, ErrorBanner, RetryTarget};

/// Upper bound on the one-shot device location lookup
pub const LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

const EVENT_CAPACITY: usize = 64;

/// The services the controller orchestrates.
#[derive(Clone)]
pub struct ControllerServices {
    pub weather: Arc<dyn WeatherSource>,
    pub places: Arc<dyn PlaceLookup>,
    pub location: Arc<dyn LocationSource>,
    pub insights: Arc<dyn InsightProvider>,
    pub movies: Arc<dyn MovieProvider>,
}

impl ControllerServices {
    /// Wire the production services from configuration.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let relay =
            RelayClient::new(&config.endpoints.relay_url).map_err(error_mapping::app_error)?;

        let weather = WeatherProvider::new(relay.clone(), &config.endpoints.weather_api_url)
            .with_timeout(Duration::from_secs(config.weather.weather_timeout_secs));

        let places = Geocoder::new(relay, &config.endpoints.geocode_url)
            .with_timeout(Duration::from_secs(config.weather.geocode_timeout_secs))
            .with_min_query_len(config.weather.min_query_len)
            .with_limit(config.weather.suggestion_limit);

        let location = ConfiguredLocation::new(config.location.latitude, config.location.longitude);
        if !location.is_available() {
            tracing::info!("No device coordinates configured, the default location will be used");
        }

        let client = GeminiClient::new(
            &config.endpoints.generative_url,
            &config.insights.model,
            config.insights.resolve_api_key(),
        )
        .with_timeout(Duration::from_secs(config.insights.timeout_secs));
        if !client.has_api_key() {
            tracing::warn!("No generative API key configured, insights and movies use fallbacks");
        }
        let backend: Arc<dyn GenerativeBackend> = Arc::new(client);

        Ok(Self {
            weather: Arc::new(weather),
            places: Arc::new(places),
            location: Arc::new(location),
            insights: Arc::new(InsightService::new(backend.clone())),
            movies: Arc::new(MovieService::new(backend)),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub default_location: Location,
    pub initial_unit: DisplayUnit,
    pub search_debounce: Duration,
    pub min_query_len: usize,
    pub location_timeout: Duration,
    pub clock_interval: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            default_location: Location::new(20.5937, 78.9629, "India"),
            initial_unit: DisplayUnit::Celsius,
            search_debounce: Duration::from_millis(300),
            min_query_len: 3,
            location_timeout: LOCATION_TIMEOUT,
            clock_interval: Duration::from_secs(1),
        }
    }
}

impl ControllerSettings {
    pub fn from_config(config: &Config) -> Self {
        let default = &config.default_location;
        Self {
            default_location: Location::new(default.latitude, default.longitude, &default.name),
            initial_unit: display_unit(config.weather.unit),
            search_debounce: Duration::from_millis(config.weather.search_debounce_ms),
            min_query_len: config.weather.min_query_len,
            location_timeout: LOCATION_TIMEOUT,
            clock_interval: Duration::from_millis(config.weather.clock_interval_ms),
        }
    }
}

pub fn display_unit(unit: TemperatureUnit) -> DisplayUnit {
    match unit {
        TemperatureUnit::Celsius => DisplayUnit::Celsius,
        TemperatureUnit::Fahrenheit => DisplayUnit::Fahrenheit,
    }
}

/// Cloneable sender for driving a controller that is inside [`AppController::run`].
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: MessageSender,
}

impl ControllerHandle {
    fn send(&self, command: Command) {
        if self.tx.send(ControllerMessage::Command(command)).is_err() {
            tracing::debug!("Controller stopped, command dropped");
        }
    }

    pub fn initial_load(&self) {
        self.send(Command::InitialLoad);
    }

    pub fn set_location(&self, latitude: f64, longitude: f64, name: Option<String>) {
        self.send(Command::SetLocation {
            latitude,
            longitude,
            name,
        });
    }

    pub fn set_unit(&self, unit: DisplayUnit) {
        self.send(Command::SetUnit(unit));
    }

    pub fn retry(&self) {
        self.send(Command::Retry);
    }

    pub fn set_search_query(&self, query: impl Into<String>) {
        self.send(Command::SetSearchQuery(query.into()));
    }

    pub fn select_suggestion(&self, index: usize) {
        self.send(Command::SelectSuggestion(index));
    }

    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }
}

/// Bookkeeping for the latest location generation. Name and snapshot are
/// staged here and reach the state together once both are known.
#[derive(Debug)]
struct PendingLocation {
    generation: u64,
    latitude: f64,
    longitude: f64,
    requested_name: Option<String>,
    name: Option<String>,
    snapshot: Option<WeatherSnapshot>,
    committed: bool,
    extras_requested: bool,
}

/// The committed location that stays on screen while a newer one loads,
/// with the extras it had when the newer load started.
#[derive(Debug)]
struct ShownLocation {
    request: PendingLocation,
    insight: Option<String>,
    movies: Option<Vec<MovieSuggestion>>,
}

pub struct AppController {
    services: ControllerServices,
    settings: ControllerSettings,
    state: DashboardState,
    tx: MessageSender,
    rx: mpsc::UnboundedReceiver<ControllerMessage>,
    state_tx: watch::Sender<DashboardState>,
    events: broadcast::Sender<DashboardEvent>,
    debouncer: SearchDebouncer,
    generation: u64,
    pending: Option<PendingLocation>,
    shown: Option<ShownLocation>,
    insight_request: u64,
    search_seq: u64,
    in_flight: usize,
    initial_load_started: bool,
}

impl AppController {
    pub fn new(services: ControllerServices, settings: ControllerSettings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = DashboardState {
            unit: settings.initial_unit,
            ..Default::default()
        };
        let (state_tx, _) = watch::channel(state.clone());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            debouncer: SearchDebouncer::new(settings.search_debounce),
            services,
            settings,
            state,
            tx,
            rx,
            state_tx,
            events,
            generation: 0,
            pending: None,
            shown: None,
            insight_request: 0,
            search_seq: 0,
            in_flight: 0,
            initial_load_started: false,
        }
    }

    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn watch_state(&self) -> watch::Receiver<DashboardState> {
        self.state_tx.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    /// Start the wall-clock ticker. It stops on its own once the controller
    /// is dropped.
    pub fn start_clock(&self) -> JoinHandle<()> {
        spawn_clock(self.tx.clone(), self.settings.clock_interval)
    }

    /// No task in flight and no search timer armed.
    pub fn is_idle(&self) -> bool {
        self.in_flight == 0 && !self.debouncer.is_armed()
    }

    // ===== Commands =====

    /// Resolve the starting location once: the device fix if the location
    /// source provides one, the configured default otherwise.
    pub fn initial_load(&mut self) {
        if self.initial_load_started {
            tracing::debug!("Initial load already started");
            return;
        }
        self.initial_load_started = true;
        self.set_loading(true);

        self.in_flight += 1;
        weather_service::request_device_location(
            &self.tx,
            self.services.location.clone(),
            self.settings.location_timeout,
        );
        self.publish();
    }

    /// Switch to a new location. Weather and (when `name` is absent) the
    /// reverse-geocoded name are requested concurrently. The location and its
    /// snapshot replace the displayed ones only once both are known; insight
    /// and movies follow.
    pub fn set_location(&mut self, latitude: f64, longitude: f64, name: Option<String>) {
        self.generation += 1;
        let generation = self.generation;
        let name = name.filter(|n| !n.trim().is_empty());
        tracing::info!(
            "Loading location {} ({}, {})",
            generation,
            latitude,
            longitude
        );

        self.set_loading(true);
        self.clear_error();
        self.stash_shown();

        self.in_flight += 1;
        weather_service::request_weather(
            &self.tx,
            self.services.weather.clone(),
            generation,
            latitude,
            longitude,
        );

        self.pending = Some(PendingLocation {
            generation,
            latitude,
            longitude,
            requested_name: name.clone(),
            name: None,
            snapshot: None,
            committed: false,
            extras_requested: false,
        });

        match name {
            Some(name) => self.apply_place_name(name),
            None => {
                self.in_flight += 1;
                weather_service::request_place_name(
                    &self.tx,
                    self.services.places.clone(),
                    generation,
                    latitude,
                    longitude,
                );
            }
        }
        self.publish();
    }

    /// Change the display unit. Weather is not re-fetched; the insight is
    /// rebuilt because the unit is part of its prompt.
    pub fn set_unit(&mut self, unit: DisplayUnit) {
        if self.state.unit == unit {
            return;
        }
        tracing::info!("Display unit changed to {}", unit.name());
        self.state.unit = unit;
        self.emit(DashboardEvent::UnitChanged(unit));

        if self.state.insight.take().is_some() {
            self.emit(DashboardEvent::InsightUpdated);
        }
        if let Some(shown) = self.shown.as_mut() {
            shown.insight = None;
        }

        let extras_requested = self
            .pending
            .as_ref()
            .is_some_and(|p| p.extras_requested);
        if extras_requested {
            self.request_insight();
        }
        self.publish();
    }

    /// Re-issue the location load behind the current error banner.
    pub fn retry(&mut self) {
        let Some(banner) = self.state.error.clone() else {
            tracing::debug!("Retry requested without an error, ignoring");
            return;
        };
        let RetryTarget {
            latitude,
            longitude,
            name,
        } = banner.retry;
        self.set_location(latitude, longitude, name);
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        self.search_seq += 1;
        let seq = self.search_seq;

        let long_enough = query.trim().chars().count() >= self.settings.min_query_len;
        self.state.search_query = query.clone();

        if long_enough {
            let tx = self.tx.clone();
            self.debouncer.arm(move || {
                let _ = tx.send(ControllerMessage::SearchTimerFired { seq, query });
            });
        } else {
            self.debouncer.cancel();
            self.clear_suggestions();
        }
        self.publish();
    }

    pub fn select_suggestion(&mut self, index: usize) {
        let Some(choice) = self.state.suggestions.get(index).cloned() else {
            tracing::debug!("No suggestion at index {}", index);
            return;
        };

        self.search_seq += 1;
        self.debouncer.cancel();
        self.state.search_query.clear();
        self.clear_suggestions();

        let PlaceSuggestion {
            display_name,
            latitude,
            longitude,
        } = choice;
        self.set_location(latitude, longitude, Some(display_name));
    }

    // ===== Message loop =====

    /// Process one queued message, waiting for it if necessary.
    pub async fn process_one(&mut self) {
        if let Some(message) = self.rx.recv().await {
            self.process(message);
        }
    }

    /// Process messages until nothing is in flight and no search timer is
    /// armed. The clock does not keep the controller busy.
    pub async fn run_until_idle(&mut self) {
        loop {
            while let Ok(message) = self.rx.try_recv() {
                self.process(message);
            }
            if self.is_idle() {
                break;
            }
            self.process_one().await;
        }
    }

    /// Long-lived loop for hosts driving the controller via a
    /// [`ControllerHandle`]. Returns on `Command::Shutdown`.
    pub async fn run(mut self) {
        while let Some(message) = self.rx.recv().await {
            if matches!(message, ControllerMessage::Command(Command::Shutdown)) {
                tracing::info!("Controller shutting down");
                break;
            }
            self.process(message);
        }
    }

    fn process(&mut self, message: ControllerMessage) {
        if message.completes_task() {
            self.in_flight = self.in_flight.saturating_sub(1);
        }

        match message {
            ControllerMessage::Command(command) => self.apply(command),
            ControllerMessage::DeviceLocation(result) => self.on_device_location(result),
            ControllerMessage::WeatherFetched { generation, result } => {
                self.on_weather(generation, result)
            }
            ControllerMessage::PlaceNameResolved { generation, name } => {
                if self.is_current(generation) {
                    self.apply_place_name(name);
                } else {
                    tracing::debug!("Discarding place name for stale location {}", generation);
                }
            }
            ControllerMessage::InsightReady {
                generation,
                request,
                unit,
                text,
            } => self.on_insight(generation, request, unit, text),
            ControllerMessage::MoviesReady { generation, movies } => {
                self.on_movies(generation, movies)
            }
            ControllerMessage::SearchTimerFired { seq, query } => {
                self.on_search_timer(seq, query)
            }
            ControllerMessage::SuggestionsReady { seq, suggestions } => {
                if seq == self.search_seq {
                    self.state.suggestions = suggestions;
                    self.emit(DashboardEvent::SuggestionsUpdated);
                } else {
                    tracing::debug!("Discarding suggestions for superseded query");
                }
            }
            ControllerMessage::Tick(now) => {
                self.state.now = Some(now);
                self.emit(DashboardEvent::Tick(now));
            }
        }
        self.publish();
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::InitialLoad => self.initial_load(),
            Command::SetLocation {
                latitude,
                longitude,
                name,
            } => self.set_location(latitude, longitude, name),
            Command::SetUnit(unit) => self.set_unit(unit),
            Command::Retry => self.retry(),
            Command::SetSearchQuery(query) => self.set_search_query(query),
            Command::SelectSuggestion(index) => self.select_suggestion(index),
            Command::Shutdown => {}
        }
    }

    // ===== Completions =====

    fn on_device_location(&mut self, result: Result<Coordinates, LocationError>) {
        if self.generation > 0 {
            tracing::debug!("Location already chosen, ignoring device fix");
            return;
        }

        match result {
            Ok(coords) => {
                tracing::info!("Device location: {}", coords.label());
                self.set_location(coords.latitude, coords.longitude, None);
            }
            Err(e) => {
                let fallback = self.settings.default_location.clone();
                tracing::info!("{}, using default location {}", e, fallback.display_name);
                self.set_location(
                    fallback.latitude,
                    fallback.longitude,
                    Some(fallback.display_name),
                );
            }
        }
    }

    fn on_weather(&mut self, generation: u64, result: Result<WeatherSnapshot, FetchError>) {
        if !self.is_current(generation) {
            tracing::debug!("Discarding weather for stale location {}", generation);
            return;
        }

        self.set_loading(false);
        match result {
            Ok(snapshot) => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.snapshot = Some(snapshot);
                }
                self.commit_location();
            }
            Err(e) => {
                tracing::error!("Weather fetch failed: {}", e);
                let Some(pending) = self.pending.as_ref() else {
                    return;
                };
                let banner = ErrorBanner {
                    message: error_mapping::banner_message(e),
                    retry: RetryTarget {
                        latitude: pending.latitude,
                        longitude: pending.longitude,
                        name: pending.requested_name.clone(),
                    },
                };
                self.emit(DashboardEvent::ErrorRaised(banner.message.clone()));
                self.state.error = Some(banner);
                self.restore_shown();
            }
        }
    }

    fn on_insight(&mut self, generation: u64, request: u64, unit: DisplayUnit, text: String) {
        if !self.is_current(generation) || request != self.insight_request || unit != self.state.unit
        {
            tracing::debug!("Discarding stale insight ({}, {})", generation, unit.name());
            return;
        }
        self.state.insight = Some(text);
        self.emit(DashboardEvent::InsightUpdated);
    }

    fn on_movies(&mut self, generation: u64, movies: Vec<MovieSuggestion>) {
        if !self.is_current(generation) {
            tracing::debug!("Discarding movies for stale location {}", generation);
            return;
        }
        self.state.movies = Some(movies);
        self.emit(DashboardEvent::MoviesUpdated);
    }

    fn on_search_timer(&mut self, seq: u64, query: String) {
        if seq != self.search_seq {
            return;
        }
        self.debouncer.fired();
        self.in_flight += 1;
        search_service::request_suggestions(&self.tx, self.services.places.clone(), seq, query);
    }

    // ===== Helpers =====

    fn is_current(&self, generation: u64) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| p.generation == generation)
    }

    fn apply_place_name(&mut self, name: String) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        pending.name = Some(name);
        self.commit_location();
    }

    /// Move the pending name and snapshot into the state once both are
    /// known, then issue the insight and movie requests.
    fn commit_location(&mut self) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        if pending.committed || pending.name.is_none() || pending.snapshot.is_none() {
            return;
        }
        let (Some(name), Some(snapshot)) = (pending.name.clone(), pending.snapshot.take()) else {
            return;
        };
        pending.committed = true;
        let location = Location::new(pending.latitude, pending.longitude, name);

        self.shown = None;
        self.state.snapshot = Some(snapshot);
        self.state.location = Some(location.clone());
        self.emit(DashboardEvent::LocationChanged(location));
        self.emit(DashboardEvent::WeatherUpdated);
        self.request_extras();
    }

    /// Issue insight and movie requests for the committed location.
    fn request_extras(&mut self) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        if !pending.committed || pending.extras_requested {
            return;
        }
        pending.extras_requested = true;
        self.request_movies();
        self.request_insight();
    }

    fn request_movies(&mut self) {
        let Some(pending) = self.pending.as_ref() else {
            return;
        };
        let Some(snapshot) = self.state.snapshot.clone() else {
            return;
        };
        self.in_flight += 1;
        insight_service::request_movies(
            &self.tx,
            self.services.movies.clone(),
            pending.generation,
            snapshot,
        );
    }

    fn request_insight(&mut self) {
        let Some(pending) = self.pending.as_ref() else {
            return;
        };
        let (Some(name), Some(snapshot)) = (pending.name.clone(), self.state.snapshot.clone())
        else {
            return;
        };

        self.insight_request += 1;
        self.in_flight += 1;
        insight_service::request_insight(
            &self.tx,
            self.services.insights.clone(),
            pending.generation,
            self.insight_request,
            snapshot,
            name,
            self.state.unit,
        );
    }

    fn set_loading(&mut self, loading: bool) {
        if self.state.loading != loading {
            self.state.loading = loading;
            self.emit(DashboardEvent::LoadingChanged(loading));
        }
    }

    fn clear_error(&mut self) {
        if self.state.error.take().is_some() {
            self.emit(DashboardEvent::ErrorCleared);
        }
    }

    /// Clear the extras for a new load. If the current request is on screen
    /// it is kept, with its extras, so a failed load can fall back to it.
    fn stash_shown(&mut self) {
        let insight = self.state.insight.take();
        if insight.is_some() {
            self.emit(DashboardEvent::InsightUpdated);
        }
        let movies = self.state.movies.take();
        if movies.is_some() {
            self.emit(DashboardEvent::MoviesUpdated);
        }

        if let Some(request) = self.pending.take().filter(|p| p.committed) {
            self.shown = Some(ShownLocation {
                request,
                insight,
                movies,
            });
        }
    }

    /// Return to the location still on screen after its replacement failed.
    /// Extras that were dropped while the failed load ran are requested again.
    fn restore_shown(&mut self) {
        let Some(shown) = self.shown.take() else {
            return;
        };
        tracing::debug!(
            "Keeping location {} on screen",
            shown.request.generation
        );
        self.pending = Some(shown.request);

        if shown.insight.is_some() {
            self.state.insight = shown.insight;
            self.emit(DashboardEvent::InsightUpdated);
        } else {
            self.request_insight();
        }
        if shown.movies.is_some() {
            self.state.movies = shown.movies;
            self.emit(DashboardEvent::MoviesUpdated);
        } else {
            self.request_movies();
        }
    }

    fn clear_suggestions(&mut self) {
        if !self.state.suggestions.is_empty() {
            self.state.suggestions.clear();
            self.emit(DashboardEvent::SuggestionsUpdated);
        }
    }

    fn emit(&self, event: DashboardEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn publish(&self) {
        self.state_tx.send_if_modified(|published| {
            if *published == self.state {
                false
            } else {
                *published = self.state.clone();
                true
            }
        });
    }
}
