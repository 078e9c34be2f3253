//! Place search and reverse geocoding via Nominatim (OpenStreetMap),
//! reached through the relay. Neither operation ever fails: errors collapse
//! into a coordinate label or an empty suggestion list.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::relay::RelayClient;
use crate::types::{Coordinates, FetchError, PlaceSuggestion};

pub const GEOCODE_TIMEOUT: Duration = Duration::from_secs(10);
pub const MIN_QUERY_LEN: usize = 3;
pub const SUGGESTION_LIMIT: u32 = 5;

#[async_trait]
pub trait PlaceLookup: Send + Sync {
    /// Best-effort place name; the coordinate label on any failure.
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> String;

    /// Autocomplete candidates; empty on failure or for short queries.
    async fn suggest(&self, query: &str) -> Vec<PlaceSuggestion>;
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
}

impl NominatimPlace {
    fn into_suggestion(self) -> Option<PlaceSuggestion> {
        let display_name = self.display_name.filter(|n| !n.trim().is_empty())?;
        let latitude = self.lat?.trim().parse::<f64>().ok()?;
        let longitude = self.lon?.trim().parse::<f64>().ok()?;
        Some(PlaceSuggestion {
            display_name,
            latitude,
            longitude,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    relay: RelayClient,
    base_url: String,
    timeout: Duration,
    min_query_len: usize,
    limit: u32,
}

impl Geocoder {
    pub fn new(relay: RelayClient, base_url: impl Into<String>) -> Self {
        Self {
            relay,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: GEOCODE_TIMEOUT,
            min_query_len: MIN_QUERY_LEN,
            limit: SUGGESTION_LIMIT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_min_query_len(mut self, min_query_len: usize) -> Self {
        self.min_query_len = min_query_len;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        Url::parse(&format!("{}/{}", self.base_url, path))
            .map_err(|e| FetchError::Transport(format!("Invalid geocoding URL: {}", e)))
    }

    async fn lookup_name(&self, latitude: f64, longitude: f64) -> Result<Option<String>, FetchError> {
        let mut url = self.endpoint("reverse")?;
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("lat", &latitude.to_string())
            .append_pair("lon", &longitude.to_string());

        let value = self.relay.fetch_json(url, self.timeout).await?;
        let place: NominatimPlace = serde_json::from_value(value)
            .map_err(|e| FetchError::DataFormat(e.to_string()))?;
        Ok(place.display_name.filter(|n| !n.trim().is_empty()))
    }

    async fn search(&self, query: &str) -> Result<Vec<PlaceSuggestion>, FetchError> {
        let mut url = self.endpoint("search")?;
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("q", query)
            .append_pair("limit", &self.limit.to_string());

        let value = self.relay.fetch_json(url, self.timeout).await?;
        let serde_json::Value::Array(entries) = value else {
            return Ok(Vec::new());
        };

        Ok(entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value::<NominatimPlace>(entry).ok())
            .filter_map(NominatimPlace::into_suggestion)
            .collect())
    }
}

#[async_trait]
impl PlaceLookup for Geocoder {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> String {
        let fallback = Coordinates::new(latitude, longitude).label();
        match self.lookup_name(latitude, longitude).await {
            Ok(Some(name)) => {
                tracing::info!("Reverse geocoded to: {}", name);
                name
            }
            Ok(None) => {
                tracing::debug!("Reverse geocode returned no name, using {}", fallback);
                fallback
            }
            Err(e) => {
                tracing::debug!("Reverse geocode failed: {}", e);
                fallback
            }
        }
    }

    async fn suggest(&self, query: &str) -> Vec<PlaceSuggestion> {
        let query = query.trim();
        if query.chars().count() < self.min_query_len {
            return Vec::new();
        }

        match self.search(query).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                tracing::debug!("Place search for {:?} failed: {}", query, e);
                Vec::new()
            }
        }
    }
}
