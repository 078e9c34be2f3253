use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::relay::RelayClient;
use crate::types::{FetchError, Observation, WeatherSnapshot};

pub const WEATHER_TIMEOUT: Duration = Duration::from_secs(20);

/// Anything that can produce a snapshot for a coordinate pair.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot, FetchError>;
}

#[derive(Debug, Deserialize)]
struct TimeseriesPayload {
    timeseries: Vec<Observation>,
}

/// Timeseries weather API reached through the relay. No internal retry.
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    relay: RelayClient,
    api_url: String,
    timeout: Duration,
}

impl WeatherProvider {
    pub fn new(relay: RelayClient, api_url: impl Into<String>) -> Self {
        Self {
            relay,
            api_url: api_url.into(),
            timeout: WEATHER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn target_url(&self, latitude: f64, longitude: f64) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| FetchError::Transport(format!("Invalid weather API URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("lat", &latitude.to_string())
            .append_pair("lon", &longitude.to_string());
        Ok(url)
    }
}

#[async_trait]
impl WeatherSource for WeatherProvider {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot, FetchError> {
        let target = self.target_url(latitude, longitude)?;
        let value = self.relay.fetch_json(target, self.timeout).await?;

        let payload: TimeseriesPayload = serde_json::from_value(value).map_err(|e| {
            FetchError::DataFormat(format!("Invalid weather data format received: {}", e))
        })?;

        let snapshot = WeatherSnapshot::new(payload.timeseries)?;
        tracing::info!(
            "Fetched {} observations for {}, {}",
            snapshot.len(),
            latitude,
            longitude
        );
        Ok(snapshot)
    }
}
