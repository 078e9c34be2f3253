//! CORS relay client.
//!
//! The relay fetches a target URL server-side and answers with
//! `{ "contents": "<original body as a string>" }`. Every weather and
//! geocoding request goes through here.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use crate::types::FetchError;

const USER_AGENT: &str = "WeatherCatch/0.1.0";

#[derive(Debug, Deserialize)]
struct Envelope {
    contents: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct RelayClient {
    client: Client,
    relay_url: String,
}

impl RelayClient {
    pub fn new(relay_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client,
            relay_url: relay_url.into(),
        })
    }

    /// Fetch `target` through the relay and decode the wrapped body as JSON.
    ///
    /// A `cache_bust` parameter is appended to the target so the relay never
    /// serves a cached copy.
    #[instrument(skip(self, target), fields(target = %target), level = "debug")]
    pub async fn fetch_json(
        &self,
        target: Url,
        timeout: Duration,
    ) -> Result<serde_json::Value, FetchError> {
        let target = with_cache_bust(target);

        let response = self
            .client
            .get(&self.relay_url)
            .query(&[("url", target.as_str())])
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Transport(format!("Proxy error: {}", status)));
        }

        let body = response.text().await?;
        unwrap_envelope(&body)
    }
}

fn with_cache_bust(mut target: Url) -> Url {
    target
        .query_pairs_mut()
        .append_pair("cache_bust", &Utc::now().timestamp_millis().to_string());
    target
}

/// Decode the relay envelope and re-decode its `contents` string as JSON.
pub fn unwrap_envelope(body: &str) -> Result<serde_json::Value, FetchError> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| FetchError::Envelope(format!("relay response is not JSON: {}", e)))?;

    let contents = match envelope.contents {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s,
        Some(serde_json::Value::String(_)) | Some(serde_json::Value::Null) | None => {
            return Err(FetchError::Envelope(
                "No contents returned from proxy".to_string(),
            ));
        }
        Some(other) => {
            return Err(FetchError::Envelope(format!(
                "contents is not a string (got {})",
                json_kind(&other)
            )));
        }
    };

    serde_json::from_str(&contents)
        .map_err(|e| FetchError::Envelope(format!("contents is not valid JSON: {}", e)))
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
