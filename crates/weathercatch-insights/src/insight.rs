use std::sync::Arc;

use async_trait::async_trait;
use weathercatch_weather::{DisplayUnit, WeatherSnapshot};

use crate::backend::{GenerationRequest, GenerativeBackend};

/// Shown whenever the backend cannot produce an insight
pub const INSIGHT_FALLBACK: &str = "Insights are currently under maintenance.";

/// Index of the observation used as the forecast reference
const FORECAST_STEP: usize = 12;

#[async_trait]
pub trait InsightProvider: Send + Sync {
    /// Natural-language summary; never fails, degrades to `INSIGHT_FALLBACK`.
    async fn insight(
        &self,
        snapshot: &WeatherSnapshot,
        location_name: &str,
        unit: DisplayUnit,
    ) -> String;
}

pub struct InsightService {
    backend: Arc<dyn GenerativeBackend>,
}

impl InsightService {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }
}

/// Build the insight prompt. `None` when the snapshot has no observations.
pub fn insight_prompt(
    snapshot: &WeatherSnapshot,
    location_name: &str,
    unit: DisplayUnit,
) -> Option<String> {
    let current = snapshot.current()?;
    let later = snapshot.ahead(FORECAST_STEP)?;
    let symbol = unit.symbol();

    Some(format!(
        "Analyze weather for {name}. Use {unit_name}.\n\
         \n\
         DATA:\n\
         - Current Temp: {now_temp:.1}°{symbol}\n\
         - Current Rain: {now_rain}mm\n\
         - 12h Forecast Temp: {later_temp:.1}°{symbol}\n\
         - 12h Forecast Rain: {later_rain}mm\n\
         \n\
         Tasks:\n\
         1. Short summary.\n\
         2. One specific advice for this temperature/rain.\n\
         3. A professional meteorological insight.\n\
         \n\
         Keep it very concise.",
        name = location_name,
        unit_name = unit.name(),
        now_temp = unit.from_kelvin(current.temperature_kelvin),
        now_rain = current.rainfall_mm,
        later_temp = unit.from_kelvin(later.temperature_kelvin),
        later_rain = later.rainfall_mm,
    ))
}

#[async_trait]
impl InsightProvider for InsightService {
    async fn insight(
        &self,
        snapshot: &WeatherSnapshot,
        location_name: &str,
        unit: DisplayUnit,
    ) -> String {
        let Some(prompt) = insight_prompt(snapshot, location_name, unit) else {
            return INSIGHT_FALLBACK.to_string();
        };

        match self.backend.generate(GenerationRequest::text(prompt)).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                tracing::warn!("Insight backend returned empty text, using fallback");
                INSIGHT_FALLBACK.to_string()
            }
            Err(e) => {
                tracing::warn!("Insight request failed, using fallback: {}", e);
                INSIGHT_FALLBACK.to_string()
            }
        }
    }
}
