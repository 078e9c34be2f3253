use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use weathercatch_core::GenerativeError;
use weathercatch_weather::{kelvin_to_celsius, WeatherSnapshot};

use crate::backend::{GenerationRequest, GenerativeBackend};

const SUGGESTION_COUNT: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieSuggestion {
    pub title: String,
    pub genre: String,
    pub mood: String,
    pub description: String,
}

impl MovieSuggestion {
    fn new(title: &str, genre: &str, mood: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            genre: genre.to_string(),
            mood: mood.to_string(),
            description: description.to_string(),
        }
    }
}

#[async_trait]
pub trait MovieProvider: Send + Sync {
    /// Movies matching the current conditions; never fails, degrades to
    /// [`fallback_movies`].
    async fn suggest_movies(&self, snapshot: &WeatherSnapshot) -> Vec<MovieSuggestion>;
}

pub struct MovieService {
    backend: Arc<dyn GenerativeBackend>,
}

impl MovieService {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }
}

/// Fixed list shown when the backend is unavailable
pub fn fallback_movies() -> Vec<MovieSuggestion> {
    vec![
        MovieSuggestion::new(
            "Singin' in the Rain",
            "MUSICAL",
            "Cheerful",
            "The perfect lighthearted companion for the current rainy conditions.",
        ),
        MovieSuggestion::new(
            "Blade Runner 2049",
            "SCI-FI",
            "Atmospheric",
            "Matches the moody, overcast sky with its stunning visual palette.",
        ),
        MovieSuggestion::new(
            "About Time",
            "ROMANCE",
            "Cozy",
            "A heartwarming tale that feels right at home in today's gentle weather.",
        ),
    ]
}

/// Response shape: an array of objects with four required string fields
pub fn movie_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "genre": { "type": "STRING" },
                "mood": { "type": "STRING" },
                "description": { "type": "STRING" }
            },
            "required": ["title", "genre", "mood", "description"]
        }
    })
}

/// Build the movie prompt from the current observation (always Celsius).
pub fn movie_prompt(snapshot: &WeatherSnapshot) -> Option<String> {
    let current = snapshot.current()?;
    let celsius = kelvin_to_celsius(current.temperature_kelvin);
    let (condition, adjective) = if current.is_raining() {
        ("it is raining", "rainy")
    } else {
        ("it is clear", "clear")
    };

    Some(format!(
        "The current weather is {celsius:.1}°C and {condition}.\n\
         Suggest {SUGGESTION_COUNT} movie titles that fit this specific mood and environmental vibe.\n\
         For each movie, include:\n\
         1. title\n\
         2. genre (short, e.g., ROMANCE, ACTION, THRILLER)\n\
         3. mood (short, e.g., Whimsical, Gritty, Cozy)\n\
         4. description (how it specifically matches the current {celsius:.1}°C and {adjective} conditions)."
    ))
}

pub fn parse_movies(text: &str) -> Result<Vec<MovieSuggestion>, GenerativeError> {
    serde_json::from_str(text.trim())
        .map_err(|e| GenerativeError::InvalidResponse(format!("movie list: {}", e)))
}

#[async_trait]
impl MovieProvider for MovieService {
    async fn suggest_movies(&self, snapshot: &WeatherSnapshot) -> Vec<MovieSuggestion> {
        let Some(prompt) = movie_prompt(snapshot) else {
            return fallback_movies();
        };

        let request = GenerationRequest::structured(prompt, movie_schema());
        let result = self
            .backend
            .generate(request)
            .await
            .and_then(|text| parse_movies(&text));

        match result {
            Ok(movies) => movies,
            Err(e) => {
                tracing::warn!("Movie fetch failed, using fallback list: {}", e);
                fallback_movies()
            }
        }
    }
}
