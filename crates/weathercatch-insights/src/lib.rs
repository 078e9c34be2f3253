//! Generative extras for the dashboard: a short weather insight and a list
//! of movies that suit the conditions. Both degrade to fixed fallbacks and
//! never surface an error to the caller.

pub mod backend;
pub mod insight;
pub mod movies;

pub use backend::{GeminiClient, GenerationRequest, GenerativeBackend};
pub use insight::{InsightProvider, InsightService, INSIGHT_FALLBACK};
pub use movies::{fallback_movies, MovieProvider, MovieService, MovieSuggestion};
pub use weathercatch_core::GenerativeError;
