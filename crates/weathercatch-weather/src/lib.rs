//! Weather data for WeatherCatch
//!
//! Timeseries observations, place search and reverse geocoding, all fetched
//! through a CORS relay that wraps every body in a `{ contents }` envelope.

pub mod geocode;
pub mod location;
pub mod provider;
pub mod relay;
pub mod types;

pub use geocode::{Geocoder, PlaceLookup};
pub use location::{ConfiguredLocation, LocationSource};
pub use provider::{WeatherProvider, WeatherSource};
pub use relay::RelayClient;
pub use types::*;
