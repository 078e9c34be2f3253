//! Device location.
//!
//! The dashboard asks for a fix exactly once at startup. The shipped source
//! reports coordinates from configuration; anything that can answer the
//! question (GeoClue, a platform API, a test double) plugs in behind
//! `LocationSource`.

use async_trait::async_trait;

use crate::types::{Coordinates, LocationError};

#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_location(&self) -> Result<Coordinates, LocationError>;
}

/// Location source backed by statically configured coordinates.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredLocation {
    coordinates: Option<Coordinates>,
}

impl ConfiguredLocation {
    pub fn new(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        let coordinates = match (latitude, longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        };
        Self { coordinates }
    }

    pub fn is_available(&self) -> bool {
        self.coordinates.is_some()
    }
}

#[async_trait]
impl LocationSource for ConfiguredLocation {
    async fn current_location(&self) -> Result<Coordinates, LocationError> {
        match self.coordinates {
            Some(coords) if coords.latitude.is_finite() && coords.longitude.is_finite() => {
                Ok(coords)
            }
            Some(_) => Err(LocationError::Other("non-finite coordinates".to_string())),
            None => Err(LocationError::ServiceUnavailable),
        }
    }
}
