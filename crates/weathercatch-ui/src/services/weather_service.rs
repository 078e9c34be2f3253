//! Device location, weather fetch and reverse geocoding tasks.

use std::sync::Arc;
use std::time::Duration;

use weathercatch_weather::{LocationError, LocationSource, PlaceLookup, WeatherSource};

use super::{deliver, MessageSender};
use crate::message::ControllerMessage;

/// Ask the location source for a fix, bounded by `timeout`.
/// Sends `DeviceLocation` when complete.
pub fn request_device_location(
    tx: &MessageSender,
    source: Arc<dyn LocationSource>,
    timeout: Duration,
) {
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = match tokio::time::timeout(timeout, source.current_location()).await {
            Ok(result) => result,
            Err(_) => Err(LocationError::Timeout),
        };
        deliver(&tx, ControllerMessage::DeviceLocation(result));
    });
}

/// Fetch the weather snapshot for one location generation.
/// Sends `WeatherFetched` when complete.
pub fn request_weather(
    tx: &MessageSender,
    source: Arc<dyn WeatherSource>,
    generation: u64,
    latitude: f64,
    longitude: f64,
) {
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = source.fetch(latitude, longitude).await;
        deliver(&tx, ControllerMessage::WeatherFetched { generation, result });
    });
}

/// Resolve a display name for one location generation.
/// Sends `PlaceNameResolved` when complete; the lookup itself never fails.
pub fn request_place_name(
    tx: &MessageSender,
    places: Arc<dyn PlaceLookup>,
    generation: u64,
    latitude: f64,
    longitude: f64,
) {
    let tx = tx.clone();
    tokio::spawn(async move {
        let name = places.reverse_geocode(latitude, longitude).await;
        deliver(&tx, ControllerMessage::PlaceNameResolved { generation, name });
    });
}
