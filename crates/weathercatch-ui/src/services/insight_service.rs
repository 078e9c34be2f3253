//! Generative extras: insight text and movie suggestions.

use std::sync::Arc;

use weathercatch_insights::{InsightProvider, MovieProvider};
use weathercatch_weather::{DisplayUnit, WeatherSnapshot};

use super::{deliver, MessageSender};
use crate::message::ControllerMessage;

/// Request an insight built for `unit`. Sends `InsightReady` when complete.
pub fn request_insight(
    tx: &MessageSender,
    provider: Arc<dyn InsightProvider>,
    generation: u64,
    request: u64,
    snapshot: WeatherSnapshot,
    location_name: String,
    unit: DisplayUnit,
) {
    let tx = tx.clone();
    tokio::spawn(async move {
        let text = provider.insight(&snapshot, &location_name, unit).await;
        deliver(
            &tx,
            ControllerMessage::InsightReady {
                generation,
                request,
                unit,
                text,
            },
        );
    });
}

/// Request movie suggestions. Sends `MoviesReady` when complete.
pub fn request_movies(
    tx: &MessageSender,
    provider: Arc<dyn MovieProvider>,
    generation: u64,
    snapshot: WeatherSnapshot,
) {
    let tx = tx.clone();
    tokio::spawn(async move {
        let movies = provider.suggest_movies(&snapshot).await;
        deliver(&tx, ControllerMessage::MoviesReady { generation, movies });
    });
}
