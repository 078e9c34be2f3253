//! Place search for the autocomplete box.

use std::sync::Arc;

use weathercatch_weather::PlaceLookup;

use super::{deliver, MessageSender};
use crate::message::ControllerMessage;

/// Look up suggestions for `query`. Sends `SuggestionsReady` when complete.
pub fn request_suggestions(tx: &MessageSender, places: Arc<dyn PlaceLookup>, seq: u64, query: String) {
    let tx = tx.clone();
    tokio::spawn(async move {
        let suggestions = places.suggest(&query).await;
        tracing::debug!("{} suggestions for {:?}", suggestions.len(), query);
        deliver(&tx, ControllerMessage::SuggestionsReady { seq, suggestions });
    });
}
