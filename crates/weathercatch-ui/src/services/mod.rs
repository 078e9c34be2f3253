//! Background work for the controller.
//!
//! Each request spawns a tokio task that performs one network operation and
//! reports back on the controller channel. Tasks never touch state directly.

pub mod insight_service;
pub mod search_service;
pub mod weather_service;

use tokio::sync::mpsc::UnboundedSender;

use crate::message::ControllerMessage;

pub type MessageSender = UnboundedSender<ControllerMessage>;

/// Deliver a completion. A closed channel means the controller is gone and
/// the result has nobody to go to.
fn deliver(tx: &MessageSender, message: ControllerMessage) {
    if tx.send(message).is_err() {
        tracing::debug!("Controller channel closed, dropping task result");
    }
}
