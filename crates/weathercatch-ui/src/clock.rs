use std::time::Duration;

use chrono::Local;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::message::ControllerMessage;
use crate::services::MessageSender;

/// Send a `Tick` with the wall-clock time every `interval` until the
/// controller goes away. Ticks never trigger fetches.
pub fn spawn_clock(tx: MessageSender, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if tx.send(ControllerMessage::Tick(Local::now())).is_err() {
                tracing::debug!("Clock stopped: controller closed");
                break;
            }
        }
    })
}
