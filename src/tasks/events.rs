//! Change Event Forwarder
//!
//! Drains the notification queue. The service has no downstream consumer of
//! its own, so events are written to the log where a shipper can pick them
//! up.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::notify::ChangeEvent;

/// Spawns a task that forwards every queued change event until the queue
/// closes. Resolves to the number of events forwarded.
pub fn spawn_event_forwarder(mut receiver: mpsc::Receiver<String>) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut forwarded = 0;
        while let Some(message) = receiver.recv().await {
            match serde_json::from_str::<ChangeEvent>(&message) {
                Ok(event) => {
                    info!(owner = %event.owner, name = %event.name, "rule change event");
                    forwarded += 1;
                }
                Err(err) => warn!(error = %err, %message, "malformed change event dropped"),
            }
        }
        info!("Change event queue closed after {} events", forwarded);
        forwarded
    })
}
