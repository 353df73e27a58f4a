//! Change notifications
//!
//! When a rule is created the registry announces it so a downstream consumer
//! can pick it up. An event only names the entry; consumers re-fetch the
//! current state themselves, since the row may change again before the event
//! is read.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::SendTimeoutError};

use crate::error::NotificationError;

// == Change Event ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub owner: String,
    pub name: String,
}

impl ChangeEvent {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// JSON message body, `{"owner":..,"name":..}`.
    pub fn to_message(&self) -> Result<String, NotificationError> {
        Ok(serde_json::to_string(self)?)
    }
}

// == Notifier ==
/// Publisher of change events.
///
/// One attempt per call; callers log failures and carry on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, event: &ChangeEvent) -> Result<(), NotificationError>;
}

/// Publishes onto a bounded in-process queue.
///
/// The receiving half goes to whatever forwards events to the external
/// consumer.
#[derive(Debug, Clone)]
pub struct QueueNotifier {
    sender: mpsc::Sender<String>,
    timeout: Duration,
}

impl QueueNotifier {
    /// Creates a queue holding up to `capacity` messages. A publish waits at
    /// most `timeout` for room.
    pub fn channel(capacity: usize, timeout: Duration) -> (Self, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender, timeout }, receiver)
    }
}

#[async_trait]
impl Notifier for QueueNotifier {
    async fn publish(&self, event: &ChangeEvent) -> Result<(), NotificationError> {
        let message = event.to_message()?;
        self.sender
            .send_timeout(message, self.timeout)
            .await
            .map_err(|err| match err {
                SendTimeoutError::Timeout(_) => NotificationError::Timeout(self.timeout),
                SendTimeoutError::Closed(_) => NotificationError::Closed,
            })
    }
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn publish(&self, _event: &ChangeEvent) -> Result<(), NotificationError> {
        Ok(())
    }
}
