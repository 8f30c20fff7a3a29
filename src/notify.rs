use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::outcome::FailureKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// The server's `message` from a successful round trip.
    Message(String),
    /// A user-visible failure state.
    Failure { kind: FailureKind, message: String },
}

/// Side channel that surfaces submission outcomes.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification);
}

/// Writes outcomes to the log.
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notification: Notification) {
        match notification {
            Notification::Message(message) => tracing::info!("{message}"),
            Notification::Failure { kind, message } => {
                tracing::warn!(?kind, "Submission failed: {message}")
            }
        }
    }
}

/// Forwards outcomes into a channel for a UI layer to render.
pub struct ChannelNotifier {
    tx: mpsc::Sender<Notification>,
}

impl ChannelNotifier {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, notification: Notification) {
        if self.tx.send(notification).await.is_err() {
            tracing::debug!("Notification receiver dropped");
        }
    }
}
