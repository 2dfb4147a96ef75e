//! Cross-context invalidation.
//!
//! After every store mutation the engine pushes a `clearCache` message to
//! every other context holding a copy of the binding set. Delivery is
//! one-way and best-effort: no subscribers is not an error.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default number of undelivered messages a slow context may lag behind.
pub(crate) const CHANNEL_CAPACITY: usize = 16;

/// Message sent to page contexts.
///
/// Wire form is `{"action": "clearCache"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ContextMessage {
    ClearCache,
}

/// Acknowledgement a context returns for a handled message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessageReply {
    pub status: &'static str,
}

impl MessageReply {
    pub const CACHE_CLEARED: Self = Self {
        status: "cache cleared",
    };
}

/// Sending half, cloned into every engine that mutates the store.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<ContextMessage>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ContextMessage> {
        self.tx.subscribe()
    }

    /// Send to every subscribed context. Returns how many received it.
    pub fn broadcast(&self, message: ContextMessage) -> usize {
        match self.tx.send(message) {
            Ok(receivers) => {
                tracing::debug!(?message, receivers, "broadcast to contexts");
                receivers
            }
            Err(_) => {
                tracing::debug!(?message, "no active contexts to notify");
                0
            }
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
