//! In-process publish/subscribe.
//!
//! # Data Flow
//! ```text
//! handler → Publisher::send(subject, payload)
//!     → BroadcastBus (tokio broadcast channel)
//!     → subscribers (WebSocket relay, tests)
//! ```
//!
//! # Design Decisions
//! - Fire-and-forget: `send` never fails from the caller's point of view
//! - Slow subscribers lag and drop events instead of blocking publishers
//! - Payloads that parse as JSON are carried as JSON, anything else as a string

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::observability::metrics;

/// Outbound message sink available to handlers.
pub trait Publisher: Send + Sync + 'static {
    /// Publish `payload` under `subject`. No delivery guarantee.
    fn send(&self, subject: &str, payload: &str);
}

/// One published message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub subject: String,
    pub payload: Value,
}

impl Event {
    pub fn new(subject: impl Into<String>, payload: &str) -> Self {
        let payload =
            serde_json::from_str(payload).unwrap_or_else(|_| Value::String(payload.to_string()));
        Self {
            subject: subject.into(),
            payload,
        }
    }
}

/// Broadcast-channel backed bus.
#[derive(Debug, Clone)]
pub struct BroadcastBus {
    channel: String,
    tx: broadcast::Sender<Event>,
}

impl BroadcastBus {
    pub fn new(channel: impl Into<String>, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            channel: channel.into(),
            tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Name of the channel this bus publishes on.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Publisher for BroadcastBus {
    fn send(&self, subject: &str, payload: &str) {
        let event = Event::new(subject, payload);
        match self.tx.send(event) {
            Ok(receivers) => {
                metrics::record_pubsub_event("delivered");
                tracing::debug!(
                    channel = %self.channel,
                    subject = %subject,
                    receivers,
                    "Published event"
                );
            }
            Err(_) => {
                metrics::record_pubsub_event("no_subscribers");
                tracing::debug!(channel = %self.channel, subject = %subject, "Event dropped, no subscribers");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_payload_kinds() {
        let json = Event::new("posts", r#"{"id": 1}"#);
        assert_eq!(json.payload, serde_json::json!({"id": 1}));

        let text = Event::new("posts", "hello");
        assert_eq!(text.payload, Value::String("hello".into()));
        assert_eq!(
            serde_json::to_string(&text).unwrap(),
            r#"{"subject":"posts","payload":"hello"}"#
        );
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = BroadcastBus::new("liveposts", 8);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(bus.channel(), "liveposts");

        bus.send("posts", "[1,2]");
        let event = rx.recv().await.unwrap();
        assert_eq!(event.subject, "posts");
        assert_eq!(event.payload, serde_json::json!([1, 2]));
    }

    #[test]
    fn test_send_without_subscribers_is_silent() {
        let bus = BroadcastBus::new("liveposts", 8);
        bus.send("posts", "{}");
        assert_eq!(bus.subscriber_count(), 0);
    }
}
