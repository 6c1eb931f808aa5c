use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Event names used by the conversation layer.
pub mod events {
    pub const MESSAGE: &str = "message";
    pub const REACTION: &str = "reaction";
    pub const STATUS: &str = "status";
    pub const PROFILE: &str = "profile";
}

/// What actually travels over the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub id: Uuid,
    pub event: String,
    pub payload: Value,
    pub sent_at: DateTime<Utc>,
}

impl Envelope {
    pub fn new(event: impl Into<String>, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            event: event.into(),
            payload,
            sent_at: Utc::now(),
        }
    }
}

pub type Handler = Box<dyn FnMut(Value) + Send + 'static>;

/// Duplex channel between the conversation state and whatever sits on the other side.
pub trait Transport: Send + Sync {
    fn send(&self, event: &str, payload: Value);

    fn on_event(&self, event: &str, handler: Handler) -> Subscription;
}

/// Serialize `payload` and send it. Serialization failures are logged, not returned.
pub fn emit<T: Serialize>(transport: &dyn Transport, event: &str, payload: &T) {
    match serde_json::to_value(payload) {
        Ok(value) => transport.send(event, value),
        Err(e) => error!("Failed to serialize {} payload: {}", event, e),
    }
}

/// Handle for a registered handler. Dropping it unregisters the handler.
#[derive(Debug)]
pub struct Subscription {
    event: String,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn cancel(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            debug!("Unsubscribing from {}", self.event);
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.abort();
    }
}

/// In-process transport. Every `send` is fanned out to the handlers of that event.
pub struct EventBus {
    tx: broadcast::Sender<Envelope>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }

    pub fn publish(&self, envelope: Envelope) {
        if self.tx.send(envelope).is_err() {
            debug!("No listeners on the bus, envelope dropped");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Transport for EventBus {
    fn send(&self, event: &str, payload: Value) {
        self.publish(Envelope::new(event, payload));
    }

    /// Must be called from within a tokio runtime; the handler runs on a spawned task.
    fn on_event(&self, event: &str, mut handler: Handler) -> Subscription {
        let mut rx = self.subscribe();
        let name = event.to_string();
        let filter = name.clone();

        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(envelope) if envelope.event == filter => handler(envelope.payload),
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Handler for {} lagged, skipped {} envelopes", filter, skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Subscription {
            event: name,
            task: Some(task),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn forward(tx: mpsc::UnboundedSender<Value>) -> Handler {
        Box::new(move |payload: Value| {
            let _ = tx.send(payload);
        })
    }

    #[tokio::test]
    async fn handlers_only_see_their_event() {
        let bus = EventBus::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = bus.on_event(events::MESSAGE, forward(tx));

        bus.send(events::REACTION, json!({"emoji": "👍"}));
        bus.send(events::MESSAGE, json!({"text": "Hi"}));

        let got = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got, json!({"text": "Hi"}));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn dropped_subscription_receives_nothing() {
        let bus = EventBus::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sub = bus.on_event(events::MESSAGE, forward(tx));
        assert_eq!(sub.event(), events::MESSAGE);
        sub.cancel();

        bus.send(events::MESSAGE, json!({"text": "late"}));
        // The handler owned the only sender; once the task is gone the channel closes.
        let got = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
        assert_eq!(got, None);
    }

    #[test]
    fn send_without_listeners_is_fine() {
        let bus = EventBus::new(4);
        bus.send(events::STATUS, json!(null));
    }

    #[test]
    fn envelope_wire_form() {
        let envelope = Envelope::new(events::PROFILE, json!({"bio": "hi"}));
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["event"], "profile");
        assert!(json.get("sentAt").is_some());
        let back: Envelope = serde_json::from_value(json).unwrap();
        assert_eq!(back, envelope);
    }
}
