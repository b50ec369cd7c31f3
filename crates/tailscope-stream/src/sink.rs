use tracing::warn;

use tailscope_types::StreamEvent;

/// Topic prefix for per-session event streams
const TOPIC_PREFIX: &str = "logs/";

/// Derive the publish topic for a session
pub fn stream_topic(session_id: &str) -> String {
    format!("{TOPIC_PREFIX}{session_id}")
}

/// Receiver of typed session events.
///
/// Sessions emit through this seam instead of calling a transport directly,
/// so any delivery mechanism can be plugged in.
pub trait EventSink: Send + Sync + 'static {
    fn emit(&self, session_id: &str, event: StreamEvent);
}

/// Fire-and-forget delivery primitive of the subscriber transport.
pub trait Publisher: Send + Sync + 'static {
    fn publish(&self, topic: &str, payload: Vec<u8>);
}

/// Sink adapter that serializes events to JSON and forwards them to a
/// publisher, one call per event, on the session's derived topic.
pub struct PublishSink<P> {
    publisher: P,
}

impl<P: Publisher> PublishSink<P> {
    pub fn new(publisher: P) -> Self {
        Self { publisher }
    }
}

impl<P: Publisher> EventSink for PublishSink<P> {
    fn emit(&self, session_id: &str, event: StreamEvent) {
        match serde_json::to_vec(&event) {
            Ok(payload) => self.publisher.publish(&stream_topic(session_id), payload),
            Err(err) => {
                warn!(session_id, error = %err, "failed to encode stream event");
            }
        }
    }
}
