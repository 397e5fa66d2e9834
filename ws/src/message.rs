use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Trait for getting the wire `type` tag of an event
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

/// The unit of real-time communication: `{"type": ..., "payload": ...}`.
///
/// Fields are private so an envelope cannot be changed once built. A single
/// broadcast shares one `Arc<Envelope>` between all of its recipients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    payload: Value,
}

impl Envelope {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Builds an envelope from any serializable payload, e.g. a persisted model.
    pub fn from_serializable<T: Serialize>(
        kind: impl Into<String>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(kind, serde_json::to_value(payload)?))
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Serializes the envelope to its JSON text wire form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Server events with a known shape. Clients must ignore tags they do not know,
/// so new variants can be added freely.
#[derive(Debug, Clone)]
pub enum Event {
    PostCreated { post: Value },
    PostUpdated { post: Value },
    PostDeleted { post_id: String },
    ConnectionEstablished { connection_id: String },
}

impl EventType for Event {
    fn event_type(&self) -> &'static str {
        match self {
            Event::PostCreated { .. } => "post_create",
            Event::PostUpdated { .. } => "post_update",
            Event::PostDeleted { .. } => "post_delete",
            Event::ConnectionEstablished { .. } => "connection_established",
        }
    }
}

impl From<Event> for Envelope {
    fn from(event: Event) -> Self {
        let kind = event.event_type();
        let payload = match event {
            // The payload of a post event is the post record itself
            Event::PostCreated { post } | Event::PostUpdated { post } => post,
            Event::PostDeleted { post_id } => json!({ "id": post_id }),
            Event::ConnectionEstablished { connection_id } => {
                json!({ "connection_id": connection_id })
            }
        };
        Envelope::new(kind, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_with_type_and_payload_keys() {
        let envelope = Envelope::new("post_create", json!({"id": "p1", "content": "hi"}));

        let wire: Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();

        assert_eq!(
            wire,
            json!({"type": "post_create", "payload": {"id": "p1", "content": "hi"}})
        );
    }

    #[test]
    fn envelope_from_serializable_keeps_the_record_shape() {
        #[derive(Serialize)]
        struct Post {
            id: &'static str,
            post_content: &'static str,
        }

        let envelope = Envelope::from_serializable(
            "post_create",
            &Post {
                id: "p1",
                post_content: "hello",
            },
        )
        .unwrap();

        assert_eq!(envelope.kind(), "post_create");
        assert_eq!(
            envelope.payload(),
            &json!({"id": "p1", "post_content": "hello"})
        );
    }

    #[test]
    fn post_created_event_carries_post_as_payload() {
        let envelope: Envelope = Event::PostCreated {
            post: json!({"id": "p1"}),
        }
        .into();

        assert_eq!(envelope.kind(), "post_create");
        assert_eq!(envelope.payload(), &json!({"id": "p1"}));
    }

    #[test]
    fn post_deleted_event_carries_only_the_id() {
        let envelope: Envelope = Event::PostDeleted {
            post_id: "p9".to_string(),
        }
        .into();

        assert_eq!(envelope.kind(), "post_delete");
        assert_eq!(envelope.payload(), &json!({"id": "p9"}));
    }

    #[test]
    fn unknown_types_still_round_trip() {
        let raw = r#"{"type":"something_new","payload":[1,2,3]}"#;

        let envelope: Envelope = serde_json::from_str(raw).unwrap();

        assert_eq!(envelope.kind(), "something_new");
        assert_eq!(envelope.payload(), &json!([1, 2, 3]));
    }
}
