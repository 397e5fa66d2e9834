use crate::connection::ConnectionId;
use crate::message::{Envelope, Event};
use crate::publisher::Publisher;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;
use std::sync::Arc;

/// Handles domain events by converting them to real-time envelopes and
/// publishing them to every connected client.
///
/// The connection that caused the change (if the client identified it) is
/// excluded so it does not receive an echo of its own mutation.
pub struct WsDomainEventHandler {
    publisher: Arc<dyn Publisher>,
}

impl WsDomainEventHandler {
    pub fn new(publisher: Arc<dyn Publisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl EventHandler for WsDomainEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        let exclude = event.origin_connection_id().map(ConnectionId::from);

        let ws_event = match event {
            DomainEvent::PostCreated { post, .. } => {
                debug!("Handling PostCreated event");
                Event::PostCreated { post: post.clone() }
            }
            DomainEvent::PostUpdated { post, .. } => {
                debug!("Handling PostUpdated event");
                Event::PostUpdated { post: post.clone() }
            }
            DomainEvent::PostDeleted { post_id, .. } => {
                debug!("Handling PostDeleted event for post {post_id}");
                Event::PostDeleted {
                    post_id: post_id.to_string(),
                }
            }
        };

        self.publisher
            .publish(Envelope::from(ws_event), exclude.as_ref());
    }
}
