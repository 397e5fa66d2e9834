//! Event system infrastructure for rest_ws.
//!
//! This crate lets domain logic announce what happened without knowing who
//! listens (today: the WebSocket hub).
//!
//! # Architecture
//!
//! - **DomainEvent**: Enum representing all business events in the system
//! - **EventHandler**: Trait for implementing event handlers
//! - **EventPublisher**: Publishes events to registered handlers
//!
//! This crate has no dependencies on internal crates (entity, domain, etc.),
//! avoiding circular dependencies. Entity data is carried as serialized JSON values.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// A type alias that represents any Entity's internal id field data type.
/// This matches the definition in the entity crate to maintain compatibility.
pub type Id = Uuid;

/// Domain events that represent business-level changes in the system.
/// These events are emitted only after the underlying mutation was persisted.
///
/// `origin_connection_id` names the real-time connection of the user who caused
/// the change, if the client told us; handlers use it to avoid echoing the
/// event back to that connection.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A new post was stored. Carries the complete serialized post.
    PostCreated {
        post: Value,
        origin_connection_id: Option<Id>,
    },
    /// An existing post's content changed. Carries the complete updated post.
    PostUpdated {
        post: Value,
        origin_connection_id: Option<Id>,
    },
    /// A post was removed; only its id survives.
    PostDeleted {
        post_id: Id,
        origin_connection_id: Option<Id>,
    },
}

impl DomainEvent {
    pub fn origin_connection_id(&self) -> Option<Id> {
        match self {
            DomainEvent::PostCreated {
                origin_connection_id,
                ..
            }
            | DomainEvent::PostUpdated {
                origin_connection_id,
                ..
            }
            | DomainEvent::PostDeleted {
                origin_connection_id,
                ..
            } => *origin_connection_id,
        }
    }
}

/// Trait for handling domain events.
/// Implementations can perform side effects like sending notifications,
/// updating caches, logging, etc.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Publish an event to all registered handlers.
    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
