//! Post operations. Every successful mutation is announced as a `DomainEvent`
//! after it has been persisted; a failed mutation announces nothing.

use crate::error::{EntityErrorKind, Error};
use crate::posts::Model;
use crate::Id;
use entity_api::post;
use events::{DomainEvent, EventPublisher};
use log::*;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::Value;

pub use entity_api::post::{find_by_id, find_page};

/// Publishes `to_event(record)` once the record is stored. The write has
/// already succeeded, so a record that cannot be serialized is logged and
/// not announced rather than failing the request.
async fn announce<T: Serialize>(
    event_publisher: &EventPublisher,
    id: Id,
    record: &T,
    to_event: impl FnOnce(Value) -> DomainEvent,
) {
    match serde_json::to_value(record) {
        Ok(value) => event_publisher.publish(to_event(value)).await,
        Err(e) => error!("Not announcing post {id}, serialization failed: {e}"),
    }
}

pub async fn create(
    db: &DatabaseConnection,
    event_publisher: &EventPublisher,
    user_id: Id,
    post_content: String,
    origin_connection_id: Option<Id>,
) -> Result<Model, Error> {
    if post_content.trim().is_empty() {
        return Err(Error::entity(EntityErrorKind::Invalid));
    }

    let created = post::create(db, user_id, post_content).await?;
    debug!("Created post {} for user {user_id}", created.id);

    announce(event_publisher, created.id, &created, |post| {
        DomainEvent::PostCreated {
            post,
            origin_connection_id,
        }
    })
    .await;

    Ok(created)
}

pub async fn update(
    db: &DatabaseConnection,
    event_publisher: &EventPublisher,
    id: Id,
    user_id: Id,
    post_content: String,
    origin_connection_id: Option<Id>,
) -> Result<Model, Error> {
    if post_content.trim().is_empty() {
        return Err(Error::entity(EntityErrorKind::Invalid));
    }

    let updated = post::update(db, id, user_id, post_content).await?;
    debug!("Updated post {id}");

    announce(event_publisher, id, &updated, |post| DomainEvent::PostUpdated {
        post,
        origin_connection_id,
    })
    .await;

    Ok(updated)
}

pub async fn delete(
    db: &DatabaseConnection,
    event_publisher: &EventPublisher,
    id: Id,
    user_id: Id,
    origin_connection_id: Option<Id>,
) -> Result<(), Error> {
    post::delete(db, id, user_id).await?;
    debug!("Deleted post {id}");

    event_publisher
        .publish(DomainEvent::PostDeleted {
            post_id: id,
            origin_connection_id,
        })
        .await;

    Ok(())
}


#[cfg(test)]
mod announce_tests {
    use super::*;
    use async_trait::async_trait;
    use events::EventHandler;
    use serde::Serializer;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct CountingHandler {
        seen: Mutex<usize>,
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle(&self, _event: &DomainEvent) {
            *self.seen.lock().unwrap() += 1;
        }
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("not representable"))
        }
    }

    #[tokio::test]
    async fn unserializable_record_is_skipped_without_failing() {
        let handler = Arc::new(CountingHandler::default());
        let publisher = EventPublisher::new().with_handler(handler.clone());

        announce(&publisher, Id::new_v4(), &Unserializable, |post| {
            DomainEvent::PostCreated {
                post,
                origin_connection_id: None,
            }
        })
        .await;

        assert_eq!(*handler.seen.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn serializable_record_is_published() {
        let handler = Arc::new(CountingHandler::default());
        let publisher = EventPublisher::new().with_handler(handler.clone());

        announce(&publisher, Id::new_v4(), &serde_json::json!({"id": "p1"}), |post| {
            DomainEvent::PostUpdated {
                post,
                origin_connection_id: None,
            }
        })
        .await;

        assert_eq!(*handler.seen.lock().unwrap(), 1);
    }
}
