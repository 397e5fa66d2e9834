use crate::connection::{ClientConnection, ConnectionId};
use crate::message::{Envelope, Event};
use crate::publisher::Publisher;
use crate::registry::{BroadcastOutcome, ConnectionRegistry};
use axum::extract::ws::Message;
use futures::{Sink, Stream};
use log::*;
use std::fmt;
use std::sync::Arc;

/// Outbound queue size used when none is configured.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 64;

pub struct Hub {
    registry: Arc<ConnectionRegistry>,
    outbound_capacity: usize,
}

impl Hub {
    pub fn new(outbound_capacity: usize) -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
            outbound_capacity: outbound_capacity.max(1),
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Create a new, not yet registered connection with a fresh identity
    pub fn open_connection(&self) -> ClientConnection {
        ClientConnection::new(self.outbound_capacity)
    }

    /// Register `connection`, greet it with its own id and run it until it closes.
    pub async fn serve<S, R, E>(&self, connection: ClientConnection, sink: S, stream: R)
    where
        S: Sink<Message> + Send + Unpin + 'static,
        S::Error: fmt::Display + Send,
        R: Stream<Item = Result<Message, E>> + Unpin,
        E: fmt::Display,
    {
        let handle = connection.handle();
        let connection_id = handle.id();

        self.registry.register(handle.clone());
        info!(
            "Registered WebSocket connection {connection_id} ({} open)",
            self.registry.len()
        );

        let greeting: Envelope = Event::ConnectionEstablished {
            connection_id: connection_id.to_string(),
        }
        .into();
        if let Err(e) = handle.try_enqueue(Arc::new(greeting)) {
            warn!("Could not greet connection {connection_id}: {e:?}");
        }

        connection
            .run(sink, stream, Arc::clone(&self.registry))
            .await;

        info!(
            "WebSocket connection {connection_id} finished ({} open)",
            self.registry.len()
        );
    }

    /// Fan `envelope` out to every registered connection except `exclude`
    pub fn broadcast(&self, envelope: Envelope, exclude: Option<&ConnectionId>) -> BroadcastOutcome {
        let kind = envelope.kind().to_owned();
        let outcome = self.registry.broadcast(Arc::new(envelope), exclude);

        debug!(
            "Broadcast {kind} to {} connection(s), evicted {}",
            outcome.delivered, outcome.evicted
        );

        outcome
    }

    /// Close every connection; both loops of each exit promptly.
    pub fn shutdown(&self) {
        let closed = self.registry.close_all();
        info!("Hub shut down, closed {closed} WebSocket connection(s)");
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(DEFAULT_OUTBOUND_CAPACITY)
    }
}

impl Publisher for Hub {
    fn publish(&self, envelope: Envelope, exclude: Option<&ConnectionId>) {
        self.broadcast(envelope, exclude);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionState;
    use futures::channel::mpsc as transport;
    use futures::{FutureExt, StreamExt};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio::task::JoinHandle;

    /// The client side of an in-memory connection served by the hub.
    struct TestClient {
        id: ConnectionId,
        written: transport::UnboundedReceiver<Message>,
        inbound: transport::UnboundedSender<Result<Message, String>>,
        task: JoinHandle<()>,
    }

    impl TestClient {
        async fn next_json(&mut self) -> Value {
            let frame = tokio::time::timeout(Duration::from_secs(5), self.written.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("transport closed");
            match frame {
                Message::Text(text) => serde_json::from_str(&text).unwrap(),
                other => panic!("expected a text frame, got {other:?}"),
            }
        }

        /// Nothing else has been written by the time the hub has gone idle.
        fn assert_nothing_pending(&mut self) {
            assert!(
                !matches!(self.written.next().now_or_never(), Some(Some(_))),
                "unexpected frame"
            );
        }
    }

    async fn connect(hub: &Arc<Hub>) -> TestClient {
        let (sink, written) = transport::unbounded::<Message>();
        let (inbound, stream) = transport::unbounded::<Result<Message, String>>();
        let connection = hub.open_connection();
        let id = connection.id();

        let served = Arc::clone(hub);
        let task = tokio::spawn(async move { served.serve(connection, sink, stream).await });

        let mut client = TestClient {
            id,
            written,
            inbound,
            task,
        };
        let greeting = client.next_json().await;
        assert_eq!(greeting["type"], "connection_established");
        assert_eq!(greeting["payload"]["connection_id"], id.to_string());
        client
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn publish_reaches_everyone_except_the_excluded_connection() {
        let hub = Arc::new(Hub::new(8));
        let mut a = connect(&hub).await;
        let mut b = connect(&hub).await;
        let mut c = connect(&hub).await;

        hub.publish(
            Envelope::new("post_create", json!({"id": "p1", "content": "hi"})),
            Some(&b.id),
        );

        let expected = json!({"type": "post_create", "payload": {"id": "p1", "content": "hi"}});
        assert_eq!(a.next_json().await, expected);
        assert_eq!(c.next_json().await, expected);

        // Give the send loops a moment; B must still have nothing
        tokio::time::sleep(Duration::from_millis(50)).await;
        a.assert_nothing_pending();
        b.assert_nothing_pending();
        c.assert_nothing_pending();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn externally_closed_transport_is_removed_without_leaking_tasks() {
        let hub = Arc::new(Hub::new(16));
        let a = connect(&hub).await;
        let mut b = connect(&hub).await;
        assert_eq!(hub.connection_count(), 2);

        for n in 0..5 {
            hub.broadcast(Envelope::new("post_create", json!({ "n": n })), Some(&b.id));
        }

        // Drop A's transport with those envelopes still queued or in flight
        let TestClient {
            id: a_id,
            written,
            inbound,
            task: a_task,
        } = a;
        drop(written);
        drop(inbound);

        tokio::time::timeout(Duration::from_secs(5), a_task)
            .await
            .expect("connection A's loops are still running")
            .unwrap();
        assert!(!hub.registry().contains(&a_id));

        let outcome = hub.broadcast(Envelope::new("post_create", json!({"n": 5})), None);
        assert_eq!(outcome.delivered, 1);
        assert_eq!(b.next_json().await["payload"]["n"], 5);

        b.inbound.unbounded_send(Ok(Message::Close(None))).unwrap();
        b.task.await.unwrap();
        assert_eq!(hub.connection_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn shutdown_closes_every_connection() {
        let hub = Arc::new(Hub::new(8));
        let a = connect(&hub).await;
        let b = connect(&hub).await;
        assert!(hub.registry().contains(&a.id));
        assert!(hub.registry().contains(&b.id));

        hub.shutdown();

        for task in [a.task, b.task] {
            tokio::time::timeout(Duration::from_secs(5), task)
                .await
                .expect("loops did not exit on shutdown")
                .unwrap();
        }
        assert_eq!(hub.connection_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn slow_consumer_is_disconnected_instead_of_stalling_the_hub() {
        let hub = Arc::new(Hub::new(1));
        let connection = hub.open_connection();
        let handle = connection.handle();
        // Registered but never run, so nothing drains its queue
        hub.registry().register(connection.handle());

        let first = hub.broadcast(Envelope::new("post_create", json!({})), None);
        let second = hub.broadcast(Envelope::new("post_create", json!({})), None);

        assert_eq!(first.delivered, 1);
        assert_eq!(second.evicted, 1);
        assert_eq!(handle.state(), ConnectionState::Closing);
        assert_eq!(hub.connection_count(), 0);
        drop(connection);
    }
}
