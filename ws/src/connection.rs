use crate::message::Envelope;
use crate::registry::ConnectionRegistry;
use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use log::*;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use uuid::Uuid;

/// How long the send loop waits for the close handshake before dropping the transport.
const CLOSE_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ConnectionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for ConnectionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConnectionState::Connecting,
            1 => ConnectionState::Open,
            2 => ConnectionState::Closing,
            _ => ConnectionState::Closed,
        }
    }
}

/// State flag plus close signal, shared by both loops of one connection and by
/// every handle to it.
#[derive(Debug)]
struct Lifecycle {
    state: AtomicU8,
    close_signal: watch::Sender<bool>,
}

impl Lifecycle {
    fn new() -> Self {
        let (close_signal, _) = watch::channel(false);
        Self {
            state: AtomicU8::new(ConnectionState::Connecting as u8),
            close_signal,
        }
    }

    fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn open(&self) -> bool {
        self.state
            .compare_exchange(
                ConnectionState::Connecting as u8,
                ConnectionState::Open as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Moves the connection to Closing and fires the close signal. Only the
    /// first caller gets `true`.
    fn close(&self) -> bool {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current >= ConnectionState::Closing as u8 {
                return false;
            }
            match self.state.compare_exchange_weak(
                current,
                ConnectionState::Closing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.close_signal.send_replace(true);
                    return true;
                }
                Err(actual) => current = actual,
            }
        }
    }

    fn finish(&self) {
        self.state
            .store(ConnectionState::Closed as u8, Ordering::Release);
        self.close_signal.send_replace(true);
    }
}

/// Resolves once the close signal has fired.
async fn close_requested(signal: &mut watch::Receiver<bool>) {
    loop {
        let requested = *signal.borrow_and_update();
        if requested || signal.changed().await.is_err() {
            return;
        }
    }
}

/// Why an envelope could not be handed to a connection's outbound queue.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum EnqueueError {
    Full,
    Closed,
}

/// Cheap, cloneable view of a connection: its identity, the producer side of
/// its outbound queue, and its lifecycle. This is what the registry stores.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::Sender<Arc<Envelope>>,
    lifecycle: Arc<Lifecycle>,
}

impl ConnectionHandle {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.lifecycle.state()
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Requests teardown of the connection. Idempotent; returns `true` only for
    /// the call that actually initiated it.
    pub fn close(&self) -> bool {
        self.lifecycle.close()
    }

    /// Waits until teardown of this connection has been requested.
    pub async fn wait_closed(&self) {
        let mut signal = self.lifecycle.close_signal.subscribe();
        close_requested(&mut signal).await;
    }

    pub(crate) fn mark_open(&self) -> bool {
        self.lifecycle.open()
    }

    pub(crate) fn try_enqueue(&self, envelope: Arc<Envelope>) -> Result<(), EnqueueError> {
        if !self.is_open() {
            return Err(EnqueueError::Closed);
        }

        self.outbound.try_send(envelope).map_err(|e| match e {
            TrySendError::Full(_) => EnqueueError::Full,
            TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }

    /// True when both handles refer to the very same connection instance, not
    /// merely the same identity.
    pub(crate) fn same_connection(&self, other: &ConnectionHandle) -> bool {
        Arc::ptr_eq(&self.lifecycle, &other.lifecycle)
    }
}

/// One real-time client: its handle plus the consumer side of its outbound
/// queue, which is moved into the send loop when the connection runs.
#[derive(Debug)]
pub struct ClientConnection {
    handle: ConnectionHandle,
    outbound: mpsc::Receiver<Arc<Envelope>>,
}

impl ClientConnection {
    /// Creates a connection in the Connecting state with a fresh identity and
    /// an outbound queue bounded to `capacity` envelopes.
    pub fn new(capacity: usize) -> Self {
        Self::with_id(ConnectionId::new(), capacity)
    }

    pub(crate) fn with_id(id: ConnectionId, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));

        Self {
            handle: ConnectionHandle {
                id,
                outbound: tx,
                lifecycle: Arc::new(Lifecycle::new()),
            },
            outbound: rx,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.handle.id
    }

    pub fn handle(&self) -> ConnectionHandle {
        self.handle.clone()
    }

    #[cfg(test)]
    pub(crate) fn drain_outbound(&mut self) -> Vec<Arc<Envelope>> {
        let mut drained = Vec::new();
        while let Ok(envelope) = self.outbound.try_recv() {
            drained.push(envelope);
        }
        drained
    }

    /// Drives the connection until it closes: the send loop runs on its own task
    /// while the receive loop runs on the caller's task. Returns once both loops
    /// have exited and the connection is Closed.
    pub async fn run<S, R, E>(self, sink: S, stream: R, registry: Arc<ConnectionRegistry>)
    where
        S: Sink<Message> + Send + Unpin + 'static,
        S::Error: fmt::Display + Send,
        R: Stream<Item = Result<Message, E>> + Unpin,
        E: fmt::Display,
    {
        let ClientConnection { handle, outbound } = self;

        let send_task = tokio::spawn(send_loop(
            handle.clone(),
            outbound,
            sink,
            Arc::clone(&registry),
        ));

        receive_loop(&handle, stream, &registry).await;

        if let Err(e) = send_task.await {
            error!("Send loop for connection {} ended abnormally: {e}", handle.id);
            teardown(&handle, &registry);
        }

        handle.lifecycle.finish();
        debug!("Connection {} closed", handle.id);
    }
}

/// Either loop may call this; only the first call does any work on the
/// lifecycle, and registry removal only ever matches this exact instance.
fn teardown(handle: &ConnectionHandle, registry: &ConnectionRegistry) {
    if handle.close() {
        debug!("Tearing down connection {}", handle.id);
    }
    registry.remove_connection(handle);
}

async fn send_loop<S>(
    handle: ConnectionHandle,
    mut outbound: mpsc::Receiver<Arc<Envelope>>,
    mut sink: S,
    registry: Arc<ConnectionRegistry>,
) where
    S: Sink<Message> + Unpin,
    S::Error: fmt::Display,
{
    let mut close_signal = handle.lifecycle.close_signal.subscribe();

    loop {
        let envelope = tokio::select! {
            biased;
            _ = close_requested(&mut close_signal) => break,
            next = outbound.recv() => match next {
                Some(envelope) => envelope,
                None => break,
            },
        };

        let text = match envelope.to_json() {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to serialize {} envelope: {e}", envelope.kind());
                continue;
            }
        };

        tokio::select! {
            biased;
            _ = close_requested(&mut close_signal) => break,
            result = sink.send(Message::Text(text)) => {
                if let Err(e) = result {
                    warn!("Write to connection {} failed: {e}", handle.id);
                    break;
                }
            }
        }
    }

    teardown(&handle, &registry);

    match tokio::time::timeout(CLOSE_GRACE_PERIOD, sink.close()).await {
        Ok(Ok(())) => trace!("Transport for connection {} closed", handle.id),
        Ok(Err(e)) => debug!("Closing transport for connection {}: {e}", handle.id),
        Err(_) => debug!("Close handshake for connection {} timed out", handle.id),
    }
}

async fn receive_loop<R, E>(handle: &ConnectionHandle, mut stream: R, registry: &ConnectionRegistry)
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    let mut close_signal = handle.lifecycle.close_signal.subscribe();

    loop {
        tokio::select! {
            biased;
            _ = close_requested(&mut close_signal) => break,
            frame = stream.next() => match frame {
                Some(Ok(Message::Close(frame))) => {
                    debug!("Connection {} sent close frame: {frame:?}", handle.id);
                    break;
                }
                Some(Ok(Message::Text(text))) => {
                    trace!("Ignoring {} byte text frame from connection {}", text.len(), handle.id);
                }
                Some(Ok(Message::Binary(data))) => {
                    trace!("Ignoring {} byte binary frame from connection {}", data.len(), handle.id);
                }
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                    trace!("Control frame from connection {}", handle.id);
                }
                Some(Err(e)) => {
                    warn!("Read from connection {} failed: {e}", handle.id);
                    break;
                }
                None => {
                    debug!("Connection {} stream ended", handle.id);
                    break;
                }
            },
        }
    }

    teardown(handle, registry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc as transport;
    use serde_json::json;

    type Inbound = Result<Message, String>;

    fn envelope(n: u64) -> Arc<Envelope> {
        Arc::new(Envelope::new("post_create", json!({ "n": n })))
    }

    fn text_of(message: Message) -> serde_json::Value {
        match message {
            Message::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("expected a text frame, got {other:?}"),
        }
    }

    #[test]
    fn new_connection_starts_connecting_with_unique_ids() {
        let a = ClientConnection::new(4);
        let b = ClientConnection::new(4);

        assert_eq!(a.handle().state(), ConnectionState::Connecting);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn connection_id_parses_from_its_display_form() {
        let id = ConnectionId::new();

        let parsed: ConnectionId = id.to_string().parse().unwrap();

        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<ConnectionId>().is_err());
    }

    #[test]
    fn close_is_idempotent_and_terminal() {
        let connection = ClientConnection::new(4);
        let handle = connection.handle();
        assert!(handle.mark_open());

        assert!(handle.close());
        assert!(!handle.close());
        assert_eq!(handle.state(), ConnectionState::Closing);
        // A closing connection can never be reopened
        assert!(!handle.mark_open());
    }

    #[test]
    fn enqueue_is_refused_unless_open_and_reports_a_full_queue() {
        let connection = ClientConnection::new(1);
        let handle = connection.handle();

        assert_eq!(handle.try_enqueue(envelope(0)), Err(EnqueueError::Closed));

        handle.mark_open();
        assert_eq!(handle.try_enqueue(envelope(1)), Ok(()));
        assert_eq!(handle.try_enqueue(envelope(2)), Err(EnqueueError::Full));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn send_loop_writes_envelopes_in_fifo_order() {
        let registry = Arc::new(ConnectionRegistry::new());
        let connection = ClientConnection::new(8);
        let handle = connection.handle();
        registry.register(handle.clone());

        let (sink, mut written) = transport::unbounded::<Message>();
        let (inbound_tx, inbound_rx) = transport::unbounded::<Inbound>();
        let task = tokio::spawn(connection.run(sink, inbound_rx, Arc::clone(&registry)));

        for n in 0..3 {
            handle.try_enqueue(envelope(n)).unwrap();
        }
        for n in 0..3 {
            let frame = written.next().await.unwrap();
            assert_eq!(text_of(frame), json!({"type": "post_create", "payload": {"n": n}}));
        }

        drop(inbound_tx);
        task.await.unwrap();
        assert_eq!(handle.state(), ConnectionState::Closed);
        assert!(!registry.contains(&handle.id()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn close_frame_tears_down_both_loops_and_unregisters() {
        let registry = Arc::new(ConnectionRegistry::new());
        let connection = ClientConnection::new(8);
        let handle = connection.handle();
        registry.register(handle.clone());

        let (sink, _written) = transport::unbounded::<Message>();
        let (inbound_tx, inbound_rx) = transport::unbounded::<Inbound>();
        let task = tokio::spawn(connection.run(sink, inbound_rx, Arc::clone(&registry)));

        inbound_tx
            .unbounded_send(Ok(Message::Ping(vec![1])))
            .unwrap();
        inbound_tx.unbounded_send(Ok(Message::Close(None))).unwrap();

        task.await.unwrap();
        assert_eq!(handle.state(), ConnectionState::Closed);
        assert!(registry.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn read_error_tears_down_the_connection() {
        let registry = Arc::new(ConnectionRegistry::new());
        let connection = ClientConnection::new(8);
        let handle = connection.handle();
        registry.register(handle.clone());

        let (sink, _written) = transport::unbounded::<Message>();
        let (inbound_tx, inbound_rx) = transport::unbounded::<Inbound>();
        let task = tokio::spawn(connection.run(sink, inbound_rx, Arc::clone(&registry)));

        inbound_tx
            .unbounded_send(Err("connection reset".to_string()))
            .unwrap();

        task.await.unwrap();
        assert!(!registry.contains(&handle.id()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn write_failure_tears_down_even_while_reads_are_idle() {
        let registry = Arc::new(ConnectionRegistry::new());
        let connection = ClientConnection::new(8);
        let handle = connection.handle();
        registry.register(handle.clone());

        let (sink, written) = transport::unbounded::<Message>();
        // Keep the inbound side open so only the send loop can notice the failure
        let (_inbound_tx, inbound_rx) = transport::unbounded::<Inbound>();
        drop(written);

        let task = tokio::spawn(connection.run(sink, inbound_rx, Arc::clone(&registry)));
        handle.try_enqueue(envelope(1)).unwrap();

        task.await.unwrap();
        assert_eq!(handle.state(), ConnectionState::Closed);
        assert!(registry.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn external_close_unblocks_both_loops() {
        let registry = Arc::new(ConnectionRegistry::new());
        let connection = ClientConnection::new(8);
        let handle = connection.handle();
        registry.register(handle.clone());

        let (sink, _written) = transport::unbounded::<Message>();
        let (_inbound_tx, inbound_rx) = transport::unbounded::<Inbound>();
        let task = tokio::spawn(connection.run(sink, inbound_rx, Arc::clone(&registry)));

        registry.unregister(&handle.id());

        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("connection loops did not exit")
            .unwrap();
        assert_eq!(handle.state(), ConnectionState::Closed);
    }
}
