//! WebSocket infrastructure for real-time post notifications.
//!
//! This crate owns the broadcast hub: it tracks every connected real-time
//! client and fans domain events out to them without ever blocking the
//! request that produced the event.
//!
//! # Architecture
//!
//! - **Registry**: a sharded concurrent map from `ConnectionId` to a cheap
//!   connection handle. Register, unregister and broadcast each take a shard
//!   lock once and never nest it.
//! - **Two loops per connection**: a send loop owning the write half of the
//!   socket and a receive loop owning the read half. Either one can start
//!   teardown; a close-once guard plus a shared close signal stops the other.
//! - **Bounded queues and backpressure**: every connection has a bounded
//!   outbound queue. Broadcasting never waits for it; a full queue gets that
//!   connection disconnected.
//! - **Ephemeral messages**: nothing is stored or replayed. A client that is
//!   offline misses the event and sees fresh data on its next request.
//!
//! # Message Flow
//!
//! 1. A client upgrades `GET /ws`; the hub registers a `ClientConnection`
//!    and greets it with a `connection_established` envelope carrying its id.
//! 2. A controller persists a post and the domain layer publishes a
//!    `DomainEvent` through the `EventPublisher`.
//! 3. `WsDomainEventHandler` turns it into an `Envelope` and calls
//!    `Publisher::publish`, which enqueues it for every other connection.
//! 4. Each send loop writes `{"type": ..., "payload": ...}` to its socket.
//!
//! # Modules
//!
//! - `connection`: ConnectionId, connection state and the send/receive loops
//! - `registry`: ConnectionRegistry and the broadcast algorithm
//! - `hub`: Hub, the entry point used by the web layer
//! - `publisher`: the Publisher trait used by request handlers
//! - `message`: Envelope and typed server events
//! - `domain_event_handler`: bridge from domain events to envelopes

pub mod connection;
pub mod domain_event_handler;
pub mod hub;
pub mod message;
pub mod publisher;
pub mod registry;

pub use connection::{ClientConnection, ConnectionId, ConnectionState};
pub use domain_event_handler::WsDomainEventHandler;
pub use hub::Hub;
pub use message::Envelope;
pub use publisher::Publisher;
pub use registry::{BroadcastOutcome, ConnectionRegistry};
