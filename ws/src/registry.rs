use crate::connection::{ConnectionHandle, ConnectionId, EnqueueError};
use crate::message::Envelope;
use dashmap::DashMap;
use log::*;
use std::sync::Arc;

/// What a single broadcast did. Purely informational; broadcasting never fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Connections whose outbound queue accepted the envelope
    pub delivered: usize,
    /// Connections disconnected because their queue was full or already closed
    pub evicted: usize,
}

/// The set of live connections, keyed by connection id.
///
/// Every operation takes a shard lock of the map once and never nests it, so
/// `register`, `unregister` and the iteration inside `broadcast` are atomic
/// with respect to each other's structural changes.
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, ConnectionHandle>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a connection, moving it to Open. A connection already closing is
    /// not registered. On an id collision the newer connection wins and the
    /// older one is closed.
    pub fn register(&self, handle: ConnectionHandle) {
        if !handle.mark_open() && !handle.is_open() {
            debug!(
                "Not registering connection {} in state {:?}",
                handle.id(),
                handle.state()
            );
            return;
        }

        let id = handle.id();
        let registered = handle.clone();

        if let Some(previous) = self.connections.insert(id, handle) {
            if !previous.same_connection(&registered) {
                warn!("Connection id {id} registered twice, closing the older connection");
                previous.close();
            }
        }

        // Teardown may have raced with the insert above
        if !registered.is_open() {
            self.remove_connection(&registered);
        }
    }

    /// Remove a connection by id and close it. Unknown ids are ignored.
    pub fn unregister(&self, connection_id: &ConnectionId) {
        if let Some((_, handle)) = self.connections.remove(connection_id) {
            handle.close();
            debug!("Unregistered connection {connection_id}");
        }
    }

    /// Removes `handle` only if the registry still holds that exact instance.
    pub(crate) fn remove_connection(&self, handle: &ConnectionHandle) -> bool {
        self.connections
            .remove_if(&handle.id(), |_, current| current.same_connection(handle))
            .is_some()
    }

    /// Hand `envelope` to the outbound queue of every registered connection
    /// except `exclude`. Never waits on a connection: a full queue gets that
    /// connection disconnected instead.
    pub fn broadcast(
        &self,
        envelope: Arc<Envelope>,
        exclude: Option<&ConnectionId>,
    ) -> BroadcastOutcome {
        let mut delivered = 0;
        let mut unhealthy = Vec::new();

        for entry in self.connections.iter() {
            if exclude == Some(entry.key()) {
                continue;
            }

            match entry.value().try_enqueue(Arc::clone(&envelope)) {
                Ok(()) => delivered += 1,
                Err(EnqueueError::Full) => {
                    warn!(
                        "Outbound queue full for connection {}, disconnecting it",
                        entry.key()
                    );
                    unhealthy.push(entry.value().clone());
                }
                Err(EnqueueError::Closed) => {
                    debug!("Connection {} is closing, dropping it", entry.key());
                    unhealthy.push(entry.value().clone());
                }
            }
        }

        // The iterator's shard guards are gone by now, so removal cannot deadlock
        for handle in &unhealthy {
            handle.close();
            self.remove_connection(handle);
        }

        BroadcastOutcome {
            delivered,
            evicted: unhealthy.len(),
        }
    }

    /// Close and remove every connection. Returns how many were closed.
    pub fn close_all(&self) -> usize {
        let handles: Vec<ConnectionHandle> = self
            .connections
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        for handle in &handles {
            handle.close();
            self.remove_connection(handle);
        }

        handles.len()
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.connections.contains_key(connection_id)
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.iter().map(|entry| *entry.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
