//! The connection registry: tracks every live connection.
//!
//! This is the leaf dependency of the core — the matchmaking queue and
//! the room manager both resolve [`ConnId`]s through it, and outbound
//! events to any connection are delivered through the sender it holds.
//!
//! # Concurrency note
//!
//! `ConnectionRegistry` is NOT thread-safe by itself — it uses a plain
//! `HashMap`, not a concurrent one. This is intentional: the registry is
//! owned by the supervisor and accessed under its lock at a higher level.
//! Keeping it simple here avoids hidden locking overhead.

use std::collections::HashMap;

use duet_protocol::ServerEvent;
use duet_transport::ConnId;

use crate::{Connection, EventSender, Identity, SessionError};

/// Tracks all live connections, keyed by [`ConnId`].
///
/// Registering a connection makes it visible to the matchmaking queue and
/// the room manager. `lookup` on an unknown id signals
/// [`SessionError::NotFound`]; callers treat that as "already
/// disconnected", never as fatal.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    conns: HashMap<ConnId, Connection>,
}

impl ConnectionRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            conns: HashMap::new(),
        }
    }

    /// Registers a new connection.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyRegistered`] if the id is already
    /// live — the transport guarantees unique ids, so this indicates a
    /// caller bug rather than a routine race.
    pub fn register(
        &mut self,
        id: ConnId,
        identity: Option<Identity>,
        sender: EventSender,
    ) -> Result<&Connection, SessionError> {
        if self.conns.contains_key(&id) {
            return Err(SessionError::AlreadyRegistered(id));
        }

        let conn = Connection::new(id.clone(), identity, sender);
        self.conns.insert(id.clone(), conn);
        tracing::info!(conn_id = %id, "connection registered");

        Ok(self.conns.get(&id).expect("just inserted"))
    }

    /// Removes a connection, returning its final record if it was live.
    ///
    /// Unregistering an unknown id is a no-op — the connection is simply
    /// already gone.
    pub fn unregister(&mut self, id: &ConnId) -> Option<Connection> {
        let removed = self.conns.remove(id);
        if removed.is_some() {
            tracing::info!(conn_id = %id, "connection unregistered");
        }
        removed
    }

    /// Looks up a connection by id.
    pub fn lookup(&self, id: &ConnId) -> Result<&Connection, SessionError> {
        self.conns
            .get(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))
    }

    /// Looks up a connection by id for mutation.
    pub fn lookup_mut(&mut self, id: &ConnId) -> Result<&mut Connection, SessionError> {
        self.conns
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))
    }

    /// Returns `true` if the id refers to a live connection.
    pub fn contains(&self, id: &ConnId) -> bool {
        self.conns.contains_key(id)
    }

    /// Delivers an event to a single connection. Silently drops the event
    /// if the connection is gone or its writer task has exited; returns
    /// whether the event was handed to a live channel.
    pub fn send_to(&self, id: &ConnId, event: ServerEvent) -> bool {
        match self.conns.get(id) {
            Some(conn) => conn.sender.send(event).is_ok(),
            None => false,
        }
    }

    /// Returns the number of live connections.
    pub fn len(&self) -> usize {
        self.conns.len()
    }

    /// Returns `true` if there are no live connections.
    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
