//! The session supervisor: orchestrates the full pairing lifecycle.
//!
//! The supervisor owns the three shared structures — connection registry,
//! matchmaking queue, room table — and every mutation goes through its
//! methods. The server wraps it in one async `Mutex`, so each inbound
//! event (connect, find-peer, join, leave, relay, disconnect) runs as a
//! single critical section: pairing (dequeue + room creation + both state
//! transitions) and teardown are atomic with respect to every concurrent
//! event, and no observer can see one side `Paired` while its partner is
//! still `Queued`.
//!
//! ```text
//! connect ──→ register ──→ enqueue ──→ ≥2 waiting? ──→ create room
//!                                                       │
//!                              both get send-offer ←────┘
//!                              join-room × 2 → ready → Active
//!                              leave/disconnect → teardown → peer-left
//! ```

use std::time::Duration;

use duet_match::MatchQueue;
use duet_protocol::{RoomId, ServerEvent};
use duet_room::{RoomError, RoomManager};
use duet_session::{ConnectionRegistry, EventSender, Identity, LinkState};
use duet_transport::ConnId;
use serde_json::Value;

use crate::{DuetError, Signal};

/// Configuration for supervisor behavior.
#[derive(Debug, Clone, Copy)]
pub struct SupervisorConfig {
    /// How long a connection may sit in the queue before the periodic
    /// sweep starts sending it `still-waiting` feedback. The queue never
    /// expires entries — a lone user simply keeps waiting.
    pub still_waiting_after: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            still_waiting_after: Duration::from_secs(30),
        }
    }
}

/// Orchestrates connections, the waiting queue, and rooms.
///
/// Owns all shared mutable state of the core. Not thread-safe by itself —
/// the server shares it behind an async `Mutex` (see the module docs).
pub struct Supervisor {
    registry: ConnectionRegistry,
    queue: MatchQueue,
    rooms: RoomManager,
    config: SupervisorConfig,
}

impl Supervisor {
    /// Creates an empty supervisor.
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            queue: MatchQueue::new(),
            rooms: RoomManager::new(),
            config,
        }
    }

    // -----------------------------------------------------------------
    // Lifecycle events
    // -----------------------------------------------------------------

    /// A new connection arrived: register it and enqueue it for pairing.
    ///
    /// # Errors
    /// Propagates registration failure (duplicate id — a caller bug).
    pub fn connect(
        &mut self,
        id: ConnId,
        identity: Option<Identity>,
        sender: EventSender,
    ) -> Result<(), DuetError> {
        self.registry.register(id.clone(), identity, sender)?;
        self.enqueue_and_pair(&id);
        Ok(())
    }

    /// An explicit "find me a peer" request.
    ///
    /// No-op unless the connection is in a state that may (re-)enter the
    /// queue; a connection that is already queued or already in a room
    /// keeps its position.
    pub fn find_peer(&mut self, conn: &ConnId) {
        let state = match self.registry.lookup(conn) {
            Ok(record) => record.state,
            Err(_) => {
                tracing::debug!(conn_id = %conn, "find-peer from unknown connection");
                return;
            }
        };
        if state.can_enqueue() {
            self.enqueue_and_pair(conn);
        } else {
            tracing::debug!(conn_id = %conn, %state, "find-peer ignored in this state");
        }
    }

    /// The connection joined its assigned room's messaging channel.
    ///
    /// The peer (if present) is told `ready`; once both members have
    /// joined, both transition `Paired → Active`. A join for a room the
    /// connection doesn't belong to earns an `error` event — that is a
    /// per-request problem (a malformed or stale room id), not a race.
    pub fn join_room(&mut self, conn: &ConnId, room: &RoomId) {
        match self.rooms.mark_joined(room, conn) {
            Ok(peer) => {
                if let Some(peer) = &peer {
                    self.registry.send_to(peer, ServerEvent::Ready);
                }
                if self.rooms.all_joined(room).unwrap_or(false) {
                    let members = self
                        .rooms
                        .get_room(room)
                        .map(|r| r.members().to_vec())
                        .unwrap_or_default();
                    for member in members {
                        if let Ok(record) = self.registry.lookup_mut(&member) {
                            record.state = LinkState::Active;
                        }
                    }
                    tracing::info!(room_id = %room, "room active, both members joined");
                }
            }
            Err(e) => {
                tracing::debug!(conn_id = %conn, room_id = %room, error = %e, "join-room rejected");
                self.registry.send_to(
                    conn,
                    ServerEvent::Error {
                        code: 404,
                        message: format!("cannot join room {room}"),
                    },
                );
            }
        }
    }

    /// An explicit leave: tear the room down, notify the peer, and put
    /// the leaver back in the queue as a fresh arrival.
    ///
    /// The remaining peer transitions to `Left` and stays there until it
    /// chooses to re-enter the queue itself.
    pub fn leave(&mut self, conn: &ConnId, room: &RoomId) {
        // The room named on the wire must be the room the connection is
        // actually in; a stale id (room already torn down) means there
        // is nothing left to leave.
        if self.rooms.member_room(conn) == Some(room) {
            match self.rooms.leave_room(&self.registry, room, conn) {
                Ok(remaining) => {
                    if let Some(peer) = remaining {
                        self.rooms.destroy_room(room);
                        if let Ok(record) = self.registry.lookup_mut(&peer) {
                            record.state = LinkState::Left;
                            record.room = None;
                        }
                    }
                    if let Ok(record) = self.registry.lookup_mut(conn) {
                        record.state = LinkState::Left;
                        record.room = None;
                    }
                }
                Err(e) => {
                    tracing::debug!(conn_id = %conn, room_id = %room, error = %e, "leave-room failed");
                }
            }
        } else {
            tracing::debug!(conn_id = %conn, room_id = %room, "leave-room for a room the connection is not in");
        }

        // Back of the queue, wait time discarded — re-queue is not
        // priority-preserving. find_peer refuses states that may not
        // re-enter, so a bogus leave cannot double-place a connection.
        self.find_peer(conn);
    }

    /// A transport-level disconnect. Cleans up queue and room membership
    /// like a leave, but the connection itself is gone — no re-enqueue.
    ///
    /// Idempotent: duplicate disconnect signals find nothing to clean up.
    pub fn disconnect(&mut self, conn: &ConnId) {
        if !self.registry.contains(conn) {
            tracing::debug!(conn_id = %conn, "duplicate disconnect, ignoring");
            return;
        }

        self.queue.remove(conn);

        if let Some((room, remaining)) = self.rooms.purge_connection(&self.registry, conn) {
            self.rooms.destroy_room(&room);
            if let Some(peer) = remaining {
                if let Ok(record) = self.registry.lookup_mut(&peer) {
                    record.state = LinkState::Left;
                    record.room = None;
                }
            }
        }

        if let Ok(record) = self.registry.lookup_mut(conn) {
            record.state = LinkState::Disconnected;
        }
        self.registry.unregister(conn);
    }

    // -----------------------------------------------------------------
    // Relays
    // -----------------------------------------------------------------

    /// Relays a chat line to the sender's room peer.
    pub fn chat(&mut self, conn: &ConnId, text: String) {
        let Some(room) = self.rooms.member_room(conn).cloned() else {
            tracing::debug!(conn_id = %conn, "chat from roomless connection, dropping");
            return;
        };
        let event = ServerEvent::Message {
            sender_id: conn.to_string(),
            text,
        };
        self.relay_or_drop(&room, conn, event);
    }

    /// Forwards a WebRTC signaling message to the room peer, verbatim.
    pub fn signal(&mut self, conn: &ConnId, room: &RoomId, signal: Signal) {
        let kind = signal.kind();
        tracing::trace!(conn_id = %conn, room_id = %room, kind, "relaying signal");
        self.relay_or_drop(room, conn, signal.into_event());
    }

    /// Relays a game event to the room peer, recording the payload in
    /// the room's state bag under the event name.
    pub fn game(&mut self, conn: &ConnId, room: &RoomId, event: String, payload: Value) {
        let relayed = ServerEvent::Game {
            sender_id: conn.to_string(),
            event: event.clone(),
            payload: payload.clone(),
        };
        let delivered = self.relay_or_drop(room, conn, relayed);
        if delivered {
            // Sender was a live member, so the room exists.
            let _ = self.rooms.record_state(room, event, payload);
        }
    }

    /// Common relay path: stale relays are dropped silently.
    /// Returns whether the relay was accepted (even with zero recipients).
    fn relay_or_drop(&self, room: &RoomId, sender: &ConnId, event: ServerEvent) -> bool {
        match self.rooms.relay(&self.registry, room, sender, event) {
            Ok(recipients) => {
                if recipients == 0 {
                    tracing::debug!(room_id = %room, "peer already left, relay dropped");
                }
                true
            }
            Err(RoomError::StaleRelay { .. }) => {
                tracing::debug!(conn_id = %sender, room_id = %room, "stale relay dropped");
                false
            }
            Err(e) => {
                tracing::debug!(conn_id = %sender, room_id = %room, error = %e, "relay failed");
                false
            }
        }
    }

    // -----------------------------------------------------------------
    // Pairing
    // -----------------------------------------------------------------

    /// Puts a connection at the back of the queue and runs the pairing
    /// loop.
    fn enqueue_and_pair(&mut self, conn: &ConnId) {
        if let Ok(record) = self.registry.lookup_mut(conn) {
            record.state = LinkState::Queued;
        }
        self.queue.enqueue(conn.clone());
        self.try_pair();
    }

    /// Pairs waiting connections until fewer than two remain.
    ///
    /// A dequeued candidate that vanished between enqueue and dequeue
    /// loses the race: the surviving candidate goes to the back of the
    /// queue and the loop retries. Room creation plus both `Paired`
    /// transitions plus both `send-offer` notifications happen inside
    /// this one call — atomic under the supervisor lock.
    fn try_pair(&mut self) {
        while let Some((first, second)) = self.queue.dequeue_pair() {
            let survivors: Vec<ConnId> = [&first, &second]
                .into_iter()
                .filter(|c| self.registry.contains(c))
                .cloned()
                .collect();

            if survivors.len() < 2 {
                // Race loss: someone disconnected after enqueueing.
                for survivor in survivors {
                    tracing::debug!(
                        conn_id = %survivor,
                        "pairing candidate vanished, re-queueing survivor"
                    );
                    self.queue.enqueue(survivor);
                }
                continue;
            }

            match self.rooms.create_room(&self.registry, &first, &second) {
                Ok(room_id) => {
                    for member in [&first, &second] {
                        if let Ok(record) = self.registry.lookup_mut(member) {
                            record.state = LinkState::Paired;
                            record.room = Some(room_id.clone());
                        }
                        self.registry.send_to(
                            member,
                            ServerEvent::SendOffer {
                                room_id: room_id.clone(),
                            },
                        );
                    }
                    tracing::info!(
                        room_id = %room_id,
                        first = %first,
                        second = %second,
                        "paired"
                    );
                }
                Err(e) => {
                    // Both were registered a moment ago; one of them hit
                    // an invalid-pairing condition anyway. Recover: put
                    // whoever is still pairable back and keep going.
                    tracing::warn!(error = %e, "room creation rejected a dequeued pair");
                    for candidate in [first, second] {
                        let pairable = self
                            .registry
                            .lookup(&candidate)
                            .map(|r| !r.state.in_room())
                            .unwrap_or(false);
                        if pairable {
                            self.queue.enqueue(candidate);
                        }
                    }
                    break;
                }
            }
        }
    }

    // -----------------------------------------------------------------
    // Queue sweep
    // -----------------------------------------------------------------

    /// Sends `still-waiting` feedback to every connection queued longer
    /// than the configured threshold. Called by the pulse task; never
    /// mutates the queue.
    pub fn sweep_waiting(&self) {
        for (conn, waited) in self.queue.waiting_longer_than(self.config.still_waiting_after) {
            self.registry.send_to(
                &conn,
                ServerEvent::StillWaiting {
                    waited_secs: waited.as_secs(),
                },
            );
        }
    }

    // -----------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of connections waiting in the queue.
    pub fn waiting_count(&self) -> usize {
        self.queue.len()
    }

    /// Number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.room_count()
    }
}

// =========================================================================
// Tests
// =========================================================================
