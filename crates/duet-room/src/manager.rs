//! Room manager: creates, tracks, and tears down rooms, and fans relayed
//! events out to room members.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use duet_protocol::{RoomId, ServerEvent};
use duet_session::ConnectionRegistry;
use duet_transport::ConnId;
use rand::Rng;

use crate::{Room, RoomError};

/// Counter half of the room id generator. The counter alone guarantees
/// process-wide uniqueness; the random suffix keeps ids unguessable.
static NEXT_ROOM_SEQ: AtomicU64 = AtomicU64::new(1);

/// Manages all active rooms and tracks which connection is in which room.
///
/// This is the entry point for room operations from the supervisor. Like
/// the registry and the queue it is a plain single-owner structure; the
/// supervisor's lock is the mutual-exclusion discipline, which makes
/// create/teardown atomic with respect to concurrent events.
#[derive(Debug, Default)]
pub struct RoomManager {
    /// Active rooms, keyed by room id.
    rooms: HashMap<RoomId, Room>,

    /// Maps each connection to the room it's currently in.
    /// A connection can be in at most ONE room at a time (key invariant).
    member_rooms: HashMap<ConnId, RoomId>,
}

impl RoomManager {
    /// Creates a new, empty room manager.
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            member_rooms: HashMap::new(),
        }
    }

    /// Creates a room binding two connections and returns its id.
    ///
    /// # Errors
    /// Returns [`RoomError::InvalidPairing`] if the two ids are identical
    /// (self-pairing is forbidden), if either connection is not
    /// registered, or if either is already in a room.
    pub fn create_room(
        &mut self,
        registry: &ConnectionRegistry,
        first: &ConnId,
        second: &ConnId,
    ) -> Result<RoomId, RoomError> {
        if first == second {
            return Err(RoomError::InvalidPairing(format!(
                "cannot pair connection {first} with itself"
            )));
        }
        for conn in [first, second] {
            if !registry.contains(conn) {
                return Err(RoomError::InvalidPairing(format!(
                    "connection {conn} is not registered"
                )));
            }
            if let Some(existing) = self.member_rooms.get(conn) {
                return Err(RoomError::InvalidPairing(format!(
                    "connection {conn} is already in room {existing}"
                )));
            }
        }

        let room_id = self.generate_room_id();
        let room = Room::new(room_id.clone(), first.clone(), second.clone());
        self.rooms.insert(room_id.clone(), room);
        self.member_rooms.insert(first.clone(), room_id.clone());
        self.member_rooms.insert(second.clone(), room_id.clone());

        tracing::info!(
            room_id = %room_id,
            first = %first,
            second = %second,
            "room created"
        );
        Ok(room_id)
    }

    /// Generates a fresh room id: monotonic counter plus random suffix,
    /// re-rolled until it collides with no live room. The counter already
    /// makes collisions impossible within one process; the loop keeps the
    /// guarantee even if ids ever come from elsewhere.
    fn generate_room_id(&self) -> RoomId {
        let mut rng = rand::rng();
        loop {
            let seq = NEXT_ROOM_SEQ.fetch_add(1, Ordering::Relaxed);
            let suffix: u32 = rng.random();
            let candidate = RoomId(format!("room-{seq}-{suffix:08x}"));
            if !self.rooms.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Looks up a room by id.
    pub fn get_room(&self, room_id: &RoomId) -> Result<&Room, RoomError> {
        self.rooms
            .get(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))
    }

    /// Returns the room a connection currently belongs to, if any.
    pub fn member_room(&self, conn: &ConnId) -> Option<&RoomId> {
        self.member_rooms.get(conn)
    }

    /// Marks a member as having joined the room's messaging channel.
    ///
    /// Returns the peer to notify with `ready`, if one is present.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] for an unknown room,
    /// [`RoomError::NotMember`] if the connection isn't in it.
    pub fn mark_joined(
        &mut self,
        room_id: &RoomId,
        conn: &ConnId,
    ) -> Result<Option<ConnId>, RoomError> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        if !room.is_member(conn) {
            return Err(RoomError::NotMember(conn.clone(), room_id.clone()));
        }
        room.mark_joined(conn);
        Ok(room.peer_of(conn).cloned())
    }

    /// Returns `true` once every member of the room has joined its
    /// messaging channel.
    pub fn all_joined(&self, room_id: &RoomId) -> Result<bool, RoomError> {
        Ok(self.get_room(room_id)?.all_joined())
    }

    /// Forwards an event to every member of the room except the sender.
    ///
    /// With two members exactly the peer receives it; with one member
    /// (peer already left) the relay is a no-op — the event is dropped,
    /// not queued. Returns the number of recipients.
    ///
    /// # Errors
    /// Returns [`RoomError::StaleRelay`] when the room no longer exists
    /// or the sender is no longer a member of it. Callers drop stale
    /// relays silently.
    pub fn relay(
        &self,
        registry: &ConnectionRegistry,
        room_id: &RoomId,
        sender: &ConnId,
        event: ServerEvent,
    ) -> Result<usize, RoomError> {
        let room = self.rooms.get(room_id).ok_or_else(|| RoomError::StaleRelay {
            room: room_id.clone(),
            sender: sender.clone(),
        })?;
        if !room.is_member(sender) {
            return Err(RoomError::StaleRelay {
                room: room_id.clone(),
                sender: sender.clone(),
            });
        }

        let mut recipients = 0;
        for member in room.members() {
            if member == sender {
                continue;
            }
            registry.send_to(member, event.clone());
            recipients += 1;
        }
        Ok(recipients)
    }

    /// Records an opaque state value on a room (relay-adjacent: called
    /// for game events right before they are relayed).
    pub fn record_state(
        &mut self,
        room_id: &RoomId,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<(), RoomError> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        room.record_state(key, value);
        Ok(())
    }

    /// Removes a connection from a room's membership.
    ///
    /// Notifies the remaining member with `peer-left`, clears the
    /// leaver's room association, and destroys the room if its membership
    /// becomes empty. Returns the remaining peer, if any.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] for an unknown room (treated by callers as
    /// already gone), [`RoomError::NotMember`] if the connection wasn't in it.
    pub fn leave_room(
        &mut self,
        registry: &ConnectionRegistry,
        room_id: &RoomId,
        conn: &ConnId,
    ) -> Result<Option<ConnId>, RoomError> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        if !room.remove_member(conn) {
            return Err(RoomError::NotMember(conn.clone(), room_id.clone()));
        }
        self.member_rooms.remove(conn);

        let remaining = room.members().first().cloned();
        tracing::info!(
            room_id = %room_id,
            conn_id = %conn,
            members = room.members().len(),
            "member left room"
        );

        if let Some(peer) = &remaining {
            registry.send_to(
                peer,
                ServerEvent::PeerLeft {
                    sender_id: conn.to_string(),
                },
            );
        } else {
            self.destroy_room(room_id);
        }

        Ok(remaining)
    }

    /// Destroys a room, evicting any remaining members from the index.
    ///
    /// Idempotent: destroying an already-destroyed or never-existing room
    /// is a no-op. Returns the evicted members (empty if the room was
    /// already gone).
    pub fn destroy_room(&mut self, room_id: &RoomId) -> Vec<ConnId> {
        let Some(room) = self.rooms.remove(room_id) else {
            return Vec::new();
        };
        let evicted: Vec<ConnId> = room.members().to_vec();
        for member in &evicted {
            self.member_rooms.remove(member);
        }
        tracing::info!(room_id = %room_id, "room destroyed");
        evicted
    }

    /// Purges a connection from whatever room it occupies, if any.
    ///
    /// Disconnect-path convenience: a no-op for connections that aren't
    /// in a room, so duplicate disconnect signals are harmless. Returns
    /// the room and remaining peer when a membership was actually removed.
    pub fn purge_connection(
        &mut self,
        registry: &ConnectionRegistry,
        conn: &ConnId,
    ) -> Option<(RoomId, Option<ConnId>)> {
        let room_id = self.member_rooms.get(conn)?.clone();
        match self.leave_room(registry, &room_id, conn) {
            Ok(remaining) => Some((room_id, remaining)),
            // The index pointed at a room that is already gone; clean up
            // the stale entry.
            Err(_) => {
                self.member_rooms.remove(conn);
                None
            }
        }
    }

    /// Returns the number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

// =========================================================================
// Tests
// =========================================================================
