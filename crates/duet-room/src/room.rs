//! The room itself: an ephemeral two-party session.

use std::collections::{HashMap, HashSet};

use duet_protocol::RoomId;
use duet_transport::ConnId;
use serde_json::Value;

/// An ephemeral two-party session.
///
/// A room is created with exactly two members and shrinks as members
/// leave; a room with zero members is invalid and is destroyed by the
/// manager the moment it empties. Alongside membership the room carries
/// two pieces of ephemeral state:
///
/// - `joined` — which members have entered the room's messaging channel
///   (both in = the pairing is fully active);
/// - `state` — an opaque key-value bag for relayed game state (a board,
///   whose turn it is, pending choices). The server never interprets the
///   values; games get new payload types without any core change.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    /// Ordered member pair. Order is creation order (first dequeued
    /// connection first) and is stable until members leave.
    members: Vec<ConnId>,
    joined: HashSet<ConnId>,
    state: HashMap<String, Value>,
}

impl Room {
    /// Creates a room binding the two given connections.
    pub(crate) fn new(id: RoomId, first: ConnId, second: ConnId) -> Self {
        Self {
            id,
            members: vec![first, second],
            joined: HashSet::new(),
            state: HashMap::new(),
        }
    }

    /// The room's unique id.
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Current members, in creation order.
    pub fn members(&self) -> &[ConnId] {
        &self.members
    }

    /// Returns `true` if the connection is a member of this room.
    pub fn is_member(&self, conn: &ConnId) -> bool {
        self.members.contains(conn)
    }

    /// Returns the other member, if there is one.
    pub fn peer_of(&self, conn: &ConnId) -> Option<&ConnId> {
        self.members.iter().find(|m| *m != conn)
    }

    /// Marks a member as having joined the messaging channel.
    ///
    /// Returns `false` if it had already joined (duplicate `join-room`).
    pub(crate) fn mark_joined(&mut self, conn: &ConnId) -> bool {
        self.joined.insert(conn.clone())
    }

    /// Returns `true` once every current member has joined the channel.
    pub fn all_joined(&self) -> bool {
        self.members.iter().all(|m| self.joined.contains(m))
    }

    /// Removes a member. Returns `false` if it wasn't one.
    pub(crate) fn remove_member(&mut self, conn: &ConnId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != conn);
        self.joined.remove(conn);
        self.members.len() != before
    }

    /// Returns `true` once the last member has left.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Records an opaque state value under `key`, replacing any previous
    /// value. State never crosses room boundaries.
    pub(crate) fn record_state(&mut self, key: impl Into<String>, value: Value) {
        self.state.insert(key.into(), value);
    }

    /// Reads back a recorded state value.
    pub fn state(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }
}
