//! Core protocol types for Duet's wire format.
//!
//! Every event that travels between a client and the server is defined
//! here. Events are tagged JSON objects; the `type` tag carries the
//! kebab-case event name the browser client listens for.
//!
//! The two enums are matched exhaustively on the server — an event kind
//! the server does not handle is a compile error, not a silently dropped
//! string key.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a room.
///
/// Opaque string of the form `room-<seq>-<hex>`; generated by the room
/// manager, guaranteed unique among live rooms. Serialized transparently
/// as a plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ClientEvent — everything a client can send
// ---------------------------------------------------------------------------

/// Events sent by a client to the server.
///
/// WebRTC payloads (`offer`, `answer`, `candidate`) are opaque
/// [`Value`]s — the server forwards them verbatim and never inspects
/// the SDP or candidate contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// "Find me a peer" — enter the matchmaking queue.
    FindPeer,

    /// Join the messaging channel of an assigned room.
    JoinRoom { room: RoomId },

    /// Leave a room and go back to the queue.
    LeaveRoom { room: RoomId },

    /// A chat line for the room peer.
    Chat { text: String },

    /// WebRTC session offer for the room peer.
    Offer { offer: Value, room: RoomId },

    /// WebRTC session answer for the room peer.
    Answer { answer: Value, room: RoomId },

    /// WebRTC ICE candidate for the room peer.
    IceCandidate { candidate: Value, room: RoomId },

    /// A game event (move, choice, restart, game switch). `event` names
    /// the kind, `payload` is opaque to the server and is recorded in
    /// the room's state bag before being relayed.
    Game {
        room: RoomId,
        event: String,
        payload: Value,
    },
}

// ---------------------------------------------------------------------------
// ServerEvent — everything the server can send
// ---------------------------------------------------------------------------

/// Events sent by the server to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Room assignment: both members of a fresh pairing receive this and
    /// are expected to join the room and start WebRTC negotiation.
    SendOffer { room_id: RoomId },

    /// The other room member has joined the messaging channel.
    Ready,

    /// Forwarded WebRTC offer from the room peer.
    Offer { offer: Value },

    /// Forwarded WebRTC answer from the room peer.
    Answer { answer: Value },

    /// Forwarded ICE candidate from the room peer.
    IceCandidate { candidate: Value },

    /// A relayed chat line.
    Message { sender_id: String, text: String },

    /// A relayed game event.
    Game {
        sender_id: String,
        event: String,
        payload: Value,
    },

    /// The room peer left or disconnected.
    PeerLeft { sender_id: String },

    /// Periodic feedback for a connection that has been queued for a
    /// while without finding a peer.
    StillWaiting { waited_secs: u64 },

    /// An unrecoverable per-request problem (e.g. a malformed room id).
    /// Internal races never produce this — clients just see a missing or
    /// delayed `send-offer`/`ready` instead.
    Error { code: u16, message: String },
}

// =========================================================================
// Tests
// =========================================================================
