//! Error types for the room layer.

use duet_protocol::RoomId;
use duet_transport::ConnId;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// Room creation was attempted with an invalid pair: identical
    /// connection ids, an unregistered connection, or a connection that
    /// is already in a room.
    #[error("invalid pairing: {0}")]
    InvalidPairing(String),

    /// The connection is not a member of this room.
    #[error("connection {0} not in room {1}")]
    NotMember(ConnId, RoomId),

    /// A relay targeted a room the sender is no longer a member of (or
    /// that no longer exists). Dropped silently by callers.
    #[error("stale relay from {sender} into room {room}")]
    StaleRelay { room: RoomId, sender: ConnId },
}
