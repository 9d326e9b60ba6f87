//! Connection types: the data structures that represent one live client
//! link.
//!
//! A `Connection` is the server's record of a connected client. It tracks
//! WHO the client is (an optional verified [`Identity`]), WHERE it stands
//! in the pairing lifecycle ([`LinkState`]), WHICH room it currently
//! occupies (if any), and HOW to reach it (its outbound event channel).

use duet_protocol::{RoomId, ServerEvent};
use duet_transport::ConnId;
use tokio::sync::mpsc;

/// Channel sender for delivering outbound events to a connection.
///
/// Unbounded: the writer task on the other end drains it as fast as the
/// socket allows, and events from one sender stay in send order.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A verified identity stamped onto a connection by the external auth
/// collaborator before the connection reaches the core.
///
/// Absence of an identity means the connection is anonymous — anonymous
/// pairing is allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable subject claim from the auth provider.
    pub subject: String,
    /// Human-readable name, if the provider supplied one.
    pub display_name: Option<String>,
}

// ---------------------------------------------------------------------------
// LinkState
// ---------------------------------------------------------------------------

/// The pairing lifecycle state of a connection.
///
/// ```text
///            (find-peer)        (paired)        (both joined)
///   Idle ───────────────→ Queued ──────→ Paired ──────→ Active
///    ↑                      │               │              │
///    │                      │               │        (leave-room)
///    │                      │               │              ▼
///    └──────(find-peer)─────┴───────────────┴───────────← Left
///
///   any state ──(socket close)──→ Disconnected (terminal)
/// ```
///
/// - **Idle**: registered, not seeking a peer.
/// - **Queued**: waiting in the matchmaking queue.
/// - **Paired**: assigned to a room, has not joined its channel yet.
/// - **Active**: in a room whose both members have joined.
/// - **Left**: the room is gone (the connection or its peer left); a new
///   `find-peer` request recycles it into `Queued`.
/// - **Disconnected**: transport closed. Terminal — cleanup only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Queued,
    Paired,
    Active,
    Left,
    Disconnected,
}

impl LinkState {
    /// Returns `true` if the connection may (re-)enter the matchmaking
    /// queue from this state.
    pub fn can_enqueue(&self) -> bool {
        matches!(self, Self::Idle | Self::Left)
    }

    /// Returns `true` if the connection currently belongs to a room.
    pub fn in_room(&self) -> bool {
        matches!(self, Self::Paired | Self::Active)
    }

    /// Returns `true` for the terminal state.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected)
    }
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Queued => "Queued",
            Self::Paired => "Paired",
            Self::Active => "Active",
            Self::Left => "Left",
            Self::Disconnected => "Disconnected",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// A single live client link.
///
/// Owned exclusively by the [`ConnectionRegistry`](crate::ConnectionRegistry):
/// created on link-establish, destroyed on link-close. All other layers
/// refer to it by [`ConnId`].
#[derive(Debug)]
pub struct Connection {
    /// Transport-assigned identifier, stable for the connection's lifetime.
    pub id: ConnId,

    /// Verified identity, or `None` for an anonymous connection.
    pub identity: Option<Identity>,

    /// The room this connection is currently a member of, if any.
    ///
    /// Invariant: `Some` exactly when `state.in_room()`.
    pub room: Option<RoomId>,

    /// Position in the pairing lifecycle.
    pub state: LinkState,

    /// Outbound event channel to this client's writer task.
    pub sender: EventSender,
}

impl Connection {
    /// Creates a freshly registered connection in the `Idle` state.
    pub fn new(id: ConnId, identity: Option<Identity>, sender: EventSender) -> Self {
        Self {
            id,
            identity,
            room: None,
            state: LinkState::Idle,
            sender,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_enqueue_only_from_idle_and_left() {
        assert!(LinkState::Idle.can_enqueue());
        assert!(LinkState::Left.can_enqueue());
        assert!(!LinkState::Queued.can_enqueue());
        assert!(!LinkState::Paired.can_enqueue());
        assert!(!LinkState::Active.can_enqueue());
        assert!(!LinkState::Disconnected.can_enqueue());
    }

    #[test]
    fn test_in_room_covers_paired_and_active() {
        assert!(LinkState::Paired.in_room());
        assert!(LinkState::Active.in_room());
        assert!(!LinkState::Idle.in_room());
        assert!(!LinkState::Queued.in_room());
        assert!(!LinkState::Left.in_room());
    }

    #[test]
    fn test_new_connection_starts_idle_and_roomless() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let conn = Connection::new(ConnId::new("c-1"), None, tx);
        assert_eq!(conn.state, LinkState::Idle);
        assert!(conn.room.is_none());
        assert!(conn.identity.is_none());
    }
}
