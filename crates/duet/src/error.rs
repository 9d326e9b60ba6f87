//! Unified error type for the Duet server.

use duet_protocol::ProtocolError;
use duet_room::RoomError;
use duet_session::SessionError;
use duet_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `duet` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DuetError {
    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid event).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (registry, auth).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (invalid pairing, stale relay).
    #[error(transparent)]
    Room(#[from] RoomError),
}
