//! Error types for the session layer.

use duet_transport::ConnId;

/// Errors that can occur in the connection registry and auth seam.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No live connection exists for the given id.
    /// Callers treat this as "already disconnected", not as fatal.
    #[error("connection {0} not found")]
    NotFound(ConnId),

    /// A connection with this id is already registered.
    /// The transport hands out unique ids, so this indicates a caller bug.
    #[error("connection {0} already registered")]
    AlreadyRegistered(ConnId),

    /// Authentication failed — the token was invalid, expired, or
    /// rejected by the [`Authenticator`](crate::Authenticator).
    #[error("authentication failed: {0}")]
    AuthFailed(String),
}
