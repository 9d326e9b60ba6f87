//! Transport abstraction layer for Duet.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the underlying network protocol, plus [`ConnId`], the opaque identifier
//! every other layer uses to refer to a live client link.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Opaque identifier for a connection.
///
/// The identifier is an arbitrary string, stable for the lifetime of the
/// connection. The transport generates it on accept; nothing above the
/// transport ever parses it — higher layers only compare and display it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnId(String);

impl ConnId {
    /// Creates a `ConnId` from an arbitrary string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// Gracefully shuts down the transport, stopping new connections.
    async fn shutdown(&self) -> Result<(), Self::Error>;
}

/// A single connection that can send and receive messages.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends data to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next message from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> &ConnId;

    /// Returns the auth token the client presented at connect time, if any.
    ///
    /// Authentication itself happens above the transport — this is only
    /// the raw credential carried by the connection request.
    fn auth_token(&self) -> Option<&str>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conn_id_new_and_as_str() {
        let id = ConnId::new("c-42");
        assert_eq!(id.as_str(), "c-42");
    }

    #[test]
    fn test_conn_id_display() {
        let id = ConnId::new("c-7");
        assert_eq!(id.to_string(), "c-7");
    }

    #[test]
    fn test_conn_id_equality() {
        let a = ConnId::new("c-1");
        let b = ConnId::new("c-1");
        let c = ConnId::new("c-2");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_conn_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnId::new("c-1"), "alice");
        map.insert(ConnId::new("c-2"), "bob");
        assert_eq!(map[&ConnId::new("c-1")], "alice");
    }
}
