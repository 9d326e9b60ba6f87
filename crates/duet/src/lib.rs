//! # Duet
//!
//! Pairing server for anonymous two-party sessions: matches waiting
//! connections into ephemeral rooms and relays WebRTC signaling and
//! chat/game events between exactly the two members of each room.
//!
//! The stack, bottom to top:
//!
//! ```text
//! duet-transport   WebSocket accept / send / recv, ConnId
//! duet-protocol    ClientEvent / ServerEvent, JSON codec
//! duet-session     connection registry, identities, LinkState
//! duet-match       FIFO matchmaking queue
//! duet-room        room lifecycle and relay fan-out
//! duet (this)      supervisor, signaling relay, server loop
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use duet::DuetServer;
//! use duet_session::TrustingAuthenticator;
//!
//! # async fn run() -> Result<(), duet::DuetError> {
//! let server = DuetServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(TrustingAuthenticator)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;
mod signaling;
mod supervisor;

pub use error::DuetError;
pub use server::{DuetServer, DuetServerBuilder};
pub use signaling::Signal;
pub use supervisor::{Supervisor, SupervisorConfig};
