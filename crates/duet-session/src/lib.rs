//! Connection registry and identity management for Duet.
//!
//! This crate is the leaf of the core: it knows every live connection,
//! which identity (if any) the external auth collaborator stamped on it,
//! and where each connection stands in the pairing lifecycle.
//!
//! # How it fits in the stack
//!
//! ```text
//! Supervisor (above)  ← drives LinkState transitions, pairs connections
//!     ↕
//! Session layer (this crate)  ← owns Connection records and identities
//!     ↕
//! Protocol / Transport (below)  ← provide ServerEvent and ConnId
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod connection;
mod error;
mod registry;

pub use auth::{Authenticator, TrustingAuthenticator};
pub use connection::{Connection, EventSender, Identity, LinkState};
pub use error::SessionError;
pub use registry::ConnectionRegistry;
