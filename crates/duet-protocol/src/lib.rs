//! Wire protocol for Duet.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`RoomId`]) — the
//!   tagged event structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those events are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and session
//! (connection identity). It doesn't know about queues or rooms — it
//! only knows how to name and serialize events.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientEvent/ServerEvent) → Supervisor
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{ClientEvent, RoomId, ServerEvent};
