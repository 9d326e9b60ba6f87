//! Two-party room lifecycle and event relay for Duet.
//!
//! A room binds exactly two connections for the duration of a pairing.
//! The manager owns every live room, guarantees collision-free room ids,
//! fans relayed events out to the members (always excluding the sender),
//! and tears rooms down as members leave.
//!
//! # Key types
//!
//! - [`RoomManager`] — creates/destroys rooms, relays events
//! - [`Room`] — one session: member pair, join tracking, opaque state bag
//! - [`RoomError`] — what can go wrong

mod error;
mod manager;
mod room;

pub use error::RoomError;
pub use manager::RoomManager;
pub use room::Room;
