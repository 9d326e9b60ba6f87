//! FIFO matchmaking queue for Duet.
//!
//! An ordered waiting list of connections seeking a peer. The queue only
//! knows [`ConnId`]s — whether a connection is still alive, or already in
//! a room, is the supervisor's business; the queue's own invariant is
//! that an id appears in it at most once.
//!
//! # Key types
//!
//! - [`MatchQueue`] — the waiting list: `enqueue` / `dequeue_pair` / `remove`
//! - [`WaitingEntry`] — one queued connection with its enqueue time

mod queue;

pub use queue::{MatchQueue, WaitingEntry};
