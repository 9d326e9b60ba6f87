//! The matchmaking queue: an ordered waiting list of connections.
//!
//! # Concurrency note
//!
//! `MatchQueue` is NOT thread-safe by itself — like the registry, it is
//! owned by the supervisor and accessed under its lock. `dequeue_pair`
//! removes both entries inside one `&mut self` call, so no concurrent
//! operation can ever observe a half-dequeued pair.

use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use duet_transport::ConnId;

/// One connection waiting in the queue.
#[derive(Debug, Clone)]
pub struct WaitingEntry {
    /// The waiting connection.
    pub conn: ConnId,
    /// When it entered the queue. Re-queued connections get a fresh
    /// timestamp — their earlier wait is discarded.
    pub enqueued_at: Instant,
}

/// Strict-FIFO waiting list of connections seeking a peer.
///
/// The two longest-waiting entries pair first; entries enqueued at the
/// same instant keep their insertion order (`VecDeque` is insertion-
/// ordered, so the timestamp never has to break a tie).
#[derive(Debug, Default)]
pub struct MatchQueue {
    entries: VecDeque<WaitingEntry>,
    /// Membership index, kept in sync with `entries`. Invariant: a
    /// connection id appears in the queue at most once.
    queued: HashSet<ConnId>,
}

impl MatchQueue {
    /// Creates a new, empty queue.
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            queued: HashSet::new(),
        }
    }

    /// Appends a connection to the back of the queue.
    ///
    /// Idempotent: enqueueing an already-queued connection is a no-op.
    /// Returns whether the connection was actually added.
    pub fn enqueue(&mut self, conn: ConnId) -> bool {
        if !self.queued.insert(conn.clone()) {
            tracing::debug!(conn_id = %conn, "already queued, ignoring");
            return false;
        }
        tracing::debug!(conn_id = %conn, waiting = self.entries.len() + 1, "enqueued");
        self.entries.push_back(WaitingEntry {
            conn,
            enqueued_at: Instant::now(),
        });
        true
    }

    /// Removes and returns the two longest-waiting connections.
    ///
    /// Returns `None` unless at least two entries exist. Both entries are
    /// removed in this single call — callers never see a partial dequeue.
    pub fn dequeue_pair(&mut self) -> Option<(ConnId, ConnId)> {
        if self.entries.len() < 2 {
            return None;
        }
        let first = self.entries.pop_front().expect("len checked above");
        let second = self.entries.pop_front().expect("len checked above");
        self.queued.remove(&first.conn);
        self.queued.remove(&second.conn);
        Some((first.conn, second.conn))
    }

    /// Removes a connection from the queue, wherever it sits.
    ///
    /// Returns whether it was queued. Removing an absent connection is a
    /// no-op — it may already have been paired or never queued at all.
    pub fn remove(&mut self, conn: &ConnId) -> bool {
        if !self.queued.remove(conn) {
            return false;
        }
        self.entries.retain(|entry| entry.conn != *conn);
        tracing::debug!(conn_id = %conn, "removed from queue");
        true
    }

    /// Returns `true` if the connection is currently queued.
    pub fn contains(&self, conn: &ConnId) -> bool {
        self.queued.contains(conn)
    }

    /// Returns every queued connection that has been waiting at least
    /// `threshold`, oldest first, with its wait duration.
    pub fn waiting_longer_than(&self, threshold: Duration) -> Vec<(ConnId, Duration)> {
        self.entries
            .iter()
            .filter_map(|entry| {
                let waited = entry.enqueued_at.elapsed();
                (waited >= threshold).then(|| (entry.conn.clone(), waited))
            })
            .collect()
    }

    /// Returns the number of waiting connections.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nobody is waiting.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
