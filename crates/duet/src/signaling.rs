//! WebRTC signaling relay: a thin protocol layer atop the room manager.
//!
//! Three message kinds — offer, answer, ICE candidate — each carrying a
//! room id and an opaque body. The body is forwarded verbatim to the
//! other room member; the server never inspects SDP or candidate
//! contents. Per-sender ordering is preserved end to end: events from
//! one connection are processed in arrival order and delivered through
//! the peer's single outbound channel.

use duet_protocol::ServerEvent;
use serde_json::Value;

/// One WebRTC signaling message, as received from a client.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// A session offer (SDP).
    Offer(Value),
    /// A session answer (SDP).
    Answer(Value),
    /// An ICE candidate.
    IceCandidate(Value),
}

impl Signal {
    /// The wire name of this signal kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Offer(_) => "offer",
            Self::Answer(_) => "answer",
            Self::IceCandidate(_) => "ice-candidate",
        }
    }

    /// Converts the signal into the event delivered to the room peer.
    /// The payload moves through untouched.
    pub(crate) fn into_event(self) -> ServerEvent {
        match self {
            Self::Offer(offer) => ServerEvent::Offer { offer },
            Self::Answer(answer) => ServerEvent::Answer { answer },
            Self::IceCandidate(candidate) => ServerEvent::IceCandidate { candidate },
        }
    }
}
