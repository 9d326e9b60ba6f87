//! Per-connection handler: auth, registration, and event routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Authenticate the connect-time token (if any) → optional identity
//!   2. Register with the supervisor → connection is enqueued for pairing
//!   3. Writer task drains the outbound channel onto the socket
//!   4. Loop: receive events → dispatch to the supervisor
//!
//! Events from one connection are dispatched in arrival order, and the
//! peer receives everything through one outbound channel — together that
//! is the single-sender ordering guarantee.

use std::sync::Arc;

use duet_protocol::{ClientEvent, Codec};
use duet_session::Authenticator;
use duet_transport::{ConnId, Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::{DuetError, Signal};

/// Drop guard that runs supervisor disconnect cleanup when the handler
/// exits — even if it exits by panic. Since `Drop` is synchronous, the
/// async cleanup is spawned fire-and-forget; `disconnect` is idempotent,
/// so racing an explicit cleanup is harmless.
struct DisconnectGuard<A: Authenticator, C: Codec> {
    conn_id: ConnId,
    state: Arc<ServerState<A, C>>,
}

impl<A: Authenticator, C: Codec> Drop for DisconnectGuard<A, C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id.clone();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.supervisor.lock().await.disconnect(&conn_id);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<A, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<A, C>>,
) -> Result<(), DuetError>
where
    A: Authenticator,
    C: Codec + Clone,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id().clone();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: identity, before the core sees the connection ---
    let identity = match conn.auth_token() {
        Some(token) => match state.auth.authenticate(token).await {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::info!(%conn_id, error = %e, "rejecting connection");
                let _ = conn.close().await;
                return Err(DuetError::Session(e));
            }
        },
        // No token: anonymous pairing is allowed.
        None => None,
    };

    // --- Step 2: writer task drains outbound events onto the socket ---
    let (tx, mut rx) = mpsc::unbounded_channel();
    let writer_conn = Arc::clone(&conn);
    let writer_codec = state.codec.clone();
    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let bytes = match writer_codec.encode(&event) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to encode outbound event");
                    continue;
                }
            };
            if writer_conn.send(&bytes).await.is_err() {
                break;
            }
        }
    });

    // --- Step 3: register + auto-enqueue; guard cleans up from here on ---
    state
        .supervisor
        .lock()
        .await
        .connect(conn_id.clone(), identity, tx)?;
    let _guard = DisconnectGuard {
        conn_id: conn_id.clone(),
        state: Arc::clone(&state),
    };

    // --- Step 4: event loop ---
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode event");
                continue;
            }
        };

        dispatch_event(&state, &conn_id, event).await;
    }

    writer.abort();
    // _guard drops here → supervisor disconnect cleanup fires.
    Ok(())
}

/// Routes one decoded client event into the supervisor.
///
/// Every event kind is matched — adding a `ClientEvent` variant without
/// handling it here is a compile error.
async fn dispatch_event<A, C>(
    state: &Arc<ServerState<A, C>>,
    conn_id: &ConnId,
    event: ClientEvent,
) where
    A: Authenticator,
    C: Codec,
{
    let mut supervisor = state.supervisor.lock().await;
    match event {
        ClientEvent::FindPeer => supervisor.find_peer(conn_id),
        ClientEvent::JoinRoom { room } => supervisor.join_room(conn_id, &room),
        ClientEvent::LeaveRoom { room } => supervisor.leave(conn_id, &room),
        ClientEvent::Chat { text } => supervisor.chat(conn_id, text),
        ClientEvent::Offer { offer, room } => {
            supervisor.signal(conn_id, &room, Signal::Offer(offer));
        }
        ClientEvent::Answer { answer, room } => {
            supervisor.signal(conn_id, &room, Signal::Answer(answer));
        }
        ClientEvent::IceCandidate { candidate, room } => {
            supervisor.signal(conn_id, &room, Signal::IceCandidate(candidate));
        }
        ClientEvent::Game { room, event, payload } => {
            supervisor.game(conn_id, &room, event, payload);
        }
    }
}
