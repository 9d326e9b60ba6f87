//! Integration tests for the Duet server: real WebSocket clients driving
//! the full pairing → signaling → teardown flow.

use std::net::SocketAddr;
use std::time::Duration;

use duet::{DuetServerBuilder, SupervisorConfig};
use duet_pulse::PulseConfig;
use duet_session::{Authenticator, Identity, SessionError, TrustingAuthenticator};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type WsClient = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server with the sweep disabled and returns its address.
async fn start_server() -> SocketAddr {
    start_server_with(PulseConfig::disabled(), SupervisorConfig::default()).await
}

async fn start_server_with(sweep: PulseConfig, config: SupervisorConfig) -> SocketAddr {
    let server = DuetServerBuilder::new()
        .bind("127.0.0.1:0")
        .sweep_interval(sweep)
        .supervisor_config(config)
        .build(TrustingAuthenticator)
        .await
        .expect("server should build");
    let addr = server.local_addr().expect("should have local addr");
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

async fn connect(addr: SocketAddr) -> WsClient {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("client should connect");
    ws
}

async fn send_event(ws: &mut WsClient, event: Value) {
    ws.send(Message::Text(event.to_string().into()))
        .await
        .expect("send should succeed");
}

/// Receives the next data frame and parses it as an event.
async fn recv_event(ws: &mut WsClient) -> Value {
    loop {
        let msg = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended unexpectedly")
            .expect("websocket error");
        if msg.is_binary() || msg.is_text() {
            return serde_json::from_slice(&msg.into_data()).expect("event should be JSON");
        }
    }
}

/// Connects two clients and waits for both room assignments.
/// Returns both clients and the shared room id.
async fn connect_pair(addr: SocketAddr) -> (WsClient, WsClient, String) {
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;

    let offer_a = recv_event(&mut a).await;
    let offer_b = recv_event(&mut b).await;
    assert_eq!(offer_a["type"], "send-offer");
    assert_eq!(offer_b["type"], "send-offer");
    assert_eq!(offer_a["roomId"], offer_b["roomId"]);

    let room = offer_a["roomId"].as_str().unwrap().to_string();
    (a, b, room)
}

// =========================================================================
// Pairing
// =========================================================================

#[tokio::test]
async fn test_two_clients_are_paired_into_one_room() {
    let addr = start_server().await;

    let (_a, _b, room) = connect_pair(addr).await;

    assert!(room.starts_with("room-"));
}

#[tokio::test]
async fn test_pairs_form_in_arrival_order() {
    // A and B arrive first and must end up together; C and D arrive
    // later and get their own room.
    let addr = start_server().await;

    let (_a, _b, room_ab) = connect_pair(addr).await;
    let (_c, _d, room_cd) = connect_pair(addr).await;

    assert_ne!(room_ab, room_cd);
}

#[tokio::test]
async fn test_lone_client_receives_nothing() {
    let addr = start_server().await;
    let mut a = connect(addr).await;

    let result = timeout(Duration::from_millis(300), a.next()).await;

    assert!(result.is_err(), "no peer, so no events yet");
}

// =========================================================================
// Room channel: join-room / ready
// =========================================================================

#[tokio::test]
async fn test_join_room_sends_ready_to_peer() {
    let addr = start_server().await;
    let (mut a, mut b, room) = connect_pair(addr).await;

    send_event(&mut a, json!({ "type": "join-room", "room": room })).await;

    let event = recv_event(&mut b).await;
    assert_eq!(event, json!({ "type": "ready" }));
}

#[tokio::test]
async fn test_join_unknown_room_sends_error() {
    let addr = start_server().await;
    let (mut a, _b, _room) = connect_pair(addr).await;

    send_event(&mut a, json!({ "type": "join-room", "room": "room-0-bogus" })).await;

    let event = recv_event(&mut a).await;
    assert_eq!(event["type"], "error");
    assert_eq!(event["code"], 404);
}

// =========================================================================
// Signaling relay
// =========================================================================

#[tokio::test]
async fn test_offer_is_forwarded_verbatim_and_not_echoed() {
    let addr = start_server().await;
    let (mut a, mut b, room) = connect_pair(addr).await;

    let sdp = json!({ "sdp": "v=0\r\no=- 46117 2 IN IP4 127.0.0.1", "type": "offer" });
    send_event(&mut a, json!({ "type": "offer", "offer": sdp, "room": room })).await;

    let event = recv_event(&mut b).await;
    assert_eq!(event["type"], "offer");
    assert_eq!(event["offer"], sdp, "payload forwarded untouched");

    // B answers; the next thing A sees must be that answer — if the
    // offer had been echoed back, A would see "offer" here instead.
    let answer = json!({ "sdp": "v=0 answer", "type": "answer" });
    send_event(&mut b, json!({ "type": "answer", "answer": answer, "room": room })).await;

    let event = recv_event(&mut a).await;
    assert_eq!(event["type"], "answer");
    assert_eq!(event["answer"], answer);
}

#[tokio::test]
async fn test_ice_candidates_preserve_sender_order() {
    let addr = start_server().await;
    let (mut a, mut b, room) = connect_pair(addr).await;

    for i in 0..5 {
        let candidate = json!({ "candidate": format!("candidate:{i}"), "sdpMLineIndex": i });
        send_event(
            &mut a,
            json!({ "type": "ice-candidate", "candidate": candidate, "room": room }),
        )
        .await;
    }

    for i in 0..5 {
        let event = recv_event(&mut b).await;
        assert_eq!(event["type"], "ice-candidate");
        assert_eq!(event["candidate"]["candidate"], format!("candidate:{i}"));
    }
}

// =========================================================================
// Chat and game relay
// =========================================================================

#[tokio::test]
async fn test_chat_is_relayed_with_sender_id() {
    let addr = start_server().await;
    let (mut a, mut b, _room) = connect_pair(addr).await;

    send_event(&mut a, json!({ "type": "chat", "text": "hello there" })).await;

    let event = recv_event(&mut b).await;
    assert_eq!(event["type"], "message");
    assert_eq!(event["text"], "hello there");
    assert!(event["senderId"].as_str().unwrap().starts_with("c-"));
}

#[tokio::test]
async fn test_game_event_is_relayed_opaquely() {
    let addr = start_server().await;
    let (mut a, mut b, room) = connect_pair(addr).await;

    let payload = json!({ "board": ["X", null, null, null, null, null, null, null, null] });
    send_event(
        &mut a,
        json!({ "type": "game", "room": room, "event": "make-move", "payload": payload }),
    )
    .await;

    let event = recv_event(&mut b).await;
    assert_eq!(event["type"], "game");
    assert_eq!(event["event"], "make-move");
    assert_eq!(event["payload"], payload);
}

// =========================================================================
// Leave and disconnect
// =========================================================================

#[tokio::test]
async fn test_leave_room_notifies_peer_and_requeues_leaver() {
    let addr = start_server().await;
    let (mut a, mut b, room) = connect_pair(addr).await;

    send_event(&mut a, json!({ "type": "leave-room", "room": room })).await;

    let event = recv_event(&mut b).await;
    assert_eq!(event["type"], "peer-left");

    // A went back into the queue: the next arrival pairs with it.
    let mut c = connect(addr).await;
    let offer_a = recv_event(&mut a).await;
    let offer_c = recv_event(&mut c).await;
    assert_eq!(offer_a["type"], "send-offer");
    assert_eq!(offer_a["roomId"], offer_c["roomId"]);
    assert_ne!(offer_a["roomId"].as_str().unwrap(), room, "a fresh room");
}

#[tokio::test]
async fn test_disconnect_notifies_peer() {
    let addr = start_server().await;
    let (a, mut b, _room) = connect_pair(addr).await;

    drop(a); // socket closes

    let event = recv_event(&mut b).await;
    assert_eq!(event["type"], "peer-left");
}

#[tokio::test]
async fn test_peer_left_after_disconnect_can_pair_again() {
    let addr = start_server().await;
    let (a, mut b, _room) = connect_pair(addr).await;

    drop(a);
    assert_eq!(recv_event(&mut b).await["type"], "peer-left");

    // B asks for a new peer; C arrives; they pair.
    send_event(&mut b, json!({ "type": "find-peer" })).await;
    let mut c = connect(addr).await;

    let offer_b = recv_event(&mut b).await;
    let offer_c = recv_event(&mut c).await;
    assert_eq!(offer_b["type"], "send-offer");
    assert_eq!(offer_b["roomId"], offer_c["roomId"]);
}

// =========================================================================
// Queue feedback
// =========================================================================

#[tokio::test]
async fn test_long_waiting_client_gets_still_waiting_pings() {
    let addr = start_server_with(
        PulseConfig::every(Duration::from_millis(50)),
        SupervisorConfig {
            still_waiting_after: Duration::ZERO,
        },
    )
    .await;
    let mut a = connect(addr).await;

    let event = recv_event(&mut a).await;

    assert_eq!(event["type"], "still-waiting");
    assert!(event["waitedSecs"].is_u64());
}

// =========================================================================
// Auth seam
// =========================================================================

/// Rejects every token. Used to verify that a bad credential never
/// reaches the matchmaking core.
struct RejectAll;

impl Authenticator for RejectAll {
    async fn authenticate(&self, _token: &str) -> Result<Identity, SessionError> {
        Err(SessionError::AuthFailed("rejected".into()))
    }
}

#[tokio::test]
async fn test_invalid_token_is_rejected_before_pairing() {
    let server = DuetServerBuilder::new()
        .bind("127.0.0.1:0")
        .sweep_interval(PulseConfig::disabled())
        .build(RejectAll)
        .await
        .expect("server should build");
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.run().await;
    });

    let (mut bad, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/?token=nope"))
        .await
        .expect("websocket upgrade still succeeds");

    // The server closes the connection instead of enqueueing it.
    let next = timeout(Duration::from_secs(5), bad.next())
        .await
        .expect("timed out waiting for close");
    match next {
        None | Some(Ok(Message::Close(_))) | Some(Err(_)) => {}
        Some(Ok(other)) => panic!("expected close, got {other:?}"),
    }

    // Tokenless (anonymous) clients still pair fine on the same server.
    let (_a, _b, _room) = connect_pair(addr).await;
}
