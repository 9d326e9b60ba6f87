//! Integration tests for room lifecycle and relay across multiple rooms.

use duet_protocol::{RoomId, ServerEvent};
use duet_room::{RoomError, RoomManager};
use duet_session::{ConnectionRegistry, EventSender};
use duet_transport::ConnId;
use serde_json::json;
use tokio::sync::mpsc::{self, UnboundedReceiver};

// =========================================================================
// Helpers
// =========================================================================

fn cid(id: &str) -> ConnId {
    ConnId::new(id)
}

fn add_conn(reg: &mut ConnectionRegistry, id: &str) -> UnboundedReceiver<ServerEvent> {
    let (tx, rx): (EventSender, _) = mpsc::unbounded_channel();
    reg.register(cid(id), None, tx).unwrap();
    rx
}

/// Drains every event currently buffered for a connection.
fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// =========================================================================
// Scenarios
// =========================================================================

#[test]
fn test_offer_payload_is_forwarded_verbatim_to_peer_only() {
    let mut reg = ConnectionRegistry::new();
    let mut mgr = RoomManager::new();
    let mut rx_a = add_conn(&mut reg, "a");
    let mut rx_b = add_conn(&mut reg, "b");
    let room = mgr.create_room(&reg, &cid("a"), &cid("b")).unwrap();

    let sdp = json!({ "sdp": "v=0\r\no=- 4611731400 2 IN IP4 127.0.0.1", "type": "offer" });
    mgr.relay(&reg, &room, &cid("a"), ServerEvent::Offer { offer: sdp.clone() })
        .unwrap();

    assert_eq!(drain(&mut rx_b), vec![ServerEvent::Offer { offer: sdp }]);
    assert!(drain(&mut rx_a).is_empty(), "sender receives nothing");
}

#[test]
fn test_relay_never_crosses_room_boundaries() {
    let mut reg = ConnectionRegistry::new();
    let mut mgr = RoomManager::new();
    let mut rx_a = add_conn(&mut reg, "a");
    let mut rx_b = add_conn(&mut reg, "b");
    let mut rx_c = add_conn(&mut reg, "c");
    let mut rx_d = add_conn(&mut reg, "d");
    let room_ab = mgr.create_room(&reg, &cid("a"), &cid("b")).unwrap();
    let _room_cd = mgr.create_room(&reg, &cid("c"), &cid("d")).unwrap();

    mgr.relay(
        &reg,
        &room_ab,
        &cid("a"),
        ServerEvent::Message {
            sender_id: "a".into(),
            text: "hello".into(),
        },
    )
    .unwrap();

    assert_eq!(drain(&mut rx_b).len(), 1);
    assert!(drain(&mut rx_a).is_empty());
    assert!(drain(&mut rx_c).is_empty());
    assert!(drain(&mut rx_d).is_empty());
}

#[test]
fn test_disconnect_teardown_sequence() {
    // A and B are paired into room R. A disconnects: B gets peer-left,
    // the supervisor destroys R, and late relays from B are stale.
    let mut reg = ConnectionRegistry::new();
    let mut mgr = RoomManager::new();
    let _rx_a = add_conn(&mut reg, "a");
    let mut rx_b = add_conn(&mut reg, "b");
    let room = mgr.create_room(&reg, &cid("a"), &cid("b")).unwrap();

    // Disconnect path: purge A, then tear the room down.
    let (purged_room, remaining) = mgr.purge_connection(&reg, &cid("a")).unwrap();
    assert_eq!(purged_room, room);
    assert_eq!(remaining, Some(cid("b")));
    mgr.destroy_room(&room);
    reg.unregister(&cid("a"));

    let events = drain(&mut rx_b);
    assert_eq!(
        events,
        vec![ServerEvent::PeerLeft { sender_id: "a".into() }],
        "exactly one peer-left notification"
    );
    assert_eq!(mgr.room_count(), 0);
    assert!(!reg.contains(&cid("a")), "A fully removed from the registry");
    assert_eq!(mgr.member_room(&cid("b")), None, "B is eligible to re-queue");

    // A relay B's client fired before it saw peer-left: stale, dropped.
    let late = mgr.relay(
        &reg,
        &room,
        &cid("b"),
        ServerEvent::Message {
            sender_id: "b".into(),
            text: "you there?".into(),
        },
    );
    assert!(matches!(late, Err(RoomError::StaleRelay { .. })));
}

#[test]
fn test_join_flow_reports_ready_peer_and_all_joined() {
    let mut reg = ConnectionRegistry::new();
    let mut mgr = RoomManager::new();
    let _rx_a = add_conn(&mut reg, "a");
    let _rx_b = add_conn(&mut reg, "b");
    let room = mgr.create_room(&reg, &cid("a"), &cid("b")).unwrap();

    // First join: peer exists but the room is not fully joined yet.
    let peer = mgr.mark_joined(&room, &cid("a")).unwrap();
    assert_eq!(peer, Some(cid("b")));
    assert!(!mgr.all_joined(&room).unwrap());

    // Second join completes the channel.
    mgr.mark_joined(&room, &cid("b")).unwrap();
    assert!(mgr.all_joined(&room).unwrap());
}

#[test]
fn test_mark_joined_on_unknown_room_is_not_found() {
    let mut mgr = RoomManager::new();

    let result = mgr.mark_joined(&RoomId("room-404-0".into()), &cid("a"));

    assert!(matches!(result, Err(RoomError::NotFound(_))));
}

#[test]
fn test_game_state_follows_relay() {
    // The tic-tac-toe flow: record the board, relay the move, peer sees
    // the event, the room remembers the latest payload.
    let mut reg = ConnectionRegistry::new();
    let mut mgr = RoomManager::new();
    let _rx_a = add_conn(&mut reg, "a");
    let mut rx_b = add_conn(&mut reg, "b");
    let room = mgr.create_room(&reg, &cid("a"), &cid("b")).unwrap();

    let board = json!({ "board": ["X", null, null], "winner": null });
    mgr.record_state(&room, "make-move", board.clone()).unwrap();
    mgr.relay(
        &reg,
        &room,
        &cid("a"),
        ServerEvent::Game {
            sender_id: "a".into(),
            event: "make-move".into(),
            payload: board.clone(),
        },
    )
    .unwrap();

    assert_eq!(
        drain(&mut rx_b),
        vec![ServerEvent::Game {
            sender_id: "a".into(),
            event: "make-move".into(),
            payload: board.clone(),
        }]
    );
    assert_eq!(mgr.get_room(&room).unwrap().state("make-move"), Some(&board));
}
