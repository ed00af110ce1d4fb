//! Cross-module integration tests: session behavior, hub routing,
//! matchmaking flow and reconnect safety.

use crate::config::ServerConfig;
use crate::connection::{ConnectionId, ConnectionManager, ConnectionResponseSender};
use crate::ecs::{Component, ComponentKind};
use crate::error::{ErrorCode, GameError};
use crate::messaging::{ClientPackage, Envelope, MessageSender, Player, ServerResponse};
use crate::server::GameServer;
use crate::session::Session;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout, Duration};
use uuid::Uuid;

/// Fast timings so paused-clock tests stay readable.
fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.tick_interval_ms = 1000;
    config.queue_poll_interval_ms = 10;
    config
}

fn noop_sender() -> MessageSender {
    // A dispatcher over an empty connection manager: every send fails
    // softly, which is exactly what a session without live connections
    // should tolerate.
    MessageSender::new(Arc::new(ConnectionResponseSender::new(Arc::new(
        ConnectionManager::new(8),
    ))))
}

async fn connect_player(
    server: &GameServer,
    name: &str,
) -> (Player, ConnectionId, mpsc::Receiver<ServerResponse>) {
    let player = Player {
        id: Uuid::new_v4(),
        username: name.to_string(),
    };
    let manager = server.connection_manager();
    let connection_id = manager
        .add_connection("127.0.0.1:0".parse().unwrap())
        .await;
    manager.bind_player(connection_id, player.clone()).await;
    let outbound_rx = manager.register_outbound(connection_id).await;
    (player, connection_id, outbound_rx)
}

async fn recv_response(rx: &mut mpsc::Receiver<ServerResponse>) -> ServerResponse {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for a response")
        .expect("outbound channel closed")
}

// ----- Session bookkeeping -----

#[tokio::test(flavor = "multi_thread")]
async fn session_tracks_one_entity_per_player() {
    let session = Session::new(test_config(), noop_sender());

    let player_ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
    let mut entity_ids = Vec::new();
    for (i, player_id) in player_ids.iter().enumerate() {
        entity_ids.push(session.add_player(*player_id, &format!("Player{i}")));
    }

    assert_eq!(session.player_count(), 4);
    entity_ids.sort();
    entity_ids.dedup();
    assert_eq!(entity_ids.len(), 4, "entity IDs must be distinct");

    for (player_id, entity_id) in player_ids.iter().zip(&entity_ids) {
        assert!(session.player_entity_id(*player_id).is_some());
        let entity = session.store().get_entity(*entity_id).unwrap();
        for kind in [
            ComponentKind::Player,
            ComponentKind::Transform,
            ComponentKind::Velocity,
        ] {
            assert!(entity.has_component(kind), "missing {kind:?}");
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn remove_player_tears_the_entity_down() {
    let session = Session::new(test_config(), noop_sender());
    let player_id = Uuid::new_v4();
    let entity_id = session.add_player(player_id, "Leaver");

    assert!(session.remove_player(player_id));
    assert!(session.store().get_entity(entity_id).is_none());
    assert_eq!(session.player_count(), 0);
    assert!(!session.remove_player(player_id));
}

// ----- Movement through handler + tick loop -----

#[tokio::test(start_paused = true)]
async fn move_handler_velocity_lands_on_next_tick() {
    let session = Arc::new(Session::new(test_config(), noop_sender()));
    let player_id = Uuid::new_v4();
    let entity_id = session.add_player(player_id, "Runner");
    Arc::clone(&session).start();

    session.handle_move(player_id, 0.81, 0.81).unwrap();

    // Direction is applied by the movement system, not the handler: before
    // the first tick the position is still the origin.
    let entity = session.store().get_entity(entity_id).unwrap();
    match entity.get_component(ComponentKind::Transform) {
        Some(Component::Transform(t)) => {
            assert_eq!((t.x, t.y), (0.0, 0.0));
        }
        other => panic!("expected transform, got {other:?}"),
    }

    // One full 1s tick at dt=1 and default speed 1.
    sleep(Duration::from_millis(1500)).await;
    match entity.get_component(ComponentKind::Transform) {
        Some(Component::Transform(t)) => {
            assert!((t.x - 0.81).abs() < 1e-9, "x was {}", t.x);
            assert!((t.y - 0.81).abs() < 1e-9, "y was {}", t.y);
        }
        other => panic!("expected transform, got {other:?}"),
    }

    session.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn move_handler_rejects_unknown_player() {
    let session = Session::new(test_config(), noop_sender());
    let unknown = Uuid::new_v4();
    assert!(matches!(
        session.handle_move(unknown, 1.0, 0.0),
        Err(GameError::PlayerNotFound(id)) if id == unknown
    ));
}

// ----- Interaction: range boundary and rate limiting -----

#[tokio::test(start_paused = true)]
async fn interact_respects_the_range_boundary() {
    let session = Session::new(test_config(), noop_sender());
    let player_id = Uuid::new_v4();
    session.add_player(player_id, "Opener");

    // Out-of-range attempts first: they make no state change and must not
    // prime any cooldown.
    let far_door = session.add_door(1.5, 1.5);
    assert!(matches!(
        session.handle_interact(player_id, far_door),
        Err(GameError::OutOfRange)
    ));
    let very_far_door = session.add_door(100.0, 100.0);
    assert!(matches!(
        session.handle_interact(player_id, very_far_door),
        Err(GameError::OutOfRange)
    ));

    // Within range 1.0 the door toggles open.
    let near_door = session.add_door(0.1, 0.1);
    assert_eq!(
        session.handle_interact(player_id, near_door).unwrap(),
        Some(true)
    );

    // Far doors were never toggled.
    let far = session.store().get_entity(far_door).unwrap();
    match far.get_component(ComponentKind::Openable) {
        Some(Component::Openable(o)) => assert!(!o.is_open),
        other => panic!("expected openable, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn interact_is_rate_limited_until_the_cooldown_lapses() {
    let session = Session::new(test_config(), noop_sender());
    let player_id = Uuid::new_v4();
    session.add_player(player_id, "Spammer");
    let door = session.add_door(0.2, 0.1);

    assert_eq!(session.handle_interact(player_id, door).unwrap(), Some(true));

    // Second attempt inside the TTL window: rejected, no toggle.
    sleep(Duration::from_millis(50)).await;
    assert!(matches!(
        session.handle_interact(player_id, door),
        Err(GameError::RateLimited)
    ));
    let entity = session.store().get_entity(door).unwrap();
    match entity.get_component(ComponentKind::Openable) {
        Some(Component::Openable(o)) => assert!(o.is_open, "rejected call must not toggle"),
        other => panic!("expected openable, got {other:?}"),
    }

    // After both cooldowns lapse the same door toggles again.
    sleep(Duration::from_millis(1100)).await;
    assert_eq!(
        session.handle_interact(player_id, door).unwrap(),
        Some(false)
    );
}

#[tokio::test(start_paused = true)]
async fn player_cooldown_blocks_other_doors_too() {
    let session = Session::new(test_config(), noop_sender());
    let player_id = Uuid::new_v4();
    session.add_player(player_id, "DoorHopper");
    let first = session.add_door(0.1, 0.1);
    let second = session.add_door(0.0, 0.5);

    assert!(session.handle_interact(player_id, first).is_ok());

    // The target cooldown (100ms) has lapsed but the player cooldown (1s)
    // has not; a different door is still rejected.
    sleep(Duration::from_millis(200)).await;
    assert!(matches!(
        session.handle_interact(player_id, second),
        Err(GameError::RateLimited)
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn interact_classifies_non_interactable_targets() {
    let session = Session::new(test_config(), noop_sender());
    let player_id = Uuid::new_v4();
    session.add_player(player_id, "Poker");

    // A bare entity with no Door or Interactable tag.
    let rock = session.store().create_entity();
    assert!(matches!(
        session.handle_interact(player_id, rock.id()),
        Err(GameError::NotInteractable(_))
    ));

    let ghost = Uuid::new_v4();
    assert!(matches!(
        session.handle_interact(player_id, ghost),
        Err(GameError::EntityNotFound(_))
    ));
}

// ----- Session lifecycle -----

#[tokio::test(flavor = "multi_thread")]
async fn start_and_shutdown_are_idempotent() {
    let session = Arc::new(Session::new(test_config(), noop_sender()));
    Arc::clone(&session).start();
    Arc::clone(&session).start();
    assert!(session.is_running());

    session.shutdown();
    session.shutdown();
    assert!(!session.is_running());

    // Restarting a shut-down session is a no-op, not a panic.
    Arc::clone(&session).start();
    sleep(Duration::from_millis(20)).await;
}

// ----- Hub routing -----

#[tokio::test(start_paused = true)]
async fn hub_forwards_game_actions_to_the_right_session() {
    let server = GameServer::new(test_config());
    server.start_routing();

    let (player, connection_id, mut outbound_rx) = connect_player(&server, "Router").await;
    let session = server.registry().create_session(&[player.clone()]).await;

    let inbound = server.inbound_channel();
    inbound
        .send(ClientPackage {
            message: Envelope {
                action: "move".into(),
                payload: json!({
                    "session_id": session.id().to_string(),
                    "player_id": player.id.to_string(),
                    "vx": 1.0,
                    "vy": 0.5,
                }),
            },
            connection_id,
        })
        .await
        .unwrap();

    // Give the hub and the session loop a moment to drain.
    sleep(Duration::from_millis(100)).await;

    let entity_id = session.player_entity_id(player.id).unwrap();
    let entity = session.store().get_entity(entity_id).unwrap();
    match entity.get_component(ComponentKind::Velocity) {
        Some(Component::Velocity(v)) => {
            assert_eq!((v.vx, v.vy), (1.0, 0.5));
        }
        other => panic!("expected velocity, got {other:?}"),
    }
    assert!(
        outbound_rx.try_recv().is_err(),
        "a routed move must not produce an error response"
    );

    session.shutdown();
}

#[tokio::test(start_paused = true)]
async fn hub_reports_unknown_and_malformed_session_ids() {
    let server = GameServer::new(test_config());
    server.start_routing();

    let (player, connection_id, mut outbound_rx) = connect_player(&server, "Lost").await;

    let inbound = server.inbound_channel();
    inbound
        .send(ClientPackage {
            message: Envelope {
                action: "move".into(),
                payload: json!({
                    "session_id": Uuid::new_v4().to_string(),
                    "player_id": player.id.to_string(),
                    "vx": 1.0,
                    "vy": 0.0,
                }),
            },
            connection_id,
        })
        .await
        .unwrap();

    let response = recv_response(&mut outbound_rx).await;
    assert!(!response.success);
    assert_eq!(response.error.unwrap().code, ErrorCode::SessionNotFound);

    inbound
        .send(ClientPackage {
            message: Envelope {
                action: "move".into(),
                payload: json!({ "vx": 1.0, "vy": 0.0 }),
            },
            connection_id,
        })
        .await
        .unwrap();

    let response = recv_response(&mut outbound_rx).await;
    assert_eq!(response.error.unwrap().code, ErrorCode::InvalidSessionId);
}

#[tokio::test(start_paused = true)]
async fn hub_rejects_unknown_actions() {
    let server = GameServer::new(test_config());
    server.start_routing();

    let (_player, connection_id, mut outbound_rx) = connect_player(&server, "Chaos").await;
    server
        .inbound_channel()
        .send(ClientPackage {
            message: Envelope {
                action: "teleport".into(),
                payload: json!({}),
            },
            connection_id,
        })
        .await
        .unwrap();

    let response = recv_response(&mut outbound_rx).await;
    assert_eq!(response.error.unwrap().code, ErrorCode::InvalidPayload);
}

// ----- Matchmaking flow through the hub -----

#[tokio::test(start_paused = true)]
async fn find_game_flow_creates_a_session_and_notifies_both_players() {
    let server = GameServer::new(test_config());
    server.start_routing();

    let (_player_a, conn_a, mut rx_a) = connect_player(&server, "Alpha").await;
    let (_player_b, conn_b, mut rx_b) = connect_player(&server, "Beta").await;

    let inbound = server.inbound_channel();
    for connection_id in [conn_a, conn_b] {
        inbound
            .send(ClientPackage {
                message: Envelope {
                    action: "find_game".into(),
                    payload: json!({}),
                },
                connection_id,
            })
            .await
            .unwrap();
    }

    // Each player gets the queue ack first, then the game_found push.
    let mut session_ids = Vec::new();
    for rx in [&mut rx_a, &mut rx_b] {
        loop {
            let response = recv_response(rx).await;
            if response.action == "find_game" {
                assert!(response.success);
                continue;
            }
            if response.action == "queue_status" {
                continue;
            }
            assert_eq!(response.action, "game_found");
            let payload = response.payload.unwrap();
            session_ids.push(payload.get("session_id").unwrap().as_str().unwrap().to_string());
            break;
        }
    }

    assert_eq!(session_ids[0], session_ids[1]);
    assert_eq!(server.registry().len().await, 1);

    let session_id = Uuid::parse_str(&session_ids[0]).unwrap();
    let session = server.registry().get(session_id).await.unwrap();
    assert_eq!(session.player_count(), 2);
    session.shutdown();
}

#[tokio::test(start_paused = true)]
async fn find_game_without_identity_reports_player_not_found() {
    let server = GameServer::new(test_config());
    server.start_routing();

    // A connection that never bound a player.
    let manager = server.connection_manager();
    let connection_id = manager
        .add_connection("127.0.0.1:0".parse().unwrap())
        .await;
    let mut outbound_rx = manager.register_outbound(connection_id).await;

    server
        .inbound_channel()
        .send(ClientPackage {
            message: Envelope {
                action: "find_game".into(),
                payload: json!({}),
            },
            connection_id,
        })
        .await
        .unwrap();

    let response = recv_response(&mut outbound_rx).await;
    assert_eq!(response.error.unwrap().code, ErrorCode::PlayerNotFound);
}

// ----- Reconnect safety -----

#[tokio::test(flavor = "multi_thread")]
async fn rebinding_a_player_evicts_the_stale_connection() {
    let manager = ConnectionManager::new(8);
    let player = Player {
        id: Uuid::new_v4(),
        username: "Flaky".to_string(),
    };

    let stale = manager.add_connection("127.0.0.1:0".parse().unwrap()).await;
    manager.bind_player(stale, player.clone()).await;
    let mut stale_rx = manager.register_outbound(stale).await;

    let fresh = manager.add_connection("127.0.0.1:0".parse().unwrap()).await;
    manager.bind_player(fresh, player.clone()).await;
    let mut fresh_rx = manager.register_outbound(fresh).await;

    // The stale connection's outbound channel was closed by the eviction.
    assert!(stale_rx.recv().await.is_none());

    // Sends for the player reach only the new connection.
    manager
        .push_to_player(player.id, ServerResponse::success("game_state", json!({})))
        .await
        .unwrap();
    let delivered = timeout(Duration::from_secs(1), fresh_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(delivered.action, "game_state");
}

#[tokio::test(flavor = "multi_thread")]
async fn full_outbound_buffer_sheds_instead_of_blocking() {
    let manager = ConnectionManager::new(2);
    let player = Player {
        id: Uuid::new_v4(),
        username: "Slowpoke".to_string(),
    };
    let connection_id = manager.add_connection("127.0.0.1:0".parse().unwrap()).await;
    manager.bind_player(connection_id, player.clone()).await;
    // Receiver exists but is never drained.
    let _outbound_rx = manager.register_outbound(connection_id).await;

    let push = |i: u32| ServerResponse::success("game_state", json!({ "tick": i }));
    manager.push_to_player(player.id, push(0)).await.unwrap();
    manager.push_to_player(player.id, push(1)).await.unwrap();

    let overflow = manager.push_to_player(player.id, push(2)).await;
    assert!(matches!(
        overflow,
        Err(crate::messaging::DispatchError::BufferFull(id)) if id == connection_id
    ));
}

// ----- Interact through the full session message loop -----

#[tokio::test(start_paused = true)]
async fn interact_package_toggles_and_acknowledges() {
    let server = GameServer::new(test_config());
    server.start_routing();

    let (player, connection_id, mut outbound_rx) = connect_player(&server, "DoorUser").await;
    let session = server.registry().create_session(&[player.clone()]).await;
    let door = session.add_door(0.1, 0.1);

    server
        .inbound_channel()
        .send(ClientPackage {
            message: Envelope {
                action: "interact".into(),
                payload: json!({
                    "session_id": session.id().to_string(),
                    "player_id": player.id.to_string(),
                    "entity_id": door.to_string(),
                }),
            },
            connection_id,
        })
        .await
        .unwrap();

    let ack = recv_response(&mut outbound_rx).await;
    assert_eq!(ack.action, "interact");
    assert!(ack.success);
    let payload = ack.payload.unwrap();
    assert_eq!(payload.get("is_open").unwrap().as_bool(), Some(true));

    // The room state push follows the ack.
    let push = recv_response(&mut outbound_rx).await;
    assert_eq!(push.action, "game_state");
    let state = push.payload.unwrap();
    assert_eq!(state.get("doors").unwrap().as_array().unwrap().len(), 1);

    session.shutdown();
}
