//! Integration tests for the room layer: registry + room + broadcaster +
//! janitor + delayed effects working together.

use std::sync::Arc;
use std::time::Duration;

use parlor_engine::{DelayedEffect, Game, TimerAction};
use parlor_protocol::{GameType, PlayerId, RoomStatus, ServerMessage};
use parlor_room::{
    janitor, random_game_id, timer, Broadcaster, Registry, Room, RoomError,
};

fn pid(s: &str) -> PlayerId {
    PlayerId::from(s)
}

/// Creates a room via the registry with `host` and returns it plus the
/// host's outbound queue.
async fn create_room(
    registry: &Registry,
    broadcaster: &Broadcaster,
    host: &str,
    game_type: GameType,
) -> (
    Arc<Room>,
    tokio::sync::mpsc::UnboundedReceiver<String>,
) {
    let (sid, rx) = broadcaster.register();
    let mut dir = registry.lock().await;
    let code = dir.fresh_code();
    let room = Arc::new(Room::new(
        code,
        game_type,
        "classic".to_owned(),
        pid(host),
        host.to_owned(),
        sid,
        None,
    ));
    dir.insert_room(Arc::clone(&room), &pid(host)).unwrap();
    (room, rx)
}

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<String>) -> Vec<String> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(frame);
    }
    frames
}

#[tokio::test]
async fn test_create_join_leave_and_host_succession() {
    let registry = Registry::new();
    let broadcaster = Broadcaster::new();
    let (room, mut host_rx) =
        create_room(&registry, &broadcaster, "alice", GameType::Uno).await;

    // Two more players join.
    let (bob_sid, mut bob_rx) = broadcaster.register();
    let (cleo_sid, _cleo_rx) = broadcaster.register();
    {
        let mut dir = registry.lock().await;
        let mut inner = room.lock().await;
        inner
            .add_member(pid("bob"), "Bob".to_owned(), bob_sid)
            .unwrap();
        dir.bind_player(&pid("bob"), &room.code).unwrap();
        inner
            .add_member(pid("cleo"), "Cleo".to_owned(), cleo_sid)
            .unwrap();
        dir.bind_player(&pid("cleo"), &room.code).unwrap();
        let dto = inner.dto(&room.code);
        inner.broadcast(
            &broadcaster,
            &ServerMessage::RoomState(parlor_protocol::RoomState { room: Some(dto) }),
        );
    }
    assert_eq!(drain(&mut host_rx).len(), 1);
    assert_eq!(drain(&mut bob_rx).len(), 1);

    // The host leaves; bob (joined first after alice) succeeds.
    {
        let mut dir = registry.lock().await;
        let mut inner = room.lock().await;
        let outcome = inner.remove_member(&pid("alice"));
        assert!(!outcome.destroy);
        assert_eq!(outcome.new_host, Some(pid("bob")));
        dir.unbind_player(&pid("alice"));
    }

    // Everyone leaves; the room must be destroyed.
    {
        let mut dir = registry.lock().await;
        let mut inner = room.lock().await;
        inner.remove_member(&pid("bob"));
        let outcome = inner.remove_member(&pid("cleo"));
        assert!(outcome.destroy);
        drop(inner);
        dir.remove_room(&room.code);
        assert_eq!(dir.room_count(), 0);
        assert!(dir.room_of(&pid("bob")).is_none());
    }
}

#[tokio::test]
async fn test_start_game_sets_playing_state() {
    let registry = Registry::new();
    let broadcaster = Broadcaster::new();
    let (room, _rx) =
        create_room(&registry, &broadcaster, "alice", GameType::Tictactoe)
            .await;
    let (sid, _rx2) = broadcaster.register();

    let mut inner = room.lock().await;
    inner
        .add_member(pid("bob"), "Bob".to_owned(), sid)
        .unwrap();
    inner.game = Some(Game::start(
        GameType::Tictactoe,
        &inner.players.clone(),
        "classic",
    ));
    inner.game_id = Some(random_game_id());
    inner.status = RoomStatus::Playing;
    inner.epoch += 1;

    let dto = inner.dto(&room.code);
    assert_eq!(dto.status, RoomStatus::Playing);
    assert!(dto.game_id.is_some());
    assert!(inner.game.is_some());
}

#[tokio::test]
async fn test_janitor_evicts_idle_rooms_and_clears_bindings() {
    let registry = Registry::new();
    let broadcaster = Broadcaster::new();
    let (room, mut host_rx) =
        create_room(&registry, &broadcaster, "alice", GameType::Rps).await;
    let host_session = {
        let inner = room.lock().await;
        inner.session_of(&pid("alice")).unwrap()
    };
    broadcaster.set_room(host_session, Some(room.code.clone()));

    // Zero idle limit: everything is stale.
    let evicted =
        janitor::sweep(&registry, &broadcaster, Duration::ZERO).await;
    assert_eq!(evicted, 1);

    // The member got a room_state with a null room, and the binding is
    // cleared; the socket itself is untouched.
    let frames = drain(&mut host_rx);
    assert_eq!(frames.len(), 1);
    assert!(frames[0].contains("\"room_state\""));
    assert!(frames[0].contains("null"));
    let identity = broadcaster.identity(host_session).unwrap();
    assert!(identity.room_code.is_none());

    let dir = registry.lock().await;
    assert_eq!(dir.room_count(), 0);
    assert!(dir.room_of(&pid("alice")).is_none());
}

#[tokio::test]
async fn test_janitor_spares_active_rooms() {
    let registry = Registry::new();
    let broadcaster = Broadcaster::new();
    let (_room, _rx) =
        create_room(&registry, &broadcaster, "alice", GameType::Rps).await;

    let evicted =
        janitor::sweep(&registry, &broadcaster, Duration::from_secs(3600))
            .await;
    assert_eq!(evicted, 0);
    assert_eq!(registry.lock().await.room_count(), 1);
}

#[tokio::test]
async fn test_delayed_effect_fires_and_broadcasts_timeout() {
    let registry = Arc::new(Registry::new());
    let broadcaster = Arc::new(Broadcaster::new());
    let (room, mut host_rx) =
        create_room(&registry, &broadcaster, "alice", GameType::Tictactoe)
            .await;

    // Stand up a speed game by hand.
    let game_id = random_game_id();
    let epoch = {
        let (sid, rx) = broadcaster.register();
        std::mem::drop(rx);
        let mut inner = room.lock().await;
        inner
            .add_member(pid("bob"), "Bob".to_owned(), sid)
            .unwrap();
        let players = inner.players.clone();
        inner.game = Some(Game::start(GameType::Tictactoe, &players, "speed"));
        inner.game_id = Some(game_id.clone());
        inner.status = RoomStatus::Playing;
        inner.epoch += 1;
        inner.epoch
    };

    timer::schedule_effect(
        Arc::clone(&registry),
        Arc::clone(&broadcaster),
        timer::EffectKey {
            code: room.code.clone(),
            game_id: game_id.clone(),
            epoch,
        },
        DelayedEffect {
            after: Duration::from_millis(20),
            action: TimerAction::TurnDeadline { seq: 0 },
        },
    );
    tokio::time::sleep(Duration::from_millis(200)).await;

    let frames = drain(&mut host_rx);
    // timeout, game_state, game_over — the opponent won on the clock.
    assert!(frames.iter().any(|f| f.contains("\"timeout\"")));
    assert!(frames.iter().any(|f| f.contains("\"game_state\"")));
    assert!(frames.iter().any(|f| f.contains("\"game_over\"")));
    let inner = room.lock().await;
    assert!(inner.game.as_ref().unwrap().is_over());
}

#[tokio::test]
async fn test_stale_delayed_effect_is_discarded_on_epoch_change() {
    let registry = Arc::new(Registry::new());
    let broadcaster = Arc::new(Broadcaster::new());
    let (room, mut host_rx) =
        create_room(&registry, &broadcaster, "alice", GameType::Tictactoe)
            .await;

    let game_id = random_game_id();
    {
        let mut inner = room.lock().await;
        let players = vec![pid("alice"), pid("bob")];
        inner.game = Some(Game::start(GameType::Tictactoe, &players, "speed"));
        inner.game_id = Some(game_id.clone());
        inner.status = RoomStatus::Playing;
        inner.epoch = 1;
    }

    // Schedule against epoch 1, then move the world on.
    timer::schedule_effect(
        Arc::clone(&registry),
        Arc::clone(&broadcaster),
        timer::EffectKey {
            code: room.code.clone(),
            game_id,
            epoch: 1,
        },
        DelayedEffect {
            after: Duration::from_millis(20),
            action: TimerAction::TurnDeadline { seq: 0 },
        },
    );
    room.lock().await.epoch = 2;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(drain(&mut host_rx).is_empty(), "stale effect must be silent");
    let inner = room.lock().await;
    assert!(!inner.game.as_ref().unwrap().is_over());
}

#[tokio::test]
async fn test_quick_match_pairing_flow() {
    let registry = Registry::new();
    let broadcaster = Broadcaster::new();
    let (s1, _r1) = broadcaster.register();
    let (s2, _r2) = broadcaster.register();

    let mut dir = registry.lock().await;
    let entry = |p: &str, session| parlor_room::QueueEntry {
        player_id: pid(p),
        player_name: p.to_owned(),
        game_type: GameType::Rps,
        session,
    };
    let first = dir.enqueue_quick_match(entry("q1", s1)).unwrap();
    assert!(matches!(first, parlor_room::QuickMatchResult::Queued(1)));

    match dir.enqueue_quick_match(entry("q2", s2)).unwrap() {
        parlor_room::QuickMatchResult::Paired(other) => {
            assert_eq!(other.player_id, pid("q1"));
        }
        parlor_room::QuickMatchResult::Queued(_) => {
            panic!("same game type must pair")
        }
    }

    // A dangling duplicate is rejected even after pairing cleared the
    // queue, only if still queued — q1 left, so requeue works.
    assert!(dir.enqueue_quick_match(entry("q1", s1)).is_ok());
    let err = dir.enqueue_quick_match(entry("q1", s1)).unwrap_err();
    assert_eq!(err, RoomError::AlreadyQueued);
}
