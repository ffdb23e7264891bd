//! Command dispatch: one typed handler per inbound frame.
//!
//! Handlers return `Result<(), ServerError>`; a failure becomes an
//! `error` frame to the originating session only — a rejected command is
//! never visible to anyone else in the room.
//!
//! Lock discipline: the registry lock is taken first, a room's lock
//! second, and neither is held across anything blocking. Broadcasts are
//! queue pushes and may run under the room lock.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Map;

use parlor_engine::Game;
use parlor_protocol::{
    ChatBroadcast, ClientCommand, GameId, GameOver, GameState, Leaderboard,
    PlayerId, PlayerJoined, PlayerLeft, QuickMatchAck, QuickMatchFound,
    RoomCode, RoomState, RoomStatus, ServerMessage,
};
use parlor_room::{
    random_game_id, timer, validate_name, JoinKind, QueueEntry,
    QuickMatchResult, Room, RoomError, SessionId,
};

use crate::{AppState, ServerError};

/// Decodes, routes, and reports. The single entry point the session loop
/// calls per frame.
pub async fn dispatch(state: &AppState, session: SessionId, cmd: ClientCommand) {
    let result = match cmd {
        ClientCommand::CreateRoom(c) => handle_create(state, session, c).await,
        ClientCommand::JoinRoom(c) => handle_join(state, session, c).await,
        ClientCommand::LeaveRoom(c) => handle_leave(state, session, c).await,
        ClientCommand::StartGame(c) => handle_start(state, session, c).await,
        ClientCommand::MakeMove(c) => {
            handle_move(state, session, c.game_id, c.player_id, c.data).await
        }
        ClientCommand::Answer(c) => {
            // Jeopardy answers route through the same move path.
            let mut data = Map::new();
            data.insert("answer".to_owned(), c.answer.into());
            handle_move(state, session, c.game_id, c.player_id, data).await
        }
        ClientCommand::ChatMessage(c) => handle_chat(state, session, c).await,
        ClientCommand::QuickMatch(c) => {
            handle_quick_match(state, session, c).await
        }
        ClientCommand::Leaderboard(_) => {
            handle_leaderboard(state, session).await
        }
    };

    if let Err(err) = result {
        tracing::debug!(%session, error = %err, "command rejected");
        state
            .broadcaster
            .send(session, &ServerMessage::Error(err.to_string()));
    }
}

/// Disconnect cleanup: cancel any quick-match entry, then run the leave
/// procedure for the bound room. Errors are swallowed — the socket is
/// already gone.
pub async fn handle_disconnect(state: &AppState, session: SessionId) {
    state.registry.lock().await.cancel_quick_match(session);

    let Some(identity) = state.broadcaster.identity(session) else {
        return;
    };
    if let (Some(player), Some(code)) =
        (identity.player_id, identity.room_code)
    {
        if let Err(e) = leave_room(state, session, &player, &code).await {
            tracing::debug!(
                %session, %player, error = %e,
                "leave on disconnect failed"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Identity helpers
// ---------------------------------------------------------------------------

/// Room-scoped commands require a bound identity that matches the claimed
/// player id.
fn require_identity(
    state: &AppState,
    session: SessionId,
    claimed: &PlayerId,
) -> Result<(PlayerId, String), ServerError> {
    let identity = state.broadcaster.identity(session).unwrap_or_default();
    let Some(bound) = identity.player_id else {
        return Err(RoomError::Validation(
            "Create or join a room first".to_owned(),
        )
        .into());
    };
    if &bound != claimed {
        return Err(RoomError::Validation(
            "Player id does not match this session".to_owned(),
        )
        .into());
    }
    let name = identity
        .player_name
        .unwrap_or_else(|| bound.0.clone());
    Ok((bound, name))
}

/// Identity-bearing commands bind the session the first time; a session
/// never changes player.
fn bind_identity(
    state: &AppState,
    session: SessionId,
    player: &PlayerId,
    name: &str,
) -> Result<(), ServerError> {
    let identity = state.broadcaster.identity(session).unwrap_or_default();
    if let Some(bound) = identity.player_id {
        if &bound != player {
            return Err(RoomError::Validation(
                "Session already identified as another player".to_owned(),
            )
            .into());
        }
    }
    state.broadcaster.bind_identity(session, player, name);
    Ok(())
}

fn parse_code(raw: &str) -> Result<RoomCode, ServerError> {
    RoomCode::parse(raw).map_err(|_| {
        RoomError::Validation("Invalid room code".to_owned()).into()
    })
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

// ---------------------------------------------------------------------------
// Room lifecycle
// ---------------------------------------------------------------------------

async fn handle_create(
    state: &AppState,
    session: SessionId,
    c: parlor_protocol::CreateRoom,
) -> Result<(), ServerError> {
    let name = validate_name(&c.player_name)?;
    bind_identity(state, session, &c.player_id, &name)?;
    let mode = c
        .game_mode
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| "classic".to_owned());

    let room = {
        let mut dir = state.registry.lock().await;
        let code = dir.fresh_code();
        let room = Arc::new(Room::new(
            code,
            c.game_type,
            mode,
            c.player_id.clone(),
            name,
            session,
            c.password,
        ));
        dir.insert_room(Arc::clone(&room), &c.player_id)?;
        room
    };

    state
        .broadcaster
        .set_room(session, Some(room.code.clone()));

    let dto = room.lock().await.dto(&room.code);
    state
        .broadcaster
        .send(session, &ServerMessage::RoomState(RoomState { room: Some(dto) }));
    Ok(())
}

async fn handle_join(
    state: &AppState,
    session: SessionId,
    c: parlor_protocol::JoinRoom,
) -> Result<(), ServerError> {
    let name = validate_name(&c.player_name)?;
    let code = parse_code(&c.code)?;
    bind_identity(state, session, &c.player_id, &name)?;

    let mut dir = state.registry.lock().await;
    let room = dir.room(&code).ok_or(RoomError::NotFound)?;
    let mut inner = room.lock().await;

    if !inner.password_matches(c.password.as_deref()) {
        return Err(RoomError::WrongPassword.into());
    }
    if let Some(current) = dir.room_of(&c.player_id) {
        if current != code {
            return Err(RoomError::AlreadyInRoom.into());
        }
    }

    let kind = inner.add_member(c.player_id.clone(), name.clone(), session)?;
    if kind != JoinKind::AlreadyPresent {
        dir.bind_player(&c.player_id, &code)?;
    }
    drop(dir);
    state.broadcaster.set_room(session, Some(code.clone()));

    if kind == JoinKind::AlreadyPresent {
        // Idempotent re-join: just show the current room.
        let dto = inner.dto(&code);
        state.broadcaster.send(
            session,
            &ServerMessage::RoomState(RoomState { room: Some(dto) }),
        );
        return Ok(());
    }

    // A joiner landing in a running game sees the game immediately,
    // before any broadcast reaches them.
    if inner.status == RoomStatus::Playing {
        if let (Some(game), Some(game_id)) =
            (inner.game.as_ref(), inner.game_id.clone())
        {
            state.broadcaster.send(
                session,
                &ServerMessage::GameState(GameState {
                    game_id,
                    game: game.snapshot(),
                }),
            );
        }
    }

    tracing::info!(
        %code, player = %c.player_id, ?kind, "player joined room"
    );
    inner.broadcast(
        &state.broadcaster,
        &ServerMessage::PlayerJoined(PlayerJoined {
            code: code.clone(),
            player_id: c.player_id,
            player_name: name,
            spectator: kind == JoinKind::Spectator,
        }),
    );
    let dto = inner.dto(&code);
    inner.broadcast(
        &state.broadcaster,
        &ServerMessage::RoomState(RoomState { room: Some(dto) }),
    );
    Ok(())
}

async fn handle_leave(
    state: &AppState,
    session: SessionId,
    c: parlor_protocol::LeaveRoom,
) -> Result<(), ServerError> {
    let (player, _) = require_identity(state, session, &c.player_id)?;
    let code = parse_code(&c.code)?;
    leave_room(state, session, &player, &code).await
}

/// The leave procedure, shared by the explicit command and disconnect.
async fn leave_room(
    state: &AppState,
    session: SessionId,
    player: &PlayerId,
    code: &RoomCode,
) -> Result<(), ServerError> {
    let mut dir = state.registry.lock().await;
    let room = dir.room(code).ok_or(RoomError::NotFound)?;
    let mut inner = room.lock().await;

    let outcome = inner.remove_member(player);
    if !outcome.removed {
        return Err(
            RoomError::Validation("You are not in this room".to_owned()).into()
        );
    }
    dir.unbind_player(player);
    state.broadcaster.set_room(session, None);
    tracing::info!(%code, %player, "player left room");

    if outcome.destroy {
        // Stale timers die with the epoch.
        inner.epoch += 1;
        drop(inner);
        dir.remove_room(code);
        return Ok(());
    }
    drop(dir);

    inner.broadcast(
        &state.broadcaster,
        &ServerMessage::PlayerLeft(PlayerLeft {
            code: code.clone(),
            player_id: player.clone(),
        }),
    );
    let dto = inner.dto(code);
    inner.broadcast(
        &state.broadcaster,
        &ServerMessage::RoomState(RoomState { room: Some(dto) }),
    );
    Ok(())
}

async fn handle_start(
    state: &AppState,
    session: SessionId,
    c: parlor_protocol::StartGame,
) -> Result<(), ServerError> {
    let (player, _) = require_identity(state, session, &c.player_id)?;
    let code = parse_code(&c.code)?;

    let dir = state.registry.lock().await;
    let room = dir.room(&code).ok_or(RoomError::NotFound)?;
    drop(dir);
    let mut inner = room.lock().await;

    if inner.host != player {
        return Err(RoomError::NotHost.into());
    }
    if inner.status != RoomStatus::Waiting {
        return Err(RoomError::AlreadyStarted.into());
    }
    let min = inner.game_type.min_players();
    if inner.players.len() < min {
        return Err(RoomError::NotEnoughPlayers(min).into());
    }

    let game = Game::start(inner.game_type, &inner.players, &inner.game_mode);
    let game_id = random_game_id();
    let initial_effect = game.initial_effect();
    let snapshot = game.snapshot();

    inner.game_id = Some(game_id.clone());
    inner.status = RoomStatus::Playing;
    inner.epoch += 1;
    inner.game = Some(game);
    tracing::info!(
        %code, %game_id, game_type = %inner.game_type, "game started"
    );

    let dto = inner.dto(&code);
    inner.broadcast(
        &state.broadcaster,
        &ServerMessage::RoomState(RoomState { room: Some(dto) }),
    );
    inner.broadcast(
        &state.broadcaster,
        &ServerMessage::GameState(GameState {
            game_id: game_id.clone(),
            game: snapshot,
        }),
    );

    let epoch = inner.epoch;
    drop(inner);
    if let Some(effect) = initial_effect {
        timer::schedule_effect(
            Arc::clone(&state.registry),
            Arc::clone(&state.broadcaster),
            timer::EffectKey {
                code,
                game_id,
                epoch,
            },
            effect,
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Moves
// ---------------------------------------------------------------------------

async fn handle_move(
    state: &AppState,
    session: SessionId,
    game_id: GameId,
    player_id: PlayerId,
    data: Map<String, serde_json::Value>,
) -> Result<(), ServerError> {
    let (player, player_name) = require_identity(state, session, &player_id)?;
    let identity = state.broadcaster.identity(session).unwrap_or_default();
    let code = identity.room_code.ok_or(RoomError::GameNotFound)?;

    let room = {
        let dir = state.registry.lock().await;
        dir.room(&code).ok_or(RoomError::NotFound)?
    };
    let mut inner = room.lock().await;
    if inner.game_id.as_ref() != Some(&game_id) {
        return Err(RoomError::GameNotFound.into());
    }
    let game = inner.game.as_mut().ok_or(RoomError::GameNotFound)?;

    // A rejected move mutates nothing and is reported to the mover only.
    let applied = game.apply_move(&player, &data)?;
    let (snapshot, over, winner) = (game.snapshot(), game.is_over(), game.winner());

    inner.broadcast(
        &state.broadcaster,
        &ServerMessage::GameState(GameState {
            game_id: game_id.clone(),
            game: snapshot,
        }),
    );
    if over {
        tracing::info!(%code, %game_id, %winner, "game over");
        inner.broadcast(
            &state.broadcaster,
            &ServerMessage::GameOver(GameOver {
                game_id: game_id.clone(),
                winner,
            }),
        );
    }

    let epoch = inner.epoch;
    drop(inner);

    if let Some(effect) = applied.effect {
        timer::schedule_effect(
            Arc::clone(&state.registry),
            Arc::clone(&state.broadcaster),
            timer::EffectKey {
                code,
                game_id,
                epoch,
            },
            effect,
        );
    }
    if let Some((scorer, delta)) = applied.scored {
        let mut dir = state.registry.lock().await;
        dir.record_score(&scorer, &player_name, delta);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Chat, quick match, leaderboard
// ---------------------------------------------------------------------------

async fn handle_chat(
    state: &AppState,
    session: SessionId,
    c: parlor_protocol::ChatMessage,
) -> Result<(), ServerError> {
    let (player, _) = require_identity(state, session, &c.player_id)?;
    let code = parse_code(&c.room_code)?;

    let room = {
        let dir = state.registry.lock().await;
        dir.room(&code).ok_or(RoomError::NotFound)?
    };
    let mut inner = room.lock().await;
    if !inner.contains(&player) {
        return Err(
            RoomError::Validation("You are not in this room".to_owned()).into()
        );
    }
    let player_name = inner
        .player_names
        .get(&player)
        .cloned()
        .unwrap_or_else(|| player.0.clone());

    inner.broadcast(
        &state.broadcaster,
        &ServerMessage::ChatMessage(ChatBroadcast {
            room_code: code,
            player_id: player,
            player_name,
            text: c.text,
            timestamp: now_millis(),
        }),
    );
    Ok(())
}

async fn handle_quick_match(
    state: &AppState,
    session: SessionId,
    c: parlor_protocol::QuickMatch,
) -> Result<(), ServerError> {
    let name = match &c.player_name {
        Some(raw) => validate_name(raw)?,
        None => c.player_id.0.clone(),
    };
    bind_identity(state, session, &c.player_id, &name)?;

    let mut dir = state.registry.lock().await;
    if dir.room_of(&c.player_id).is_some() {
        return Err(RoomError::AlreadyInRoom.into());
    }

    let result = dir.enqueue_quick_match(QueueEntry {
        player_id: c.player_id.clone(),
        player_name: name.clone(),
        game_type: c.game_type,
        session,
    })?;

    match result {
        QuickMatchResult::Queued(position) => {
            drop(dir);
            state.broadcaster.send(
                session,
                &ServerMessage::QuickMatch(QuickMatchAck {
                    game_type: c.game_type,
                    position,
                }),
            );
        }
        QuickMatchResult::Paired(other) => {
            // The earlier entry hosts the fresh room.
            let code = dir.fresh_code();
            let room = Arc::new(Room::new(
                code.clone(),
                c.game_type,
                "classic".to_owned(),
                other.player_id.clone(),
                other.player_name.clone(),
                other.session,
                None,
            ));
            dir.insert_room(Arc::clone(&room), &other.player_id)?;
            {
                let mut inner = room.lock().await;
                inner.add_member(c.player_id.clone(), name, session)?;
                dir.bind_player(&c.player_id, &code)?;
            }
            drop(dir);

            state
                .broadcaster
                .set_room(other.session, Some(code.clone()));
            state.broadcaster.set_room(session, Some(code.clone()));

            let dto = room.lock().await.dto(&code);
            let found =
                ServerMessage::QuickMatchFound(QuickMatchFound { room: dto });
            state.broadcaster.send(other.session, &found);
            state.broadcaster.send(session, &found);
        }
    }
    Ok(())
}

async fn handle_leaderboard(
    state: &AppState,
    session: SessionId,
) -> Result<(), ServerError> {
    let entries = state.registry.lock().await.top_scores(10);
    state.broadcaster.send(
        session,
        &ServerMessage::Leaderboard(Leaderboard { entries }),
    );
    Ok(())
}
