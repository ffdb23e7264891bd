//! Scheduled delayed effects: Memory card hides, speed-mode deadlines.
//!
//! Every effect is keyed by `(room_code, game_id, epoch)`. When the timer
//! fires it re-enters through the normal locks (registry, then room) and
//! checks the key first — if the room is gone, a different game is
//! running, or the epoch moved on, the callback is a no-op. The engine
//! applies a second, finer guard (move sequence, question index) inside
//! [`parlor_engine::GameEngine::apply_timer`].

use std::sync::Arc;

use parlor_engine::{DelayedEffect, TimerOutcome};
use parlor_protocol::{
    GameId, GameOver, GameState, RoomCode, ServerMessage, Timeout,
};

use crate::{Broadcaster, Registry};

/// Identifies the world an effect was scheduled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectKey {
    pub code: RoomCode,
    pub game_id: GameId,
    pub epoch: u64,
}

/// Schedules `effect` to fire after its delay. Fire-and-forget; the task
/// dies silently when the key no longer matches the world.
pub fn schedule_effect(
    registry: Arc<Registry>,
    broadcaster: Arc<Broadcaster>,
    key: EffectKey,
    effect: DelayedEffect,
) {
    tokio::spawn(async move {
        tokio::time::sleep(effect.after).await;
        fire(registry, broadcaster, key, effect).await;
    });
}

async fn fire(
    registry: Arc<Registry>,
    broadcaster: Arc<Broadcaster>,
    key: EffectKey,
    effect: DelayedEffect,
) {
    // Clone the room handle out so the registry lock is not held while
    // taking the room lock's slow path.
    let room = registry.lock().await.room(&key.code);
    let Some(room) = room else {
        return; // room evicted or destroyed
    };
    let mut inner = room.lock().await;
    if inner.epoch != key.epoch || inner.game_id.as_ref() != Some(&key.game_id)
    {
        return; // a different world now
    }
    let outcome = match inner.game.as_mut() {
        Some(game) => game.apply_timer(&effect.action),
        None => return,
    };
    let TimerOutcome::Fired { timeout, next } = outcome else {
        return;
    };
    let Some((snapshot, over, winner)) = inner
        .game
        .as_ref()
        .map(|g| (g.snapshot(), g.is_over(), g.winner()))
    else {
        return;
    };

    tracing::debug!(code = %key.code, game_id = %key.game_id, "delayed effect fired");
    if let Some(reason) = timeout {
        inner.broadcast(
            &broadcaster,
            &ServerMessage::Timeout(Timeout {
                game_id: key.game_id.clone(),
                reason,
            }),
        );
    }
    inner.broadcast(
        &broadcaster,
        &ServerMessage::GameState(GameState {
            game_id: key.game_id.clone(),
            game: snapshot,
        }),
    );
    if over {
        inner.broadcast(
            &broadcaster,
            &ServerMessage::GameOver(GameOver {
                game_id: key.game_id.clone(),
                winner,
            }),
        );
    } else if let Some(next_effect) = next {
        drop(inner);
        schedule_effect(registry, broadcaster, key, next_effect);
    }
}
