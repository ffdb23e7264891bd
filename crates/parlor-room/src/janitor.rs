//! Idle-room eviction.
//!
//! A periodic task sweeps every 60 seconds and destroys rooms that have
//! seen no activity for 30 minutes. Eviction is a soft cancellation: every
//! member receives `room_state{room: null}`, their session's room binding
//! is cleared, and the sockets stay open.

use std::sync::Arc;
use std::time::Duration;

use parlor_protocol::{RoomState, ServerMessage};

use crate::{Broadcaster, Registry};

/// How often the janitor wakes.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Idle age past which a room is evicted.
pub const IDLE_LIMIT: Duration = Duration::from_secs(30 * 60);

/// Spawns the janitor task. Runs until the process exits.
pub fn spawn_janitor(
    registry: Arc<Registry>,
    broadcaster: Arc<Broadcaster>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        ticker.tick().await; // the first tick completes immediately
        loop {
            ticker.tick().await;
            let evicted = sweep(&registry, &broadcaster, IDLE_LIMIT).await;
            if evicted > 0 {
                tracing::info!(evicted, "idle rooms evicted");
            }
        }
    })
}

/// One sweep pass; returns how many rooms were evicted. Public so tests
/// can drive it with a zero idle limit.
pub async fn sweep(
    registry: &Registry,
    broadcaster: &Broadcaster,
    idle_limit: Duration,
) -> usize {
    let mut dir = registry.lock().await;
    let mut evicted = 0;
    for room in dir.all_rooms() {
        let mut inner = room.lock().await;
        if inner.last_active.elapsed() < idle_limit {
            continue;
        }
        tracing::info!(code = %room.code, "evicting idle room");
        inner.broadcast(
            broadcaster,
            &ServerMessage::RoomState(RoomState { room: None }),
        );
        // Kill any in-flight delayed effects for this room.
        inner.epoch += 1;
        for session in inner.member_sessions() {
            broadcaster.set_room(session, None);
        }
        drop(inner);
        dir.remove_room(&room.code);
        evicted += 1;
    }
    evicted
}
