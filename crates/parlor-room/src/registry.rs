//! The process-wide directory: room-code map, player index, quick-match
//! queue, and the Jeopardy leaderboard.
//!
//! One mutex ([`Registry::lock`]) guards all of it. The lock is held
//! briefly around directory mutations and lookups — callers that need a
//! specific room clone its `Arc` out and take the room's own lock after
//! (registry first, room second, never the reverse; nothing blocking
//! happens under either).

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use tokio::sync::{Mutex, MutexGuard};

use parlor_protocol::{
    GameId, GameType, LeaderboardEntry, PlayerId, RoomCode,
};

use crate::{Room, RoomError, SessionId};

/// Characters used in room codes.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Characters used in game ids.
const GAME_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a random 6-character room code. Uniqueness is the caller's
/// job (the directory retries on collision under its lock).
fn random_code(rng: &mut impl Rng) -> String {
    (0..parlor_protocol::ROOM_CODE_LEN)
        .map(|_| {
            CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char
        })
        .collect()
}

/// Generates a fresh game id: `game_` + 8 lowercase alphanumerics.
pub fn random_game_id() -> GameId {
    let mut rng = rand::rng();
    let suffix: String = (0..8)
        .map(|_| {
            GAME_ID_ALPHABET[rng.random_range(0..GAME_ID_ALPHABET.len())]
                as char
        })
        .collect();
    GameId(format!("game_{suffix}"))
}

/// One waiting quick-match entry.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub player_id: PlayerId,
    pub player_name: String,
    pub game_type: GameType,
    pub session: SessionId,
}

/// Result of an enqueue attempt.
#[derive(Debug)]
pub enum QuickMatchResult {
    /// No partner yet; 1-based queue position.
    Queued(usize),
    /// An earlier entry shared the game type — both left the queue.
    Paired(QueueEntry),
}

#[derive(Debug, Clone)]
struct ScoreRecord {
    name: String,
    score: u32,
}

/// Everything behind the registry lock.
#[derive(Default)]
pub struct Directory {
    rooms: HashMap<RoomCode, Arc<Room>>,
    /// A player is in at most one room at a time.
    player_rooms: HashMap<PlayerId, RoomCode>,
    queue: Vec<QueueEntry>,
    leaderboard: HashMap<PlayerId, ScoreRecord>,
}

impl Directory {
    /// Generates a code no living room uses.
    pub fn fresh_code(&self) -> RoomCode {
        let mut rng = rand::rng();
        loop {
            let raw = random_code(&mut rng);
            if let Ok(code) = RoomCode::parse(&raw) {
                if !self.rooms.contains_key(&code) {
                    return code;
                }
            }
        }
    }

    /// Installs a room and binds its creator.
    ///
    /// # Errors
    /// [`RoomError::AlreadyInRoom`] if the creator is already bound to a
    /// living room.
    pub fn insert_room(
        &mut self,
        room: Arc<Room>,
        creator: &PlayerId,
    ) -> Result<(), RoomError> {
        if self.player_rooms.contains_key(creator) {
            return Err(RoomError::AlreadyInRoom);
        }
        // Entering a room implicitly leaves the quick-match queue.
        self.queue.retain(|e| e.player_id != *creator);
        self.player_rooms
            .insert(creator.clone(), room.code.clone());
        tracing::info!(code = %room.code, %creator, "room created");
        self.rooms.insert(room.code.clone(), room);
        Ok(())
    }

    pub fn room(&self, code: &RoomCode) -> Option<Arc<Room>> {
        self.rooms.get(code).cloned()
    }

    pub fn all_rooms(&self) -> Vec<Arc<Room>> {
        self.rooms.values().cloned().collect()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// The room a player currently belongs to.
    pub fn room_of(&self, player: &PlayerId) -> Option<RoomCode> {
        self.player_rooms.get(player).cloned()
    }

    /// Binds a player to a room (join). Rejects double-binding to a
    /// *different* room; re-binding to the same room is the idempotent
    /// re-join case.
    pub fn bind_player(
        &mut self,
        player: &PlayerId,
        code: &RoomCode,
    ) -> Result<(), RoomError> {
        match self.player_rooms.get(player) {
            Some(current) if current != code => Err(RoomError::AlreadyInRoom),
            _ => {
                self.queue.retain(|e| e.player_id != *player);
                self.player_rooms.insert(player.clone(), code.clone());
                Ok(())
            }
        }
    }

    pub fn unbind_player(&mut self, player: &PlayerId) {
        self.player_rooms.remove(player);
    }

    /// Drops a room from the directory and unbinds every player bound to
    /// it.
    pub fn remove_room(&mut self, code: &RoomCode) {
        if self.rooms.remove(code).is_some() {
            self.player_rooms.retain(|_, c| c != code);
            tracing::info!(%code, "room destroyed");
        }
    }

    // -- Quick match --------------------------------------------------------

    /// Enqueues a player, pairing with the earliest same-game entry if
    /// one is waiting.
    ///
    /// # Errors
    /// [`RoomError::AlreadyQueued`] on a duplicate enqueue.
    pub fn enqueue_quick_match(
        &mut self,
        entry: QueueEntry,
    ) -> Result<QuickMatchResult, RoomError> {
        if self
            .queue
            .iter()
            .any(|e| e.player_id == entry.player_id)
        {
            return Err(RoomError::AlreadyQueued);
        }
        let partner = self.queue.iter().position(|e| {
            e.game_type == entry.game_type && e.player_id != entry.player_id
        });
        match partner {
            Some(pos) => {
                let other = self.queue.remove(pos);
                tracing::info!(
                    a = %other.player_id,
                    b = %entry.player_id,
                    game = %entry.game_type,
                    "quick match paired"
                );
                Ok(QuickMatchResult::Paired(other))
            }
            None => {
                self.queue.push(entry);
                Ok(QuickMatchResult::Queued(self.queue.len()))
            }
        }
    }

    /// Drops any queue entry belonging to a disconnecting session.
    pub fn cancel_quick_match(&mut self, session: SessionId) {
        self.queue.retain(|e| e.session != session);
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    // -- Leaderboard --------------------------------------------------------

    /// Accumulates Jeopardy-correct value for a player.
    pub fn record_score(&mut self, player: &PlayerId, name: &str, delta: u32) {
        let record =
            self.leaderboard
                .entry(player.clone())
                .or_insert(ScoreRecord {
                    name: name.to_owned(),
                    score: 0,
                });
        record.name = name.to_owned();
        record.score += delta;
    }

    /// Top `n` by accumulated score, descending; ties break by name for
    /// a stable ordering.
    pub fn top_scores(&self, n: usize) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .leaderboard
            .iter()
            .map(|(player, record)| LeaderboardEntry {
                player_id: player.clone(),
                player_name: record.name.clone(),
                score: record.score,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.player_name.cmp(&b.player_name))
        });
        entries.truncate(n);
        entries
    }
}

/// The registry lock around the [`Directory`].
pub struct Registry {
    inner: Mutex<Directory>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Directory::default()),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, Directory> {
        self.inner.lock().await
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Broadcaster;

    fn pid(s: &str) -> PlayerId {
        PlayerId::from(s)
    }

    fn make_room(dir: &Directory, b: &Broadcaster, host: &str) -> Arc<Room> {
        let (sid, _rx) = b.register();
        Arc::new(Room::new(
            dir.fresh_code(),
            GameType::Tictactoe,
            "classic".to_owned(),
            pid(host),
            host.to_owned(),
            sid,
            None,
        ))
    }

    #[test]
    fn test_fresh_code_shape() {
        let dir = Directory::default();
        let code = dir.fresh_code();
        assert_eq!(code.as_str().len(), 6);
        assert!(code
            .as_str()
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
    }

    #[test]
    fn test_random_game_id_shape() {
        let id = random_game_id();
        assert!(id.as_str().starts_with("game_"));
        assert_eq!(id.as_str().len(), "game_".len() + 8);
        assert!(id.as_str()["game_".len()..]
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
    }

    #[test]
    fn test_insert_and_lookup_room() {
        let mut dir = Directory::default();
        let b = Broadcaster::new();
        let room = make_room(&dir, &b, "h1");
        let code = room.code.clone();
        dir.insert_room(room, &pid("h1")).unwrap();

        assert!(dir.room(&code).is_some());
        assert_eq!(dir.room_of(&pid("h1")), Some(code.clone()));
        assert_eq!(dir.room_count(), 1);
    }

    #[test]
    fn test_creator_cannot_be_in_two_rooms() {
        let mut dir = Directory::default();
        let b = Broadcaster::new();
        let r1 = make_room(&dir, &b, "h1");
        dir.insert_room(r1, &pid("h1")).unwrap();
        let r2 = make_room(&dir, &b, "h1");
        let err = dir.insert_room(r2, &pid("h1")).unwrap_err();
        assert_eq!(err, RoomError::AlreadyInRoom);
    }

    #[test]
    fn test_bind_player_idempotent_same_room() {
        let mut dir = Directory::default();
        let b = Broadcaster::new();
        let room = make_room(&dir, &b, "h1");
        let code = room.code.clone();
        dir.insert_room(room, &pid("h1")).unwrap();

        dir.bind_player(&pid("p2"), &code).unwrap();
        dir.bind_player(&pid("p2"), &code).unwrap();

        let other = RoomCode::parse("ZZZZZ9").unwrap();
        let err = dir.bind_player(&pid("p2"), &other).unwrap_err();
        assert_eq!(err, RoomError::AlreadyInRoom);
    }

    #[test]
    fn test_remove_room_unbinds_members() {
        let mut dir = Directory::default();
        let b = Broadcaster::new();
        let room = make_room(&dir, &b, "h1");
        let code = room.code.clone();
        dir.insert_room(room, &pid("h1")).unwrap();
        dir.bind_player(&pid("p2"), &code).unwrap();

        dir.remove_room(&code);
        assert!(dir.room(&code).is_none());
        assert!(dir.room_of(&pid("h1")).is_none());
        assert!(dir.room_of(&pid("p2")).is_none());
    }

    #[test]
    fn test_quick_match_pairs_same_game_type_fifo() {
        let mut dir = Directory::default();
        let entry = |p: &str, gt: GameType, session| QueueEntry {
            player_id: pid(p),
            player_name: p.to_owned(),
            game_type: gt,
            session,
        };
        let b = Broadcaster::new();
        let (s1, _r1) = b.register();
        let (s2, _r2) = b.register();
        let (s3, _r3) = b.register();

        let r = dir
            .enqueue_quick_match(entry("q1", GameType::Rps, s1))
            .unwrap();
        assert!(matches!(r, QuickMatchResult::Queued(1)));
        let r = dir
            .enqueue_quick_match(entry("q2", GameType::Uno, s2))
            .unwrap();
        assert!(matches!(r, QuickMatchResult::Queued(2)));

        // Third entry matches the first, not the second.
        let r = dir
            .enqueue_quick_match(entry("q3", GameType::Rps, s3))
            .unwrap();
        match r {
            QuickMatchResult::Paired(other) => {
                assert_eq!(other.player_id, pid("q1"));
            }
            QuickMatchResult::Queued(_) => panic!("expected a pair"),
        }
        assert_eq!(dir.queue_len(), 1, "only the uno entry remains");
    }

    #[test]
    fn test_quick_match_duplicate_enqueue_rejected() {
        let mut dir = Directory::default();
        let b = Broadcaster::new();
        let (s1, _r1) = b.register();
        let e = QueueEntry {
            player_id: pid("q1"),
            player_name: "q1".to_owned(),
            game_type: GameType::Rps,
            session: s1,
        };
        dir.enqueue_quick_match(e.clone()).unwrap();
        let err = dir.enqueue_quick_match(e).unwrap_err();
        assert_eq!(err, RoomError::AlreadyQueued);
    }

    #[test]
    fn test_quick_match_cancel_by_session() {
        let mut dir = Directory::default();
        let b = Broadcaster::new();
        let (s1, _r1) = b.register();
        dir.enqueue_quick_match(QueueEntry {
            player_id: pid("q1"),
            player_name: "q1".to_owned(),
            game_type: GameType::Rps,
            session: s1,
        })
        .unwrap();
        dir.cancel_quick_match(s1);
        assert_eq!(dir.queue_len(), 0);
    }

    #[test]
    fn test_leaderboard_accumulates_and_ranks_top_n() {
        let mut dir = Directory::default();
        dir.record_score(&pid("a"), "Alice", 100);
        dir.record_score(&pid("a"), "Alice", 200);
        dir.record_score(&pid("b"), "Bob", 250);
        dir.record_score(&pid("c"), "Cleo", 50);

        let top = dir.top_scores(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].player_id, pid("a"));
        assert_eq!(top[0].score, 300);
        assert_eq!(top[1].player_id, pid("b"));
    }
}
