//! A single room: membership, host succession, game binding.
//!
//! The room is the unit of coordination. All of its mutable state sits
//! behind one `tokio::sync::Mutex` ([`Room::lock`]); every command that
//! touches a specific room runs under that lock, after the registry lock
//! and never the other way around. Broadcasts are non-blocking queue
//! pushes, so performing them while holding the room lock is safe.

use std::collections::HashMap;
use std::time::Instant;

use tokio::sync::{Mutex, MutexGuard};

use parlor_engine::Game;
use parlor_protocol::{
    GameId, GameType, PlayerId, RoomCode, RoomDto, RoomStatus, ServerMessage,
};

use crate::{Broadcaster, RoomError, SessionId};

/// Hard cap on players in any room.
pub const MAX_PLAYERS: usize = 8;

/// Maximum display-name length.
pub const MAX_NAME_LEN: usize = 20;

/// Trims and validates a display name: required, at most
/// [`MAX_NAME_LEN`] printable characters.
pub fn validate_name(raw: &str) -> Result<String, RoomError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(RoomError::Validation(
            "Player name is required".to_owned(),
        ));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(RoomError::Validation(
            "Player name is too long (max 20 characters)".to_owned(),
        ));
    }
    if name.chars().any(char::is_control) {
        return Err(RoomError::Validation(
            "Player name contains unprintable characters".to_owned(),
        ));
    }
    Ok(name.to_owned())
}

/// How a join was routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Appended to `players`.
    Player,
    /// Appended to `spectators` (game in progress, not mid-joinable).
    Spectator,
    /// The player was already in the room; nothing changed.
    AlreadyPresent,
}

/// What removing a member did to the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveOutcome {
    /// The member was actually found and removed.
    pub removed: bool,
    /// The room has no players left and must be destroyed.
    pub destroy: bool,
    /// Host succession happened; this is the new host.
    pub new_host: Option<PlayerId>,
}

pub struct Room {
    pub code: RoomCode,
    inner: Mutex<RoomInner>,
}

pub struct RoomInner {
    pub host: PlayerId,
    pub players: Vec<PlayerId>,
    pub spectators: Vec<PlayerId>,
    pub player_names: HashMap<PlayerId, String>,
    /// Member → socket, for room fan-out.
    pub sessions: HashMap<PlayerId, SessionId>,
    pub game_type: GameType,
    pub game_mode: String,
    pub status: RoomStatus,
    pub game: Option<Game>,
    pub game_id: Option<GameId>,
    password: Option<String>,
    /// Bumped whenever the room's world changes shape (game start,
    /// eviction); stale delayed effects compare against it and die.
    pub epoch: u64,
    pub created_at: Instant,
    pub last_active: Instant,
}

impl Room {
    /// A fresh `waiting` room with the creator as sole player and host.
    pub fn new(
        code: RoomCode,
        game_type: GameType,
        game_mode: String,
        host: PlayerId,
        host_name: String,
        host_session: SessionId,
        password: Option<String>,
    ) -> Self {
        let now = Instant::now();
        let mut player_names = HashMap::new();
        player_names.insert(host.clone(), host_name);
        let mut sessions = HashMap::new();
        sessions.insert(host.clone(), host_session);
        Self {
            code,
            inner: Mutex::new(RoomInner {
                host: host.clone(),
                players: vec![host],
                spectators: Vec::new(),
                player_names,
                sessions,
                game_type,
                game_mode,
                status: RoomStatus::Waiting,
                game: None,
                game_id: None,
                password: password.filter(|p| !p.is_empty()),
                epoch: 0,
                created_at: now,
                last_active: now,
            }),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, RoomInner> {
        self.inner.lock().await
    }
}

impl RoomInner {
    /// Stamps activity. Called on every mutation and every broadcast.
    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    pub fn is_private(&self) -> bool {
        self.password.is_some()
    }

    /// Byte-equal password check; open rooms accept anything.
    pub fn password_matches(&self, supplied: Option<&str>) -> bool {
        match &self.password {
            None => true,
            Some(expected) => supplied == Some(expected.as_str()),
        }
    }

    pub fn contains(&self, player: &PlayerId) -> bool {
        self.players.contains(player) || self.spectators.contains(player)
    }

    /// Adds a member, routing to players or spectators per the room
    /// status and the game type's mid-game joinability.
    pub fn add_member(
        &mut self,
        player: PlayerId,
        name: String,
        session: SessionId,
    ) -> Result<JoinKind, RoomError> {
        if self.contains(&player) {
            // Idempotent re-join: refresh the socket binding only.
            self.sessions.insert(player, session);
            return Ok(JoinKind::AlreadyPresent);
        }

        let kind = match self.status {
            RoomStatus::Waiting => JoinKind::Player,
            RoomStatus::Playing => {
                if self.game_type.joinable_mid_game()
                    && self.players.len() < MAX_PLAYERS
                {
                    JoinKind::Player
                } else {
                    JoinKind::Spectator
                }
            }
        };
        if kind == JoinKind::Player && self.players.len() >= MAX_PLAYERS {
            return Err(RoomError::Full);
        }

        match kind {
            JoinKind::Player => self.players.push(player.clone()),
            JoinKind::Spectator => self.spectators.push(player.clone()),
            JoinKind::AlreadyPresent => unreachable!(),
        }
        self.player_names.insert(player.clone(), name);
        self.sessions.insert(player, session);
        self.touch();
        Ok(kind)
    }

    /// Removes a member from both lists, runs host succession, and
    /// reports whether the room must be destroyed.
    ///
    /// Spectators are never promoted to players, even if the removal
    /// leaves a mid-game seat open.
    pub fn remove_member(&mut self, player: &PlayerId) -> RemoveOutcome {
        let was_present = self.contains(player);
        if !was_present {
            return RemoveOutcome {
                removed: false,
                destroy: false,
                new_host: None,
            };
        }
        let was_host = self.host == *player;
        self.players.retain(|p| p != player);
        self.spectators.retain(|p| p != player);
        self.player_names.remove(player);
        self.sessions.remove(player);
        self.touch();

        // Host ∈ players, so an empty player list means the room dies —
        // spectators alone cannot keep it alive.
        if self.players.is_empty() {
            return RemoveOutcome {
                removed: true,
                destroy: true,
                new_host: None,
            };
        }
        let new_host = if was_host {
            self.host = self.players[0].clone();
            Some(self.host.clone())
        } else {
            None
        };
        RemoveOutcome {
            removed: true,
            destroy: false,
            new_host,
        }
    }

    /// Session ids of every current member, players and spectators both.
    pub fn member_sessions(&self) -> Vec<SessionId> {
        self.sessions.values().copied().collect()
    }

    pub fn session_of(&self, player: &PlayerId) -> Option<SessionId> {
        self.sessions.get(player).copied()
    }

    /// The wire projection of this room.
    pub fn dto(&self, code: &RoomCode) -> RoomDto {
        RoomDto {
            code: code.clone(),
            host: self.host.clone(),
            players: self.players.clone(),
            player_names: self.player_names.clone(),
            player_indices: self
                .players
                .iter()
                .enumerate()
                .map(|(i, p)| (p.clone(), i + 1))
                .collect(),
            spectators: self.spectators.clone(),
            game_type: self.game_type,
            game_mode: self.game_mode.clone(),
            game_id: self.game_id.clone(),
            status: self.status,
        }
    }

    /// Serializes once and fans out to every member. Failures are
    /// logged by the broadcaster and skipped; the room broadcast also
    /// stamps activity.
    pub fn broadcast(&mut self, broadcaster: &Broadcaster, msg: &ServerMessage) {
        let Some(frame) = broadcaster.encode(msg) else {
            return;
        };
        for session in self.sessions.values() {
            broadcaster.send_raw(*session, &frame);
        }
        self.touch();
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> PlayerId {
        PlayerId::from(s)
    }

    fn sid(b: &Broadcaster) -> SessionId {
        let (id, _rx) = b.register();
        id
    }

    fn room(b: &Broadcaster) -> Room {
        Room::new(
            RoomCode::parse("TEST01").unwrap(),
            GameType::Tictactoe,
            "classic".to_owned(),
            pid("host"),
            "Holly".to_owned(),
            sid(b),
            None,
        )
    }

    #[test]
    fn test_validate_name_trims_and_accepts() {
        assert_eq!(validate_name("  Alice  ").unwrap(), "Alice");
    }

    #[test]
    fn test_validate_name_rejects_empty_and_long_and_control() {
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(21)).is_err());
        assert!(validate_name("a\u{7}b").is_err());
    }

    #[tokio::test]
    async fn test_new_room_has_creator_as_host_and_sole_player() {
        let b = Broadcaster::new();
        let room = room(&b);
        let inner = room.lock().await;
        assert_eq!(inner.host, pid("host"));
        assert_eq!(inner.players, vec![pid("host")]);
        assert_eq!(inner.status, RoomStatus::Waiting);
        assert!(inner.game.is_none());
        assert!(inner.game_id.is_none());
    }

    #[tokio::test]
    async fn test_add_member_waiting_joins_as_player() {
        let b = Broadcaster::new();
        let room = room(&b);
        let mut inner = room.lock().await;
        let kind = inner
            .add_member(pid("p2"), "Pat".to_owned(), sid(&b))
            .unwrap();
        assert_eq!(kind, JoinKind::Player);
        assert_eq!(inner.players.len(), 2);
    }

    #[tokio::test]
    async fn test_add_member_is_idempotent() {
        let b = Broadcaster::new();
        let room = room(&b);
        let mut inner = room.lock().await;
        let kind = inner
            .add_member(pid("host"), "Holly".to_owned(), sid(&b))
            .unwrap();
        assert_eq!(kind, JoinKind::AlreadyPresent);
        assert_eq!(inner.players.len(), 1);
    }

    #[tokio::test]
    async fn test_ninth_player_is_rejected() {
        let b = Broadcaster::new();
        let room = Room::new(
            RoomCode::parse("TEST02").unwrap(),
            GameType::Uno,
            "classic".to_owned(),
            pid("host"),
            "Holly".to_owned(),
            sid(&b),
            None,
        );
        let mut inner = room.lock().await;
        for i in 2..=8 {
            inner
                .add_member(
                    PlayerId(format!("p{i}")),
                    format!("P{i}"),
                    sid(&b),
                )
                .unwrap();
        }
        assert_eq!(inner.players.len(), 8);
        let err = inner
            .add_member(pid("p9"), "P9".to_owned(), sid(&b))
            .unwrap_err();
        assert_eq!(err, RoomError::Full);
    }

    #[tokio::test]
    async fn test_playing_non_joinable_game_routes_to_spectators() {
        let b = Broadcaster::new();
        let room = room(&b);
        let mut inner = room.lock().await;
        inner.status = RoomStatus::Playing;
        let kind = inner
            .add_member(pid("late"), "Lane".to_owned(), sid(&b))
            .unwrap();
        assert_eq!(kind, JoinKind::Spectator);
        assert_eq!(inner.spectators, vec![pid("late")]);
    }

    #[tokio::test]
    async fn test_playing_joinable_game_routes_to_players() {
        let b = Broadcaster::new();
        let room = Room::new(
            RoomCode::parse("TEST03").unwrap(),
            GameType::Mafia,
            "classic".to_owned(),
            pid("host"),
            "Holly".to_owned(),
            sid(&b),
            None,
        );
        let mut inner = room.lock().await;
        inner.status = RoomStatus::Playing;
        let kind = inner
            .add_member(pid("late"), "Lane".to_owned(), sid(&b))
            .unwrap();
        assert_eq!(kind, JoinKind::Player);
        assert!(inner.spectators.is_empty());
    }

    #[tokio::test]
    async fn test_remove_host_promotes_first_remaining_player() {
        let b = Broadcaster::new();
        let room = room(&b);
        let mut inner = room.lock().await;
        inner
            .add_member(pid("p2"), "Pat".to_owned(), sid(&b))
            .unwrap();
        inner
            .add_member(pid("p3"), "Perry".to_owned(), sid(&b))
            .unwrap();

        let outcome = inner.remove_member(&pid("host"));
        assert!(outcome.removed);
        assert!(!outcome.destroy);
        assert_eq!(outcome.new_host, Some(pid("p2")));
        assert_eq!(inner.host, pid("p2"));
    }

    #[tokio::test]
    async fn test_remove_last_player_destroys_despite_spectators() {
        let b = Broadcaster::new();
        let room = room(&b);
        let mut inner = room.lock().await;
        inner.status = RoomStatus::Playing;
        inner
            .add_member(pid("watcher"), "Wes".to_owned(), sid(&b))
            .unwrap();
        assert_eq!(inner.spectators.len(), 1);

        let outcome = inner.remove_member(&pid("host"));
        assert!(outcome.destroy, "no players left — spectators don't count");
    }

    #[tokio::test]
    async fn test_remove_unknown_member_is_a_no_op() {
        let b = Broadcaster::new();
        let room = room(&b);
        let mut inner = room.lock().await;
        let outcome = inner.remove_member(&pid("ghost"));
        assert!(!outcome.removed);
        assert!(!outcome.destroy);
    }

    #[tokio::test]
    async fn test_password_matching_is_byte_equal() {
        let b = Broadcaster::new();
        let room = Room::new(
            RoomCode::parse("TEST04").unwrap(),
            GameType::Rps,
            "classic".to_owned(),
            pid("host"),
            "Holly".to_owned(),
            sid(&b),
            Some("hunter2".to_owned()),
        );
        let inner = room.lock().await;
        assert!(inner.is_private());
        assert!(inner.password_matches(Some("hunter2")));
        assert!(!inner.password_matches(Some("HUNTER2")));
        assert!(!inner.password_matches(None));
    }

    #[tokio::test]
    async fn test_empty_password_means_public() {
        let b = Broadcaster::new();
        let room = Room::new(
            RoomCode::parse("TEST05").unwrap(),
            GameType::Rps,
            "classic".to_owned(),
            pid("host"),
            "Holly".to_owned(),
            sid(&b),
            Some(String::new()),
        );
        let inner = room.lock().await;
        assert!(!inner.is_private());
        assert!(inner.password_matches(None));
    }

    #[tokio::test]
    async fn test_dto_carries_indices_by_join_order() {
        let b = Broadcaster::new();
        let room = room(&b);
        let mut inner = room.lock().await;
        inner
            .add_member(pid("p2"), "Pat".to_owned(), sid(&b))
            .unwrap();
        let dto = inner.dto(&room.code);
        assert_eq!(dto.player_indices[&pid("host")], 1);
        assert_eq!(dto.player_indices[&pid("p2")], 2);
        assert!(dto.game_id.is_none());
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_members_and_touches() {
        let b = Broadcaster::new();
        let (host_sid, mut host_rx) = b.register();
        let room = Room::new(
            RoomCode::parse("TEST06").unwrap(),
            GameType::Rps,
            "classic".to_owned(),
            pid("host"),
            "Holly".to_owned(),
            host_sid,
            None,
        );
        let (p2_sid, mut p2_rx) = b.register();
        let mut inner = room.lock().await;
        inner
            .add_member(pid("p2"), "Pat".to_owned(), p2_sid)
            .unwrap();

        let before = inner.last_active;
        inner.broadcast(&b, &ServerMessage::Error("ping".to_owned()));
        assert!(host_rx.try_recv().is_ok());
        assert!(p2_rx.try_recv().is_ok());
        assert!(inner.last_active >= before);
    }
}
