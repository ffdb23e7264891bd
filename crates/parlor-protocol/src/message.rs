//! Typed outbound messages.
//!
//! The closed set of frames the server may emit. Mirrors the inbound shape:
//! `{"type": <string>, "payload": <object|string>}`. The `error` payload is
//! deliberately a bare string — clients display it verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{GameId, GameType, PlayerId, RoomCode, RoomDto};

/// A server-to-client frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    RoomState(RoomState),
    GameState(GameState),
    PlayerJoined(PlayerJoined),
    PlayerLeft(PlayerLeft),
    ChatMessage(ChatBroadcast),
    /// Short human-readable description of what went wrong.
    Error(String),
    Timeout(Timeout),
    GameOver(GameOver),
    QuickMatch(QuickMatchAck),
    QuickMatchFound(QuickMatchFound),
    Leaderboard(Leaderboard),
}

/// The current room projection, or `room: null` when the recipient's room
/// was destroyed (idle eviction, last member left).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomState {
    pub room: Option<RoomDto>,
}

/// An engine snapshot. `game` is the engine's own JSON projection; its
/// shape varies per game type but always carries `players`, `game_mode`,
/// `winner` and `game_over`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub game_id: GameId,
    pub game: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerJoined {
    pub code: RoomCode,
    pub player_id: PlayerId,
    pub player_name: String,
    /// `true` when the joiner entered as a spectator.
    pub spectator: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerLeft {
    pub code: RoomCode,
    pub player_id: PlayerId,
}

/// A chat line fanned out verbatim, stamped with the server's clock
/// (milliseconds since the Unix epoch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatBroadcast {
    pub room_code: RoomCode,
    pub player_id: PlayerId,
    pub player_name: String,
    pub text: String,
    pub timestamp: u64,
}

/// A server-enforced deadline fired (speed modes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeout {
    pub game_id: GameId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameOver {
    pub game_id: GameId,
    /// A player id, `"draw"`, `"lose"`, or a faction name for team games.
    pub winner: String,
}

/// Acknowledgement that the sender is waiting in the quick-match queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickMatchAck {
    pub game_type: GameType,
    /// 1-based position in the queue at enqueue time.
    pub position: usize,
}

/// Both queued players receive this when a pair forms; the room is already
/// created and both are members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickMatchFound {
    pub room: RoomDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player_id: PlayerId,
    pub player_name: String,
    pub score: u32,
}

// =========================================================================
// Tests
// =========================================================================
