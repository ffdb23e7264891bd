//! Typed inbound commands.
//!
//! Every frame a client may send has one variant here with a dedicated
//! payload struct. Unknown command types fail to decode; unknown fields
//! inside a payload are rejected by `deny_unknown_fields` (the dispatcher
//! reports either as a validation failure rather than guessing).
//!
//! The one exception is `make_move`: its payload carries engine-specific
//! fields (`index` for tic-tac-toe, `card_idx` for memory, …), so the
//! extras are captured as a raw JSON map and the target engine decodes
//! them into its own move struct.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{GameId, GameType, PlayerId};

/// A decoded client frame.
///
/// Adjacent tagging produces exactly the wire shape
/// `{"type": "create_room", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientCommand {
    CreateRoom(CreateRoom),
    JoinRoom(JoinRoom),
    LeaveRoom(LeaveRoom),
    StartGame(StartGame),
    MakeMove(MakeMove),
    Answer(Answer),
    ChatMessage(ChatMessage),
    QuickMatch(QuickMatch),
    Leaderboard(LeaderboardQuery),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRoom {
    pub game_type: GameType,
    pub player_id: PlayerId,
    pub player_name: String,
    #[serde(default)]
    pub game_mode: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinRoom {
    /// Raw code as typed by the user; normalized by the room layer.
    pub code: String,
    pub player_id: PlayerId,
    pub player_name: String,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeaveRoom {
    pub code: String,
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StartGame {
    pub code: String,
    pub player_id: PlayerId,
}

/// A move in whatever game the sender's room is running.
///
/// No `deny_unknown_fields` here: the flattened `data` map is the
/// engine-specific part of the payload, validated by the engine itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MakeMove {
    pub game_id: GameId,
    pub player_id: PlayerId,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

/// A Jeopardy answer. Kept as its own command (rather than a `make_move`
/// shape) because the original client speaks it this way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Answer {
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatMessage {
    pub room_code: String,
    pub player_id: PlayerId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuickMatch {
    pub player_id: PlayerId,
    pub game_type: GameType,
    /// Display name used if the match creates a room. Falls back to the
    /// player id when absent.
    #[serde(default)]
    pub player_name: Option<String>,
}

/// `leaderboard` takes no parameters; the empty struct keeps the
/// `{"type": ..., "payload": {}}` frame shape uniform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeaderboardQuery {}

// =========================================================================
// Tests
// =========================================================================
