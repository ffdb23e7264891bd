//! Core identity and room types for Parlor's wire format.
//!
//! Everything here travels on the wire: these structures are serialized to
//! JSON, pushed down a WebSocket, and parsed by the browser client. The
//! frame shape is always `{"type": <string>, "payload": <object|string>}`;
//! the enums in [`crate::command`] and [`crate::message`] produce exactly
//! that shape via serde's adjacent tagging.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// An opaque, client-chosen player token.
///
/// Newtype over `String` so a player id can't be confused with a room code
/// or a display name in a signature. `#[serde(transparent)]` keeps the JSON
/// representation a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A six-character uppercase alphanumeric room code.
///
/// The only way to obtain one is [`RoomCode::parse`], which normalizes case
/// and validates the shape — so any `RoomCode` in the process is known
/// well-formed, and lookup is case-insensitive for free.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

/// Required length of a room code.
pub const ROOM_CODE_LEN: usize = 6;

impl RoomCode {
    /// Parses and normalizes a raw code. Lowercase input is accepted and
    /// uppercased; anything that is not exactly six ASCII alphanumerics is
    /// rejected.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let code = raw.trim().to_ascii_uppercase();
        if code.len() != ROOM_CODE_LEN
            || !code.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            return Err(ProtocolError::InvalidMessage(format!(
                "invalid room code: {raw:?}"
            )));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The id of a running game instance: `"game_"` plus eight random
/// lowercase alphanumerics. Assigned when a room starts playing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub String);

impl GameId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// GameType
// ---------------------------------------------------------------------------

/// The closed set of games the server hosts.
///
/// The per-game participation rules live here rather than on the engines,
/// because the room layer needs them before an engine instance exists
/// (join routing, start validation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    Tictactoe,
    Jeopardy,
    Hangman,
    Memory,
    Battleship,
    Trivia,
    Rps,
    #[serde(rename = "connect4")]
    ConnectFour,
    Checkers,
    #[serde(rename = "dots_and_boxes")]
    DotsAndBoxes,
    Uno,
    Mafia,
}

impl GameType {
    /// Minimum players required before the host may start.
    pub fn min_players(self) -> usize {
        match self {
            Self::Jeopardy | Self::Memory | Self::Trivia => 1,
            Self::Mafia => 3,
            _ => 2,
        }
    }

    /// Hard cap on players in a room of this game.
    pub fn max_players(self) -> usize {
        match self {
            Self::Tictactoe
            | Self::Hangman
            | Self::Battleship
            | Self::Rps
            | Self::ConnectFour
            | Self::Checkers
            | Self::DotsAndBoxes => 2,
            _ => 8,
        }
    }

    /// Whether a player may join as a *player* (not spectator) after the
    /// game has started. This is the multi-player-joinable set.
    pub fn joinable_mid_game(self) -> bool {
        matches!(self, Self::Uno | Self::Mafia | Self::Trivia | Self::Memory)
    }

    /// Wire name, as sent by clients.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tictactoe => "tictactoe",
            Self::Jeopardy => "jeopardy",
            Self::Hangman => "hangman",
            Self::Memory => "memory",
            Self::Battleship => "battleship",
            Self::Trivia => "trivia",
            Self::Rps => "rps",
            Self::ConnectFour => "connect4",
            Self::Checkers => "checkers",
            Self::DotsAndBoxes => "dots_and_boxes",
            Self::Uno => "uno",
            Self::Mafia => "mafia",
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Room projection (DTO)
// ---------------------------------------------------------------------------

/// Room lifecycle status as seen on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Waiting,
    Playing,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Waiting => "waiting",
            Self::Playing => "playing",
        })
    }
}

/// The projection of a room broadcast to clients.
///
/// This is what every `room_state` message carries. `game_id` is omitted
/// entirely (not `null`) while the room is still waiting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomDto {
    pub code: RoomCode,
    pub host: PlayerId,
    pub players: Vec<PlayerId>,
    pub player_names: HashMap<PlayerId, String>,
    /// 1-based ordinal by join order among players.
    pub player_indices: HashMap<PlayerId, usize>,
    pub spectators: Vec<PlayerId>,
    pub game_type: GameType,
    pub game_mode: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub game_id: Option<GameId>,
    pub status: RoomStatus,
}

// =========================================================================
// Tests
// =========================================================================
