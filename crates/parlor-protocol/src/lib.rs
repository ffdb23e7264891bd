//! Wire protocol for the Parlor game server.
//!
//! This crate defines the language clients and server speak:
//!
//! - **Types** ([`PlayerId`], [`RoomCode`], [`GameType`], [`RoomDto`], …) —
//!   identity and room projections.
//! - **Commands** ([`ClientCommand`]) — one typed variant per inbound frame.
//! - **Messages** ([`ServerMessage`]) — the closed set of outbound frames.
//! - **Codec** ([`Codec`], [`JsonCodec`]) — the single place frames are
//!   turned into text and back.
//!
//! The protocol layer knows nothing about sockets, rooms, or game rules —
//! it sits below all of them:
//!
//! ```text
//! transport (frames) → protocol (typed commands) → rooms / engines
//! ```

mod codec;
mod command;
mod error;
mod message;
mod types;

pub use codec::{Codec, JsonCodec};
pub use command::{
    Answer, ChatMessage, ClientCommand, CreateRoom, JoinRoom, LeaderboardQuery,
    LeaveRoom, MakeMove, QuickMatch, StartGame,
};
pub use error::ProtocolError;
pub use message::{
    ChatBroadcast, GameOver, GameState, Leaderboard, LeaderboardEntry,
    PlayerJoined, PlayerLeft, QuickMatchAck, QuickMatchFound, RoomState,
    ServerMessage, Timeout,
};
pub use types::{
    GameId, GameType, PlayerId, RoomCode, RoomDto, RoomStatus, ROOM_CODE_LEN,
};
