//! Room coordination for the Parlor server.
//!
//! This crate owns everything between the wire protocol and the game
//! engines:
//!
//! - [`Registry`] / [`Directory`] — the process-wide room directory,
//!   player index, quick-match queue, and leaderboard, behind one lock.
//! - [`Room`] — per-room membership, host succession, status, and the
//!   running [`parlor_engine::Game`], behind a per-room lock.
//! - [`Broadcaster`] — the client map and the three send operations;
//!   the only place outbound frames are serialized.
//! - [`janitor`] — periodic idle-room eviction.
//! - [`timer`] — epoch-keyed one-shot delayed effects for engines.
//!
//! # Locking
//!
//! Two locks matter: the registry lock and each room's lock, always taken
//! registry first. Neither is ever held across a socket write or a sleep —
//! sends are queue pushes into per-session unbounded channels.

mod broadcast;
mod error;
pub mod janitor;
mod registry;
mod room;
pub mod timer;

pub use broadcast::{Broadcaster, Identity, SessionId};
pub use error::RoomError;
pub use registry::{
    random_game_id, Directory, QueueEntry, QuickMatchResult, Registry,
};
pub use room::{
    validate_name, JoinKind, RemoveOutcome, Room, RoomInner, MAX_NAME_LEN,
    MAX_PLAYERS,
};
