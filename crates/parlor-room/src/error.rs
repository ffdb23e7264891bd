//! Error types for the room layer.
//!
//! Like the engine errors, the `Display` strings are exactly what clients
//! see in `error` frames.

/// Errors from room and registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// Missing or malformed input: empty player name, bad room code
    /// shape, identity not yet bound.
    #[error("{0}")]
    Validation(String),

    /// No living room under that code.
    #[error("Room not found")]
    NotFound,

    /// No running game under that id.
    #[error("Game not found")]
    GameNotFound,

    /// The room is private and the supplied password does not match.
    #[error("Wrong password")]
    WrongPassword,

    /// Only the host may do this.
    #[error("Only the host can start the game")]
    NotHost,

    /// The room already has eight players.
    #[error("Room is full")]
    Full,

    /// The room is not in the `waiting` state.
    #[error("Game already started")]
    AlreadyStarted,

    /// Too few players for this game type.
    #[error("Need at least {0} players to start")]
    NotEnoughPlayers(usize),

    /// The player is already in another room.
    #[error("Already in a room")]
    AlreadyInRoom,

    /// The player is already waiting in the quick-match queue.
    #[error("Already waiting for a match")]
    AlreadyQueued,
}
