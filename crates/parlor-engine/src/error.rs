//! Error types for the engine layer.

/// A rejected move. The `Display` strings double as the payload of the
/// `error` frame sent back to the offending client, so they are written
/// for humans.
///
/// Rejections never mutate engine state — validation happens in full
/// before any field is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The move payload is malformed or the sender is not part of this
    /// game.
    #[error("{0}")]
    Validation(String),

    /// The sender is a player but does not hold the active turn slot.
    #[error("Not your turn")]
    NotYourTurn,

    /// The move is well-formed but breaks the rules of the game —
    /// occupied cell, unplayable card, off-board shot.
    #[error("{0}")]
    Illegal(String),

    /// A letter, guess, or vote that was already recorded.
    #[error("{0}")]
    Duplicate(String),

    /// The game has already finished.
    #[error("Game is already over")]
    AlreadyOver,
}
