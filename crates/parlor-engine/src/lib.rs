//! Game engines for the Parlor server.
//!
//! Every game type implements the same five-operation contract
//! ([`GameEngine`]): construct from a player list and mode, validate and
//! apply a move, project a snapshot, report terminal state. Engines are
//! pure with respect to the network — they never touch sockets, locks, or
//! clocks. Time-based behavior (the Memory card hide, speed-mode
//! deadlines) is expressed as a [`DelayedEffect`] the room layer schedules
//! and later feeds back through [`GameEngine::apply_timer`].
//!
//! Dispatch is a tagged enum ([`Game`]) with one variant per game type, so
//! engine state lives inline and stays `Send + 'static` without boxing.
//!
//! # The rejection rule
//!
//! `apply_move` validates *everything* before mutating *anything*. A
//! rejected move must leave the engine byte-identical to its pre-move
//! state — the room layer suppresses the broadcast on rejection, so no
//! other client may ever observe a half-applied move.

mod content;
mod error;
mod games;

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use parlor_protocol::{GameType, PlayerId};

pub use content::{
    jeopardy_questions, trivia_questions, JeopardyQuestion, TriviaQuestion,
    HANGMAN_WORDS,
};
pub use error::EngineError;
pub use games::battleship::Battleship;
pub use games::checkers::Checkers;
pub use games::connect_four::ConnectFour;
pub use games::dots_and_boxes::DotsAndBoxes;
pub use games::hangman::Hangman;
pub use games::jeopardy::Jeopardy;
pub use games::mafia::Mafia;
pub use games::memory::MemoryGame;
pub use games::rps::Rps;
pub use games::tictactoe::TicTacToe;
pub use games::trivia::TriviaGame;
pub use games::uno::Uno;

// ---------------------------------------------------------------------------
// Move outcome
// ---------------------------------------------------------------------------

/// What an accepted move produced, beyond the state change itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Applied {
    /// A one-shot effect the room layer should schedule (speed-mode
    /// deadline, Memory card hide). `None` for most moves.
    pub effect: Option<DelayedEffect>,

    /// Points credited to a player on the process-wide Jeopardy
    /// leaderboard. Only the Jeopardy engine sets this.
    pub scored: Option<(PlayerId, u32)>,
}

impl Applied {
    /// An accepted move with no side effects.
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn with_effect(effect: DelayedEffect) -> Self {
        Self {
            effect: Some(effect),
            ..Self::default()
        }
    }
}

/// A one-shot timer the room layer schedules on the engine's behalf.
///
/// The room layer keys the callback by `(room_code, game_id, epoch)` and
/// drops it unfired when the room has moved on; the engine additionally
/// guards with the data inside [`TimerAction`] (move sequence, question
/// index), so a stale callback that does fire is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayedEffect {
    pub after: Duration,
    pub action: TimerAction,
}

/// The engine-side meaning of a delayed effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerAction {
    /// Memory: hide the mismatched pair and pass the turn.
    HideCards,
    /// Speed tic-tac-toe: the turn that was current at `seq` ran out of
    /// clock.
    TurnDeadline { seq: u64 },
    /// Speed Jeopardy: question `index` ran out of clock.
    QuestionDeadline { index: usize },
}

/// What firing a timer did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerOutcome {
    /// The world moved on (move already made, question already answered,
    /// game over) — nothing happened, nothing to broadcast.
    Ignored,
    /// The engine mutated state. `timeout` carries the reason to put in a
    /// `timeout` broadcast (`None` for silent effects like the Memory
    /// hide); `next` is a follow-up effect to schedule.
    Fired {
        timeout: Option<String>,
        next: Option<DelayedEffect>,
    },
}

// ---------------------------------------------------------------------------
// The engine contract
// ---------------------------------------------------------------------------

/// The uniform contract every game engine implements.
///
/// Engines are constructed by [`Game::start`] (each module exposes a `new`
/// taking the player list and mode string); everything after that goes
/// through this trait.
pub trait GameEngine: Send + 'static {
    /// Validates and applies one move from `player`.
    ///
    /// `data` is the engine-specific remainder of the `make_move` payload;
    /// engines decode it into their own move struct (rejecting unknown
    /// fields) via [`decode_move`].
    ///
    /// # Errors
    /// Returns [`EngineError`] without mutating state.
    fn apply_move(
        &mut self,
        player: &PlayerId,
        data: &Map<String, Value>,
    ) -> Result<Applied, EngineError>;

    /// A JSON-safe projection of the full game state, suitable for
    /// broadcast. Pure: repeated calls on unchanged state return equal
    /// values.
    fn snapshot(&self) -> Value;

    fn is_over(&self) -> bool;

    /// Empty string while the game is live; otherwise a player id,
    /// `"draw"`, `"lose"`, or a faction name.
    fn winner(&self) -> String;

    /// The effect to schedule the moment the game starts (speed-mode
    /// opening deadline). Default: none.
    fn initial_effect(&self) -> Option<DelayedEffect> {
        None
    }

    /// Re-entry point for a fired [`DelayedEffect`]. Default: ignore.
    fn apply_timer(&mut self, _action: &TimerAction) -> TimerOutcome {
        TimerOutcome::Ignored
    }
}

// ---------------------------------------------------------------------------
// Tagged dispatch
// ---------------------------------------------------------------------------

/// A running game instance — one variant per game type.
pub enum Game {
    Tictactoe(TicTacToe),
    Jeopardy(Jeopardy),
    Hangman(Hangman),
    Memory(MemoryGame),
    Battleship(Battleship),
    Trivia(TriviaGame),
    Rps(Rps),
    ConnectFour(ConnectFour),
    Checkers(Checkers),
    DotsAndBoxes(DotsAndBoxes),
    Uno(Uno),
    Mafia(Mafia),
}

impl Game {
    /// Instantiates the engine for `game_type`.
    ///
    /// Deterministic from its inputs except for each engine's documented
    /// randomness (deck shuffle, word pick, ship placement, role
    /// assignment). Unrecognized mode strings fall back to the engine's
    /// classic behavior; the raw string is kept for display.
    pub fn start(game_type: GameType, players: &[PlayerId], mode: &str) -> Game {
        match game_type {
            GameType::Tictactoe => Game::Tictactoe(TicTacToe::new(players, mode)),
            GameType::Jeopardy => Game::Jeopardy(Jeopardy::new(players, mode)),
            GameType::Hangman => Game::Hangman(Hangman::new(players, mode)),
            GameType::Memory => Game::Memory(MemoryGame::new(players, mode)),
            GameType::Battleship => {
                Game::Battleship(Battleship::new(players, mode))
            }
            GameType::Trivia => Game::Trivia(TriviaGame::new(players, mode)),
            GameType::Rps => Game::Rps(Rps::new(players, mode)),
            GameType::ConnectFour => {
                Game::ConnectFour(ConnectFour::new(players, mode))
            }
            GameType::Checkers => Game::Checkers(Checkers::new(players, mode)),
            GameType::DotsAndBoxes => {
                Game::DotsAndBoxes(DotsAndBoxes::new(players, mode))
            }
            GameType::Uno => Game::Uno(Uno::new(players, mode)),
            GameType::Mafia => Game::Mafia(Mafia::new(players, mode)),
        }
    }

    fn engine(&self) -> &dyn GameEngine {
        match self {
            Game::Tictactoe(g) => g,
            Game::Jeopardy(g) => g,
            Game::Hangman(g) => g,
            Game::Memory(g) => g,
            Game::Battleship(g) => g,
            Game::Trivia(g) => g,
            Game::Rps(g) => g,
            Game::ConnectFour(g) => g,
            Game::Checkers(g) => g,
            Game::DotsAndBoxes(g) => g,
            Game::Uno(g) => g,
            Game::Mafia(g) => g,
        }
    }

    fn engine_mut(&mut self) -> &mut dyn GameEngine {
        match self {
            Game::Tictactoe(g) => g,
            Game::Jeopardy(g) => g,
            Game::Hangman(g) => g,
            Game::Memory(g) => g,
            Game::Battleship(g) => g,
            Game::Trivia(g) => g,
            Game::Rps(g) => g,
            Game::ConnectFour(g) => g,
            Game::Checkers(g) => g,
            Game::DotsAndBoxes(g) => g,
            Game::Uno(g) => g,
            Game::Mafia(g) => g,
        }
    }

    pub fn apply_move(
        &mut self,
        player: &PlayerId,
        data: &Map<String, Value>,
    ) -> Result<Applied, EngineError> {
        self.engine_mut().apply_move(player, data)
    }

    pub fn snapshot(&self) -> Value {
        self.engine().snapshot()
    }

    pub fn is_over(&self) -> bool {
        self.engine().is_over()
    }

    pub fn winner(&self) -> String {
        self.engine().winner()
    }

    pub fn initial_effect(&self) -> Option<DelayedEffect> {
        self.engine().initial_effect()
    }

    pub fn apply_timer(&mut self, action: &TimerAction) -> TimerOutcome {
        self.engine_mut().apply_timer(action)
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Decodes the engine-specific part of a `make_move` payload into the
/// engine's own move struct. Unknown or ill-typed fields reject the move.
pub(crate) fn decode_move<T: DeserializeOwned>(
    data: &Map<String, Value>,
) -> Result<T, EngineError> {
    serde_json::from_value(Value::Object(data.clone()))
        .map_err(|e| EngineError::Validation(format!("invalid move: {e}")))
}

/// Serializes a state struct into its snapshot value.
pub(crate) fn to_snapshot<T: Serialize>(state: &T) -> Value {
    serde_json::to_value(state).unwrap_or(Value::Null)
}

/// Index of `player` in the game's player list, or a validation error for
/// outsiders (including players who joined the room after the game began).
pub(crate) fn player_index(
    players: &[PlayerId],
    player: &PlayerId,
) -> Result<usize, EngineError> {
    players.iter().position(|p| p == player).ok_or_else(|| {
        EngineError::Validation("You are not in this game".to_owned())
    })
}
