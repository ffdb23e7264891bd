//! Tic-tac-toe: two players, nine cells, four modes.
//!
//! - `classic` — three in a row wins, full board draws.
//! - `fading` — each player keeps at most their last four marks; placing a
//!   fifth clears that player's oldest mark.
//! - `speed` — five seconds per turn; letting the clock run out hands the
//!   opponent the win.
//! - `infinite` — the draw check is disabled; play continues until a line
//!   is formed.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use parlor_protocol::PlayerId;

use crate::{
    decode_move, player_index, to_snapshot, Applied, DelayedEffect,
    EngineError, GameEngine, TimerAction, TimerOutcome,
};

/// Per-turn clock in speed mode.
const TURN_CLOCK: Duration = Duration::from_secs(5);

/// Marks a player may retain in fading mode.
const FADING_RETAINED: usize = 4;

/// The eight winning lines, by cell index.
const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8], // rows
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8], // columns
    [0, 4, 8],
    [2, 4, 6], // diagonals
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Classic,
    Fading,
    Speed,
    Infinite,
}

impl Mode {
    fn parse(mode: &str) -> Self {
        match mode {
            "fading" => Self::Fading,
            "speed" => Self::Speed,
            "infinite" => Self::Infinite,
            _ => Self::Classic,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TicTacToe {
    players: Vec<PlayerId>,
    game_mode: String,
    /// Cells 0–8; `""`, `"X"` (first player) or `"O"`.
    board: Vec<String>,
    /// Index into `players` of whoever moves next.
    turn: usize,
    winner: String,
    game_over: bool,
    /// Oldest-first placement history per player, used by fading mode.
    placed: Vec<Vec<usize>>,
    #[serde(skip)]
    mode: Mode,
    /// Accepted-move counter; stale speed-mode deadlines compare against it.
    #[serde(skip)]
    move_seq: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TttMove {
    index: usize,
}

impl TicTacToe {
    pub fn new(players: &[PlayerId], mode: &str) -> Self {
        Self {
            players: players.to_vec(),
            game_mode: mode.to_owned(),
            board: vec![String::new(); 9],
            turn: 0,
            winner: String::new(),
            game_over: false,
            placed: vec![Vec::new(), Vec::new()],
            mode: Mode::parse(mode),
            move_seq: 0,
        }
    }

    fn symbol(idx: usize) -> &'static str {
        if idx == 0 {
            "X"
        } else {
            "O"
        }
    }

    fn line_formed(&self, symbol: &str) -> bool {
        WIN_LINES.iter().any(|line| {
            line.iter().all(|&cell| self.board[cell] == symbol)
        })
    }

    fn board_full(&self) -> bool {
        self.board.iter().all(|cell| !cell.is_empty())
    }
}

impl GameEngine for TicTacToe {
    fn apply_move(
        &mut self,
        player: &PlayerId,
        data: &Map<String, Value>,
    ) -> Result<Applied, EngineError> {
        if self.game_over {
            return Err(EngineError::AlreadyOver);
        }
        let mv: TttMove = decode_move(data)?;
        let idx = player_index(&self.players, player)?;
        if idx != self.turn {
            return Err(EngineError::NotYourTurn);
        }
        if mv.index > 8 {
            return Err(EngineError::Illegal(
                "Cell index must be 0-8".to_owned(),
            ));
        }
        if !self.board[mv.index].is_empty() {
            return Err(EngineError::Illegal("Cell already taken".to_owned()));
        }

        let symbol = Self::symbol(idx);
        self.board[mv.index] = symbol.to_owned();
        self.placed[idx].push(mv.index);
        if self.mode == Mode::Fading && self.placed[idx].len() > FADING_RETAINED
        {
            let oldest = self.placed[idx].remove(0);
            self.board[oldest].clear();
        }
        self.move_seq += 1;

        if self.line_formed(symbol) {
            self.winner = player.0.clone();
            self.game_over = true;
        } else if self.mode != Mode::Infinite
            && self.mode != Mode::Fading
            && self.board_full()
        {
            self.winner = "draw".to_owned();
            self.game_over = true;
        } else {
            self.turn = 1 - self.turn;
        }

        let effect = (self.mode == Mode::Speed && !self.game_over).then(|| {
            DelayedEffect {
                after: TURN_CLOCK,
                action: TimerAction::TurnDeadline { seq: self.move_seq },
            }
        });
        Ok(Applied {
            effect,
            scored: None,
        })
    }

    fn snapshot(&self) -> Value {
        to_snapshot(self)
    }

    fn is_over(&self) -> bool {
        self.game_over
    }

    fn winner(&self) -> String {
        self.winner.clone()
    }

    fn initial_effect(&self) -> Option<DelayedEffect> {
        (self.mode == Mode::Speed).then_some(DelayedEffect {
            after: TURN_CLOCK,
            action: TimerAction::TurnDeadline { seq: 0 },
        })
    }

    fn apply_timer(&mut self, action: &TimerAction) -> TimerOutcome {
        let TimerAction::TurnDeadline { seq } = action else {
            return TimerOutcome::Ignored;
        };
        if self.game_over || *seq != self.move_seq {
            return TimerOutcome::Ignored;
        }
        // The slow player forfeits: the opponent takes the game.
        self.winner = self.players[1 - self.turn].0.clone();
        self.game_over = true;
        TimerOutcome::Fired {
            timeout: Some("Turn timer expired".to_owned()),
            next: None,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
