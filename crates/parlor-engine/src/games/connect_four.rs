//! Connect Four: 7 columns, 6 rows, gravity.
//!
//! The win scan only looks along the four lines through the placed disc —
//! the rest of the board cannot have changed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use parlor_protocol::PlayerId;

use crate::{
    decode_move, player_index, to_snapshot, Applied, EngineError, GameEngine,
};

const COLS: usize = 7;
const ROWS: usize = 6;
const TO_WIN: usize = 4;

#[derive(Debug, Clone, Serialize)]
pub struct ConnectFour {
    players: Vec<PlayerId>,
    game_mode: String,
    /// `board[row][col]`; row 0 is the top. `""`, `"R"` or `"Y"`.
    board: Vec<Vec<String>>,
    turn: usize,
    winner: String,
    game_over: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Drop {
    column: usize,
}

impl ConnectFour {
    pub fn new(players: &[PlayerId], mode: &str) -> Self {
        Self {
            players: players.to_vec(),
            game_mode: mode.to_owned(),
            board: vec![vec![String::new(); COLS]; ROWS],
            turn: 0,
            winner: String::new(),
            game_over: false,
        }
    }

    fn symbol(idx: usize) -> &'static str {
        if idx == 0 {
            "R"
        } else {
            "Y"
        }
    }

    /// Longest run through `(row, col)` along `(dr, dc)`, both ways.
    fn run_length(
        &self,
        row: usize,
        col: usize,
        dr: isize,
        dc: isize,
        symbol: &str,
    ) -> usize {
        let mut count = 1;
        for sign in [1isize, -1] {
            let (mut r, mut c) = (row as isize, col as isize);
            loop {
                r += dr * sign;
                c += dc * sign;
                if r < 0
                    || c < 0
                    || r >= ROWS as isize
                    || c >= COLS as isize
                    || self.board[r as usize][c as usize] != symbol
                {
                    break;
                }
                count += 1;
            }
        }
        count
    }

    fn wins_at(&self, row: usize, col: usize, symbol: &str) -> bool {
        [(0isize, 1isize), (1, 0), (1, 1), (1, -1)]
            .iter()
            .any(|&(dr, dc)| {
                self.run_length(row, col, dr, dc, symbol) >= TO_WIN
            })
    }

    fn board_full(&self) -> bool {
        self.board[0].iter().all(|cell| !cell.is_empty())
    }
}

impl GameEngine for ConnectFour {
    fn apply_move(
        &mut self,
        player: &PlayerId,
        data: &Map<String, Value>,
    ) -> Result<Applied, EngineError> {
        if self.game_over {
            return Err(EngineError::AlreadyOver);
        }
        let mv: Drop = decode_move(data)?;
        let idx = player_index(&self.players, player)?;
        if idx != self.turn {
            return Err(EngineError::NotYourTurn);
        }
        if mv.column >= COLS {
            return Err(EngineError::Illegal(
                "Column must be 0-6".to_owned(),
            ));
        }
        // Gravity: find the lowest empty row in the column.
        let Some(row) = (0..ROWS)
            .rev()
            .find(|&r| self.board[r][mv.column].is_empty())
        else {
            return Err(EngineError::Illegal("Column is full".to_owned()));
        };

        let symbol = Self::symbol(idx);
        self.board[row][mv.column] = symbol.to_owned();

        if self.wins_at(row, mv.column, symbol) {
            self.winner = player.0.clone();
            self.game_over = true;
        } else if self.board_full() {
            self.winner = "draw".to_owned();
            self.game_over = true;
        } else {
            self.turn = 1 - self.turn;
        }
        Ok(Applied::plain())
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
}

// =========================================================================
// Tests
// =========================================================================
