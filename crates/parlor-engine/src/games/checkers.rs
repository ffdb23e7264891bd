//! Checkers on the standard 8×8 board.
//!
//! Player one owns the bottom pieces (`r`/`R` when crowned) and moves up;
//! player two owns the top (`b`/`B`) and moves down. A move is a single
//! diagonal step onto an empty dark square, or a two-square jump over an
//! adjacent opponent piece, which is captured. Captures are legal but
//! never forced, and jumps do not chain — the turn always passes. Reaching
//! the far row crowns. The last player with pieces on the board wins.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use parlor_protocol::PlayerId;

use crate::{
    decode_move, player_index, to_snapshot, Applied, EngineError, GameEngine,
};

const SIZE: usize = 8;

#[derive(Debug, Clone, Serialize)]
pub struct Checkers {
    players: Vec<PlayerId>,
    game_mode: String,
    /// `board[row][col]`: `""`, `"r"`/`"R"` (player one), `"b"`/`"B"`.
    board: Vec<Vec<String>>,
    /// Pieces still on the board, per player.
    counts: Vec<usize>,
    turn: usize,
    winner: String,
    game_over: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CheckersMove {
    from_row: usize,
    from_col: usize,
    to_row: usize,
    to_col: usize,
}

impl Checkers {
    pub fn new(players: &[PlayerId], mode: &str) -> Self {
        let mut board = vec![vec![String::new(); SIZE]; SIZE];
        for (row, rank) in board.iter_mut().enumerate() {
            for (col, cell) in rank.iter_mut().enumerate() {
                if (row + col) % 2 == 1 {
                    if row < 3 {
                        *cell = "b".to_owned();
                    } else if row > 4 {
                        *cell = "r".to_owned();
                    }
                }
            }
        }
        Self {
            players: players.to_vec(),
            game_mode: mode.to_owned(),
            board,
            counts: vec![12, 12],
            turn: 0,
            winner: String::new(),
            game_over: false,
        }
    }

    fn owner(piece: &str) -> Option<usize> {
        match piece {
            "r" | "R" => Some(0),
            "b" | "B" => Some(1),
            _ => None,
        }
    }

    fn is_king(piece: &str) -> bool {
        piece == "R" || piece == "B"
    }
}

impl GameEngine for Checkers {
    fn apply_move(
        &mut self,
        player: &PlayerId,
        data: &Map<String, Value>,
    ) -> Result<Applied, EngineError> {
        if self.game_over {
            return Err(EngineError::AlreadyOver);
        }
        let mv: CheckersMove = decode_move(data)?;
        let idx = player_index(&self.players, player)?;
        if idx != self.turn {
            return Err(EngineError::NotYourTurn);
        }
        if mv.from_row >= SIZE
            || mv.from_col >= SIZE
            || mv.to_row >= SIZE
            || mv.to_col >= SIZE
        {
            return Err(EngineError::Illegal(
                "Move is off the board".to_owned(),
            ));
        }
        let piece = self.board[mv.from_row][mv.from_col].clone();
        if Self::owner(&piece) != Some(idx) {
            return Err(EngineError::Illegal(
                "No piece of yours on that square".to_owned(),
            ));
        }
        if !self.board[mv.to_row][mv.to_col].is_empty() {
            return Err(EngineError::Illegal(
                "Destination is occupied".to_owned(),
            ));
        }
        let dr = mv.to_row as isize - mv.from_row as isize;
        let dc = mv.to_col as isize - mv.from_col as isize;
        if dr.abs() != dc.abs() {
            return Err(EngineError::Illegal(
                "Pieces move diagonally".to_owned(),
            ));
        }
        if !Self::is_king(&piece) {
            let forward = if idx == 0 { dr < 0 } else { dr > 0 };
            if !forward {
                return Err(EngineError::Illegal(
                    "Men move forward only".to_owned(),
                ));
            }
        }

        let captured = match dr.abs() {
            1 => None,
            2 => {
                let mid_row = (mv.from_row + mv.to_row) / 2;
                let mid_col = (mv.from_col + mv.to_col) / 2;
                let mid = &self.board[mid_row][mid_col];
                if Self::owner(mid) != Some(1 - idx) {
                    return Err(EngineError::Illegal(
                        "A jump must capture an opponent piece".to_owned(),
                    ));
                }
                Some((mid_row, mid_col))
            }
            _ => {
                return Err(EngineError::Illegal(
                    "Move one square, or two to capture".to_owned(),
                ));
            }
        };

        // Validation complete; mutate.
        self.board[mv.from_row][mv.from_col].clear();
        let crowned = (idx == 0 && mv.to_row == 0)
            || (idx == 1 && mv.to_row == SIZE - 1);
        self.board[mv.to_row][mv.to_col] = if crowned || Self::is_king(&piece)
        {
            if idx == 0 { "R" } else { "B" }.to_owned()
        } else {
            piece
        };
        if let Some((r, c)) = captured {
            self.board[r][c].clear();
            self.counts[1 - idx] -= 1;
            if self.counts[1 - idx] == 0 {
                self.winner = player.0.clone();
                self.game_over = true;
            }
        }
        if !self.game_over {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> PlayerId {
        PlayerId::from(s)
    }

    fn mv(
        from_row: usize,
        from_col: usize,
        to_row: usize,
        to_col: usize,
    ) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("from_row".to_owned(), from_row.into());
        m.insert("from_col".to_owned(), from_col.into());
        m.insert("to_row".to_owned(), to_row.into());
        m.insert("to_col".to_owned(), to_col.into());
        m
    }

    fn game() -> Checkers {
        Checkers::new(&[pid("a"), pid("b")], "classic")
    }

    /// An empty board for hand-built positions.
    fn bare() -> Checkers {
        let mut g = game();
        for row in &mut g.board {
            for cell in row {
                cell.clear();
            }
        }
        g
    }

    #[test]
    fn test_initial_setup_has_twelve_pieces_each() {
        let g = game();
        let r: usize = g
            .board
            .iter()
            .flatten()
            .filter(|c| c.as_str() == "r")
            .count();
        let b: usize = g
            .board
            .iter()
            .flatten()
            .filter(|c| c.as_str() == "b")
            .count();
        assert_eq!((r, b), (12, 12));
    }

    #[test]
    fn test_simple_forward_step() {
        let mut g = game();
        g.apply_move(&pid("a"), &mv(5, 0, 4, 1)).unwrap();
        let snap = g.snapshot();
        assert_eq!(snap["board"][4][1], "r");
        assert_eq!(snap["board"][5][0], "");
        assert_eq!(snap["turn"], 1);
    }

    #[test]
    fn test_backward_step_rejected_for_men() {
        let mut g = game();
        g.apply_move(&pid("a"), &mv(5, 0, 4, 1)).unwrap();
        g.apply_move(&pid("b"), &mv(2, 1, 3, 0)).unwrap();
        let err = g.apply_move(&pid("a"), &mv(4, 1, 5, 0)).unwrap_err();
        assert!(matches!(err, EngineError::Illegal(_)));
    }

    #[test]
    fn test_jump_captures_the_jumped_piece() {
        let mut g = bare();
        g.board[4][3] = "r".to_owned();
        g.board[3][2] = "b".to_owned();
        g.counts = vec![1, 1];

        g.apply_move(&pid("a"), &mv(4, 3, 2, 1)).unwrap();
        let snap = g.snapshot();
        assert_eq!(snap["board"][3][2], "", "captured piece removed");
        assert_eq!(snap["board"][2][1], "r");
        assert!(g.is_over(), "last opposing piece captured");
        assert_eq!(g.winner(), "a");
    }

    #[test]
    fn test_jump_over_empty_square_rejected() {
        let mut g = bare();
        g.board[4][3] = "r".to_owned();
        g.board[0][1] = "b".to_owned(); // keep the game alive
        let err = g.apply_move(&pid("a"), &mv(4, 3, 2, 1)).unwrap_err();
        assert!(matches!(err, EngineError::Illegal(_)));
    }

    #[test]
    fn test_jump_over_own_piece_rejected() {
        let mut g = bare();
        g.board[4][3] = "r".to_owned();
        g.board[3][2] = "r".to_owned();
        let err = g.apply_move(&pid("a"), &mv(4, 3, 2, 1)).unwrap_err();
        assert!(matches!(err, EngineError::Illegal(_)));
    }

    #[test]
    fn test_reaching_far_row_crowns() {
        let mut g = bare();
        g.board[1][2] = "r".to_owned();
        g.board[7][0] = "b".to_owned();
        g.counts = vec![1, 1];

        g.apply_move(&pid("a"), &mv(1, 2, 0, 3)).unwrap();
        assert_eq!(g.snapshot()["board"][0][3], "R");
    }

    #[test]
    fn test_kings_move_backward() {
        let mut g = bare();
        g.board[3][2] = "R".to_owned();
        g.board[7][0] = "b".to_owned();
        g.counts = vec![1, 1];

        g.apply_move(&pid("a"), &mv(3, 2, 4, 3)).unwrap();
        assert_eq!(g.snapshot()["board"][4][3], "R");
    }

    #[test]
    fn test_moving_opponent_piece_rejected() {
        let mut g = game();
        let err = g.apply_move(&pid("a"), &mv(2, 1, 3, 0)).unwrap_err();
        assert!(matches!(err, EngineError::Illegal(_)));
    }

    #[test]
    fn test_non_diagonal_move_rejected() {
        let mut g = game();
        let err = g.apply_move(&pid("a"), &mv(5, 0, 4, 0)).unwrap_err();
        assert!(matches!(err, EngineError::Illegal(_)));
    }
}
