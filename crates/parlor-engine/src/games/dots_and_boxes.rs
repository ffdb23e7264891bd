//! Dots & Boxes on a 6×6 box grid (7 dots per side).
//!
//! Drawing the fourth side of a box claims it, scores a point, and grants
//! another turn; a line that completes nothing passes the turn. The game
//! ends when all 36 boxes are claimed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use parlor_protocol::PlayerId;

use crate::{
    decode_move, player_index, to_snapshot, Applied, EngineError, GameEngine,
};

/// Boxes per side.
const BOXES: usize = 6;

#[derive(Debug, Clone, Serialize)]
pub struct DotsAndBoxes {
    players: Vec<PlayerId>,
    game_mode: String,
    /// `horizontal[row][col]` — the edge above box row `row`
    /// (`BOXES + 1` rows of `BOXES` edges).
    horizontal: Vec<Vec<bool>>,
    /// `vertical[row][col]` — the edge left of box col `col`
    /// (`BOXES` rows of `BOXES + 1` edges).
    vertical: Vec<Vec<bool>>,
    /// Claimed boxes by owner player id; `""` while open.
    boxes: Vec<Vec<String>>,
    scores: Vec<u32>,
    claimed: usize,
    turn: usize,
    winner: String,
    game_over: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LineMove {
    #[serde(rename = "type")]
    line_type: String,
    row: usize,
    col: usize,
}

impl DotsAndBoxes {
    pub fn new(players: &[PlayerId], mode: &str) -> Self {
        Self {
            players: players.to_vec(),
            game_mode: mode.to_owned(),
            horizontal: vec![vec![false; BOXES]; BOXES + 1],
            vertical: vec![vec![false; BOXES + 1]; BOXES],
            boxes: vec![vec![String::new(); BOXES]; BOXES],
            scores: vec![0, 0],
            claimed: 0,
            turn: 0,
            winner: String::new(),
            game_over: false,
        }
    }

    fn box_complete(&self, row: usize, col: usize) -> bool {
        self.horizontal[row][col]
            && self.horizontal[row + 1][col]
            && self.vertical[row][col]
            && self.vertical[row][col + 1]
    }

    /// Claims every newly completed box adjacent to the drawn line.
    /// Returns how many were claimed.
    fn claim_around(
        &mut self,
        candidates: &[(usize, usize)],
        owner: &PlayerId,
    ) -> usize {
        let mut claimed = 0;
        for &(row, col) in candidates {
            if self.boxes[row][col].is_empty() && self.box_complete(row, col) {
                self.boxes[row][col] = owner.0.clone();
                claimed += 1;
            }
        }
        claimed
    }

    fn finish_if_done(&mut self) {
        if self.claimed < BOXES * BOXES {
            return;
        }
        self.game_over = true;
        self.winner = match self.scores[0].cmp(&self.scores[1]) {
            std::cmp::Ordering::Greater => self.players[0].0.clone(),
            std::cmp::Ordering::Less => self.players[1].0.clone(),
            std::cmp::Ordering::Equal => "draw".to_owned(),
        };
    }
}

impl GameEngine for DotsAndBoxes {
    fn apply_move(
        &mut self,
        player: &PlayerId,
        data: &Map<String, Value>,
    ) -> Result<Applied, EngineError> {
        if self.game_over {
            return Err(EngineError::AlreadyOver);
        }
        let mv: LineMove = decode_move(data)?;
        let idx = player_index(&self.players, player)?;
        if idx != self.turn {
            return Err(EngineError::NotYourTurn);
        }

        let candidates: Vec<(usize, usize)> = match mv.line_type.as_str() {
            "horizontal" => {
                if mv.row > BOXES || mv.col >= BOXES {
                    return Err(EngineError::Illegal(
                        "Line is off the grid".to_owned(),
                    ));
                }
                if self.horizontal[mv.row][mv.col] {
                    return Err(EngineError::Illegal(
                        "Line already drawn".to_owned(),
                    ));
                }
                self.horizontal[mv.row][mv.col] = true;
                let mut c = Vec::new();
                if mv.row > 0 {
                    c.push((mv.row - 1, mv.col));
                }
                if mv.row < BOXES {
                    c.push((mv.row, mv.col));
                }
                c
            }
            "vertical" => {
                if mv.row >= BOXES || mv.col > BOXES {
                    return Err(EngineError::Illegal(
                        "Line is off the grid".to_owned(),
                    ));
                }
                if self.vertical[mv.row][mv.col] {
                    return Err(EngineError::Illegal(
                        "Line already drawn".to_owned(),
                    ));
                }
                self.vertical[mv.row][mv.col] = true;
                let mut c = Vec::new();
                if mv.col > 0 {
                    c.push((mv.row, mv.col - 1));
                }
                if mv.col < BOXES {
                    c.push((mv.row, mv.col));
                }
                c
            }
            _ => {
                return Err(EngineError::Validation(
                    "Line type must be horizontal or vertical".to_owned(),
                ));
            }
        };

        let newly = self.claim_around(&candidates, player);
        if newly > 0 {
            self.scores[idx] += newly as u32;
            self.claimed += newly;
            self.finish_if_done();
            // Completing a box keeps the turn.
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

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> PlayerId {
        PlayerId::from(s)
    }

    fn line(kind: &str, row: usize, col: usize) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("type".to_owned(), kind.into());
        m.insert("row".to_owned(), row.into());
        m.insert("col".to_owned(), col.into());
        m
    }

    fn game() -> DotsAndBoxes {
        DotsAndBoxes::new(&[pid("a"), pid("b")], "classic")
    }

    #[test]
    fn test_plain_line_passes_turn() {
        let mut g = game();
        g.apply_move(&pid("a"), &line("horizontal", 0, 0)).unwrap();
        assert_eq!(g.snapshot()["turn"], 1);
    }

    #[test]
    fn test_duplicate_line_rejected() {
        let mut g = game();
        g.apply_move(&pid("a"), &line("horizontal", 0, 0)).unwrap();
        let err = g
            .apply_move(&pid("b"), &line("horizontal", 0, 0))
            .unwrap_err();
        assert!(matches!(err, EngineError::Illegal(_)));
    }

    #[test]
    fn test_unknown_line_type_rejected() {
        let mut g = game();
        let err = g
            .apply_move(&pid("a"), &line("diagonal", 0, 0))
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_out_of_range_line_rejected() {
        let mut g = game();
        let err = g
            .apply_move(&pid("a"), &line("horizontal", 7, 0))
            .unwrap_err();
        assert!(matches!(err, EngineError::Illegal(_)));
        let err = g
            .apply_move(&pid("a"), &line("vertical", 6, 0))
            .unwrap_err();
        assert!(matches!(err, EngineError::Illegal(_)));
    }

    #[test]
    fn test_completing_a_box_scores_and_keeps_turn() {
        let mut g = game();
        g.apply_move(&pid("a"), &line("horizontal", 0, 0)).unwrap();
        g.apply_move(&pid("b"), &line("vertical", 0, 0)).unwrap();
        g.apply_move(&pid("a"), &line("vertical", 0, 1)).unwrap();
        // b closes box (0,0) and moves again.
        g.apply_move(&pid("b"), &line("horizontal", 1, 0)).unwrap();

        let snap = g.snapshot();
        assert_eq!(snap["boxes"][0][0], "b");
        assert_eq!(snap["scores"][1], 1);
        assert_eq!(snap["turn"], 1, "closing a box grants another turn");
    }

    #[test]
    fn test_one_line_can_close_two_boxes() {
        let mut g = game();
        // Surround boxes (0,0) and (0,1) except for the shared edge
        // vertical (0,1).
        for (kind, row, col) in [
            ("horizontal", 0usize, 0usize),
            ("horizontal", 1, 0),
            ("vertical", 0, 0),
            ("horizontal", 0, 1),
            ("horizontal", 1, 1),
            ("vertical", 0, 2),
        ] {
            let who = if g.snapshot()["turn"] == 0 { "a" } else { "b" };
            g.apply_move(&pid(who), &line(kind, row, col)).unwrap();
        }
        let who = if g.snapshot()["turn"] == 0 { "a" } else { "b" };
        g.apply_move(&pid(who), &line("vertical", 0, 1)).unwrap();
        let snap = g.snapshot();
        assert_eq!(snap["boxes"][0][0], who);
        assert_eq!(snap["boxes"][0][1], who);
        assert_eq!(snap["claimed"], 2);
    }

    #[test]
    fn test_all_boxes_claimed_ends_game() {
        let mut g = game();
        // Draw every line; whoever is on turn draws the next one.
        let mut lines: Vec<(&str, usize, usize)> = Vec::new();
        for row in 0..=BOXES {
            for col in 0..BOXES {
                lines.push(("horizontal", row, col));
            }
        }
        for row in 0..BOXES {
            for col in 0..=BOXES {
                lines.push(("vertical", row, col));
            }
        }
        for (kind, row, col) in lines {
            let turn = g.snapshot()["turn"].as_u64().unwrap() as usize;
            let who = if turn == 0 { "a" } else { "b" };
            g.apply_move(&pid(who), &line(kind, row, col)).unwrap();
        }
        assert!(g.is_over());
        assert_eq!(g.snapshot()["claimed"], 36);
        let total: u64 = g.snapshot()["scores"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_u64().unwrap())
            .sum();
        assert_eq!(total, 36);
    }
}
