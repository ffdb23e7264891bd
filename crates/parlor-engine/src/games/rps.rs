//! Rock-paper-scissors, best of three.
//!
//! The one simultaneous game: both players commit a choice for the round
//! and nothing resolves (or leaks) until the second choice arrives. A
//! player who has already committed this round is rejected with a
//! duplicate error, not a turn error.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use parlor_protocol::PlayerId;

use crate::{decode_move, player_index, Applied, EngineError, GameEngine};

/// Rounds in a match; first to a majority takes it.
const BEST_OF: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Choice {
    Rock,
    Paper,
    Scissors,
}

impl Choice {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "rock" => Some(Self::Rock),
            "paper" => Some(Self::Paper),
            "scissors" => Some(Self::Scissors),
            _ => None,
        }
    }

    fn beats(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Rock, Self::Scissors)
                | (Self::Scissors, Self::Paper)
                | (Self::Paper, Self::Rock)
        )
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Rock => "rock",
            Self::Paper => "paper",
            Self::Scissors => "scissors",
        }
    }
}

/// One resolved round, kept for the score sheet in the snapshot.
#[derive(Debug, Clone, Serialize)]
struct Round {
    moves: [String; 2],
    /// Winner's player id, or `"draw"`.
    winner: String,
}

#[derive(Debug, Clone)]
pub struct Rps {
    players: Vec<PlayerId>,
    game_mode: String,
    wins_needed: u32,
    /// Uncommitted round state; never serialized.
    pending: [Option<Choice>; 2],
    scores: [u32; 2],
    rounds: Vec<Round>,
    winner: String,
    game_over: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RpsMove {
    #[serde(alias = "move")]
    choice: String,
}

impl Rps {
    pub fn new(players: &[PlayerId], mode: &str) -> Self {
        Self {
            players: players.to_vec(),
            game_mode: mode.to_owned(),
            wins_needed: BEST_OF / 2 + 1,
            pending: [None, None],
            scores: [0, 0],
            rounds: Vec::new(),
            winner: String::new(),
            game_over: false,
        }
    }

    fn resolve(&mut self, a: Choice, b: Choice) {
        let round_winner = if a == b {
            "draw".to_owned()
        } else if a.beats(b) {
            self.scores[0] += 1;
            self.players[0].0.clone()
        } else {
            self.scores[1] += 1;
            self.players[1].0.clone()
        };
        self.rounds.push(Round {
            moves: [a.as_str().to_owned(), b.as_str().to_owned()],
            winner: round_winner,
        });
        self.pending = [None, None];
        for i in 0..2 {
            if self.scores[i] >= self.wins_needed {
                self.winner = self.players[i].0.clone();
                self.game_over = true;
            }
        }
    }
}

impl GameEngine for Rps {
    fn apply_move(
        &mut self,
        player: &PlayerId,
        data: &Map<String, Value>,
    ) -> Result<Applied, EngineError> {
        if self.game_over {
            return Err(EngineError::AlreadyOver);
        }
        let mv: RpsMove = decode_move(data)?;
        let idx = player_index(&self.players, player)?;
        let choice = Choice::parse(&mv.choice).ok_or_else(|| {
            EngineError::Illegal("Play rock, paper or scissors".to_owned())
        })?;
        if self.pending[idx].is_some() {
            return Err(EngineError::Duplicate(
                "Move already made this round".to_owned(),
            ));
        }

        self.pending[idx] = Some(choice);
        if let [Some(a), Some(b)] = self.pending {
            self.resolve(a, b);
        }
        Ok(Applied::plain())
    }

    fn snapshot(&self) -> Value {
        json!({
            "players": self.players,
            "game_mode": self.game_mode,
            "best_of": BEST_OF,
            "wins_needed": self.wins_needed,
            // Committed-but-unresolved choices stay hidden; only the
            // fact that a player has moved is visible.
            "moved": [self.pending[0].is_some(), self.pending[1].is_some()],
            "scores": self.scores,
            "rounds": self.rounds,
            "winner": self.winner,
            "game_over": self.game_over,
        })
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
