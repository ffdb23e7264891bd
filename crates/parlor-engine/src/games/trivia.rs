//! Trivia: multiple-choice questions, 100 points a piece.
//!
//! Like Jeopardy, any listed player may answer and the first processed
//! answer takes the question — the board always advances. Ends when the
//! questions run out. Mid-game joiners are allowed for trivia at the room
//! layer, but only players present at start are in the engine's list, so
//! latecomers spectate the scoring.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use parlor_protocol::PlayerId;

use crate::content::{trivia_questions, TriviaQuestion};
use crate::{decode_move, player_index, Applied, EngineError, GameEngine};

/// Points per correct answer.
const POINTS: u32 = 100;

#[derive(Debug, Clone)]
pub struct TriviaGame {
    players: Vec<PlayerId>,
    game_mode: String,
    scores: HashMap<PlayerId, u32>,
    current_q: usize,
    /// `(answering player, was_correct, correct option index)` of the
    /// previous question.
    last_result: Option<(PlayerId, bool, usize)>,
    winner: String,
    game_over: bool,
    questions: Vec<TriviaQuestion>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TriviaMove {
    idx: usize,
}

impl TriviaGame {
    pub fn new(players: &[PlayerId], mode: &str) -> Self {
        Self {
            players: players.to_vec(),
            game_mode: mode.to_owned(),
            scores: players.iter().map(|p| (p.clone(), 0)).collect(),
            current_q: 0,
            last_result: None,
            winner: String::new(),
            game_over: false,
            questions: trivia_questions(),
        }
    }

    fn decide_winner(&self) -> String {
        let best = self.scores.values().copied().max().unwrap_or(0);
        let mut top = self
            .players
            .iter()
            .filter(|p| self.scores.get(*p).copied().unwrap_or(0) == best);
        match (top.next(), top.next()) {
            (Some(p), None) => p.0.clone(),
            _ => "draw".to_owned(),
        }
    }
}

impl GameEngine for TriviaGame {
    fn apply_move(
        &mut self,
        player: &PlayerId,
        data: &Map<String, Value>,
    ) -> Result<Applied, EngineError> {
        if self.game_over {
            return Err(EngineError::AlreadyOver);
        }
        let mv: TriviaMove = decode_move(data)?;
        player_index(&self.players, player)?;
        let q = &self.questions[self.current_q];
        if mv.idx >= q.options.len() {
            return Err(EngineError::Illegal(
                "Answer index out of range".to_owned(),
            ));
        }

        let correct = mv.idx == q.correct;
        let correct_idx = q.correct;
        if correct {
            *self.scores.entry(player.clone()).or_insert(0) += POINTS;
        }
        self.last_result = Some((player.clone(), correct, correct_idx));
        self.current_q += 1;
        if self.current_q >= self.questions.len() {
            self.game_over = true;
            self.winner = self.decide_winner();
        }
        Ok(Applied::plain())
    }

    fn snapshot(&self) -> Value {
        let current = self.questions.get(self.current_q).map(|q| {
            json!({
                "question": q.question,
                "options": q.options,
            })
        });
        json!({
            "players": self.players,
            "game_mode": self.game_mode,
            "scores": self.scores,
            "current_q": self.current_q,
            "total_questions": self.questions.len(),
            "current_question": current,
            "last_result": self.last_result.as_ref().map(
                |(p, correct, idx)| {
                    json!({
                        "player_id": p,
                        "correct": correct,
                        "correct_idx": idx,
                    })
                },
            ),
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
