//! Jeopardy: 1–8 players racing to answer the same question board.
//!
//! Answers are compared case-insensitively after trimming. The board
//! always advances, right or wrong — first processed answer takes the
//! question. Modes: `classic`; `speed` puts ten seconds on each question
//! and advances scoreless on expiry; `teams` splits players round-robin
//! into `team1`/`team2` and reports team totals.
//!
//! Correct answers also feed the process-wide leaderboard via
//! [`Applied::scored`].

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use parlor_protocol::PlayerId;

use crate::content::{jeopardy_questions, JeopardyQuestion};
use crate::{
    decode_move, player_index, to_snapshot, Applied, DelayedEffect,
    EngineError, GameEngine, TimerAction, TimerOutcome,
};

/// Per-question clock in speed mode.
const QUESTION_CLOCK: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Classic,
    Speed,
    Teams,
}

impl Mode {
    fn parse(mode: &str) -> Self {
        match mode {
            "speed" => Self::Speed,
            "teams" => Self::Teams,
            _ => Self::Classic,
        }
    }
}

/// Outcome of the previously played question, kept in the snapshot so
/// clients can show "correct!" / the right answer after each advance.
#[derive(Debug, Clone, Serialize)]
struct LastResult {
    player_id: Option<PlayerId>,
    correct: bool,
    answer: String,
    value: u32,
    timed_out: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Jeopardy {
    players: Vec<PlayerId>,
    game_mode: String,
    scores: HashMap<PlayerId, u32>,
    /// Player → team name; empty outside teams mode.
    teams: HashMap<PlayerId, String>,
    team_scores: HashMap<String, u32>,
    current_q: usize,
    last_result: Option<LastResult>,
    winner: String,
    game_over: bool,
    #[serde(skip)]
    mode: Mode,
    /// Answers stay server-side; the snapshot exposes only the current
    /// prompt and value.
    #[serde(skip)]
    questions: Vec<JeopardyQuestion>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JeopardyMove {
    answer: String,
    /// Optional guard against racing a question advance: a stale index is
    /// rejected instead of silently answering the next question.
    #[serde(default)]
    question_index: Option<usize>,
}

impl Jeopardy {
    pub fn new(players: &[PlayerId], mode: &str) -> Self {
        let parsed = Mode::parse(mode);
        let mut teams = HashMap::new();
        let mut team_scores = HashMap::new();
        if parsed == Mode::Teams {
            for (i, p) in players.iter().enumerate() {
                let team = if i % 2 == 0 { "team1" } else { "team2" };
                teams.insert(p.clone(), team.to_owned());
            }
            team_scores.insert("team1".to_owned(), 0);
            team_scores.insert("team2".to_owned(), 0);
        }
        Self {
            players: players.to_vec(),
            game_mode: mode.to_owned(),
            scores: players.iter().map(|p| (p.clone(), 0)).collect(),
            teams,
            team_scores,
            current_q: 0,
            last_result: None,
            winner: String::new(),
            game_over: false,
            mode: parsed,
            questions: jeopardy_questions(),
        }
    }

    fn advance(&mut self) {
        self.current_q += 1;
        if self.current_q >= self.questions.len() {
            self.game_over = true;
            self.winner = self.decide_winner();
        }
    }

    fn decide_winner(&self) -> String {
        if self.mode == Mode::Teams {
            let t1 = self.team_scores.get("team1").copied().unwrap_or(0);
            let t2 = self.team_scores.get("team2").copied().unwrap_or(0);
            return match t1.cmp(&t2) {
                std::cmp::Ordering::Greater => "team1".to_owned(),
                std::cmp::Ordering::Less => "team2".to_owned(),
                std::cmp::Ordering::Equal => "draw".to_owned(),
            };
        }
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

    fn next_deadline(&self) -> Option<DelayedEffect> {
        (self.mode == Mode::Speed && !self.game_over).then(|| DelayedEffect {
            after: QUESTION_CLOCK,
            action: TimerAction::QuestionDeadline {
                index: self.current_q,
            },
        })
    }
}

impl GameEngine for Jeopardy {
    fn apply_move(
        &mut self,
        player: &PlayerId,
        data: &Map<String, Value>,
    ) -> Result<Applied, EngineError> {
        if self.game_over {
            return Err(EngineError::AlreadyOver);
        }
        let mv: JeopardyMove = decode_move(data)?;
        player_index(&self.players, player)?;
        if let Some(qi) = mv.question_index {
            if qi != self.current_q {
                return Err(EngineError::Illegal(
                    "Question already advanced".to_owned(),
                ));
            }
        }

        let q = &self.questions[self.current_q];
        let correct = mv.answer.trim().eq_ignore_ascii_case(q.answer);
        let value = q.value;
        let answer = q.answer.to_owned();

        if correct {
            *self.scores.entry(player.clone()).or_insert(0) += value;
            if let Some(team) = self.teams.get(player) {
                *self.team_scores.entry(team.clone()).or_insert(0) += value;
            }
        }
        self.last_result = Some(LastResult {
            player_id: Some(player.clone()),
            correct,
            answer,
            value,
            timed_out: false,
        });
        self.advance();

        Ok(Applied {
            effect: self.next_deadline(),
            scored: correct.then(|| (player.clone(), value)),
        })
    }

    fn snapshot(&self) -> Value {
        let mut snap = to_snapshot(self);
        if let Value::Object(map) = &mut snap {
            let current = self.questions.get(self.current_q).map(|q| {
                json!({
                    "category": q.category,
                    "question": q.question,
                    "value": q.value,
                })
            });
            map.insert(
                "current_question".to_owned(),
                current.unwrap_or(Value::Null),
            );
            map.insert(
                "total_questions".to_owned(),
                self.questions.len().into(),
            );
        }
        snap
    }

    fn is_over(&self) -> bool {
        self.game_over
    }

    fn winner(&self) -> String {
        self.winner.clone()
    }

    fn initial_effect(&self) -> Option<DelayedEffect> {
        self.next_deadline()
    }

    fn apply_timer(&mut self, action: &TimerAction) -> TimerOutcome {
        let TimerAction::QuestionDeadline { index } = action else {
            return TimerOutcome::Ignored;
        };
        if self.game_over || *index != self.current_q {
            return TimerOutcome::Ignored;
        }
        self.last_result = Some(LastResult {
            player_id: None,
            correct: false,
            answer: self.questions[self.current_q].answer.to_owned(),
            value: 0,
            timed_out: true,
        });
        self.advance();
        TimerOutcome::Fired {
            timeout: Some("Question timed out".to_owned()),
            next: self.next_deadline(),
        }
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

    fn answer(text: &str) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("answer".to_owned(), text.into());
        m
    }

    #[test]
    fn test_correct_answer_scores_and_advances() {
        let mut g = Jeopardy::new(&[pid("a"), pid("b")], "classic");
        let applied = g.apply_move(&pid("a"), &answer("Au")).unwrap();
        assert_eq!(applied.scored, Some((pid("a"), 100)));

        let snap = g.snapshot();
        assert_eq!(snap["current_q"], 1);
        assert_eq!(snap["scores"]["a"], 100);
        assert_eq!(snap["last_result"]["correct"], true);
    }

    #[test]
    fn test_answer_comparison_is_case_insensitive_and_trimmed() {
        let mut g = Jeopardy::new(&[pid("a")], "classic");
        let applied = g.apply_move(&pid("a"), &answer("  aU ")).unwrap();
        assert!(applied.scored.is_some());
    }

    #[test]
    fn test_wrong_answer_advances_without_scoring() {
        let mut g = Jeopardy::new(&[pid("a")], "classic");
        let applied = g.apply_move(&pid("a"), &answer("Ag")).unwrap();
        assert!(applied.scored.is_none());
        let snap = g.snapshot();
        assert_eq!(snap["current_q"], 1);
        assert_eq!(snap["scores"]["a"], 0);
        // The reveal still tells the client what was right.
        assert_eq!(snap["last_result"]["answer"], "Au");
    }

    #[test]
    fn test_stale_question_index_rejected() {
        let mut g = Jeopardy::new(&[pid("a"), pid("b")], "classic");
        g.apply_move(&pid("a"), &answer("Au")).unwrap();
        let mut m = answer("Mars");
        m.insert("question_index".to_owned(), 0.into());
        let err = g.apply_move(&pid("b"), &m).unwrap_err();
        assert!(matches!(err, EngineError::Illegal(_)));
    }

    #[test]
    fn test_game_ends_at_question_exhaustion() {
        let mut g = Jeopardy::new(&[pid("a")], "classic");
        let total = jeopardy_questions().len();
        for _ in 0..total {
            g.apply_move(&pid("a"), &answer("whatever")).unwrap();
        }
        assert!(g.is_over());
        let err = g.apply_move(&pid("a"), &answer("more")).unwrap_err();
        assert_eq!(err, EngineError::AlreadyOver);
    }

    #[test]
    fn test_winner_is_top_scorer() {
        let mut g = Jeopardy::new(&[pid("a"), pid("b")], "classic");
        g.apply_move(&pid("a"), &answer("Au")).unwrap(); // +100
        let total = jeopardy_questions().len();
        for _ in 1..total {
            g.apply_move(&pid("b"), &answer("wrong")).unwrap();
        }
        assert!(g.is_over());
        assert_eq!(g.winner(), "a");
    }

    #[test]
    fn test_speed_timeout_advances_scoreless_with_broadcast() {
        let mut g = Jeopardy::new(&[pid("a")], "speed");
        assert!(g.initial_effect().is_some());

        let outcome = g.apply_timer(&TimerAction::QuestionDeadline { index: 0 });
        let TimerOutcome::Fired { timeout, next } = outcome else {
            panic!("deadline should fire");
        };
        assert!(timeout.is_some());
        assert!(next.is_some(), "next question gets its own clock");

        let snap = g.snapshot();
        assert_eq!(snap["current_q"], 1);
        assert_eq!(snap["scores"]["a"], 0);
        assert_eq!(snap["last_result"]["timed_out"], true);
    }

    #[test]
    fn test_speed_stale_deadline_ignored_after_answer() {
        let mut g = Jeopardy::new(&[pid("a")], "speed");
        g.apply_move(&pid("a"), &answer("Au")).unwrap();
        let outcome = g.apply_timer(&TimerAction::QuestionDeadline { index: 0 });
        assert_eq!(outcome, TimerOutcome::Ignored);
    }

    #[test]
    fn test_teams_mode_round_robin_and_totals() {
        let players = [pid("a"), pid("b"), pid("c"), pid("d")];
        let mut g = Jeopardy::new(&players, "teams");
        let snap = g.snapshot();
        assert_eq!(snap["teams"]["a"], "team1");
        assert_eq!(snap["teams"]["b"], "team2");
        assert_eq!(snap["teams"]["c"], "team1");
        assert_eq!(snap["teams"]["d"], "team2");

        g.apply_move(&pid("a"), &answer("Au")).unwrap();
        let snap = g.snapshot();
        assert_eq!(snap["team_scores"]["team1"], 100);
        assert_eq!(snap["team_scores"]["team2"], 0);
    }

    #[test]
    fn test_snapshot_never_exposes_pending_answer() {
        let g = Jeopardy::new(&[pid("a")], "classic");
        let snap = g.snapshot();
        assert!(snap.get("questions").is_none());
        assert_eq!(snap["current_question"]["question"].as_str().is_some(), true);
        assert!(snap["current_question"].get("answer").is_none());
    }

    #[test]
    fn test_outsider_cannot_answer() {
        let mut g = Jeopardy::new(&[pid("a")], "classic");
        let err = g.apply_move(&pid("zz"), &answer("Au")).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
