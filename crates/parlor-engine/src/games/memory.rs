//! Memory: flip two cards, keep the pair, best collector wins.
//!
//! 1–8 players take turns. The first flip locks until a second arrives; a
//! match scores and keeps the turn, a mismatch leaves both cards face-up
//! for about a second before a scheduled effect hides them and passes the
//! turn. The hide is a [`DelayedEffect`] — there are no blocking sleeps.
//!
//! Face-down card values never leave the server; the snapshot carries a
//! value only for face-up or matched cards.

use std::collections::HashMap;
use std::time::Duration;

use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use parlor_protocol::PlayerId;

use crate::{
    decode_move, player_index, Applied, DelayedEffect, EngineError,
    GameEngine, TimerAction, TimerOutcome,
};

/// Number of pairs on the board.
const PAIRS: u8 = 8;

/// How long a mismatched pair stays visible.
const SHOW_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
struct Card {
    value: u8,
    matched: bool,
    revealed: bool,
}

#[derive(Debug, Clone)]
pub struct MemoryGame {
    players: Vec<PlayerId>,
    game_mode: String,
    cards: Vec<Card>,
    /// Index of the turn's first flip, while waiting for the second.
    first_flip: Option<usize>,
    /// A mismatched pair currently shown, waiting for the hide effect.
    pending_hide: Option<(usize, usize)>,
    scores: HashMap<PlayerId, u32>,
    turn: usize,
    winner: String,
    game_over: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MemoryMove {
    card_idx: usize,
}

impl MemoryGame {
    pub fn new(players: &[PlayerId], mode: &str) -> Self {
        let mut values: Vec<u8> =
            (0..PAIRS).flat_map(|v| [v, v]).collect();
        values.shuffle(&mut rand::rng());
        Self {
            players: players.to_vec(),
            game_mode: mode.to_owned(),
            cards: values
                .into_iter()
                .map(|value| Card {
                    value,
                    matched: false,
                    revealed: false,
                })
                .collect(),
            first_flip: None,
            pending_hide: None,
            scores: players.iter().map(|p| (p.clone(), 0)).collect(),
            turn: 0,
            winner: String::new(),
            game_over: false,
        }
    }

    fn all_matched(&self) -> bool {
        self.cards.iter().all(|c| c.matched)
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

impl GameEngine for MemoryGame {
    fn apply_move(
        &mut self,
        player: &PlayerId,
        data: &Map<String, Value>,
    ) -> Result<Applied, EngineError> {
        if self.game_over {
            return Err(EngineError::AlreadyOver);
        }
        let mv: MemoryMove = decode_move(data)?;
        let idx = player_index(&self.players, player)?;
        if idx != self.turn {
            return Err(EngineError::NotYourTurn);
        }
        if self.pending_hide.is_some() {
            return Err(EngineError::Illegal(
                "Cards are still being hidden".to_owned(),
            ));
        }
        let card = self
            .cards
            .get(mv.card_idx)
            .ok_or_else(|| {
                EngineError::Illegal("Card index out of range".to_owned())
            })?;
        if card.matched || card.revealed {
            return Err(EngineError::Illegal(
                "Card already face-up".to_owned(),
            ));
        }

        self.cards[mv.card_idx].revealed = true;
        match self.first_flip.take() {
            None => {
                self.first_flip = Some(mv.card_idx);
                Ok(Applied::plain())
            }
            Some(first) => {
                if self.cards[first].value == self.cards[mv.card_idx].value {
                    self.cards[first].matched = true;
                    self.cards[mv.card_idx].matched = true;
                    *self.scores.entry(player.clone()).or_insert(0) += 1;
                    if self.all_matched() {
                        self.game_over = true;
                        self.winner = self.decide_winner();
                    }
                    // Scorer keeps the turn.
                    Ok(Applied::plain())
                } else {
                    self.pending_hide = Some((first, mv.card_idx));
                    Ok(Applied::with_effect(DelayedEffect {
                        after: SHOW_INTERVAL,
                        action: TimerAction::HideCards,
                    }))
                }
            }
        }
    }

    fn snapshot(&self) -> Value {
        let cards: Vec<Value> = self
            .cards
            .iter()
            .map(|c| {
                json!({
                    "matched": c.matched,
                    "revealed": c.revealed,
                    "value": (c.revealed || c.matched)
                        .then_some(c.value),
                })
            })
            .collect();
        json!({
            "players": self.players,
            "game_mode": self.game_mode,
            "cards": cards,
            "first_flip": self.first_flip,
            "pending_hide": self.pending_hide.is_some(),
            "scores": self.scores,
            "turn": self.turn,
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

    fn apply_timer(&mut self, action: &TimerAction) -> TimerOutcome {
        if !matches!(action, TimerAction::HideCards) {
            return TimerOutcome::Ignored;
        }
        let Some((a, b)) = self.pending_hide.take() else {
            return TimerOutcome::Ignored;
        };
        self.cards[a].revealed = false;
        self.cards[b].revealed = false;
        self.turn = (self.turn + 1) % self.players.len();
        TimerOutcome::Fired {
            timeout: None,
            next: None,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
