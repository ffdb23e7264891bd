//! Uno for 2–8 players with the standard 108-card deck.
//!
//! A card is playable iff it matches the current color, matches the top
//! card's value, or is wild. Wilds carry a chosen color (defaulting to
//! red). Action cards: `skip`, `reverse` (acts as skip with two players),
//! `draw2` and `wild4` (the next player draws and loses their turn). A
//! player with no playable card sends `{"draw": true}` to draw one and
//! pass. First empty hand wins.
//!
//! When the draw pile runs low the discard pile minus its top card is
//! shuffled back in, so drawing never deadlocks. Card conservation:
//! hands + deck + discard always total 108.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use parlor_protocol::PlayerId;

use crate::{decode_move, player_index, Applied, EngineError, GameEngine};

/// Total cards in a fresh deck.
const DECK_SIZE: usize = 108;

/// Opening hand size.
const HAND_SIZE: usize = 7;

/// Reshuffle the discards back in when the draw pile drops below this.
const RESHUFFLE_AT: usize = 5;

const COLORS: [&str; 4] = ["red", "yellow", "green", "blue"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// `red`, `yellow`, `green`, `blue`, or `wild`.
    pub color: String,
    /// `0`–`9`, `skip`, `reverse`, `draw2`, `wild`, `wild4`.
    pub value: String,
}

impl Card {
    fn new(color: &str, value: &str) -> Self {
        Self {
            color: color.to_owned(),
            value: value.to_owned(),
        }
    }

    fn is_wild(&self) -> bool {
        self.color == "wild"
    }
}

fn build_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for color in COLORS {
        deck.push(Card::new(color, "0"));
        for v in 1..=9 {
            let value = v.to_string();
            deck.push(Card::new(color, &value));
            deck.push(Card::new(color, &value));
        }
        for value in ["skip", "reverse", "draw2"] {
            deck.push(Card::new(color, value));
            deck.push(Card::new(color, value));
        }
    }
    for _ in 0..4 {
        deck.push(Card::new("wild", "wild"));
    }
    for _ in 0..4 {
        deck.push(Card::new("wild", "wild4"));
    }
    deck
}

#[derive(Debug, Clone)]
pub struct Uno {
    players: Vec<PlayerId>,
    game_mode: String,
    hands: HashMap<PlayerId, Vec<Card>>,
    deck: Vec<Card>,
    /// Played cards, oldest first; the last element is the top card.
    discard: Vec<Card>,
    /// The color in effect — the top card's color, or the chosen color
    /// after a wild.
    current_color: String,
    turn: usize,
    /// `1` clockwise, `-1` after an odd number of reverses.
    direction: i8,
    winner: String,
    game_over: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnoMove {
    #[serde(default)]
    card_idx: Option<usize>,
    #[serde(default)]
    chosen_color: Option<String>,
    /// `{"draw": true}` draws one card and passes the turn.
    #[serde(default)]
    draw: Option<bool>,
}

impl Uno {
    pub fn new(players: &[PlayerId], mode: &str) -> Self {
        let mut deck = build_deck();
        deck.shuffle(&mut rand::rng());

        let mut hands: HashMap<PlayerId, Vec<Card>> = HashMap::new();
        for p in players {
            let hand = deck.split_off(deck.len() - HAND_SIZE);
            hands.insert(p.clone(), hand);
        }
        // The opening top card must not be wild, or there is no color in
        // effect; take the first non-wild from the top of the pile.
        let start_pos = deck
            .iter()
            .rposition(|c| !c.is_wild())
            .unwrap_or(deck.len() - 1);
        let start = deck.remove(start_pos);
        let current_color = start.color.clone();

        Self {
            players: players.to_vec(),
            game_mode: mode.to_owned(),
            hands,
            deck,
            discard: vec![start],
            current_color,
            turn: 0,
            direction: 1,
            winner: String::new(),
            game_over: false,
        }
    }

    fn top(&self) -> &Card {
        // The discard pile is never empty after construction.
        &self.discard[self.discard.len() - 1]
    }

    fn seat_after(&self, seat: usize, steps: usize) -> usize {
        let n = self.players.len() as i64;
        let mut s = seat as i64;
        s += self.direction as i64 * steps as i64;
        s.rem_euclid(n) as usize
    }

    fn maybe_reshuffle(&mut self) {
        if self.deck.len() >= RESHUFFLE_AT || self.discard.len() <= 1 {
            return;
        }
        let top = self.discard.pop();
        self.deck.append(&mut self.discard);
        self.deck.shuffle(&mut rand::rng());
        self.discard.extend(top);
    }

    fn draw_cards(&mut self, seat: usize, n: usize) {
        for _ in 0..n {
            self.maybe_reshuffle();
            let Some(card) = self.deck.pop() else {
                // Both piles exhausted; skip the draw rather than block.
                return;
            };
            let player = self.players[seat].clone();
            if let Some(hand) = self.hands.get_mut(&player) {
                hand.push(card);
            }
        }
    }
}

impl GameEngine for Uno {
    fn apply_move(
        &mut self,
        player: &PlayerId,
        data: &Map<String, Value>,
    ) -> Result<Applied, EngineError> {
        if self.game_over {
            return Err(EngineError::AlreadyOver);
        }
        let mv: UnoMove = decode_move(data)?;
        let idx = player_index(&self.players, player)?;
        if idx != self.turn {
            return Err(EngineError::NotYourTurn);
        }

        if mv.draw == Some(true) {
            self.draw_cards(idx, 1);
            self.turn = self.seat_after(idx, 1);
            return Ok(Applied::plain());
        }

        let card_idx = mv.card_idx.ok_or_else(|| {
            EngineError::Validation(
                "Provide card_idx, or draw: true".to_owned(),
            )
        })?;
        let hand = self.hands.get(player).cloned().unwrap_or_default();
        let card = hand.get(card_idx).cloned().ok_or_else(|| {
            EngineError::Illegal("No such card in your hand".to_owned())
        })?;
        let playable = card.is_wild()
            || card.color == self.current_color
            || card.value == self.top().value;
        if !playable {
            return Err(EngineError::Illegal(
                "Card does not match the current color or value".to_owned(),
            ));
        }
        let chosen = if card.is_wild() {
            let color = mv.chosen_color.as_deref().unwrap_or("red");
            if !COLORS.contains(&color) {
                return Err(EngineError::Validation(
                    "Chosen color must be red, yellow, green or blue"
                        .to_owned(),
                ));
            }
            Some(color.to_owned())
        } else {
            None
        };

        // Validation complete; mutate.
        let hand = self
            .hands
            .get_mut(player)
            .expect("player hand exists after index check");
        let played = hand.remove(card_idx);
        let went_out = hand.is_empty();
        self.current_color = chosen.unwrap_or_else(|| played.color.clone());
        let value = played.value.clone();
        self.discard.push(played);

        if went_out {
            self.winner = player.0.clone();
            self.game_over = true;
            return Ok(Applied::plain());
        }

        let two_players = self.players.len() == 2;
        match value.as_str() {
            "skip" => self.turn = self.seat_after(idx, 2),
            "reverse" => {
                self.direction = -self.direction;
                // With two players a reverse skips the opponent.
                let steps = if two_players { 2 } else { 1 };
                self.turn = self.seat_after(idx, steps);
            }
            "draw2" => {
                let next = self.seat_after(idx, 1);
                self.draw_cards(next, 2);
                self.turn = self.seat_after(idx, 2);
            }
            "wild4" => {
                let next = self.seat_after(idx, 1);
                self.draw_cards(next, 4);
                self.turn = self.seat_after(idx, 2);
            }
            _ => self.turn = self.seat_after(idx, 1),
        }
        Ok(Applied::plain())
    }

    fn snapshot(&self) -> Value {
        // Hands are part of the shared snapshot — clients filter locally.
        // The draw pile stays hidden; only its size is public.
        json!({
            "players": self.players,
            "game_mode": self.game_mode,
            "hands": self.hands,
            "deck_count": self.deck.len(),
            "discard_count": self.discard.len(),
            "top_card": self.top(),
            "current_color": self.current_color,
            "turn": self.turn,
            "direction": self.direction,
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
