//! Hangman: two players alternate guessing letters of a hidden word.
//!
//! Six wrong guesses hang everyone — the word is revealed and the winner
//! sentinel is `"lose"`. Completing the word wins it for whoever guessed
//! the final letter. The word itself never appears in a snapshot until
//! the game ends.

use rand::prelude::IndexedRandom;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use parlor_protocol::PlayerId;

use crate::content::HANGMAN_WORDS;
use crate::{
    decode_move, player_index, to_snapshot, Applied, EngineError, GameEngine,
};

/// Wrong guesses before the word is lost.
const MAX_WRONGS: u8 = 6;

#[derive(Debug, Clone, Serialize)]
pub struct Hangman {
    players: Vec<PlayerId>,
    game_mode: String,
    /// The word with unguessed letters as `_`, e.g. `"_A_G_"`.
    masked: String,
    /// Guessed letters in guess order (uppercase, single chars).
    guessed: Vec<String>,
    wrong_count: u8,
    max_wrongs: u8,
    turn: usize,
    winner: String,
    game_over: bool,
    /// Populated only once the game ends.
    revealed_word: Option<String>,
    #[serde(skip)]
    word: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HangmanMove {
    letter: String,
}

impl Hangman {
    pub fn new(players: &[PlayerId], mode: &str) -> Self {
        let word = HANGMAN_WORDS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or("PARLOR")
            .to_owned();
        Self {
            players: players.to_vec(),
            game_mode: mode.to_owned(),
            masked: "_".repeat(word.len()),
            guessed: Vec::new(),
            wrong_count: 0,
            max_wrongs: MAX_WRONGS,
            turn: 0,
            winner: String::new(),
            game_over: false,
            revealed_word: None,
            word,
        }
    }

    /// Test hook: fixes the word instead of drawing one.
    #[cfg(test)]
    fn with_word(players: &[PlayerId], word: &str) -> Self {
        let mut g = Self::new(players, "classic");
        g.word = word.to_owned();
        g.masked = "_".repeat(word.len());
        g
    }

    fn reveal(&mut self, letter: char) {
        let masked: String = self
            .word
            .chars()
            .zip(self.masked.chars())
            .map(|(w, m)| if w == letter { w } else { m })
            .collect();
        self.masked = masked;
    }

    fn finish(&mut self, winner: String) {
        self.winner = winner;
        self.game_over = true;
        self.masked = self.word.clone();
        self.revealed_word = Some(self.word.clone());
    }
}

impl GameEngine for Hangman {
    fn apply_move(
        &mut self,
        player: &PlayerId,
        data: &Map<String, Value>,
    ) -> Result<Applied, EngineError> {
        if self.game_over {
            return Err(EngineError::AlreadyOver);
        }
        let mv: HangmanMove = decode_move(data)?;
        let idx = player_index(&self.players, player)?;
        if idx != self.turn {
            return Err(EngineError::NotYourTurn);
        }
        let mut chars = mv.letter.chars();
        let letter = match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => {
                c.to_ascii_uppercase()
            }
            _ => {
                return Err(EngineError::Illegal(
                    "Guess a single letter A-Z".to_owned(),
                ))
            }
        };
        if self.guessed.iter().any(|g| g == &letter.to_string()) {
            return Err(EngineError::Duplicate(
                "Letter already guessed".to_owned(),
            ));
        }

        self.guessed.push(letter.to_string());
        if self.word.contains(letter) {
            self.reveal(letter);
            if !self.masked.contains('_') {
                self.finish(player.0.clone());
            }
        } else {
            self.wrong_count += 1;
            if self.wrong_count >= self.max_wrongs {
                self.finish("lose".to_owned());
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

    fn guess(letter: &str) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("letter".to_owned(), letter.into());
        m
    }

    #[test]
    fn test_correct_guess_reveals_all_occurrences() {
        let mut g = Hangman::with_word(&[pid("a"), pid("b")], "BANANA");
        g.apply_move(&pid("a"), &guess("a")).unwrap();
        let snap = g.snapshot();
        assert_eq!(snap["masked"], "_A_A_A");
        assert_eq!(snap["wrong_count"], 0);
    }

    #[test]
    fn test_turn_alternates_after_correct_and_wrong_guesses() {
        let mut g = Hangman::with_word(&[pid("a"), pid("b")], "BANANA");
        g.apply_move(&pid("a"), &guess("A")).unwrap();
        // Correct guess still passes the turn.
        let err = g.apply_move(&pid("a"), &guess("B")).unwrap_err();
        assert_eq!(err, EngineError::NotYourTurn);
        g.apply_move(&pid("b"), &guess("Z")).unwrap();
        // Wrong guess passes it back.
        let err = g.apply_move(&pid("b"), &guess("B")).unwrap_err();
        assert_eq!(err, EngineError::NotYourTurn);
    }

    #[test]
    fn test_duplicate_letter_rejected() {
        let mut g = Hangman::with_word(&[pid("a"), pid("b")], "BANANA");
        g.apply_move(&pid("a"), &guess("A")).unwrap();
        let err = g.apply_move(&pid("b"), &guess("a")).unwrap_err();
        assert!(matches!(err, EngineError::Duplicate(_)));
    }

    #[test]
    fn test_multi_char_guess_rejected() {
        let mut g = Hangman::with_word(&[pid("a"), pid("b")], "BANANA");
        let err = g.apply_move(&pid("a"), &guess("AB")).unwrap_err();
        assert!(matches!(err, EngineError::Illegal(_)));
        let err = g.apply_move(&pid("a"), &guess("7")).unwrap_err();
        assert!(matches!(err, EngineError::Illegal(_)));
    }

    #[test]
    fn test_full_reveal_wins_for_final_guesser() {
        let mut g = Hangman::with_word(&[pid("a"), pid("b")], "AB");
        g.apply_move(&pid("a"), &guess("A")).unwrap();
        g.apply_move(&pid("b"), &guess("B")).unwrap();
        assert!(g.is_over());
        assert_eq!(g.winner(), "b");
        assert_eq!(g.snapshot()["revealed_word"], "AB");
    }

    #[test]
    fn test_six_wrongs_reveals_word_and_everyone_loses() {
        let mut g = Hangman::with_word(&[pid("a"), pid("b")], "XYZZY");
        for (p, l) in [
            ("a", "A"),
            ("b", "B"),
            ("a", "C"),
            ("b", "D"),
            ("a", "E"),
            ("b", "F"),
        ] {
            g.apply_move(&pid(p), &guess(l)).unwrap();
        }
        assert!(g.is_over());
        assert_eq!(g.winner(), "lose");
        assert_eq!(g.snapshot()["masked"], "XYZZY");
    }

    #[test]
    fn test_word_hidden_until_game_over() {
        let g = Hangman::with_word(&[pid("a"), pid("b")], "SECRET");
        let snap = g.snapshot();
        assert!(snap.get("word").is_none());
        assert!(snap["revealed_word"].is_null());
    }

    #[test]
    fn test_moves_after_game_over_rejected() {
        let mut g = Hangman::with_word(&[pid("a"), pid("b")], "AB");
        g.apply_move(&pid("a"), &guess("A")).unwrap();
        g.apply_move(&pid("b"), &guess("B")).unwrap();
        let err = g.apply_move(&pid("a"), &guess("C")).unwrap_err();
        assert_eq!(err, EngineError::AlreadyOver);
    }
}
