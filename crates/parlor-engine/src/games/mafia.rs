//! Mafia: hidden roles, night kills, day discussion, lynch votes.
//!
//! Roles scale with the table: one mafioso for 3–5 players, two for 6–8,
//! three for nine or more, plus one doctor and one detective; everyone
//! else is a villager. Phases cycle `night → day → lynch → night`.
//!
//! Night resolves once every living mafioso has cast a kill vote and the
//! doctor and detective (while alive) have acted. The mafia's target is
//! the plurality of their votes (a tie spares everyone), and a doctor
//! save on the same head cancels the kill. The first `vote` during the
//! day opens the lynch; the lynch resolves when every living player has
//! voted, eliminating the plurality target (ties lynch no one).
//!
//! Villagers win when the mafia are gone; the mafia win at parity.
//!
//! Snapshots are full-information (roles included) — the engine's
//! authority is about move legality, not information hiding; clients
//! filter what they show. Players who joined the room after the deal have
//! no role and every action of theirs is rejected.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use parlor_protocol::PlayerId;

use crate::{decode_move, Applied, EngineError, GameEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Role {
    Mafia,
    Doctor,
    Detective,
    Villager,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Phase {
    Night,
    Day,
    Lynch,
}

/// Mafiosi for a table of `n`.
fn mafia_count(n: usize) -> usize {
    match n {
        0..=5 => 1,
        6..=8 => 2,
        _ => 3,
    }
}

#[derive(Debug, Clone)]
pub struct Mafia {
    players: Vec<PlayerId>,
    game_mode: String,
    roles: HashMap<PlayerId, Role>,
    alive: Vec<PlayerId>,
    phase: Phase,
    /// 1-based day counter; increments when a lynch closes the day.
    day: u32,
    kill_votes: HashMap<PlayerId, PlayerId>,
    save_target: Option<PlayerId>,
    investigate_target: Option<PlayerId>,
    lynch_votes: HashMap<PlayerId, PlayerId>,
    last_killed: Option<PlayerId>,
    last_lynched: Option<PlayerId>,
    /// `(target, was_mafia)` from the previous night.
    last_investigation: Option<(PlayerId, bool)>,
    winner: String,
    game_over: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MafiaMove {
    action: String,
    target: String,
}

impl Mafia {
    pub fn new(players: &[PlayerId], mode: &str) -> Self {
        let mut order: Vec<PlayerId> = players.to_vec();
        order.shuffle(&mut rand::rng());

        let mut roles = HashMap::new();
        for (i, p) in order.iter().enumerate() {
            let role = if i < mafia_count(players.len()) {
                Role::Mafia
            } else if i == mafia_count(players.len()) {
                Role::Doctor
            } else if i == mafia_count(players.len()) + 1 {
                Role::Detective
            } else {
                Role::Villager
            };
            roles.insert(p.clone(), role);
        }

        Self {
            players: players.to_vec(),
            game_mode: mode.to_owned(),
            roles,
            alive: players.to_vec(),
            phase: Phase::Night,
            day: 1,
            kill_votes: HashMap::new(),
            save_target: None,
            investigate_target: None,
            lynch_votes: HashMap::new(),
            last_killed: None,
            last_lynched: None,
            last_investigation: None,
            winner: String::new(),
            game_over: false,
        }
    }

    fn is_alive(&self, p: &PlayerId) -> bool {
        self.alive.contains(p)
    }

    fn living_with_role(&self, role: Role) -> Vec<&PlayerId> {
        self.alive
            .iter()
            .filter(|p| self.roles.get(*p) == Some(&role))
            .collect()
    }

    fn mafia_alive(&self) -> usize {
        self.living_with_role(Role::Mafia).len()
    }

    /// Plurality target of a vote map; ties elect no one.
    fn plurality(votes: &HashMap<PlayerId, PlayerId>) -> Option<PlayerId> {
        let mut tally: HashMap<&PlayerId, usize> = HashMap::new();
        for target in votes.values() {
            *tally.entry(target).or_insert(0) += 1;
        }
        let best = tally.values().copied().max()?;
        let mut top = tally.iter().filter(|(_, &n)| n == best);
        match (top.next(), top.next()) {
            (Some((target, _)), None) => Some((*target).clone()),
            _ => None,
        }
    }

    fn night_complete(&self) -> bool {
        let mafia_done = self
            .living_with_role(Role::Mafia)
            .iter()
            .all(|m| self.kill_votes.contains_key(*m));
        let doctor_done = self.living_with_role(Role::Doctor).is_empty()
            || self.save_target.is_some();
        let detective_done =
            self.living_with_role(Role::Detective).is_empty()
                || self.investigate_target.is_some();
        mafia_done && doctor_done && detective_done
    }

    fn resolve_night(&mut self) {
        let kill = Self::plurality(&self.kill_votes);
        self.last_killed = match (&kill, &self.save_target) {
            (Some(k), Some(s)) if k == s => None, // the doctor got there
            (Some(k), _) => {
                self.alive.retain(|p| p != k);
                Some(k.clone())
            }
            (None, _) => None,
        };
        self.last_investigation = self.investigate_target.take().map(|t| {
            let was_mafia = self.roles.get(&t) == Some(&Role::Mafia);
            (t, was_mafia)
        });
        self.kill_votes.clear();
        self.save_target = None;
        self.check_win();
        if !self.game_over {
            self.phase = Phase::Day;
        }
    }

    fn resolve_lynch(&mut self) {
        let target = Self::plurality(&self.lynch_votes);
        if let Some(t) = &target {
            self.alive.retain(|p| p != t);
        }
        self.last_lynched = target;
        self.lynch_votes.clear();
        self.check_win();
        if !self.game_over {
            self.phase = Phase::Night;
            self.day += 1;
        }
    }

    fn check_win(&mut self) {
        let mafia = self.mafia_alive();
        if mafia == 0 {
            self.winner = "villagers".to_owned();
            self.game_over = true;
        } else if mafia >= self.alive.len() - mafia {
            self.winner = "mafia".to_owned();
            self.game_over = true;
        }
    }
}

impl GameEngine for Mafia {
    fn apply_move(
        &mut self,
        player: &PlayerId,
        data: &Map<String, Value>,
    ) -> Result<Applied, EngineError> {
        if self.game_over {
            return Err(EngineError::AlreadyOver);
        }
        let mv: MafiaMove = decode_move(data)?;
        let Some(role) = self.roles.get(player).copied() else {
            // Covers both outsiders and players who joined after the deal.
            return Err(EngineError::Validation(
                "You have no role in this game".to_owned(),
            ));
        };
        if !self.is_alive(player) {
            return Err(EngineError::Validation(
                "Dead players cannot act".to_owned(),
            ));
        }
        let target = PlayerId(mv.target);
        if !self.is_alive(&target) {
            return Err(EngineError::Illegal(
                "Target is not alive".to_owned(),
            ));
        }

        match (self.phase, mv.action.as_str()) {
            (Phase::Night, "kill") => {
                if role != Role::Mafia {
                    return Err(EngineError::Illegal(
                        "Only the mafia can kill".to_owned(),
                    ));
                }
                if self.kill_votes.contains_key(player) {
                    return Err(EngineError::Duplicate(
                        "Kill vote already recorded".to_owned(),
                    ));
                }
                self.kill_votes.insert(player.clone(), target);
            }
            (Phase::Night, "save") => {
                if role != Role::Doctor {
                    return Err(EngineError::Illegal(
                        "Only the doctor can save".to_owned(),
                    ));
                }
                if self.save_target.is_some() {
                    return Err(EngineError::Duplicate(
                        "Save already recorded".to_owned(),
                    ));
                }
                self.save_target = Some(target);
            }
            (Phase::Night, "investigate") => {
                if role != Role::Detective {
                    return Err(EngineError::Illegal(
                        "Only the detective can investigate".to_owned(),
                    ));
                }
                if self.investigate_target.is_some() {
                    return Err(EngineError::Duplicate(
                        "Investigation already recorded".to_owned(),
                    ));
                }
                self.investigate_target = Some(target);
            }
            (Phase::Night, "vote") => {
                return Err(EngineError::Illegal(
                    "Voting happens during the day".to_owned(),
                ));
            }
            (Phase::Day, "vote") => {
                // The first vote opens the lynch.
                self.phase = Phase::Lynch;
                self.lynch_votes.insert(player.clone(), target);
            }
            (Phase::Lynch, "vote") => {
                if self.lynch_votes.contains_key(player) {
                    return Err(EngineError::Duplicate(
                        "Vote already recorded".to_owned(),
                    ));
                }
                self.lynch_votes.insert(player.clone(), target);
            }
            (Phase::Day | Phase::Lynch, "kill" | "save" | "investigate") => {
                return Err(EngineError::Illegal(
                    "Night actions are only possible at night".to_owned(),
                ));
            }
            (_, other) => {
                return Err(EngineError::Validation(format!(
                    "Unknown action: {other}"
                )));
            }
        }

        match self.phase {
            Phase::Night => {
                if self.night_complete() {
                    self.resolve_night();
                }
            }
            Phase::Lynch => {
                if self.lynch_votes.len() >= self.alive.len() {
                    self.resolve_lynch();
                }
            }
            Phase::Day => {}
        }
        Ok(Applied::plain())
    }

    fn snapshot(&self) -> Value {
        json!({
            "players": self.players,
            "game_mode": self.game_mode,
            "roles": self.roles,
            "alive": self.alive,
            "phase": self.phase,
            "day": self.day,
            "mafia_alive": self.mafia_alive(),
            "lynch_votes": self.lynch_votes,
            "last_killed": self.last_killed,
            "last_lynched": self.last_lynched,
            "last_investigation": self.last_investigation.as_ref().map(
                |(t, was_mafia)| json!({
                    "target": t,
                    "was_mafia": was_mafia,
                }),
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
