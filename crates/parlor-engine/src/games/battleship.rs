//! Battleship: two players trade shots on 10×10 grids.
//!
//! Fleet placement is internal to the engine — a random non-overlapping
//! fleet (lengths 5, 4, 3, 3, 2) is laid out for each player at start, so
//! the wire protocol only ever carries shots. Ship positions never appear
//! in snapshots; clients see the shot map (`hit` / `miss`) and the count
//! of surviving ship cells.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use parlor_protocol::PlayerId;

use crate::{
    decode_move, player_index, to_snapshot, Applied, EngineError, GameEngine,
};

/// Board side length.
const GRID: usize = 10;

/// Ship lengths placed for each player.
const FLEET: [usize; 5] = [5, 4, 3, 3, 2];

#[derive(Debug, Clone, Serialize)]
pub struct Battleship {
    players: Vec<PlayerId>,
    game_mode: String,
    /// `shots[i][y][x]` — the shot map over player `i`'s grid:
    /// `""`, `"hit"` or `"miss"`.
    shots: Vec<Vec<Vec<String>>>,
    /// Unhit ship cells per player.
    remaining: Vec<usize>,
    turn: usize,
    winner: String,
    game_over: bool,
    /// Own-fleet cells per player; server-side only.
    #[serde(skip)]
    ships: Vec<HashSet<(usize, usize)>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Shot {
    x: usize,
    y: usize,
}

fn place_fleet(rng: &mut impl Rng) -> HashSet<(usize, usize)> {
    let mut cells = HashSet::new();
    for &len in FLEET.iter() {
        loop {
            let horizontal = rng.random_bool(0.5);
            let (x, y) = if horizontal {
                (rng.random_range(0..=GRID - len), rng.random_range(0..GRID))
            } else {
                (rng.random_range(0..GRID), rng.random_range(0..=GRID - len))
            };
            let ship: Vec<(usize, usize)> = (0..len)
                .map(|i| if horizontal { (x + i, y) } else { (x, y + i) })
                .collect();
            if ship.iter().all(|c| !cells.contains(c)) {
                cells.extend(ship);
                break;
            }
        }
    }
    cells
}

impl Battleship {
    pub fn new(players: &[PlayerId], mode: &str) -> Self {
        let mut rng = rand::rng();
        let ships: Vec<HashSet<(usize, usize)>> =
            (0..2).map(|_| place_fleet(&mut rng)).collect();
        let remaining = ships.iter().map(HashSet::len).collect();
        Self {
            players: players.to_vec(),
            game_mode: mode.to_owned(),
            shots: vec![vec![vec![String::new(); GRID]; GRID]; 2],
            remaining,
            turn: 0,
            winner: String::new(),
            game_over: false,
            ships,
        }
    }

    /// Test hook: replaces both fleets with fixed cells.
    #[cfg(test)]
    fn with_fleets(
        players: &[PlayerId],
        fleets: [Vec<(usize, usize)>; 2],
    ) -> Self {
        let mut g = Self::new(players, "classic");
        g.ships = fleets.iter().map(|f| f.iter().copied().collect()).collect();
        g.remaining = g.ships.iter().map(HashSet::len).collect();
        g
    }
}

impl GameEngine for Battleship {
    fn apply_move(
        &mut self,
        player: &PlayerId,
        data: &Map<String, Value>,
    ) -> Result<Applied, EngineError> {
        if self.game_over {
            return Err(EngineError::AlreadyOver);
        }
        let shot: Shot = decode_move(data)?;
        let idx = player_index(&self.players, player)?;
        if idx != self.turn {
            return Err(EngineError::NotYourTurn);
        }
        if shot.x >= GRID || shot.y >= GRID {
            return Err(EngineError::Illegal(
                "Shot is off the board".to_owned(),
            ));
        }
        let target = 1 - idx;
        if !self.shots[target][shot.y][shot.x].is_empty() {
            return Err(EngineError::Illegal(
                "Cell already targeted".to_owned(),
            ));
        }

        if self.ships[target].contains(&(shot.x, shot.y)) {
            self.shots[target][shot.y][shot.x] = "hit".to_owned();
            self.remaining[target] -= 1;
            if self.remaining[target] == 0 {
                self.winner = player.0.clone();
                self.game_over = true;
            }
        } else {
            self.shots[target][shot.y][shot.x] = "miss".to_owned();
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
