use std::collections::HashSet;

use crate::modules::map::MapView;
use crate::modules::position::{Direction, Position};

/// Destinations already taken by ships decided earlier in the same turn.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClaimedDestinations {
    cells: HashSet<Position>,
}

impl ClaimedDestinations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, position: Position) -> bool {
        self.cells.contains(&position)
    }

    /// Returns false if the cell was already claimed.
    pub fn claim(&mut self, position: Position) -> bool {
        self.cells.insert(position)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.cells.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellChoice {
    pub direction: Direction,
    pub destination: Position,
    /// `None` when every candidate was claimed and the scorer fell back to
    /// staying put.
    pub score: Option<u64>,
}

/// Picks the most valuable of the five reachable cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellScorer {
    stay_bias: u32,
}

impl CellScorer {
    pub fn new(stay_bias: u32) -> Self {
        Self { stay_bias }
    }

    /// Scores indexed by `Direction::index()`. Claimed cells score `None`.
    pub fn score<M: MapView>(
        &self,
        position: Position,
        map: &M,
        claimed: &ClaimedDestinations,
    ) -> [Option<u64>; 5] {
        let mut scores = [None; 5];
        for direction in Direction::ALL {
            let target = map.neighbor(position, direction);
            if claimed.contains(target) {
                continue;
            }
            let halite = map.halite_at(target) as u64;
            scores[direction.index()] = Some(match direction {
                Direction::Still => halite * self.stay_bias as u64,
                _ => halite,
            });
        }
        scores
    }

    /// Chooses the strictly best unclaimed cell (first in North, South, East,
    /// West, Still order on ties) and claims it.
    pub fn select<M: MapView>(
        &self,
        position: Position,
        map: &M,
        claimed: &mut ClaimedDestinations,
    ) -> CellChoice {
        let scores = self.score(position, map, claimed);

        let mut best: Option<(Direction, u64)> = None;
        for direction in Direction::ALL {
            let Some(score) = scores[direction.index()] else {
                continue;
            };
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((direction, score)),
            }
        }

        let (direction, score) = match best {
            Some((direction, score)) => (direction, Some(score)),
            None => (Direction::Still, None),
        };
        let destination = map.neighbor(position, direction);
        claimed.claim(destination);

        CellChoice {
            direction,
            destination,
            score,
        }
    }
}
