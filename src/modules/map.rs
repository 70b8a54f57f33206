use std::fmt;

use serde::{Deserialize, Serialize};

use crate::modules::constants::Halite;
use crate::modules::position::{Direction, Position};
use crate::modules::unit::{Unit, UnitId};

/// What the decision core needs to know about the board.
///
/// `navigate` is allowed to mutate the view: the naive navigator reserves the
/// cell it steps into so later ships in the same turn see it as occupied.
pub trait MapView {
    fn halite_at(&self, position: Position) -> Halite;
    fn is_occupied(&self, position: Position) -> bool;
    fn distance(&self, a: Position, b: Position) -> u32;
    fn normalize(&self, position: Position) -> Position;
    fn navigate(&mut self, unit: &Unit, target: Position) -> Direction;
    /// Marks `position` as taken by `unit` for the rest of the turn.
    fn reserve(&mut self, position: Position, unit: UnitId);

    fn neighbor(&self, position: Position, direction: Direction) -> Position {
        self.normalize(position.directional_offset(direction))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureKind {
    Shipyard,
    Dropoff,
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureKind::Shipyard => write!(f, "shipyard"),
            StructureKind::Dropoff => write!(f, "dropoff"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MapCell {
    pub halite: Halite,
    pub occupant: Option<UnitId>,
    pub structure: Option<StructureKind>,
}

/// Toroidal halite grid as reported by the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameMap {
    width: i32,
    height: i32,
    cells: Vec<MapCell>,
}

impl GameMap {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            cells: vec![MapCell::default(); (width * height) as usize],
        }
    }

    /// Builds a map from row-major halite values. Rows shorter than the first
    /// one are padded with empty cells.
    pub fn from_rows(rows: &[Vec<Halite>]) -> Self {
        let height = rows.len() as i32;
        let width = rows.first().map(|r| r.len()).unwrap_or(0) as i32;
        let mut map = GameMap::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, halite) in row.iter().enumerate().take(map.width as usize) {
                map.set_halite(Position::new(x as i32, y as i32), *halite);
            }
        }
        map
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn index(&self, position: Position) -> usize {
        let p = self.normalize(position);
        (p.y * self.width + p.x) as usize
    }

    pub fn cell(&self, position: Position) -> &MapCell {
        &self.cells[self.index(position)]
    }

    pub fn cell_mut(&mut self, position: Position) -> &mut MapCell {
        let idx = self.index(position);
        &mut self.cells[idx]
    }

    pub fn set_halite(&mut self, position: Position, halite: Halite) {
        self.cell_mut(position).halite = halite;
    }

    pub fn set_structure(&mut self, position: Position, kind: StructureKind) {
        self.cell_mut(position).structure = Some(kind);
    }

    pub fn mark_unsafe(&mut self, position: Position, unit: UnitId) {
        self.cell_mut(position).occupant = Some(unit);
    }

    /// Forgets every ship position; called before each frame is applied.
    pub fn clear_occupancy(&mut self) {
        for cell in &mut self.cells {
            cell.occupant = None;
        }
    }

    pub fn total_halite(&self) -> u64 {
        self.cells.iter().map(|c| c.halite as u64).sum()
    }

    /// Directions that shorten the wrapped distance to `destination`, x axis
    /// first. Empty when already there.
    pub fn unsafe_moves(&self, source: Position, destination: Position) -> Vec<Direction> {
        let source = self.normalize(source);
        let destination = self.normalize(destination);
        let dx = (destination.x - source.x).abs();
        let dy = (destination.y - source.y).abs();
        let mut moves = Vec::with_capacity(2);

        if dx != 0 {
            let toward = if destination.x > source.x {
                Direction::East
            } else {
                Direction::West
            };
            moves.push(if dx < self.width - dx { toward } else { invert(toward) });
        }
        if dy != 0 {
            let toward = if destination.y > source.y {
                Direction::South
            } else {
                Direction::North
            };
            moves.push(if dy < self.height - dy { toward } else { invert(toward) });
        }
        moves
    }
}

fn invert(direction: Direction) -> Direction {
    match direction {
        Direction::North => Direction::South,
        Direction::South => Direction::North,
        Direction::East => Direction::West,
        Direction::West => Direction::East,
        Direction::Still => Direction::Still,
    }
}

impl MapView for GameMap {
    fn halite_at(&self, position: Position) -> Halite {
        self.cell(position).halite
    }

    fn is_occupied(&self, position: Position) -> bool {
        self.cell(position).occupant.is_some()
    }

    fn distance(&self, a: Position, b: Position) -> u32 {
        let a = self.normalize(a);
        let b = self.normalize(b);
        let dx = (a.x - b.x).abs();
        let dy = (a.y - b.y).abs();
        (dx.min(self.width - dx) + dy.min(self.height - dy)) as u32
    }

    fn normalize(&self, position: Position) -> Position {
        Position {
            x: position.x.rem_euclid(self.width),
            y: position.y.rem_euclid(self.height),
        }
    }

    fn navigate(&mut self, unit: &Unit, target: Position) -> Direction {
        for direction in self.unsafe_moves(unit.position, target) {
            let next = self.neighbor(unit.position, direction);
            if !self.is_occupied(next) {
                self.mark_unsafe(next, unit.id);
                return direction;
            }
        }
        Direction::Still
    }

    fn reserve(&mut self, position: Position, unit: UnitId) {
        self.mark_unsafe(position, unit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ship(id: UnitId, x: i32, y: i32) -> Unit {
        Unit {
            id,
            position: Position::new(x, y),
            cargo: 0,
        }
    }

    #[test]
    fn coordinates_wrap_around_edges() {
        let map = GameMap::new(8, 6);
        assert_eq!(map.normalize(Position::new(-1, -1)), Position::new(7, 5));
        assert_eq!(map.normalize(Position::new(8, 6)), Position::new(0, 0));
        assert_eq!(
            map.neighbor(Position::new(0, 0), Direction::North),
            Position::new(0, 5)
        );
    }

    #[test]
    fn distance_takes_the_short_way_round() {
        let map = GameMap::new(10, 10);
        assert_eq!(map.distance(Position::new(0, 0), Position::new(9, 0)), 1);
        assert_eq!(map.distance(Position::new(1, 1), Position::new(4, 3)), 5);
        assert_eq!(map.distance(Position::new(0, 0), Position::new(5, 5)), 10);
    }

    #[test]
    fn navigate_prefers_x_axis_then_y() {
        let mut map = GameMap::new(10, 10);
        let unit = ship(1, 2, 2);
        let direction = map.navigate(&unit, Position::new(4, 5));
        assert_eq!(direction, Direction::East);
        assert!(map.is_occupied(Position::new(3, 2)));
    }

    #[test]
    fn navigate_wraps_when_shorter() {
        let mut map = GameMap::new(10, 10);
        let unit = ship(1, 1, 0);
        assert_eq!(map.navigate(&unit, Position::new(8, 0)), Direction::West);
    }

    #[test]
    fn navigate_falls_through_to_second_axis_when_blocked() {
        let mut map = GameMap::new(10, 10);
        map.mark_unsafe(Position::new(3, 2), 9);
        let unit = ship(1, 2, 2);
        assert_eq!(map.navigate(&unit, Position::new(4, 5)), Direction::South);
    }

    #[test]
    fn navigate_stays_when_boxed_in_or_arrived() {
        let mut map = GameMap::new(10, 10);
        let unit = ship(1, 2, 2);
        assert_eq!(map.navigate(&unit, unit.position), Direction::Still);

        map.mark_unsafe(Position::new(3, 2), 7);
        assert_eq!(map.navigate(&unit, Position::new(3, 2)), Direction::Still);
    }

    #[test]
    fn from_rows_reads_row_major() {
        let map = GameMap::from_rows(&[vec![1, 2, 3], vec![4, 5, 6]]);
        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 2);
        assert_eq!(map.halite_at(Position::new(2, 1)), 6);
        assert_eq!(map.total_halite(), 21);
    }
}
