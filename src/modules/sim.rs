use std::collections::{BTreeMap, HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::modules::constants::{GameConstants, Halite};
use crate::modules::map::{GameMap, MapView, StructureKind};
use crate::modules::position::{Direction, Position};
use crate::modules::turn::{Command, TurnFrame};
use crate::modules::unit::{Unit, UnitId};

/// Starting reserves of a Halite III player.
pub const DEFAULT_STARTING_RESERVES: Halite = 5000;
/// Upper bound of generated halite per cell.
pub const DEFAULT_MAX_CELL_HALITE: Halite = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimSettings {
    pub width: i32,
    pub height: i32,
    pub seed: u64,
    pub max_cell_halite: Halite,
    pub starting_reserves: Halite,
    pub constants: GameConstants,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            width: 32,
            height: 32,
            seed: 0,
            max_cell_halite: DEFAULT_MAX_CELL_HALITE,
            starting_reserves: DEFAULT_STARTING_RESERVES,
            constants: GameConstants::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimEvent {
    TurnStarted {
        turn: u32,
    },
    TurnCompleted {
        turn: u32,
    },
    ShipSpawned {
        unit: UnitId,
        position: Position,
    },
    ShipMoved {
        unit: UnitId,
        from: Position,
        to: Position,
        cost: Halite,
    },
    ShipsCollided {
        units: Vec<UnitId>,
        position: Position,
        cargo_lost: Halite,
    },
    Deposited {
        unit: UnitId,
        amount: Halite,
        position: Position,
    },
    Extracted {
        unit: UnitId,
        amount: Halite,
        position: Position,
    },
    StationBuilt {
        unit: UnitId,
        position: Position,
        cost: Halite,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SimError {
    #[error("ship {0} not found")]
    UnitNotFound(UnitId),
    #[error("ship {0} received more than one command this turn")]
    DuplicateCommand(UnitId),
    #[error("only one spawn is accepted per turn")]
    DuplicateSpawn,
    #[error("insufficient reserves for {action}: required {required}, available {available}")]
    InsufficientReserves {
        action: &'static str,
        required: Halite,
        available: Halite,
    },
    #[error("ship {unit} cannot pay move cost {required} with cargo {available}")]
    InsufficientCargoToMove {
        unit: UnitId,
        required: Halite,
        available: Halite,
    },
    #[error("ship {unit} cannot build a station at {position}: cell already holds a {existing}")]
    StationOccupied {
        unit: UnitId,
        position: Position,
        existing: StructureKind,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    pub command: Command,
    pub error: SimError,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnResult {
    pub turn: u32,
    pub events: Vec<SimEvent>,
    pub rejections: Vec<Rejection>,
}

/// Single-player stand-in for the game engine, used for offline runs.
#[derive(Debug)]
pub struct Sim {
    turn: u32,
    constants: GameConstants,
    map: GameMap,
    ships: BTreeMap<UnitId, Unit>,
    next_unit_id: UnitId,
    shipyard: Position,
    dropoffs: Vec<Position>,
    reserves: Halite,
}

impl Sim {
    /// Generates a seeded halite field with the shipyard in the centre.
    pub fn new(settings: &SimSettings) -> Self {
        let mut rng = StdRng::seed_from_u64(settings.seed);
        let mut map = GameMap::new(settings.width, settings.height);
        let max = settings.max_cell_halite;
        for y in 0..map.height() {
            for x in 0..map.width() {
                // Squaring a uniform roll keeps most cells poor and a few rich.
                let roll = rng.gen_range(0..=max) as u64;
                let halite = roll * roll / max.max(1) as u64;
                map.set_halite(Position::new(x, y), halite as Halite);
            }
        }
        let shipyard = Position::new(map.width() / 2, map.height() / 2);
        Self::with_map(map, shipyard, settings.constants, settings.starting_reserves)
    }

    pub fn with_map(
        mut map: GameMap,
        shipyard: Position,
        constants: GameConstants,
        reserves: Halite,
    ) -> Self {
        let shipyard = map.normalize(shipyard);
        map.clear_occupancy();
        map.set_halite(shipyard, 0);
        map.set_structure(shipyard, StructureKind::Shipyard);
        Self {
            turn: 0,
            constants,
            map,
            ships: BTreeMap::new(),
            next_unit_id: 0,
            shipyard,
            dropoffs: Vec::new(),
            reserves,
        }
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn is_over(&self) -> bool {
        self.turn >= self.constants.max_turns
    }

    pub fn constants(&self) -> &GameConstants {
        &self.constants
    }

    pub fn reserves(&self) -> Halite {
        self.reserves
    }

    pub fn ships(&self) -> impl Iterator<Item = &Unit> {
        self.ships.values()
    }

    pub fn dropoffs(&self) -> &[Position] {
        &self.dropoffs
    }

    pub fn shipyard(&self) -> Position {
        self.shipyard
    }

    pub fn map(&self) -> &GameMap {
        &self.map
    }

    /// Places a ship directly, bypassing the spawn rules.
    pub fn place_ship(&mut self, position: Position, cargo: Halite) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id += 1;
        let position = self.map.normalize(position);
        self.ships.insert(id, Unit { id, position, cargo });
        id
    }

    /// What the engine would send for the upcoming turn: our frame plus a
    /// map with every ship marked.
    pub fn frame(&self) -> (TurnFrame, GameMap) {
        let mut map = self.map.clone();
        for ship in self.ships.values() {
            map.mark_unsafe(ship.position, ship.id);
        }
        let frame = TurnFrame {
            turn: self.turn + 1,
            units: self.ships.values().copied().collect(),
            reserves: self.reserves,
            home: self.shipyard,
            expansion: self.dropoffs.first().copied(),
        };
        (frame, map)
    }

    pub fn step(&mut self, commands: &[Command]) -> TurnResult {
        let turn = self.turn + 1;
        let mut events = vec![SimEvent::TurnStarted { turn }];
        let mut rejections = Vec::new();

        let mut commanded: HashSet<UnitId> = HashSet::new();
        let mut moves: Vec<(UnitId, Direction)> = Vec::new();
        let mut builds: Vec<UnitId> = Vec::new();
        let mut spawn = false;

        for command in commands.iter().copied() {
            let accepted = match command {
                Command::Spawn => {
                    if spawn {
                        Err(SimError::DuplicateSpawn)
                    } else {
                        spawn = true;
                        Ok(())
                    }
                }
                Command::Move { unit, .. } | Command::BuildStation { unit } => {
                    if !self.ships.contains_key(&unit) {
                        Err(SimError::UnitNotFound(unit))
                    } else if !commanded.insert(unit) {
                        Err(SimError::DuplicateCommand(unit))
                    } else {
                        match command {
                            Command::Move { direction, .. } => moves.push((unit, direction)),
                            _ => builds.push(unit),
                        }
                        Ok(())
                    }
                }
            };
            if let Err(error) = accepted {
                rejections.push(Rejection { command, error });
            }
        }

        for unit in builds {
            match self.build_station(unit) {
                Ok(event) => events.push(event),
                Err(error) => rejections.push(Rejection {
                    command: Command::BuildStation { unit },
                    error,
                }),
            }
        }

        let mut moved: HashSet<UnitId> = HashSet::new();
        for (unit, direction) in moves {
            if direction == Direction::Still {
                continue;
            }
            match self.move_ship(unit, direction) {
                Ok(Some(event)) => {
                    moved.insert(unit);
                    events.push(event);
                }
                Ok(None) => {}
                Err(error) => rejections.push(Rejection {
                    command: Command::Move { unit, direction },
                    error,
                }),
            }
        }

        if spawn {
            match self.spawn_ship() {
                Ok((unit, event)) => {
                    moved.insert(unit);
                    events.push(event);
                }
                Err(error) => rejections.push(Rejection {
                    command: Command::Spawn,
                    error,
                }),
            }
        }

        events.append(&mut self.resolve_collisions());
        events.append(&mut self.deposit_and_extract(&moved));
        events.push(SimEvent::TurnCompleted { turn });
        self.turn = turn;

        TurnResult {
            turn,
            events,
            rejections,
        }
    }

    fn build_station(&mut self, unit: UnitId) -> Result<SimEvent, SimError> {
        let ship = *self.ships.get(&unit).ok_or(SimError::UnitNotFound(unit))?;
        let cell = self.map.cell(ship.position);
        if let Some(existing) = cell.structure {
            return Err(SimError::StationOccupied {
                unit,
                position: ship.position,
                existing,
            });
        }

        let cost = self
            .constants
            .expansion_cost
            .saturating_sub(ship.cargo.saturating_add(cell.halite));
        if self.reserves < cost {
            return Err(SimError::InsufficientReserves {
                action: "build_station",
                required: cost,
                available: self.reserves,
            });
        }

        self.reserves -= cost;
        self.ships.remove(&unit);
        self.map.set_halite(ship.position, 0);
        self.map.set_structure(ship.position, StructureKind::Dropoff);
        self.dropoffs.push(ship.position);
        Ok(SimEvent::StationBuilt {
            unit,
            position: ship.position,
            cost,
        })
    }

    fn move_ship(&mut self, unit: UnitId, direction: Direction) -> Result<Option<SimEvent>, SimError> {
        // Ships consumed by a build this turn have nothing left to move.
        let Some(ship) = self.ships.get_mut(&unit) else {
            return Ok(None);
        };
        let cost = self.map.halite_at(ship.position) / self.constants.move_cost_ratio.max(1);
        if ship.cargo < cost {
            return Err(SimError::InsufficientCargoToMove {
                unit,
                required: cost,
                available: ship.cargo,
            });
        }

        let from = ship.position;
        let to = self.map.neighbor(from, direction);
        ship.cargo -= cost;
        ship.position = to;
        Ok(Some(SimEvent::ShipMoved {
            unit,
            from,
            to,
            cost,
        }))
    }

    fn spawn_ship(&mut self) -> Result<(UnitId, SimEvent), SimError> {
        let cost = self.constants.unit_cost;
        if self.reserves < cost {
            return Err(SimError::InsufficientReserves {
                action: "spawn",
                required: cost,
                available: self.reserves,
            });
        }
        self.reserves -= cost;
        let unit = self.place_ship(self.shipyard, 0);
        Ok((
            unit,
            SimEvent::ShipSpawned {
                unit,
                position: self.shipyard,
            },
        ))
    }

    fn resolve_collisions(&mut self) -> Vec<SimEvent> {
        let mut by_cell: HashMap<Position, Vec<UnitId>> = HashMap::new();
        for ship in self.ships.values() {
            by_cell.entry(ship.position).or_default().push(ship.id);
        }

        let mut crashes: Vec<(Position, Vec<UnitId>)> = by_cell
            .into_iter()
            .filter(|(_, units)| units.len() > 1)
            .collect();
        crashes.sort_by_key(|(_, units)| units[0]);

        let mut events = Vec::new();
        for (position, units) in crashes {
            let mut cargo_lost: Halite = 0;
            for unit in &units {
                if let Some(ship) = self.ships.remove(unit) {
                    cargo_lost = cargo_lost.saturating_add(ship.cargo);
                }
            }
            if self.map.cell(position).structure.is_some() {
                self.reserves = self.reserves.saturating_add(cargo_lost);
            } else {
                let cell = self.map.cell_mut(position);
                cell.halite = cell.halite.saturating_add(cargo_lost);
            }
            events.push(SimEvent::ShipsCollided {
                units,
                position,
                cargo_lost,
            });
        }
        events
    }

    fn deposit_and_extract(&mut self, moved: &HashSet<UnitId>) -> Vec<SimEvent> {
        let mut events = Vec::new();
        let max_cargo = self.constants.max_cargo;
        let extract_ratio = self.constants.extract_ratio.max(1);

        for ship in self.ships.values_mut() {
            let cell = self.map.cell_mut(ship.position);
            if cell.structure.is_some() {
                if ship.cargo > 0 {
                    self.reserves = self.reserves.saturating_add(ship.cargo);
                    events.push(SimEvent::Deposited {
                        unit: ship.id,
                        amount: ship.cargo,
                        position: ship.position,
                    });
                    ship.cargo = 0;
                }
                continue;
            }
            if moved.contains(&ship.id) {
                continue;
            }

            let amount = cell
                .halite
                .div_ceil(extract_ratio)
                .min(max_cargo.saturating_sub(ship.cargo));
            if amount > 0 {
                cell.halite -= amount;
                ship.cargo += amount;
                events.push(SimEvent::Extracted {
                    unit: ship.id,
                    amount,
                    position: ship.position,
                });
            }
        }
        events
    }
}
