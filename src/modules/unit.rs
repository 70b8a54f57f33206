use std::collections::HashMap;
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::modules::config::StrategyConfig;
use crate::modules::constants::{GameConstants, Halite};
use crate::modules::map::MapView;
use crate::modules::position::{Direction, Position};
use crate::modules::scorer::{CellScorer, ClaimedDestinations};
use crate::modules::turn::{Command, TurnFrame};

pub type UnitId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub position: Position,
    pub cargo: Halite,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitMode {
    #[default]
    Harvesting,
    Returning,
}

impl fmt::Display for UnitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitMode::Harvesting => write!(f, "harvesting"),
            UnitMode::Returning => write!(f, "returning"),
        }
    }
}

/// Persistent per-ship modes, keyed by ship id.
#[derive(Debug, Default, Clone)]
pub struct ModeStore {
    modes: HashMap<UnitId, UnitMode>,
}

impl ModeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: UnitId) -> Option<UnitMode> {
        self.modes.get(&id).copied()
    }

    /// Mode of `id`, adopting unseen ships as harvesting.
    pub fn ensure(&mut self, id: UnitId) -> UnitMode {
        *self.modes.entry(id).or_default()
    }

    pub fn set(&mut self, id: UnitId, mode: UnitMode) {
        self.modes.insert(id, mode);
    }

    /// Drops entries for ships that no longer appear in the roster.
    pub fn retain_roster(&mut self, roster: &[Unit]) {
        self.modes
            .retain(|id, _| roster.iter().any(|unit| unit.id == *id));
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

/// What a single ship did this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitDecision {
    pub unit: UnitId,
    /// Mode the turn was played in.
    pub mode: UnitMode,
    /// Mode stored for the next turn.
    pub next_mode: UnitMode,
    pub origin: Position,
    /// Cell claimed for this ship.
    pub destination: Position,
    pub command: Option<Command>,
}

pub struct UnitStateMachine<'a> {
    config: &'a StrategyConfig,
    constants: &'a GameConstants,
    scorer: CellScorer,
}

impl<'a> UnitStateMachine<'a> {
    pub fn new(config: &'a StrategyConfig, constants: &'a GameConstants) -> Self {
        Self {
            config,
            constants,
            scorer: CellScorer::new(config.stay_bias),
        }
    }

    /// True once a harvesting ship's cargo reaches the band for `turn`.
    pub fn should_return(&self, cargo: Halite, turn: u32) -> bool {
        let percent = self.config.return_percent(turn) as u64;
        cargo as u64 * 100 >= percent * self.constants.max_cargo as u64
    }

    /// Whether the cargo is large enough, relative to the halite under the
    /// ship, to justify spending a move.
    fn worth_moving(&self, cargo: Halite, halite_here: Halite) -> bool {
        cargo as u64 * 100 >= self.config.min_efficiency_percent as u64 * halite_here as u64
    }

    /// Plays one turn for `unit`: reads its mode, picks and claims a
    /// destination, and stores the mode for the next turn.
    pub fn advance<M: MapView>(
        &self,
        unit: &Unit,
        frame: &TurnFrame,
        modes: &mut ModeStore,
        map: &mut M,
        claimed: &mut ClaimedDestinations,
    ) -> UnitDecision {
        let mode = modes.ensure(unit.id);
        let decision = match mode {
            UnitMode::Returning => self.advance_returning(unit, frame, map, claimed),
            UnitMode::Harvesting => self.advance_harvesting(unit, frame, map, claimed),
        };
        modes.set(unit.id, decision.next_mode);
        decision
    }

    fn advance_returning<M: MapView>(
        &self,
        unit: &Unit,
        frame: &TurnFrame,
        map: &mut M,
        claimed: &mut ClaimedDestinations,
    ) -> UnitDecision {
        let home_distance = map.distance(unit.position, frame.home);
        let target = match frame.expansion {
            Some(station) => {
                let station_distance = map.distance(unit.position, station);
                debug!(
                    "ship {} distances: home={} expansion={}",
                    unit.id, home_distance, station_distance
                );
                if station_distance < home_distance {
                    station
                } else {
                    frame.home
                }
            }
            None => frame.home,
        };

        let direction = map.navigate(unit, target);
        let destination = map.neighbor(unit.position, direction);
        claimed.claim(destination);

        let command = if self.config.is_expansion_turn(frame.turn) {
            None
        } else {
            Some(Command::Move {
                unit: unit.id,
                direction,
            })
        };

        let next_mode = if direction == Direction::Still {
            UnitMode::Harvesting
        } else {
            UnitMode::Returning
        };

        UnitDecision {
            unit: unit.id,
            mode: UnitMode::Returning,
            next_mode,
            origin: unit.position,
            destination,
            command,
        }
    }

    fn advance_harvesting<M: MapView>(
        &self,
        unit: &Unit,
        frame: &TurnFrame,
        map: &mut M,
        claimed: &mut ClaimedDestinations,
    ) -> UnitDecision {
        let choice = self.scorer.select(unit.position, map, claimed);
        let halite_here = map.halite_at(unit.position);

        let command = if !self.config.is_expansion_turn(frame.turn)
            && self.worth_moving(unit.cargo, halite_here)
        {
            let direction = map.navigate(unit, choice.destination);
            Some(Command::Move {
                unit: unit.id,
                direction,
            })
        } else {
            // No navigation ran, so nothing marked the claimed cell.
            map.reserve(choice.destination, unit.id);
            None
        };

        let next_mode = if self.should_return(unit.cargo, frame.turn) {
            UnitMode::Returning
        } else {
            UnitMode::Harvesting
        };

        UnitDecision {
            unit: unit.id,
            mode: UnitMode::Harvesting,
            next_mode,
            origin: unit.position,
            destination: choice.destination,
            command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::map::GameMap;

    fn unit(id: UnitId, x: i32, y: i32, cargo: Halite) -> Unit {
        Unit {
            id,
            position: Position::new(x, y),
            cargo,
        }
    }

    fn frame(turn: u32, units: Vec<Unit>) -> TurnFrame {
        TurnFrame {
            turn,
            units,
            reserves: 0,
            home: Position::new(0, 0),
            expansion: None,
        }
    }

    fn map_with(units: &[Unit]) -> GameMap {
        let mut map = GameMap::new(16, 16);
        for u in units {
            map.mark_unsafe(u.position, u.id);
        }
        map
    }

    #[test]
    fn unseen_ship_is_adopted_as_harvesting() {
        let mut modes = ModeStore::new();
        assert_eq!(modes.get(7), None);
        assert_eq!(modes.ensure(7), UnitMode::Harvesting);
        assert_eq!(modes.get(7), Some(UnitMode::Harvesting));
    }

    #[test]
    fn retain_roster_prunes_departed_ships() {
        let mut modes = ModeStore::new();
        modes.set(1, UnitMode::Returning);
        modes.set(2, UnitMode::Harvesting);

        modes.retain_roster(&[unit(2, 0, 0, 0)]);

        assert_eq!(modes.len(), 1);
        assert_eq!(modes.get(1), None);
    }

    #[test]
    fn return_thresholds_follow_turn_bands() {
        let config = StrategyConfig::default();
        let constants = GameConstants::default();
        let machine = UnitStateMachine::new(&config, &constants);

        // >= 95%: returns in every band.
        assert!(machine.should_return(950, 1));
        assert!(machine.should_return(950, 200));
        assert!(machine.should_return(950, 400));

        // [90%, 95%): only after turn 200.
        assert!(!machine.should_return(920, 200));
        assert!(machine.should_return(900, 201));
        assert!(machine.should_return(949, 350));

        // [80%, 90%): only after turn 350.
        assert!(!machine.should_return(899, 350));
        assert!(machine.should_return(800, 351));
        assert!(!machine.should_return(799, 351));
    }

    #[test]
    fn full_ship_flips_to_returning_for_next_turn_only() {
        let config = StrategyConfig::default();
        let constants = GameConstants::default();
        let machine = UnitStateMachine::new(&config, &constants);
        let ship = unit(1, 5, 5, 960);
        let frame = frame(10, vec![ship]);
        let mut map = map_with(&frame.units);
        let mut modes = ModeStore::new();
        let mut claimed = ClaimedDestinations::new();

        let decision = machine.advance(&ship, &frame, &mut modes, &mut map, &mut claimed);

        assert_eq!(decision.mode, UnitMode::Harvesting);
        assert_eq!(decision.next_mode, UnitMode::Returning);
        assert!(matches!(decision.command, Some(Command::Move { unit: 1, .. })));
        assert_eq!(modes.get(1), Some(UnitMode::Returning));
    }

    #[test]
    fn harvesting_ship_holds_when_cell_still_rich() {
        let config = StrategyConfig::default();
        let constants = GameConstants::default();
        let machine = UnitStateMachine::new(&config, &constants);
        let ship = unit(1, 5, 5, 20);
        let frame = frame(10, vec![ship]);
        let mut map = map_with(&frame.units);
        map.set_halite(ship.position, 300);
        let mut modes = ModeStore::new();
        let mut claimed = ClaimedDestinations::new();

        let decision = machine.advance(&ship, &frame, &mut modes, &mut map, &mut claimed);

        // 20 < 10% of 300: no command, but the chosen cell is still claimed.
        assert_eq!(decision.command, None);
        assert_eq!(decision.destination, ship.position);
        assert!(claimed.contains(ship.position));
    }

    #[test]
    fn harvesting_ship_navigates_toward_richer_neighbor() {
        let config = StrategyConfig::default();
        let constants = GameConstants::default();
        let machine = UnitStateMachine::new(&config, &constants);
        let ship = unit(1, 5, 5, 0);
        let frame = frame(10, vec![ship]);
        let mut map = map_with(&frame.units);
        map.set_halite(Position::new(5, 6), 120);
        let mut modes = ModeStore::new();
        let mut claimed = ClaimedDestinations::new();

        let decision = machine.advance(&ship, &frame, &mut modes, &mut map, &mut claimed);

        assert_eq!(decision.destination, Position::new(5, 6));
        assert_eq!(
            decision.command,
            Some(Command::Move {
                unit: 1,
                direction: Direction::South
            })
        );
    }

    #[test]
    fn returning_ship_heads_for_nearer_station() {
        let config = StrategyConfig::default();
        let constants = GameConstants::default();
        let machine = UnitStateMachine::new(&config, &constants);
        let ship = unit(1, 10, 10, 900);
        let mut frame = frame(100, vec![ship]);
        frame.expansion = Some(Position::new(12, 10));
        let mut map = map_with(&frame.units);
        let mut modes = ModeStore::new();
        modes.set(1, UnitMode::Returning);
        let mut claimed = ClaimedDestinations::new();

        let decision = machine.advance(&ship, &frame, &mut modes, &mut map, &mut claimed);

        assert_eq!(
            decision.command,
            Some(Command::Move {
                unit: 1,
                direction: Direction::East
            })
        );
        assert_eq!(decision.destination, Position::new(11, 10));
        assert_eq!(decision.next_mode, UnitMode::Returning);
    }

    #[test]
    fn equidistant_stations_prefer_home() {
        let config = StrategyConfig::default();
        let constants = GameConstants::default();
        let machine = UnitStateMachine::new(&config, &constants);
        let ship = unit(1, 2, 0, 900);
        let mut frame = frame(100, vec![ship]);
        frame.expansion = Some(Position::new(4, 0));
        let mut map = map_with(&frame.units);
        let mut modes = ModeStore::new();
        modes.set(1, UnitMode::Returning);
        let mut claimed = ClaimedDestinations::new();

        let decision = machine.advance(&ship, &frame, &mut modes, &mut map, &mut claimed);

        assert_eq!(decision.destination, Position::new(1, 0));
    }

    #[test]
    fn return_round_trip_restores_harvesting() {
        let config = StrategyConfig::default();
        let constants = GameConstants::default();
        let machine = UnitStateMachine::new(&config, &constants);
        let mut modes = ModeStore::new();
        modes.set(1, UnitMode::Returning);

        // Turn 1: one step from home, moves onto it.
        let ship = unit(1, 1, 0, 950);
        let first = frame(40, vec![ship]);
        let mut map = map_with(&first.units);
        let mut claimed = ClaimedDestinations::new();
        let decision = machine.advance(&ship, &first, &mut modes, &mut map, &mut claimed);
        assert_eq!(decision.destination, Position::new(0, 0));
        assert_eq!(modes.get(1), Some(UnitMode::Returning));

        // Turn 2: standing on home (cargo deposited), navigation resolves to still.
        let ship = unit(1, 0, 0, 0);
        let second = frame(41, vec![ship]);
        let mut map = map_with(&second.units);
        let mut claimed = ClaimedDestinations::new();
        let decision = machine.advance(&ship, &second, &mut modes, &mut map, &mut claimed);
        assert_eq!(
            decision.command,
            Some(Command::Move {
                unit: 1,
                direction: Direction::Still
            })
        );
        assert_eq!(decision.mode, UnitMode::Returning);
        assert_eq!(modes.get(1), Some(UnitMode::Harvesting));
    }

    #[test]
    fn held_ship_keeps_its_claimed_cell_from_later_navigators() {
        let config = StrategyConfig::default();
        let constants = GameConstants::default();
        let machine = UnitStateMachine::new(&config, &constants);
        let holder = unit(1, 5, 5, 0);
        let returner = unit(2, 7, 5, 900);
        let frame = frame(30, vec![holder, returner]);
        let mut map = map_with(&frame.units);
        map.set_halite(holder.position, 300);
        map.set_halite(Position::new(6, 5), 700);
        let mut modes = ModeStore::new();
        modes.set(2, UnitMode::Returning);
        let mut claimed = ClaimedDestinations::new();

        let first = machine.advance(&holder, &frame, &mut modes, &mut map, &mut claimed);
        let second = machine.advance(&returner, &frame, &mut modes, &mut map, &mut claimed);

        assert_eq!(first.command, None);
        assert_eq!(first.destination, Position::new(6, 5));
        assert!(map.is_occupied(Position::new(6, 5)));
        assert_eq!(second.destination, Position::new(7, 4));
    }

    #[test]
    fn expansion_turn_suppresses_ship_commands() {
        let config = StrategyConfig::default();
        let constants = GameConstants::default();
        let machine = UnitStateMachine::new(&config, &constants);
        let returning = unit(1, 3, 3, 950);
        let harvesting = unit(2, 8, 8, 0);
        let frame = frame(config.expansion_turn, vec![returning, harvesting]);
        let mut map = map_with(&frame.units);
        let mut modes = ModeStore::new();
        modes.set(1, UnitMode::Returning);
        let mut claimed = ClaimedDestinations::new();

        let first = machine.advance(&returning, &frame, &mut modes, &mut map, &mut claimed);
        let second = machine.advance(&harvesting, &frame, &mut modes, &mut map, &mut claimed);

        assert_eq!(first.command, None);
        assert_eq!(second.command, None);
        assert_eq!(claimed.len(), 2);
    }
}
