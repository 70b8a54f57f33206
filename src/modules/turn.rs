use std::fmt;

use log::{debug, info};

use crate::modules::config::StrategyConfig;
use crate::modules::constants::{GameConstants, Halite};
use crate::modules::fleet::FleetPolicy;
use crate::modules::map::MapView;
use crate::modules::position::{Direction, Position};
use crate::modules::scorer::ClaimedDestinations;
use crate::modules::unit::{ModeStore, Unit, UnitDecision, UnitId, UnitStateMachine};

/// One entry of the per-turn command batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Move { unit: UnitId, direction: Direction },
    Spawn,
    BuildStation { unit: UnitId },
}

impl Command {
    pub const fn label(&self) -> &'static str {
        match self {
            Command::Move { .. } => "move",
            Command::Spawn => "spawn",
            Command::BuildStation { .. } => "build_station",
        }
    }

    pub const fn unit(&self) -> Option<UnitId> {
        match self {
            Command::Move { unit, .. } | Command::BuildStation { unit } => Some(*unit),
            Command::Spawn => None,
        }
    }
}

/// Engine wire format: `m <id> <dir>`, `g`, `c <id>`.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Move { unit, direction } => write!(f, "m {} {}", unit, direction.token()),
            Command::Spawn => write!(f, "g"),
            Command::BuildStation { unit } => write!(f, "c {}", unit),
        }
    }
}

/// Everything the decision core reads about our side for one turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnFrame {
    pub turn: u32,
    /// Our ships, in the order they are decided.
    pub units: Vec<Unit>,
    pub reserves: Halite,
    pub home: Position,
    pub expansion: Option<Position>,
}

#[derive(Clone, Debug, Default)]
pub struct TurnPlan {
    pub turn: u32,
    pub commands: Vec<Command>,
    pub decisions: Vec<UnitDecision>,
    pub claimed: ClaimedDestinations,
}

/// Drives one turn at a time and owns state that outlives a turn.
#[derive(Debug)]
pub struct TurnOrchestrator {
    config: StrategyConfig,
    constants: GameConstants,
    modes: ModeStore,
    fleet: FleetPolicy,
}

impl TurnOrchestrator {
    pub fn new(config: StrategyConfig, constants: GameConstants) -> Self {
        Self {
            config,
            constants,
            modes: ModeStore::new(),
            fleet: FleetPolicy::new(),
        }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn constants(&self) -> &GameConstants {
        &self.constants
    }

    pub fn modes(&self) -> &ModeStore {
        &self.modes
    }

    pub fn modes_mut(&mut self) -> &mut ModeStore {
        &mut self.modes
    }

    pub fn play_turn<M: MapView>(&mut self, frame: &TurnFrame, map: &mut M) -> TurnPlan {
        let machine = UnitStateMachine::new(&self.config, &self.constants);
        let mut claimed = ClaimedDestinations::new();
        let mut decisions = Vec::with_capacity(frame.units.len());
        let mut commands = Vec::new();

        for unit in &frame.units {
            let decision = machine.advance(unit, frame, &mut self.modes, map, &mut claimed);
            debug!(
                "turn {} ship {} [{} -> {}] {} -> {} cargo={} command={}",
                frame.turn,
                unit.id,
                decision.mode,
                decision.next_mode,
                decision.origin,
                decision.destination,
                unit.cargo,
                decision
                    .command
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".into())
            );
            if let Some(command) = decision.command {
                commands.push(command);
            }
            decisions.push(decision);
        }

        commands.extend(
            self.fleet
                .decide(frame, map, &self.config, &self.constants),
        );
        self.modes.retain_roster(&frame.units);

        info!(
            "turn {}: ships={} reserves={} commands={}",
            frame.turn,
            frame.units.len(),
            frame.reserves,
            commands.len()
        );

        TurnPlan {
            turn: frame.turn,
            commands,
            decisions,
            claimed,
        }
    }
}
