use log::info;

use crate::modules::config::{ExpansionTrigger, StrategyConfig};
use crate::modules::constants::GameConstants;
use crate::modules::map::MapView;
use crate::modules::turn::{Command, TurnFrame};
use crate::modules::unit::Unit;

/// Fleet-level spending: ship production and the one-shot expansion station.
#[derive(Debug, Default, Clone)]
pub struct FleetPolicy {
    expansion_issued: bool,
}

impl FleetPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expansion_issued(&self) -> bool {
        self.expansion_issued
    }

    /// Runs after every ship has been decided, so cells reserved by the
    /// navigator this turn count as occupied.
    pub fn decide<M: MapView>(
        &mut self,
        frame: &TurnFrame,
        map: &M,
        config: &StrategyConfig,
        constants: &GameConstants,
    ) -> Vec<Command> {
        let mut commands = Vec::new();
        let mut budget = frame.reserves;

        if frame.turn <= config.production_cutoff_turn
            && budget >= constants.unit_cost
            && !map.is_occupied(frame.home)
        {
            budget -= constants.unit_cost;
            info!("turn {}: producing a ship (reserves {})", frame.turn, frame.reserves);
            commands.push(Command::Spawn);
        }

        if config.is_expansion_turn(frame.turn)
            && !self.expansion_issued
            && budget >= constants.expansion_cost
        {
            if let Some(unit) = expansion_candidate(frame, map, config.expansion_trigger) {
                info!(
                    "turn {}: ship {} builds expansion station at {}",
                    frame.turn, unit.id, unit.position
                );
                self.expansion_issued = true;
                commands.push(Command::BuildStation { unit: unit.id });
            }
        }

        commands
    }
}

/// The ship that becomes the expansion station, if it is off the home cell.
fn expansion_candidate<'a, M: MapView>(
    frame: &'a TurnFrame,
    map: &M,
    trigger: ExpansionTrigger,
) -> Option<&'a Unit> {
    let candidate = match trigger {
        ExpansionTrigger::LastInRoster => frame.units.last(),
        ExpansionTrigger::FarthestFromHome => {
            let mut best: Option<(u32, &Unit)> = None;
            for unit in &frame.units {
                let distance = map.distance(unit.position, frame.home);
                match best {
                    Some((best_distance, _)) if distance <= best_distance => {}
                    _ => best = Some((distance, unit)),
                }
            }
            best.map(|(_, unit)| unit)
        }
    }?;

    if map.normalize(candidate.position) == map.normalize(frame.home) {
        return None;
    }
    Some(candidate)
}
