use log::warn;

use crate::modules::config::StrategyConfig;
use crate::modules::report::GameReport;
use crate::modules::sim::{Sim, SimSettings, TurnResult};
use crate::modules::turn::{TurnOrchestrator, TurnPlan};

/// The bot playing against the local simulator instead of the engine.
pub struct OfflineGame {
    sim: Sim,
    orchestrator: TurnOrchestrator,
    report: GameReport,
}

impl OfflineGame {
    pub fn new(settings: &SimSettings, config: StrategyConfig) -> Self {
        Self {
            sim: Sim::new(settings),
            orchestrator: TurnOrchestrator::new(config, settings.constants),
            report: GameReport::new(settings.seed, settings.width, settings.height),
        }
    }

    pub fn sim(&self) -> &Sim {
        &self.sim
    }

    pub fn orchestrator(&self) -> &TurnOrchestrator {
        &self.orchestrator
    }

    pub fn is_over(&self) -> bool {
        self.sim.is_over()
    }

    pub fn play_turn(&mut self) -> (TurnPlan, TurnResult) {
        let (frame, mut map) = self.sim.frame();
        let plan = self.orchestrator.play_turn(&frame, &mut map);
        let result = self.sim.step(&plan.commands);
        for rejection in &result.rejections {
            warn!(
                "turn {}: engine rejected `{}`: {}",
                result.turn, rejection.command, rejection.error
            );
        }
        self.report.record_turn(&plan, &result);
        (plan, result)
    }

    pub fn finish(mut self) -> GameReport {
        self.report
            .finish(self.sim.reserves(), self.sim.map().total_halite());
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::config::ExpansionTrigger;
    use crate::modules::turn::Command;

    fn rich_settings() -> SimSettings {
        SimSettings {
            width: 32,
            height: 32,
            seed: 7,
            starting_reserves: 1_000_000,
            ..SimSettings::default()
        }
    }

    #[test]
    fn full_game_respects_fleet_limits_and_collision_rules() {
        let config = StrategyConfig {
            expansion_trigger: ExpansionTrigger::FarthestFromHome,
            ..StrategyConfig::default()
        };
        let expansion_turn = config.expansion_turn;
        let cutoff = config.production_cutoff_turn;
        let mut game = OfflineGame::new(&rich_settings(), config);
        let mut builds = Vec::new();

        while !game.is_over() {
            let (frame, _) = game.sim().frame();
            let (plan, _) = game.play_turn();

            for command in &plan.commands {
                match command {
                    Command::Spawn => assert!(plan.turn <= cutoff, "spawn on turn {}", plan.turn),
                    Command::BuildStation { unit } => builds.push((plan.turn, *unit)),
                    Command::Move { .. } => {
                        assert_ne!(plan.turn, expansion_turn, "ship command on expansion turn")
                    }
                }
            }

            assert!(plan.claimed.len() <= frame.units.len());
            for (i, a) in plan.decisions.iter().enumerate() {
                for b in plan.decisions.iter().skip(i + 1) {
                    assert!(
                        a.destination != b.destination
                            || a.destination == a.origin
                            || b.destination == b.origin,
                        "turn {}: ships {} and {} share {}",
                        plan.turn,
                        a.unit,
                        b.unit,
                        a.destination
                    );
                }
            }
            for unit in &frame.units {
                let still_present = game.sim().ships().any(|s| s.id == unit.id);
                if still_present {
                    assert!(game.orchestrator().modes().get(unit.id).is_some());
                }
            }
        }

        assert_eq!(builds.len(), 1);
        assert_eq!(builds[0].0, expansion_turn);
        assert_eq!(game.sim().dropoffs().len(), 1);

        let report = game.finish();
        assert_eq!(report.turns, 400);
        assert_eq!(report.build_commands, 1);
        assert_eq!(report.stations_built, 1);
        assert_eq!(report.ships_lost, 0);
        assert!(report.ships_built > 0);
        assert!(report.halite_deposited > 0);
    }

    #[test]
    fn default_game_never_expands_twice_or_produces_late() {
        let settings = SimSettings {
            width: 24,
            height: 24,
            seed: 3,
            ..SimSettings::default()
        };
        let mut game = OfflineGame::new(&settings, StrategyConfig::default());
        let mut late_spawns = 0;

        while !game.is_over() {
            let (plan, _) = game.play_turn();
            if plan.turn > 200 && plan.commands.contains(&Command::Spawn) {
                late_spawns += 1;
            }
        }

        let report = game.finish();
        assert_eq!(late_spawns, 0);
        assert!(report.build_commands <= 1);
        assert!(report.finished_at.is_some());
    }
}
