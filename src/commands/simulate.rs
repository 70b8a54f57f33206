use harvester::{OfflineGame, SimSettings, report_file_path, save_game_report};
use log::info;
use rand::Rng;

use super::{LogSink, StrategyArgs, init_logging};

pub(super) fn run_simulate(
    turns: Option<u32>,
    seed: Option<u64>,
    width: i32,
    height: i32,
    strategy: &StrategyArgs,
) -> Result<(), String> {
    init_logging(LogSink::Stderr)?;
    let config = strategy.resolve()?;

    let mut settings = SimSettings {
        width,
        height,
        seed: seed.unwrap_or_else(|| rand::thread_rng().gen_range(0..u64::MAX)),
        ..SimSettings::default()
    };
    if let Some(turns) = turns {
        settings.constants.max_turns = turns;
    }
    info!(
        "simulating {} turns on {}x{} (seed {})",
        settings.constants.max_turns, settings.width, settings.height, settings.seed
    );

    let mut game = OfflineGame::new(&settings, config);
    while !game.is_over() {
        game.play_turn();
    }
    let report = game.finish();

    println!(
        "Game over after {} turns (seed {}, {}x{})",
        report.turns, report.seed, report.width, report.height
    );
    println!(
        " reserves : {} (deposited {}, left on map {})",
        report.final_reserves, report.halite_deposited, report.halite_remaining
    );
    println!(
        " fleet    : {} built, {} lost, {} stations",
        report.ships_built, report.ships_lost, report.stations_built
    );
    println!(
        " commands : {} moves, {} spawns, {} builds, {} rejected",
        report.move_commands, report.spawn_commands, report.build_commands, report.rejections
    );

    let path = report_file_path();
    save_game_report(&path, &report)
        .map_err(|e| format!("failed to save game report {}: {}", path.display(), e))?;
    println!("Report saved to {}", path.display());
    Ok(())
}
