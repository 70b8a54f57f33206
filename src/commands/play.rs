use std::fs::File;
use std::io;
use std::path::PathBuf;

use harvester::{Engine, ProtocolError, TurnOrchestrator};
use log::{error, info};

use super::{LogSink, StrategyArgs, init_logging};

fn log_file_path(player: u32) -> PathBuf {
    PathBuf::from(format!("harvester-{}.log", player))
}

fn protocol_err(err: ProtocolError) -> String {
    error!("{}", err);
    err.to_string()
}

pub(super) fn run_play(name: Option<String>, strategy: &StrategyArgs) -> Result<(), String> {
    let config = strategy.resolve()?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut engine = Engine::connect(stdin.lock(), stdout.lock()).map_err(|e| e.to_string())?;

    let log_path = log_file_path(engine.my_id());
    let log_file = File::create(&log_path)
        .map_err(|e| format!("failed to create log file {}: {}", log_path.display(), e))?;
    init_logging(LogSink::File(log_file))?;

    let name = name.unwrap_or_else(|| config.bot_name.clone());
    info!(
        "player {} on {}x{} map, {} players; expansion turn {} ({}), production until turn {}",
        engine.my_id(),
        engine.map().width(),
        engine.map().height(),
        engine.players().len(),
        config.expansion_turn,
        config.expansion_trigger,
        config.production_cutoff_turn
    );

    let mut orchestrator = TurnOrchestrator::new(config, *engine.constants());
    engine.ready(&name).map_err(protocol_err)?;

    while let Some(frame) = engine.next_frame().map_err(protocol_err)? {
        let plan = orchestrator.play_turn(&frame, engine.map_mut());
        engine.submit(&plan.commands).map_err(protocol_err)?;
    }

    info!("engine closed the stream; game over");
    Ok(())
}
