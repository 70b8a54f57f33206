pub mod modules;

pub use modules::config::{
    self, ConfigError, ExpansionTrigger, ReturnBand, StrategyConfig, config_file_path,
    load_config, save_config,
};
pub use modules::constants::{GameConstants, Halite};
pub use modules::fleet::FleetPolicy;
pub use modules::map::{GameMap, MapCell, MapView, StructureKind};
pub use modules::offline::OfflineGame;
pub use modules::position::{Direction, Position};
pub use modules::protocol::{Engine, PlayerId, PlayerState, ProtocolError};
pub use modules::report::{GameReport, load_game_report, report_file_path, save_game_report};
pub use modules::scorer::{CellChoice, CellScorer, ClaimedDestinations};
pub use modules::sim::{Rejection, Sim, SimError, SimEvent, SimSettings, TurnResult};
pub use modules::turn::{Command, TurnFrame, TurnOrchestrator, TurnPlan};
pub use modules::unit::{ModeStore, Unit, UnitDecision, UnitId, UnitMode, UnitStateMachine};
