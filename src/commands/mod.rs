use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use env_logger::{Builder, Env, Target};
use harvester::{ExpansionTrigger, StrategyConfig, config_file_path, load_config};

mod config;
mod play;
mod simulate;

use config::{ConfigCommand, run_config};
use play::run_play;
use simulate::run_simulate;

const LOG_ENV: &str = "HARVESTER_LOG";

#[derive(Parser)]
#[command(
    name = "harvester",
    version,
    about = "Halite harvesting bot (engine player, offline simulator, strategy config)",
    long_about = None
)]
pub struct Cli {
    /// Defaults to `play`, which is how the engine launches the bot
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Play a game against the engine over stdin/stdout
    Play {
        /// Name announced to the engine (defaults to the configured bot name)
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        strategy: StrategyArgs,
    },
    /// Play a full game against the built-in simulator
    Simulate {
        /// Number of turns (defaults to MAX_TURNS)
        #[arg(short = 't', long)]
        turns: Option<u32>,
        /// Seed for the generated halite field (random if omitted)
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 32)]
        width: i32,
        #[arg(long, default_value_t = 32)]
        height: i32,
        #[command(flatten)]
        strategy: StrategyArgs,
    },
    /// Strategy config file operations
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Strategy overrides shared by `play` and `simulate`.
#[derive(Args, Clone, Debug, Default)]
pub struct StrategyArgs {
    /// Strategy config file (defaults to .harvester/config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Turn on which the expansion station is built
    #[arg(long)]
    expansion_turn: Option<u32>,
    /// Last turn on which ships are produced
    #[arg(long)]
    production_cutoff: Option<u32>,
    /// Which ship becomes the expansion station
    #[arg(long, value_enum)]
    expansion_trigger: Option<ExpansionTrigger>,
}

impl StrategyArgs {
    /// Config file contents with command-line overrides applied.
    fn resolve(&self) -> Result<StrategyConfig, String> {
        let path = self.config.clone().unwrap_or_else(config_file_path);
        let mut config = load_config(&path).map_err(|e| e.to_string())?;
        if let Some(turn) = self.expansion_turn {
            config.expansion_turn = turn;
        }
        if let Some(turn) = self.production_cutoff {
            config.production_cutoff_turn = turn;
        }
        if let Some(trigger) = self.expansion_trigger {
            config.expansion_trigger = trigger;
        }
        Ok(config)
    }
}

pub fn run() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Play {
        name: None,
        strategy: StrategyArgs::default(),
    });
    if let Err(err) = dispatch(command) {
        log::error!("{}", err);
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn dispatch(command: Command) -> Result<(), String> {
    match command {
        Command::Play { name, strategy } => run_play(name, &strategy),
        Command::Simulate {
            turns,
            seed,
            width,
            height,
            strategy,
        } => run_simulate(turns, seed, width, height, &strategy),
        Command::Config { command } => run_config(command),
    }
}

/// Where log lines go. Stdout is reserved for the engine protocol.
pub(crate) enum LogSink {
    Stderr,
    File(File),
}

pub(crate) fn init_logging(sink: LogSink) -> Result<(), String> {
    let mut builder = Builder::from_env(Env::new().filter_or(LOG_ENV, "info"));
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} {:<5} {}: {}",
            Utc::now().to_rfc3339(),
            record.level(),
            record.target(),
            record.args()
        )
    });
    match sink {
        LogSink::Stderr => builder.target(Target::Stderr),
        LogSink::File(file) => builder.target(Target::Pipe(Box::new(file))),
    };
    builder
        .try_init()
        .map_err(|e| format!("failed to initialise logging: {}", e))
}
